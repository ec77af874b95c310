//! Worn-history record port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::errors::DomainResult;
use crate::domain::models::MatchRecord;

/// Persistence contract for match records.
#[async_trait]
pub trait MatchRecordRepository: Send + Sync {
    /// Insert one record; returns it with the assigned id.
    async fn insert(&self, record: &MatchRecord) -> DomainResult<MatchRecord>;

    /// Insert a batch of records (task success writes one per outfit item).
    async fn insert_all(&self, records: &[MatchRecord]) -> DomainResult<()>;

    /// BROADCASTED records for the member referencing any of the given
    /// clothing ids with a broadcast date after `since`. Drives dedup.
    async fn find_recent_broadcasted(
        &self,
        member_id: i64,
        clothing_ids: &[i64],
        since: DateTime<Utc>,
    ) -> DomainResult<Vec<MatchRecord>>;

    /// Best-performing records for prompt context, highest score first.
    async fn top_by_performance(&self, member_id: i64, limit: u32) -> DomainResult<Vec<MatchRecord>>;

    /// Most recent records for the history listing.
    async fn list_recent(&self, member_id: i64, limit: u32) -> DomainResult<Vec<MatchRecord>>;

    async fn count_by_member(&self, member_id: i64) -> DomainResult<i64>;

    async fn find_by_id_and_member(
        &self,
        id: i64,
        member_id: i64,
    ) -> DomainResult<Option<MatchRecord>>;

    async fn update(&self, record: &MatchRecord) -> DomainResult<()>;
}
