//! Clothing catalog lookup port (collaborator interface).

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::Clothing;

/// Read access to catalog items. Soft-deleted items are invisible.
#[async_trait]
pub trait ClothingRepository: Send + Sync {
    /// Items by id, restricted to ON_SHELF status.
    async fn find_on_shelf_by_ids(&self, ids: &[i64]) -> DomainResult<Vec<Clothing>>;

    /// Items by id, any shelf status.
    async fn find_active_by_ids(&self, ids: &[i64]) -> DomainResult<Vec<Clothing>>;

    async fn get_active(&self, id: i64) -> DomainResult<Option<Clothing>>;
}
