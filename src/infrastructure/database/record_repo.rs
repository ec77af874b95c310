//! SQLite implementation of the MatchRecordRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{MatchRecord, MatchRecordStatus};
use crate::domain::ports::MatchRecordRepository;

use super::task_repo::parse_timestamp;

#[derive(Clone)]
pub struct SqliteMatchRecordRepository {
    pool: SqlitePool,
}

impl SqliteMatchRecordRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MatchRecordRepository for SqliteMatchRecordRepository {
    async fn insert(&self, record: &MatchRecord) -> DomainResult<MatchRecord> {
        let result = sqlx::query(
            r"INSERT INTO match_record (member_id, clothing_id, status, broadcast_date,
               performance_score, created_at)
               VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(record.member_id)
        .bind(record.clothing_id)
        .bind(record.status.as_str())
        .bind(record.broadcast_date.map(|d| d.to_rfc3339()))
        .bind(record.performance_score)
        .bind(record.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        let mut created = record.clone();
        created.id = result.last_insert_rowid();
        Ok(created)
    }

    async fn insert_all(&self, records: &[MatchRecord]) -> DomainResult<()> {
        for record in records {
            self.insert(record).await?;
        }
        Ok(())
    }

    async fn find_recent_broadcasted(
        &self,
        member_id: i64,
        clothing_ids: &[i64],
        since: DateTime<Utc>,
    ) -> DomainResult<Vec<MatchRecord>> {
        if clothing_ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; clothing_ids.len()].join(", ");
        let sql = format!(
            "SELECT * FROM match_record
             WHERE member_id = ? AND status = 'BROADCASTED'
             AND broadcast_date IS NOT NULL AND broadcast_date > ?
             AND clothing_id IN ({placeholders})"
        );

        let mut query = sqlx::query_as::<_, RecordRow>(&sql)
            .bind(member_id)
            .bind(since.to_rfc3339());
        for id in clothing_ids {
            query = query.bind(*id);
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.into_iter().map(MatchRecord::try_from).collect()
    }

    async fn top_by_performance(&self, member_id: i64, limit: u32) -> DomainResult<Vec<MatchRecord>> {
        let rows: Vec<RecordRow> = sqlx::query_as(
            "SELECT * FROM match_record WHERE member_id = ?
             ORDER BY performance_score DESC LIMIT ?",
        )
        .bind(member_id)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(MatchRecord::try_from).collect()
    }

    async fn list_recent(&self, member_id: i64, limit: u32) -> DomainResult<Vec<MatchRecord>> {
        let rows: Vec<RecordRow> = sqlx::query_as(
            "SELECT * FROM match_record WHERE member_id = ?
             ORDER BY created_at DESC LIMIT ?",
        )
        .bind(member_id)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(MatchRecord::try_from).collect()
    }

    async fn count_by_member(&self, member_id: i64) -> DomainResult<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM match_record WHERE member_id = ?")
            .bind(member_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn find_by_id_and_member(
        &self,
        id: i64,
        member_id: i64,
    ) -> DomainResult<Option<MatchRecord>> {
        let row: Option<RecordRow> =
            sqlx::query_as("SELECT * FROM match_record WHERE id = ? AND member_id = ?")
                .bind(id)
                .bind(member_id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(MatchRecord::try_from).transpose()
    }

    async fn update(&self, record: &MatchRecord) -> DomainResult<()> {
        let result = sqlx::query(
            r"UPDATE match_record SET status = ?, broadcast_date = ?, performance_score = ?
               WHERE id = ?",
        )
        .bind(record.status.as_str())
        .bind(record.broadcast_date.map(|d| d.to_rfc3339()))
        .bind(record.performance_score)
        .bind(record.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound(format!("History record not found: {}", record.id)));
        }
        Ok(())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct RecordRow {
    id: i64,
    member_id: i64,
    clothing_id: i64,
    status: String,
    broadcast_date: Option<String>,
    performance_score: Option<i32>,
    created_at: String,
}

impl TryFrom<RecordRow> for MatchRecord {
    type Error = DomainError;

    fn try_from(row: RecordRow) -> Result<Self, Self::Error> {
        let status = MatchRecordStatus::from_str(&row.status)
            .ok_or_else(|| DomainError::Internal(format!("unknown record status: {}", row.status)))?;
        let broadcast_date = row.broadcast_date.as_deref().map(parse_timestamp).transpose()?;
        Ok(MatchRecord {
            id: row.id,
            member_id: row.member_id,
            clothing_id: row.clothing_id,
            status,
            broadcast_date,
            performance_score: row.performance_score,
            created_at: parse_timestamp(&row.created_at)?,
        })
    }
}
