//! SQLite implementation of the TaskRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{MatchTask, Outfit, OutputLanguage, TaskStatus};
use crate::domain::ports::TaskRepository;

#[derive(Clone)]
pub struct SqliteTaskRepository {
    pool: SqlitePool,
}

impl SqliteTaskRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskRepository for SqliteTaskRepository {
    async fn create(&self, task: &MatchTask) -> DomainResult<()> {
        let candidate_json = serde_json::to_string(&task.candidate_ids)?;

        sqlx::query(
            r"INSERT INTO match_task (id, member_id, operator, scene, language, status,
               strategy_name, candidate_ids_json, result_json, preview_json, error_message,
               created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&task.id)
        .bind(task.member_id)
        .bind(&task.operator)
        .bind(&task.scene)
        .bind(task.language.code())
        .bind(task.status.as_str())
        .bind(&task.strategy_name)
        .bind(&candidate_json)
        .bind(result_json(task)?)
        .bind(preview_json(task)?)
        .bind(&task.error_message)
        .bind(task.created_at.to_rfc3339())
        .bind(task.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, id: &str) -> DomainResult<Option<MatchTask>> {
        let row: Option<TaskRow> = sqlx::query_as("SELECT * FROM match_task WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(MatchTask::try_from).transpose()
    }

    async fn update(&self, task: &MatchTask) -> DomainResult<()> {
        let candidate_json = serde_json::to_string(&task.candidate_ids)?;

        let result = sqlx::query(
            r"UPDATE match_task SET member_id = ?, operator = ?, scene = ?, language = ?,
               status = ?, strategy_name = ?, candidate_ids_json = ?, result_json = ?,
               preview_json = ?, error_message = ?, updated_at = ?
               WHERE id = ?",
        )
        .bind(task.member_id)
        .bind(&task.operator)
        .bind(&task.scene)
        .bind(task.language.code())
        .bind(task.status.as_str())
        .bind(&task.strategy_name)
        .bind(&candidate_json)
        .bind(result_json(task)?)
        .bind(preview_json(task)?)
        .bind(&task.error_message)
        .bind(Utc::now().to_rfc3339())
        .bind(&task.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound(format!("Task not found: {}", task.id)));
        }
        Ok(())
    }

    async fn update_status_and_error(
        &self,
        id: &str,
        status: TaskStatus,
        error_message: Option<&str>,
    ) -> DomainResult<()> {
        sqlx::query("UPDATE match_task SET status = ?, error_message = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(error_message)
            .bind(Utc::now().to_rfc3339())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list(
        &self,
        member_id: Option<i64>,
        page: u32,
        size: u32,
    ) -> DomainResult<(Vec<MatchTask>, i64)> {
        let offset = i64::from(page) * i64::from(size);

        let (rows, total): (Vec<TaskRow>, (i64,)) = match member_id {
            Some(member_id) => {
                let rows = sqlx::query_as(
                    "SELECT * FROM match_task WHERE member_id = ?
                     ORDER BY created_at DESC LIMIT ? OFFSET ?",
                )
                .bind(member_id)
                .bind(i64::from(size))
                .bind(offset)
                .fetch_all(&self.pool)
                .await?;
                let total = sqlx::query_as("SELECT COUNT(*) FROM match_task WHERE member_id = ?")
                    .bind(member_id)
                    .fetch_one(&self.pool)
                    .await?;
                (rows, total)
            }
            None => {
                let rows =
                    sqlx::query_as("SELECT * FROM match_task ORDER BY created_at DESC LIMIT ? OFFSET ?")
                        .bind(i64::from(size))
                        .bind(offset)
                        .fetch_all(&self.pool)
                        .await?;
                let total =
                    sqlx::query_as("SELECT COUNT(*) FROM match_task").fetch_one(&self.pool).await?;
                (rows, total)
            }
        };

        let tasks = rows.into_iter().map(MatchTask::try_from).collect::<DomainResult<Vec<_>>>()?;
        Ok((tasks, total.0))
    }
}

fn result_json(task: &MatchTask) -> DomainResult<Option<String>> {
    if task.outfits.is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::to_string(&task.outfits)?))
}

/// Legacy mirror of the first outfit's preview.
fn preview_json(task: &MatchTask) -> DomainResult<Option<String>> {
    match task.outfits.first().and_then(|outfit| outfit.preview.as_ref()) {
        Some(preview) => Ok(Some(serde_json::to_string(preview)?)),
        None => Ok(None),
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TaskRow {
    id: String,
    member_id: i64,
    operator: String,
    scene: Option<String>,
    language: String,
    status: String,
    strategy_name: Option<String>,
    candidate_ids_json: String,
    result_json: Option<String>,
    #[allow(dead_code)]
    preview_json: Option<String>,
    error_message: Option<String>,
    created_at: String,
    updated_at: String,
}

impl TryFrom<TaskRow> for MatchTask {
    type Error = DomainError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        let status = TaskStatus::from_str(&row.status)
            .ok_or_else(|| DomainError::Internal(format!("unknown task status: {}", row.status)))?;
        let candidate_ids: Vec<i64> = serde_json::from_str(&row.candidate_ids_json)?;
        let outfits: Vec<Outfit> = match row.result_json.as_deref() {
            Some(raw) if !raw.trim().is_empty() => serde_json::from_str(raw)?,
            _ => Vec::new(),
        };

        Ok(MatchTask {
            id: row.id,
            member_id: row.member_id,
            operator: row.operator,
            scene: row.scene,
            language: OutputLanguage::from_code(&row.language),
            status,
            strategy_name: row.strategy_name,
            candidate_ids,
            outfits,
            error_message: row.error_message,
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
        })
    }
}

pub(crate) fn parse_timestamp(raw: &str) -> DomainResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DomainError::Internal(format!("invalid timestamp '{raw}': {e}")))
}
