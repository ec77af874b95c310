//! SQLite implementation of the ClothingRepository.

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Clothing, ClothingStatus, ClothingType};
use crate::domain::ports::ClothingRepository;

use super::task_repo::parse_timestamp;

#[derive(Clone)]
pub struct SqliteClothingRepository {
    pool: SqlitePool,
}

impl SqliteClothingRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a clothing row; used by fixtures and seeding.
    pub async fn insert(&self, clothing: &Clothing) -> DomainResult<Clothing> {
        let result = sqlx::query(
            r"INSERT INTO clothing (name, image_url, style_tags, status, clothing_type,
               size_data, deleted, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&clothing.name)
        .bind(&clothing.image_url)
        .bind(&clothing.style_tags)
        .bind(clothing.status.as_str())
        .bind(clothing.clothing_type.as_str())
        .bind(&clothing.size_data)
        .bind(i64::from(clothing.deleted))
        .bind(clothing.created_at.to_rfc3339())
        .bind(clothing.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        let mut created = clothing.clone();
        created.id = result.last_insert_rowid();
        Ok(created)
    }

    async fn find_by_ids(&self, ids: &[i64], on_shelf_only: bool) -> DomainResult<Vec<Clothing>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let mut sql =
            format!("SELECT * FROM clothing WHERE deleted = 0 AND id IN ({placeholders})");
        if on_shelf_only {
            sql.push_str(" AND status = 'ON_SHELF'");
        }

        let mut query = sqlx::query_as::<_, ClothingRow>(&sql);
        for id in ids {
            query = query.bind(*id);
        }

        let rows: Vec<ClothingRow> = query.fetch_all(&self.pool).await?;
        rows.into_iter().map(Clothing::try_from).collect()
    }
}

#[async_trait]
impl ClothingRepository for SqliteClothingRepository {
    async fn find_on_shelf_by_ids(&self, ids: &[i64]) -> DomainResult<Vec<Clothing>> {
        self.find_by_ids(ids, true).await
    }

    async fn find_active_by_ids(&self, ids: &[i64]) -> DomainResult<Vec<Clothing>> {
        self.find_by_ids(ids, false).await
    }

    async fn get_active(&self, id: i64) -> DomainResult<Option<Clothing>> {
        Ok(self.find_by_ids(&[id], false).await?.into_iter().next())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ClothingRow {
    id: i64,
    name: String,
    image_url: Option<String>,
    style_tags: Option<String>,
    status: String,
    clothing_type: String,
    size_data: Option<String>,
    deleted: i64,
    created_at: String,
    updated_at: String,
}

impl TryFrom<ClothingRow> for Clothing {
    type Error = DomainError;

    fn try_from(row: ClothingRow) -> Result<Self, Self::Error> {
        let status = ClothingStatus::from_str(&row.status).ok_or_else(|| {
            DomainError::Internal(format!("unknown clothing status: {}", row.status))
        })?;
        let clothing_type = ClothingType::from_str(&row.clothing_type).ok_or_else(|| {
            DomainError::Internal(format!("unknown clothing type: {}", row.clothing_type))
        })?;

        Ok(Clothing {
            id: row.id,
            name: row.name,
            image_url: row.image_url,
            style_tags: row.style_tags,
            status,
            clothing_type,
            size_data: row.size_data,
            deleted: row.deleted != 0,
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
        })
    }
}
