//! SQLite implementation of the MemberRepository.

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::Member;
use crate::domain::ports::MemberRepository;

use super::task_repo::parse_timestamp;

#[derive(Clone)]
pub struct SqliteMemberRepository {
    pool: SqlitePool,
}

impl SqliteMemberRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a member row; used by fixtures and seeding.
    pub async fn insert(&self, member: &Member) -> DomainResult<Member> {
        let result = sqlx::query(
            r"INSERT INTO member (name, body_data, style_tags, photo_url, deleted, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&member.name)
        .bind(&member.body_data)
        .bind(&member.style_tags)
        .bind(&member.photo_url)
        .bind(i64::from(member.deleted))
        .bind(member.created_at.to_rfc3339())
        .bind(member.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        let mut created = member.clone();
        created.id = result.last_insert_rowid();
        Ok(created)
    }
}

#[async_trait]
impl MemberRepository for SqliteMemberRepository {
    async fn get_active(&self, id: i64) -> DomainResult<Option<Member>> {
        let row: Option<MemberRow> =
            sqlx::query_as("SELECT * FROM member WHERE id = ? AND deleted = 0")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(Member::try_from).transpose()
    }
}

#[derive(Debug, sqlx::FromRow)]
struct MemberRow {
    id: i64,
    name: String,
    body_data: Option<String>,
    style_tags: Option<String>,
    photo_url: Option<String>,
    deleted: i64,
    created_at: String,
    updated_at: String,
}

impl TryFrom<MemberRow> for Member {
    type Error = DomainError;

    fn try_from(row: MemberRow) -> Result<Self, Self::Error> {
        Ok(Member {
            id: row.id,
            name: row.name,
            body_data: row.body_data,
            style_tags: row.style_tags,
            photo_url: row.photo_url,
            deleted: row.deleted != 0,
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::database::connection::create_memory_pool;
    use crate::infrastructure::database::migrations::Migrator;
    use chrono::Utc;

    fn sample_member() -> Member {
        let now = Utc::now();
        Member {
            id: 0,
            name: "Mira".into(),
            body_data: Some(r#"{"heightCm": 170.0}"#.into()),
            style_tags: Some("casual,street".into()),
            photo_url: Some("https://cdn.example.com/mira.jpg".into()),
            deleted: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get_active() {
        let pool = create_memory_pool().await.unwrap();
        Migrator::new(pool.clone()).run().await.unwrap();
        let repo = SqliteMemberRepository::new(pool);

        let created = repo.insert(&sample_member()).await.unwrap();
        assert!(created.id > 0);

        let loaded = repo.get_active(created.id).await.unwrap().unwrap();
        assert_eq!(loaded.name, "Mira");
        assert!(loaded.has_photo());
    }

    #[tokio::test]
    async fn test_soft_deleted_member_is_invisible() {
        let pool = create_memory_pool().await.unwrap();
        Migrator::new(pool.clone()).run().await.unwrap();
        let repo = SqliteMemberRepository::new(pool);

        let mut member = sample_member();
        member.deleted = true;
        let created = repo.insert(&member).await.unwrap();

        assert!(repo.get_active(created.id).await.unwrap().is_none());
    }
}
