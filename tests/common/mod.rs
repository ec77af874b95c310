//! Shared fixtures for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use stylecast::domain::models::{
    Clothing, ClothingStatus, ClothingType, MatchRecord, Member, OutfitPreview, OutputLanguage,
    TaskStatus,
};
use stylecast::domain::ports::{
    AiClient, AiError, AiErrorKind, AiOperation, OutfitSuggestion, TaskRepository,
};
use stylecast::infrastructure::database::{
    create_memory_pool, Migrator, SqliteClothingRepository, SqliteMatchRecordRepository,
    SqliteMemberRepository, SqliteTaskRepository,
};

pub struct TestContext {
    pub task_repo: Arc<SqliteTaskRepository>,
    pub member_repo: Arc<SqliteMemberRepository>,
    pub clothing_repo: Arc<SqliteClothingRepository>,
    pub record_repo: Arc<SqliteMatchRecordRepository>,
}

pub async fn setup() -> TestContext {
    let pool = create_memory_pool().await.expect("in-memory pool");
    Migrator::new(pool.clone()).run().await.expect("migrations");
    TestContext {
        task_repo: Arc::new(SqliteTaskRepository::new(pool.clone())),
        member_repo: Arc::new(SqliteMemberRepository::new(pool.clone())),
        clothing_repo: Arc::new(SqliteClothingRepository::new(pool.clone())),
        record_repo: Arc::new(SqliteMatchRecordRepository::new(pool)),
    }
}

pub async fn seed_member(ctx: &TestContext, photo_url: Option<&str>) -> Member {
    let now = Utc::now();
    ctx.member_repo
        .insert(&Member {
            id: 0,
            name: "Mira".into(),
            body_data: Some(r#"{"heightCm": 168.0, "topSize": "S"}"#.into()),
            style_tags: Some("casual,street".into()),
            photo_url: photo_url.map(String::from),
            deleted: false,
            created_at: now,
            updated_at: now,
        })
        .await
        .expect("seed member")
}

pub async fn seed_clothing(
    ctx: &TestContext,
    name: &str,
    kind: ClothingType,
    image_url: Option<&str>,
) -> Clothing {
    let now = Utc::now();
    ctx.clothing_repo
        .insert(&Clothing {
            id: 0,
            name: name.into(),
            image_url: image_url.map(String::from),
            style_tags: Some("casual".into()),
            status: ClothingStatus::OnShelf,
            clothing_type: kind,
            size_data: Some(r#"{"shoulderWidthCm": 39}"#.into()),
            deleted: false,
            created_at: now,
            updated_at: now,
        })
        .await
        .expect("seed clothing")
}

/// Scripted AI client used in place of a real provider.
pub struct StubAiClient {
    suggestions: Result<Vec<OutfitSuggestion>, String>,
    preview: Option<OutfitPreview>,
    preview_calls: AtomicU32,
}

impl StubAiClient {
    pub fn suggesting(suggestions: Vec<OutfitSuggestion>) -> Self {
        Self { suggestions: Ok(suggestions), preview: None, preview_calls: AtomicU32::new(0) }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            suggestions: Err(message.to_string()),
            preview: None,
            preview_calls: AtomicU32::new(0),
        }
    }

    pub fn with_preview(mut self, preview: OutfitPreview) -> Self {
        self.preview = Some(preview);
        self
    }

    pub fn preview_calls(&self) -> u32 {
        self.preview_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AiClient for StubAiClient {
    fn provider_name(&self) -> &'static str {
        "Stub"
    }

    async fn suggest(
        &self,
        _member: &Member,
        _candidates: &[Clothing],
        _history: &[MatchRecord],
        _scene: Option<&str>,
        _language: OutputLanguage,
    ) -> Result<Vec<OutfitSuggestion>, AiError> {
        match &self.suggestions {
            Ok(suggestions) => Ok(suggestions.clone()),
            Err(message) => Err(AiError::new(
                "Stub",
                AiOperation::Suggestion,
                AiErrorKind::Network(message.clone()),
            )),
        }
    }

    async fn generate_preview(
        &self,
        _member: &Member,
        _selected: &[Clothing],
        _scene: Option<&str>,
        _language: OutputLanguage,
    ) -> Result<OutfitPreview, AiError> {
        self.preview_calls.fetch_add(1, Ordering::SeqCst);
        self.preview.clone().ok_or_else(|| {
            AiError::new(
                "Stub",
                AiOperation::PreviewGeneration,
                AiErrorKind::Timeout("scripted failure".into()),
            )
        })
    }
}

pub fn suggestion(top_id: i64, bottom_id: i64, score: i32) -> OutfitSuggestion {
    OutfitSuggestion { top_id, bottom_id, score, reason: format!("pair {top_id}/{bottom_id}") }
}

pub fn full_preview() -> OutfitPreview {
    OutfitPreview {
        title: "City stroll".into(),
        description: "Relaxed lines with a crisp finish".into(),
        image_prompt: "the member wearing the selected top and bottom on a city street".into(),
    }
}

/// Poll a task until it reaches a terminal status.
pub async fn wait_for_terminal(
    task_repo: &Arc<SqliteTaskRepository>,
    task_id: &str,
) -> TaskStatus {
    for _ in 0..200 {
        let task = task_repo.get(task_id).await.expect("get task").expect("task exists");
        if task.status.is_terminal() {
            return task.status;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("task {task_id} never reached a terminal status");
}
