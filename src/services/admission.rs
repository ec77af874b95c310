//! Admission control: per-operator rate limiting and worn-history dedup.
//!
//! Both checks run synchronously inside the create-task request, before any
//! task row exists.

use chrono::Utc;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::dedup_window_start;
use crate::domain::ports::{ClothingRepository, MatchRecordRepository};

/// Sliding 1-second-window rate limiter keyed by operator.
///
/// The check-and-reserve step is atomic under the map guard, so two
/// concurrent requests cannot both slip in at the boundary. State is
/// in-process; an explicitly constructed, injected component so tests can
/// swap or reset it.
pub struct RateLimiter {
    max_per_second: usize,
    windows: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl RateLimiter {
    pub fn new(max_per_second: usize) -> Self {
        Self { max_per_second, windows: Mutex::new(HashMap::new()) }
    }

    /// Admit or reject one request from `operator`.
    pub async fn assert_allowed(&self, operator: &str) -> DomainResult<()> {
        if operator.trim().is_empty() {
            return Err(DomainError::Unauthorized("Missing operator identity".to_string()));
        }

        let now = Instant::now();
        let threshold = now - Duration::from_secs(1);

        let mut windows = self.windows.lock().await;
        let window = windows.entry(operator.to_string()).or_default();

        while window.front().is_some_and(|t| *t < threshold) {
            window.pop_front();
        }
        if window.len() >= self.max_per_second {
            return Err(DomainError::RateLimited(
                "Task creation rate limit exceeded".to_string(),
            ));
        }
        window.push_back(now);
        Ok(())
    }

    /// Drop all recorded timestamps.
    pub async fn reset(&self) {
        self.windows.lock().await.clear();
    }
}

/// Dedup-filters candidate sets against the 7-day worn history.
pub struct AdmissionGatekeeper {
    rate_limiter: Arc<RateLimiter>,
    clothing_repo: Arc<dyn ClothingRepository>,
    record_repo: Arc<dyn MatchRecordRepository>,
}

impl AdmissionGatekeeper {
    pub fn new(
        rate_limiter: Arc<RateLimiter>,
        clothing_repo: Arc<dyn ClothingRepository>,
        record_repo: Arc<dyn MatchRecordRepository>,
    ) -> Self {
        Self { rate_limiter, clothing_repo, record_repo }
    }

    /// Rate-limit check; consumes one slot from the operator's window.
    pub async fn assert_allowed(&self, operator: &str) -> DomainResult<()> {
        self.rate_limiter.assert_allowed(operator).await
    }

    /// Compute the candidate set: de-duplicate the requested ids, keep only
    /// ON_SHELF items, then drop everything worn (BROADCASTED) within the
    /// trailing 7 days. Empty results reject with a validation error.
    pub async fn filter_candidates(
        &self,
        member_id: i64,
        clothing_ids: &[i64],
    ) -> DomainResult<Vec<i64>> {
        let mut seen = HashSet::new();
        let requested: Vec<i64> =
            clothing_ids.iter().copied().filter(|id| seen.insert(*id)).collect();

        let on_shelf = self.clothing_repo.find_on_shelf_by_ids(&requested).await?;
        if on_shelf.is_empty() {
            return Err(DomainError::Validation(
                "No ON_SHELF clothing found in request".to_string(),
            ));
        }
        let on_shelf_ids: HashSet<i64> = on_shelf.iter().map(|c| c.id).collect();
        // Preserve request order through both filters.
        let eligible: Vec<i64> =
            requested.iter().copied().filter(|id| on_shelf_ids.contains(id)).collect();

        let since = dedup_window_start(Utc::now());
        let duplicates =
            self.record_repo.find_recent_broadcasted(member_id, &eligible, since).await?;
        let duplicate_ids: HashSet<i64> = duplicates.iter().map(|r| r.clothing_id).collect();

        let filtered: Vec<i64> =
            eligible.into_iter().filter(|id| !duplicate_ids.contains(id)).collect();
        if filtered.is_empty() {
            return Err(DomainError::Validation(
                "All clothing candidates were filtered by 7-day worn history rule".to_string(),
            ));
        }
        Ok(filtered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{MatchRecord, MatchRecordStatus};
    use crate::infrastructure::database::{
        create_memory_pool, Migrator, SqliteClothingRepository, SqliteMatchRecordRepository,
    };
    use chrono::Duration as ChronoDuration;

    #[tokio::test]
    async fn test_rate_limiter_rejects_burst_over_cap() {
        let limiter = RateLimiter::new(3);
        for _ in 0..3 {
            limiter.assert_allowed("op-a").await.unwrap();
        }
        // The (N+1)-th request inside the window is rejected.
        let err = limiter.assert_allowed("op-a").await.unwrap_err();
        assert!(matches!(err, DomainError::RateLimited(_)));

        // Other operators are unaffected.
        limiter.assert_allowed("op-b").await.unwrap();
    }

    #[tokio::test]
    async fn test_rate_limiter_window_slides() {
        let limiter = RateLimiter::new(2);
        limiter.assert_allowed("op").await.unwrap();
        limiter.assert_allowed("op").await.unwrap();
        assert!(limiter.assert_allowed("op").await.is_err());

        tokio::time::sleep(Duration::from_millis(1100)).await;
        limiter.assert_allowed("op").await.unwrap();
    }

    #[tokio::test]
    async fn test_rate_limiter_rejects_blank_operator() {
        let limiter = RateLimiter::new(3);
        assert!(matches!(
            limiter.assert_allowed("  ").await,
            Err(DomainError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_rate_limiter_concurrent_boundary() {
        let limiter = Arc::new(RateLimiter::new(5));
        let mut handles = Vec::new();
        for _ in 0..20 {
            let limiter = Arc::clone(&limiter);
            handles.push(tokio::spawn(async move { limiter.assert_allowed("op").await.is_ok() }));
        }

        let mut admitted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                admitted += 1;
            }
        }
        assert_eq!(admitted, 5);
    }

    async fn gatekeeper_fixture() -> (AdmissionGatekeeper, SqliteClothingRepository, SqliteMatchRecordRepository)
    {
        let pool = create_memory_pool().await.unwrap();
        Migrator::new(pool.clone()).run().await.unwrap();
        let clothing_repo = SqliteClothingRepository::new(pool.clone());
        let record_repo = SqliteMatchRecordRepository::new(pool);
        let gatekeeper = AdmissionGatekeeper::new(
            Arc::new(RateLimiter::new(100)),
            Arc::new(clothing_repo.clone()),
            Arc::new(record_repo.clone()),
        );
        (gatekeeper, clothing_repo, record_repo)
    }

    async fn seed_top(repo: &SqliteClothingRepository, name: &str) -> i64 {
        use crate::domain::models::{Clothing, ClothingStatus, ClothingType};
        let now = Utc::now();
        repo.insert(&Clothing {
            id: 0,
            name: name.into(),
            image_url: None,
            style_tags: None,
            status: ClothingStatus::OnShelf,
            clothing_type: ClothingType::Top,
            size_data: None,
            deleted: false,
            created_at: now,
            updated_at: now,
        })
        .await
        .unwrap()
        .id
    }

    async fn seed_broadcast(repo: &SqliteMatchRecordRepository, member_id: i64, clothing_id: i64, days_ago: i64) {
        let mut record = MatchRecord::draft(member_id, clothing_id, None);
        record.status = MatchRecordStatus::Broadcasted;
        record.broadcast_date = Some(Utc::now() - ChronoDuration::days(days_ago));
        repo.insert(&record).await.unwrap();
    }

    #[tokio::test]
    async fn test_dedup_drops_recently_worn_item() {
        let (gatekeeper, clothing_repo, record_repo) = gatekeeper_fixture().await;
        let worn = seed_top(&clothing_repo, "worn-top").await;
        let fresh = seed_top(&clothing_repo, "fresh-top").await;
        seed_broadcast(&record_repo, 1, worn, 2).await;

        // Only the worn item: the whole set is filtered away.
        let err = gatekeeper.filter_candidates(1, &[worn]).await.unwrap_err();
        assert!(err.to_string().contains("7-day worn history rule"));

        // Swapping in a never-worn item succeeds.
        let filtered = gatekeeper.filter_candidates(1, &[worn, fresh]).await.unwrap();
        assert_eq!(filtered, vec![fresh]);
    }

    #[tokio::test]
    async fn test_dedup_ignores_broadcasts_outside_window() {
        let (gatekeeper, clothing_repo, record_repo) = gatekeeper_fixture().await;
        let item = seed_top(&clothing_repo, "old-top").await;
        seed_broadcast(&record_repo, 1, item, 9).await;

        let filtered = gatekeeper.filter_candidates(1, &[item]).await.unwrap();
        assert_eq!(filtered, vec![item]);
    }

    #[tokio::test]
    async fn test_requested_ids_are_deduplicated() {
        let (gatekeeper, clothing_repo, _) = gatekeeper_fixture().await;
        let item = seed_top(&clothing_repo, "top").await;

        let filtered = gatekeeper.filter_candidates(1, &[item, item, item]).await.unwrap();
        assert_eq!(filtered, vec![item]);
    }

    #[tokio::test]
    async fn test_unknown_ids_reject_with_validation() {
        let (gatekeeper, _, _) = gatekeeper_fixture().await;
        let err = gatekeeper.filter_candidates(1, &[12345]).await.unwrap_err();
        assert!(err.to_string().contains("No ON_SHELF clothing"));
    }
}
