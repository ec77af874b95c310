//! Worn-history match records.
//!
//! Records drive the 7-day dedup window: only BROADCASTED records with a
//! non-null broadcast date inside the window exclude an item from
//! re-recommendation.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Trailing dedup window in days.
pub const DEDUP_WINDOW_DAYS: i64 = 7;

/// Lifecycle status of a match record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchRecordStatus {
    /// Created automatically when a task succeeds
    Draft,
    /// Operator accepted the pairing
    Accepted,
    /// The item was actually worn on a broadcast
    Broadcasted,
    /// Operator rejected the pairing
    Rejected,
}

impl MatchRecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Accepted => "ACCEPTED",
            Self::Broadcasted => "BROADCASTED",
            Self::Rejected => "REJECTED",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "DRAFT" => Some(Self::Draft),
            "ACCEPTED" => Some(Self::Accepted),
            "BROADCASTED" => Some(Self::Broadcasted),
            "REJECTED" => Some(Self::Rejected),
            _ => None,
        }
    }
}

/// One member-worn-clothing history entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    /// Database id; 0 until persisted
    pub id: i64,
    pub member_id: i64,
    pub clothing_id: i64,
    pub status: MatchRecordStatus,
    /// Set only while status is BROADCASTED
    pub broadcast_date: Option<DateTime<Utc>>,
    pub performance_score: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl MatchRecord {
    /// Draft record written automatically for every item of a successful
    /// task result.
    pub fn draft(member_id: i64, clothing_id: i64, performance_score: Option<i32>) -> Self {
        Self {
            id: 0,
            member_id,
            clothing_id,
            status: MatchRecordStatus::Draft,
            broadcast_date: None,
            performance_score,
            created_at: Utc::now(),
        }
    }

    /// Apply a status change, keeping the broadcast date consistent:
    /// entering BROADCASTED without a date stamps now, leaving it clears the
    /// date so the record stops affecting dedup.
    pub fn apply_status(&mut self, status: MatchRecordStatus) {
        self.status = status;
        if status == MatchRecordStatus::Broadcasted {
            if self.broadcast_date.is_none() {
                self.broadcast_date = Some(Utc::now());
            }
        } else {
            self.broadcast_date = None;
        }
    }
}

/// Start of the trailing dedup window, measured from `now`.
pub fn dedup_window_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::days(DEDUP_WINDOW_DAYS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_status_manages_broadcast_date() {
        let mut record = MatchRecord::draft(1, 2, Some(70));
        assert!(record.broadcast_date.is_none());

        record.apply_status(MatchRecordStatus::Broadcasted);
        assert!(record.broadcast_date.is_some());

        // Reverting clears the date so dedup forgets the record.
        record.apply_status(MatchRecordStatus::Rejected);
        assert!(record.broadcast_date.is_none());
    }

    #[test]
    fn test_apply_status_keeps_existing_date() {
        let mut record = MatchRecord::draft(1, 2, None);
        let stamped = Utc::now() - Duration::days(2);
        record.broadcast_date = Some(stamped);
        record.apply_status(MatchRecordStatus::Broadcasted);
        assert_eq!(record.broadcast_date, Some(stamped));
    }

    #[test]
    fn test_dedup_window_start() {
        let now = Utc::now();
        assert_eq!(now - dedup_window_start(now), Duration::days(7));
    }
}
