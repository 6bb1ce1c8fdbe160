use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SchedulerError};
use crate::scheduler::INITIAL_EASINESS_FACTOR;

/// Scheduling state of a single card, as persisted by the surrounding
/// application. The scheduler only ever computes new values from a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Card {
    /// Days until the card is due again, counted from its last review.
    pub interval: u32,
    /// Multiplier applied to the interval once the card is mature. Kept in
    /// `[1.1, 2.5]` by the scheduler.
    pub easiness_factor: f64,
    /// The number of reviews on file for this card.
    pub review_count: usize,
    /// Timestamp of the most recent review, `None` if never reviewed.
    pub last_reviewed_at: Option<DateTime<Utc>>,
}

impl Default for Card {
    fn default() -> Self {
        Self {
            interval: 0,
            easiness_factor: INITIAL_EASINESS_FACTOR,
            review_count: 0,
            last_reviewed_at: None,
        }
    }
}

impl Card {
    pub fn new() -> Self {
        Self::default()
    }

    /// The moment the card becomes due, or `None` for a card that was never
    /// reviewed (such a card is always due).
    pub fn due_at(&self) -> Option<DateTime<Utc>> {
        self.last_reviewed_at.map(|last| {
            last.checked_add_signed(TimeDelta::days(self.interval as i64))
                .unwrap_or(DateTime::<Utc>::MAX_UTC)
        })
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self.due_at() {
            Some(due) => due <= now,
            None => true,
        }
    }

    pub fn is_due_now(&self) -> bool {
        self.is_due(Utc::now())
    }
}

/// A single, immutable review event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub reviewed_at: DateTime<Utc>,
    /// 0-5, not validated here
    pub answer_quality: i32,
}

impl Review {
    pub fn new(reviewed_at: DateTime<Utc>, answer_quality: i32) -> Self {
        Self {
            reviewed_at,
            answer_quality,
        }
    }

    pub fn now(answer_quality: i32) -> Self {
        Self::new(Utc::now(), answer_quality)
    }
}

/// An answer quality known to be in `0..=5`, for callers that want to
/// reject bad input before it reaches the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct Quality(u8);

impl Quality {
    pub const MAX: Quality = Quality(5);

    pub fn get(self) -> i32 {
        self.0 as i32
    }
}

impl TryFrom<i32> for Quality {
    type Error = SchedulerError;

    fn try_from(quality: i32) -> Result<Self> {
        match quality {
            0..=5 => Ok(Quality(quality as u8)),
            _ => Err(SchedulerError::InvalidQuality { quality }),
        }
    }
}

impl From<Quality> for i32 {
    fn from(quality: Quality) -> Self {
        quality.get()
    }
}
