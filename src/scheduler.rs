use chrono::{DateTime, Utc};
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::card::Card;
use crate::error::{Result, SchedulerError};

pub(crate) const INITIAL_EASINESS_FACTOR: f64 = 2.5;
pub(crate) const EF_MIN: f64 = 1.1;
pub(crate) const EF_MAX: f64 = 2.5;
pub(crate) const INITIAL_INTERVALS: [u32; 3] = [0, 1, 6];

trait Round {
    fn to_2_decimal(self) -> f64;
}

impl Round for f64 {
    fn to_2_decimal(self) -> f64 {
        (self * 100.0).round() / 100.0
    }
}

/// Which branch of the update rule applies, derived from the number of
/// reviews already on file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum ScheduleStage {
    /// No reviews yet.
    New,
    /// One review on file.
    Learning,
    /// Two reviews on file.
    Consolidating,
    /// Three or more; the adaptive formula takes over.
    Mature,
}

impl ScheduleStage {
    pub fn from_review_count(review_count: usize) -> Self {
        match review_count {
            0 => Self::New,
            1 => Self::Learning,
            2 => Self::Consolidating,
            _ => Self::Mature,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Parameters {
    /// Fixed intervals for the first, second and third review.
    pub initial_intervals: [u32; 3],
    pub initial_easiness_factor: f64,
    pub minimum_easiness_factor: f64,
    pub maximum_easiness_factor: f64,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            initial_intervals: INITIAL_INTERVALS,
            initial_easiness_factor: INITIAL_EASINESS_FACTOR,
            minimum_easiness_factor: EF_MIN,
            maximum_easiness_factor: EF_MAX,
        }
    }
}

impl Parameters {
    fn check(&self) -> Result<()> {
        let Self {
            initial_easiness_factor: initial,
            minimum_easiness_factor: min,
            maximum_easiness_factor: max,
            ..
        } = *self;
        if ![initial, min, max].iter().all(|x| x.is_finite()) {
            return Err(SchedulerError::InvalidParameters);
        }
        if min <= 0.0 || min > max || !(min..=max).contains(&initial) {
            return Err(SchedulerError::InvalidParameters);
        }
        // Revised factors are rounded to hundredths, so the bounds must be
        // hundredths too or rounding could step outside them.
        if min.to_2_decimal() != min || max.to_2_decimal() != max {
            return Err(SchedulerError::InvalidParameters);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Scheduler {
    parameters: Parameters,
}

impl Scheduler {
    pub fn new(parameters: Parameters) -> Result<Self> {
        parameters.check()?;
        Ok(Self { parameters })
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// A fresh card whose easiness factor follows the configured default.
    pub fn new_card(&self) -> Card {
        Card {
            easiness_factor: self.parameters.initial_easiness_factor,
            ..Default::default()
        }
    }

    /// Scores one review of `card`. `card.review_count` must not yet include
    /// the review being scored.
    ///
    /// Only `interval` and `easiness_factor` change; recording the review
    /// itself (count and timestamp) is up to the caller, see
    /// [`CardHistory::record`](crate::CardHistory::record).
    pub fn review(&self, card: &Card, answer_quality: i32) -> Card {
        let stage = ScheduleStage::from_review_count(card.review_count);
        let [first, second, third] = self.parameters.initial_intervals;
        let (interval, easiness_factor) = match stage {
            ScheduleStage::New => (first, card.easiness_factor),
            ScheduleStage::Learning => (second, card.easiness_factor),
            ScheduleStage::Consolidating => (third, card.easiness_factor),
            ScheduleStage::Mature => {
                let easiness_factor =
                    self.next_easiness_factor(card.easiness_factor, answer_quality);
                (next_interval(card.interval, easiness_factor), easiness_factor)
            }
        };
        trace!(
            "stage {stage}: quality {answer_quality}, interval {} -> {interval}",
            card.interval
        );
        Card {
            interval,
            easiness_factor,
            ..*card
        }
    }

    /// Revised easiness factor, clamped to the configured bounds and rounded
    /// to two decimal places. Out-of-range qualities are accepted.
    pub fn next_easiness_factor(&self, easiness_factor: f64, answer_quality: i32) -> f64 {
        let q = answer_quality as f64;
        let raw = easiness_factor - 0.8 + 0.28 * q - 0.02 * q * q;
        let clamped = if raw.is_nan() {
            self.parameters.minimum_easiness_factor
        } else {
            raw.clamp(
                self.parameters.minimum_easiness_factor,
                self.parameters.maximum_easiness_factor,
            )
        };
        let new_easiness_factor = clamped.to_2_decimal();
        if new_easiness_factor != easiness_factor {
            debug!("easiness factor {easiness_factor} -> {new_easiness_factor} (quality {answer_quality})");
        }
        new_easiness_factor
    }
}

/// [`Scheduler::next_easiness_factor`] with the default bounds.
pub fn next_easiness_factor(easiness_factor: f64, answer_quality: i32) -> f64 {
    Scheduler::default().next_easiness_factor(easiness_factor, answer_quality)
}

/// `interval * easiness_factor`, truncated toward zero. Saturates at
/// `u32::MAX` rather than wrapping.
pub fn next_interval(interval: u32, easiness_factor: f64) -> u32 {
    (interval as f64 * easiness_factor).floor().max(0.0) as u32
}

pub fn is_due(card: &Card, now: DateTime<Utc>) -> bool {
    card.is_due(now)
}
