use std::collections::HashMap;

use chrono::{DateTime, Utc};
use itertools::Itertools;
use log::{debug, info};
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use serde::{Deserialize, Serialize};

use crate::card::{Card, Review};
use crate::error::{Result, SchedulerError};
use crate::scheduler::Scheduler;

/// One row of a flat review table, as a storage layer would keep it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevlogEntry {
    pub card_id: i64,
    pub reviewed_at: DateTime<Utc>,
    pub answer_quality: i32,
}

impl RevlogEntry {
    pub fn review(&self) -> Review {
        Review::new(self.reviewed_at, self.answer_quality)
    }
}

/// A card's current scheduling state together with its append-only review
/// history, oldest first.
///
/// The card is always the result of scoring `reviews` in order from a fresh
/// card, so `card.review_count == reviews.len()`. Stored cards come back
/// through [`CardHistory::replay`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardHistory {
    card: Card,
    reviews: Vec<Review>,
}

impl CardHistory {
    /// A never reviewed card.
    pub fn new(scheduler: &Scheduler) -> Self {
        Self {
            card: scheduler.new_card(),
            reviews: Vec::new(),
        }
    }

    /// Rebuilds a card from its full history by scoring every review in turn.
    pub fn replay<I>(scheduler: &Scheduler, reviews: I) -> Result<Self>
    where
        I: IntoIterator<Item = Review>,
    {
        let mut history = Self::new(scheduler);
        for review in reviews {
            history.record(scheduler, review)?;
        }
        Ok(history)
    }

    pub fn card(&self) -> &Card {
        &self.card
    }

    pub fn reviews(&self) -> &[Review] {
        &self.reviews
    }

    /// Reviews from the most recent to the oldest.
    pub fn recent_reviews(&self) -> impl Iterator<Item = &Review> {
        self.reviews.iter().rev()
    }

    pub fn last_review(&self) -> Option<&Review> {
        self.reviews.last()
    }

    pub fn last_reviewed_at(&self) -> Option<DateTime<Utc>> {
        self.card.last_reviewed_at
    }

    pub fn review_count(&self) -> usize {
        self.reviews.len()
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.card.is_due(now)
    }

    /// Scores `review` against the state before it, then appends it.
    ///
    /// A review older than the last recorded one is rejected and leaves the
    /// history untouched.
    pub fn record(&mut self, scheduler: &Scheduler, review: Review) -> Result<&Card> {
        if let Some(last) = self.card.last_reviewed_at {
            if review.reviewed_at < last {
                return Err(SchedulerError::OutOfOrderReview);
            }
        }
        let scored = scheduler.review(&self.card, review.answer_quality);
        self.card = Card {
            review_count: self.card.review_count + 1,
            last_reviewed_at: Some(review.reviewed_at),
            ..scored
        };
        self.reviews.push(review);
        Ok(&self.card)
    }
}

/// Review histories keyed by card id.
#[derive(Debug, Clone, Default)]
pub struct ReviewLog {
    scheduler: Scheduler,
    cards: HashMap<i64, CardHistory>,
}

impl ReviewLog {
    pub fn new(scheduler: Scheduler) -> Self {
        Self {
            scheduler,
            cards: HashMap::new(),
        }
    }

    /// Groups flat review rows by card and replays each card's history.
    /// Cards are independent, so they are replayed in parallel.
    pub fn from_entries(scheduler: Scheduler, entries: Vec<RevlogEntry>) -> Result<Self> {
        let grouped = entries
            .into_iter()
            .map(|entry| (entry.card_id, entry))
            .into_group_map();
        debug!("replaying {} cards", grouped.len());
        let cards = grouped
            .into_par_iter()
            .map(|(card_id, entries)| {
                let reviews = entries
                    .into_iter()
                    .sorted_by_key(|entry| entry.reviewed_at)
                    .map(|entry| entry.review());
                CardHistory::replay(&scheduler, reviews).map(|history| (card_id, history))
            })
            .collect::<Result<HashMap<_, _>>>()?;
        Ok(Self { scheduler, cards })
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Adds a new, never reviewed card. An existing card is left as is.
    pub fn insert_card(&mut self, card_id: i64) -> &CardHistory {
        let scheduler = &self.scheduler;
        self.cards
            .entry(card_id)
            .or_insert_with(|| CardHistory::new(scheduler))
    }

    /// Adds or replaces a card's history.
    pub fn insert(&mut self, card_id: i64, history: CardHistory) -> Option<CardHistory> {
        self.cards.insert(card_id, history)
    }

    pub fn get(&self, card_id: i64) -> Option<&CardHistory> {
        self.cards.get(&card_id)
    }

    pub fn remove(&mut self, card_id: i64) -> Option<CardHistory> {
        self.cards.remove(&card_id)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i64, &CardHistory)> {
        self.cards.iter().map(|(id, history)| (*id, history))
    }

    pub fn record(&mut self, card_id: i64, review: Review) -> Result<Card> {
        let history = self
            .cards
            .get_mut(&card_id)
            .ok_or(SchedulerError::UnknownCard { card_id })?;
        let card = *history.record(&self.scheduler, review)?;
        info!(
            "card {card_id}: review #{} quality {}, next in {} days (ef {})",
            card.review_count, review.answer_quality, card.interval, card.easiness_factor
        );
        Ok(card)
    }

    /// Ids of all cards due at `now`, ascending.
    pub fn due_cards(&self, now: DateTime<Utc>) -> Vec<i64> {
        self.cards
            .iter()
            .filter(|(_, history)| history.is_due(now))
            .map(|(id, _)| *id)
            .sorted()
            .collect()
    }

    /// Flattens the log back into rows, by card id then time.
    pub fn entries(&self) -> Vec<RevlogEntry> {
        self.cards
            .iter()
            .sorted_by_key(|(id, _)| **id)
            .flat_map(|(card_id, history)| {
                history.reviews().iter().map(move |review| RevlogEntry {
                    card_id: *card_id,
                    reviewed_at: review.reviewed_at,
                    answer_quality: review.answer_quality,
                })
            })
            .collect()
    }
}
