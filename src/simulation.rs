use crate::card::{Card, Review};
use crate::error::{Result, SchedulerError};
use crate::review_log::CardHistory;
use crate::scheduler::Scheduler;
use chrono::{DateTime, TimeDelta, Utc};
use itertools::Itertools;
use log::debug;
use rand::SeedableRng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use rand::rngs::StdRng;

const QUALITIES: [i32; 6] = [0, 1, 2, 3, 4, 5];

#[derive(Debug)]
pub struct SimulationResult {
    pub review_cnt_per_day: Vec<usize>,
    pub learn_cnt_per_day: Vec<usize>,
    // Mean interval over every card introduced so far, at the end of each day.
    pub mean_interval_per_day: Vec<f64>,
    pub cards: Vec<Card>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulatorConfig {
    pub deck_size: usize,
    pub learn_span: usize,
    pub learn_limit: usize,
    pub review_limit: usize,
    /// Relative weight of each answer quality 0..=5.
    pub quality_prob: [f32; 6],
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            deck_size: 1000,
            learn_span: 365,
            learn_limit: 20,
            review_limit: usize::MAX,
            quality_prob: [0.05, 0.05, 0.1, 0.25, 0.4, 0.15],
        }
    }
}

fn day_start(day: usize) -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH + TimeDelta::days(day as i64)
}

/// Runs a deck through `learn_span` days of reviews with qualities drawn
/// from `config.quality_prob`. The same seed always gives the same result.
pub fn simulate(
    scheduler: &Scheduler,
    config: &SimulatorConfig,
    seed: Option<u64>,
) -> Result<SimulationResult> {
    if config.deck_size == 0 || config.learn_span == 0 {
        return Err(SchedulerError::InvalidInput);
    }
    let quality_dist =
        WeightedIndex::new(config.quality_prob).map_err(|_| SchedulerError::InvalidInput)?;
    let mut rng = StdRng::seed_from_u64(seed.unwrap_or(42));

    let mut review_cnt_per_day = vec![0; config.learn_span];
    let mut learn_cnt_per_day = vec![0; config.learn_span];
    let mut mean_interval_per_day = vec![0.0; config.learn_span];
    let mut histories: Vec<CardHistory> = Vec::with_capacity(config.deck_size);

    for today in 0..config.learn_span {
        let now = day_start(today);

        // Most overdue first.
        let due = histories
            .iter()
            .enumerate()
            .filter(|(_, history)| history.is_due(now))
            .sorted_by_key(|(_, history)| history.card().due_at())
            .map(|(i, _)| i)
            .take(config.review_limit)
            .collect::<Vec<_>>();
        review_cnt_per_day[today] = due.len();
        for i in due {
            let quality = QUALITIES[quality_dist.sample(&mut rng)];
            histories[i].record(scheduler, Review::new(now, quality))?;
        }

        let learn = config
            .learn_limit
            .min(config.deck_size - histories.len());
        for _ in 0..learn {
            let mut history = CardHistory::new(scheduler);
            let quality = QUALITIES[quality_dist.sample(&mut rng)];
            history.record(scheduler, Review::new(now, quality))?;
            histories.push(history);
        }
        learn_cnt_per_day[today] = learn;

        if !histories.is_empty() {
            mean_interval_per_day[today] = histories
                .iter()
                .map(|h| h.card().interval as f64)
                .sum::<f64>()
                / histories.len() as f64;
        }
    }
    debug!(
        "simulated {} days: {} reviews, {} cards learned",
        config.learn_span,
        review_cnt_per_day.iter().sum::<usize>(),
        histories.len()
    );

    Ok(SimulationResult {
        review_cnt_per_day,
        learn_cnt_per_day,
        mean_interval_per_day,
        cards: histories.iter().map(|h| *h.card()).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::{EF_MAX, EF_MIN};
    use crate::test_helpers::AssertApprox;

    #[test]
    fn simulation_is_deterministic() {
        let config = SimulatorConfig {
            deck_size: 200,
            learn_span: 60,
            ..Default::default()
        };
        let scheduler = Scheduler::default();
        let a = simulate(&scheduler, &config, Some(7)).unwrap();
        let b = simulate(&scheduler, &config, Some(7)).unwrap();
        assert_eq!(a.review_cnt_per_day, b.review_cnt_per_day);
        assert_eq!(a.cards, b.cards);
        a.mean_interval_per_day
            .as_slice()
            .assert_approx_eq(b.mean_interval_per_day.as_slice());
    }

    #[test]
    fn learn_limit_and_deck_size() {
        let config = SimulatorConfig {
            deck_size: 50,
            learn_span: 10,
            learn_limit: 20,
            ..Default::default()
        };
        let result = simulate(&Scheduler::default(), &config, None).unwrap();
        assert_eq!(
            result.learn_cnt_per_day,
            [20, 20, 10, 0, 0, 0, 0, 0, 0, 0]
        );
        assert_eq!(result.cards.len(), 50);
        // Cards learned on day 0 have interval 0 and come back on day 1.
        assert_eq!(result.review_cnt_per_day[0], 0);
        assert_eq!(result.review_cnt_per_day[1], 20);
    }

    #[test]
    fn review_limit_caps_daily_reviews() {
        let config = SimulatorConfig {
            deck_size: 100,
            learn_span: 30,
            learn_limit: 50,
            review_limit: 7,
            ..Default::default()
        };
        let result = simulate(&Scheduler::default(), &config, Some(1)).unwrap();
        assert!(result.review_cnt_per_day.iter().all(|&n| n <= 7));
        assert_eq!(result.review_cnt_per_day[1], 7);
    }

    #[test]
    fn simulated_cards_respect_invariants() {
        let config = SimulatorConfig {
            deck_size: 300,
            learn_span: 120,
            ..Default::default()
        };
        let result = simulate(&Scheduler::default(), &config, Some(3)).unwrap();
        for card in &result.cards {
            assert!((EF_MIN..=EF_MAX).contains(&card.easiness_factor));
            assert!(card.review_count >= 1);
            assert!(card.last_reviewed_at.is_some());
        }
        assert!(result.cards.iter().any(|card| card.interval > 6));
    }

    #[test]
    fn invalid_config() {
        let scheduler = Scheduler::default();
        for config in [
            SimulatorConfig {
                deck_size: 0,
                ..Default::default()
            },
            SimulatorConfig {
                learn_span: 0,
                ..Default::default()
            },
            SimulatorConfig {
                quality_prob: [0.0; 6],
                ..Default::default()
            },
        ] {
            assert_eq!(
                simulate(&scheduler, &config, None).unwrap_err(),
                SchedulerError::InvalidInput
            );
        }
    }
}
