mod card;
mod error;
mod review_log;
mod scheduler;
mod simulation;
#[cfg(test)]
mod test_helpers;

pub use card::{Card, Quality, Review};
pub use error::{Result, SchedulerError};
pub use review_log::{CardHistory, ReviewLog, RevlogEntry};
pub use scheduler::{
    Parameters, ScheduleStage, Scheduler, is_due, next_easiness_factor, next_interval,
};
pub use simulation::{SimulationResult, SimulatorConfig, simulate};
