use snafu::Snafu;

#[derive(Snafu, Debug, PartialEq)]
pub enum SchedulerError {
    #[snafu(display("answer quality {quality} is outside 0..=5"))]
    InvalidQuality { quality: i32 },
    InvalidParameters,
    InvalidInput,
    #[snafu(display("no card with id {card_id}"))]
    UnknownCard { card_id: i64 },
    #[snafu(display("review is older than the card's last review"))]
    OutOfOrderReview,
}

pub type Result<T, E = SchedulerError> = std::result::Result<T, E>;
