use chrono::{DateTime, TimeZone, Utc};

pub(crate) fn init_logger() {
    let _ = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!("[{}] {}: {}", record.level(), record.target(), message))
        })
        .level(log::LevelFilter::Trace)
        .chain(std::io::stdout())
        .apply();
}

/// Midnight UTC on the given day of March 2024.
pub(crate) fn day(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, day, 0, 0, 0).unwrap()
}

pub(crate) trait AssertApprox {
    fn assert_approx_eq(self, expected: Self);
}

impl AssertApprox for f64 {
    fn assert_approx_eq(self, expected: Self) {
        assert!(
            (self - expected).abs() < 1e-9,
            "expected {expected}, got {self}"
        );
    }
}

impl AssertApprox for &[f64] {
    fn assert_approx_eq(self, expected: Self) {
        assert_eq!(self.len(), expected.len());
        self.iter()
            .zip(expected)
            .for_each(|(a, b)| a.assert_approx_eq(*b));
    }
}
