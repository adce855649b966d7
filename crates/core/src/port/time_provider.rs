// Time Provider Port (for testability)

use chrono::{Local, LocalResult, TimeZone};

const DAY_MILLIS: i64 = 24 * 60 * 60 * 1000;

/// Time provider interface (allows fixed clocks in tests)
pub trait TimeProvider: Send + Sync {
    /// Get current time in milliseconds since epoch
    fn now_millis(&self) -> i64;

    /// Local midnight of the current day, in milliseconds since epoch
    fn today_start_millis(&self) -> i64 {
        local_day_start(self.now_millis())
    }
}

/// Local midnight of the day containing `millis`
///
/// Falls back to the UTC day boundary when the local midnight does not exist
/// (DST gap at 00:00).
pub fn local_day_start(millis: i64) -> i64 {
    let utc_floor = millis.div_euclid(DAY_MILLIS) * DAY_MILLIS;

    let local = match Local.timestamp_millis_opt(millis) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(dt, _) => dt,
        LocalResult::None => return utc_floor,
    };

    local
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .and_then(|midnight| Local.from_local_datetime(&midnight).earliest())
        .map(|dt| dt.timestamp_millis())
        .unwrap_or(utc_floor)
}

/// System time provider (production)
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

pub mod mocks {
    use super::TimeProvider;
    use std::sync::atomic::{AtomicI64, Ordering};

    /// Manually driven clock
    pub struct FixedTimeProvider {
        now: AtomicI64,
    }

    impl FixedTimeProvider {
        pub fn new(now_millis: i64) -> Self {
            Self {
                now: AtomicI64::new(now_millis),
            }
        }

        pub fn set(&self, now_millis: i64) {
            self.now.store(now_millis, Ordering::SeqCst);
        }

        pub fn advance(&self, millis: i64) {
            self.now.fetch_add(millis, Ordering::SeqCst);
        }
    }

    impl TimeProvider for FixedTimeProvider {
        fn now_millis(&self) -> i64 {
            self.now.load(Ordering::SeqCst)
        }
    }
}
