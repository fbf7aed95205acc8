use chrono::Utc;

/// Source of "now" for events that carry no `$time` property.
pub trait Clock: Send {
    fn now_millis(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Always answers the same instant. Handy for reproducible wire output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock {
    pub millis: i64,
}

impl FixedClock {
    pub fn new(millis: i64) -> Self {
        FixedClock { millis }
    }
}

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.millis
    }
}
