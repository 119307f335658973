use chrono::{DateTime, Utc};

/// Provides time information. Gives us deterministic time in tests.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock {}

impl SystemClock {
    #[must_use]
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
