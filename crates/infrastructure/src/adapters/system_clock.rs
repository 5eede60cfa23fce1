//! Wall-clock time for token expiry and request signing.

use chrono::{DateTime, Utc};
use dataspine_application::Clock;

/// [`Clock`] reading UTC wall-clock time.
///
/// Token expiry is computed from this clock when a response arrives, and
/// SigV4 signatures are stamped with it, so a skewed host clock shows up as
/// early refreshes or rejected signatures.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    /// Returns the system clock.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
