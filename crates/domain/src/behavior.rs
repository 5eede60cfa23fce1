//! Behavior versions of the Dataspine client.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Pins client behavior to a dated contract with the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum BehaviorVersion {
    /// Behavior as of 2025-01-20.
    #[default]
    V20250120,
}

impl BehaviorVersion {
    /// The newest behavior version this client knows.
    #[must_use]
    pub const fn latest() -> Self {
        Self::V20250120
    }

    /// Returns the version identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::V20250120 => "V20250120",
        }
    }
}

impl fmt::Display for BehaviorVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_is_default() {
        assert_eq!(BehaviorVersion::latest(), BehaviorVersion::default());
        assert_eq!(BehaviorVersion::latest().to_string(), "V20250120");
    }
}
