//! Health verdict type.

use std::fmt;

use serde::Serialize;

/// Derived health judgment.
///
/// Variants are ordered from best to worst so that the combined verdict of
/// several components is simply their maximum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthVerdict {
    #[default]
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthVerdict {
    /// Combine two verdicts, keeping the worse one.
    #[must_use]
    pub fn worst(self, other: Self) -> Self {
        self.max(other)
    }

    #[must_use]
    pub fn is_healthy(self) -> bool {
        self == Self::Healthy
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Degraded => "degraded",
            Self::Unhealthy => "unhealthy",
        }
    }
}

impl fmt::Display for HealthVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worst_prefers_unhealthy() {
        assert_eq!(
            HealthVerdict::Healthy.worst(HealthVerdict::Unhealthy),
            HealthVerdict::Unhealthy
        );
        assert_eq!(
            HealthVerdict::Degraded.worst(HealthVerdict::Healthy),
            HealthVerdict::Degraded
        );
    }

    #[test]
    fn serializes_lowercase() {
        let json = serde_json::to_string(&HealthVerdict::Degraded).unwrap();
        assert_eq!(json, "\"degraded\"");
    }
}
