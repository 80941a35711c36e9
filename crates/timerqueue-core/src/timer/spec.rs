use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::format::format_duration;

/// Opaque identity issued when a spec is created.
///
/// Lookups (removal, cancellation) go through this id, never through
/// label/duration equality: two specs with the same label are distinct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimerId(Uuid);

impl TimerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// First eight hex digits, enough to address a timer from the CLI.
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for TimerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for TimerId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// A planned countdown. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSpec {
    id: TimerId,
    label: String,
    planned_duration_ms: u64,
}

impl TimerSpec {
    /// Create a spec with a fresh identity.
    ///
    /// # Errors
    /// Returns an error if the label is blank or the duration is zero.
    pub fn new(label: impl Into<String>, planned_duration_ms: u64) -> Result<Self, ValidationError> {
        let label = label.into().trim().to_string();
        if label.is_empty() {
            return Err(ValidationError::EmptyLabel);
        }
        if planned_duration_ms == 0 {
            return Err(ValidationError::ZeroDuration);
        }
        Ok(Self {
            id: TimerId::new(),
            label,
            planned_duration_ms,
        })
    }

    pub fn id(&self) -> TimerId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn planned_duration_ms(&self) -> u64 {
        self.planned_duration_ms
    }
}

impl fmt::Display for TimerSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({})",
            self.label,
            format_duration(self.planned_duration_ms)
        )
    }
}
