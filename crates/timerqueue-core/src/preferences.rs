//! User preferences: alert level and desktop notifications.
//!
//! Preferences never fail. Unknown alert levels are normalized to `off`
//! with a warning, unreadable stored values fall back to defaults, and
//! persistence errors are logged and dropped.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::storage::KeyValueStore;

pub const ALERT_LEVEL_KEY: &str = "alert_level";
pub const NOTIFICATIONS_KEY: &str = "notifications_enabled";

/// Volume of the completion alert.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Off,
    Soft,
    #[default]
    Medium,
    Loud,
}

impl AlertLevel {
    pub const ALL: [AlertLevel; 4] = [Self::Off, Self::Soft, Self::Medium, Self::Loud];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Soft => "soft",
            Self::Medium => "medium",
            Self::Loud => "loud",
        }
    }
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned by `FromStr` for text outside the recognized set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownAlertLevel(pub String);

impl FromStr for AlertLevel {
    type Err = UnknownAlertLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|level| level.as_str() == wanted)
            .ok_or_else(|| UnknownAlertLevel(s.to_string()))
    }
}

/// Advisory handed back when input had to be corrected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreferenceWarning {
    AlertLevelNormalized { input: String, applied: AlertLevel },
}

impl fmt::Display for PreferenceWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlertLevelNormalized { input, applied } => write!(
                f,
                "unrecognized alert level '{input}', using '{applied}' (expected one of: off, soft, medium, loud)"
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    pub alert_level: AlertLevel,
    pub notifications_enabled: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            alert_level: AlertLevel::default(),
            notifications_enabled: false,
        }
    }
}

impl Preferences {
    /// Read preferences, keeping defaults for anything absent or corrupt.
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let mut prefs = Self::default();

        if let Some(raw) = retrieve_quietly(store, ALERT_LEVEL_KEY) {
            match raw.parse::<AlertLevel>() {
                Ok(level) => prefs.alert_level = level,
                Err(_) => tracing::warn!(value = %raw, "ignoring stored alert level"),
            }
        }

        if let Some(raw) = retrieve_quietly(store, NOTIFICATIONS_KEY) {
            match raw.trim().parse::<bool>() {
                Ok(enabled) => prefs.notifications_enabled = enabled,
                Err(_) => tracing::warn!(value = %raw, "ignoring stored notification flag"),
            }
        }

        prefs
    }

    /// Write both values. Failures are logged, not returned.
    pub fn save(&self, store: &dyn KeyValueStore) {
        persist_quietly(store, ALERT_LEVEL_KEY, self.alert_level.as_str());
        persist_quietly(
            store,
            NOTIFICATIONS_KEY,
            if self.notifications_enabled { "true" } else { "false" },
        );
    }

    /// Set the alert level from user text.
    ///
    /// Unrecognized input selects `off` and yields a warning instead of an
    /// error.
    pub fn set_alert_level(&mut self, input: &str) -> Option<PreferenceWarning> {
        match input.parse::<AlertLevel>() {
            Ok(level) => {
                self.alert_level = level;
                None
            }
            Err(UnknownAlertLevel(input)) => {
                self.alert_level = AlertLevel::Off;
                tracing::warn!(%input, "unrecognized alert level, alerts disabled");
                Some(PreferenceWarning::AlertLevelNormalized {
                    input,
                    applied: AlertLevel::Off,
                })
            }
        }
    }

    pub fn set_notifications_enabled(&mut self, enabled: bool) {
        self.notifications_enabled = enabled;
    }
}

fn retrieve_quietly(store: &dyn KeyValueStore, key: &str) -> Option<String> {
    store.retrieve(key).unwrap_or_else(|e| {
        tracing::warn!(key, error = %e, "preference read failed");
        None
    })
}

fn persist_quietly(store: &dyn KeyValueStore, key: &str, value: &str) {
    if let Err(e) = store.persist(key, value) {
        tracing::warn!(key, error = %e, "preference write failed");
    }
}
