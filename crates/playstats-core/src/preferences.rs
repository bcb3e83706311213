// ── Persisted user preferences ──
//
// Read once at session start, written through on every change. The
// in-memory copy is authoritative for the session even when a write fails.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::filter::DEFAULT_DAYS;
use crate::persist::{self, KeyValueStore, keys};

/// Color scheme.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

/// Theme and default analytics window, mirrored to a [`KeyValueStore`].
pub struct Preferences {
    store: Arc<dyn KeyValueStore>,
    theme: Theme,
    default_days: u32,
    last_write_error: Option<CoreError>,
}

impl Preferences {
    /// Load from storage. Missing, unreadable or malformed values fall back
    /// to defaults (dark theme, 30 days).
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let theme = persist::read_raw(store.as_ref(), keys::THEME)
            .and_then(|raw| match raw.parse::<Theme>() {
                Ok(theme) => Some(theme),
                Err(_) => {
                    warn!(value = %raw, "unknown stored theme");
                    None
                }
            })
            .unwrap_or_default();

        let default_days = persist::read_raw(store.as_ref(), keys::DEFAULT_DAYS)
            .and_then(|raw| raw.trim().parse::<u32>().ok())
            .filter(|&days| days > 0)
            .unwrap_or(DEFAULT_DAYS);

        debug!(%theme, default_days, "preferences loaded");

        Self {
            store,
            theme,
            default_days,
            last_write_error: None,
        }
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn default_days(&self) -> u32 {
        self.default_days
    }

    /// The most recent failed write, cleared by the next successful one.
    pub fn last_write_error(&self) -> Option<&CoreError> {
        self.last_write_error.as_ref()
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
        self.save(keys::THEME, &theme.to_string());
    }

    /// Flip between light and dark, returning the new theme.
    pub fn toggle_theme(&mut self) -> Theme {
        let next = self.theme.toggled();
        self.set_theme(next);
        next
    }

    pub fn set_default_days(&mut self, days: u32) -> Result<(), CoreError> {
        if days == 0 {
            return Err(CoreError::InvalidDays { days });
        }
        self.default_days = days;
        self.save(keys::DEFAULT_DAYS, &days.to_string());
        Ok(())
    }

    fn save(&mut self, key: &str, value: &str) {
        self.last_write_error = persist::write_raw(self.store.as_ref(), key, value);
    }
}

impl std::fmt::Debug for Preferences {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Preferences")
            .field("theme", &self.theme)
            .field("default_days", &self.default_days)
            .field("last_write_error", &self.last_write_error)
            .finish_non_exhaustive()
    }
}
