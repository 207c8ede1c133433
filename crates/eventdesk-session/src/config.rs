//! Session configuration.
//!
//! Settings are read from a TOML file; every key is optional:
//!
//! ```toml
//! time_format = "12h"
//! default_duration_minutes = 45
//! new_events_all_day = false
//! default_until_period = "weekly"
//! long_event_threshold_days = 15
//! uid_domain = "example.com"
//!
//! [logging]
//! level = "debug"
//! format = "json"
//! ```

use std::path::Path;

use eventdesk_core::{RepeatPeriod, TimeFormat, TracingConfig, TracingOutputFormat};
use serde::{Deserialize, Serialize};

use crate::error::{SessionError, SessionResult};

/// Edit session configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Clock format of the time strings in a draft.
    pub time_format: TimeFormat,

    /// Length of new timed events.
    pub default_duration_minutes: u32,

    /// Whether blank drafts start as all-day events.
    pub new_events_all_day: bool,

    /// Period used to seed a fresh repeat end date.
    pub default_until_period: RepeatPeriod,

    /// Events longer than this many days go to the long-event list.
    pub long_event_threshold_days: u32,

    /// Domain part of generated event UIDs.
    pub uid_domain: String,

    /// Logging settings.
    pub logging: LoggingSettings,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            time_format: TimeFormat::H24,
            default_duration_minutes: 30,
            new_events_all_day: true,
            default_until_period: RepeatPeriod::Monthly,
            long_event_threshold_days: 15,
            uid_domain: "eventdesk".to_string(),
            logging: LoggingSettings::default(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Level name: trace, debug, info, warn or error.
    pub level: String,
    pub format: TracingOutputFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: TracingOutputFormat::Pretty,
        }
    }
}

impl SessionConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(content: &str) -> SessionResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: impl AsRef<Path>) -> SessionResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Checks values serde cannot.
    pub fn validate(&self) -> SessionResult<()> {
        if self.default_duration_minutes == 0 || self.default_duration_minutes >= 24 * 60 {
            return Err(SessionError::config(format!(
                "default_duration_minutes must be between 1 and 1439, got {}",
                self.default_duration_minutes
            )));
        }
        if self.uid_domain.trim().is_empty() {
            return Err(SessionError::config("uid_domain must not be empty"));
        }
        Ok(())
    }

    /// Converts the logging section into a tracing configuration.
    pub fn tracing_config(&self) -> SessionResult<TracingConfig> {
        TracingConfig::from_names(&self.logging.level, self.logging.format)
            .map_err(|e| SessionError::config(e.to_string()))
    }

    /// Builder: set time format.
    pub fn with_time_format(mut self, format: TimeFormat) -> Self {
        self.time_format = format;
        self
    }

    /// Builder: set default duration of new timed events.
    pub fn with_default_duration_minutes(mut self, minutes: u32) -> Self {
        self.default_duration_minutes = minutes;
        self
    }

    /// Builder: set whether blank drafts are all-day.
    pub fn with_new_events_all_day(mut self, all_day: bool) -> Self {
        self.new_events_all_day = all_day;
        self
    }

    /// Builder: set the repeat end seed period.
    pub fn with_default_until_period(mut self, period: RepeatPeriod) -> Self {
        self.default_until_period = period;
        self
    }
}
