//! Event alarms and references to persisted reminders.

use std::fmt;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lead time of an alarm before the event start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AlarmInterval {
    #[serde(rename = "5M")]
    FiveMinutes,
    #[serde(rename = "10M")]
    TenMinutes,
    #[serde(rename = "30M")]
    ThirtyMinutes,
    #[serde(rename = "1H")]
    OneHour,
    #[serde(rename = "1D")]
    OneDay,
    #[serde(rename = "2D")]
    TwoDays,
    #[serde(rename = "3D")]
    ThreeDays,
    #[serde(rename = "1W")]
    OneWeek,
}

impl AlarmInterval {
    /// All intervals, shortest first.
    pub const ALL: [AlarmInterval; 8] = [
        Self::FiveMinutes,
        Self::TenMinutes,
        Self::ThirtyMinutes,
        Self::OneHour,
        Self::OneDay,
        Self::TwoDays,
        Self::ThreeDays,
        Self::OneWeek,
    ];

    /// Returns the wire code, e.g. `"30M"`.
    pub fn code(&self) -> &'static str {
        match self {
            Self::FiveMinutes => "5M",
            Self::TenMinutes => "10M",
            Self::ThirtyMinutes => "30M",
            Self::OneHour => "1H",
            Self::OneDay => "1D",
            Self::TwoDays => "2D",
            Self::ThreeDays => "3D",
            Self::OneWeek => "1W",
        }
    }

    /// Parses a wire code.
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|i| i.code() == code)
    }

    /// Returns how long before the event the alarm fires.
    pub fn lead_time(&self) -> Duration {
        match self {
            Self::FiveMinutes => Duration::minutes(5),
            Self::TenMinutes => Duration::minutes(10),
            Self::ThirtyMinutes => Duration::minutes(30),
            Self::OneHour => Duration::hours(1),
            Self::OneDay => Duration::days(1),
            Self::TwoDays => Duration::days(2),
            Self::ThreeDays => Duration::days(3),
            Self::OneWeek => Duration::weeks(1),
        }
    }
}

impl fmt::Display for AlarmInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// An alarm attached to a draft.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Alarm {
    /// Opaque identifier, unique per added alarm.
    pub identifier: String,
    pub trigger: AlarmInterval,
}

impl Alarm {
    /// Creates an alarm with a fresh identifier.
    pub fn new(trigger: AlarmInterval) -> Self {
        Self {
            identifier: Uuid::new_v4().to_string(),
            trigger,
        }
    }

    /// Creates an alarm with a known identifier.
    pub fn with_identifier(identifier: impl Into<String>, trigger: AlarmInterval) -> Self {
        Self {
            identifier: identifier.into(),
            trigger,
        }
    }
}

/// Reference from an event to a persisted reminder.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlarmRef {
    pub list_id: String,
    pub element_id: String,
}

impl AlarmRef {
    pub fn new(list_id: impl Into<String>, element_id: impl Into<String>) -> Self {
        Self {
            list_id: list_id.into(),
            element_id: element_id.into(),
        }
    }
}

/// A persisted reminder as returned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAlarm {
    pub id: AlarmRef,
    pub alarm: Alarm,
}
