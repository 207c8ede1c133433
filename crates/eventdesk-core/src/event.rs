//! Persisted calendar event model.
//!
//! This module provides the types an edit session reads from and hands to the
//! store:
//! - [`CalendarEvent`]: the persisted event record
//! - [`EventId`]: the list/element identity of a stored event
//! - [`Attendee`] and [`AttendeeStatus`]: guests and their responses
//! - [`RepeatRule`]: the persisted recurrence specification

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::alarm::AlarmRef;
use crate::time::is_all_day_span;

/// The response status of an attendee.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendeeStatus {
    /// The attendee has not responded.
    #[default]
    NeedsAction,
    /// The attendee has accepted the invitation.
    Accepted,
    /// The attendee has declined the invitation.
    Declined,
    /// The attendee has tentatively accepted.
    Tentative,
}

impl AttendeeStatus {
    /// Returns the wire name of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NeedsAction => "needs_action",
            Self::Accepted => "accepted",
            Self::Declined => "declined",
            Self::Tentative => "tentative",
        }
    }
}

/// A guest of an event, identified by mail address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Attendee {
    /// The attendee's mail address.
    pub address: String,
    /// The attendee's response.
    pub status: AttendeeStatus,
}

impl Attendee {
    /// Creates an attendee who has not responded yet.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            status: AttendeeStatus::NeedsAction,
        }
    }

    /// Builder method to set the response status.
    pub fn with_status(mut self, status: AttendeeStatus) -> Self {
        self.status = status;
        self
    }

    /// Returns true if the address belongs to one of `addresses`.
    pub fn is_one_of(&self, addresses: &[String]) -> bool {
        addresses.iter().any(|a| a == &self.address)
    }
}

/// How often a recurring event repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatPeriod {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

/// How a recurrence ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndType {
    /// Repeats forever.
    #[default]
    Never,
    /// Stops after a number of occurrences.
    Count,
    /// Stops before an exclusive end boundary.
    UntilDate,
}

/// A persisted recurrence rule.
///
/// `end_value` holds the occurrence count for [`EndType::Count`] and the
/// exclusive end boundary in Unix milliseconds for [`EndType::UntilDate`].
/// For all-day events the boundary is encoded as a UTC midnight like the
/// event itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepeatRule {
    pub frequency: RepeatPeriod,
    pub interval: u32,
    pub end_type: EndType,
    pub end_value: Option<i64>,
    /// IANA zone the rule was created in.
    pub time_zone: String,
}

impl RepeatRule {
    /// Creates a never-ending rule.
    pub fn new(frequency: RepeatPeriod, interval: u32, time_zone: impl Into<String>) -> Self {
        Self {
            frequency,
            interval: interval.max(1),
            end_type: EndType::Never,
            end_value: None,
            time_zone: time_zone.into(),
        }
    }

    /// Builder method to stop after `count` occurrences.
    pub fn with_count(mut self, count: u32) -> Self {
        self.end_type = EndType::Count;
        self.end_value = Some(i64::from(count));
        self
    }

    /// Builder method to stop before the exclusive `boundary`.
    pub fn with_until(mut self, boundary: DateTime<Utc>) -> Self {
        self.end_type = EndType::UntilDate;
        self.end_value = Some(boundary.timestamp_millis());
        self
    }

    /// The occurrence count, if the rule ends after a count.
    pub fn count(&self) -> Option<i64> {
        match self.end_type {
            EndType::Count => self.end_value,
            _ => None,
        }
    }

    /// The exclusive end boundary, if the rule ends at a date.
    pub fn until(&self) -> Option<DateTime<Utc>> {
        match self.end_type {
            EndType::UntilDate => self.end_value.and_then(DateTime::from_timestamp_millis),
            _ => None,
        }
    }
}

/// Identity of a stored event: the list it lives in and its element id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId {
    pub list_id: String,
    pub element_id: String,
}

impl EventId {
    /// Creates a new event id.
    pub fn new(list_id: impl Into<String>, element_id: impl Into<String>) -> Self {
        Self {
            list_id: list_id.into(),
            element_id: element_id.into(),
        }
    }
}

/// A calendar event as stored.
///
/// `owner_group` is the group of the calendar the event lives in. It is
/// `None` for events that were never stored, such as invites read from a
/// file. `session_key` and `permissions` are assigned by the server and must
/// be cleared when an event is re-created under a new identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: Option<EventId>,
    pub owner_group: Option<String>,
    pub uid: Option<String>,
    pub sequence: u64,
    pub summary: String,
    pub description: String,
    pub location: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub organizer: Option<String>,
    pub attendees: Vec<Attendee>,
    pub repeat_rule: Option<RepeatRule>,
    pub alarm_infos: Vec<AlarmRef>,
    /// True if this is a local copy of an event organized by someone else.
    pub is_copy: bool,
    pub session_key: Option<String>,
    pub permissions: Option<String>,
}

impl CalendarEvent {
    /// Creates an unsaved event spanning `[start, end)`.
    pub fn new(start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> Self {
        Self {
            id: None,
            owner_group: None,
            uid: None,
            sequence: 0,
            summary: String::new(),
            description: String::new(),
            location: String::new(),
            start_time,
            end_time,
            organizer: None,
            attendees: Vec::new(),
            repeat_rule: None,
            alarm_infos: Vec::new(),
            is_copy: false,
            session_key: None,
            permissions: None,
        }
    }

    /// Builder method to set the id.
    pub fn with_id(mut self, id: EventId) -> Self {
        self.id = Some(id);
        self
    }

    /// Builder method to set the owning calendar group.
    pub fn with_owner_group(mut self, group: impl Into<String>) -> Self {
        self.owner_group = Some(group.into());
        self
    }

    /// Builder method to set the UID.
    pub fn with_uid(mut self, uid: impl Into<String>) -> Self {
        self.uid = Some(uid.into());
        self
    }

    /// Builder method to set the summary.
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    /// Builder method to set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Builder method to set the location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    /// Builder method to set the organizer.
    pub fn with_organizer(mut self, organizer: impl Into<String>) -> Self {
        self.organizer = Some(organizer.into());
        self
    }

    /// Builder method to set the attendees.
    pub fn with_attendees(mut self, attendees: Vec<Attendee>) -> Self {
        self.attendees = attendees;
        self
    }

    /// Builder method to set the recurrence.
    pub fn with_repeat_rule(mut self, rule: RepeatRule) -> Self {
        self.repeat_rule = Some(rule);
        self
    }

    /// Builder method to set the alarm references.
    pub fn with_alarm_infos(mut self, alarms: Vec<AlarmRef>) -> Self {
        self.alarm_infos = alarms;
        self
    }

    /// Builder method to mark the event as a copy of someone else's event.
    pub fn with_copy(mut self, is_copy: bool) -> Self {
        self.is_copy = is_copy;
        self
    }

    /// Builder method to set the sequence number.
    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }

    /// Returns true if the event is stored as an all-day event.
    pub fn is_all_day(&self) -> bool {
        is_all_day_span(self.start_time, self.end_time)
    }

    /// Returns the duration of the event.
    pub fn duration(&self) -> Duration {
        self.end_time - self.start_time
    }

    /// Returns the attendee with the given address.
    pub fn find_attendee(&self, address: &str) -> Option<&Attendee> {
        self.attendees.iter().find(|a| a.address == address)
    }

    /// Returns the first attendee whose address is one of `addresses`.
    pub fn find_own_attendee(&self, addresses: &[String]) -> Option<&Attendee> {
        self.attendees.iter().find(|a| a.is_one_of(addresses))
    }

    /// Returns all attendee addresses in order.
    pub fn attendee_addresses(&self) -> Vec<String> {
        self.attendees.iter().map(|a| a.address.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn all_day_detection() {
        let all_day = CalendarEvent::new(utc(2020, 5, 26, 0), utc(2020, 5, 27, 0));
        assert!(all_day.is_all_day());

        let timed = CalendarEvent::new(utc(2020, 5, 26, 12), utc(2020, 5, 26, 13));
        assert!(!timed.is_all_day());
        assert_eq!(timed.duration(), Duration::hours(1));
    }

    #[test]
    fn own_attendee_lookup() {
        let event = CalendarEvent::new(utc(2020, 5, 26, 12), utc(2020, 5, 26, 13)).with_attendees(
            vec![
                Attendee::new("guest@example.com"),
                Attendee::new("me@example.com").with_status(AttendeeStatus::Accepted),
            ],
        );
        let own = vec!["alias@example.com".to_string(), "me@example.com".to_string()];

        let found = event.find_own_attendee(&own).unwrap();
        assert_eq!(found.status, AttendeeStatus::Accepted);
        assert!(event.find_attendee("guest@example.com").is_some());
        assert!(event.find_attendee("nobody@example.com").is_none());
        assert_eq!(event.attendee_addresses(), vec!["guest@example.com", "me@example.com"]);
    }

    #[test]
    fn repeat_rule_accessors() {
        let boundary = utc(2020, 7, 1, 0);
        let rule = RepeatRule::new(RepeatPeriod::Weekly, 0, "Europe/Berlin").with_until(boundary);
        assert_eq!(rule.interval, 1);
        assert_eq!(rule.until(), Some(boundary));
        assert_eq!(rule.count(), None);

        let counted = RepeatRule::new(RepeatPeriod::Daily, 2, "UTC").with_count(5);
        assert_eq!(counted.count(), Some(5));
        assert_eq!(counted.until(), None);
    }

    #[test]
    fn serde_roundtrip() {
        let event = CalendarEvent::new(utc(2020, 5, 26, 12), utc(2020, 5, 26, 13))
            .with_id(EventId::new("short-events", "element"))
            .with_owner_group("calendar-group")
            .with_summary("Planning")
            .with_attendees(vec![Attendee::new("guest@example.com")])
            .with_repeat_rule(RepeatRule::new(RepeatPeriod::Monthly, 1, "UTC").with_count(3));

        let json = serde_json::to_string(&event).unwrap();
        let parsed: CalendarEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, parsed);
        assert!(json.contains("\"needs_action\""));
        assert!(json.contains("\"monthly\""));
    }
}
