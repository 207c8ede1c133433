//! Snapshot of an edit session's working state.

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use eventdesk_core::{
    Alarm, Attendee, AttendeeStatus, CalendarDescriptor, DateTimeNormalizer, Permissions,
    RecurrenceRuleBuilder, TimeOfDay, ValidationError, encode_all_day_boundary,
};

/// Everything the user entered, frozen for saving.
///
/// Times are kept as typed; they are only parsed when the draft is saved.
#[derive(Debug, Clone)]
pub struct EventDraft {
    pub summary: String,
    pub location: String,
    pub description: String,
    pub start_date: NaiveDate,
    /// Last day of the event, inclusive.
    pub end_date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub all_day: bool,
    pub organizer: Option<String>,
    pub attendees: Vec<Attendee>,
    pub repeat: RecurrenceRuleBuilder,
    pub alarms: Arc<[Alarm]>,
    /// The viewer's own response.
    pub going: AttendeeStatus,
    pub permissions: Permissions,
    pub calendar: Option<CalendarDescriptor>,
}

/// Start and end instants of a validated draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventSpan {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl EventDraft {
    /// Computes the stored start and end instants.
    ///
    /// All-day drafts become UTC midnights, ending at the boundary after the
    /// last day. Timed drafts combine dates and times in the normalizer's zone.
    pub fn span(&self, normalizer: &DateTimeNormalizer) -> Result<EventSpan, ValidationError> {
        let (start, end) = if self.all_day {
            (
                encode_all_day_boundary(self.start_date),
                encode_all_day_boundary(self.end_date) + Duration::days(1),
            )
        } else {
            let start = TimeOfDay::parse(&self.start_time).ok_or(ValidationError::InvalidTimeFormat)?;
            let end = TimeOfDay::parse(&self.end_time).ok_or(ValidationError::InvalidTimeFormat)?;
            (
                normalizer.to_canonical_instant(self.start_date, start),
                normalizer.to_canonical_instant(self.end_date, end),
            )
        };

        if end <= start {
            return Err(ValidationError::StartNotBeforeEnd);
        }
        Ok(EventSpan { start, end })
    }
}
