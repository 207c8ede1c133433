//! Core types: event model, time normalization, recurrence, permissions, guest diffs

pub mod alarm;
pub mod calendar;
pub mod diff;
pub mod event;
pub mod permissions;
pub mod recurrence;
pub mod time;
pub mod tracing;
pub mod validation;

pub use alarm::{Alarm, AlarmInterval, AlarmRef, UserAlarm};
pub use calendar::{CalendarDescriptor, ShareCapability, Viewer};
pub use diff::{AttendeeDiff, diff_attendees};
pub use event::{Attendee, AttendeeStatus, CalendarEvent, EndType, EventId, RepeatPeriod, RepeatRule};
pub use permissions::{PermissionInput, Permissions};
pub use recurrence::{RecurrenceRuleBuilder, RepeatDraft, RepeatEnd};
pub use time::{
    DateTimeNormalizer, TimeFormat, TimeOfDay, decode_all_day_to_local_date,
    encode_all_day_boundary, is_all_day_span,
};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
pub use validation::ValidationError;
