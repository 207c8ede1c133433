//! What the viewer may change on an event.
//!
//! | calendar             | event    | guests | own attendance | organizer        | read only |
//! |----------------------|----------|--------|----------------|------------------|-----------|
//! | own                  | original | yes    | yes            | if no attendees  | no        |
//! | own                  | copy     | no     | yes            | no               | no        |
//! | shared, write        | any      | no     | no             | no               | if attendees |
//! | shared, read         | any      | no     | no             | no               | yes       |
//!
//! New events are never treated as shared.

/// Facts about the viewer, the event and its calendar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PermissionInput {
    pub is_new_event: bool,
    /// The owning calendar is shared with the viewer. False when the calendar
    /// is unknown, e.g. for events imported from a file.
    pub is_shared_calendar: bool,
    pub has_write_capability: bool,
    /// The event is a local copy of an event organized by someone else.
    pub is_copy: bool,
    pub attendee_count: usize,
    /// The organizer of the stored event is one of the viewer's addresses.
    pub is_original_organizer_viewer: bool,
    /// One of the viewer's addresses is among the attendees.
    pub viewer_is_attendee: bool,
}

/// Capabilities derived from a [`PermissionInput`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Permissions {
    pub can_modify_guests: bool,
    pub can_modify_own_attendance: bool,
    pub can_modify_organizer: bool,
    pub read_only: bool,
    /// The viewer edits an event it authored, as opposed to a copy or a
    /// shared calendar's event.
    pub viewing_own_event: bool,
}

impl Permissions {
    pub fn evaluate(input: &PermissionInput) -> Self {
        let shared = !input.is_new_event && input.is_shared_calendar;
        let viewing_own_event =
            input.is_new_event || (!input.is_copy && input.is_original_organizer_viewer);

        let read_only = shared && (!input.has_write_capability || input.attendee_count > 0);

        Self {
            can_modify_guests: !shared && viewing_own_event,
            can_modify_own_attendance: !shared
                && (viewing_own_event || input.is_copy || input.viewer_is_attendee),
            can_modify_organizer: !shared && viewing_own_event && input.attendee_count == 0,
            read_only,
            viewing_own_event,
        }
    }
}
