//! UpdateDistributor trait definition.

use eventdesk_core::{AttendeeStatus, CalendarEvent};

use crate::error::ProviderResult;
use crate::store::BoxFuture;

/// Sends calendar messages about an event to its guests.
///
/// Each method sends one message for `event` to every recipient. Failures
/// are reported to the caller; the event has already been persisted by then.
pub trait UpdateDistributor: Send + Sync {
    /// Returns the name of this distributor (e.g., "mail").
    fn name(&self) -> &str;

    /// Invites guests that were not invited before.
    fn send_invite(
        &self,
        event: CalendarEvent,
        recipients: Vec<String>,
    ) -> BoxFuture<'_, ProviderResult<()>>;

    /// Tells invited guests the event changed.
    fn send_update(
        &self,
        event: CalendarEvent,
        recipients: Vec<String>,
    ) -> BoxFuture<'_, ProviderResult<()>>;

    /// Tells guests the event was cancelled, or that they were removed.
    fn send_cancellation(
        &self,
        event: CalendarEvent,
        recipients: Vec<String>,
    ) -> BoxFuture<'_, ProviderResult<()>>;

    /// Sends the viewer's response to the organizer.
    fn send_response(
        &self,
        event: CalendarEvent,
        responder: String,
        status: AttendeeStatus,
    ) -> BoxFuture<'_, ProviderResult<()>>;
}
