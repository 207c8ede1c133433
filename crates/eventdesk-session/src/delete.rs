//! Deleting a stored event.

use std::sync::Arc;

use eventdesk_core::CalendarEvent;
use eventdesk_providers::{EventStore, UpdateDistributor};
use tracing::{debug, error, info, warn};

use crate::error::{SessionError, SessionResult};
use crate::session::EventEditSession;

/// Result of [`EventEditSession::delete`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// The event was never stored; nothing to do.
    NotPersisted,
    /// The store no longer had the event.
    AlreadyGone,
}

/// Cancels and deletes events.
#[derive(Clone)]
pub struct DeleteOrchestrator {
    store: Arc<dyn EventStore>,
    distributor: Arc<dyn UpdateDistributor>,
}

impl DeleteOrchestrator {
    pub fn new(store: Arc<dyn EventStore>, distributor: Arc<dyn UpdateDistributor>) -> Self {
        Self { store, distributor }
    }

    /// Deletes `event`, sending a cancellation to all of its attendees
    /// first if `cancel` is set.
    ///
    /// A failed cancellation does not stop the deletion. It is returned as
    /// [`SessionError::Notification`] once the event is gone.
    pub async fn run(&self, event: CalendarEvent, cancel: bool) -> SessionResult<DeleteOutcome> {
        let mut notification_error = None;
        if cancel && !event.attendees.is_empty() {
            let recipients = event.attendee_addresses();
            debug!(recipients = recipients.len(), "cancelling event");
            if let Err(e) = self
                .distributor
                .send_cancellation(event.clone(), recipients)
                .await
            {
                error!(error = %e, "failed to send cancellation, deleting anyway");
                notification_error = Some(e);
            }
        }

        let uid = event.uid.clone();
        let outcome = match self.store.delete_event(event).await {
            Ok(()) => {
                info!(?uid, "event deleted");
                DeleteOutcome::Deleted
            }
            Err(e) if e.is_not_found() => {
                warn!(?uid, error = %e, "event to delete no longer exists");
                DeleteOutcome::AlreadyGone
            }
            Err(e) => return Err(SessionError::Store(e)),
        };

        match notification_error {
            Some(e) => Err(SessionError::Notification(e)),
            None => Ok(outcome),
        }
    }
}

impl EventEditSession {
    /// Deletes the stored event.
    ///
    /// If the viewer organizes the event outside a shared calendar, its
    /// attendees are sent a cancellation first.
    #[tracing::instrument(skip(self), fields(event_uid = ?self.existing.as_ref().and_then(|e| e.uid.as_deref())))]
    pub async fn delete(&self) -> SessionResult<DeleteOutcome> {
        let Some(event) = self.existing.as_ref().filter(|e| e.id.is_some()) else {
            debug!("event was never stored, nothing to delete");
            return Ok(DeleteOutcome::NotPersisted);
        };

        let cancel = self.permissions().viewing_own_event && !self.in_shared_calendar();
        DeleteOrchestrator::new(self.ctx.store.clone(), self.ctx.distributor.clone())
            .run(event.clone(), cancel)
            .await
    }
}
