//! EventStore trait definition.
//!
//! The [`EventStore`] is where an edit session loads reminders from and
//! persists events to. Implementations wrap the entity service of the host
//! application. They are responsible for:
//! - Loading persisted reminders referenced by an event
//! - Creating events under a new identity, removing the one they replace
//! - Updating events in place
//! - Deleting events

use std::future::Future;
use std::pin::Pin;

use eventdesk_core::{Alarm, AlarmRef, CalendarEvent, UserAlarm};

use crate::error::{ProviderError, ProviderResult};

/// A boxed future for async trait methods.
///
/// Boxed futures keep the collaborator traits object-safe, so sessions can
/// hold them as `Arc<dyn EventStore>`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Persistence for calendar events.
///
/// All methods may fail with [`ProviderErrorCode::NotFound`] when the entity
/// no longer exists, or with a transport error.
///
/// [`ProviderErrorCode::NotFound`]: crate::error::ProviderErrorCode::NotFound
pub trait EventStore: Send + Sync {
    /// Returns the name of this store (e.g., "tutadb", "memory").
    fn name(&self) -> &str;

    /// Loads a persisted reminder.
    fn load_alarm(&self, id: AlarmRef) -> BoxFuture<'_, ProviderResult<UserAlarm>>;

    /// Stores `event` under its (new) identity.
    ///
    /// When `replaced` is set, the store removes that event as part of the
    /// same operation.
    fn create_event(
        &self,
        event: CalendarEvent,
        alarms: Vec<Alarm>,
        replaced: Option<CalendarEvent>,
    ) -> BoxFuture<'_, ProviderResult<()>>;

    /// Overwrites the stored `prior` version of an event with `event`.
    fn update_event(
        &self,
        event: CalendarEvent,
        alarms: Vec<Alarm>,
        prior: CalendarEvent,
    ) -> BoxFuture<'_, ProviderResult<()>>;

    /// Deletes a stored event.
    fn delete_event(&self, event: CalendarEvent) -> BoxFuture<'_, ProviderResult<()>>;
}

/// A store that rejects every operation.
///
/// Useful as a placeholder when the real store failed to initialize, or in
/// tests that must not touch persistence.
#[derive(Debug)]
pub struct ErrorStore {
    name: String,
    error: ProviderError,
}

impl ErrorStore {
    /// Creates a new error store.
    pub fn new(name: impl Into<String>, error: ProviderError) -> Self {
        Self {
            name: name.into(),
            error,
        }
    }

    fn fail<T: Send + 'static>(&self) -> BoxFuture<'_, ProviderResult<T>> {
        let error = self.error.duplicate().with_provider(&self.name);
        Box::pin(async move { Err(error) })
    }
}

impl EventStore for ErrorStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn load_alarm(&self, _id: AlarmRef) -> BoxFuture<'_, ProviderResult<UserAlarm>> {
        self.fail()
    }

    fn create_event(
        &self,
        _event: CalendarEvent,
        _alarms: Vec<Alarm>,
        _replaced: Option<CalendarEvent>,
    ) -> BoxFuture<'_, ProviderResult<()>> {
        self.fail()
    }

    fn update_event(
        &self,
        _event: CalendarEvent,
        _alarms: Vec<Alarm>,
        _prior: CalendarEvent,
    ) -> BoxFuture<'_, ProviderResult<()>> {
        self.fail()
    }

    fn delete_event(&self, _event: CalendarEvent) -> BoxFuture<'_, ProviderResult<()>> {
        self.fail()
    }
}
