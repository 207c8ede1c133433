//! In-memory collaborators that record every call.
//!
//! [`RecordingStore`] and [`RecordingDistributor`] stand in for the real
//! store and mail transport in tests and offline hosts. Failures can be
//! scripted per operation.

use std::collections::HashMap;

use eventdesk_core::{Alarm, AlarmRef, AttendeeStatus, CalendarEvent, UserAlarm};
use tokio::sync::RwLock;
use tracing::debug;

use crate::distributor::UpdateDistributor;
use crate::error::{ProviderError, ProviderErrorCode, ProviderResult};
use crate::store::{BoxFuture, EventStore};

/// Operations of an [`EventStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    LoadAlarm,
    Create,
    Update,
    Delete,
}

/// A recorded store call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    LoadAlarm {
        id: AlarmRef,
    },
    Create {
        event: CalendarEvent,
        alarms: Vec<Alarm>,
        replaced: Option<CalendarEvent>,
    },
    Update {
        event: CalendarEvent,
        alarms: Vec<Alarm>,
        prior: CalendarEvent,
    },
    Delete {
        event: CalendarEvent,
    },
}

impl StoreCall {
    pub fn op(&self) -> StoreOp {
        match self {
            Self::LoadAlarm { .. } => StoreOp::LoadAlarm,
            Self::Create { .. } => StoreOp::Create,
            Self::Update { .. } => StoreOp::Update,
            Self::Delete { .. } => StoreOp::Delete,
        }
    }
}

/// An [`EventStore`] that keeps reminders in memory and logs every call.
#[derive(Debug, Default)]
pub struct RecordingStore {
    alarms: RwLock<HashMap<AlarmRef, UserAlarm>>,
    failures: RwLock<HashMap<StoreOp, ProviderErrorCode>>,
    calls: RwLock<Vec<StoreCall>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to add a persisted reminder.
    pub fn with_alarm(mut self, alarm: UserAlarm) -> Self {
        self.alarms.get_mut().insert(alarm.id.clone(), alarm);
        self
    }

    /// Builder method to make an operation fail with `code`.
    pub fn with_failure(mut self, op: StoreOp, code: ProviderErrorCode) -> Self {
        self.failures.get_mut().insert(op, code);
        self
    }

    /// Makes an operation fail with `code` from now on.
    pub async fn fail(&self, op: StoreOp, code: ProviderErrorCode) {
        self.failures.write().await.insert(op, code);
    }

    /// Returns all calls in order.
    pub async fn calls(&self) -> Vec<StoreCall> {
        self.calls.read().await.clone()
    }

    /// Returns the calls that changed the store, skipping reminder loads.
    pub async fn writes(&self) -> Vec<StoreCall> {
        self.calls
            .read()
            .await
            .iter()
            .filter(|c| c.op() != StoreOp::LoadAlarm)
            .cloned()
            .collect()
    }

    async fn record(&self, call: StoreCall) -> ProviderResult<()> {
        let op = call.op();
        debug!(?op, "store call");
        self.calls.write().await.push(call);
        match self.failures.read().await.get(&op) {
            Some(code) => {
                Err(ProviderError::new(*code, format!("{op:?} failed")).with_provider("recording"))
            }
            None => Ok(()),
        }
    }
}

impl EventStore for RecordingStore {
    fn name(&self) -> &str {
        "recording"
    }

    fn load_alarm(&self, id: AlarmRef) -> BoxFuture<'_, ProviderResult<UserAlarm>> {
        Box::pin(async move {
            self.record(StoreCall::LoadAlarm { id: id.clone() }).await?;
            self.alarms.read().await.get(&id).cloned().ok_or_else(|| {
                ProviderError::not_found(format!("alarm {}/{}", id.list_id, id.element_id))
                    .with_provider("recording")
            })
        })
    }

    fn create_event(
        &self,
        event: CalendarEvent,
        alarms: Vec<Alarm>,
        replaced: Option<CalendarEvent>,
    ) -> BoxFuture<'_, ProviderResult<()>> {
        Box::pin(self.record(StoreCall::Create {
            event,
            alarms,
            replaced,
        }))
    }

    fn update_event(
        &self,
        event: CalendarEvent,
        alarms: Vec<Alarm>,
        prior: CalendarEvent,
    ) -> BoxFuture<'_, ProviderResult<()>> {
        Box::pin(self.record(StoreCall::Update {
            event,
            alarms,
            prior,
        }))
    }

    fn delete_event(&self, event: CalendarEvent) -> BoxFuture<'_, ProviderResult<()>> {
        Box::pin(self.record(StoreCall::Delete { event }))
    }
}

/// A recorded distributor call, without the event so it reads well in
/// snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DistributorCall {
    Invite { recipients: Vec<String> },
    Update { recipients: Vec<String> },
    Cancellation { recipients: Vec<String> },
    Response { responder: String, status: AttendeeStatus },
}

/// Kinds of [`DistributorCall`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Invite,
    Update,
    Cancellation,
    Response,
}

impl DistributorCall {
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::Invite { .. } => MessageKind::Invite,
            Self::Update { .. } => MessageKind::Update,
            Self::Cancellation { .. } => MessageKind::Cancellation,
            Self::Response { .. } => MessageKind::Response,
        }
    }
}

/// An [`UpdateDistributor`] that logs every message instead of sending it.
#[derive(Debug, Default)]
pub struct RecordingDistributor {
    failures: RwLock<HashMap<MessageKind, ProviderErrorCode>>,
    calls: RwLock<Vec<(DistributorCall, CalendarEvent)>>,
}

impl RecordingDistributor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to make a message kind fail with `code`.
    pub fn with_failure(mut self, kind: MessageKind, code: ProviderErrorCode) -> Self {
        self.failures.get_mut().insert(kind, code);
        self
    }

    /// Returns all calls in order.
    pub async fn calls(&self) -> Vec<DistributorCall> {
        self.calls.read().await.iter().map(|(c, _)| c.clone()).collect()
    }

    /// Returns the events the messages were sent for, in call order.
    pub async fn events(&self) -> Vec<CalendarEvent> {
        self.calls.read().await.iter().map(|(_, e)| e.clone()).collect()
    }

    async fn record(&self, call: DistributorCall, event: CalendarEvent) -> ProviderResult<()> {
        let kind = call.kind();
        debug!(?kind, uid = ?event.uid, "distributor call");
        self.calls.write().await.push((call, event));
        match self.failures.read().await.get(&kind) {
            Some(code) => {
                Err(ProviderError::new(*code, format!("{kind:?} failed")).with_provider("recording"))
            }
            None => Ok(()),
        }
    }
}

impl UpdateDistributor for RecordingDistributor {
    fn name(&self) -> &str {
        "recording"
    }

    fn send_invite(
        &self,
        event: CalendarEvent,
        recipients: Vec<String>,
    ) -> BoxFuture<'_, ProviderResult<()>> {
        Box::pin(self.record(DistributorCall::Invite { recipients }, event))
    }

    fn send_update(
        &self,
        event: CalendarEvent,
        recipients: Vec<String>,
    ) -> BoxFuture<'_, ProviderResult<()>> {
        Box::pin(self.record(DistributorCall::Update { recipients }, event))
    }

    fn send_cancellation(
        &self,
        event: CalendarEvent,
        recipients: Vec<String>,
    ) -> BoxFuture<'_, ProviderResult<()>> {
        Box::pin(self.record(DistributorCall::Cancellation { recipients }, event))
    }

    fn send_response(
        &self,
        event: CalendarEvent,
        responder: String,
        status: AttendeeStatus,
    ) -> BoxFuture<'_, ProviderResult<()>> {
        Box::pin(self.record(DistributorCall::Response { responder, status }, event))
    }
}
