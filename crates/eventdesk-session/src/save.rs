//! Saving a draft.
//!
//! A save runs through these stages:
//!
//! ```text
//! validating ──► rejected
//!     │
//!     ▼
//!   ready ──► awaiting_confirmation ──resume──► persisted
//!     │
//!     ▼
//! persisted
//! ```
//!
//! The event is always persisted before any guest is notified. When the
//! organizer's edit affects guests that were already invited, the save stops
//! at `awaiting_confirmation` and hands back a [`PendingSave`]; the caller
//! asks the user whether to notify them and resumes it.

use std::sync::{Arc, Weak};

use chrono::Duration;
use eventdesk_core::{
    Alarm, AttendeeDiff, AttendeeStatus, CalendarDescriptor, CalendarEvent, DateTimeNormalizer,
    EventId, RepeatRule, ValidationError, diff_attendees,
};
use eventdesk_providers::{EventStore, ProviderResult, UpdateDistributor};
use tracing::{Span, debug, error, info, warn};
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::draft::{EventDraft, EventSpan};
use crate::error::{SessionError, SessionResult};
use crate::session::EventEditSession;

/// Result of [`EventEditSession::save`].
#[derive(Debug)]
pub enum SaveOutcome {
    /// The event was persisted and new guests were invited.
    Saved,
    /// The draft cannot be saved as entered. Nothing was persisted.
    Rejected(ValidationError),
    /// Nothing was persisted yet; ask whether to notify existing guests and
    /// resume.
    AwaitingConfirmation(PendingSave),
    /// The stored event no longer exists. Nothing was stored or sent.
    AlreadyGone,
}

/// Result of [`PendingSave::resume`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmOutcome {
    Persisted,
    /// The stored event no longer exists. Nothing was stored or sent.
    AlreadyGone,
    /// The session was dismissed before the user answered; nothing happened.
    Discarded,
}

/// How the assembled event is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistAction {
    /// Store under a fresh identity, removing `replaced` if set.
    Create { replaced: Option<CalendarEvent> },
    /// Overwrite the stored event in place.
    Update { prior: CalendarEvent },
}

/// A response of the viewer to someone else's invitation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub responder: String,
    pub status: AttendeeStatus,
}

/// Start, end and recurrence of a draft that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validated {
    pub span: EventSpan,
    pub repeat_rule: Option<RepeatRule>,
}

/// Everything a save will do, decided before anything is done.
#[derive(Debug, Clone)]
pub struct SavePlan {
    pub event: CalendarEvent,
    pub alarms: Vec<Alarm>,
    pub action: PersistAction,
    /// Guest changes; empty unless the viewer organizes the event.
    pub guests: AttendeeDiff,
    pub response: Option<Response>,
    pub needs_confirmation: bool,
}

/// Validates drafts, assembles events and drives the collaborators.
#[derive(Clone)]
pub struct SaveOrchestrator {
    store: Arc<dyn EventStore>,
    distributor: Arc<dyn UpdateDistributor>,
    normalizer: DateTimeNormalizer,
    own_addresses: Vec<String>,
    config: SessionConfig,
}

impl SaveOrchestrator {
    pub fn new(
        store: Arc<dyn EventStore>,
        distributor: Arc<dyn UpdateDistributor>,
        normalizer: DateTimeNormalizer,
        own_addresses: Vec<String>,
        config: SessionConfig,
    ) -> Self {
        Self {
            store,
            distributor,
            normalizer,
            own_addresses,
            config,
        }
    }

    /// Checks times and recurrence of a draft.
    pub fn validate(&self, draft: &EventDraft) -> Result<Validated, ValidationError> {
        let span = draft.span(&self.normalizer)?;
        let repeat_rule = draft.repeat.finalize(draft.all_day, span.start)?;
        Ok(Validated { span, repeat_rule })
    }

    /// Assembles the event to store and decides how to store it and whom to
    /// tell.
    pub fn plan(
        &self,
        draft: &EventDraft,
        validated: Validated,
        existing: Option<&CalendarEvent>,
    ) -> SessionResult<SavePlan> {
        let calendar = draft.calendar.as_ref().ok_or(SessionError::NoCalendars)?;

        let mut event = existing
            .cloned()
            .unwrap_or_else(|| CalendarEvent::new(validated.span.start, validated.span.end));
        event.start_time = validated.span.start;
        event.end_time = validated.span.end;
        event.summary = draft.summary.clone();
        event.description = draft.description.clone();
        event.location = draft.location.clone();
        event.owner_group = Some(calendar.group_id.clone());
        event.repeat_rule = validated.repeat_rule;
        event.organizer = draft.organizer.clone();
        event.attendees = draft.attendees.clone();
        if !event.attendees.is_empty() && event.organizer.is_none() {
            return Err(SessionError::NoMailAddress);
        }
        if event.uid.is_none() {
            event.uid = Some(self.generate_uid());
        }
        if existing.is_some() {
            event.sequence += 1;
        }

        let (guests, response) = if draft.permissions.viewing_own_event {
            let before = existing.map(|e| e.attendees.as_slice()).unwrap_or_default();
            (diff_attendees(before, &draft.attendees, &self.own_addresses), None)
        } else {
            (AttendeeDiff::default(), self.response_for(draft, existing))
        };
        let needs_confirmation = draft.permissions.viewing_own_event && guests.touches_existing();

        let action = match existing {
            Some(prior) if !needs_new_identity(prior, &event) => PersistAction::Update {
                prior: prior.clone(),
            },
            _ => {
                self.assign_identity(&mut event, calendar);
                event.session_key = None;
                event.permissions = None;
                PersistAction::Create {
                    replaced: existing.filter(|e| e.owner_group.is_some()).cloned(),
                }
            }
        };

        Ok(SavePlan {
            event,
            alarms: draft.alarms.to_vec(),
            action,
            guests,
            response,
            needs_confirmation,
        })
    }

    /// Persists the plan and sends what needs no confirmation, or returns a
    /// [`PendingSave`] if it does.
    pub async fn execute(&self, plan: SavePlan, alive: Weak<()>) -> SessionResult<SaveOutcome> {
        if plan.needs_confirmation {
            debug!(
                retained = plan.guests.retained.len(),
                removed = plan.guests.removed.len(),
                "existing guests affected, asking for confirmation"
            );
            return Ok(SaveOutcome::AwaitingConfirmation(PendingSave {
                orchestrator: self.clone(),
                plan,
                alive,
            }));
        }

        if !self.persist(&plan).await? {
            return Ok(SaveOutcome::AlreadyGone);
        }
        if !plan.guests.added.is_empty() {
            let call = self
                .distributor
                .send_invite(plan.event.clone(), plan.guests.added_addresses());
            notify("invite", call).await?;
        }
        if let Some(ref response) = plan.response {
            let call = self.distributor.send_response(
                plan.event.clone(),
                response.responder.clone(),
                response.status,
            );
            notify("response", call).await?;
        }
        Ok(SaveOutcome::Saved)
    }

    /// Runs the store call. Returns false if an update hit an event that no
    /// longer exists.
    async fn persist(&self, plan: &SavePlan) -> SessionResult<bool> {
        let result = match plan.action {
            PersistAction::Create { ref replaced } => {
                self.store
                    .create_event(plan.event.clone(), plan.alarms.clone(), replaced.clone())
                    .await
            }
            PersistAction::Update { ref prior } => {
                self.store
                    .update_event(plan.event.clone(), plan.alarms.clone(), prior.clone())
                    .await
            }
        };

        match result {
            Ok(()) => {
                info!(uid = ?plan.event.uid, sequence = plan.event.sequence, "event persisted");
                Ok(true)
            }
            Err(e) if e.is_not_found() && matches!(plan.action, PersistAction::Update { .. }) => {
                warn!(uid = ?plan.event.uid, error = %e, "event to update no longer exists");
                Ok(false)
            }
            Err(e) => Err(SessionError::Store(e)),
        }
    }

    fn response_for(&self, draft: &EventDraft, existing: Option<&CalendarEvent>) -> Option<Response> {
        if draft.going == AttendeeStatus::NeedsAction {
            return None;
        }
        let own = existing?.find_own_attendee(&self.own_addresses)?;
        (own.status != draft.going).then(|| Response {
            responder: own.address.clone(),
            status: draft.going,
        })
    }

    /// Files the event in the calendar's short or long list under a new
    /// element id.
    fn assign_identity(&self, event: &mut CalendarEvent, calendar: &CalendarDescriptor) {
        let threshold = Duration::days(i64::from(self.config.long_event_threshold_days));
        let list_id = if event.repeat_rule.is_some() || event.duration() > threshold {
            &calendar.long_events_list
        } else {
            &calendar.short_events_list
        };
        let element_id = format!(
            "{}-{}",
            event.start_time.timestamp_millis(),
            Uuid::new_v4().simple()
        );
        debug!(list = %list_id, element = %element_id, "assigned new event id");
        event.id = Some(EventId::new(list_id.clone(), element_id));
    }

    fn generate_uid(&self) -> String {
        format!("{}@{}", Uuid::new_v4().simple(), self.config.uid_domain)
    }
}

/// A stored event must be re-created when it moves to another calendar or
/// its start or recurrence changes, since stored reminders are tied to those.
fn needs_new_identity(prior: &CalendarEvent, event: &CalendarEvent) -> bool {
    prior.owner_group != event.owner_group
        || prior.start_time != event.start_time
        || prior.repeat_rule != event.repeat_rule
}

async fn notify(
    kind: &'static str,
    call: eventdesk_providers::BoxFuture<'_, ProviderResult<()>>,
) -> SessionResult<()> {
    call.await.map_err(|e| {
        error!(kind, error = %e, "failed to notify guests after saving");
        SessionError::Notification(e)
    })
}

/// A save waiting for the user to decide whether existing guests are told.
pub struct PendingSave {
    orchestrator: SaveOrchestrator,
    plan: SavePlan,
    alive: Weak<()>,
}

impl std::fmt::Debug for PendingSave {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingSave")
            .field("uid", &self.plan.event.uid)
            .field("guests", &self.plan.guests)
            .finish_non_exhaustive()
    }
}

impl PendingSave {
    /// What the save will do once resumed.
    pub fn plan(&self) -> &SavePlan {
        &self.plan
    }

    /// Persists the event, then, if `notify` is set, sends updates to
    /// retained guests, invites to added ones and cancellations to removed
    /// ones, in that order.
    ///
    /// Does nothing if the session was dismissed in the meantime.
    #[tracing::instrument(skip(self), fields(event_uid = ?self.plan.event.uid, stage = "awaiting_confirmation"))]
    pub async fn resume(self, notify_guests: bool) -> SessionResult<ConfirmOutcome> {
        if self.alive.upgrade().is_none() {
            debug!("session dismissed, dropping pending save");
            return Ok(ConfirmOutcome::Discarded);
        }

        let Self {
            orchestrator, plan, ..
        } = self;
        if !orchestrator.persist(&plan).await? {
            Span::current().record("stage", "gone");
            return Ok(ConfirmOutcome::AlreadyGone);
        }
        Span::current().record("stage", "persisted");
        if !notify_guests {
            return Ok(ConfirmOutcome::Persisted);
        }

        let distributor = &orchestrator.distributor;
        let guests = &plan.guests;
        if !guests.retained.is_empty() {
            let call = distributor.send_update(plan.event.clone(), guests.retained_addresses());
            notify("update", call).await?;
        }
        if !guests.added.is_empty() {
            let call = distributor.send_invite(plan.event.clone(), guests.added_addresses());
            notify("invite", call).await?;
        }
        if !guests.removed.is_empty() {
            let call = distributor.send_cancellation(plan.event.clone(), guests.removed_addresses());
            notify("cancellation", call).await?;
        }
        Ok(ConfirmOutcome::Persisted)
    }
}

impl EventEditSession {
    pub(crate) fn save_orchestrator(&self) -> SaveOrchestrator {
        SaveOrchestrator::new(
            self.ctx.store.clone(),
            self.ctx.distributor.clone(),
            self.normalizer,
            self.ctx.viewer.own_addresses.clone(),
            self.ctx.config.clone(),
        )
    }

    /// Validates the draft and saves it.
    ///
    /// Waits for a pending alarm load first, so stored reminders are kept.
    ///
    /// Validation failures are returned as [`SaveOutcome::Rejected`] without
    /// touching any collaborator. Store failures abort before any guest is
    /// notified; notification failures are returned after the event was
    /// persisted.
    #[tracing::instrument(skip(self), fields(event_uid = tracing::field::Empty, stage = "validating"))]
    pub async fn save(&self) -> SessionResult<SaveOutcome> {
        let span = Span::current();
        self.alarms_loaded().await;
        let draft = self.snapshot();
        let orchestrator = self.save_orchestrator();

        let validated = match orchestrator.validate(&draft) {
            Ok(validated) => validated,
            Err(reason) => {
                span.record("stage", "rejected");
                info!(reason = reason.code(), "draft rejected");
                return Ok(SaveOutcome::Rejected(reason));
            }
        };

        let plan = orchestrator.plan(&draft, validated, self.existing.as_ref())?;
        span.record("event_uid", plan.event.uid.as_deref().unwrap_or_default());
        span.record("stage", "ready");

        let outcome = orchestrator.execute(plan, Arc::downgrade(&self.alive)).await?;
        match outcome {
            SaveOutcome::AwaitingConfirmation(_) => span.record("stage", "awaiting_confirmation"),
            SaveOutcome::AlreadyGone => span.record("stage", "gone"),
            _ => span.record("stage", "persisted"),
        };
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use chrono_tz::Europe;
    use eventdesk_core::{
        Attendee, PermissionInput, Permissions, RecurrenceRuleBuilder, RepeatPeriod,
    };
    use eventdesk_providers::{RecordingDistributor, RecordingStore};

    fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn orchestrator() -> SaveOrchestrator {
        SaveOrchestrator::new(
            Arc::new(RecordingStore::new()),
            Arc::new(RecordingDistributor::new()),
            DateTimeNormalizer::new(Europe::Berlin),
            vec!["me@example.com".to_string()],
            SessionConfig::default(),
        )
    }

    fn draft_for(event: Option<&CalendarEvent>) -> EventDraft {
        let normalizer = DateTimeNormalizer::new(Europe::Berlin);
        EventDraft {
            summary: "Planning".to_string(),
            location: String::new(),
            description: String::new(),
            start_date: chrono::NaiveDate::from_ymd_opt(2020, 5, 26).unwrap(),
            end_date: chrono::NaiveDate::from_ymd_opt(2020, 5, 26).unwrap(),
            start_time: "12:00".to_string(),
            end_time: "13:00".to_string(),
            all_day: false,
            organizer: Some("me@example.com".to_string()),
            attendees: event.map(|e| e.attendees.clone()).unwrap_or_default(),
            repeat: RecurrenceRuleBuilder::new(normalizer),
            alarms: Arc::from(Vec::new()),
            going: AttendeeStatus::NeedsAction,
            permissions: Permissions::evaluate(&PermissionInput {
                is_new_event: event.is_none(),
                has_write_capability: true,
                is_original_organizer_viewer: true,
                ..Default::default()
            }),
            calendar: Some(CalendarDescriptor::owned("own", "Private")),
        }
    }

    fn stored() -> CalendarEvent {
        CalendarEvent::new(utc(2020, 5, 26, 10), utc(2020, 5, 26, 11))
            .with_id(EventId::new("own-short", "e1"))
            .with_owner_group("own")
            .with_uid("uid-1")
            .with_sequence(4)
            .with_organizer("me@example.com")
    }

    fn plan(draft: &EventDraft, existing: Option<&CalendarEvent>) -> SavePlan {
        let o = orchestrator();
        let validated = o.validate(draft).unwrap();
        o.plan(draft, validated, existing).unwrap()
    }

    #[test]
    fn new_event_is_created_in_short_list() {
        let plan = plan(&draft_for(None), None);
        assert_eq!(plan.action, PersistAction::Create { replaced: None });
        let id = plan.event.id.unwrap();
        assert_eq!(id.list_id, "own-short");
        assert!(id.element_id.starts_with(&utc(2020, 5, 26, 10).timestamp_millis().to_string()));
        assert!(plan.event.uid.unwrap().ends_with("@eventdesk"));
        assert_eq!(plan.event.sequence, 0);
    }

    #[test]
    fn repeating_and_long_events_use_long_list() {
        let mut draft = draft_for(None);
        draft.repeat.set_frequency(Some(RepeatPeriod::Weekly));
        assert_eq!(plan(&draft, None).event.id.unwrap().list_id, "own-long");

        let mut draft = draft_for(None);
        draft.end_date = chrono::NaiveDate::from_ymd_opt(2020, 6, 20).unwrap();
        assert_eq!(plan(&draft, None).event.id.unwrap().list_id, "own-long");
    }

    #[test]
    fn unchanged_identity_updates_in_place() {
        let existing = stored();
        let plan = plan(&draft_for(Some(&existing)), Some(&existing));
        assert_eq!(
            plan.action,
            PersistAction::Update {
                prior: existing.clone()
            }
        );
        assert_eq!(plan.event.id, existing.id);
        assert_eq!(plan.event.uid.as_deref(), Some("uid-1"));
        assert_eq!(plan.event.sequence, 5);
    }

    #[test]
    fn moved_start_replaces_event() {
        let mut existing = stored();
        existing.session_key = Some("key".to_string());
        existing.permissions = Some("perm".to_string());
        let mut draft = draft_for(Some(&existing));
        draft.start_time = "11:00".to_string();

        let plan = plan(&draft, Some(&existing));
        assert_eq!(
            plan.action,
            PersistAction::Create {
                replaced: Some(existing.clone())
            }
        );
        assert_ne!(plan.event.id, existing.id);
        assert_eq!(plan.event.uid.as_deref(), Some("uid-1"));
        assert_eq!(plan.event.session_key, None);
        assert_eq!(plan.event.permissions, None);
    }

    #[test]
    fn imported_event_is_not_passed_as_replaced() {
        let imported = CalendarEvent::new(utc(2020, 5, 26, 10), utc(2020, 5, 26, 11))
            .with_uid("invite@elsewhere");
        let plan = plan(&draft_for(Some(&imported)), Some(&imported));
        assert_eq!(plan.action, PersistAction::Create { replaced: None });
        assert_eq!(plan.event.owner_group.as_deref(), Some("own"));
    }

    #[test]
    fn changed_recurrence_replaces_event() {
        let existing = stored();
        let mut draft = draft_for(Some(&existing));
        draft.repeat.set_frequency(Some(RepeatPeriod::Daily));
        let plan = plan(&draft, Some(&existing));
        assert!(matches!(plan.action, PersistAction::Create { .. }));
        assert_eq!(plan.event.id.unwrap().list_id, "own-long");
    }

    #[test]
    fn guests_without_organizer_are_refused() {
        let mut draft = draft_for(None);
        draft.organizer = None;
        draft.attendees = vec![Attendee::new("guest@example.com")];
        let o = orchestrator();
        let validated = o.validate(&draft).unwrap();
        assert!(matches!(
            o.plan(&draft, validated, None),
            Err(SessionError::NoMailAddress)
        ));
    }

    #[test]
    fn missing_calendar_is_refused() {
        let mut draft = draft_for(None);
        draft.calendar = None;
        let o = orchestrator();
        let validated = o.validate(&draft).unwrap();
        assert!(matches!(
            o.plan(&draft, validated, None),
            Err(SessionError::NoCalendars)
        ));
    }

    #[test]
    fn retained_guests_need_confirmation() {
        let existing = stored().with_attendees(vec![Attendee::new("old@example.com")]);
        let plan = plan(&draft_for(Some(&existing)), Some(&existing));
        assert!(plan.needs_confirmation);
        assert_eq!(plan.guests.retained_addresses(), vec!["old@example.com"]);
    }

    #[test]
    fn until_before_start_is_rejected() {
        let mut draft = draft_for(None);
        draft.repeat.set_frequency(Some(RepeatPeriod::Daily));
        draft
            .repeat
            .set_end_type(eventdesk_core::EndType::UntilDate, draft.start_date);
        draft
            .repeat
            .set_end_date(chrono::NaiveDate::from_ymd_opt(2020, 5, 1).unwrap());
        assert_eq!(
            orchestrator().validate(&draft),
            Err(ValidationError::StartNotBeforeEnd)
        );
    }
}
