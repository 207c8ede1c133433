//! The edit session: draft state and the operations an editor calls.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use eventdesk_core::{
    Alarm, AlarmInterval, AlarmRef, Attendee, AttendeeStatus, CalendarDescriptor, CalendarEvent,
    DateTimeNormalizer, EndType, PermissionInput, Permissions, RecurrenceRuleBuilder, RepeatDraft,
    RepeatPeriod, TimeFormat, TimeOfDay, Viewer, decode_all_day_to_local_date,
};
use eventdesk_providers::{EventStore, UpdateDistributor};
use tracing::{debug, warn};

use crate::config::SessionConfig;
use crate::draft::EventDraft;
use crate::error::{SessionError, SessionResult};
use crate::observable::Observable;

/// Dates before this year cannot be used as event start.
const FIRST_SUPPORTED_YEAR: i32 = 1970;

/// Everything a session needs from its host.
#[derive(Clone)]
pub struct SessionContext {
    pub viewer: Viewer,
    /// Calendars the viewer can see, in display order.
    pub calendars: Vec<CalendarDescriptor>,
    /// Zone the viewer edits in.
    pub zone: Tz,
    pub config: SessionConfig,
    pub store: Arc<dyn EventStore>,
    pub distributor: Arc<dyn UpdateDistributor>,
}

impl SessionContext {
    pub fn new(
        viewer: Viewer,
        calendars: Vec<CalendarDescriptor>,
        zone: Tz,
        store: Arc<dyn EventStore>,
        distributor: Arc<dyn UpdateDistributor>,
    ) -> Self {
        Self {
            viewer,
            calendars,
            zone,
            config: SessionConfig::default(),
            store,
            distributor,
        }
    }

    /// Builder: set configuration.
    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    fn calendar_for_group(&self, group: Option<&str>) -> Option<&CalendarDescriptor> {
        let group = group?;
        self.calendars.iter().find(|c| c.group_id == group)
    }

    /// The calendar new events go to: the first one the viewer owns.
    fn default_calendar(&self) -> SessionResult<&CalendarDescriptor> {
        self.calendars
            .iter()
            .find(|c| !c.is_shared)
            .or_else(|| self.calendars.first())
            .ok_or(SessionError::NoCalendars)
    }
}

/// Working model of one event being created or edited.
///
/// The session is the single writer of its draft. Editors watch the
/// observable fields and call the operations below; [`save`] and [`delete`]
/// hand a frozen copy of the draft to the collaborators.
///
/// [`save`]: EventEditSession::save
/// [`delete`]: EventEditSession::delete
pub struct EventEditSession {
    pub(crate) ctx: SessionContext,
    pub(crate) normalizer: DateTimeNormalizer,
    pub(crate) existing: Option<CalendarEvent>,
    original_calendar: Option<CalendarDescriptor>,

    summary: Observable<String>,
    location: Observable<String>,
    all_day: Observable<bool>,
    selected_calendar: Observable<Option<CalendarDescriptor>>,
    alarms: Observable<Arc<[Alarm]>>,
    /// True while persisted alarms are being loaded.
    alarms_loading: Observable<bool>,

    description: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    start_time: String,
    end_time: String,
    organizer: Option<String>,
    attendees: Vec<Attendee>,
    repeat: RecurrenceRuleBuilder,
    going: AttendeeStatus,

    /// Dropped with the session; background work holds a weak reference.
    pub(crate) alive: Arc<()>,
}

impl std::fmt::Debug for EventEditSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEditSession")
            .field("existing", &self.existing.as_ref().and_then(|e| e.uid.as_deref()))
            .field("summary", &self.summary.get())
            .field("start_date", &self.start_date)
            .field("end_date", &self.end_date)
            .field("all_day", &self.all_day.get())
            .finish_non_exhaustive()
    }
}

impl EventEditSession {
    /// Starts a draft for a new event at `at`.
    ///
    /// The draft starts at the local time of `at` and lasts the configured
    /// default duration.
    pub fn new_event(ctx: SessionContext, at: DateTime<Utc>) -> SessionResult<Self> {
        let normalizer = DateTimeNormalizer::new(ctx.zone);
        let calendar = ctx.default_calendar()?.clone();
        let end = at + Duration::minutes(i64::from(ctx.config.default_duration_minutes));
        let format = ctx.config.time_format;

        debug!(calendar = %calendar.group_id, "new event draft");

        Ok(Self {
            normalizer,
            existing: None,
            original_calendar: None,
            summary: Observable::default(),
            location: Observable::default(),
            all_day: Observable::new(ctx.config.new_events_all_day),
            selected_calendar: Observable::new(Some(calendar)),
            alarms: Observable::new(Arc::from(Vec::new())),
            alarms_loading: Observable::new(false),
            description: String::new(),
            start_date: normalizer.local_date(at),
            end_date: normalizer.local_date(end),
            start_time: normalizer.local_time(at).format(format),
            end_time: normalizer.local_time(end).format(format),
            organizer: ctx.viewer.default_sender.clone(),
            attendees: Vec::new(),
            repeat: RecurrenceRuleBuilder::new(normalizer)
                .with_until_seed_period(ctx.config.default_until_period),
            going: AttendeeStatus::NeedsAction,
            alive: Arc::new(()),
            ctx,
        })
    }

    /// Opens a stored (or imported) event for editing.
    ///
    /// The event's persisted reminders are loaded in the background on the
    /// current Tokio runtime; see [`alarms_loaded`]. Outside a runtime they
    /// are not loaded.
    ///
    /// [`alarms_loaded`]: EventEditSession::alarms_loaded
    pub fn edit_existing(ctx: SessionContext, event: CalendarEvent) -> SessionResult<Self> {
        let normalizer = DateTimeNormalizer::new(ctx.zone);
        let format = ctx.config.time_format;
        let original_calendar = ctx
            .calendar_for_group(event.owner_group.as_deref())
            .cloned();
        let selected = match original_calendar {
            Some(ref calendar) => calendar.clone(),
            None => ctx.default_calendar()?.clone(),
        };

        let all_day = event.is_all_day();
        let (start_date, end_date, start_time, end_time) = if all_day {
            let end = decode_all_day_to_local_date(event.end_time);
            (
                decode_all_day_to_local_date(event.start_time),
                end.pred_opt().unwrap_or(end),
                TimeOfDay::MIDNIGHT.format(format),
                TimeOfDay::MIDNIGHT.format(format),
            )
        } else {
            (
                normalizer.local_date(event.start_time),
                normalizer.local_date(event.end_time),
                normalizer.local_time(event.start_time).format(format),
                normalizer.local_time(event.end_time).format(format),
            )
        };

        let repeat = match event.repeat_rule {
            Some(ref rule) => RecurrenceRuleBuilder::from_rule(normalizer, rule, all_day),
            None => RecurrenceRuleBuilder::new(normalizer),
        }
        .with_until_seed_period(ctx.config.default_until_period);

        let going = event
            .find_own_attendee(&ctx.viewer.own_addresses)
            .map(|a| a.status)
            .unwrap_or_default();

        debug!(
            uid = ?event.uid,
            shared = original_calendar.as_ref().is_some_and(|c| c.is_shared),
            all_day,
            "editing existing event"
        );

        let session = Self {
            normalizer,
            original_calendar,
            summary: Observable::new(event.summary.clone()),
            location: Observable::new(event.location.clone()),
            all_day: Observable::new(all_day),
            selected_calendar: Observable::new(Some(selected)),
            alarms: Observable::new(Arc::from(Vec::new())),
            alarms_loading: Observable::new(false),
            description: event.description.clone(),
            start_date,
            end_date,
            start_time,
            end_time,
            organizer: event
                .organizer
                .clone()
                .or_else(|| ctx.viewer.default_sender.clone()),
            attendees: event.attendees.clone(),
            repeat,
            going,
            alive: Arc::new(()),
            existing: Some(event),
            ctx,
        };
        session.start_alarm_load();
        Ok(session)
    }

    /// Spawns [`load_alarms`](Self::load_alarms) if there is anything to load.
    fn start_alarm_load(&self) {
        let Some(load) = self.load_alarms() else {
            return;
        };
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                warn!("no async runtime, persisted alarms not loaded");
                return;
            }
        };
        let loading = self.alarms_loading.clone();
        loading.set(true);
        handle.spawn(async move {
            let loaded = load.await;
            debug!(loaded, "persisted alarms loaded");
            loading.set(false);
        });
    }

    /// Loads the event's persisted reminders into the alarm list.
    ///
    /// Only reminders from the viewer's own reminder list are loaded. If the
    /// session is dropped before a reminder arrives, the reminder is
    /// discarded. Resolves to the number of alarms added; `None` if there is
    /// nothing to load.
    fn load_alarms(&self) -> Option<impl Future<Output = usize> + Send + 'static> {
        let refs: Vec<AlarmRef> = match (&self.existing, &self.ctx.viewer.alarm_list_id) {
            (Some(event), Some(list)) => event
                .alarm_infos
                .iter()
                .filter(|r| &r.list_id == list)
                .cloned()
                .collect(),
            _ => Vec::new(),
        };
        if refs.is_empty() {
            return None;
        }
        let store = self.ctx.store.clone();
        let alarms = self.alarms.clone();
        let alive = Arc::downgrade(&self.alive);

        Some(async move {
            let mut loaded = 0;
            for id in refs {
                match store.load_alarm(id.clone()).await {
                    Ok(user_alarm) => {
                        if alive.upgrade().is_none() {
                            debug!("session dismissed, discarding loaded alarms");
                            break;
                        }
                        alarms.update(|current| {
                            current.iter().cloned().chain([user_alarm.alarm]).collect()
                        });
                        loaded += 1;
                    }
                    Err(e) => {
                        warn!(list = %id.list_id, element = %id.element_id, error = %e, "failed to load alarm");
                    }
                }
            }
            loaded
        })
    }

    /// Waits until the background alarm load started by
    /// [`edit_existing`](Self::edit_existing) has finished.
    pub async fn alarms_loaded(&self) {
        let mut rx = self.alarms_loading.subscribe();
        let _ = rx.wait_for(|loading| !loading).await;
    }

    /// Ends the session. Pending background work and continuations become
    /// no-ops.
    pub fn dismiss(self) {
        debug!("edit session dismissed");
    }

    // ----- observable fields -------------------------------------------

    pub fn summary(&self) -> &Observable<String> {
        &self.summary
    }

    pub fn location(&self) -> &Observable<String> {
        &self.location
    }

    pub fn all_day(&self) -> &Observable<bool> {
        &self.all_day
    }

    pub fn selected_calendar(&self) -> &Observable<Option<CalendarDescriptor>> {
        &self.selected_calendar
    }

    /// Current alarm list snapshot.
    pub fn alarms(&self) -> Arc<[Alarm]> {
        self.alarms.get()
    }

    /// Watch the alarm list.
    pub fn alarms_observable(&self) -> &Observable<Arc<[Alarm]>> {
        &self.alarms
    }

    // ----- plain fields ------------------------------------------------

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    pub fn start_time(&self) -> &str {
        &self.start_time
    }

    pub fn end_time(&self) -> &str {
        &self.end_time
    }

    /// Whether time strings use the 12-hour clock.
    pub fn am_pm_format(&self) -> bool {
        self.ctx.config.time_format == TimeFormat::H12
    }

    pub fn organizer(&self) -> Option<&str> {
        self.organizer.as_deref()
    }

    pub fn attendees(&self) -> &[Attendee] {
        &self.attendees
    }

    pub fn going(&self) -> AttendeeStatus {
        self.going
    }

    pub fn existing_event(&self) -> Option<&CalendarEvent> {
        self.existing.as_ref()
    }

    pub fn calendars(&self) -> &[CalendarDescriptor] {
        &self.ctx.calendars
    }

    pub fn set_calendar(&self, calendar: CalendarDescriptor) {
        self.selected_calendar.set(Some(calendar));
    }

    // ----- dates and times ---------------------------------------------

    /// Moves the start date, dragging the end date along by the same number
    /// of days.
    ///
    /// Dates before 1970 are moved to the current year and leave the end
    /// date alone.
    pub fn on_start_date_selected(&mut self, date: NaiveDate) {
        if date.year() < FIRST_SUPPORTED_YEAR {
            let this_year = self.normalizer.local_date(Utc::now()).year();
            self.start_date = DateTimeNormalizer::with_year(date, this_year);
            debug!(%date, start = %self.start_date, "start date before 1970 moved to current year");
            return;
        }
        let shift = DateTimeNormalizer::days_between(self.start_date, date);
        self.end_date = self
            .end_date
            .checked_add_signed(Duration::days(shift))
            .unwrap_or(self.end_date);
        self.start_date = date;
    }

    pub fn on_end_date_selected(&mut self, date: NaiveDate) {
        self.end_date = date;
    }

    /// Sets the start time. On single-day drafts the end time follows so the
    /// event keeps its length, stopping at hour 23.
    pub fn on_start_time_selected(&mut self, value: impl Into<String>) {
        let value = value.into();
        if self.start_date == self.end_date {
            let parsed = (
                TimeOfDay::parse(&self.start_time),
                TimeOfDay::parse(&value),
                TimeOfDay::parse(&self.end_time),
            );
            if let (Some(old_start), Some(new_start), Some(end)) = parsed {
                let length = end.total_minutes().abs_diff(old_start.total_minutes());
                let new_end = TimeOfDay::from_total_minutes_clamped(new_start.total_minutes() + length);
                self.end_time = new_end.format(self.ctx.config.time_format);
            }
        }
        self.start_time = value;
    }

    pub fn on_end_time_selected(&mut self, value: impl Into<String>) {
        self.end_time = value.into();
    }

    pub fn set_all_day(&self, all_day: bool) {
        self.all_day.set(all_day);
    }

    // ----- repeat ------------------------------------------------------

    pub fn repeat(&self) -> Option<&RepeatDraft> {
        self.repeat.draft()
    }

    pub fn on_repeat_period_selected(&mut self, period: Option<RepeatPeriod>) {
        self.repeat.set_frequency(period);
    }

    pub fn on_repeat_interval_changed(&mut self, interval: u32) {
        self.repeat.set_interval(interval);
    }

    pub fn on_repeat_end_type_changed(&mut self, end_type: EndType) {
        let today = self.normalizer.local_date(Utc::now());
        self.repeat.set_end_type(end_type, today);
    }

    pub fn on_end_occurrences_selected(&mut self, count: i64) {
        self.repeat.set_end_count(count);
    }

    pub fn on_repeat_end_date_selected(&mut self, date: NaiveDate) {
        self.repeat.set_end_date(date);
    }

    // ----- alarms ------------------------------------------------------

    /// Adds an alarm and returns its identifier.
    pub fn add_alarm(&self, trigger: AlarmInterval) -> String {
        let alarm = Alarm::new(trigger);
        let identifier = alarm.identifier.clone();
        self.alarms
            .update(|current| current.iter().cloned().chain([alarm]).collect());
        identifier
    }

    /// Changes the trigger of an alarm, or removes it when `trigger` is `None`.
    pub fn change_alarm(&self, identifier: &str, trigger: Option<AlarmInterval>) {
        let Some(trigger) = trigger else {
            self.remove_alarm(identifier);
            return;
        };
        self.alarms.update(|current| {
            current
                .iter()
                .map(|a| {
                    if a.identifier == identifier {
                        Alarm::with_identifier(identifier, trigger)
                    } else {
                        a.clone()
                    }
                })
                .collect()
        });
    }

    pub fn remove_alarm(&self, identifier: &str) {
        self.alarms.update(|current| {
            current
                .iter()
                .filter(|a| a.identifier != identifier)
                .cloned()
                .collect()
        });
    }

    // ----- guests and organizer ----------------------------------------

    /// Derives what the viewer may change right now.
    pub fn permissions(&self) -> Permissions {
        let own = &self.ctx.viewer.own_addresses;
        let input = match self.existing {
            None => PermissionInput {
                is_new_event: true,
                has_write_capability: true,
                attendee_count: self.attendees.len(),
                is_original_organizer_viewer: true,
                ..Default::default()
            },
            Some(ref event) => PermissionInput {
                is_new_event: false,
                is_shared_calendar: self.original_calendar.as_ref().is_some_and(|c| c.is_shared),
                has_write_capability: self.original_calendar.as_ref().is_none_or(|c| c.can_write()),
                is_copy: event.is_copy,
                attendee_count: self.attendees.len(),
                is_original_organizer_viewer: event
                    .organizer
                    .as_deref()
                    .is_none_or(|o| self.ctx.viewer.owns(o)),
                viewer_is_attendee: event.find_own_attendee(own).is_some(),
            },
        };
        Permissions::evaluate(&input)
    }

    pub fn is_read_only(&self) -> bool {
        self.permissions().read_only
    }

    /// Whether the stored event lives in a calendar shared with the viewer.
    pub(crate) fn in_shared_calendar(&self) -> bool {
        self.existing.is_some() && self.original_calendar.as_ref().is_some_and(|c| c.is_shared)
    }

    /// Addresses the organizer may be picked from.
    pub fn possible_organizers(&self) -> Vec<String> {
        let existing_organizer = self.existing.as_ref().and_then(|e| e.organizer.clone());
        match existing_organizer {
            Some(organizer) if !self.permissions().can_modify_organizer => vec![organizer],
            _ => self.ctx.viewer.own_addresses.clone(),
        }
    }

    /// Changes the organizer. Returns false if not allowed.
    pub fn set_organizer(&mut self, address: &str) -> bool {
        if !self.permissions().can_modify_organizer || !self.ctx.viewer.owns(address) {
            debug!(address, "organizer change refused");
            return false;
        }
        self.organizer = Some(address.to_string());
        true
    }

    /// Adds a guest. Returns false for duplicates or when guests cannot be
    /// modified.
    pub fn add_attendee(&mut self, address: &str) -> bool {
        let address = address.trim();
        if address.is_empty() || !self.permissions().can_modify_guests {
            return false;
        }
        if self.attendees.iter().any(|a| a.address == address) {
            debug!(address, "attendee already present");
            return false;
        }
        self.attendees.push(Attendee::new(address));
        true
    }

    /// Removes a guest. Returns false if nothing was removed.
    pub fn remove_attendee(&mut self, address: &str) -> bool {
        if !self.permissions().can_modify_guests {
            return false;
        }
        let before = self.attendees.len();
        self.attendees.retain(|a| a.address != address);
        before != self.attendees.len()
    }

    /// Sets the viewer's own response.
    ///
    /// Updates the viewer's attendee entry, or inserts one with the first own
    /// address at the front of the list.
    pub fn select_going(&mut self, status: AttendeeStatus) -> SessionResult<bool> {
        if !self.permissions().can_modify_own_attendance {
            return Ok(false);
        }
        let own = &self.ctx.viewer.own_addresses;
        match self.attendees.iter_mut().find(|a| a.is_one_of(own)) {
            Some(attendee) => attendee.status = status,
            None => {
                let address = own.first().ok_or(SessionError::NoMailAddress)?;
                self.attendees
                    .insert(0, Attendee::new(address.clone()).with_status(status));
            }
        }
        self.going = status;
        Ok(true)
    }

    // ----- snapshot ----------------------------------------------------

    /// Freezes the current draft.
    pub fn snapshot(&self) -> EventDraft {
        EventDraft {
            summary: self.summary.get(),
            location: self.location.get(),
            description: self.description.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
            start_time: self.start_time.clone(),
            end_time: self.end_time.clone(),
            all_day: self.all_day.get(),
            organizer: self.organizer.clone(),
            attendees: self.attendees.clone(),
            repeat: self.repeat.clone(),
            alarms: self.alarms.get(),
            going: self.going,
            permissions: self.permissions(),
            calendar: self.selected_calendar.get(),
        }
    }
}
