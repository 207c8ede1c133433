//! Calendars the viewer can file events into, and the viewer identity.

use serde::{Deserialize, Serialize};

/// The share capability a user holds on a calendar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShareCapability {
    #[default]
    None,
    Read,
    Write,
}

/// A calendar as seen by the viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarDescriptor {
    /// Group the calendar belongs to; this is the owner group of its events.
    pub group_id: String,
    pub name: String,
    /// True if the calendar belongs to someone else and is shared with the viewer.
    pub is_shared: bool,
    pub capability: ShareCapability,
    /// List holding short, non-repeating events.
    pub short_events_list: String,
    /// List holding repeating and long events.
    pub long_events_list: String,
}

impl CalendarDescriptor {
    /// Creates an owned calendar with write capability.
    pub fn owned(group_id: impl Into<String>, name: impl Into<String>) -> Self {
        let group_id = group_id.into();
        Self {
            short_events_list: format!("{group_id}-short"),
            long_events_list: format!("{group_id}-long"),
            group_id,
            name: name.into(),
            is_shared: false,
            capability: ShareCapability::Write,
        }
    }

    /// Creates a calendar shared with the viewer with the given capability.
    pub fn shared(
        group_id: impl Into<String>,
        name: impl Into<String>,
        capability: ShareCapability,
    ) -> Self {
        Self {
            is_shared: true,
            capability,
            ..Self::owned(group_id, name)
        }
    }

    pub fn can_write(&self) -> bool {
        self.capability == ShareCapability::Write
    }
}

/// The user editing events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewer {
    /// Every mail address the viewer owns, default first.
    pub own_addresses: Vec<String>,
    /// Address used as organizer of new events.
    pub default_sender: Option<String>,
    /// The viewer's own reminder list.
    pub alarm_list_id: Option<String>,
}

impl Viewer {
    /// Creates a viewer whose default sender is the first address.
    pub fn new(addresses: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let own_addresses: Vec<String> = addresses.into_iter().map(Into::into).collect();
        Self {
            default_sender: own_addresses.first().cloned(),
            own_addresses,
            alarm_list_id: None,
        }
    }

    /// Builder method to set the reminder list.
    pub fn with_alarm_list(mut self, list_id: impl Into<String>) -> Self {
        self.alarm_list_id = Some(list_id.into());
        self
    }

    /// Builder method to set the default sender.
    pub fn with_default_sender(mut self, address: impl Into<String>) -> Self {
        self.default_sender = Some(address.into());
        self
    }

    /// Returns true if `address` is one of the viewer's addresses.
    pub fn owns(&self, address: &str) -> bool {
        self.own_addresses.iter().any(|a| a == address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_calendar_keeps_lists() {
        let calendar = CalendarDescriptor::shared("g1", "Team", ShareCapability::Read);
        assert!(calendar.is_shared);
        assert!(!calendar.can_write());
        assert_eq!(calendar.short_events_list, "g1-short");
        assert_eq!(calendar.long_events_list, "g1-long");
    }

    #[test]
    fn viewer_defaults_to_first_address() {
        let viewer = Viewer::new(["me@example.com", "alias@example.com"]);
        assert_eq!(viewer.default_sender.as_deref(), Some("me@example.com"));
        assert!(viewer.owns("alias@example.com"));
        assert!(!viewer.owns("guest@example.com"));
    }
}
