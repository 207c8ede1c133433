//! Guest list changes between the stored event and the draft.

use std::collections::HashSet;

use crate::event::Attendee;

/// Guests grouped by what happened to them. The viewer's own addresses never
/// appear in any group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttendeeDiff {
    /// In the draft but not in the stored event, in draft order.
    pub added: Vec<Attendee>,
    /// In both, in draft order.
    pub retained: Vec<Attendee>,
    /// In the stored event but not in the draft, in stored order.
    pub removed: Vec<Attendee>,
}

impl AttendeeDiff {
    /// Returns true if any guest that already knew about the event is affected.
    pub fn touches_existing(&self) -> bool {
        !self.retained.is_empty() || !self.removed.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && !self.touches_existing()
    }

    pub fn added_addresses(&self) -> Vec<String> {
        addresses(&self.added)
    }

    pub fn retained_addresses(&self) -> Vec<String> {
        addresses(&self.retained)
    }

    pub fn removed_addresses(&self) -> Vec<String> {
        addresses(&self.removed)
    }
}

fn addresses(attendees: &[Attendee]) -> Vec<String> {
    attendees.iter().map(|a| a.address.clone()).collect()
}

/// Compares guest lists by address.
pub fn diff_attendees(original: &[Attendee], edited: &[Attendee], own: &[String]) -> AttendeeDiff {
    let own: HashSet<&str> = own.iter().map(String::as_str).collect();
    let before: HashSet<&str> = original.iter().map(|a| a.address.as_str()).collect();
    let after: HashSet<&str> = edited.iter().map(|a| a.address.as_str()).collect();

    let mut diff = AttendeeDiff::default();
    for attendee in edited.iter().filter(|a| !own.contains(a.address.as_str())) {
        if before.contains(attendee.address.as_str()) {
            diff.retained.push(attendee.clone());
        } else {
            diff.added.push(attendee.clone());
        }
    }
    diff.removed = original
        .iter()
        .filter(|a| !own.contains(a.address.as_str()) && !after.contains(a.address.as_str()))
        .cloned()
        .collect();
    diff
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::AttendeeStatus;

    fn guests(addresses: &[&str]) -> Vec<Attendee> {
        addresses.iter().map(|a| Attendee::new(*a)).collect()
    }

    #[test]
    fn swap_one_guest() {
        let diff = diff_attendees(&guests(&["a@x", "b@x"]), &guests(&["b@x", "c@x"]), &[]);
        assert_eq!(diff.added_addresses(), vec!["c@x"]);
        assert_eq!(diff.retained_addresses(), vec!["b@x"]);
        assert_eq!(diff.removed_addresses(), vec!["a@x"]);
        assert!(diff.touches_existing());
    }

    #[test]
    fn own_addresses_are_excluded() {
        let own = vec!["me@x".to_string()];
        let diff = diff_attendees(
            &guests(&["me@x", "a@x"]),
            &guests(&["me@x", "b@x"]),
            &own,
        );
        assert_eq!(diff.added_addresses(), vec!["b@x"]);
        assert!(diff.retained.is_empty());
        assert_eq!(diff.removed_addresses(), vec!["a@x"]);

        let only_me = diff_attendees(&[], &guests(&["me@x"]), &own);
        assert!(only_me.is_empty());
    }

    #[test]
    fn new_event_only_adds() {
        let diff = diff_attendees(&[], &guests(&["a@x", "b@x"]), &[]);
        assert_eq!(diff.added_addresses(), vec!["a@x", "b@x"]);
        assert!(!diff.touches_existing());
    }

    #[test]
    fn retained_carries_draft_status() {
        let original = guests(&["a@x"]);
        let edited = vec![Attendee::new("a@x").with_status(AttendeeStatus::Declined)];
        let diff = diff_attendees(&original, &edited, &[]);
        assert_eq!(diff.retained[0].status, AttendeeStatus::Declined);
    }

    #[test]
    fn groups_are_disjoint() {
        let original = guests(&["a@x", "b@x", "c@x"]);
        let edited = guests(&["c@x", "d@x", "a@x", "e@x"]);
        let diff = diff_attendees(&original, &edited, &[]);

        let mut all: Vec<_> = diff
            .added_addresses()
            .into_iter()
            .chain(diff.retained_addresses())
            .chain(diff.removed_addresses())
            .collect();
        let total = all.len();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), total);
        assert_eq!(diff.retained_addresses(), vec!["c@x", "a@x"]);
    }
}
