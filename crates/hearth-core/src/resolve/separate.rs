//! Conflict separation: partitioning state events by slot multiplicity.
//!
//! Two histories of the same room can each nominate a candidate for the
//! same `(type, state_key)` slot. The separator makes no judgment about
//! which candidate is right — it only counts. Slots with a single
//! candidate are unconflicted and seed the partial state directly; slots
//! with two or more go through the full ordering machinery.

use std::collections::HashMap;

use crate::event::Event;

/// Partition `events` into `(conflicted, unconflicted)` sets.
///
/// Events are bucketed by `(type, state_key)`. Every member of a bucket
/// holding two or more events is conflicted; a bucket of one is
/// unconflicted. Input order is preserved within each output list.
///
/// An absent state key buckets separately from an empty one, so malformed
/// inputs partition cleanly instead of panicking; such events are state
/// events to no slot and the install policy drops them later.
#[must_use]
pub fn separate(events: &[Event]) -> (Vec<Event>, Vec<Event>) {
    let mut multiplicity: HashMap<(&str, Option<&str>), usize> = HashMap::new();
    for event in events {
        *multiplicity
            .entry((event.event_type.as_str(), event.state_key.as_deref()))
            .or_insert(0) += 1;
    }

    let mut conflicted = Vec::new();
    let mut unconflicted = Vec::new();
    for event in events {
        let key = (event.event_type.as_str(), event.state_key.as_deref());
        if multiplicity[&key] > 1 {
            conflicted.push(event.clone());
        } else {
            unconflicted.push(event.clone());
        }
    }
    (conflicted, unconflicted)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(id: &str, event_type: &str, state_key: Option<&str>) -> Event {
        Event {
            event_id: id.into(),
            event_type: event_type.into(),
            state_key: state_key.map(str::to_string),
            sender: "@alice:hearth.test".into(),
            origin_ts: 0,
            content: b"{}".to_vec(),
            auth_event_ids: vec![],
        }
    }

    fn ids(events: &[Event]) -> Vec<&str> {
        events.iter().map(|e| e.event_id.as_str()).collect()
    }

    #[test]
    fn empty_input_partitions_to_empty() {
        let (conflicted, unconflicted) = separate(&[]);
        assert!(conflicted.is_empty());
        assert!(unconflicted.is_empty());
    }

    #[test]
    fn single_candidates_are_unconflicted() {
        let events = [
            event("$c", "room.create", Some("")),
            event("$m", "room.member", Some("@alice:hearth.test")),
        ];
        let (conflicted, unconflicted) = separate(&events);
        assert!(conflicted.is_empty());
        assert_eq!(ids(&unconflicted), vec!["$c", "$m"]);
    }

    #[test]
    fn multiple_candidates_for_a_slot_are_all_conflicted() {
        let events = [
            event("$p1", "room.power_levels", Some("")),
            event("$m", "room.member", Some("@alice:hearth.test")),
            event("$p2", "room.power_levels", Some("")),
            event("$p3", "room.power_levels", Some("")),
        ];
        let (conflicted, unconflicted) = separate(&events);
        assert_eq!(ids(&conflicted), vec!["$p1", "$p2", "$p3"]);
        assert_eq!(ids(&unconflicted), vec!["$m"]);
    }

    #[test]
    fn same_type_different_keys_do_not_conflict() {
        let events = [
            event("$ma", "room.member", Some("@alice:hearth.test")),
            event("$mb", "room.member", Some("@bob:hearth.test")),
        ];
        let (conflicted, unconflicted) = separate(&events);
        assert!(conflicted.is_empty());
        assert_eq!(unconflicted.len(), 2);
    }

    #[test]
    fn absent_state_key_buckets_separately_from_empty() {
        let events = [
            event("$with", "room.widget", Some("")),
            event("$without", "room.widget", None),
        ];
        let (conflicted, unconflicted) = separate(&events);
        assert!(conflicted.is_empty());
        assert_eq!(unconflicted.len(), 2);

        // Two keyless events of the same type still collide with each other.
        let events = [
            event("$w1", "room.widget", None),
            event("$w2", "room.widget", None),
        ];
        let (conflicted, unconflicted) = separate(&events);
        assert_eq!(ids(&conflicted), vec!["$w1", "$w2"]);
        assert!(unconflicted.is_empty());
    }
}
