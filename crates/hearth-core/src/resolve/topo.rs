//! Reverse topological ordering of events by their auth references.
//!
//! # Algorithm
//!
//! Kahn's algorithm over the graph whose nodes are the input events and
//! whose edges run from each event to every auth reference it names. An
//! event's in-degree is the number of input events that reference it, so
//! the events nobody references become eligible first and an event's auth
//! ancestors always land *after* it in the output — the reverse of a
//! plain topological order.
//!
//! When several events are eligible at once, a min-heap on the composite
//! key `(sender power level, origin timestamp, event id)` decides. The
//! output is emitted in extraction order, so within a generation the
//! lowest-powered, earliest, lexically smallest event comes first and the
//! most privileged candidates sit at the end of the sequence — where the
//! auth-and-apply pass makes them the last word.
//!
//! # Edge cases
//!
//! - Auth references naming events outside the input still participate in
//!   the in-degree bookkeeping, but are never emitted.
//! - Events trapped on a reference cycle never reach in-degree 0 and are
//!   dropped; auth graphs are acyclic by construction, so this only
//!   happens on malformed input.

use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap};

use crate::event::Event;

use super::power::sender_power_level;
use super::AuthEventMap;

// ---------------------------------------------------------------------------
// TopoCandidate
// ---------------------------------------------------------------------------

/// An input event wrapped with its pre-computed heap key.
///
/// The ordering is a lexicographic composite of `(power_level, origin_ts,
/// event_id)`, ascending. Event ids are unique, so the order is total and
/// heap extraction is deterministic.
#[derive(Debug, Clone)]
struct TopoCandidate<'a> {
    power_level: i64,
    event: &'a Event,
}

impl<'a> TopoCandidate<'a> {
    fn new(event: &'a Event, auth_events: &AuthEventMap<'a>) -> Self {
        Self {
            power_level: sender_power_level(event, auth_events),
            event,
        }
    }
}

impl PartialEq for TopoCandidate<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for TopoCandidate<'_> {}

impl PartialOrd for TopoCandidate<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TopoCandidate<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.power_level
            .cmp(&other.power_level)
            .then_with(|| self.event.origin_ts.cmp(&other.event.origin_ts))
            .then_with(|| self.event.event_id.cmp(&other.event.event_id))
    }
}

// ---------------------------------------------------------------------------
// Sort
// ---------------------------------------------------------------------------

/// Reverse-topologically order `events` by their auth references.
///
/// The result contains exactly the input events that are reachable from an
/// in-degree-0 start (all of them, for acyclic inputs), ordered so that no
/// event appears before an input event that references it. The same input
/// set yields the same output order regardless of enumeration order.
#[must_use]
pub fn reverse_topological_sort<'a>(
    events: &[&'a Event],
    auth_events: &AuthEventMap<'a>,
) -> Vec<&'a Event> {
    let mut pool: HashMap<&'a str, TopoCandidate<'a>> = HashMap::with_capacity(events.len());
    let mut in_degree: HashMap<&'a str, i64> = HashMap::new();

    for &event in events {
        pool.insert(event.event_id.as_str(), TopoCandidate::new(event, auth_events));

        // The event itself starts at zero unless a reference already
        // incremented it; every auth reference costs its target one.
        in_degree.entry(event.event_id.as_str()).or_insert(0);
        for auth_id in &event.auth_event_ids {
            *in_degree.entry(auth_id.as_str()).or_insert(0) += 1;
        }
    }

    // Seed the heap with everything nothing points at. Dangling references
    // always carry a positive count, so only pool events qualify here.
    let mut ready: BinaryHeap<Reverse<TopoCandidate<'a>>> = BinaryHeap::new();
    let eligible: Vec<&str> = in_degree
        .iter()
        .filter(|(_, &degree)| degree == 0)
        .map(|(&id, _)| id)
        .collect();
    for id in eligible {
        if let Some(candidate) = pool.remove(id) {
            ready.push(Reverse(candidate));
        }
    }

    let mut ordered = Vec::with_capacity(events.len());
    while let Some(Reverse(candidate)) = ready.pop() {
        for auth_id in &candidate.event.auth_event_ids {
            let degree = in_degree.entry(auth_id.as_str()).or_insert(0);
            *degree -= 1;
            if *degree == 0 {
                if let Some(next) = pool.remove(auth_id.as_str()) {
                    ready.push(Reverse(next));
                }
            }
        }
        ordered.push(candidate.event);
    }
    ordered
}
