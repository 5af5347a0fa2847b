//! Power-level mainline construction and mainline-based ordering.
//!
//! # Overview
//!
//! Once a pass has settled which power-level event is authoritative, every
//! other conflicted event can be placed on a timeline of power-level
//! *generations*: walk back through the authoritative event's auth
//! ancestry, collecting each power-level event along the way, and you get
//! the **mainline** — creation-proximal event first, current event last.
//! A conflicted event is then ordered by the mainline position of its
//! nearest power-level ancestor, with origin timestamp and event id as
//! tiebreaks.
//!
//! # Algorithm
//!
//! Both walks are depth-first over auth references, restricted to
//! power-level events that resolve in the supplied [`AuthEventMap`].
//! Explicit work stacks replace recursion — adversarial auth chains can be
//! deep enough to overflow the call stack — and a seen-set keeps malformed
//! cyclic inputs from looping.
//!
//! # Edge cases
//!
//! - A power-level reference missing from the map halts that branch of the
//!   walk: the mainline simply ends, and a position lookup falls through
//!   to the next reference.
//! - Events with no power-level ancestor on the mainline get position 0,
//!   sorting them ahead of everything that is anchored.

use std::collections::{HashMap, HashSet};

use crate::event::{Event, StateEventType};

use super::AuthEventMap;

/// Build the mainline of power-level events reachable from `power_levels`
/// through auth ancestry.
///
/// The result is ordered oldest-first: index 0 is the creation-proximal
/// power-level event and the last index is `power_levels` itself.
/// Traversal follows every power-level auth reference depth-first, in
/// reference-list order, visiting each event once.
#[must_use]
pub fn build_mainline<'a>(
    power_levels: &'a Event,
    auth_events: &AuthEventMap<'a>,
) -> Vec<&'a Event> {
    let mut mainline: Vec<&'a Event> = Vec::new();
    let mut seen: HashSet<&'a str> = HashSet::new();
    let mut stack: Vec<&'a Event> = vec![power_levels];
    seen.insert(power_levels.event_id.as_str());

    while let Some(event) = stack.pop() {
        mainline.push(event);
        // Push in reverse so the first listed reference is visited first.
        for auth_id in event.auth_event_ids.iter().rev() {
            let Some(auth_event) = auth_events.get(auth_id) else {
                continue;
            };
            if auth_event.state_event_type() == Some(StateEventType::PowerLevels)
                && seen.insert(auth_event.event_id.as_str())
            {
                stack.push(auth_event);
            }
        }
    }

    // Collected newest-first; the mainline reads oldest-first.
    mainline.reverse();
    mainline
}

/// Compute the mainline position of `event`: the index of its nearest
/// power-level ancestor that appears on the mainline, or 0 if the walk
/// exhausts without finding one.
#[must_use]
pub fn mainline_position<'a>(
    event: &'a Event,
    mainline: &[&'a Event],
    auth_events: &AuthEventMap<'a>,
) -> usize {
    position_in(event, &index_mainline(mainline), auth_events)
}

/// Order conflicted events by `(mainline position, origin timestamp,
/// event id)`, ascending.
///
/// Lower sorts earlier, so the auth-and-apply pass reaches the
/// best-anchored, latest candidates last and they win their slots. Event
/// ids are unique, which makes the composite a total order — the sort is
/// deterministic without relying on stability.
#[must_use]
pub fn mainline_sort<'a>(
    events: &[&'a Event],
    mainline: &[&'a Event],
    auth_events: &AuthEventMap<'a>,
) -> Vec<&'a Event> {
    let index = index_mainline(mainline);

    let mut block: Vec<(usize, &'a Event)> = events
        .iter()
        .map(|&event| (position_in(event, &index, auth_events), event))
        .collect();
    block.sort_by(|(position_a, a), (position_b, b)| {
        position_a
            .cmp(position_b)
            .then_with(|| a.origin_ts.cmp(&b.origin_ts))
            .then_with(|| a.event_id.cmp(&b.event_id))
    });
    block.into_iter().map(|(_, event)| event).collect()
}

fn index_mainline<'a>(mainline: &[&'a Event]) -> HashMap<&'a str, usize> {
    mainline
        .iter()
        .enumerate()
        .map(|(position, event)| (event.event_id.as_str(), position))
        .collect()
}

/// Depth-first walk of `event`'s power-level auth ancestry.
///
/// Each frame is `(event, next reference index)` so the walk inspects
/// references one at a time, descending into a non-mainline power-level
/// ancestor before moving to the next sibling reference. The first
/// mainline hit returns immediately.
fn position_in<'a>(
    event: &'a Event,
    mainline_index: &HashMap<&str, usize>,
    auth_events: &AuthEventMap<'a>,
) -> usize {
    let mut seen: HashSet<&'a str> = HashSet::new();
    let mut stack: Vec<(&'a Event, usize)> = vec![(event, 0)];

    while let Some((current, next_ref)) = stack.pop() {
        let Some(auth_id) = current.auth_event_ids.get(next_ref) else {
            continue;
        };
        stack.push((current, next_ref + 1));

        let Some(auth_event) = auth_events.get(auth_id) else {
            continue;
        };
        if auth_event.state_event_type() != Some(StateEventType::PowerLevels) {
            continue;
        }
        if let Some(&position) = mainline_index.get(auth_id.as_str()) {
            return position;
        }
        if seen.insert(auth_event.event_id.as_str()) {
            stack.push((auth_event, 0));
        }
    }

    0
}
