//! The four-pass state-conflict resolver.
//!
//! Given the conflicted and unconflicted state events of a room plus the
//! auth events they reference, [`resolve`] deterministically produces the
//! single state every honest participant agrees on. The passes layer onto
//! one shared [`PartialState`]:
//!
//! 1. **Unconflicted pass** — reverse-topologically order the unconflicted
//!    events and auth-and-apply them, seeding the partial state.
//! 2. **Conflicted power-levels pass** — same ordering over the conflicted
//!    power-level events; whichever survives last holds the slot.
//! 3. **Mainline pass** — build the power-level mainline from the now
//!    resolved power-level event, order the remaining conflicted events by
//!    mainline position and auth-and-apply them.
//! 4. **Reapply unconflicted** — run the unconflicted sequence once more,
//!    restoring any install that passes 2 and 3 overwrote and that is
//!    still authorized.
//!
//! The resolver is total: rejected events are skipped, unresolvable
//! references degrade, and the caller always gets a result list back.

mod mainline;
mod power;
mod separate;
mod topo;

pub use mainline::{build_mainline, mainline_position, mainline_sort};
pub use power::sender_power_level;
pub use separate::separate;
pub use topo::reverse_topological_sort;

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::auth::Authorizer;
use crate::event::{Event, StateEventType};
use crate::state::PartialState;

// ---------------------------------------------------------------------------
// AuthEventMap
// ---------------------------------------------------------------------------

/// Auth events indexed by event id, borrowed from the caller's slice.
///
/// Built once per resolution and shared read-only by every pass. A lookup
/// miss is not an error — each consumer documents the degradation it
/// applies instead.
#[derive(Debug, Clone, Default)]
pub struct AuthEventMap<'a> {
    events: HashMap<&'a str, &'a Event>,
}

impl<'a> AuthEventMap<'a> {
    /// Index `events` by id. Later duplicates win, though ids are unique
    /// in well-formed input.
    #[must_use]
    pub fn from_events(events: &'a [Event]) -> Self {
        Self {
            events: events
                .iter()
                .map(|event| (event.event_id.as_str(), event))
                .collect(),
        }
    }

    /// Look up an event by id.
    #[must_use]
    pub fn get(&self, event_id: &str) -> Option<&'a Event> {
        self.events.get(event_id).copied()
    }

    /// Returns `true` if `event_id` resolves.
    #[must_use]
    pub fn contains(&self, event_id: &str) -> bool {
        self.events.contains_key(event_id)
    }

    /// Number of indexed events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns `true` if no events are indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

struct Resolver<'a> {
    auth_events: AuthEventMap<'a>,
    mainline: Vec<&'a Event>,
    state: PartialState<'a>,
}

impl<'a> Resolver<'a> {
    /// Auth each event against the current partial state and install the
    /// accepted ones. Rejections skip the event and keep the pass going.
    fn auth_and_apply<A>(&mut self, authorizer: &A, events: &[&'a Event])
    where
        A: Authorizer + ?Sized,
    {
        for &event in events {
            match authorizer.allowed(event, &self.state) {
                Ok(()) => self.state.install(event),
                Err(rejection) => {
                    trace!(
                        event_id = %event.event_id,
                        reason = %rejection,
                        "event failed authorization, skipping"
                    );
                }
            }
        }
    }
}

/// Resolve a room's state from conflicted and unconflicted candidates.
///
/// `auth_events` must contain the auth chains of the input events as far
/// as the caller knows them; missing entries degrade the orderings as
/// documented in the submodules but never fail the resolution.
///
/// The result holds at most one event per `(type, state_key)`: the
/// singleton slots in `create`, `join_rules`, `power_levels` order, then
/// members and third-party invites in ascending state-key order. Callers
/// comparing results should treat them as sets keyed by
/// `(type, state_key)`.
///
/// ```
/// use hearth_core::auth::{Rejection, StateView};
/// use hearth_core::event::Event;
/// use hearth_core::resolve::resolve;
///
/// fn accept(_: &Event, _: &dyn StateView) -> Result<(), Rejection> {
///     Ok(())
/// }
///
/// let create = Event {
///     event_id: "$create".into(),
///     event_type: "room.create".into(),
///     state_key: Some(String::new()),
///     sender: "@founder:hearth.test".into(),
///     origin_ts: 0,
///     content: b"{}".to_vec(),
///     auth_event_ids: vec![],
/// };
///
/// let resolved = resolve(&[], &[create.clone()], &[create], &accept);
/// assert_eq!(resolved.len(), 1);
/// assert_eq!(resolved[0].event_type, "room.create");
/// ```
#[must_use]
pub fn resolve<'a, A>(
    conflicted: &'a [Event],
    unconflicted: &'a [Event],
    auth_events: &'a [Event],
    authorizer: &A,
) -> Vec<Event>
where
    A: Authorizer + ?Sized,
{
    debug!(
        conflicted = conflicted.len(),
        unconflicted = unconflicted.len(),
        auth_events = auth_events.len(),
        "resolving room state"
    );

    let mut resolver = Resolver {
        auth_events: AuthEventMap::from_events(auth_events),
        mainline: Vec::new(),
        state: PartialState::new(),
    };

    // Power-level conflicts are ordered separately: the mainline ordering
    // of everything else depends on their outcome.
    let (conflicted_power, conflicted_others): (Vec<&Event>, Vec<&Event>) = conflicted
        .iter()
        .partition(|event| event.state_event_type() == Some(StateEventType::PowerLevels));

    // Pass 1: seed the partial state with the unconflicted events.
    let unconflicted_refs: Vec<&Event> = unconflicted.iter().collect();
    let unconflicted_ordered = reverse_topological_sort(&unconflicted_refs, &resolver.auth_events);
    resolver.auth_and_apply(authorizer, &unconflicted_ordered);

    // Pass 2: settle the authoritative power-level event.
    let power_ordered = reverse_topological_sort(&conflicted_power, &resolver.auth_events);
    resolver.auth_and_apply(authorizer, &power_ordered);

    // Pass 3: anchor the remaining conflicts to the power-level mainline.
    if let Some(power_levels) = resolver.state.resolved_power_levels() {
        resolver.mainline = build_mainline(power_levels, &resolver.auth_events);
    }
    debug!(mainline_len = resolver.mainline.len(), "built power-level mainline");
    let others_ordered = mainline_sort(&conflicted_others, &resolver.mainline, &resolver.auth_events);
    resolver.auth_and_apply(authorizer, &others_ordered);

    // Pass 4: reapply the unconflicted events in their original order, in
    // case passes 2 and 3 overwrote any of them.
    resolver.auth_and_apply(authorizer, &unconflicted_ordered);

    resolver.state.resolved_events()
}

/// Separate `events` into conflicted and unconflicted sets, then resolve.
///
/// Convenience for callers holding a flat bag of state-event candidates
/// from divergent histories.
#[must_use]
pub fn resolve_room_state<A>(events: &[Event], auth_events: &[Event], authorizer: &A) -> Vec<Event>
where
    A: Authorizer + ?Sized,
{
    let (conflicted, unconflicted) = separate(events);
    resolve(&conflicted, &unconflicted, auth_events, authorizer)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
