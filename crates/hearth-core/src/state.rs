//! The partial state accumulated while resolution runs.
//!
//! [`PartialState`] is the resolver's evolving view of the room: three
//! singleton slots plus two keyed maps. Each auth-and-apply pass installs
//! accepted events here, and the same struct (through the [`StateView`]
//! trait) is the window the authorization predicate sees.
//!
//! # Install policy
//!
//! An event only occupies a slot when both its type and its state key have
//! the right shape:
//!
//! | type                    | state key  | slot                          |
//! |-------------------------|------------|-------------------------------|
//! | `room.create`           | empty      | `create` (overwrite)          |
//! | `room.power_levels`     | empty      | `power_levels` (overwrite)    |
//! | `room.join_rules`       | empty      | `join_rules` (overwrite)      |
//! | `room.member`           | non-empty  | `members[key]` (overwrite)    |
//! | `room.third_party_invite` | non-empty | `third_party_invites[key]`   |
//! | anything else           | —          | ignored                       |
//!
//! A mismatched state key installs nothing; the event was still authorized
//! and its rejection-free passage through the pass is deliberate.
//!
//! The keyed maps are `BTreeMap`s so the emitted member and invite lists
//! come out in ascending state-key order.

use std::collections::BTreeMap;

use crate::auth::StateView;
use crate::event::{Event, StateEventType};

/// The resolver's evolving view of the room state.
///
/// Created empty per resolution, mutated only through [`PartialState::install`],
/// and discarded once the resolved list is emitted. Holds references into
/// the caller's event slices; nothing is cloned until emission.
#[derive(Debug, Clone, Default)]
pub struct PartialState<'a> {
    create: Option<&'a Event>,
    power_levels: Option<&'a Event>,
    join_rules: Option<&'a Event>,
    members: BTreeMap<&'a str, &'a Event>,
    third_party_invites: BTreeMap<&'a str, &'a Event>,
}

impl<'a> PartialState<'a> {
    /// Create an empty partial state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install an authorized event into the slot its `(type, state_key)`
    /// selects, if any.
    ///
    /// Later installs overwrite earlier ones — that layering is the whole
    /// point of the resolver's pass ordering. Events with an unrecognized
    /// type or a mis-shaped state key install nothing.
    pub fn install(&mut self, event: &'a Event) {
        let Some(event_type) = event.state_event_type() else {
            return;
        };
        match event_type {
            StateEventType::Create => {
                if event.has_empty_state_key() {
                    self.create = Some(event);
                }
            }
            StateEventType::PowerLevels => {
                if event.has_empty_state_key() {
                    self.power_levels = Some(event);
                }
            }
            StateEventType::JoinRules => {
                if event.has_empty_state_key() {
                    self.join_rules = Some(event);
                }
            }
            StateEventType::Member => {
                if let Some(state_key) = event.state_key.as_deref() {
                    if !state_key.is_empty() {
                        self.members.insert(state_key, event);
                    }
                }
            }
            StateEventType::ThirdPartyInvite => {
                if let Some(state_key) = event.state_key.as_deref() {
                    if !state_key.is_empty() {
                        self.third_party_invites.insert(state_key, event);
                    }
                }
            }
        }
    }

    /// The currently resolved power-level event, borrowed for the full
    /// resolution lifetime (the mainline builder walks it while the state
    /// keeps evolving).
    #[must_use]
    pub fn resolved_power_levels(&self) -> Option<&'a Event> {
        self.power_levels
    }

    /// Flatten the partial state into the resolved event list.
    ///
    /// Order: `create`, `join_rules`, `power_levels` (each skipped while
    /// its slot is empty), then members and third-party invites in
    /// ascending state-key order.
    #[must_use]
    pub fn resolved_events(&self) -> Vec<Event> {
        let mut resolved =
            Vec::with_capacity(3 + self.members.len() + self.third_party_invites.len());
        resolved.extend(self.create.cloned());
        resolved.extend(self.join_rules.cloned());
        resolved.extend(self.power_levels.cloned());
        resolved.extend(self.members.values().map(|&event| event.clone()));
        resolved.extend(self.third_party_invites.values().map(|&event| event.clone()));
        resolved
    }
}

impl StateView for PartialState<'_> {
    fn create(&self) -> Option<&Event> {
        self.create
    }

    fn power_levels(&self) -> Option<&Event> {
        self.power_levels
    }

    fn join_rules(&self) -> Option<&Event> {
        self.join_rules
    }

    fn member(&self, state_key: &str) -> Option<&Event> {
        self.members.get(state_key).copied()
    }

    fn third_party_invite(&self, state_key: &str) -> Option<&Event> {
        self.third_party_invites.get(state_key).copied()
    }
}
