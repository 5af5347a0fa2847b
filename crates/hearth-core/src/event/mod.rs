//! Event data model for room state resolution.
//!
//! This module defines the [`Event`] struct — the read-only view of a room
//! event that the resolution engine consumes — and the [`StateEventType`]
//! tag enum covering the five types with dedicated slots in room state.
//!
//! Events form an authorization DAG via the `auth_event_ids` field: each
//! event names the events that authorized it. The resolver never mutates an
//! event; everything it does is ordering and bookkeeping over shared
//! references, so a single event set can safely back any number of
//! concurrent resolutions.
//!
//! Schema validation, signature checks and content hashing all happen
//! upstream of this crate. By the time an event reaches the resolver it is
//! trusted input; the only part of its content the engine ever inspects is
//! the power-level document (see `resolve::power`), and that inspection
//! degrades to defaults rather than failing.

pub mod types;

pub use types::{StateEventType, UnknownStateEventType};

/// A single room event, as seen by the resolution engine.
///
/// Immutable during resolution. The struct is cheap to pass by reference
/// and the resolver works with borrowed events throughout, cloning only
/// when emitting the final resolved list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Opaque, globally unique event identifier.
    pub event_id: String,

    /// The event's type tag, e.g. `room.member`.
    ///
    /// An open string: tags without a [`StateEventType`] classification are
    /// ordered normally and ignored at install time.
    pub event_type: String,

    /// The state key, if this is a state event.
    ///
    /// Presence and emptiness are distinct: singleton slots (create, power
    /// levels, join rules) require `Some("")`, keyed slots (members, third
    /// party invites) require a non-empty key. Events without a state key
    /// are not state events and never enter resolved state.
    pub state_key: Option<String>,

    /// Identifier of the user that sent the event.
    pub sender: String,

    /// Origin server timestamp, milliseconds since the Unix epoch.
    pub origin_ts: i64,

    /// The event content: opaque bytes, a JSON document when interpretable.
    pub content: Vec<u8>,

    /// Identifiers of the events that authorized this one, in order.
    ///
    /// References may name events outside any supplied set; the resolver
    /// treats unresolvable references as documented degradations, never as
    /// errors.
    pub auth_event_ids: Vec<String>,
}

impl Event {
    /// Classify this event's type tag, if the engine has a slot for it.
    #[must_use]
    pub fn state_event_type(&self) -> Option<StateEventType> {
        StateEventType::from_tag(&self.event_type)
    }

    /// Returns `true` if this event carries a state key (present, possibly
    /// empty).
    #[must_use]
    pub fn is_state_event(&self) -> bool {
        self.state_key.is_some()
    }

    /// Returns `true` if the state key is present and empty — the shape
    /// required by the singleton slots.
    #[must_use]
    pub fn has_empty_state_key(&self) -> bool {
        self.state_key.as_deref() == Some("")
    }
}
