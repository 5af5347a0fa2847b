//! State event type tags recognized by the resolution engine.
//!
//! Room state is addressed by `(type, state_key)` tuples. The engine gives
//! special treatment to five event types; everything else flows through the
//! orderings untouched and is simply never installed into the resolved
//! state. The string representation uses the `room.<noun>` dotted format
//! used on the hearth wire.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The five state event types the resolution engine understands.
///
/// String representation follows the `room.<noun>` convention used in
/// hearth room events. Events carrying any other type tag participate in
/// ordering but never occupy a slot in the resolved state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateEventType {
    /// The room creation event. Singleton slot, empty state key.
    Create,
    /// The power-level table for the room. Singleton slot, empty state key.
    PowerLevels,
    /// The room's join rules. Singleton slot, empty state key.
    JoinRules,
    /// A membership event. Keyed by the member's identifier.
    Member,
    /// A third-party invite. Keyed by the invite token.
    ThirdPartyInvite,
}

/// Error returned when parsing an unknown state event type string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStateEventType {
    /// The unrecognised input string.
    pub raw: String,
}

impl fmt::Display for UnknownStateEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown state event type '{}': expected one of room.create, \
             room.power_levels, room.join_rules, room.member, \
             room.third_party_invite",
            self.raw
        )
    }
}

impl std::error::Error for UnknownStateEventType {}

impl StateEventType {
    /// All recognized state event types in slot order.
    pub const ALL: [Self; 5] = [
        Self::Create,
        Self::PowerLevels,
        Self::JoinRules,
        Self::Member,
        Self::ThirdPartyInvite,
    ];

    /// Return the canonical `room.<noun>` string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "room.create",
            Self::PowerLevels => "room.power_levels",
            Self::JoinRules => "room.join_rules",
            Self::Member => "room.member",
            Self::ThirdPartyInvite => "room.third_party_invite",
        }
    }

    /// Classify an arbitrary type tag.
    ///
    /// Returns `None` for tags the engine has no slot for. Unknown tags are
    /// routine input, not an error: the resolver orders such events normally
    /// and drops them at install time.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "room.create" => Some(Self::Create),
            "room.power_levels" => Some(Self::PowerLevels),
            "room.join_rules" => Some(Self::JoinRules),
            "room.member" => Some(Self::Member),
            "room.third_party_invite" => Some(Self::ThirdPartyInvite),
            _ => None,
        }
    }
}

impl fmt::Display for StateEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StateEventType {
    type Err = UnknownStateEventType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_tag(s).ok_or_else(|| UnknownStateEventType { raw: s.to_string() })
    }
}

// Custom serde: serialize as the `room.<noun>` string.
impl Serialize for StateEventType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for StateEventType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(serde::de::Error::custom)
    }
}
