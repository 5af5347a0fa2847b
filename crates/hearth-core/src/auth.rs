//! The authorization contract consumed by the resolver.
//!
//! The resolution engine does not decide whether an event is allowed — that
//! judgment belongs to the room's authorization rules, which live outside
//! this crate. The engine only needs two things from the outside world:
//!
//! - a predicate it can ask about each event ([`Authorizer`]), and
//! - a read-only window it can show the predicate ([`StateView`]).
//!
//! [`StateView`] is deliberately tiny — five lookups — so test doubles can
//! substitute for the real partial state with a couple of lines. The
//! predicate must treat the view as read-only; the resolver hands out a
//! shared reference and installs accepted events itself.

use crate::event::Event;

/// Read-only window onto the in-progress resolved state.
///
/// This is the entire surface the authorization predicate may depend on.
/// Each accessor returns the current occupant of a state slot, or `None`
/// while the slot is still empty.
pub trait StateView {
    /// The resolved room creation event.
    fn create(&self) -> Option<&Event>;

    /// The resolved power-level event.
    fn power_levels(&self) -> Option<&Event>;

    /// The resolved join-rules event.
    fn join_rules(&self) -> Option<&Event>;

    /// The resolved membership event for `state_key`.
    fn member(&self, state_key: &str) -> Option<&Event>;

    /// The resolved third-party invite for `state_key`.
    fn third_party_invite(&self, state_key: &str) -> Option<&Event>;
}

/// Why the authorization predicate refused an event.
///
/// The resolver never surfaces this to its caller — a rejected event is
/// silently skipped and the pass continues. The reason exists for the
/// predicate's own diagnostics and for trace logging.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason}")]
pub struct Rejection {
    reason: String,
}

impl Rejection {
    /// Create a rejection with a human-readable reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// The human-readable reason this event was refused.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// The authorization predicate.
///
/// Implementations decide whether `event` is allowed given the partial
/// state accumulated so far. The resolver invokes this once per event per
/// pass and installs the event only on `Ok`.
pub trait Authorizer {
    /// Check whether `event` is allowed against the current partial state.
    ///
    /// # Errors
    ///
    /// Returns a [`Rejection`] when the event must not be applied. The
    /// resolver skips the event and keeps going; rejection is an expected
    /// outcome, not a failure of the resolution.
    fn allowed(&self, event: &Event, state: &dyn StateView) -> Result<(), Rejection>;
}

/// Plain functions and closures act as authorizers directly.
impl<F> Authorizer for F
where
    F: Fn(&Event, &dyn StateView) -> Result<(), Rejection>,
{
    fn allowed(&self, event: &Event, state: &dyn StateView) -> Result<(), Rejection> {
        self(event, state)
    }
}
