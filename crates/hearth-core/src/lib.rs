#![forbid(unsafe_code)]
//! Deterministic state-conflict resolution for hearth rooms.
//!
//! When the histories of a federated room diverge, every participant ends
//! up holding its own candidate set of state events. This crate takes
//! those candidates — split into conflicted and unconflicted sets, plus
//! the auth events they reference — and produces the single current state
//! every honest participant converges on.
//!
//! The engine is a pure function: no I/O, no persistence, no shared
//! mutable state between invocations. Event parsing, authorization rules
//! and transport all live outside this crate; the resolver consumes an
//! [`event::Event`] view and an [`auth::Authorizer`] predicate and hands
//! back a resolved event list. See [`resolve::resolve`] for the entry
//! point.

pub mod auth;
pub mod event;
pub mod resolve;
pub mod state;
