//! Sender effective power level, derived from auth references.
//!
//! The topological tiebreak needs to know how much authority an event's
//! sender had *at the time of that event*. The answer lives in the
//! power-level events the event names as its authorization: their content
//! carries a `users_default` fallback and a `users` table of per-user
//! levels.
//!
//! The derivation is total. Every failure mode — an unresolvable auth
//! reference, unparseable content, a field of the wrong shape — degrades
//! to a default rather than erroring, because the tiebreak must produce
//! *some* ordering for every input.

#![allow(clippy::cast_possible_truncation)]

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::event::{Event, StateEventType};

use super::AuthEventMap;

/// The slice of a power-level event's content this module reads.
///
/// Values are kept as raw JSON values because real payloads encode levels
/// inconsistently — integers, floats and numeric strings all occur in the
/// wild. [`as_power_level`] normalizes them.
#[derive(Debug, Default, Deserialize)]
struct PowerLevelContent {
    users_default: Option<Value>,
    users: Option<BTreeMap<String, Value>>,
}

/// Derive the effective power level of `event`'s sender from the
/// power-level events among its auth references.
///
/// Walks the auth references in order. Each resolvable power-level event
/// (empty state key) is consulted: `users_default` is taken as a fallback,
/// then a `users` entry for the sender overrides it. Later power-level
/// references override earlier ones.
///
/// Degrades to 0 when a reference does not resolve in `auth_events` (the
/// sender's authority cannot be deduced from an incomplete chain), when
/// content fails to parse, or when no power-level reference exists.
#[must_use]
pub fn sender_power_level(event: &Event, auth_events: &AuthEventMap<'_>) -> i64 {
    let mut power_level = 0;

    for auth_id in &event.auth_event_ids {
        let Some(auth_event) = auth_events.get(auth_id) else {
            return 0;
        };

        if auth_event.state_event_type() != Some(StateEventType::PowerLevels)
            || !auth_event.has_empty_state_key()
        {
            continue;
        }

        let content: PowerLevelContent = match serde_json::from_slice(&auth_event.content) {
            Ok(content) => content,
            Err(err) => {
                debug!(
                    event_id = %auth_event.event_id,
                    error = %err,
                    "unparseable power-level content, degrading sender power to 0"
                );
                return 0;
            }
        };

        if let Some(value) = content.users_default.as_ref().and_then(as_power_level) {
            power_level = value;
        }
        if let Some(value) = content
            .users
            .as_ref()
            .and_then(|users| users.get(&event.sender))
            .and_then(as_power_level)
        {
            power_level = value;
        }
    }

    power_level
}

/// Normalize a JSON value into a power level.
///
/// Accepts integers, floats (truncated toward zero) and strings parseable
/// as either. Anything else yields `None`, leaving the caller on its
/// previous fallback.
fn as_power_level(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|float| float as i64)),
        Value::String(text) => {
            let text = text.trim();
            text.parse::<i64>()
                .ok()
                .or_else(|| text.parse::<f64>().ok().map(|float| float as i64))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn power_event(id: &str, content: serde_json::Value) -> Event {
        Event {
            event_id: id.into(),
            event_type: "room.power_levels".into(),
            state_key: Some(String::new()),
            sender: "@admin:hearth.test".into(),
            origin_ts: 0,
            content: content.to_string().into_bytes(),
            auth_event_ids: vec![],
        }
    }

    fn member_event(id: &str, sender: &str, auth: &[&str]) -> Event {
        Event {
            event_id: id.into(),
            event_type: "room.member".into(),
            state_key: Some(sender.to_string()),
            sender: sender.into(),
            origin_ts: 0,
            content: b"{}".to_vec(),
            auth_event_ids: auth.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    #[test]
    fn no_auth_references_yields_zero() {
        let event = member_event("$m", "@alice:hearth.test", &[]);
        let map = AuthEventMap::from_events(&[]);
        assert_eq!(sender_power_level(&event, &map), 0);
    }

    #[test]
    fn missing_auth_reference_yields_zero() {
        let power = power_event("$p", serde_json::json!({"users_default": 50}));
        let auth = [power];
        let map = AuthEventMap::from_events(&auth);

        // The resolvable power event alone would give 50, but the dangling
        // reference makes the chain incomplete.
        let event = member_event("$m", "@alice:hearth.test", &["$p", "$nowhere"]);
        assert_eq!(sender_power_level(&event, &map), 0);
    }

    #[test]
    fn users_default_is_the_fallback() {
        let auth = [power_event("$p", serde_json::json!({"users_default": 25}))];
        let map = AuthEventMap::from_events(&auth);
        let event = member_event("$m", "@alice:hearth.test", &["$p"]);
        assert_eq!(sender_power_level(&event, &map), 25);
    }

    #[test]
    fn users_entry_overrides_the_default() {
        let auth = [power_event(
            "$p",
            serde_json::json!({
                "users_default": 25,
                "users": {"@alice:hearth.test": 100},
            }),
        )];
        let map = AuthEventMap::from_events(&auth);
        let event = member_event("$m", "@alice:hearth.test", &["$p"]);
        assert_eq!(sender_power_level(&event, &map), 100);

        let other = member_event("$m2", "@bob:hearth.test", &["$p"]);
        assert_eq!(sender_power_level(&other, &map), 25);
    }

    #[test]
    fn numeric_forms_are_all_accepted() {
        let auth = [power_event(
            "$p",
            serde_json::json!({
                "users_default": "40",
                "users": {
                    "@float:hearth.test": 99.9,
                    "@string:hearth.test": "77",
                    "@floatstring:hearth.test": "12.5",
                },
            }),
        )];
        let map = AuthEventMap::from_events(&auth);

        let float = member_event("$f", "@float:hearth.test", &["$p"]);
        assert_eq!(sender_power_level(&float, &map), 99);

        let string = member_event("$s", "@string:hearth.test", &["$p"]);
        assert_eq!(sender_power_level(&string, &map), 77);

        let float_string = member_event("$fs", "@floatstring:hearth.test", &["$p"]);
        assert_eq!(sender_power_level(&float_string, &map), 12);

        // No users entry: the string-encoded default applies.
        let fallback = member_event("$d", "@other:hearth.test", &["$p"]);
        assert_eq!(sender_power_level(&fallback, &map), 40);
    }

    #[test]
    fn malformed_fields_degrade_to_the_preceding_fallback() {
        let auth = [power_event(
            "$p",
            serde_json::json!({
                "users_default": 30,
                "users": {"@alice:hearth.test": {"nested": true}},
            }),
        )];
        let map = AuthEventMap::from_events(&auth);
        let event = member_event("$m", "@alice:hearth.test", &["$p"]);
        assert_eq!(sender_power_level(&event, &map), 30);
    }

    #[test]
    fn unparseable_content_yields_zero() {
        let mut power = power_event("$p", serde_json::json!({}));
        power.content = b"not json at all".to_vec();
        let auth = [power];
        let map = AuthEventMap::from_events(&auth);
        let event = member_event("$m", "@alice:hearth.test", &["$p"]);
        assert_eq!(sender_power_level(&event, &map), 0);
    }

    #[test]
    fn later_power_references_override_earlier_ones() {
        let auth = [
            power_event("$p1", serde_json::json!({"users_default": 10})),
            power_event("$p2", serde_json::json!({"users_default": 60})),
        ];
        let map = AuthEventMap::from_events(&auth);
        let event = member_event("$m", "@alice:hearth.test", &["$p1", "$p2"]);
        assert_eq!(sender_power_level(&event, &map), 60);
    }

    #[test]
    fn non_power_references_are_skipped() {
        let create = Event {
            event_id: "$c".into(),
            event_type: "room.create".into(),
            state_key: Some(String::new()),
            sender: "@admin:hearth.test".into(),
            origin_ts: 0,
            content: b"{}".to_vec(),
            auth_event_ids: vec![],
        };
        let auth = [
            create,
            power_event("$p", serde_json::json!({"users_default": 15})),
        ];
        let map = AuthEventMap::from_events(&auth);
        let event = member_event("$m", "@alice:hearth.test", &["$c", "$p"]);
        assert_eq!(sender_power_level(&event, &map), 15);
    }
}
