//! Forward migration of stored conversation records
//!
//! Records are kept as JSON documents so that older shapes can still be
//! read. Every read goes through [`migrate`], which:
//! - fills fields introduced after the record was written with defaults
//! - maps legacy `step` spellings and recovers unknown steps to `intro`
//! - moves legacy top-level `budget` / `location` into `slots`
//! - drops stored `rank` (it is derived from `score`)
//! - resets fields that no longer decode (e.g. a string `score`) to their
//!   defaults, keeping the rest of the record
//!
//! Well-typed existing values are never discarded in favour of defaults.

use lead_agent_core::{ConversationState, FunnelStep, STATE_SCHEMA_VERSION};
use serde_json::{Map, Value};

use crate::PersistenceError;

/// Slot keys older records kept at the top level
const LEGACY_SLOT_KEYS: &[&str] = &["budget", "location", "purpose", "timeline", "visit_time"];

/// Keys with no place in the current record
const DROPPED_KEYS: &[&str] = &["rank", "last_question"];

/// Serialize a record for storage
pub fn to_document(state: &ConversationState) -> Result<Value, PersistenceError> {
    Ok(serde_json::to_value(state)?)
}

/// Bring a stored document up to the current schema and decode it
pub fn migrate(doc: Value, phone: &str) -> Result<ConversationState, PersistenceError> {
    let mut doc = match doc {
        Value::Object(map) => map,
        other => {
            tracing::warn!(
                phone = %lead_agent_core::mask_phone(phone),
                kind = json_kind(&other),
                "Stored record is not an object, starting fresh"
            );
            Map::new()
        }
    };

    let version = doc
        .get("schema_version")
        .and_then(Value::as_u64)
        .unwrap_or(1);

    lift_legacy_slots(&mut doc);
    normalize_language(&mut doc);
    normalize_step(&mut doc, phone);
    for key in DROPPED_KEYS {
        doc.remove(*key);
    }

    let defaults = match to_document(&ConversationState::new(phone))? {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    merge_defaults(&mut doc, &defaults);

    if doc.get("phone").and_then(Value::as_str) != Some(phone) {
        doc.insert("phone".to_string(), Value::String(phone.to_string()));
    }
    doc.insert("schema_version".to_string(), Value::from(STATE_SCHEMA_VERSION));

    if version < u64::from(STATE_SCHEMA_VERSION) {
        tracing::debug!(
            phone = %lead_agent_core::mask_phone(phone),
            from = version,
            to = STATE_SCHEMA_VERSION,
            "Migrated conversation record"
        );
    }

    match serde_json::from_value(Value::Object(doc.clone())) {
        Ok(state) => Ok(state),
        Err(e) => {
            tracing::warn!(
                phone = %lead_agent_core::mask_phone(phone),
                error = %e,
                "Stored record does not decode, keeping the fields that do"
            );
            salvage(doc, defaults, phone)
        }
    }
}

/// Rebuild a record from defaults, taking each stored field that still
/// decodes on its own
fn salvage(
    doc: Map<String, Value>,
    defaults: Map<String, Value>,
    phone: &str,
) -> Result<ConversationState, PersistenceError> {
    let mut kept = defaults;
    let mut reset = Vec::new();

    for (key, value) in doc {
        let value = match (key.as_str(), value) {
            ("slots", slots) => string_slots(slots),
            (_, value) => value,
        };
        let mut candidate = kept.clone();
        candidate.insert(key.clone(), value);
        if serde_json::from_value::<ConversationState>(Value::Object(candidate.clone())).is_ok() {
            kept = candidate;
        } else {
            reset.push(key);
        }
    }

    tracing::warn!(
        phone = %lead_agent_core::mask_phone(phone),
        fields = ?reset,
        "Reset undecodable fields to defaults"
    );

    serde_json::from_value(Value::Object(kept)).map_err(|e| PersistenceError::Migration {
        phone: lead_agent_core::mask_phone(phone),
        message: e.to_string(),
    })
}

/// Slot values are free text; anything else is dropped
fn string_slots(slots: Value) -> Value {
    match slots {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| v.is_string() || v.is_null())
                .collect(),
        ),
        _ => Value::Object(Map::new()),
    }
}

fn lift_legacy_slots(doc: &mut Map<String, Value>) {
    let mut lifted = Map::new();
    for key in LEGACY_SLOT_KEYS {
        if let Some(value) = doc.remove(*key) {
            if !value.is_null() {
                lifted.insert(key.to_string(), value);
            }
        }
    }
    if lifted.is_empty() {
        return;
    }

    let slots = doc
        .entry("slots")
        .or_insert_with(|| Value::Object(Map::new()));
    if !slots.is_object() {
        *slots = Value::Object(Map::new());
    }
    if let Value::Object(slots) = slots {
        for (key, value) in lifted {
            let occupied = slots.get(&key).map_or(false, |v| !v.is_null());
            if !occupied {
                slots.insert(key, value);
            }
        }
    }
}

fn normalize_language(doc: &mut Map<String, Value>) {
    let Some(raw) = doc.get("language").and_then(Value::as_str) else {
        return;
    };
    let mapped = match raw.trim().to_lowercase().as_str() {
        "english" | "en" => Value::from("english"),
        "hindi" | "hi" => Value::from("hindi"),
        "hinglish" | "mixed" => Value::from("hinglish"),
        _ => Value::Null,
    };
    doc.insert("language".to_string(), mapped);
}

fn normalize_step(doc: &mut Map<String, Value>, phone: &str) {
    let step = match doc.get("step") {
        None | Some(Value::Null) => FunnelStep::Intro,
        Some(Value::String(raw)) => FunnelStep::parse_stored(raw).unwrap_or_else(|| {
            tracing::warn!(
                phone = %lead_agent_core::mask_phone(phone),
                step = %raw,
                "Unrecognized stored step, resetting to intro"
            );
            FunnelStep::Intro
        }),
        Some(other) => {
            tracing::warn!(
                phone = %lead_agent_core::mask_phone(phone),
                kind = json_kind(other),
                "Stored step is not a string, resetting to intro"
            );
            FunnelStep::Intro
        }
    };
    doc.insert("step".to_string(), Value::from(step.as_str()));
}

/// Insert defaults for missing keys; nested objects are merged one level
/// deep so new slot fields appear in old records
fn merge_defaults(doc: &mut Map<String, Value>, defaults: &Map<String, Value>) {
    for (key, default) in defaults {
        let replace = match doc.get(key) {
            None => true,
            Some(Value::Null) => !default.is_null() && !is_optional(key),
            Some(_) => false,
        };
        if replace {
            doc.insert(key.clone(), default.clone());
            continue;
        }

        if let (Some(Value::Object(existing)), Value::Object(nested)) = (doc.get_mut(key), default) {
            for (inner_key, inner_default) in nested {
                existing
                    .entry(inner_key.clone())
                    .or_insert_with(|| inner_default.clone());
            }
        }
    }
}

/// Top-level fields where `null` is a legitimate stored value
fn is_optional(key: &str) -> bool {
    matches!(
        key,
        "language" | "last_intent" | "last_message_id" | "project_id"
    )
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lead_agent_core::{Intent, Language};
    use serde_json::json;

    #[test]
    fn test_current_record_is_unchanged() {
        let mut state = ConversationState::new("919800000001");
        state.step = FunnelStep::QualifyLocation;
        state.score = 23;
        state.slots.budget = Some("80 lakh".to_string());
        state.record_intent(Intent::PriceQuery);

        let doc = to_document(&state).unwrap();
        let migrated = migrate(doc, "919800000001").unwrap();
        assert_eq!(migrated, state);
    }

    #[test]
    fn test_legacy_record_gets_defaults() {
        let doc = json!({
            "last_intent": "price_query",
            "last_question": "budget",
            "score": 12,
            "language": "english"
        });
        let state = migrate(doc, "919800000002").unwrap();
        assert_eq!(state.schema_version, STATE_SCHEMA_VERSION);
        assert_eq!(state.phone, "919800000002");
        assert_eq!(state.score, 12);
        assert_eq!(state.last_intent, Some(Intent::PriceQuery));
        assert_eq!(state.language, Some(Language::English));
        assert_eq!(state.step, FunnelStep::Intro);
        assert!(!state.handoff_done);
        assert!(state.conversation_history.is_empty());
    }

    #[test]
    fn test_legacy_steps_are_mapped() {
        let state = migrate(json!({"step": "project_intro"}), "1").unwrap();
        assert_eq!(state.step, FunnelStep::Decision);
        let state = migrate(json!({"step": "budget"}), "1").unwrap();
        assert_eq!(state.step, FunnelStep::QualifyBudget);
    }

    #[test]
    fn test_unknown_step_resets_but_keeps_slots() {
        let doc = json!({
            "step": "negotiation",
            "slots": {"budget": "1 crore", "location": "Baner"},
            "score": 30
        });
        let state = migrate(doc, "1").unwrap();
        assert_eq!(state.step, FunnelStep::Intro);
        assert_eq!(state.slots.budget.as_deref(), Some("1 crore"));
        assert_eq!(state.slots.location.as_deref(), Some("Baner"));
        assert!(state.slots.visit_time.is_none());
        assert_eq!(state.score, 30);
    }

    #[test]
    fn test_top_level_slots_are_lifted() {
        let doc = json!({
            "budget": "90 lakh",
            "location": "Wakad",
            "slots": {"location": "Baner"}
        });
        let state = migrate(doc, "1").unwrap();
        assert_eq!(state.slots.budget.as_deref(), Some("90 lakh"));
        // nested value wins over the legacy one
        assert_eq!(state.slots.location.as_deref(), Some("Baner"));
    }

    #[test]
    fn test_rank_and_language_codes() {
        let doc = json!({"rank": "hot", "score": 5, "language": "hi"});
        let state = migrate(doc, "1").unwrap();
        assert_eq!(state.language, Some(Language::Hindi));
        let doc = to_document(&state).unwrap();
        assert!(doc.get("rank").is_none());
    }

    #[test]
    fn test_non_object_starts_fresh() {
        let state = migrate(json!("garbage"), "919800000003").unwrap();
        assert_eq!(state.phone, "919800000003");
        assert_eq!(state.step, FunnelStep::Intro);
        assert_eq!(state.score, 0);
        assert!(state.language.is_none());
    }

    #[test]
    fn test_wrong_field_type_resets_only_that_field() {
        let doc = json!({
            "score": "lots",
            "step": "qualify_location",
            "slots": {"budget": "80 lakh", "location": 5},
            "message_count": 4,
            "handoff_done": "yes"
        });
        let state = migrate(doc, "919800000004").unwrap();
        assert_eq!(state.phone, "919800000004");
        assert_eq!(state.score, 0);
        assert!(!state.handoff_done);
        assert_eq!(state.step, FunnelStep::QualifyLocation);
        assert_eq!(state.message_count, 4);
        assert_eq!(state.slots.budget.as_deref(), Some("80 lakh"));
        assert!(state.slots.location.is_none());
    }
}
