//! Permissive coercion from the loosely-typed sync payload into `Player`
//! records. Coercion is total: a malformed field degrades to its default,
//! never to a request-level error.

use serde_json::Value;
use shared::{Player, DEFAULT_SPINNER_ID};

pub fn player_record(record: &Value) -> Player {
    Player {
        user_id: coerce_string(field(record, "userId"), ""),
        counter_spin: field(record, "counterSpin").as_bool().unwrap_or(false),
        wins: coerce_count(field(record, "wins")),
        spinner_id: coerce_string(field(record, "spinnerId"), DEFAULT_SPINNER_ID),
        bits: coerce_count(field(record, "bits")),
        clan: coerce_string(field(record, "clan"), ""),
        unlocks: coerce_unlocks(field(record, "unlocks")),
    }
}

fn field<'a>(record: &'a Value, name: &str) -> &'a Value {
    record.get(name).unwrap_or(&Value::Null)
}

// Empty strings, zero and `false` all collapse to the default, matching the
// truthiness rules the game's exporter was written against.
fn coerce_string(value: &Value, default: &str) -> String {
    match value {
        Value::String(s) if !s.is_empty() => s.clone(),
        Value::Number(n) if n.as_f64() != Some(0.0) => n.to_string(),
        Value::Bool(true) => "true".into(),
        _ => default.into(),
    }
}

fn coerce_count(value: &Value) -> u64 {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().map(|f| f.max(0.0) as u64))
            .unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

fn coerce_unlocks(value: &Value) -> Vec<String> {
    match value.as_array() {
        Some(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
        None => Vec::new(),
    }
}
