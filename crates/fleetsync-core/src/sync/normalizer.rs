//! Raw position report normalization.
//!
//! Backend versions disagree on key names (`lat`/`latc`/`latitude`, ...),
//! so every logical attribute is read from the first present alias.
//! Normalization never drops a record: coordinates that cannot be coerced
//! become NaN and are filtered out at render time.

use fleetsync_types::{FetchOutcome, TrackedEntity};
use serde_json::Value;
use std::collections::HashSet;
use whatsgps_client::RawPositionReport;

const RAW_ID_KEYS: &[&str] = &["carId", "carID", "car_id"];
const NAME_KEYS: &[&str] = &["machineName", "carNO"];
const LAT_KEYS: &[&str] = &["lat", "latc", "latitude"];
const LNG_KEYS: &[&str] = &["lon", "lonc", "longitude"];
const IMEI_KEYS: &[&str] = &["imei", "IMIE", "deviceId"];
const HEADING_KEYS: &[&str] = &["direction", "course", "heading"];

/// Map raw reports of one account into canonical entities.
///
/// Pure: the same input always yields the same output.
pub fn normalize(reports: &[RawPositionReport], source: &str) -> Vec<TrackedEntity> {
    reports.iter().enumerate().map(|(index, report)| normalize_one(report, index, source)).collect()
}

fn normalize_one(report: &Value, index: usize, source: &str) -> TrackedEntity {
    let raw_id = first_present(report, RAW_ID_KEYS)
        .and_then(scalar_text)
        .unwrap_or_else(|| format!("#{index}"));

    let name = first_non_empty(report, NAME_KEYS)
        .or_else(|| (!source.is_empty()).then(|| source.to_string()))
        .unwrap_or_else(|| format!("Car {raw_id}"));

    TrackedEntity {
        id: format!("{source}::{raw_id}"),
        name,
        lat: first_present(report, LAT_KEYS).map_or(f64::NAN, coerce_number),
        lng: first_present(report, LNG_KEYS).map_or(f64::NAN, coerce_number),
        description: format!("speed: {} km/h", speed_text(report.get("speed"))),
        imei: first_present(report, IMEI_KEYS).and_then(scalar_text),
        heading: first_present(report, HEADING_KEYS).map(coerce_number).filter(|h| h.is_finite()),
        raw_id,
        source: source.to_string(),
    }
}

/// First alias whose value is present and not null.
fn first_present<'a>(report: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().filter_map(|k| report.get(*k)).find(|v| !v.is_null())
}

/// First alias whose value reads as non-empty text.
fn first_non_empty(report: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().filter_map(|k| report.get(*k)).filter_map(scalar_text).find(|t| !t.is_empty())
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn coerce_number(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                f64::NAN
            } else {
                trimmed.parse().unwrap_or(f64::NAN)
            }
        },
        _ => f64::NAN,
    }
}

/// Speed exactly as reported; missing, zero or empty reads as `0`.
fn speed_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::Number(n)) if n.as_f64() != Some(0.0) => n.to_string(),
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        _ => "0".to_string(),
    }
}

/// Concatenate successful outcomes into one merged list and join failure
/// messages with `" | "`. Entity ids are unique in the result; a repeated id
/// keeps its first occurrence.
pub fn merge_outcomes(outcomes: &[FetchOutcome]) -> (Vec<TrackedEntity>, Option<String>) {
    let mut seen = HashSet::new();
    let mut entities = Vec::new();

    for outcome in outcomes.iter().filter(|o| o.success) {
        for entity in &outcome.entities {
            if seen.insert(entity.id.clone()) {
                entities.push(entity.clone());
            } else {
                tracing::warn!("Duplicate entity id {} from {}, keeping first", entity.id, outcome.label);
            }
        }
    }

    let errors: Vec<String> = outcomes.iter().filter_map(FetchOutcome::error_message).collect();
    let combined = (!errors.is_empty()).then(|| errors.join(" | "));

    (entities, combined)
}
