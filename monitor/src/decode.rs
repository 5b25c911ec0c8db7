use crate::model::Reading;
use serde_json::Value;

/// Decodes a `{"t": .., "h": ..}` telemetry payload.
///
/// Returns `None` when the payload is not a JSON object or carries neither
/// `t` nor `h` (actuator commands share the topic). A field that is missing
/// or not a number reads as zero.
pub fn decode(payload: &[u8]) -> Option<Reading> {
    let value: Value = serde_json::from_slice(payload).ok()?;
    let object = value.as_object()?;
    if !object.contains_key("t") && !object.contains_key("h") {
        return None;
    }

    let field = |key: &str| object.get(key).and_then(Value::as_f64).unwrap_or(0.0);

    Some(Reading {
        temperature: field("t"),
        humidity: field("h"),
    })
}
