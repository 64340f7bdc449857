//! Performance transaction report parsing

use crate::error::{LocateError, LocateResult};
use crate::session::commands::END_PERFORMANCE_TRANSACTION;
use serde_json::Value;

/// Extract `key` from the JSON text returned when a performance transaction ends.
///
/// String values are returned as-is, numbers and booleans in their JSON form.
pub fn property_from_report(response: &str, key: &str) -> LocateResult<String> {
    let report: Value = serde_json::from_str(response).map_err(|e| {
        LocateError::session(
            END_PERFORMANCE_TRANSACTION,
            format!("transaction report is not JSON: {e}"),
        )
    })?;

    match report.get(key) {
        Some(Value::String(text)) => Ok(text.clone()),
        Some(Value::Null) | None => Err(LocateError::session(
            END_PERFORMANCE_TRANSACTION,
            format!("transaction report has no '{key}'"),
        )),
        Some(other) => Ok(other.to_string()),
    }
}
