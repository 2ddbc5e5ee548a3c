use crate::EntryStatus;
use serde_json::Value;

/// Business-level failure detection on a tool result.
///
/// A result signals failure when it is a string containing an error keyword,
/// carries `success: false` / `status: "error"` / an `error` field, has a
/// non-empty `failed_files` list, or has an empty `files` list together with
/// a message. An empty `files` list with no message is NOT an error; that
/// asymmetry is deliberate and must be preserved as-is.
pub fn is_error_result(result: &Value) -> bool {
    match result {
        Value::String(s) => contains_error_keyword(s),
        Value::Object(obj) => {
            if obj.get("error").is_some_and(|v| !v.is_null()) {
                return true;
            }
            if obj.get("success").and_then(Value::as_bool) == Some(false) {
                return true;
            }
            if obj.get("status").and_then(Value::as_str) == Some("error") {
                return true;
            }
            if let Some(message) = obj.get("message").and_then(Value::as_str) {
                if contains_error_keyword(message) {
                    return true;
                }
            }
            if let Some(failed) = obj.get("failed_files").and_then(Value::as_array) {
                if !failed.is_empty() {
                    return true;
                }
            }
            if let Some(files) = obj.get("files").and_then(Value::as_array) {
                if files.is_empty() && obj.get("message").is_some_and(|m| !m.is_null()) {
                    return true;
                }
            }
            false
        }
        _ => false,
    }
}

fn contains_error_keyword(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.contains("error") || lower.contains("failed") || lower.contains("exception")
}

pub fn determine_tool_status(result: &Value) -> EntryStatus {
    if is_error_result(result) {
        EntryStatus::Failed
    } else {
        EntryStatus::Completed
    }
}
