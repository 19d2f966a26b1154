//! Best-effort extraction of a human readable detail from a provider error body.
//!
//! Provider error bodies have no guaranteed shape. Each extractor looks for one
//! shape and returns `None` when it does not apply; the first hit wins.

use serde_json::Value;

type Extractor = fn(&Value) -> Option<String>;

const JSON_EXTRACTORS: &[Extractor] = &[joined_errors, message_field, name_field];

/// Detail for a raw error body, or `None` when nothing usable was found.
///
/// JSON bodies are searched for `errors` (array of strings), then `message`,
/// then `name`. A body that is not JSON is returned verbatim. A JSON body
/// matching none of the shapes yields nothing.
pub fn extract_detail(body: &str) -> Option<String> {
    match serde_json::from_str::<Value>(body) {
        Ok(json) => JSON_EXTRACTORS
            .iter()
            .fold(None, |found, extractor| found.or_else(|| extractor(&json))),
        Err(_) => raw_text(body),
    }
}

/// `"<prefix>: <status> <reason>"` followed by `" - <detail>"` when a detail exists.
pub fn compose_message(prefix: &str, status: u16, reason: &str, detail: Option<&str>) -> String {
    let mut message = format!("{}: {} {}", prefix, status, reason)
        .trim_end()
        .to_string();
    if let Some(detail) = detail {
        message.push_str(" - ");
        message.push_str(detail);
    }
    message
}

fn joined_errors(json: &Value) -> Option<String> {
    let errors: Vec<&str> = json
        .get("errors")?
        .as_array()?
        .iter()
        .filter_map(Value::as_str)
        .collect();
    if errors.is_empty() {
        None
    } else {
        Some(errors.join(", "))
    }
}

fn message_field(json: &Value) -> Option<String> {
    non_empty_str(json.get("message")?)
}

fn name_field(json: &Value) -> Option<String> {
    non_empty_str(json.get("name")?)
}

fn non_empty_str(value: &Value) -> Option<String> {
    value
        .as_str()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn raw_text(body: &str) -> Option<String> {
    if body.trim().is_empty() {
        None
    } else {
        Some(body.to_string())
    }
}
