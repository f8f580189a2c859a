//! `{{ path }}` interpolation of action templates against inbound data.
//!
//! A string that consists of exactly one token resolves to the raw JSON value
//! at that path, so templates can inject lists or objects. Tokens embedded in
//! larger strings are rendered as text.

use serde_json::Value;

use crate::action_path::value_at;

/// Resolves every string in a template value against inbound data.
#[must_use]
pub fn resolve_template(template: &Value, data: &Value) -> Value {
    match template {
        Value::Null => Value::Null,
        Value::Bool(flag) => Value::Bool(*flag),
        Value::Number(number) => Value::Number(number.clone()),
        Value::String(content) => {
            if let Some(token) = single_token(content) {
                return token_value(token, data).cloned().unwrap_or(Value::Null);
            }

            Value::String(interpolate(content, data))
        }
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| resolve_template(item, data))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, value)| (key.clone(), resolve_template(value, data)))
                .collect(),
        ),
    }
}

/// Renders a resolved value as text. Null renders as empty text.
#[must_use]
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        Value::String(content) => content.clone(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

fn interpolate(value: &str, data: &Value) -> String {
    let mut result = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("{{") {
        let (head, after_head) = rest.split_at(start);
        result.push_str(head);

        let Some(end_relative) = after_head.find("}}") else {
            result.push_str(after_head);
            rest = "";
            break;
        };

        let token = after_head[2..end_relative].trim();
        if let Some(token_value) = token_value(token, data) {
            result.push_str(value_to_text(token_value).as_str());
        }

        rest = &after_head[end_relative + 2..];
    }

    result.push_str(rest);
    result
}

fn single_token(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if !trimmed.starts_with("{{") || !trimmed.ends_with("}}") || trimmed.len() < 4 {
        return None;
    }

    let token = trimmed[2..trimmed.len() - 2].trim();
    if token.is_empty() || token.contains("{{") || token.contains("}}") {
        return None;
    }

    Some(token)
}

fn token_value<'a>(token: &str, data: &'a Value) -> Option<&'a Value> {
    if token == "data" || token == "." {
        return Some(data);
    }

    let path = token.strip_prefix("data.").unwrap_or(token);
    value_at(data, path)
}
