use std::fmt::{Display, Formatter};

use courier_core::{AppError, AppResult};
use serde_json::Value;

use crate::action::ActionDefinition;

/// Dotted path to a node inside an application definition, such as
/// `pages.0.blocks.0.actions.get`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionPath {
    raw: String,
    segments: Vec<String>,
}

impl ActionPath {
    /// Parses a dotted path. Empty paths and empty segments are rejected as
    /// not found, since no node can live at them.
    pub fn parse(raw: &str) -> AppResult<Self> {
        if raw.is_empty() {
            return Err(AppError::NotFound("action path is empty".to_owned()));
        }

        let segments = raw.split('.').map(str::to_owned).collect::<Vec<_>>();
        if segments.iter().any(String::is_empty) {
            return Err(AppError::NotFound(format!(
                "action path '{raw}' contains an empty segment"
            )));
        }

        Ok(Self {
            raw: raw.to_owned(),
            segments,
        })
    }

    /// Returns the path as given.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.raw.as_str()
    }

    /// Walks the definition tree and returns the node at this path.
    pub fn locate<'a>(&self, definition: &'a Value) -> AppResult<&'a Value> {
        let mut current = definition;
        for segment in &self.segments {
            current = child(current, segment).ok_or_else(|| {
                AppError::NotFound(format!(
                    "action path '{}' has no node at segment '{segment}'",
                    self.raw
                ))
            })?;
        }

        Ok(current)
    }

    /// Locates the node at this path and interprets it as a dispatchable
    /// action.
    pub fn resolve_action(&self, definition: &Value) -> AppResult<ActionDefinition> {
        let node = self.locate(definition)?;
        ActionDefinition::from_node(node).map_err(|error| match error {
            AppError::InvalidAction(message) => {
                AppError::InvalidAction(format!("{message} at '{}'", self.raw))
            }
            other => other,
        })
    }
}

impl Display for ActionPath {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.raw.as_str())
    }
}

/// Looks up a dotted path in arbitrary JSON. Array nodes are indexed by
/// non-negative integer segments, object nodes by key.
#[must_use]
pub fn value_at<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = root;
    for segment in path.split('.') {
        if segment.is_empty() {
            return None;
        }

        current = child(current, segment)?;
    }

    Some(current)
}

fn child<'a>(node: &'a Value, segment: &str) -> Option<&'a Value> {
    match node {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment
            .parse::<usize>()
            .ok()
            .and_then(|index| items.get(index)),
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => None,
    }
}
