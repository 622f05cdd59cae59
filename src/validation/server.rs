//! Server-side validation errors (HTTP 422) turned into form messages.
//!
//! The server sends `{"detail": [...]}` where each entry names an error
//! type, a location path starting with `body`, a raw message and optional
//! context (limits such as `gt` or `min_length`).

use crate::api::ApiError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

static VALUE_ERROR_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^Value error,?\s*").expect("valid regex"));

/// One step of an error location: a field name or a list index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LocSegment {
    Index(u64),
    Key(String),
}

impl fmt::Display for LocSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocSegment::Index(i) => write!(f, "{i}"),
            LocSegment::Key(k) => f.write_str(k),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    #[serde(rename = "type")]
    pub kind: String,
    pub loc: Vec<LocSegment>,
    pub msg: String,
    #[serde(default)]
    pub input: Value,
    #[serde(default)]
    pub ctx: Option<Map<String, Value>>,
}

/// A server error ready for display.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFieldError {
    /// Readable location, e.g. `ingredients #1 → amount`.
    pub field: String,
    pub message: String,
    pub kind: String,
    /// Location without the leading `body`, as strings.
    pub path: Vec<String>,
}

pub fn parse_validation_errors(errors: &[ValidationErrorDetail]) -> Vec<ParsedFieldError> {
    errors
        .iter()
        .map(|error| {
            let path = error.loc.get(1..).unwrap_or_default();
            ParsedFieldError {
                field: format_field_path(path),
                message: format_error_message(error),
                kind: error.kind.clone(),
                path: path.iter().map(ToString::to_string).collect(),
            }
        })
        .collect()
}

/// `["ingredients", 0, "amount"]` → `ingredients #1 → amount`.
///
/// An index folds into the field name before it; an empty path is `form`.
pub fn format_field_path(path: &[LocSegment]) -> String {
    if path.is_empty() {
        return "form".to_string();
    }
    let mut parts: Vec<String> = Vec::new();
    for (i, segment) in path.iter().enumerate() {
        match segment {
            LocSegment::Key(key) => parts.push(key.clone()),
            LocSegment::Index(index) => {
                if let Some(LocSegment::Key(prev)) = i.checked_sub(1).map(|p| &path[p]) {
                    parts.pop();
                    parts.push(format!("{prev} #{}", index + 1));
                }
            }
        }
    }
    parts.join(" → ")
}

/// Last named segment of the location, snake_case → Title Case.
fn field_name(loc: &[LocSegment]) -> String {
    let name = loc
        .get(1..)
        .unwrap_or_default()
        .iter()
        .rev()
        .find_map(|s| match s {
            LocSegment::Key(k) => Some(k.as_str()),
            LocSegment::Index(_) => None,
        });
    let Some(name) = name else {
        return "This field".to_string();
    };
    name.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render a context limit. Limits arrive either bare or as `{"source": ..}`.
fn ctx_value(error: &ValidationErrorDetail, key: &str) -> Option<String> {
    let value = error.ctx.as_ref()?.get(key)?;
    let value = value.get("source").unwrap_or(value);
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn format_error_message(error: &ValidationErrorDetail) -> String {
    let name = || field_name(&error.loc);
    let limit = |key: &str, fallback: &str| {
        ctx_value(error, key).unwrap_or_else(|| fallback.to_string())
    };
    match error.kind.as_str() {
        "greater_than" => format!("{} must be greater than {}", name(), limit("gt", "0")),
        "greater_than_equal" => format!("{} must be at least {}", name(), limit("ge", "0")),
        "less_than" => format!("{} must be less than {}", name(), limit("lt", "the limit")),
        "string_too_short" => format!(
            "{} must be at least {} characters",
            name(),
            limit("min_length", "the minimum")
        ),
        "string_too_long" => format!(
            "{} must be no more than {} characters",
            name(),
            limit("max_length", "the maximum")
        ),
        "missing" => format!("{} is required", name()),
        "value_error" => VALUE_ERROR_PREFIX.replace(&error.msg, "").into_owned(),
        "string_type" => format!("{} must be text", name()),
        "int_type" | "float_type" => format!("{} must be a number", name()),
        "bool_type" => format!("{} must be true or false", name()),
        "list_type" => format!("{} must be a list", name()),
        _ => error.msg.clone(),
    }
}

/// Form input key for a server error path.
///
/// `["ingredients", "0", "amount"]` → `ingredient-0-amount`,
/// `["steps", "2"]` → `step-2`, `["title"]` → `title`, `[]` → `general`.
pub fn map_error_to_form_field(path: &[String]) -> String {
    let Some(first) = path.first() else {
        return "general".to_string();
    };
    let has = |name: &str| path.iter().any(|s| s == name);
    if has("ingredients") && path.len() >= 2 {
        let field = path.get(2).map_or("name", String::as_str);
        return format!("ingredient-{}-{field}", path[1]);
    }
    if has("steps") && path.len() >= 2 {
        return format!("step-{}", path[1]);
    }
    first.clone()
}

/// Messages grouped under their readable field path.
pub fn group_errors_by_field(errors: &[ParsedFieldError]) -> BTreeMap<String, Vec<String>> {
    let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for error in errors {
        grouped
            .entry(error.field.clone())
            .or_default()
            .push(error.message.clone());
    }
    grouped
}

/// Validation details carried by a 422 response. Anything else yields none.
///
/// Entries that do not match the wire format are skipped.
pub fn extract_validation_errors(error: &ApiError) -> Vec<ValidationErrorDetail> {
    if !error.is_validation_error() {
        return Vec::new();
    }
    let Some(Value::Array(detail)) = error.body().and_then(|b| b.get("detail")) else {
        return Vec::new();
    };
    detail
        .iter()
        .filter_map(|entry| serde_json::from_value(entry.clone()).ok())
        .collect()
}
