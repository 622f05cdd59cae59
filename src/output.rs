//! CLI output formatting for all commands.
//!
//! # Output Format
//!
//! ## Compress
//!
//! ```text
//! photo.jpg → photo-compressed.jpg
//!     1200x900 jpg
//!     Size: 4096.0 KB → 812.4 KB
//!     Quality: 85% (4 attempts)
//! ```
//!
//! ## Token
//!
//! ```text
//! Cookie sb-access-token
//!     Token: eyJhbGciOiJIUzI1…
//!     User: 6f1c…
//!     Expires: 2024-03-15 12:00:00 UTC
//! ```
//!
//! ## Validation errors
//!
//! ```text
//! ingredients #1 → amount
//!     Amount must be greater than 0
//! title
//!     Title must be at least 3 characters
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::auth::Session;
use crate::imaging::CompressedImage;
use crate::units::UNIT_GROUPS;
use crate::validation::{ParsedFieldError, group_errors_by_field};
use serde_json::Value;
use std::path::Path;

/// Characters of a token shown before it is elided.
const TOKEN_PREVIEW: usize = 16;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format an id as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn kilobytes(bytes: usize) -> String {
    format!("{:.1} KB", bytes as f64 / 1024.0)
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Shorten a token for display. Short tokens are shown whole.
fn token_preview(token: &str) -> String {
    match token.char_indices().nth(TOKEN_PREVIEW) {
        Some((cut, _)) => format!("{}…", &token[..cut]),
        None => token.to_string(),
    }
}

// ============================================================================
// Compress
// ============================================================================

pub fn format_compress_output(
    input: &Path,
    source_size: usize,
    image: &CompressedImage,
    output: &Path,
) -> Vec<String> {
    let mut lines = vec![format!("{} → {}", file_label(input), file_label(output))];
    lines.push(format!(
        "{}{}x{} {}",
        indent(1),
        image.width,
        image.height,
        image.extension()
    ));
    lines.push(format!(
        "{}Size: {} → {}",
        indent(1),
        kilobytes(source_size),
        kilobytes(image.bytes.len())
    ));
    let attempts = match image.attempts {
        1 => "1 attempt".to_string(),
        n => format!("{n} attempts"),
    };
    if image.format.supports_quality() {
        lines.push(format!(
            "{}Quality: {}% ({attempts})",
            indent(1),
            image.quality.as_percent()
        ));
    } else {
        lines.push(format!("{}Lossless ({attempts})", indent(1)));
    }
    lines
}

pub fn print_compress_output(
    input: &Path,
    source_size: usize,
    image: &CompressedImage,
    output: &Path,
) {
    for line in format_compress_output(input, source_size, image, output) {
        println!("{}", line);
    }
}

/// Upload result line: where the server stored the file.
pub fn format_upload_output(url: Option<&str>) -> Vec<String> {
    match url {
        Some(url) => vec![format!("Uploaded → {url}")],
        None => vec!["Nothing uploaded".to_string()],
    }
}

pub fn print_upload_output(url: Option<&str>) {
    for line in format_upload_output(url) {
        println!("{}", line);
    }
}

// ============================================================================
// Token
// ============================================================================

/// Describe the token found in a session cookie.
///
/// `session` is present when the cookie held a full session rather than a
/// bare token.
pub fn format_token_output(cookie_name: &str, token: &str, session: Option<&Session>) -> Vec<String> {
    let mut lines = vec![format!("Cookie {cookie_name}")];
    lines.push(format!("{}Token: {}", indent(1), token_preview(token)));
    let Some(session) = session else {
        return lines;
    };
    if let Some(user) = session.user_id() {
        lines.push(format!("{}User: {user}", indent(1)));
    }
    if let Some(expires) = session
        .expires_at
        .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
    {
        lines.push(format!(
            "{}Expires: {}",
            indent(1),
            expires.format("%Y-%m-%d %H:%M:%S UTC")
        ));
    }
    if !session.refresh_token.is_empty() {
        lines.push(format!("{}Refresh token: present", indent(1)));
    }
    lines
}

pub fn print_token_output(cookie_name: &str, token: &str, session: Option<&Session>) {
    for line in format_token_output(cookie_name, token, session) {
        println!("{}", line);
    }
}

// ============================================================================
// Get
// ============================================================================

/// Pretty-print a JSON response body. Strings are shown unquoted.
pub fn format_response(body: &Value) -> Vec<String> {
    let text = match body {
        Value::String(s) => s.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    };
    text.lines().map(str::to_string).collect()
}

pub fn print_response(body: &Value) {
    for line in format_response(body) {
        println!("{}", line);
    }
}

/// Server validation errors grouped under their field path.
pub fn format_validation_errors(errors: &[ParsedFieldError]) -> Vec<String> {
    let mut lines = Vec::new();
    for (field, messages) in group_errors_by_field(errors) {
        lines.push(field);
        lines.extend(messages.iter().map(|m| format!("{}{m}", indent(1))));
    }
    lines
}

pub fn print_validation_errors(errors: &[ParsedFieldError]) {
    for line in format_validation_errors(errors) {
        eprintln!("{}", line);
    }
}

// ============================================================================
// Units
// ============================================================================

pub fn format_units() -> Vec<String> {
    let mut lines = Vec::new();
    for group in UNIT_GROUPS {
        lines.push(group.name.to_string());
        for unit in group.units {
            lines.push(format!(
                "{}{} {}",
                indent(1),
                format_index(unit.id as usize),
                unit.label
            ));
        }
    }
    lines
}

pub fn print_units() {
    for line in format_units() {
        println!("{}", line);
    }
}
