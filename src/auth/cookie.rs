//! Decoding the persisted session cookie.
//!
//! The session is stored under a base cookie name. Large sessions are split
//! across `{name}.0` .. `{name}.4`, concatenated in index order. The joined
//! value is one of:
//!
//! | Shape | Example |
//! |---|---|
//! | `base64-` + base64 JSON | `base64-eyJhY2Nlc3NfdG9rZW4iOiJhYmMxMjMifQ==` |
//! | JSON object | `{"access_token":"abc123",...}` |
//! | JSON array, token first | `["abc123","refresh",...]` |
//! | bare token | `abc123` |
//!
//! Base64 may be standard or URL-safe, padded or not.

use super::session::Session;
use base64::Engine;
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

pub const BASE64_PREFIX: &str = "base64-";

/// Continuation chunks after the base entry.
pub const MAX_COOKIE_CHUNKS: usize = 5;

#[derive(Error, Debug, PartialEq)]
pub enum CookieError {
    #[error("session cookie not present")]
    Missing,
    #[error("session cookie is not valid base64")]
    Base64,
    #[error("session cookie is not valid JSON: {0}")]
    Json(String),
    #[error("session cookie has no access token")]
    NoAccessToken,
}

/// Split a `Cookie` request header into name/value pairs.
///
/// Names and values are percent-decoded and surrounding quotes dropped.
/// Later duplicates win. Pairs that do not parse are skipped.
pub fn parse_cookie_header(header: &str) -> BTreeMap<String, String> {
    ::cookie::Cookie::split_parse_encoded(header)
        .filter_map(Result::ok)
        .map(|c| (c.name().to_string(), c.value_trimmed().to_string()))
        .collect()
}

/// Join the base entry and its numbered chunks.
///
/// Chunks are read from `.0` upwards and stop at the first gap.
pub fn combine_chunks(cookies: &BTreeMap<String, String>, name: &str) -> Option<String> {
    let mut joined = cookies.get(name).cloned();
    for index in 0..MAX_COOKIE_CHUNKS {
        match cookies.get(&format!("{name}.{index}")) {
            Some(chunk) => joined.get_or_insert_with(String::new).push_str(chunk),
            None => break,
        }
    }
    joined.filter(|value| !value.is_empty())
}

fn decode_base64(encoded: &str) -> Result<Vec<u8>, CookieError> {
    let encoded = encoded.trim();
    [STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD]
        .iter()
        .find_map(|engine| engine.decode(encoded).ok())
        .ok_or(CookieError::Base64)
}

fn token_from_json(value: &Value) -> Result<String, CookieError> {
    let token = match value {
        Value::Object(map) => map.get("access_token").and_then(Value::as_str),
        Value::Array(items) => items.first().and_then(Value::as_str),
        _ => None,
    };
    token
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .ok_or(CookieError::NoAccessToken)
}

fn parse_json(bytes: &[u8]) -> Result<Value, CookieError> {
    serde_json::from_slice(bytes).map_err(|e| CookieError::Json(e.to_string()))
}

/// Extract the access token from a joined cookie value.
pub fn decode_access_token(raw: &str) -> Result<String, CookieError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(CookieError::Missing);
    }
    if let Some(encoded) = raw.strip_prefix(BASE64_PREFIX) {
        return token_from_json(&parse_json(&decode_base64(encoded)?)?);
    }
    if raw.starts_with('{') || raw.starts_with('[') {
        return token_from_json(&parse_json(raw.as_bytes())?);
    }
    // Unprefixed base64 JSON, else the value is the token itself.
    match decode_base64(raw).and_then(|bytes| parse_json(&bytes)) {
        Ok(value) => token_from_json(&value),
        Err(_) => Ok(raw.to_string()),
    }
}

/// Decode a full session from a joined cookie value.
///
/// Only the JSON object shapes carry a refresh token, so bare tokens and
/// arrays are rejected here.
pub fn decode_session(raw: &str) -> Result<Session, CookieError> {
    let raw = raw.trim();
    let value = match raw.strip_prefix(BASE64_PREFIX) {
        Some(encoded) => parse_json(&decode_base64(encoded)?)?,
        None if raw.starts_with('{') => parse_json(raw.as_bytes())?,
        None => return Err(CookieError::NoAccessToken),
    };
    serde_json::from_value(value).map_err(|e| CookieError::Json(e.to_string()))
}

/// Serialise a session the way it is stored: prefixed base64 JSON.
pub fn encode_session(session: &Session) -> Result<String, serde_json::Error> {
    let json = serde_json::to_vec(session)?;
    Ok(format!("{BASE64_PREFIX}{}", STANDARD.encode(json)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixed_base64_json() {
        let token = decode_access_token("base64-eyJhY2Nlc3NfdG9rZW4iOiJhYmMxMjMifQ==");
        assert_eq!(token.unwrap(), "abc123");
    }

    #[test]
    fn prefixed_url_safe_unpadded() {
        let encoded = URL_SAFE_NO_PAD.encode(br#"{"access_token":"x?y>z"}"#);
        let token = decode_access_token(&format!("base64-{encoded}"));
        assert_eq!(token.unwrap(), "x?y>z");
    }

    #[test]
    fn raw_json_object_and_array() {
        assert_eq!(decode_access_token(r#"{"access_token":"t1"}"#).unwrap(), "t1");
        assert_eq!(decode_access_token(r#"["t2","r2"]"#).unwrap(), "t2");
    }

    #[test]
    fn bare_token_passes_through() {
        assert_eq!(decode_access_token("eyJhbGciOi.abc.def").unwrap(), "eyJhbGciOi.abc.def");
    }

    #[test]
    fn prefixed_garbage_is_error() {
        assert_eq!(decode_access_token("base64-***"), Err(CookieError::Base64));
    }

    #[test]
    fn json_without_token_is_error() {
        assert_eq!(
            decode_access_token(r#"{"refresh_token":"r"}"#),
            Err(CookieError::NoAccessToken)
        );
    }

    #[test]
    fn parse_header_pairs() {
        let cookies = parse_cookie_header("a=1; b = 2 ;flag; c=\"q\"");
        assert_eq!(cookies.get("a").map(String::as_str), Some("1"));
        assert_eq!(cookies.get("b").map(String::as_str), Some("2"));
        assert_eq!(cookies.get("c").map(String::as_str), Some("q"));
        assert!(!cookies.contains_key("flag"));
    }

    #[test]
    fn parse_header_percent_decodes() {
        let cookies = parse_cookie_header("n=a%20b; theme=dark%3Blight; =orphan");
        assert_eq!(cookies.get("n").map(String::as_str), Some("a b"));
        assert_eq!(cookies.get("theme").map(String::as_str), Some("dark;light"));
        assert_eq!(cookies.len(), 2);
    }

    #[test]
    fn chunks_join_in_order_until_gap() {
        let cookies = parse_cookie_header("s.1=BB; s.0=AA; s.3=DD");
        assert_eq!(combine_chunks(&cookies, "s").as_deref(), Some("AABB"));
    }

    #[test]
    fn base_entry_alone() {
        let cookies = parse_cookie_header("s=whole");
        assert_eq!(combine_chunks(&cookies, "s").as_deref(), Some("whole"));
        assert_eq!(combine_chunks(&cookies, "other"), None);
    }

    #[test]
    fn chunked_prefixed_session() {
        let value = "base64-eyJhY2Nlc3NfdG9rZW4iOiJhYmMxMjMifQ==";
        let (head, tail) = value.split_at(20);
        let cookies = parse_cookie_header(&format!("sb.0={head}; sb.1={tail}"));
        let joined = combine_chunks(&cookies, "sb").unwrap();
        assert_eq!(decode_access_token(&joined).unwrap(), "abc123");
    }

    #[test]
    fn full_session_from_prefixed_cookie() {
        let session = decode_session("base64-eyJhY2Nlc3NfdG9rZW4iOiJhYmMxMjMifQ==").unwrap();
        assert_eq!(session.access_token, "abc123");
        assert!(session.refresh_token.is_empty());
        assert!(decode_session("bare-token").is_err());
    }

    #[test]
    fn encoded_session_decodes_back() {
        let session = Session {
            access_token: "fresh".into(),
            refresh_token: "r".into(),
            expires_at: None,
            user: None,
        };
        let stored = encode_session(&session).unwrap();
        assert!(stored.starts_with(BASE64_PREFIX));
        assert_eq!(decode_access_token(&stored).unwrap(), "fresh");
    }
}
