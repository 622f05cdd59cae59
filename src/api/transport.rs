//! HTTP transport seam.
//!
//! [`ApiClient`](super::ApiClient) never talks to the network directly: it
//! hands a fully-resolved [`RequestDescriptor`] to an [`HttpTransport`].
//! [`ReqwestTransport`] is the production implementation; tests use a
//! recording mock.

use super::error::TransportError;
use async_trait::async_trait;
use reqwest::Method;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// A file sent as one part of a `multipart/form-data` body.
#[derive(Debug, Clone, PartialEq)]
pub struct MultipartFile {
    pub field: String,
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    Multipart(MultipartFile),
}

/// One outgoing request after headers have been resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub method: Method,
    /// Path relative to the API base, or an absolute URL.
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: RequestBody,
}

/// Sends requests and returns the decoded JSON body of a success response.
///
/// Non-2xx responses must be reported as [`TransportError::Status`] so the
/// client can recognise a 401.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: RequestDescriptor) -> Result<Value, TransportError>;
}

/// Production transport on `reqwest`, resolving paths against a base URL.
pub struct ReqwestTransport {
    http: reqwest::Client,
    base_url: String,
}

impl ReqwestTransport {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    /// Join a request path onto the base URL. Absolute URLs pass through.
    pub fn resolve(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            return url.to_string();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            url.trim_start_matches('/')
        )
    }
}

fn network(err: reqwest::Error) -> TransportError {
    TransportError::Network(err.to_string())
}

/// Empty bodies decode to `null`; bodies that are not JSON are kept as text.
fn decode_body(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: RequestDescriptor) -> Result<Value, TransportError> {
        let url = self.resolve(&request.url);
        debug!(method = %request.method, %url, "sending request");

        let mut builder = self.http.request(request.method, &url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart(file) => {
                let part = Part::bytes(file.bytes)
                    .file_name(file.file_name)
                    .mime_str(&file.mime_type)
                    .map_err(network)?;
                builder.multipart(Form::new().part(file.field, part))
            }
        };

        let response = builder.send().await.map_err(network)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(network)?;
        let body = decode_body(&bytes);

        if status.is_success() {
            return Ok(body);
        }
        debug!(status = status.as_u16(), %url, "request failed");
        Err(TransportError::Status {
            status: status.as_u16(),
            message: status
                .canonical_reason()
                .unwrap_or("Unknown status")
                .to_string(),
            body: (!body.is_null()).then_some(body),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resolve_joins_with_single_slash() {
        let transport = ReqwestTransport::new("http://api.test/api/");
        assert_eq!(transport.resolve("/recipes"), "http://api.test/api/recipes");
        assert_eq!(transport.resolve("recipes"), "http://api.test/api/recipes");
    }

    #[test]
    fn resolve_passes_absolute_urls_through() {
        let transport = ReqwestTransport::new("http://api.test/api");
        assert_eq!(
            transport.resolve("https://other.test/x"),
            "https://other.test/x"
        );
    }

    #[test]
    fn decode_body_variants() {
        assert_eq!(decode_body(b""), Value::Null);
        assert_eq!(decode_body(br#"{"a":1}"#), json!({ "a": 1 }));
        assert_eq!(decode_body(b"plain"), Value::String("plain".into()));
    }
}
