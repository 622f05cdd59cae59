//! Authenticated request pipeline.
//!
//! Every call goes through [`ApiClient::execute`]:
//!
//! ```text
//! FirstAttempt ──ok──────────────────────────────▶ Succeeded
//!      │ 401 ──refresh ok──▶ Retrying ──ok───────▶ Succeeded
//!      │          │                 └──any error─▶ Failed(error)
//!      │          └─refresh err──▶ handle_auth_failure ─▶ Failed(AuthenticationFailed)
//!      └ other error ─────────────────────────────▶ Failed(error)
//! ```
//!
//! A request is retried at most once, and only after a successful refresh.
//! The access token is re-read before every attempt, so the retry carries
//! the refreshed token.

use super::error::ApiError;
use super::transport::{HttpTransport, RequestBody, RequestDescriptor};
use crate::auth::{AuthFailureHandler, CredentialResolver};
use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const AUTHORIZATION: &str = "Authorization";

/// Caller-supplied parts of a request.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: Method,
    /// Extra headers. A caller-supplied `Authorization` overrides the
    /// computed one.
    pub headers: BTreeMap<String, String>,
    pub body: RequestBody,
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post(body: RequestBody) -> Self {
        Self {
            method: Method::POST,
            body,
            ..Self::default()
        }
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// Pipeline position for one logical request.
enum Attempt {
    FirstAttempt,
    Retrying,
    Succeeded(Value),
    Failed(ApiError),
}

/// HTTP client that attaches credentials and recovers from expired tokens.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn HttpTransport>,
    credentials: Arc<dyn CredentialResolver>,
    on_auth_failure: Option<Arc<AuthFailureHandler>>,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn HttpTransport>, credentials: Arc<dyn CredentialResolver>) -> Self {
        Self {
            transport,
            credentials,
            on_auth_failure: None,
        }
    }

    /// Run `handler` when a 401 cannot be recovered by refreshing.
    pub fn with_failure_handler(mut self, handler: Arc<AuthFailureHandler>) -> Self {
        self.on_auth_failure = Some(handler);
        self
    }

    /// Send a request and decode the success body into `T`.
    pub async fn execute<T: DeserializeOwned>(
        &self,
        url: &str,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        let mut state = Attempt::FirstAttempt;
        loop {
            state = match state {
                Attempt::FirstAttempt => match self.attempt(url, &options).await {
                    Ok(body) => Attempt::Succeeded(body),
                    Err(err) if err.is_unauthorized() => self.recover(url).await,
                    Err(err) => Attempt::Failed(err),
                },
                Attempt::Retrying => match self.attempt(url, &options).await {
                    Ok(body) => Attempt::Succeeded(body),
                    Err(err) => Attempt::Failed(err),
                },
                Attempt::Succeeded(body) => return Ok(serde_json::from_value(body)?),
                Attempt::Failed(err) => return Err(err),
            };
        }
    }

    /// Refresh after a 401 and decide whether to retry.
    async fn recover(&self, url: &str) -> Attempt {
        info!(url, "token expired, attempting to refresh");
        match self.credentials.refresh_access_token().await {
            Ok(()) => {
                info!(url, "token refreshed, retrying request");
                Attempt::Retrying
            }
            Err(err) => {
                warn!(error = %err, "token refresh failed, clearing session");
                if let Some(handler) = &self.on_auth_failure {
                    handler.handle_auth_failure().await;
                }
                Attempt::Failed(ApiError::AuthenticationFailed)
            }
        }
    }

    async fn attempt(&self, url: &str, options: &RequestOptions) -> Result<Value, ApiError> {
        let token = self.credentials.access_token().await;
        debug!(url, method = %options.method, authenticated = token.is_some(), "api request");
        let request = RequestDescriptor {
            method: options.method.clone(),
            url: url.to_string(),
            headers: merge_headers(token.as_deref(), &options.headers),
            body: options.body.clone(),
        };
        Ok(self.transport.send(request).await?)
    }

    pub async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        self.execute(url, RequestOptions::get()).await
    }

    pub async fn post_json<T: DeserializeOwned>(
        &self,
        url: &str,
        body: &impl Serialize,
    ) -> Result<T, ApiError> {
        let body = RequestBody::Json(serde_json::to_value(body).map_err(ApiError::Encode)?);
        self.execute(url, RequestOptions::post(body)).await
    }
}

/// Computed `Authorization` first, caller headers on top.
///
/// Header names compare case-insensitively, so `authorization` from the
/// caller replaces the computed `Authorization`.
fn merge_headers(token: Option<&str>, custom: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    let mut headers = BTreeMap::new();
    if let Some(token) = token {
        let overridden = custom
            .keys()
            .any(|name| name.eq_ignore_ascii_case(AUTHORIZATION));
        if !overridden {
            headers.insert(AUTHORIZATION.to_string(), format!("Bearer {token}"));
        }
    }
    headers.extend(custom.iter().map(|(k, v)| (k.clone(), v.clone())));
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{ClientHarness, json_response, session_with_token};
    use serde_json::json;

    // =========================================================================
    // Header resolution
    // =========================================================================

    #[test]
    fn bearer_header_when_token_present() {
        let headers = merge_headers(Some("abc"), &BTreeMap::new());
        assert_eq!(headers.get(AUTHORIZATION).map(String::as_str), Some("Bearer abc"));
    }

    #[test]
    fn no_authorization_without_token() {
        let headers = merge_headers(None, &BTreeMap::new());
        assert!(headers.is_empty());
    }

    #[test]
    fn custom_authorization_wins_case_insensitively() {
        let custom = BTreeMap::from([("authorization".to_string(), "Basic x".to_string())]);
        let headers = merge_headers(Some("abc"), &custom);
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("authorization").map(String::as_str), Some("Basic x"));
    }

    // =========================================================================
    // Pipeline
    // =========================================================================

    #[tokio::test]
    async fn success_decodes_body() {
        let harness = ClientHarness::with_token("tok");
        harness.transport.push(json_response(json!({ "id": "r1" })));

        let body: Value = harness.client().get("/recipes/r1").await.unwrap();
        assert_eq!(body, json!({ "id": "r1" }));

        let requests = harness.transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].headers.get(AUTHORIZATION).map(String::as_str),
            Some("Bearer tok")
        );
    }

    #[tokio::test]
    async fn signed_out_request_has_no_authorization() {
        let harness = ClientHarness::signed_out();
        harness.transport.push(json_response(json!([])));

        let _: Value = harness.client().get("/recipes").await.unwrap();
        assert!(harness.transport.requests()[0].headers.is_empty());
    }

    #[tokio::test]
    async fn unauthorized_refreshes_and_retries_once_with_new_token() {
        let harness = ClientHarness::with_token("old");
        harness.provider.push_refresh(Ok(session_with_token("new")));
        harness.transport.push_status(401);
        harness.transport.push(json_response(json!({ "ok": true })));

        let body: Value = harness.client().get("/users/me").await.unwrap();
        assert_eq!(body, json!({ "ok": true }));

        let requests = harness.transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(
            requests[1].headers.get(AUTHORIZATION).map(String::as_str),
            Some("Bearer new")
        );
        assert_eq!(harness.provider.refresh_calls(), 1);
        assert_eq!(harness.navigator.auth_requests(), 0);
    }

    #[tokio::test]
    async fn second_unauthorized_is_not_retried() {
        let harness = ClientHarness::with_token("old");
        harness.provider.push_refresh(Ok(session_with_token("new")));
        harness.transport.push_status(401);
        harness.transport.push_status(401);

        let result: Result<Value, _> = harness.client().get("/users/me").await;
        let err = result.unwrap_err();
        assert_eq!(err.status(), Some(401));
        assert!(!matches!(err, ApiError::AuthenticationFailed));
        assert_eq!(harness.transport.requests().len(), 2);
        assert_eq!(harness.provider.refresh_calls(), 1);
    }

    #[tokio::test]
    async fn failed_refresh_runs_auth_failure_handler() {
        let harness = ClientHarness::with_token("old");
        harness.navigator.set_path("/recipes/create");
        harness.transport.push_status(401);

        let result: Result<Value, _> = harness.client().get("/users/me").await;
        assert!(matches!(result, Err(ApiError::AuthenticationFailed)));
        assert_eq!(harness.transport.requests().len(), 1);
        assert_eq!(harness.provider.sign_out_calls(), 1);
        assert_eq!(harness.navigator.navigations(), vec!["/".to_string()]);
        assert_eq!(harness.navigator.auth_requests(), 1);
    }

    #[tokio::test]
    async fn other_errors_propagate_without_refresh() {
        let harness = ClientHarness::with_token("tok");
        harness.transport.push_status(500);

        let result: Result<Value, _> = harness.client().get("/recipes").await;
        assert_eq!(result.unwrap_err().status(), Some(500));
        assert_eq!(harness.provider.refresh_calls(), 0);
    }

    #[tokio::test]
    async fn post_json_sends_body() {
        let harness = ClientHarness::with_token("tok");
        harness.transport.push(json_response(json!({ "id": "r9" })));

        let _: Value = harness
            .client()
            .post_json("/recipes", &json!({ "title": "Soup" }))
            .await
            .unwrap();

        let request = &harness.transport.requests()[0];
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.body, RequestBody::Json(json!({ "title": "Soup" })));
    }

    #[tokio::test]
    async fn undecodable_body_is_decode_error() {
        let harness = ClientHarness::with_token("tok");
        harness.transport.push(json_response(json!("not a number")));

        let result: Result<u32, _> = harness.client().get("/count").await;
        assert!(matches!(result, Err(ApiError::Decode(_))));
    }

    #[tokio::test]
    async fn unserializable_body_is_encode_error() {
        let harness = ClientHarness::with_token("tok");
        let body = BTreeMap::from([((1, 2), "tuple keys have no JSON form")]);

        let result: Result<Value, _> = harness.client().post_json("/recipes", &body).await;
        assert!(matches!(result, Err(ApiError::Encode(_))));
        assert!(harness.transport.requests().is_empty());
    }
}
