//! Shared test doubles for the recipe-client test suite.
//!
//! Provides a recording HTTP transport, a scriptable session provider and a
//! recording navigator, plus [`ClientHarness`] wiring all three into an
//! [`ApiClient`].
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let harness = ClientHarness::with_token("old");
//! harness.provider.push_refresh(Ok(session_with_token("new")));
//! harness.transport.push_status(401);
//! harness.transport.push(json_response(json!({ "ok": true })));
//!
//! let body: Value = harness.client().get("/users/me").await.unwrap();
//! assert_eq!(harness.transport.requests().len(), 2);
//! ```

use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::api::{ApiClient, HttpTransport, RequestDescriptor, TransportError};
use crate::auth::{
    AuthCallback, AuthEvent, AuthFailureHandler, AuthListeners, LiveSessionResolver, Navigator,
    Session, SessionError, SessionProvider, SessionUser, SignOutScope, SubscriptionId,
};
use crate::config::AuthConfig;

// =========================================================================
// Fixtures
// =========================================================================

/// A session for `user-1` valid for another hour.
pub fn session_with_token(token: &str) -> Session {
    Session {
        access_token: token.to_string(),
        refresh_token: format!("{token}-refresh"),
        expires_at: Some(chrono::Utc::now().timestamp() + 3600),
        user: Some(SessionUser {
            id: "user-1".to_string(),
            email: Some("ann@example.com".to_string()),
        }),
    }
}

/// A successful transport response with the given body.
pub fn json_response(body: Value) -> Result<Value, TransportError> {
    Ok(body)
}

// =========================================================================
// Transport
// =========================================================================

/// Replays queued responses in order and records every request.
///
/// An empty queue answers `null`.
#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<Result<Value, TransportError>>>,
    requests: Mutex<Vec<RequestDescriptor>>,
}

impl MockTransport {
    pub fn push(&self, response: Result<Value, TransportError>) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn push_status(&self, status: u16) {
        self.push(Err(TransportError::Status {
            status,
            message: format!("status {status}"),
            body: None,
        }));
    }

    pub fn requests(&self) -> Vec<RequestDescriptor> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: RequestDescriptor) -> Result<Value, TransportError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(Value::Null))
    }
}

// =========================================================================
// Session provider
// =========================================================================

/// Session provider whose refresh outcomes are scripted.
///
/// Each `refresh_session` pops the next queued result; an empty queue
/// fails with [`SessionError::NoSession`].
#[derive(Default)]
pub struct MockSessionProvider {
    session: Mutex<Option<Session>>,
    refresh_results: Mutex<VecDeque<Result<Session, String>>>,
    refresh_calls: AtomicUsize,
    sign_out_calls: AtomicUsize,
    sign_out_fails: AtomicBool,
    listeners: AuthListeners,
}

impl MockSessionProvider {
    pub fn signed_out() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        let provider = Self::default();
        *provider.session.lock().unwrap() = Some(session);
        provider
    }

    pub fn sign_in(&self, session: Session) {
        *self.session.lock().unwrap() = Some(session.clone());
        self.listeners.emit(AuthEvent::SignedIn, Some(&session));
    }

    pub fn push_refresh(&self, result: Result<Session, String>) {
        self.refresh_results.lock().unwrap().push_back(result);
    }

    pub fn fail_sign_out(&self) {
        self.sign_out_fails.store(true, Ordering::SeqCst);
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn sign_out_calls(&self) -> usize {
        self.sign_out_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionProvider for MockSessionProvider {
    async fn get_session(&self) -> Option<Session> {
        self.session.lock().unwrap().clone()
    }

    async fn refresh_session(&self) -> Result<Session, SessionError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.refresh_results.lock().unwrap().pop_front();
        match next {
            Some(Ok(session)) => {
                *self.session.lock().unwrap() = Some(session.clone());
                self.listeners.emit(AuthEvent::TokenRefreshed, Some(&session));
                Ok(session)
            }
            Some(Err(message)) => Err(SessionError::Refresh(message)),
            None => Err(SessionError::NoSession),
        }
    }

    async fn sign_out(&self, _scope: SignOutScope) -> Result<(), SessionError> {
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        self.session.lock().unwrap().take();
        self.listeners.emit(AuthEvent::SignedOut, None);
        if self.sign_out_fails.load(Ordering::SeqCst) {
            return Err(SessionError::Refresh("sign-out rejected".into()));
        }
        Ok(())
    }

    fn on_auth_state_change(&self, callback: AuthCallback) -> SubscriptionId {
        self.listeners.subscribe(callback)
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.listeners.unsubscribe(id);
    }
}

// =========================================================================
// Navigation
// =========================================================================

/// Navigator that records where it was sent.
pub struct RecordingNavigator {
    path: Mutex<String>,
    navigations: Mutex<Vec<String>>,
    auth_requests: AtomicUsize,
}

impl Default for RecordingNavigator {
    fn default() -> Self {
        Self {
            path: Mutex::new("/".to_string()),
            navigations: Mutex::default(),
            auth_requests: AtomicUsize::new(0),
        }
    }
}

impl RecordingNavigator {
    pub fn set_path(&self, path: &str) {
        *self.path.lock().unwrap() = path.to_string();
    }

    pub fn navigations(&self) -> Vec<String> {
        self.navigations.lock().unwrap().clone()
    }

    pub fn auth_requests(&self) -> usize {
        self.auth_requests.load(Ordering::SeqCst)
    }
}

impl Navigator for RecordingNavigator {
    fn current_path(&self) -> String {
        self.path.lock().unwrap().clone()
    }

    fn navigate(&self, path: &str) {
        self.set_path(path);
        self.navigations.lock().unwrap().push(path.to_string());
    }

    fn request_authentication(&self) {
        self.auth_requests.fetch_add(1, Ordering::SeqCst);
    }
}

// =========================================================================
// Client harness
// =========================================================================

/// An [`ApiClient`] wired to mocks, with the mocks kept for inspection.
pub struct ClientHarness {
    pub transport: Arc<MockTransport>,
    pub provider: Arc<MockSessionProvider>,
    pub navigator: Arc<RecordingNavigator>,
}

impl ClientHarness {
    pub fn with_token(token: &str) -> Self {
        Self::from_provider(MockSessionProvider::with_session(session_with_token(token)))
    }

    pub fn signed_out() -> Self {
        Self::from_provider(MockSessionProvider::signed_out())
    }

    fn from_provider(provider: MockSessionProvider) -> Self {
        Self {
            transport: Arc::new(MockTransport::default()),
            provider: Arc::new(provider),
            navigator: Arc::new(RecordingNavigator::default()),
        }
    }

    pub fn client(&self) -> ApiClient {
        let resolver = LiveSessionResolver::new(self.provider.clone(), Duration::from_secs(300));
        let handler = AuthFailureHandler::new(
            self.provider.clone(),
            self.navigator.clone(),
            &AuthConfig::default(),
        );
        ApiClient::new(self.transport.clone(), Arc::new(resolver))
            .with_failure_handler(Arc::new(handler))
    }
}
