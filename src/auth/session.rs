//! Sessions and the provider that owns them.
//!
//! A [`SessionProvider`] is the single source of truth for "who is signed
//! in": it hands out the current [`Session`], refreshes it, signs out, and
//! tells subscribers when any of that changes.

use crate::sync::lock;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("no active session")]
    NoSession,
    #[error("session refresh failed: {0}")]
    Refresh(String),
    #[error("auth service request failed: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    /// Expiry as Unix seconds. Unknown expiry never triggers a refresh.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<SessionUser>,
}

impl Session {
    /// True when the token expires within `window` of `now` (Unix seconds),
    /// including tokens that have already expired.
    pub fn expires_within(&self, now: i64, window: Duration) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at - now <= window.as_secs() as i64,
            None => false,
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.id.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignOutScope {
    /// Revoke every session of the user.
    Global,
    /// Only forget this client's session.
    Local,
    /// Revoke the user's other sessions, keep this one.
    Others,
}

impl SignOutScope {
    pub fn as_str(self) -> &'static str {
        match self {
            SignOutScope::Global => "global",
            SignOutScope::Local => "local",
            SignOutScope::Others => "others",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn,
    SignedOut,
    TokenRefreshed,
}

pub type AuthCallback = Box<dyn Fn(AuthEvent, Option<&Session>) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// The current session, if any. Never contacts the network.
    async fn get_session(&self) -> Option<Session>;

    /// Exchange the refresh token for a new session and make it current.
    async fn refresh_session(&self) -> Result<Session, SessionError>;

    async fn sign_out(&self, scope: SignOutScope) -> Result<(), SessionError>;

    fn on_auth_state_change(&self, callback: AuthCallback) -> SubscriptionId;

    fn unsubscribe(&self, id: SubscriptionId);
}

/// Subscriber list shared by provider implementations.
#[derive(Default)]
pub struct AuthListeners {
    next_id: AtomicU64,
    callbacks: Mutex<Vec<(SubscriptionId, Arc<AuthCallback>)>>,
}

impl AuthListeners {
    pub fn subscribe(&self, callback: AuthCallback) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        lock(&self.callbacks).push((id, Arc::new(callback)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        lock(&self.callbacks).retain(|(sub, _)| *sub != id);
    }

    /// Call every subscriber. Callbacks run outside the lock, so they may
    /// subscribe or unsubscribe.
    pub fn emit(&self, event: AuthEvent, session: Option<&Session>) {
        let callbacks: Vec<_> = lock(&self.callbacks)
            .iter()
            .map(|(_, cb)| Arc::clone(cb))
            .collect();
        for callback in callbacks {
            callback(event, session);
        }
    }
}

/// Mirrors the signed-in user from auth events.
#[derive(Default)]
pub struct CurrentUser {
    user: Mutex<Option<SessionUser>>,
}

impl CurrentUser {
    /// Subscribe a new tracker to `provider`.
    pub fn track(provider: &dyn SessionProvider) -> Arc<Self> {
        let tracker = Arc::new(Self::default());
        let weak = Arc::downgrade(&tracker);
        provider.on_auth_state_change(Box::new(move |_, session| {
            if let Some(tracker) = weak.upgrade() {
                *lock(&tracker.user) = session.and_then(|s| s.user.clone());
            }
        }));
        tracker
    }

    /// Load the user from the provider's current session.
    pub async fn fetch_user(&self, provider: &dyn SessionProvider) -> Option<SessionUser> {
        let user = provider.get_session().await.and_then(|s| s.user);
        *lock(&self.user) = user.clone();
        user
    }

    pub fn user(&self) -> Option<SessionUser> {
        lock(&self.user).clone()
    }

    pub fn is_signed_in(&self) -> bool {
        lock(&self.user).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{MockSessionProvider, session_with_token};
    use std::sync::atomic::AtomicUsize;

    fn session_expiring_at(expires_at: Option<i64>) -> Session {
        Session {
            expires_at,
            ..session_with_token("t")
        }
    }

    #[test]
    fn expires_within_window() {
        let window = Duration::from_secs(300);
        assert!(session_expiring_at(Some(1_100)).expires_within(1_000, window));
        assert!(session_expiring_at(Some(1_300)).expires_within(1_000, window));
        assert!(!session_expiring_at(Some(1_301)).expires_within(1_000, window));
        assert!(session_expiring_at(Some(500)).expires_within(1_000, window));
        assert!(!session_expiring_at(None).expires_within(1_000, window));
    }

    #[test]
    fn session_decodes_without_optional_fields() {
        let session: Session = serde_json::from_str(r#"{"access_token":"abc"}"#).unwrap();
        assert_eq!(session.access_token, "abc");
        assert_eq!(session.expires_at, None);
        assert!(session.refresh_token.is_empty());
    }

    #[test]
    fn listeners_emit_and_unsubscribe() {
        let listeners = AuthListeners::default();
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let id = listeners.subscribe(Box::new(move |_, _| {
            seen.fetch_add(1, Ordering::SeqCst);
        }));

        listeners.emit(AuthEvent::SignedIn, None);
        listeners.unsubscribe(id);
        listeners.emit(AuthEvent::SignedOut, None);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn current_user_follows_events() {
        let provider = MockSessionProvider::signed_out();
        let tracker = CurrentUser::track(&provider);
        assert!(!tracker.is_signed_in());

        provider.sign_in(session_with_token("t"));
        assert_eq!(tracker.user().map(|u| u.id), Some("user-1".to_string()));

        provider.sign_out(SignOutScope::Local).await.unwrap();
        assert!(!tracker.is_signed_in());
    }

    #[tokio::test]
    async fn fetch_user_reads_current_session() {
        let provider = MockSessionProvider::with_session(session_with_token("t"));
        let tracker = CurrentUser::default();
        let user = tracker.fetch_user(&provider).await;
        assert_eq!(user.map(|u| u.id), Some("user-1".to_string()));
        assert!(tracker.is_signed_in());
    }
}
