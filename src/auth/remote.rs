//! Session provider backed by the hosted auth service.
//!
//! | Call | Request |
//! |---|---|
//! | refresh | `POST {url}/token?grant_type=refresh_token` with `{"refresh_token": ...}` |
//! | sign out | `POST {url}/logout?scope={global,local,others}` with the bearer token |
//!
//! Both requests carry the public `apikey` header.

use super::session::{
    AuthCallback, AuthEvent, AuthListeners, Session, SessionError, SessionProvider, SessionUser,
    SignOutScope, SubscriptionId,
};
use crate::config::AuthConfig;
use crate::sync::lock;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// Token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    #[serde(default)]
    user: Option<SessionUser>,
}

impl TokenResponse {
    fn into_session(self, now: i64) -> Session {
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at: self.expires_at.or(self.expires_in.map(|secs| now + secs)),
            user: self.user,
        }
    }
}

pub struct RemoteSessionProvider {
    http: reqwest::Client,
    url: String,
    anon_key: String,
    session: Mutex<Option<Session>>,
    listeners: AuthListeners,
}

impl RemoteSessionProvider {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: config.url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
            session: Mutex::new(None),
            listeners: AuthListeners::default(),
        }
    }

    /// Adopt an existing session, e.g. one restored from a cookie.
    pub fn set_session(&self, session: Session) {
        *lock(&self.session) = Some(session.clone());
        self.listeners.emit(AuthEvent::SignedIn, Some(&session));
    }

    fn clear_local(&self) {
        lock(&self.session).take();
        self.listeners.emit(AuthEvent::SignedOut, None);
    }
}

#[async_trait]
impl SessionProvider for RemoteSessionProvider {
    async fn get_session(&self) -> Option<Session> {
        lock(&self.session).clone()
    }

    async fn refresh_session(&self) -> Result<Session, SessionError> {
        let refresh_token = lock(&self.session)
            .as_ref()
            .map(|s| s.refresh_token.clone())
            .filter(|t| !t.is_empty())
            .ok_or(SessionError::NoSession)?;

        debug!("refreshing session");
        let response = self
            .http
            .post(format!("{}/token", self.url))
            .query(&[("grant_type", "refresh_token")])
            .header("apikey", &self.anon_key)
            .json(&json!({ "refresh_token": refresh_token }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SessionError::Refresh(format!("{status}: {body}")));
        }

        let token: TokenResponse = response.json().await?;
        let session = token.into_session(chrono::Utc::now().timestamp());
        *lock(&self.session) = Some(session.clone());
        info!("session refreshed");
        self.listeners.emit(AuthEvent::TokenRefreshed, Some(&session));
        Ok(session)
    }

    /// Local state is cleared whether or not the remote call succeeds.
    async fn sign_out(&self, scope: SignOutScope) -> Result<(), SessionError> {
        let access_token = lock(&self.session).as_ref().map(|s| s.access_token.clone());
        let Some(access_token) = access_token else {
            self.clear_local();
            return Ok(());
        };

        let result = self
            .http
            .post(format!("{}/logout", self.url))
            .query(&[("scope", scope.as_str())])
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await
            .and_then(|r| r.error_for_status());

        self.clear_local();
        if let Err(e) = &result {
            warn!(error = %e, scope = scope.as_str(), "remote sign-out failed");
        }
        result.map(|_| ()).map_err(SessionError::from)
    }

    fn on_auth_state_change(&self, callback: AuthCallback) -> SubscriptionId {
        self.listeners.subscribe(callback)
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.listeners.unsubscribe(id);
    }
}
