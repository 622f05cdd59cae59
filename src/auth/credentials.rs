//! Where the access token comes from.
//!
//! Two contexts exist: a long-lived client holding a live session, and a
//! server rendering one request from the cookies that came with it. Both are
//! [`CredentialResolver`]s so the request pipeline does not care which one
//! it runs in.

use super::cookie::{self, MAX_COOKIE_CHUNKS};
use super::session::{SessionError, SessionProvider};
use crate::sync::lock;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, warn};

#[async_trait]
pub trait CredentialResolver: Send + Sync {
    /// The token to send with the next request, if signed in.
    async fn access_token(&self) -> Option<String>;

    /// Obtain a new session after the server rejected the current token.
    async fn refresh_access_token(&self) -> Result<(), SessionError>;
}

/// Client context: reads the provider's session, refreshing it ahead of
/// expiry.
pub struct LiveSessionResolver {
    provider: Arc<dyn SessionProvider>,
    lookahead: Duration,
}

impl LiveSessionResolver {
    pub fn new(provider: Arc<dyn SessionProvider>, lookahead: Duration) -> Self {
        Self {
            provider,
            lookahead,
        }
    }
}

#[async_trait]
impl CredentialResolver for LiveSessionResolver {
    /// A token inside the look-ahead window is refreshed first. If that
    /// refresh fails the current token is still returned and the server
    /// decides.
    async fn access_token(&self) -> Option<String> {
        let session = self.provider.get_session().await?;
        let now = chrono::Utc::now().timestamp();
        if session.expires_within(now, self.lookahead) {
            debug!(expires_at = session.expires_at, "token near expiry, refreshing");
            match self.provider.refresh_session().await {
                Ok(fresh) => return Some(fresh.access_token),
                Err(e) => warn!(error = %e, "proactive refresh failed, using current token"),
            }
        }
        Some(session.access_token)
    }

    async fn refresh_access_token(&self) -> Result<(), SessionError> {
        self.provider.refresh_session().await.map(|_| ())
    }
}

/// Server context: reads the token from the request's cookies.
///
/// With a provider attached, a refresh writes the new session back into the
/// cookie jar so later reads in the same request see it.
pub struct CookieCredentialResolver {
    cookie_name: String,
    cookies: Mutex<BTreeMap<String, String>>,
    provider: Option<Arc<dyn SessionProvider>>,
}

impl CookieCredentialResolver {
    pub fn new(cookie_name: impl Into<String>, cookies: BTreeMap<String, String>) -> Self {
        Self {
            cookie_name: cookie_name.into(),
            cookies: Mutex::new(cookies),
            provider: None,
        }
    }

    /// Build from a raw `Cookie` header.
    pub fn from_header(cookie_name: impl Into<String>, header: &str) -> Self {
        Self::new(cookie_name, cookie::parse_cookie_header(header))
    }

    pub fn with_provider(mut self, provider: Arc<dyn SessionProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Current cookie values, including any written back after a refresh.
    pub fn cookies(&self) -> BTreeMap<String, String> {
        lock(&self.cookies).clone()
    }

    fn store(&self, value: String) {
        let mut cookies = lock(&self.cookies);
        for index in 0..MAX_COOKIE_CHUNKS {
            cookies.remove(&format!("{}.{index}", self.cookie_name));
        }
        cookies.insert(self.cookie_name.clone(), value);
    }
}

#[async_trait]
impl CredentialResolver for CookieCredentialResolver {
    async fn access_token(&self) -> Option<String> {
        let joined = cookie::combine_chunks(&lock(&self.cookies), &self.cookie_name)?;
        match cookie::decode_access_token(&joined) {
            Ok(token) => Some(token),
            Err(e) => {
                debug!(error = %e, cookie = %self.cookie_name, "unusable session cookie");
                None
            }
        }
    }

    async fn refresh_access_token(&self) -> Result<(), SessionError> {
        let provider = self.provider.as_ref().ok_or(SessionError::NoSession)?;
        let session = provider.refresh_session().await?;
        let stored = cookie::encode_session(&session)
            .map_err(|e| SessionError::Refresh(e.to_string()))?;
        self.store(stored);
        Ok(())
    }
}
