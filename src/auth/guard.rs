//! What happens to the UI when authentication is lost or missing.

use super::session::{SessionProvider, SignOutScope};
use crate::config::AuthConfig;
use crate::sync::lock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

/// The navigation surface the auth layer drives.
pub trait Navigator: Send + Sync {
    fn current_path(&self) -> String;
    fn navigate(&self, path: &str);
    /// Ask the user to sign in (opens the sign-in dialog).
    fn request_authentication(&self);
}

/// Open/closed state of the sign-in dialog.
#[derive(Debug, Default)]
pub struct AuthModal {
    open: AtomicBool,
}

impl AuthModal {
    pub fn open(&self) {
        self.open.store(true, Ordering::SeqCst);
    }

    pub fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}

/// In-memory [`Navigator`]: tracks the current path and drives an
/// [`AuthModal`].
#[derive(Debug)]
pub struct NavigationState {
    path: Mutex<String>,
    pub modal: AuthModal,
}

impl NavigationState {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: Mutex::new(path.into()),
            modal: AuthModal::default(),
        }
    }
}

impl Navigator for NavigationState {
    fn current_path(&self) -> String {
        lock(&self.path).clone()
    }

    fn navigate(&self, path: &str) {
        *lock(&self.path) = path.to_string();
    }

    fn request_authentication(&self) {
        self.modal.open();
    }
}

/// Path without query string or fragment.
fn route_of(path: &str) -> &str {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    &path[..end]
}

/// Signs out and moves the user somewhere safe after an unrecoverable 401.
pub struct AuthFailureHandler {
    provider: Arc<dyn SessionProvider>,
    navigator: Arc<dyn Navigator>,
    public_routes: Vec<String>,
    home_route: String,
}

impl AuthFailureHandler {
    pub fn new(
        provider: Arc<dyn SessionProvider>,
        navigator: Arc<dyn Navigator>,
        config: &AuthConfig,
    ) -> Self {
        Self {
            provider,
            navigator,
            public_routes: config.public_routes.clone(),
            home_route: config.home_route.clone(),
        }
    }

    pub fn is_public(&self, path: &str) -> bool {
        let route = route_of(path);
        self.public_routes.iter().any(|r| r == route)
    }

    /// Local sign-out, navigate home unless the current route is public,
    /// then ask the user to sign in. A failing sign-out does not stop the
    /// rest.
    pub async fn handle_auth_failure(&self) {
        if let Err(e) = self.provider.sign_out(SignOutScope::Local).await {
            warn!(error = %e, "sign-out after auth failure failed");
        }
        let path = self.navigator.current_path();
        if !self.is_public(&path) {
            info!(from = %path, to = %self.home_route, "leaving protected route");
            self.navigator.navigate(&self.home_route);
        }
        self.navigator.request_authentication();
    }
}

/// Redirect target for a navigation to `path`, or `None` to allow it.
///
/// Signed-out users are sent to `home` from any protected prefix.
pub fn route_guard(path: &str, signed_in: bool, config: &AuthConfig) -> Option<String> {
    if signed_in {
        return None;
    }
    let route = route_of(path);
    config
        .protected_prefixes
        .iter()
        .any(|prefix| route.starts_with(prefix.as_str()))
        .then(|| config.home_route.clone())
}
