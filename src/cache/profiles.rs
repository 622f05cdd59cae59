//! Profile pages and the signed-in user's own profile.

use crate::api::{ApiError, RecipeApi};
use crate::sync::lock;
use crate::types::Profile;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

struct Entry {
    profile: Profile,
    fetched_at: Instant,
}

/// Per-handle profiles served from memory for `ttl` after each fetch.
pub struct ProfileCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, Entry>>,
    current: Mutex<Option<Profile>>,
}

impl ProfileCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::default(),
            current: Mutex::default(),
        }
    }

    /// Profile for `handle`, fetched when missing, stale, or `force`d.
    pub async fn fetch_profile(
        &self,
        api: &dyn RecipeApi,
        handle: &str,
        force: bool,
    ) -> Result<Profile, ApiError> {
        if !force {
            if let Some(entry) = lock(&self.entries).get(handle) {
                if entry.fetched_at.elapsed() < self.ttl {
                    debug!(handle, "profile cache hit");
                    return Ok(entry.profile.clone());
                }
            }
        }

        let profile = api.fetch_profile(handle).await?;
        lock(&self.entries).insert(
            handle.to_string(),
            Entry {
                profile: profile.clone(),
                fetched_at: Instant::now(),
            },
        );
        Ok(profile)
    }

    /// Last successfully fetched profile for `handle`, stale or not.
    pub fn profile(&self, handle: &str) -> Option<Profile> {
        lock(&self.entries).get(handle).map(|e| e.profile.clone())
    }

    /// Load the signed-in user's profile. A failure clears the slot.
    pub async fn fetch_current_user_profile(&self, api: &dyn RecipeApi) -> Result<Profile, ApiError> {
        match api.fetch_current_profile().await {
            Ok(profile) => {
                *lock(&self.current) = Some(profile.clone());
                Ok(profile)
            }
            Err(e) => {
                lock(&self.current).take();
                Err(e)
            }
        }
    }

    pub fn current_user_profile(&self) -> Option<Profile> {
        lock(&self.current).clone()
    }

    pub fn clear(&self) {
        lock(&self.entries).clear();
        lock(&self.current).take();
    }
}
