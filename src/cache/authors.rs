//! Author lookups shared by everything that renders a byline.
//!
//! Results are cached for the life of the cache, failures included: a failed
//! lookup is stored as `None` so the same missing author is not requested
//! over and over. Concurrent lookups of one id share a single request.

use crate::api::RecipeApi;
use crate::sync::lock;
use crate::types::{Author, DELETED_USER_ID};
use futures_util::future::{BoxFuture, FutureExt, Shared, join_all};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tracing::{debug, error};

type PendingLookup = Shared<BoxFuture<'static, Option<Author>>>;

#[derive(Default)]
struct AuthorState {
    authors: HashMap<String, Option<Author>>,
    pending: HashMap<String, PendingLookup>,
}

pub struct AuthorCache {
    api: Arc<dyn RecipeApi>,
    state: Arc<Mutex<AuthorState>>,
}

impl AuthorCache {
    pub fn new(api: Arc<dyn RecipeApi>) -> Self {
        Self {
            api,
            state: Arc::default(),
        }
    }

    /// Look up one author.
    ///
    /// The deleted-user id resolves to `None` without a request.
    pub async fn fetch_author(&self, id: &str) -> Option<Author> {
        if id == DELETED_USER_ID {
            return None;
        }

        let lookup = {
            let mut state = lock(&self.state);
            if let Some(cached) = state.authors.get(id) {
                return cached.clone();
            }
            match state.pending.get(id) {
                Some(pending) => pending.clone(),
                None => {
                    let lookup = self.start_lookup(id);
                    state.pending.insert(id.to_string(), lookup.clone());
                    lookup
                }
            }
        };
        lookup.await
    }

    fn start_lookup(&self, id: &str) -> PendingLookup {
        let api = Arc::clone(&self.api);
        let state = Arc::clone(&self.state);
        let id = id.to_string();
        async move {
            debug!(%id, "fetching author");
            let author = match api.fetch_author(&id).await {
                Ok(author) => Some(author),
                Err(e) => {
                    error!(%id, error = %e, "error fetching author");
                    None
                }
            };
            let mut state = lock(&state);
            state.authors.insert(id.clone(), author.clone());
            state.pending.remove(&id);
            author
        }
        .boxed()
        .shared()
    }

    /// Look up many authors at once, one request per distinct uncached id.
    ///
    /// Every requested id appears in the result.
    pub async fn fetch_authors(&self, ids: &[&str]) -> HashMap<String, Option<Author>> {
        let mut seen = HashSet::new();
        let missing: Vec<&str> = ids
            .iter()
            .copied()
            .filter(|id| *id != DELETED_USER_ID && seen.insert(*id))
            .filter(|id| !lock(&self.state).authors.contains_key(*id))
            .collect();

        if !missing.is_empty() {
            join_all(missing.iter().map(|id| self.fetch_author(id))).await;
        }

        let state = lock(&self.state);
        ids.iter()
            .map(|id| {
                let author = state.authors.get(*id).cloned().flatten();
                (id.to_string(), author)
            })
            .collect()
    }

    /// Seed the cache with author info that arrived some other way.
    pub fn cache_author(&self, id: &str, author: Option<Author>) {
        lock(&self.state).authors.insert(id.to_string(), author);
    }

    pub fn invalidate_author(&self, id: &str) {
        lock(&self.state).authors.remove(id);
    }

    /// Drop every cached author and forget in-flight lookups.
    pub fn clear(&self) {
        let mut state = lock(&self.state);
        state.authors.clear();
        state.pending.clear();
    }

    /// Cached value without fetching.
    ///
    /// `None`: never looked up. `Some(None)`: looked up, no such author.
    pub fn cached_author(&self, id: &str) -> Option<Option<Author>> {
        lock(&self.state).authors.get(id).cloned()
    }
}
