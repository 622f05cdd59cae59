//! Per-user recipe lists kept across page views.
//!
//! Keyed by user handle and [`ListKind`]. A fetch at offset 0 replaces the
//! list; later pages append, skipping recipes already present. Entries live
//! until invalidated.

use crate::api::{ApiError, RecipeApi};
use crate::sync::lock;
use crate::types::{ListKind, RecipeSummary};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct RecipeList {
    pub recipes: Vec<RecipeSummary>,
    pub total_loaded: usize,
    pub has_more: bool,
}

#[derive(Default)]
pub struct RecipeListCache {
    lists: Mutex<HashMap<String, HashMap<ListKind, RecipeList>>>,
}

impl RecipeListCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_cached_list(&self, handle: &str, kind: ListKind) -> Option<RecipeList> {
        let lists = lock(&self.lists);
        let list = lists.get(handle)?.get(&kind)?;
        debug!(handle, %kind, recipes = list.recipes.len(), "recipe list cache hit");
        Some(list.clone())
    }

    /// Store a fetched page.
    ///
    /// `skip == 0` replaces the list. `skip > 0` appends to an existing
    /// list, dropping recipes whose id is already cached; with no existing
    /// list the page is discarded.
    pub fn set_cached_list(
        &self,
        handle: &str,
        kind: ListKind,
        recipes: Vec<RecipeSummary>,
        skip: usize,
        has_more: bool,
    ) {
        let mut lists = lock(&self.lists);
        let user = lists.entry(handle.to_string()).or_default();

        if skip == 0 {
            debug!(handle, %kind, recipes = recipes.len(), "recipe list cache set");
            user.insert(
                kind,
                RecipeList {
                    total_loaded: recipes.len(),
                    recipes,
                    has_more,
                },
            );
            return;
        }

        let Some(list) = user.get_mut(&kind) else {
            return;
        };
        let mut known: HashSet<String> = list.recipes.iter().map(|r| r.id.clone()).collect();
        let fresh: Vec<_> = recipes
            .into_iter()
            .filter(|r| known.insert(r.id.clone()))
            .collect();
        list.total_loaded += fresh.len();
        list.recipes.extend(fresh);
        list.has_more = has_more;
        debug!(handle, %kind, total = list.recipes.len(), "recipe list cache appended");
    }

    pub fn invalidate_list(&self, handle: &str, kind: ListKind) {
        if let Some(user) = lock(&self.lists).get_mut(handle) {
            if user.remove(&kind).is_some() {
                debug!(handle, %kind, "recipe list invalidated");
            }
        }
    }

    pub fn invalidate_user(&self, handle: &str) {
        lock(&self.lists).remove(handle);
        debug!(handle, "all recipe lists invalidated");
    }

    pub fn clear(&self) {
        lock(&self.lists).clear();
        debug!("recipe list cache cleared");
    }

    /// Shallow-merge `updates` into one cached recipe (after a like, a save).
    pub fn update_recipe(&self, handle: &str, kind: ListKind, id: &str, updates: &Map<String, Value>) {
        let mut lists = lock(&self.lists);
        let Some(list) = lists.get_mut(handle).and_then(|u| u.get_mut(&kind)) else {
            return;
        };
        if let Some(recipe) = list.recipes.iter_mut().find(|r| r.id == id) {
            recipe.merge(updates);
            debug!(handle, %kind, id, "recipe updated in cache");
        }
    }

    pub fn remove_recipe(&self, handle: &str, kind: ListKind, id: &str) {
        let mut lists = lock(&self.lists);
        let Some(list) = lists.get_mut(handle).and_then(|u| u.get_mut(&kind)) else {
            return;
        };
        let before = list.recipes.len();
        list.recipes.retain(|r| r.id != id);
        if list.recipes.len() < before {
            list.total_loaded = list.recipes.len();
            debug!(handle, %kind, id, "recipe removed from cache");
        }
    }

    /// Put a newly created recipe at the front of a cached list.
    pub fn add_recipe(&self, handle: &str, kind: ListKind, recipe: RecipeSummary) {
        let mut lists = lock(&self.lists);
        let Some(list) = lists.get_mut(handle).and_then(|u| u.get_mut(&kind)) else {
            return;
        };
        list.recipes.insert(0, recipe);
        list.total_loaded = list.recipes.len();
        debug!(handle, %kind, "recipe added to cache");
    }

    /// Fetch one page through the cache.
    ///
    /// A first page already cached is returned without a request. A short
    /// page means the list is exhausted, as does a zero `limit`.
    pub async fn load_page(
        &self,
        api: &dyn RecipeApi,
        handle: &str,
        kind: ListKind,
        skip: usize,
        limit: usize,
    ) -> Result<RecipeList, ApiError> {
        if skip == 0 {
            if let Some(list) = self.get_cached_list(handle, kind) {
                return Ok(list);
            }
        }
        let page = api.fetch_recipe_page(handle, kind, skip, limit).await?;
        let has_more = limit > 0 && page.len() >= limit;
        self.set_cached_list(handle, kind, page, skip, has_more);
        Ok(self.get_cached_list(handle, kind).unwrap_or(RecipeList {
            recipes: Vec::new(),
            total_loaded: 0,
            has_more: false,
        }))
    }
}
