//! Typed reads the caches are built on.
//!
//! The caches depend on [`RecipeApi`] rather than [`ApiClient`] so their
//! coalescing and expiry logic can be tested with counting fakes.

use super::client::ApiClient;
use super::error::ApiError;
use crate::types::{Author, ListKind, Profile, RecipeSummary, path_segment};
use async_trait::async_trait;

#[async_trait]
pub trait RecipeApi: Send + Sync {
    /// `GET /users/id/{id}`
    async fn fetch_author(&self, id: &str) -> Result<Author, ApiError>;

    /// `GET /users/{handle}`
    async fn fetch_profile(&self, handle: &str) -> Result<Profile, ApiError>;

    /// `GET /users/me`
    async fn fetch_current_profile(&self) -> Result<Profile, ApiError>;

    /// One page of a user's recipe list.
    async fn fetch_recipe_page(
        &self,
        handle: &str,
        kind: ListKind,
        skip: usize,
        limit: usize,
    ) -> Result<Vec<RecipeSummary>, ApiError>;
}

#[async_trait]
impl RecipeApi for ApiClient {
    async fn fetch_author(&self, id: &str) -> Result<Author, ApiError> {
        self.get(&format!("/users/id/{}", path_segment(id))).await
    }

    async fn fetch_profile(&self, handle: &str) -> Result<Profile, ApiError> {
        self.get(&format!("/users/{}", path_segment(handle))).await
    }

    async fn fetch_current_profile(&self) -> Result<Profile, ApiError> {
        self.get("/users/me").await
    }

    async fn fetch_recipe_page(
        &self,
        handle: &str,
        kind: ListKind,
        skip: usize,
        limit: usize,
    ) -> Result<Vec<RecipeSummary>, ApiError> {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("skip", &skip.to_string())
            .append_pair("limit", &limit.to_string())
            .finish();
        self.get(&format!("{}?{query}", kind.endpoint(handle))).await
    }
}
