//! In-memory caches in front of the recipe API.
//!
//! | Cache | Key | Lifetime |
//! |---|---|---|
//! | [`AuthorCache`] | user id | until invalidated; failures cached as `None` |
//! | [`RecipeListCache`] | handle + [`ListKind`](crate::types::ListKind) | until invalidated |
//! | [`ProfileCache`] | handle | `cache.profile_ttl_secs` after each fetch |
//!
//! All three are safe to share between tasks.

mod authors;
mod profiles;
mod recipe_lists;

pub use authors::AuthorCache;
pub use profiles::ProfileCache;
pub use recipe_lists::{RecipeList, RecipeListCache};

#[cfg(test)]
pub(crate) mod tests {
    use crate::api::{ApiError, RecipeApi};
    use crate::types::{Author, ListKind, Profile, RecipeSummary};
    use async_trait::async_trait;
    use std::collections::{HashSet, VecDeque};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    /// Counting [`RecipeApi`] with synthetic data.
    #[derive(Default)]
    pub struct FakeApi {
        author_calls: AtomicUsize,
        profile_calls: AtomicUsize,
        page_calls: AtomicUsize,
        delay: Mutex<Option<Duration>>,
        failing_authors: Mutex<HashSet<String>>,
        profiles_fail: AtomicBool,
        pages: Mutex<VecDeque<Vec<RecipeSummary>>>,
    }

    fn not_found() -> ApiError {
        ApiError::Http {
            status: 404,
            message: "Not Found".into(),
            body: None,
        }
    }

    impl FakeApi {
        pub fn set_delay(&self, delay: Duration) {
            *self.delay.lock().unwrap() = Some(delay);
        }

        pub fn fail_author(&self, id: &str) {
            self.failing_authors.lock().unwrap().insert(id.to_string());
        }

        pub fn fail_profiles(&self) {
            self.profiles_fail.store(true, Ordering::SeqCst);
        }

        pub fn set_pages(&self, pages: Vec<Vec<RecipeSummary>>) {
            *self.pages.lock().unwrap() = pages.into();
        }

        pub fn author_calls(&self) -> usize {
            self.author_calls.load(Ordering::SeqCst)
        }

        pub fn profile_calls(&self) -> usize {
            self.profile_calls.load(Ordering::SeqCst)
        }

        pub fn page_calls(&self) -> usize {
            self.page_calls.load(Ordering::SeqCst)
        }

        async fn pause(&self) {
            let delay = *self.delay.lock().unwrap();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
        }

        fn profile(handle: &str) -> Profile {
            Profile {
                id: format!("id-{handle}"),
                display_name: format!("User {handle}"),
                nick_name: handle.to_string(),
                avatar_url: None,
                bio: None,
                role: None,
            }
        }
    }

    #[async_trait]
    impl RecipeApi for FakeApi {
        async fn fetch_author(&self, id: &str) -> Result<Author, ApiError> {
            self.author_calls.fetch_add(1, Ordering::SeqCst);
            self.pause().await;
            if self.failing_authors.lock().unwrap().contains(id) {
                return Err(not_found());
            }
            Ok(Author {
                id: id.to_string(),
                display_name: format!("User {id}"),
                avatar_url: String::new(),
            })
        }

        async fn fetch_profile(&self, handle: &str) -> Result<Profile, ApiError> {
            self.profile_calls.fetch_add(1, Ordering::SeqCst);
            if self.profiles_fail.load(Ordering::SeqCst) {
                return Err(not_found());
            }
            Ok(Self::profile(handle))
        }

        async fn fetch_current_profile(&self) -> Result<Profile, ApiError> {
            self.fetch_profile("me").await
        }

        async fn fetch_recipe_page(
            &self,
            _handle: &str,
            _kind: ListKind,
            _skip: usize,
            _limit: usize,
        ) -> Result<Vec<RecipeSummary>, ApiError> {
            self.page_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.pages.lock().unwrap().pop_front().unwrap_or_default())
        }
    }
}
