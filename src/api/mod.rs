//! Authenticated HTTP access to the recipe API.
//!
//! | Piece | Role |
//! |---|---|
//! | [`ApiClient`] | Attaches the bearer token, refreshes once on 401, retries once |
//! | [`HttpTransport`] | Sends a resolved [`RequestDescriptor`]; [`ReqwestTransport`] in production |
//! | [`RecipeApi`] | Typed reads used by the caches |
//! | [`ApiError`] | What callers see when a request fails |

mod client;
mod endpoints;
mod error;
mod transport;

pub use client::{AUTHORIZATION, ApiClient, RequestOptions};
pub use endpoints::RecipeApi;
pub use error::{ApiError, TransportError};
pub use transport::{HttpTransport, MultipartFile, ReqwestTransport, RequestBody, RequestDescriptor};
