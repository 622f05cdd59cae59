//! # Recipe Client
//!
//! The client layer of a recipe-sharing app: everything between the UI and
//! the HTTP API. Requests are authenticated, retried once after a token
//! refresh, and turn an unrecoverable 401 into a sign-out and redirect.
//! Uploaded images are compressed into a fixed envelope first, frequently
//! read data is cached with in-flight request coalescing, and server 422s
//! become readable form errors.
//!
//! # Request Pipeline
//!
//! ```text
//! caller → ApiClient::execute
//!            │  token ← CredentialResolver (refreshes ahead of expiry)
//!            ▼
//!          HttpTransport::send ──ok──→ decoded JSON
//!            │ 401
//!            ▼
//!          refresh_access_token ──ok──→ send once more with the new token
//!            │ failed
//!            ▼
//!          AuthFailureHandler: sign out (local), leave protected route,
//!                              open the sign-in dialog → AuthenticationFailed
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`api`] | Request pipeline, transport seam, typed endpoint reads |
//! | [`auth`] | Sessions, the session cookie, credential lookup, auth-failure handling |
//! | [`cache`] | Author, profile and recipe-list caches |
//! | [`imaging`] | Pure-Rust image compression for uploads |
//! | [`validation`] | Client-side form rules and server 422 decoding |
//! | [`notify`] | Toast notifications with auto-dismiss |
//! | [`config`] | `config.toml` loading, validation and merging over stock defaults |
//! | [`types`] | Shared API types (`Author`, `Profile`, `RecipeSummary`, `ListKind`) |
//! | [`units`] | Ingredient measurement units |
//! | [`format`] | Relative dates and page titles |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Capability Traits at Every I/O Seam
//!
//! The network ([`api::HttpTransport`]), the session service
//! ([`auth::SessionProvider`]), navigation ([`auth::Navigator`]), typed reads
//! ([`api::RecipeApi`]) and image codecs ([`imaging::ImageBackend`]) are
//! traits. Production code wires in reqwest and the `image` crate; tests
//! wire in recording mocks, so the retry, coalescing and compression loops
//! run without a server or real encodes.
//!
//! ## One Retry, Then Give Up
//!
//! A 401 triggers exactly one refresh and one retry. A second 401 is returned
//! to the caller as is; a failed refresh runs the auth-failure handler. The
//! token is re-read on each attempt, never captured up front.
//!
//! ## Caches Are Explicit Objects
//!
//! Caches are values owned by whoever builds the app, not globals. Tests and
//! sign-out get a fresh state by constructing or clearing them.

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod format;
pub mod imaging;
pub mod notify;
pub mod output;
pub mod types;
pub mod units;
pub mod validation;

mod sync;

#[cfg(test)]
pub(crate) mod test_helpers;
