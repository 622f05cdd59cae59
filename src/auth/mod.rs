//! Sessions, credentials and auth-failure handling.
//!
//! | Module | Role |
//! |---|---|
//! | [`session`] | [`Session`], the [`SessionProvider`] trait, auth events, [`CurrentUser`] |
//! | [`remote`] | [`RemoteSessionProvider`] talking to the hosted auth service |
//! | [`credentials`] | Token lookup for the request pipeline, live or from cookies |
//! | [`cookie`] | Decoding the chunked, base64-encoded session cookie |
//! | [`guard`] | Sign-out + redirect on auth failure, route guard, sign-in dialog state |

pub mod cookie;
pub mod credentials;
pub mod guard;
pub mod remote;
pub mod session;

pub use cookie::CookieError;
pub use credentials::{CookieCredentialResolver, CredentialResolver, LiveSessionResolver};
pub use guard::{AuthFailureHandler, AuthModal, NavigationState, Navigator, route_guard};
pub use remote::RemoteSessionProvider;
pub use session::{
    AuthCallback, AuthEvent, AuthListeners, CurrentUser, Session, SessionError, SessionProvider,
    SessionUser, SignOutScope, SubscriptionId,
};
