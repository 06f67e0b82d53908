//! Sync layer: bearer-token lifecycle against the patent-office token endpoint,
//! and retrieval of refusal-notice packages.

pub mod auth;
pub mod fetch;

#[cfg(feature = "http")]
pub mod http;

pub use auth::{
    AuthError, Clock, Credentials, SessionState, SessionToken, SystemClock, TokenEndpoint,
    TokenGrant, TokenManager, TokenPolicy, is_due_for_refresh,
};
pub use fetch::{ArtifactFetcher, FetchError, check_application_number};

#[cfg(feature = "http")]
pub use http::{
    HttpTokenEndpoint, JpoFetcher, build_client, grant_from_reply, package_members,
};
