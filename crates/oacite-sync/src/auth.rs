//! Bearer-token lifecycle for the patent-office API.
//!
//! ```text
//! Unauthenticated --acquire--> Active --refresh--> Active
//!        |                       |
//!        +------ auth error -----+--> Failed (terminal)
//! ```
//!
//! A token is treated as valid for a fixed lifetime from issuance unless the
//! grant says otherwise (`expires_in`). Refresh is due once `now` passes
//! `expires_at - safety_margin`, leaving room for the refresh round trip to
//! finish before the old token really expires.

use chrono::{DateTime, TimeDelta, Utc};
use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info, warn};

/// Default token lifetime when the grant carries no `expires_in`.
pub const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;
/// Default headroom before expiry at which a refresh is started.
pub const DEFAULT_SAFETY_MARGIN_SECS: i64 = 60;

#[derive(Error, Debug)]
pub enum AuthError {
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("token endpoint returned {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("malformed token response: {0}")]
    Malformed(String),
    #[error("no session: acquire a token first")]
    NotAuthenticated,
    #[error("session failed earlier: {0}")]
    SessionFailed(String),
}

/// Username/password for the password grant.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Token endpoint reply.
#[derive(Clone, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

impl std::fmt::Debug for TokenGrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenGrant")
            .field("expires_in", &self.expires_in)
            .finish_non_exhaustive()
    }
}

/// Parse a token endpoint body. Missing tokens are a malformed reply.
pub fn parse_grant(body: &str) -> Result<TokenGrant, AuthError> {
    let grant: TokenGrant =
        serde_json::from_str(body).map_err(|e| AuthError::Malformed(e.to_string()))?;
    if grant.access_token.is_empty() || grant.refresh_token.is_empty() {
        return Err(AuthError::Malformed("empty token in response".into()));
    }
    Ok(grant)
}

/// The live bearer credential. Never persisted.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionToken")
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

/// Lifetime assumptions applied to every grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenPolicy {
    pub lifetime: TimeDelta,
    pub safety_margin: TimeDelta,
}

impl Default for TokenPolicy {
    fn default() -> Self {
        Self {
            lifetime: TimeDelta::seconds(DEFAULT_TOKEN_LIFETIME_SECS),
            safety_margin: TimeDelta::seconds(DEFAULT_SAFETY_MARGIN_SECS),
        }
    }
}

impl TokenPolicy {
    fn issue(&self, grant: TokenGrant, now: DateTime<Utc>) -> SessionToken {
        let default_expiry = now + self.lifetime;
        let expires_at = match grant.expires_in {
            Some(secs) => i64::try_from(secs)
                .ok()
                .and_then(TimeDelta::try_seconds)
                .and_then(|lifetime| now.checked_add_signed(lifetime))
                .unwrap_or_else(|| {
                    warn!(expires_in = secs, "unrepresentable token lifetime, using default");
                    default_expiry
                }),
            None => default_expiry,
        };
        SessionToken {
            access_token: grant.access_token,
            refresh_token: grant.refresh_token,
            expires_at,
        }
    }
}

/// True once `now` is within `safety_margin` of the token's expiry.
pub fn is_due_for_refresh(
    token: &SessionToken,
    now: DateTime<Utc>,
    safety_margin: TimeDelta,
) -> bool {
    now >= token.expires_at - safety_margin
}

/// Source of the current time, injectable for tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// The two grants the token endpoint supports.
#[async_trait::async_trait]
pub trait TokenEndpoint: Send + Sync {
    async fn password_grant(&self, credentials: &Credentials) -> Result<TokenGrant, AuthError>;
    async fn refresh_grant(&self, refresh_token: &str) -> Result<TokenGrant, AuthError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Active(SessionToken),
    /// Terminal. Holds the error that ended the session.
    Failed(String),
}

/// Owns the session token for a run and keeps it fresh.
pub struct TokenManager<E> {
    endpoint: E,
    policy: TokenPolicy,
    state: SessionState,
}

impl<E: TokenEndpoint> TokenManager<E> {
    pub fn new(endpoint: E) -> Self {
        Self::with_policy(endpoint, TokenPolicy::default())
    }

    pub fn with_policy(endpoint: E, policy: TokenPolicy) -> Self {
        Self {
            endpoint,
            policy,
            state: SessionState::Unauthenticated,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn policy(&self) -> TokenPolicy {
        self.policy
    }

    pub fn token(&self) -> Option<&SessionToken> {
        match &self.state {
            SessionState::Active(token) => Some(token),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.state, SessionState::Failed(_))
    }

    /// Exchange username/password for a token pair.
    pub async fn acquire(
        &mut self,
        credentials: &Credentials,
        now: DateTime<Utc>,
    ) -> Result<&SessionToken, AuthError> {
        if let SessionState::Failed(reason) = &self.state {
            return Err(AuthError::SessionFailed(reason.clone()));
        }
        info!(username = %credentials.username, "requesting access token");
        match self.endpoint.password_grant(credentials).await {
            Ok(grant) => {
                let token = self.policy.issue(grant, now);
                info!(expires_at = %token.expires_at, "session active");
                Ok(self.activate(token))
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Exchange the refresh token for a new pair, replacing the current token.
    pub async fn refresh(&mut self, now: DateTime<Utc>) -> Result<&SessionToken, AuthError> {
        let refresh_token = match &self.state {
            SessionState::Active(token) => token.refresh_token.clone(),
            SessionState::Unauthenticated => return Err(AuthError::NotAuthenticated),
            SessionState::Failed(reason) => return Err(AuthError::SessionFailed(reason.clone())),
        };
        info!("refreshing access token");
        match self.endpoint.refresh_grant(&refresh_token).await {
            Ok(grant) => {
                let token = self.policy.issue(grant, now);
                info!(expires_at = %token.expires_at, "token refreshed");
                Ok(self.activate(token))
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Refresh if due, then return the access token to use for the next call.
    pub async fn ensure_fresh(&mut self, now: DateTime<Utc>) -> Result<String, AuthError> {
        let due = match &self.state {
            SessionState::Active(token) => {
                is_due_for_refresh(token, now, self.policy.safety_margin)
            }
            SessionState::Unauthenticated => return Err(AuthError::NotAuthenticated),
            SessionState::Failed(reason) => return Err(AuthError::SessionFailed(reason.clone())),
        };
        if due {
            self.refresh(now).await?;
        }
        self.token()
            .map(|t| t.access_token.clone())
            .ok_or(AuthError::NotAuthenticated)
    }

    fn activate(&mut self, token: SessionToken) -> &SessionToken {
        self.state = SessionState::Active(token);
        match &self.state {
            SessionState::Active(token) => token,
            _ => unreachable!("state was just set to Active"),
        }
    }

    fn fail(&mut self, err: AuthError) -> AuthError {
        error!(error = %err, "authentication failed, session closed");
        self.state = SessionState::Failed(err.to_string());
        err
    }
}
