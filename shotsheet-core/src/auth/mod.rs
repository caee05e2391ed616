//! Credential acquisition for the Sheets API
//!
//! The stored token moves through four states. `NoToken` and
//! `ExpiredUnrefreshable` need interactive consent, `ExpiredRefreshable` is
//! refreshed (falling back to consent when the grant is refused), and every
//! transition into `Valid` is persisted.

pub mod oauth;
pub mod secret;
pub mod token;

use crate::error::{Result, SyncError};
use chrono::{DateTime, Utc};
use std::path::PathBuf;

pub use oauth::GoogleOAuth;
pub use secret::ClientSecret;
pub use token::StoredToken;

/// Scope used when none is configured
pub const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialState {
    NoToken,
    ExpiredRefreshable(StoredToken),
    ExpiredUnrefreshable(StoredToken),
    Valid(StoredToken),
}

impl CredentialState {
    /// Classify a loaded token against the requested scopes
    pub fn classify(token: Option<StoredToken>, scopes: &[String], now: DateTime<Utc>) -> Self {
        match token {
            None => CredentialState::NoToken,
            Some(token) if !token.covers_scopes(scopes) => {
                log::info!("Stored token does not cover the requested scopes");
                CredentialState::NoToken
            }
            Some(token) if token.is_fresh(now) => CredentialState::Valid(token),
            Some(token) if token.can_refresh() => CredentialState::ExpiredRefreshable(token),
            Some(token) => CredentialState::ExpiredUnrefreshable(token),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CredentialState::NoToken => "no-token",
            CredentialState::ExpiredRefreshable(_) => "expired-refreshable",
            CredentialState::ExpiredUnrefreshable(_) => "expired-unrefreshable",
            CredentialState::Valid(_) => "valid",
        }
    }
}

/// Source of new tokens
pub trait TokenProvider {
    /// Exchange the token's refresh token for a new access token
    fn refresh(&self, token: &StoredToken) -> Result<StoredToken>;

    /// Ask the user to authorize the application
    fn consent(&self) -> Result<StoredToken>;
}

/// Token and client-secret files plus the scopes to request
#[derive(Debug, Clone)]
pub struct CredentialStore {
    token_path: PathBuf,
    scopes: Vec<String>,
}

impl CredentialStore {
    pub fn new(token_path: PathBuf, scopes: Vec<String>) -> Self {
        Self { token_path, scopes }
    }

    /// Current state of the token file
    pub fn state(&self, now: DateTime<Utc>) -> CredentialState {
        let token = match StoredToken::load(&self.token_path) {
            Ok(token) => token,
            Err(e) => {
                log::warn!("Ignoring unusable token file: {}", e);
                None
            }
        };
        CredentialState::classify(token, &self.scopes, now)
    }

    /// Drive the state machine to `Valid` and return the access token
    pub fn access_token<P: TokenProvider + ?Sized>(&self, provider: &P) -> Result<String> {
        let state = self.state(Utc::now());
        log::debug!(
            "Credential state: {} ({})",
            state.name(),
            self.token_path.display()
        );
        let token = ensure_valid(state, provider, |token| token.save(&self.token_path))?;
        token
            .token
            .ok_or_else(|| SyncError::Auth("token endpoint returned no access token".to_string()))
    }
}

/// Move `state` to a valid token, calling `persist` on every transition into `Valid`
pub fn ensure_valid<P, F>(state: CredentialState, provider: &P, mut persist: F) -> Result<StoredToken>
where
    P: TokenProvider + ?Sized,
    F: FnMut(&StoredToken) -> Result<()>,
{
    let token = match state {
        CredentialState::Valid(token) => return Ok(token),
        CredentialState::ExpiredRefreshable(token) => match provider.refresh(&token) {
            Ok(token) => token,
            Err(SyncError::Auth(reason)) => {
                log::warn!("Refresh rejected ({}), requesting consent", reason);
                provider.consent()?
            }
            Err(e) => return Err(e),
        },
        CredentialState::NoToken | CredentialState::ExpiredUnrefreshable(_) => provider.consent()?,
    };

    persist(&token)?;
    Ok(token)
}
