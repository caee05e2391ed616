//! OAuth client secret downloaded from the Google Cloud console

use super::token::GOOGLE_TOKEN_URI;
use crate::error::{Result, SyncError};
use serde::Deserialize;
use std::fs;
use std::path::Path;

const GOOGLE_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientSecret {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_auth_uri() -> String {
    GOOGLE_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URI.to_string()
}

/// The console wraps the secret in an object keyed by application type
#[derive(Debug, Deserialize)]
enum SecretFile {
    #[serde(rename = "installed")]
    Installed(ClientSecret),
    #[serde(rename = "web")]
    Web(ClientSecret),
}

impl ClientSecret {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            SyncError::io(
                format!("failed to read client secret file {}", path.display()),
                e,
            )
        })?;
        Self::from_json(&content)
            .map_err(|e| SyncError::Auth(format!("{}: {}", path.display(), e)))
    }

    fn from_json(content: &str) -> std::result::Result<Self, serde_json::Error> {
        let file: SecretFile = serde_json::from_str(content)?;
        Ok(match file {
            SecretFile::Installed(secret) | SecretFile::Web(secret) => secret,
        })
    }
}
