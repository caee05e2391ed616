//! Persisted OAuth token in Google's authorized-user JSON format

use crate::error::{Result, SyncError};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;
use tempfile::NamedTempFile;

pub const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Tokens are treated as expired this long before their recorded expiry
const EXPIRY_SKEW_SECONDS: i64 = 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredToken {
    /// Access token
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URI.to_string()
}

impl StoredToken {
    /// Load the token file; a missing file is `Ok(None)`
    pub fn load(path: &Path) -> Result<Option<Self>> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(SyncError::io(
                    format!("failed to read token file {}", path.display()),
                    e,
                ));
            }
        };
        let token = serde_json::from_str(&content).map_err(|e| {
            SyncError::Auth(format!("invalid token file {}: {}", path.display(), e))
        })?;
        Ok(Some(token))
    }

    /// Replace the token file atomically.
    ///
    /// The token is written to a temp file beside `path` and renamed into
    /// place, so a crash mid-save leaves the previous token intact. The temp
    /// file is created owner-only on Unix and the rename keeps that mode.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| SyncError::Auth(format!("failed to encode token: {}", e)))?;
        write_atomic(path, json.as_bytes()).map_err(|e| {
            SyncError::io(format!("failed to write token file {}", path.display()), e)
        })
    }

    /// Access token present and not about to expire
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        if self.token.as_deref().is_none_or(str::is_empty) {
            return false;
        }
        match self.expiry {
            Some(expiry) => expiry - Duration::seconds(EXPIRY_SKEW_SECONDS) > now,
            None => true,
        }
    }

    pub fn can_refresh(&self) -> bool {
        self.refresh_token.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Whether the token was granted every scope in `requested`.
    /// Tokens that never recorded their scopes are trusted.
    pub fn covers_scopes(&self, requested: &[String]) -> bool {
        self.scopes.is_empty() || requested.iter().all(|s| self.scopes.contains(s))
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    // "token.json" has an empty parent, not `None`.
    let parent = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.as_file_mut().write_all(bytes)?;
    tmp.as_file_mut().flush()?;
    tmp.as_file().sync_all()?;

    match tmp.persist(path) {
        Ok(_) => Ok(()),
        Err(err) if err.error.kind() == ErrorKind::AlreadyExists => {
            // Some filesystems refuse to rename over an existing file.
            let _ = fs::remove_file(path);
            err.file.persist(path).map(|_| ()).map_err(|e| e.error)
        }
        Err(err) => Err(err.error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn token(expiry: Option<DateTime<Utc>>) -> StoredToken {
        StoredToken {
            token: Some("ya29.access".to_string()),
            refresh_token: Some("1//refresh".to_string()),
            token_uri: GOOGLE_TOKEN_URI.to_string(),
            client_id: "client".to_string(),
            client_secret: "secret".to_string(),
            scopes: vec!["https://www.googleapis.com/auth/spreadsheets".to_string()],
            expiry,
        }
    }

    #[test]
    fn test_reads_authorized_user_file() {
        let json = r#"{
            "token": "ya29.a0Af",
            "refresh_token": "1//0g",
            "token_uri": "https://oauth2.googleapis.com/token",
            "client_id": "123.apps.googleusercontent.com",
            "client_secret": "GOCSPX-abc",
            "scopes": ["https://www.googleapis.com/auth/spreadsheets"],
            "universe_domain": "googleapis.com",
            "account": "",
            "expiry": "2024-05-01T12:30:00.123456Z"
        }"#;
        let token: StoredToken = serde_json::from_str(json).unwrap();
        assert_eq!(token.refresh_token.as_deref(), Some("1//0g"));
        assert_eq!(
            token.expiry.unwrap(),
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap() + Duration::microseconds(123456)
        );
    }

    #[test]
    fn test_freshness_respects_skew() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        assert!(token(Some(now + Duration::minutes(30))).is_fresh(now));
        assert!(!token(Some(now + Duration::seconds(30))).is_fresh(now));
        assert!(!token(Some(now - Duration::minutes(1))).is_fresh(now));
        assert!(token(None).is_fresh(now));

        let mut no_access = token(None);
        no_access.token = None;
        assert!(!no_access.is_fresh(now));
    }

    #[test]
    fn test_scope_coverage() {
        let t = token(None);
        assert!(t.covers_scopes(&["https://www.googleapis.com/auth/spreadsheets".to_string()]));
        assert!(!t.covers_scopes(&["https://www.googleapis.com/auth/drive".to_string()]));

        let mut unscoped = token(None);
        unscoped.scopes.clear();
        assert!(unscoped.covers_scopes(&["https://www.googleapis.com/auth/drive".to_string()]));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        assert_eq!(StoredToken::load(&path).unwrap(), None);

        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let original = token(Some(now));
        original.save(&path).unwrap();
        assert_eq!(StoredToken::load(&path).unwrap(), Some(original));
    }

    #[test]
    fn test_save_replaces_file_without_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("token.json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{ truncated").unwrap();

        let mut refreshed = token(None);
        refreshed.token = Some("ya29.refreshed".to_string());
        refreshed.save(&path).unwrap();

        assert_eq!(StoredToken::load(&path).unwrap(), Some(refreshed));
        let entries: Vec<_> = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("token.json")]);
    }

    #[test]
    fn test_save_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("token.json");
        token(None).save(&path).unwrap();
        assert!(StoredToken::load(&path).unwrap().is_some());
    }

    #[cfg(unix)]
    #[test]
    fn test_saved_token_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        token(None).save(&path).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_corrupt_file_is_an_auth_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        fs::write(&path, "{").unwrap();
        assert!(matches!(StoredToken::load(&path), Err(SyncError::Auth(_))));
    }
}
