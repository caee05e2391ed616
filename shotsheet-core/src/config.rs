//! Configuration loaded from `shotsheet.toml`

use crate::auth::SPREADSHEETS_SCOPE;
use crate::error::{Result, SyncError};
use crate::layout::ColumnLayouts;
use crate::service::google::DEFAULT_BASE_URL;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "shotsheet.toml";
pub const DEFAULT_TOKEN_FILE: &str = "token.json";
pub const DEFAULT_CLIENT_SECRET_FILE: &str = "credentials.json";

/// Environment variable holding a comma-separated scope list
pub const SCOPES_ENV: &str = "GOOGLE_SCOPES";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub auth: AuthConfig,
    pub api: ApiConfig,
    pub layouts: ColumnLayouts,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    /// Token file; defaults to `token.json` beside the program
    pub token_file: Option<PathBuf>,
    /// OAuth client secret; defaults to `credentials.json` beside the program
    pub client_secret_file: Option<PathBuf>,
    /// Scopes to request; empty means `GOOGLE_SCOPES` or the spreadsheets scope
    pub scopes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_seconds: 30,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| SyncError::io(format!("failed to read {}", path.display()), e))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| SyncError::Config(e.to_string()))
    }

    /// Check values serde cannot
    pub fn validate(&self) -> Result<()> {
        if self.api.timeout_seconds == 0 {
            return Err(SyncError::Config(
                "api.timeout_seconds must be greater than zero".to_string(),
            ));
        }
        if self.auth.scopes.iter().any(|s| s.trim().is_empty()) {
            return Err(SyncError::Config("auth.scopes contains an empty scope".to_string()));
        }
        self.layouts.validate()
    }

    /// Scopes to request: config first, then the environment value, then the default
    pub fn resolve_scopes(&self, env_value: Option<&str>) -> Vec<String> {
        if !self.auth.scopes.is_empty() {
            return self.auth.scopes.clone();
        }
        let from_env = env_value.map(parse_scope_list).unwrap_or_default();
        if !from_env.is_empty() {
            return from_env;
        }
        vec![SPREADSHEETS_SCOPE.to_string()]
    }

    pub fn token_path(&self, program_dir: &Path) -> PathBuf {
        self.auth
            .token_file
            .clone()
            .unwrap_or_else(|| program_dir.join(DEFAULT_TOKEN_FILE))
    }

    pub fn client_secret_path(&self, program_dir: &Path) -> PathBuf {
        self.auth
            .client_secret_file
            .clone()
            .unwrap_or_else(|| program_dir.join(DEFAULT_CLIENT_SECRET_FILE))
    }
}

/// Split "a,b , c" into scopes, dropping empty entries
pub fn parse_scope_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.api.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_parse_full_config() {
        let config = AppConfig::from_toml(
            r#"
            [auth]
            token_file = "/var/lib/shotsheet/token.json"
            scopes = ["https://www.googleapis.com/auth/spreadsheets"]

            [api]
            timeout_seconds = 10

            [layouts.general]
            shot = 2
            "#,
        )
        .unwrap();

        assert_eq!(
            config.token_path(Path::new("/opt/shotsheet")),
            PathBuf::from("/var/lib/shotsheet/token.json")
        );
        assert_eq!(
            config.client_secret_path(Path::new("/opt/shotsheet")),
            PathBuf::from("/opt/shotsheet/credentials.json")
        );
        assert_eq!(config.api.timeout_seconds, 10);
        assert_eq!(config.layouts.general.shot, 2);
        assert_eq!(config.layouts.general.assignee, 3);
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(matches!(
            AppConfig::from_toml("[api]\nretries = 3\n"),
            Err(SyncError::Config(_))
        ));
    }

    #[test]
    fn test_validation() {
        let mut config = AppConfig::default();
        config.api.timeout_seconds = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.auth.scopes = vec![" ".to_string()];
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.layouts.render.render.status = 12;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_scope_resolution() {
        let config = AppConfig::default();
        assert_eq!(config.resolve_scopes(None), vec![SPREADSHEETS_SCOPE]);
        assert_eq!(config.resolve_scopes(Some(" , ")), vec![SPREADSHEETS_SCOPE]);
        assert_eq!(
            config.resolve_scopes(Some("a, b,,c")),
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );

        let mut config = AppConfig::default();
        config.auth.scopes = vec!["x".to_string()];
        assert_eq!(config.resolve_scopes(Some("a,b")), vec!["x"]);
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        fs::write(&path, "[layouts.animation]\nblocking = 20\npolish = 21\n").unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.layouts.animation.blocking, 20);
        assert!(AppConfig::from_file(dir.path().join("missing.toml")).is_err());
    }
}
