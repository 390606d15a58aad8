//! Configuration management for the CRM client

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name of the persisted bearer token
pub const TOKEN_FILE_NAME: &str = "sdr-token";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// REST API configuration
    #[serde(default)]
    pub api: ApiConfig,

    /// Authentication configuration
    #[serde(default)]
    pub auth: AuthConfig,

    /// Display configuration
    #[serde(default)]
    pub display: DisplayConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// REST API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Scheme, host and port of the backend
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Common path prefix of every endpoint
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Optional request timeout in seconds; unset means no client-side bound
    #[serde(default)]
    pub request_timeout: Option<u64>,
}

/// Authentication configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Where the bearer token is persisted; defaults to the user config dir
    #[serde(default)]
    pub token_file: Option<PathBuf>,
}

/// Display configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Rows per page for list pages and paginated widgets
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (json or pretty)
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_prefix() -> String {
    "/api".to_string()
}

const fn default_page_size() -> usize {
    10
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            prefix: default_prefix(),
            request_timeout: None,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl ApiConfig {
    /// Base URL joined with the prefix, without a trailing slash
    #[must_use]
    pub fn root(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        let prefix = self.prefix.trim_matches('/');
        if prefix.is_empty() {
            base.to_string()
        } else {
            format!("{base}/{prefix}")
        }
    }
}

impl AuthConfig {
    /// Resolved token file path
    #[must_use]
    pub fn token_path(&self) -> PathBuf {
        self.token_file.clone().unwrap_or_else(|| {
            directories::ProjectDirs::from("", "", "sdrcrm").map_or_else(
                || PathBuf::from(TOKEN_FILE_NAME),
                |dirs| dirs.config_dir().join(TOKEN_FILE_NAME),
            )
        })
    }
}

impl Config {
    /// Load configuration from `sdrcrm.toml` and `SDRCRM__*` environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded or parsed.
    pub fn load() -> crate::Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration, reading `path` instead of the default file when given
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or any source fails to parse.
    pub fn load_from(path: Option<&Path>) -> crate::Result<Self> {
        let file = path.map_or_else(
            || config::File::with_name("sdrcrm").required(false),
            |p| config::File::from(p).required(true),
        );

        let config = config::Config::builder()
            .add_source(file)
            .add_source(config::Environment::with_prefix("SDRCRM").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_config_default() {
        let config = Config::default();

        assert_eq!(config.api.base_url, "http://localhost:8000");
        assert_eq!(config.api.prefix, "/api");
        assert!(config.api.request_timeout.is_none());
        assert!(config.auth.token_file.is_none());
        assert_eq!(config.display.page_size, 10);
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_api_root_joins_prefix() {
        let mut api = ApiConfig::default();
        assert_eq!(api.root(), "http://localhost:8000/api");

        api.base_url = "https://crm.example.com/".to_string();
        api.prefix = "api/".to_string();
        assert_eq!(api.root(), "https://crm.example.com/api");

        api.prefix = String::new();
        assert_eq!(api.root(), "https://crm.example.com");
    }

    #[test]
    fn test_token_path_override() {
        let auth = AuthConfig {
            token_file: Some(PathBuf::from("/tmp/token")),
        };
        assert_eq!(auth.token_path(), PathBuf::from("/tmp/token"));
    }

    #[test]
    fn test_default_token_path_uses_token_name() {
        let path = AuthConfig::default().token_path();
        assert!(path.ends_with(TOKEN_FILE_NAME));
    }

    #[test]
    fn test_partial_config_deserialization() {
        let json_str = r#"{"api": {"base_url": "http://crm:9000"}, "display": {}}"#;
        let config: Config = serde_json::from_str(json_str).unwrap();

        assert_eq!(config.api.base_url, "http://crm:9000");
        assert_eq!(config.api.prefix, "/api");
        assert_eq!(config.display.page_size, 10);
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[api]\nbase_url = \"http://10.0.0.5:8000\"\nrequest_timeout = 15\n\n[display]\npage_size = 25"
        )
        .unwrap();

        let config = Config::load_from(Some(file.path())).unwrap();

        assert_eq!(config.api.base_url, "http://10.0.0.5:8000");
        assert_eq!(config.api.request_timeout, Some(15));
        assert_eq!(config.display.page_size, 25);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_load_from_missing_file_fails() {
        let result = Config::load_from(Some(Path::new("/nonexistent/sdrcrm.toml")));
        assert!(matches!(result, Err(crate::Error::Configuration { .. })));
    }
}
