//! Configuration management for checkfleet.
//!
//! Configuration is assembled with figment from compiled defaults, an optional
//! TOML file, the `FIREBASE_*` variables a mobile build already carries, and
//! `CHECKFLEET_` prefixed overrides.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "checkfleet";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "checkfleet.db";

/// Key under which the local backend stores the whole checklist array.
pub const DEFAULT_NAMESPACE_KEY: &str = "@checklistfleet:checklists";

/// Remote collection holding one document per checklist.
pub const DEFAULT_COLLECTION: &str = "checklists";

/// Default Firestore REST endpoint.
pub const DEFAULT_REMOTE_BASE_URL: &str = "https://firestore.googleapis.com";

/// Marker that identifies an unfilled template value such as `<your-api-key>`.
pub const PLACEHOLDER_MARKER: char = '<';

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables prefixed with `CHECKFLEET_` (nested with `__`)
/// 2. `FIREBASE_*` environment variables, mapped onto `remote`
/// 3. TOML config file at `~/.config/checkfleet/config.toml`
/// 4. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Local backend configuration.
    pub storage: StorageConfig,
    /// Remote backend credentials and connection parameters.
    pub remote: RemoteConfig,
    /// Image normalization configuration.
    pub images: ImageConfig,
}

/// Local backend configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/checkfleet/checkfleet.db`
    pub database_path: Option<PathBuf>,
    /// Key holding the serialized checklist array.
    pub namespace_key: String,
}

/// Remote backend configuration.
///
/// Only `project_id` and `api_key` decide whether the remote backend is used;
/// the remaining identifiers are carried so one `.env` serves every client.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Cloud project identifier.
    #[serde(deserialize_with = "lenient_string")]
    pub project_id: String,
    /// Web API key.
    #[serde(deserialize_with = "lenient_string")]
    pub api_key: String,
    /// Authentication domain.
    #[serde(deserialize_with = "lenient_string")]
    pub auth_domain: String,
    /// Storage bucket name.
    #[serde(deserialize_with = "lenient_string")]
    pub storage_bucket: String,
    /// Messaging sender id.
    #[serde(deserialize_with = "lenient_string")]
    pub messaging_sender_id: String,
    /// Application id.
    #[serde(deserialize_with = "lenient_string")]
    pub app_id: String,
    /// Analytics measurement id.
    #[serde(deserialize_with = "lenient_string")]
    pub measurement_id: String,
    /// Base URL of the document store REST API.
    pub base_url: String,
    /// Collection holding the checklist documents.
    pub collection: String,
    /// Documents requested per page when listing the collection.
    pub page_size: u32,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

/// Host platform, which decides how image references are fetched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// References are local file paths or `file://` URIs.
    #[default]
    Native,
    /// References are URLs fetched over HTTP.
    Web,
}

/// Image normalization configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Which byte fetcher resolves non-embedded references.
    pub platform: Platform,
    /// Timeout for a single network fetch, in seconds.
    pub fetch_timeout_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: None, // Will be resolved to default at runtime
            namespace_key: DEFAULT_NAMESPACE_KEY.to_string(),
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            api_key: String::new(),
            auth_domain: String::new(),
            storage_bucket: String::new(),
            messaging_sender_id: String::new(),
            app_id: String::new(),
            measurement_id: String::new(),
            base_url: DEFAULT_REMOTE_BASE_URL.to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
            page_size: 300,
            timeout_secs: 30,
        }
    }
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            platform: Platform::Native,
            fetch_timeout_secs: 20,
        }
    }
}

impl fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let api_key = if self.api_key.is_empty() {
            ""
        } else {
            "<redacted>"
        };
        f.debug_struct("RemoteConfig")
            .field("project_id", &self.project_id)
            .field("api_key", &api_key)
            .field("auth_domain", &self.auth_domain)
            .field("storage_bucket", &self.storage_bucket)
            .field("base_url", &self.base_url)
            .field("collection", &self.collection)
            .field("page_size", &self.page_size)
            .field("timeout_secs", &self.timeout_secs)
            .finish_non_exhaustive()
    }
}

impl RemoteConfig {
    /// Create a remote configuration with the given credentials and defaults
    /// for everything else.
    #[must_use]
    pub fn with_credentials(project_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Whether credentials are present and well-formed.
    ///
    /// Both the project id and the API key must be non-empty and must not
    /// contain the placeholder marker.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        credential_ok(&self.project_id) && credential_ok(&self.api_key)
    }

    /// Get the request timeout as a Duration.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn credential_ok(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && !value.contains(PLACEHOLDER_MARKER)
}

/// Accept numbers and booleans where a string is expected.
///
/// Environment values such as a numeric sender id are parsed as numbers by
/// the env provider.
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Unsigned(u64),
        Signed(i64),
        Float(f64),
        Flag(bool),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Unsigned(n) => n.to_string(),
        Raw::Signed(n) => n.to_string(),
        Raw::Float(n) => n.to_string(),
        Raw::Flag(b) => b.to_string(),
    })
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("FIREBASE_").map(|key| format!("remote.{key}").into()))
            .merge(Env::prefixed("CHECKFLEET_").split("__"));

        Self::from_figment(&figment)
    }

    /// Extract and validate configuration from an assembled figment.
    ///
    /// # Errors
    ///
    /// Returns an error if extraction or validation fails.
    pub fn from_figment(figment: &Figment) -> Result<Self> {
        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.storage.namespace_key.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "storage.namespace_key must not be empty".to_string(),
            });
        }

        if self.remote.collection.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "remote.collection must not be empty".to_string(),
            });
        }

        if self.remote.page_size == 0 {
            return Err(Error::ConfigValidation {
                message: "remote.page_size must be greater than 0".to_string(),
            });
        }

        if self.remote.timeout_secs == 0 || self.images.fetch_timeout_secs == 0 {
            return Err(Error::ConfigValidation {
                message: "timeouts must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the image fetch timeout as a Duration.
    #[must_use]
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.images.fetch_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    fn figment_with(toml: &str) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::string(toml))
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.storage.database_path.is_none());
        assert_eq!(config.storage.namespace_key, DEFAULT_NAMESPACE_KEY);
        assert_eq!(config.remote.collection, "checklists");
        assert_eq!(config.images.platform, Platform::Native);
        assert!(!config.remote.is_configured());
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_empty_namespace() {
        let mut config = Config::default();
        config.storage.namespace_key = "  ".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("namespace_key"));
    }

    #[test]
    fn test_validate_zero_page_size() {
        let mut config = Config::default();
        config.remote.page_size = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("page_size"));
    }

    #[test]
    fn test_validate_zero_timeout() {
        let mut config = Config::default();
        config.images.fetch_timeout_secs = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_is_configured_requires_both_credentials() {
        assert!(RemoteConfig::with_credentials("fleet-prod", "AIzaSyD-key").is_configured());
        assert!(!RemoteConfig::with_credentials("", "AIzaSyD-key").is_configured());
        assert!(!RemoteConfig::with_credentials("fleet-prod", "").is_configured());
        assert!(!RemoteConfig::with_credentials("   ", "AIzaSyD-key").is_configured());
    }

    #[test]
    fn test_is_configured_rejects_placeholders() {
        assert!(!RemoteConfig::with_credentials("<project-id>", "AIzaSyD-key").is_configured());
        assert!(!RemoteConfig::with_credentials("fleet-prod", "<your-api-key>").is_configured());
    }

    #[test]
    fn test_remote_debug_redacts_api_key() {
        let remote = RemoteConfig::with_credentials("fleet-prod", "AIzaSyD-secret");
        let debug_str = format!("{remote:?}");
        assert!(debug_str.contains("fleet-prod"));
        assert!(!debug_str.contains("AIzaSyD-secret"));
        assert!(debug_str.contains("redacted"));
    }

    #[test]
    fn test_from_figment_reads_toml_sections() {
        let figment = figment_with(
            r#"
            [storage]
            namespace_key = "@custom:checklists"

            [remote]
            project_id = "fleet-prod"
            api_key = "AIzaSyD-key"
            page_size = 50

            [images]
            platform = "web"
            "#,
        );
        let config = Config::from_figment(&figment).unwrap();

        assert_eq!(config.storage.namespace_key, "@custom:checklists");
        assert_eq!(config.remote.page_size, 50);
        assert_eq!(config.remote.collection, "checklists");
        assert_eq!(config.images.platform, Platform::Web);
        assert!(config.remote.is_configured());
    }

    #[test]
    fn test_numeric_identifiers_are_strings() {
        let figment = figment_with(
            r"
            [remote]
            messaging_sender_id = 123456789
            ",
        );
        let config = Config::from_figment(&figment).unwrap();
        assert_eq!(config.remote.messaging_sender_id, "123456789");
    }

    #[test]
    fn test_from_figment_rejects_invalid_values() {
        let figment = figment_with(
            r#"
            [remote]
            collection = ""
            "#,
        );
        assert!(Config::from_figment(&figment).is_err());
    }

    #[test]
    fn test_load_nonexistent_config() {
        Jail::expect_with(|jail| {
            jail.clear_env();

            let config = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml")))
                .map_err(|e| e.to_string())?;
            assert!(!config.remote.is_configured());
            assert_eq!(config.remote.collection, DEFAULT_COLLECTION);
            Ok(())
        });
    }

    #[test]
    fn test_load_firebase_env_credentials() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            jail.create_file("config.toml", "[remote]\npage_size = 50\n")?;
            jail.set_env("FIREBASE_PROJECT_ID", "fleet-prod");
            jail.set_env("FIREBASE_API_KEY", "AIzaSyD-key");
            jail.set_env("FIREBASE_MESSAGING_SENDER_ID", "123456789");
            jail.set_env("CHECKFLEET_REMOTE__COLLECTION", "other");

            let config = Config::load_from(Some(PathBuf::from("config.toml")))
                .map_err(|e| e.to_string())?;

            assert!(config.remote.is_configured());
            assert_eq!(config.remote.project_id, "fleet-prod");
            assert_eq!(config.remote.api_key, "AIzaSyD-key");
            assert_eq!(config.remote.messaging_sender_id, "123456789");
            assert_eq!(config.remote.collection, "other");
            assert_eq!(config.remote.page_size, 50);
            Ok(())
        });
    }

    #[test]
    fn test_checkfleet_env_overrides_firebase_env() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            jail.set_env("FIREBASE_PROJECT_ID", "fleet-prod");
            jail.set_env("CHECKFLEET_REMOTE__PROJECT_ID", "fleet-staging");

            let config = Config::load_from(Some(PathBuf::from("missing.toml")))
                .map_err(|e| e.to_string())?;

            assert_eq!(config.remote.project_id, "fleet-staging");
            assert!(!config.remote.is_configured());
            Ok(())
        });
    }

    #[test]
    fn test_database_path_default() {
        let config = Config::default();
        assert!(config
            .database_path()
            .to_string_lossy()
            .contains("checkfleet.db"));
    }

    #[test]
    fn test_database_path_custom() {
        let mut config = Config::default();
        config.storage.database_path = Some(PathBuf::from("/custom/path/db.sqlite"));

        assert_eq!(
            config.database_path(),
            PathBuf::from("/custom/path/db.sqlite")
        );
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("checkfleet"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_timeouts() {
        let config = Config::default();
        assert_eq!(config.fetch_timeout(), Duration::from_secs(20));
        assert_eq!(config.remote.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_platform_serialization() {
        assert_eq!(serde_json::to_string(&Platform::Web).unwrap(), "\"web\"");
        let platform: Platform = serde_json::from_str("\"native\"").unwrap();
        assert_eq!(platform, Platform::Native);
    }
}
