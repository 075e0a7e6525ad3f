//! Sources of remote credentials.
//!
//! The repository asks its [`CredentialSource`] for the current remote
//! configuration at the start of every operation, so fixing or breaking the
//! credentials mid-session takes effect on the next call.

use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use tracing::warn;

use crate::config::{Config, RemoteConfig};

/// Supplies the remote configuration in effect right now.
pub trait CredentialSource: Send + Sync + fmt::Debug {
    /// The current remote configuration. Unusable credentials are reported
    /// through [`RemoteConfig::is_configured`], not as an error.
    fn remote_config(&self) -> RemoteConfig;
}

impl CredentialSource for RemoteConfig {
    fn remote_config(&self) -> RemoteConfig {
        self.clone()
    }
}

/// Credentials held in process and replaceable at runtime.
///
/// Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct SharedCredentials {
    inner: Arc<RwLock<RemoteConfig>>,
}

impl SharedCredentials {
    /// Create a slot holding the given configuration.
    #[must_use]
    pub fn new(remote: RemoteConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(remote)),
        }
    }

    /// Replace the held configuration.
    pub fn replace(&self, remote: RemoteConfig) {
        let mut guard = self
            .inner
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *guard = remote;
    }

    /// Drop the held credentials, falling back to the local backend.
    pub fn clear(&self) {
        self.replace(RemoteConfig::default());
    }
}

impl CredentialSource for SharedCredentials {
    fn remote_config(&self) -> RemoteConfig {
        self.inner
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

/// Credentials re-read from the configuration file and environment on
/// every call.
#[derive(Debug, Clone, Default)]
pub struct ReloadingCredentials {
    config_path: Option<PathBuf>,
}

impl ReloadingCredentials {
    /// Reload from the given config file (or the default location).
    #[must_use]
    pub fn new(config_path: Option<PathBuf>) -> Self {
        Self { config_path }
    }
}

impl CredentialSource for ReloadingCredentials {
    fn remote_config(&self) -> RemoteConfig {
        match Config::load_from(self.config_path.clone()) {
            Ok(config) => config.remote,
            Err(e) => {
                warn!("Failed to reload configuration, using local backend: {e}");
                RemoteConfig::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_static_source_returns_clone() {
        let remote = RemoteConfig::with_credentials("fleet-prod", "AIzaSyD-key");
        assert_eq!(remote.remote_config(), remote);
    }

    #[test]
    fn test_shared_credentials_replace_and_clear() {
        let shared = SharedCredentials::default();
        assert!(!shared.remote_config().is_configured());

        let handle = shared.clone();
        handle.replace(RemoteConfig::with_credentials("fleet-prod", "AIzaSyD-key"));
        assert!(shared.remote_config().is_configured());

        handle.clear();
        assert!(!shared.remote_config().is_configured());
    }

    #[test]
    fn test_reloading_credentials_reads_file() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            jail.create_file("config.toml", "[remote]\nproject_id = \"fleet-prod\"\n")?;

            let source = ReloadingCredentials::new(Some(PathBuf::from("config.toml")));
            assert_eq!(source.remote_config().project_id, "fleet-prod");

            jail.create_file("config.toml", "[remote]\nproject_id = \"fleet-staging\"\n")?;
            assert_eq!(source.remote_config().project_id, "fleet-staging");
            Ok(())
        });
    }

    #[test]
    fn test_reloading_credentials_picks_up_env_changes() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            let source = ReloadingCredentials::new(Some(PathBuf::from("missing.toml")));
            assert!(!source.remote_config().is_configured());

            jail.set_env("FIREBASE_PROJECT_ID", "fleet-prod");
            jail.set_env("FIREBASE_API_KEY", "AIzaSyD-key");
            assert!(source.remote_config().is_configured());
            Ok(())
        });
    }

    #[test]
    fn test_reloading_credentials_invalid_file_is_unconfigured() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            jail.set_env("FIREBASE_PROJECT_ID", "fleet-prod");
            jail.set_env("FIREBASE_API_KEY", "AIzaSyD-key");
            jail.create_file("config.toml", "[remote]\npage_size = 0\n")?;

            let source = ReloadingCredentials::new(Some(PathBuf::from("config.toml")));
            assert!(!source.remote_config().is_configured());
            Ok(())
        });
    }
}
