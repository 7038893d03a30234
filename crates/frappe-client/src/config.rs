//! Configuration types and loading
//!
//! Precedence: env vars > config file > defaults. The base URL may also
//! come entirely from the environment (`FRAPPE_BASE_URL`) for deployments
//! that ship no config file.

use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Root configuration.
#[derive(Debug, Deserialize)]
pub struct Config {
    pub backend: BackendConfig,
}

/// Backend connection settings.
#[derive(Debug, Deserialize)]
pub struct BackendConfig {
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Bound on the token-provisioning round-trip, separate from the
    /// general request timeout.
    #[serde(default = "default_provision_timeout")]
    pub provision_timeout_secs: u64,
}

fn default_timeout() -> u64 {
    30
}

fn default_provision_timeout() -> u64 {
    frappe_session::DEFAULT_PROVISION_TIMEOUT.as_secs()
}

impl Config {
    /// Load configuration from a TOML file, then overlay environment
    /// variables. `FRAPPE_BASE_URL` takes precedence over the file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("reading {}: {e}", path.display())))?;
        let mut config: Config = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("parsing {}: {e}", path.display())))?;

        if let Ok(url) = std::env::var("FRAPPE_BASE_URL") {
            config.backend.base_url = url;
        }

        config.validate()?;
        Ok(config)
    }

    /// Build configuration from the environment alone. `FRAPPE_BASE_URL`
    /// is required; timeouts take their defaults.
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("FRAPPE_BASE_URL")
            .map_err(|_| Error::Config("FRAPPE_BASE_URL is not set".into()))?;
        let config = Config {
            backend: BackendConfig {
                base_url,
                timeout_secs: default_timeout(),
                provision_timeout_secs: default_provision_timeout(),
            },
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let backend = &self.backend;
        if !backend.base_url.starts_with("http://") && !backend.base_url.starts_with("https://") {
            return Err(Error::Config(format!(
                "base_url must start with http:// or https://, got: {}",
                backend.base_url
            )));
        }
        if backend.timeout_secs == 0 {
            return Err(Error::Config("timeout_secs must be greater than 0".into()));
        }
        if backend.provision_timeout_secs == 0 {
            return Err(Error::Config(
                "provision_timeout_secs must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Mutex to serialize tests that mutate environment variables,
    /// preventing data races when tests run in parallel.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// SAFETY: callers must hold ENV_MUTEX to prevent concurrent env mutation.
    unsafe fn set_env(key: &str, val: &str) {
        unsafe { std::env::set_var(key, val) };
    }

    unsafe fn remove_env(key: &str) {
        unsafe { std::env::remove_var(key) };
    }

    fn valid_toml() -> &'static str {
        r#"
[backend]
base_url = "http://erp.example.com:8000"
"#
    }

    fn write_config(contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn load_valid_config_applies_defaults() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { remove_env("FRAPPE_BASE_URL") };
        let (_dir, path) = write_config(valid_toml());

        let config = Config::load(&path).unwrap();
        assert_eq!(config.backend.base_url, "http://erp.example.com:8000");
        assert_eq!(config.backend.timeout_secs, 30);
        assert_eq!(config.backend.provision_timeout_secs, 10);
    }

    #[test]
    fn load_missing_file_errors() {
        let result = Config::load(Path::new("/nonexistent/path/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn load_invalid_toml_errors() {
        let (_dir, path) = write_config("not valid {{{{ toml");
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn env_var_overrides_file() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let (_dir, path) = write_config(valid_toml());

        unsafe { set_env("FRAPPE_BASE_URL", "https://other.example.com") };
        let config = Config::load(&path).unwrap();
        unsafe { remove_env("FRAPPE_BASE_URL") };

        assert_eq!(config.backend.base_url, "https://other.example.com");
    }

    #[test]
    fn from_env_requires_base_url() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { remove_env("FRAPPE_BASE_URL") };
        assert!(Config::from_env().is_err());

        unsafe { set_env("FRAPPE_BASE_URL", "http://erp.example.com:8000") };
        let config = Config::from_env().unwrap();
        unsafe { remove_env("FRAPPE_BASE_URL") };

        assert_eq!(config.backend.base_url, "http://erp.example.com:8000");
        assert_eq!(config.backend.timeout_secs, 30);
    }

    #[test]
    fn base_url_without_scheme_is_rejected() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { remove_env("FRAPPE_BASE_URL") };
        let (_dir, path) = write_config(
            r#"
[backend]
base_url = "erp.example.com:8000"
"#,
        );

        let result = Config::load(&path);
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(
            err.contains("base_url must start with http"),
            "error message should explain the issue, got: {err}"
        );
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { remove_env("FRAPPE_BASE_URL") };
        let (_dir, path) = write_config(
            r#"
[backend]
base_url = "http://erp.example.com:8000"
timeout_secs = 0
"#,
        );
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn zero_provision_timeout_is_rejected() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { remove_env("FRAPPE_BASE_URL") };
        let (_dir, path) = write_config(
            r#"
[backend]
base_url = "http://erp.example.com:8000"
provision_timeout_secs = 0
"#,
        );
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn custom_timeouts_are_honored() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { remove_env("FRAPPE_BASE_URL") };
        let (_dir, path) = write_config(
            r#"
[backend]
base_url = "http://erp.example.com:8000"
timeout_secs = 60
provision_timeout_secs = 5
"#,
        );

        let config = Config::load(&path).unwrap();
        assert_eq!(config.backend.timeout_secs, 60);
        assert_eq!(config.backend.provision_timeout_secs, 5);
    }
}
