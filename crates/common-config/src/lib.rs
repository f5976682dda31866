//! Shared configuration helpers for the setup services.

use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use thiserror::Error;

/// Error type for configuration loading failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Read and parse an environment variable.
///
/// Returns `None` when the variable is unset. Values that fail to parse are
/// logged and treated as unset.
pub fn env_override<T>(var: &str) -> Option<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let value = env::var(var).ok()?;
    value
        .parse::<T>()
        .inspect_err(|error| {
            tracing::warn!(%var, %value, %error, "invalid environment override, ignoring");
        })
        .ok()
}

/// Configuration loaded from an optional TOML file and prefixed environment variables.
pub trait ServiceConfig: DeserializeOwned + Default {
    /// Prefix shared by every environment override, e.g. `SETUP_SVC_`.
    const PREFIX: &'static str;

    /// Environment variable naming the TOML file to load.
    fn file_var() -> String {
        format!("{}CONFIG", Self::PREFIX)
    }

    /// Apply `PREFIX`-scoped environment overrides on top of the loaded values.
    fn apply_environment_overrides(&mut self, prefix: &str);

    /// Parse configuration from a TOML file on disk.
    fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Load the file named by [`ServiceConfig::file_var`] when it is set, fall
    /// back to defaults otherwise, then apply environment overrides.
    fn load() -> Result<Self, ConfigError> {
        let mut config = match env::var(Self::file_var()) {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };
        config.apply_environment_overrides(Self::PREFIX);
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    struct DemoConfig {
        port: u16,
        name: String,
    }

    impl ServiceConfig for DemoConfig {
        const PREFIX: &'static str = "COMMON_CONFIG_DEMO_";

        fn apply_environment_overrides(&mut self, prefix: &str) {
            if let Some(port) = env_override(&format!("{prefix}PORT")) {
                self.port = port;
            }
        }
    }

    #[test]
    fn unparsable_value_is_ignored() {
        env::set_var("COMMON_CONFIG_TEST_BAD_PORT", "not-a-port");
        assert_eq!(env_override::<u16>("COMMON_CONFIG_TEST_BAD_PORT"), None);
        env::remove_var("COMMON_CONFIG_TEST_BAD_PORT");
    }

    #[test]
    fn missing_variable_is_none() {
        assert_eq!(env_override::<u16>("COMMON_CONFIG_TEST_UNSET"), None);
    }

    #[test]
    fn file_values_are_overridden_by_environment() {
        let path = env::temp_dir().join(format!("common-config-{}.toml", std::process::id()));
        fs::write(&path, "port = 9000\nname = \"demo\"\n").expect("write config");

        env::set_var("COMMON_CONFIG_DEMO_CONFIG", &path);
        env::set_var("COMMON_CONFIG_DEMO_PORT", "9100");
        let config = DemoConfig::load().expect("load config");
        env::remove_var("COMMON_CONFIG_DEMO_CONFIG");
        env::remove_var("COMMON_CONFIG_DEMO_PORT");
        let _ = fs::remove_file(&path);

        assert_eq!(config.name, "demo");
        assert_eq!(config.port, 9100);
    }

    #[test]
    fn unreadable_file_is_reported() {
        let result = DemoConfig::from_file("/nonexistent/common-config.toml");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
