//! Environment configuration.
//!
//! All five values are required. Loading stops at the first variable that is
//! absent or empty and reports it by name; values themselves are never logged.

use std::fmt;

/// Firestore project the results are written to.
pub const FIRESTORE_PROJECT: &str = "FIRESTORE_PROJECT";
/// Base URI of the GitHub Enterprise API.
pub const GITHUB_API_BASE_URI: &str = "GITHUB_API_BASE_URI";
/// GitHub Enterprise slug.
pub const GITHUB_ENTERPRISE_NAME: &str = "GITHUB_ENTERPRISE_NAME";
/// Organisation login the queries run against.
pub const GITHUB_ORGANISATION_NAME: &str = "GITHUB_ORGANISATION_NAME";
/// Token sent as a bearer credential to the GraphQL API.
pub const GITHUB_TOKEN: &str = "GITHUB_TOKEN";

/// Errors raised while loading configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A required variable is unset or empty.
    #[error("Missing {0} environment variable")]
    Missing(&'static str),
}

/// Immutable agent configuration, built once at startup.
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    pub firestore_project: String,
    pub github_api_base_uri: String,
    pub github_enterprise_name: String,
    pub github_organisation_name: String,
    pub github_token: String,
}

impl Config {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration through `lookup`, checking variables in a fixed order.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |name: &'static str| {
            lookup(name)
                .filter(|value| !value.is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        Ok(Self {
            firestore_project: require(FIRESTORE_PROJECT)?,
            github_api_base_uri: require(GITHUB_API_BASE_URI)?,
            github_enterprise_name: require(GITHUB_ENTERPRISE_NAME)?,
            github_organisation_name: require(GITHUB_ORGANISATION_NAME)?,
            github_token: require(GITHUB_TOKEN)?,
        })
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("firestore_project", &self.firestore_project)
            .field("github_api_base_uri", &self.github_api_base_uri)
            .field("github_enterprise_name", &self.github_enterprise_name)
            .field("github_organisation_name", &self.github_organisation_name)
            .field("github_token", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const ALL: [&str; 5] = [
        FIRESTORE_PROJECT,
        GITHUB_API_BASE_URI,
        GITHUB_ENTERPRISE_NAME,
        GITHUB_ORGANISATION_NAME,
        GITHUB_TOKEN,
    ];

    fn full_env() -> HashMap<&'static str, String> {
        HashMap::from([
            (FIRESTORE_PROJECT, "explorer-project".to_string()),
            (GITHUB_API_BASE_URI, "https://ghe.example.com/api".to_string()),
            (GITHUB_ENTERPRISE_NAME, "example-enterprise".to_string()),
            (GITHUB_ORGANISATION_NAME, "example-org".to_string()),
            (GITHUB_TOKEN, "ghp_secret_value".to_string()),
        ])
    }

    fn load(env: &HashMap<&'static str, String>) -> Result<Config, ConfigError> {
        Config::from_lookup(|name| env.get(name).cloned())
    }

    #[test]
    fn loads_all_values() {
        let config = load(&full_env()).unwrap();

        assert_eq!(config.firestore_project, "explorer-project");
        assert_eq!(config.github_api_base_uri, "https://ghe.example.com/api");
        assert_eq!(config.github_enterprise_name, "example-enterprise");
        assert_eq!(config.github_organisation_name, "example-org");
        assert_eq!(config.github_token, "ghp_secret_value");
    }

    #[test]
    fn absent_variable_is_named() {
        for name in ALL {
            let mut env = full_env();
            env.remove(name);

            let err = load(&env).unwrap_err();
            assert_eq!(err, ConfigError::Missing(name));
            assert_eq!(err.to_string(), format!("Missing {name} environment variable"));
        }
    }

    #[test]
    fn empty_variable_counts_as_missing() {
        for name in ALL {
            let mut env = full_env();
            env.insert(name, String::new());

            assert_eq!(load(&env).unwrap_err(), ConfigError::Missing(name));
        }
    }

    #[test]
    fn first_missing_variable_wins() {
        let env = HashMap::new();
        assert_eq!(load(&env).unwrap_err(), ConfigError::Missing(FIRESTORE_PROJECT));
    }

    #[test]
    fn debug_output_redacts_token() {
        let config = load(&full_env()).unwrap();
        let rendered = format!("{config:?}");

        assert!(!rendered.contains("ghp_secret_value"));
        assert!(rendered.contains("<redacted>"));
    }
}
