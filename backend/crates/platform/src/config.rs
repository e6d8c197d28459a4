//! Runtime Configuration
//!
//! Deployment environment and which optional services are configured.
//! Values are read through a lookup function so tests never touch the
//! process environment.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Read a variable from the process environment, treating empty as unset
pub fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Deployment environment (`APP_ENV`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Production,
    Test,
}

impl Environment {
    pub const KEY: &'static str = "APP_ENV";

    /// `APP_ENV` via `lookup`, defaulting to development
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        match lookup(Self::KEY) {
            Some(value) => value.parse(),
            None => Ok(Self::default()),
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_var)
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    /// Whether internal error messages and stacks reach clients
    pub fn discloses_errors(&self) -> bool {
        !self.is_production()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
            Environment::Test => "test",
        }
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            "test" => Ok(Environment::Test),
            _ => Err(ConfigError::Invalid {
                key: Self::KEY,
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional services and whether their credentials are present
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct ServiceFlags {
    pub database: bool,
    pub ai: bool,
    pub auth: bool,
    pub ledger: bool,
    pub blob: bool,
}

impl ServiceFlags {
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let has = |key: &str| lookup(key).is_some();
        Self {
            database: has("DATABASE_URL"),
            ai: has("GOOGLE_GENAI_API_KEY"),
            auth: has("SESSION_SECRET"),
            ledger: has("HEDERA_ACCOUNT_ID") && has("HEDERA_PRIVATE_KEY") && has("HEDERA_TOPIC_ID"),
            blob: has("BLOB_READ_WRITE_TOKEN"),
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(env_var)
    }

    /// Names of services whose flag is off
    pub fn missing(&self) -> Vec<&'static str> {
        [
            ("database", self.database),
            ("ai", self.ai),
            ("auth", self.auth),
            ("ledger", self.ledger),
            ("blob", self.blob),
        ]
        .into_iter()
        .filter_map(|(name, on)| (!on).then_some(name))
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_environment_defaults_to_development() {
        let env = Environment::from_lookup(lookup(&[])).unwrap();
        assert_eq!(env, Environment::Development);
        assert!(env.discloses_errors());
    }

    #[test]
    fn test_environment_parse() {
        let env = Environment::from_lookup(lookup(&[("APP_ENV", "Production")])).unwrap();
        assert!(env.is_production());
        assert!(!env.discloses_errors());

        let err = Environment::from_lookup(lookup(&[("APP_ENV", "staging")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "APP_ENV", .. }));
    }

    #[test]
    fn test_service_flags() {
        let flags = ServiceFlags::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/aether"),
            ("GOOGLE_GENAI_API_KEY", "key"),
            ("HEDERA_ACCOUNT_ID", "0.0.1"),
            ("HEDERA_PRIVATE_KEY", "pk"),
        ]));
        assert!(flags.database);
        assert!(flags.ai);
        // Topic id missing
        assert!(!flags.ledger);
        assert_eq!(flags.missing(), vec!["auth", "ledger", "blob"]);
    }
}
