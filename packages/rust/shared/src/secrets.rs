//! Name-indexed secret lookup.
//!
//! Components only ever ask "give me the value stored under this name";
//! where the value lives (environment, parameter store, test fixture)
//! is decided by whoever constructs the [`SecretSource`].

use std::collections::HashMap;

use crate::error::{DigestError, Result};

/// Resolves a secret value by name.
pub trait SecretSource: Send + Sync {
    fn get(&self, name: &str) -> Result<String>;
}

/// Reads secrets from environment variables named after the secret.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvSecrets;

impl SecretSource for EnvSecrets {
    fn get(&self, name: &str) -> Result<String> {
        match std::env::var(name) {
            Ok(val) if !val.is_empty() => Ok(val),
            _ => Err(DigestError::config(format!(
                "secret {name} not found. Set the {name} environment variable."
            ))),
        }
    }
}

/// Fixed in-memory secrets, mostly for tests and one-off runs.
#[derive(Debug, Default, Clone)]
pub struct StaticSecrets {
    values: HashMap<String, String>,
}

impl StaticSecrets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }
}

impl SecretSource for StaticSecrets {
    fn get(&self, name: &str) -> Result<String> {
        self.values
            .get(name)
            .cloned()
            .ok_or_else(|| DigestError::config(format!("secret {name} not found")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_secret_missing() {
        // Use a unique env var name to avoid interfering with other tests
        let result = EnvSecrets.get("AWSDIGEST_TEST_NONEXISTENT_SECRET_12345");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("not found"));
    }

    #[test]
    fn static_secrets_lookup() {
        let secrets = StaticSecrets::new().with("NOTION_API_KEY", "secret_abc");
        assert_eq!(secrets.get("NOTION_API_KEY").unwrap(), "secret_abc");
        assert!(secrets.get("OPENAI_API_KEY").is_err());
    }
}
