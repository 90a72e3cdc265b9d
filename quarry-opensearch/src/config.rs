//! OpenSearch client configuration.

use crate::error::{OpenSearchError, Result};
use std::env;
use std::time::Duration;

/// OpenSearch client configuration.
#[derive(Debug, Clone)]
pub struct OpenSearchConfig {
    /// OpenSearch URL(s). Only the first one is connected to.
    pub urls: Vec<String>,
    /// Basic auth username.
    pub username: Option<String>,
    /// Basic auth password.
    pub password: Option<String>,
    /// Request timeout.
    pub request_timeout: Duration,
    /// Ask the server to prefix aggregation names with their type.
    pub typed_keys: bool,
}

impl OpenSearchConfig {
    /// Create a new configuration with a single URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            urls: vec![url.into()],
            username: None,
            password: None,
            request_timeout: Duration::from_secs(30),
            typed_keys: true,
        }
    }

    /// Create configuration with multiple URLs for a cluster.
    pub fn cluster(urls: Vec<String>) -> Self {
        Self {
            urls,
            ..Self::new("")
        }
    }

    /// Load configuration from the environment.
    ///
    /// Reads `QUARRY_OPENSEARCH_URL` (comma separated, default
    /// `http://localhost:9200`), `QUARRY_OPENSEARCH_USERNAME`,
    /// `QUARRY_OPENSEARCH_PASSWORD`, `QUARRY_OPENSEARCH_TIMEOUT_SECS` and
    /// `QUARRY_OPENSEARCH_TYPED_KEYS`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let urls = lookup("QUARRY_OPENSEARCH_URL")
            .unwrap_or_else(|| "http://localhost:9200".to_string())
            .split(',')
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(str::to_string)
            .collect();
        let mut config = Self::cluster(urls);

        if let (Some(user), Some(pass)) = (
            lookup("QUARRY_OPENSEARCH_USERNAME"),
            lookup("QUARRY_OPENSEARCH_PASSWORD"),
        ) {
            config = config.with_basic_auth(user, pass);
        }

        if let Some(secs) = lookup("QUARRY_OPENSEARCH_TIMEOUT_SECS") {
            let secs = secs.trim().parse::<u64>().map_err(|e| {
                OpenSearchError::Validation(format!("Invalid QUARRY_OPENSEARCH_TIMEOUT_SECS: {}", e))
            })?;
            config = config.with_request_timeout(Duration::from_secs(secs));
        }

        if let Some(flag) = lookup("QUARRY_OPENSEARCH_TYPED_KEYS") {
            let typed_keys = match flag.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                other => {
                    return Err(OpenSearchError::Validation(format!(
                        "Invalid QUARRY_OPENSEARCH_TYPED_KEYS: {}",
                        other
                    )));
                }
            };
            config = config.with_typed_keys(typed_keys);
        }

        Ok(config)
    }

    /// Set basic authentication credentials.
    pub fn with_basic_auth(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Set request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Enable or disable `typed_keys` on search requests.
    pub fn with_typed_keys(mut self, enabled: bool) -> Self {
        self.typed_keys = enabled;
        self
    }
}

impl Default for OpenSearchConfig {
    fn default() -> Self {
        Self::new("http://localhost:9200")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = OpenSearchConfig::default();
        assert_eq!(config.urls, vec!["http://localhost:9200"]);
        assert!(config.typed_keys);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_from_lookup() {
        let config = OpenSearchConfig::from_lookup(lookup(&[
            ("QUARRY_OPENSEARCH_URL", "http://a:9200, http://b:9200"),
            ("QUARRY_OPENSEARCH_USERNAME", "admin"),
            ("QUARRY_OPENSEARCH_PASSWORD", "secret"),
            ("QUARRY_OPENSEARCH_TIMEOUT_SECS", "5"),
            ("QUARRY_OPENSEARCH_TYPED_KEYS", "off"),
        ]))
        .unwrap();
        assert_eq!(config.urls, vec!["http://a:9200", "http://b:9200"]);
        assert_eq!(config.username.as_deref(), Some("admin"));
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert!(!config.typed_keys);
    }

    #[test]
    fn test_from_lookup_rejects_bad_values() {
        assert!(OpenSearchConfig::from_lookup(lookup(&[("QUARRY_OPENSEARCH_TIMEOUT_SECS", "soon")])).is_err());
        assert!(OpenSearchConfig::from_lookup(lookup(&[("QUARRY_OPENSEARCH_TYPED_KEYS", "maybe")])).is_err());
    }

    #[test]
    fn test_username_without_password_is_ignored() {
        let config =
            OpenSearchConfig::from_lookup(lookup(&[("QUARRY_OPENSEARCH_USERNAME", "admin")])).unwrap();
        assert!(config.username.is_none());
    }
}
