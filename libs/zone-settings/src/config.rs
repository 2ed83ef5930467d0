//! Client configuration.
//!
//! Layered with figment: built-in defaults, then an optional YAML file, then
//! `ZONE_SETTINGS_*` environment variables (`__` separates nested keys, e.g.
//! `ZONE_SETTINGS_TRANSPORT__REQUEST_TIMEOUT_MS`).

use std::collections::BTreeMap;
use std::path::Path;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::client::parse_base_url;
use crate::scope::ResourceScope;

/// Prefix of environment variables read by [`ClientConfig::load`].
pub const ENV_PREFIX: &str = "ZONE_SETTINGS_";

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[source] Box<figment::Error>),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        ConfigError::Load(Box::new(err))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    pub base_url: String,
    pub crn: String,
    pub zone_identifier: String,
    /// Headers sent with every request.
    pub headers: BTreeMap<String, String>,
    pub transport: TransportSettings,
}

/// Settings consumed by the HTTP transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransportSettings {
    pub request_timeout_ms: u64,
    /// Responses larger than this are rejected.
    pub max_body_size: usize,
    /// Overrides the default `user-agent`.
    pub user_agent: Option<String>,
    /// Permit plain `http://` base URLs. Meant for local mock servers.
    pub allow_insecure_http: bool,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            request_timeout_ms: 30_000,
            max_body_size: 10 * 1024 * 1024,
            user_agent: None,
            allow_insecure_http: false,
        }
    }
}

impl ClientConfig {
    /// Figment with defaults, `path` (if it exists) and environment layered
    /// in that order.
    #[must_use]
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Extracts and validates a configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if extraction or validation fails.
    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns [`ConfigError`] if extraction or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::from_figment(&Self::figment(path))
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for an empty or unusable base URL, an
    /// empty scope, or a zero timeout or body limit.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let base_url =
            parse_base_url(&self.base_url).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if base_url.scheme() == "http" && !self.transport.allow_insecure_http {
            return Err(ConfigError::Invalid(
                "plain http base URL requires transport.allow_insecure_http".to_owned(),
            ));
        }
        self.scope()?;
        if self.transport.request_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "transport.request_timeout_ms must be positive".to_owned(),
            ));
        }
        if self.transport.max_body_size == 0 {
            return Err(ConfigError::Invalid(
                "transport.max_body_size must be positive".to_owned(),
            ));
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if either identifier is empty.
    pub fn scope(&self) -> Result<ResourceScope, ConfigError> {
        ResourceScope::new(self.crn.as_str(), self.zone_identifier.as_str())
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use figment::Jail;

    use super::*;

    #[test]
    fn defaults_are_incomplete() {
        let err = ClientConfig::default().validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let config = ClientConfig {
            base_url: "https://api.example.com".to_owned(),
            ..ClientConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("crn"), "{err}");
    }

    #[test]
    fn yaml_then_env() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "zone.yaml",
                r"
base_url: https://api.example.com
crn: crn:v1:test
zone_identifier: zone-from-file
headers:
  x-correlation-id: abc
transport:
  request_timeout_ms: 5000
",
            )?;
            jail.set_env("ZONE_SETTINGS_ZONE_IDENTIFIER", "zone-from-env");
            jail.set_env("ZONE_SETTINGS_TRANSPORT__MAX_BODY_SIZE", "1024");

            let config = ClientConfig::load(Some(Path::new("zone.yaml")))
                .map_err(|e| e.to_string())?;
            assert_eq!(config.base_url, "https://api.example.com");
            assert_eq!(config.crn, "crn:v1:test");
            assert_eq!(config.zone_identifier, "zone-from-env");
            assert_eq!(config.headers["x-correlation-id"], "abc");
            assert_eq!(config.transport.request_timeout_ms, 5000);
            assert_eq!(config.transport.max_body_size, 1024);
            assert!(!config.transport.allow_insecure_http);
            Ok(())
        });
    }

    #[test]
    fn unknown_keys_are_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("zone.yaml", "crn: c\nzone_identifier: z\ntimeout: 5\n")?;
            let err = ClientConfig::load(Some(Path::new("zone.yaml"))).unwrap_err();
            assert!(matches!(err, ConfigError::Load(_)));
            Ok(())
        });
    }

    #[test]
    fn insecure_http_must_be_enabled_explicitly() {
        Jail::expect_with(|jail| {
            jail.set_env("ZONE_SETTINGS_BASE_URL", "http://127.0.0.1:8080");
            jail.set_env("ZONE_SETTINGS_CRN", "c");
            jail.set_env("ZONE_SETTINGS_ZONE_IDENTIFIER", "z");
            let err = ClientConfig::load(None).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)));

            jail.set_env("ZONE_SETTINGS_TRANSPORT__ALLOW_INSECURE_HTTP", "true");
            let config = ClientConfig::load(None).map_err(|e| e.to_string())?;
            assert!(config.transport.allow_insecure_http);
            Ok(())
        });
    }

    #[test]
    fn from_figment_fills_missing_fields() {
        let figment = Figment::new().merge(Serialized::defaults(serde_json::json!({
            "base_url": "https://api.example.com",
            "crn": "c",
            "zone_identifier": "z",
            "transport": {"user_agent": "ops-tool/1.0"}
        })));
        let config = ClientConfig::from_figment(&figment).unwrap();
        assert_eq!(config.transport.user_agent.as_deref(), Some("ops-tool/1.0"));
        assert_eq!(config.transport.request_timeout_ms, 30_000);
        assert!(config.headers.is_empty());
        assert_eq!(config.scope().unwrap().crn(), "c");
    }

    #[test]
    fn insecure_scheme_check_ignores_case() {
        let mut config = ClientConfig {
            base_url: "HTTP://api.example.com".to_owned(),
            crn: "c".to_owned(),
            zone_identifier: "z".to_owned(),
            ..ClientConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("allow_insecure_http"), "{err}");

        config.transport.allow_insecure_http = true;
        config.validate().unwrap();
    }

    #[test]
    fn zero_limits_are_invalid() {
        let mut config = ClientConfig {
            base_url: "https://api.example.com".to_owned(),
            crn: "c".to_owned(),
            zone_identifier: "z".to_owned(),
            ..ClientConfig::default()
        };
        config.validate().unwrap();
        config.transport.request_timeout_ms = 0;
        assert!(config.validate().is_err());
    }
}
