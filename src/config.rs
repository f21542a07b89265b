//! Configuration management for Floodgate.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{FloodgateError, Result};
use crate::ratelimit::{LimitConfig, LimitRegistry};

/// Main configuration for a Floodgate deployment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FloodgateConfig {
    /// Counter store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Initial limit definitions
    #[serde(default)]
    pub limits: LimitsConfig,
}

/// Counter store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Redis connection URL
    #[serde(default = "default_redis_url")]
    pub redis_url: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            redis_url: default_redis_url(),
        }
    }
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

/// Initial limit definitions, keyed the same way the runtime update surface
/// addresses them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// System-wide quota
    #[serde(default)]
    pub global: LimitConfig,

    /// Fallback quota for endpoints without their own entry
    #[serde(default)]
    pub default: LimitConfig,

    /// Per-endpoint quotas
    #[serde(default)]
    pub endpoints: HashMap<String, LimitConfig>,
}

impl FloodgateConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Load configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: FloodgateConfig =
            serde_yaml::from_str(yaml).map_err(|e| FloodgateError::Config(e.to_string()))?;
        config.limits.validate()?;
        Ok(config)
    }
}

impl LimitsConfig {
    /// Reject non-positive windows at load time, before any evaluation can
    /// see them.
    fn validate(&self) -> Result<()> {
        let scopes = [("global", &self.global), ("default", &self.default)];
        for (name, config) in scopes {
            if config.window_secs == 0 {
                return Err(FloodgateError::Config(format!(
                    "window_secs must be positive for {} limits",
                    name
                )));
            }
        }
        for (id, config) in &self.endpoints {
            if config.window_secs == 0 {
                return Err(FloodgateError::Config(format!(
                    "window_secs must be positive for endpoint '{}'",
                    id
                )));
            }
        }
        Ok(())
    }

    /// Build a registry seeded with these limits.
    pub fn build_registry(&self) -> LimitRegistry {
        LimitRegistry::with_limits(
            self.global,
            self.default,
            self.endpoints.iter().map(|(id, cfg)| (id.clone(), *cfg)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = FloodgateConfig::from_yaml("{}").unwrap();
        assert_eq!(config.store.redis_url, "redis://127.0.0.1:6379");
        assert_eq!(config.limits.global, LimitConfig::default());
        assert!(config.limits.endpoints.is_empty());
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
store:
  redis_url: "redis://cache.internal:6379"
limits:
  global:
    window_secs: 60
    request_limit: 1000
  default:
    window_secs: 60
    request_limit: 5
  endpoints:
    /login:
      window_secs: 30
      request_limit: 3
"#;
        let config = FloodgateConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.store.redis_url, "redis://cache.internal:6379");
        assert_eq!(config.limits.global.request_limit, 1000);
        assert_eq!(config.limits.endpoints["/login"].window_secs, 30);
    }

    #[test]
    fn test_partial_limit_fields_fall_back() {
        let yaml = r#"
limits:
  global:
    request_limit: 500
"#;
        let config = FloodgateConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.limits.global.window_secs, 60);
        assert_eq!(config.limits.global.request_limit, 500);
    }

    #[test]
    fn test_build_registry_seeds_endpoints() {
        let yaml = r#"
limits:
  endpoints:
    /data:
      window_secs: 10
      request_limit: 2
"#;
        let config = FloodgateConfig::from_yaml(yaml).unwrap();
        let registry = config.limits.build_registry();
        assert_eq!(
            registry.resolve("/data"),
            LimitConfig {
                window_secs: 10,
                request_limit: 2
            }
        );
        assert_eq!(registry.resolve("/other"), LimitConfig::default());
    }

    #[test]
    fn test_zero_window_rejected_at_load() {
        let yaml = r#"
limits:
  endpoints:
    /bad:
      window_secs: 0
      request_limit: 5
"#;
        let err = FloodgateConfig::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, FloodgateError::Config(_)));
    }

    #[test]
    fn test_invalid_yaml_is_a_config_error() {
        let err = FloodgateConfig::from_yaml("store: [not, a, mapping]").unwrap_err();
        assert!(matches!(err, FloodgateError::Config(_)));
    }
}
