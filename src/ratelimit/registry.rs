//! Scope-keyed limit configuration shared by all callers.

use dashmap::DashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::info;

use crate::error::{FloodgateError, Result};

/// Default window duration when no specific window is configured.
const DEFAULT_WINDOW_SECS: u64 = 60;
/// Default request limit when no specific limit is configured.
const DEFAULT_REQUEST_LIMIT: u64 = 5;

/// Quota definition for one scope: how many requests fit in a sliding window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitConfig {
    /// Sliding window duration in seconds
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
    /// Maximum requests admitted within the window
    #[serde(default = "default_request_limit")]
    pub request_limit: u64,
}

impl Default for LimitConfig {
    fn default() -> Self {
        Self {
            window_secs: DEFAULT_WINDOW_SECS,
            request_limit: DEFAULT_REQUEST_LIMIT,
        }
    }
}

fn default_window_secs() -> u64 {
    DEFAULT_WINDOW_SECS
}

fn default_request_limit() -> u64 {
    DEFAULT_REQUEST_LIMIT
}

/// The scope a configuration update applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigScope {
    /// System-wide quota shared by all traffic
    Global,
    /// Fallback quota for resources without their own entry
    Default,
    /// Quota for one named resource
    Resource,
}

impl FromStr for ConfigScope {
    type Err = FloodgateError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "global" => Ok(ConfigScope::Global),
            "default" => Ok(ConfigScope::Default),
            "resource" => Ok(ConfigScope::Resource),
            other => Err(FloodgateError::Config(format!(
                "Invalid scope '{}'. Must be one of: global, default, resource",
                other
            ))),
        }
    }
}

/// Mutable, scope-keyed limit definitions.
///
/// The global and default configs sit behind their own locks and the
/// resource map uses per-entry locking, so an update to one scope never
/// blocks lookups of another and no reader can observe a half-written
/// config. Updates are visible to every subsequent resolve immediately.
pub struct LimitRegistry {
    global: RwLock<LimitConfig>,
    default: RwLock<LimitConfig>,
    resources: DashMap<String, LimitConfig>,
}

impl LimitRegistry {
    /// Create a registry with built-in defaults for every scope.
    pub fn new() -> Self {
        Self::with_limits(LimitConfig::default(), LimitConfig::default(), [])
    }

    /// Create a registry seeded with explicit limits.
    pub fn with_limits(
        global: LimitConfig,
        default: LimitConfig,
        resources: impl IntoIterator<Item = (String, LimitConfig)>,
    ) -> Self {
        Self {
            global: RwLock::new(global),
            default: RwLock::new(default),
            resources: resources.into_iter().collect(),
        }
    }

    /// Current system-wide quota.
    pub fn global(&self) -> LimitConfig {
        *self.global.read()
    }

    /// Effective quota for `resource_id`: its own entry when present,
    /// otherwise the default. Never fails.
    pub fn resolve(&self, resource_id: &str) -> LimitConfig {
        self.resources
            .get(resource_id)
            .map(|config| *config)
            .unwrap_or_else(|| *self.default.read())
    }

    /// Apply a configuration update and return the resulting config.
    ///
    /// A `window_secs` or `request_limit` of zero leaves that field
    /// unchanged; zero is the update surface's encoding of "absent" and can
    /// never be stored as a real value through this path. Updating an
    /// unknown resource creates it with default field values first.
    /// `resource_id` is required for [`ConfigScope::Resource`] and must not
    /// be blank.
    pub fn update(
        &self,
        scope: ConfigScope,
        resource_id: Option<&str>,
        window_secs: u64,
        request_limit: u64,
    ) -> Result<LimitConfig> {
        let updated = match scope {
            ConfigScope::Global => Self::apply(&mut self.global.write(), window_secs, request_limit),
            ConfigScope::Default => {
                Self::apply(&mut self.default.write(), window_secs, request_limit)
            }
            ConfigScope::Resource => {
                let id = resource_id
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .ok_or_else(|| {
                        FloodgateError::Config(
                            "'resource_id' is required for scope=resource".to_string(),
                        )
                    })?;
                let mut entry = self.resources.entry(id.to_string()).or_default();
                Self::apply(&mut entry, window_secs, request_limit)
            }
        };

        info!(
            scope = ?scope,
            resource_id,
            window_secs = updated.window_secs,
            request_limit = updated.request_limit,
            "Limit configuration updated"
        );
        Ok(updated)
    }

    /// Number of resource-specific entries.
    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    fn apply(config: &mut LimitConfig, window_secs: u64, request_limit: u64) -> LimitConfig {
        if window_secs > 0 {
            config.window_secs = window_secs;
        }
        if request_limit > 0 {
            config.request_limit = request_limit;
        }
        *config
    }
}

impl Default for LimitRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_falls_back_to_default() {
        let registry = LimitRegistry::new();
        let config = registry.resolve("/unseen");
        assert_eq!(config, LimitConfig::default());
    }

    #[test]
    fn test_zero_is_a_no_op_sentinel() {
        let registry = LimitRegistry::new();

        let updated = registry
            .update(ConfigScope::Global, None, 0, 50)
            .unwrap();
        assert_eq!(updated.window_secs, DEFAULT_WINDOW_SECS);
        assert_eq!(updated.request_limit, 50);

        let updated = registry
            .update(ConfigScope::Global, None, 120, 0)
            .unwrap();
        assert_eq!(updated.window_secs, 120);
        assert_eq!(updated.request_limit, 50);
    }

    #[test]
    fn test_update_creates_unknown_resource_with_defaults() {
        let registry = LimitRegistry::new();

        let updated = registry
            .update(ConfigScope::Resource, Some("/login"), 0, 3)
            .unwrap();
        assert_eq!(updated.window_secs, DEFAULT_WINDOW_SECS);
        assert_eq!(updated.request_limit, 3);

        // Subsequent resolves see the new entry, not the default.
        assert_eq!(registry.resolve("/login"), updated);
        assert_eq!(registry.resolve("/other"), LimitConfig::default());
    }

    #[test]
    fn test_updating_default_does_not_touch_existing_resources() {
        let registry = LimitRegistry::new();
        registry
            .update(ConfigScope::Resource, Some("/login"), 30, 3)
            .unwrap();
        registry.update(ConfigScope::Default, None, 90, 10).unwrap();

        assert_eq!(
            registry.resolve("/login"),
            LimitConfig {
                window_secs: 30,
                request_limit: 3
            }
        );
        assert_eq!(
            registry.resolve("/unseen"),
            LimitConfig {
                window_secs: 90,
                request_limit: 10
            }
        );
    }

    #[test]
    fn test_resource_scope_requires_identifier() {
        let registry = LimitRegistry::new();

        let err = registry
            .update(ConfigScope::Resource, None, 60, 5)
            .unwrap_err();
        assert!(matches!(err, FloodgateError::Config(_)));

        let err = registry
            .update(ConfigScope::Resource, Some("   "), 60, 5)
            .unwrap_err();
        assert!(matches!(err, FloodgateError::Config(_)));
        assert_eq!(registry.resource_count(), 0);
    }

    #[test]
    fn test_scope_parsing() {
        assert_eq!("global".parse::<ConfigScope>().unwrap(), ConfigScope::Global);
        assert_eq!("DEFAULT".parse::<ConfigScope>().unwrap(), ConfigScope::Default);
        assert_eq!(
            "resource".parse::<ConfigScope>().unwrap(),
            ConfigScope::Resource
        );

        let err = "endpoint_typo".parse::<ConfigScope>().unwrap_err();
        assert!(matches!(err, FloodgateError::Config(_)));
    }
}
