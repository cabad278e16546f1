//! # Registry Configuration
//!
//! Programmatic by default. A preset can also be parsed from TOML:
//!
//! ```toml
//! evaluate_on_world_unloaded = true
//! evaluate_on_world_loaded = false
//!
//! [default_pool]
//! initial_size = 8
//! limit = 64
//! limit_handling = "RecycleRandom"
//! ```

use reservoir_core::PoolConfig;
use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, RegistryResult};

/// World-lifecycle transitions reported by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorldEvent {
    /// A world finished unloading.
    Unloaded,
    /// A world finished loading.
    Loaded,
    /// The active world changed.
    ActiveChanged,
}

/// Configuration for a [`PoolRegistry`](crate::PoolRegistry).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Settings for pools created on demand.
    pub default_pool: PoolConfig,
    /// Run teardown evaluation when a world unloads.
    pub evaluate_on_world_unloaded: bool,
    /// Run teardown evaluation when a world loads.
    pub evaluate_on_world_loaded: bool,
    /// Run teardown evaluation when the active world changes.
    pub evaluate_on_active_world_changed: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            default_pool: PoolConfig::default(),
            evaluate_on_world_unloaded: true,
            evaluate_on_world_loaded: false,
            evaluate_on_active_world_changed: false,
        }
    }
}

impl RegistryConfig {
    /// Parses and validates a TOML preset. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::MalformedConfig`] if the text is not a valid preset
    /// - [`RegistryError::Pool`] if the default pool settings are inconsistent
    pub fn from_toml_str(text: &str) -> RegistryResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| RegistryError::MalformedConfig(e.to_string()))?;
        config.default_pool.validate()?;
        Ok(config)
    }

    /// Returns true if `event` should trigger teardown evaluation.
    #[must_use]
    pub const fn evaluates_on(&self, event: WorldEvent) -> bool {
        match event {
            WorldEvent::Unloaded => self.evaluate_on_world_unloaded,
            WorldEvent::Loaded => self.evaluate_on_world_loaded,
            WorldEvent::ActiveChanged => self.evaluate_on_active_world_changed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reservoir_core::{LimitHandling, PoolError};

    #[test]
    fn test_default_toggles() {
        let config = RegistryConfig::default();
        assert!(config.evaluates_on(WorldEvent::Unloaded));
        assert!(!config.evaluates_on(WorldEvent::Loaded));
        assert!(!config.evaluates_on(WorldEvent::ActiveChanged));
    }

    #[test]
    fn test_parse_preset() {
        let config = RegistryConfig::from_toml_str(
            r#"
            evaluate_on_active_world_changed = true

            [default_pool]
            initial_size = 4
            limit = 16
            limit_handling = "RecycleRandom"
            "#,
        )
        .unwrap();

        assert!(config.evaluate_on_world_unloaded);
        assert!(config.evaluate_on_active_world_changed);
        assert_eq!(config.default_pool.initial_size, 4);
        assert_eq!(config.default_pool.limit, Some(16));
        assert_eq!(config.default_pool.limit_handling, LimitHandling::RecycleRandom);
    }

    #[test]
    fn test_malformed_preset() {
        let err = RegistryConfig::from_toml_str("default_pool = 3").unwrap_err();
        assert!(matches!(err, RegistryError::MalformedConfig(_)));
    }

    #[test]
    fn test_inconsistent_preset() {
        let err = RegistryConfig::from_toml_str(
            r#"
            [default_pool]
            initial_size = 10
            limit = 2
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, RegistryError::Pool(PoolError::InvalidConfig(_))));
    }
}
