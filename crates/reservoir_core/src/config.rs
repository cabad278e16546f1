//! # Pool Configuration
//!
//! Programmatic configuration. Presets can be deserialized from TOML by the
//! layer that owns them.

use serde::{Deserialize, Serialize};

use crate::error::{PoolError, PoolResult};

/// What a pool does when it is full and another instance is requested.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LimitHandling {
    /// The request fails and yields no instance.
    #[default]
    None,
    /// An occupied instance is evicted and handed out again.
    ///
    /// The evicted instance's deactivation hook does NOT fire, and whoever was
    /// using it is not told.
    RecycleRandom,
}

/// Configuration for a single pool.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Instances created up front.
    pub initial_size: usize,
    /// Maximum number of live instances. `None` means unbounded.
    pub limit: Option<usize>,
    /// Policy applied at the limit.
    pub limit_handling: LimitHandling,
    /// Seed for eviction choices.
    pub seed: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            initial_size: 0,
            limit: None,
            limit_handling: LimitHandling::None,
            seed: 0x5EED_0F_F00D,
        }
    }
}

impl PoolConfig {
    /// Convenience constructor for a bounded pool.
    #[must_use]
    pub fn bounded(initial_size: usize, limit: usize, limit_handling: LimitHandling) -> Self {
        Self {
            initial_size,
            limit: Some(limit),
            limit_handling,
            ..Self::default()
        }
    }

    /// Checks that the values are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidConfig`] if the initial size exceeds the
    /// limit.
    pub fn validate(&self) -> PoolResult<()> {
        match self.limit {
            Some(limit) if self.initial_size > limit => Err(PoolError::InvalidConfig(format!(
                "initial_size {} exceeds limit {}",
                self.initial_size, limit
            ))),
            _ => Ok(()),
        }
    }
}
