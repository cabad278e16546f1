//! # Registry Error Types

use reservoir_core::PoolError;
use thiserror::Error;

use crate::scene::PrefabKey;

/// Errors that can occur in registry operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// No pool is registered for the key.
    #[error("no pool registered for {0}")]
    NoSuchPool(PrefabKey),

    /// The pool rejected the operation.
    #[error(transparent)]
    Pool(#[from] PoolError),

    /// A configuration preset could not be parsed.
    #[error("malformed registry configuration: {0}")]
    MalformedConfig(String),
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;
