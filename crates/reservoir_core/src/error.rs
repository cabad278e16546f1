//! # Pool Error Types
//!
//! Capacity exhaustion is NOT an error: a full pool answers `None`.
//! The errors here are the cases where a caller handed the pool something
//! it cannot act on.

use thiserror::Error;

use crate::identity::{ObjectId, PoolId};

/// Errors that can occur in pool operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// The handle was minted by a different pool.
    #[error("object {object} does not belong to {pool}")]
    ForeignObject {
        /// The offending handle.
        object: ObjectId,
        /// The pool that rejected it.
        pool: PoolId,
    },

    /// The handle belongs to this pool but no longer names a live instance.
    #[error("object {0} is not live")]
    UnknownObject(ObjectId),

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for pool operations.
pub type PoolResult<T> = Result<T, PoolError>;
