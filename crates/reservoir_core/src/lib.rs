//! # Reservoir Core
//!
//! Bounded object pools for short-lived, frequently reused instances
//! (projectiles, effects, transient props).
//!
//! Every pooled instance cycles through:
//!
//! ```text
//! Created ──> Vacant ⇄ Occupied ──> Destroyed
//!               │                      ^
//!               └──────────────────────┘
//! ```
//!
//! ## Architecture Rules
//!
//! 1. **The pool is the sole authority** over which instances are vacant and
//!    which are occupied. Callers hold [`ObjectId`] handles, never the objects.
//! 2. **FIFO fairness** - the oldest vacated instance is always reused first.
//! 3. **Hard capacity** - a pool never holds more than its limit; what happens
//!    at the limit is decided by [`LimitHandling`].
//! 4. **Self-reporting** - instances report their own deactivation or
//!    destruction through a [`LifecycleEmitter`] instead of being polled.
//!
//! ## Example
//!
//! ```rust,ignore
//! use reservoir_core::{CloneFactory, ObjectPool, PoolConfig};
//!
//! let mut pool = ObjectPool::new(CloneFactory::new(Bullet::default()), &PoolConfig::default());
//! let id = pool.recycle().expect("unbounded pool");
//! pool.deactivate(id)?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod error;
pub mod factory;
pub mod identity;
pub mod lifecycle;
pub mod math;
pub mod object;
pub mod pool;

pub use config::{LimitHandling, PoolConfig};
pub use error::{PoolError, PoolResult};
pub use factory::{CloneFactory, FnFactory, ObjectFactory};
pub use identity::{ObjectId, PoolId};
pub use lifecycle::{LifecycleEmitter, LifecycleEvent, LifecycleEventKind};
pub use math::{Quat, Vec3};
pub use object::PoolObject;
pub use pool::{ObjectPool, PoolStats, TeardownReport};
