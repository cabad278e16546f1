//! # Reservoir
//!
//! Pools of engine-managed scene objects and the registry that multiplexes
//! them.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                           PoolRegistry                              │
//! │   prefab key ──> GameObjectPool          [add|recycle|deact|disp]   │
//! │                     │                        deferred queues        │
//! │                     ▼                                               │
//! │               ObjectPool<SceneSpawner>  (reservoir_core)            │
//! │                     │                                               │
//! │                     ▼                                               │
//! │               SceneRuntime  (instantiate / destroy / groups)        │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `scene`: the engine boundary
//! - `game_pool`: scene object pools
//! - `registry`: the pool manager and its per-tick drain
//! - `request`: deferred request queues
//! - `config`: registry configuration and world events
//! - `mock`: an in-memory runtime for tests and tools
//!
//! ## Example
//!
//! ```rust,ignore
//! let runtime = runtime_handle(MyEngine::new());
//! let mut pools = PoolRegistry::new(runtime, RegistryConfig::default());
//!
//! pools.request_recycle_then(&bullet, |pools, id| {
//!     if let Some(id) = id {
//!         pools.get_mut(id).map(|b| b.fire());
//!     }
//! });
//!
//! // once per tick, after game logic
//! pools.drain();
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod error;
pub mod game_pool;
pub mod mock;
pub mod registry;
pub mod request;
pub mod scene;

pub use config::{RegistryConfig, WorldEvent};
pub use error::{RegistryError, RegistryResult};
pub use game_pool::{GameObjectPool, SceneSpawner};
pub use registry::PoolRegistry;
pub use request::{Completion, DrainReport, PreRecycleHook, RequestKind};
pub use scene::{
    runtime_handle, strip_clone_suffix, GroupId, Prefab, PrefabKey, RuntimeHandle, SceneObject,
    SceneRuntime, CLONE_SUFFIX,
};

pub use reservoir_core::{
    LifecycleEmitter, LimitHandling, ObjectId, PoolConfig, PoolObject, Quat, TeardownReport, Vec3,
};
