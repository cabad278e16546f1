//! # Scene Runtime Boundary
//!
//! What the pools need from the engine that owns scene objects:
//!
//! | Primitive | Used for |
//! |-----------|----------|
//! | `instantiate` | creating a pooled instance from a prefab |
//! | `destroy` | tearing an instance down |
//! | `create_group` / `destroy_group` | one organizational parent per pool |
//!
//! The runtime is shared through an `Rc<RefCell<_>>`. Pools and the registry
//! are therefore `!Send`: all pool mutation stays on the thread that owns the
//! runtime.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use reservoir_core::{PoolObject, Quat, Vec3};

/// Suffix engines append to instantiated copies.
pub const CLONE_SUFFIX: &str = "(Clone)";

/// Shared handle to the scene runtime.
pub type RuntimeHandle<R> = Rc<RefCell<R>>;

/// Wraps a runtime in a [`RuntimeHandle`].
#[must_use]
pub fn runtime_handle<R>(runtime: R) -> RuntimeHandle<R> {
    Rc::new(RefCell::new(runtime))
}

/// Identity of a prefab. One pool exists per key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct PrefabKey(pub u64);

impl fmt::Display for PrefabKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "prefab#{}", self.0)
    }
}

/// Opaque handle to an organizational parent in the scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct GroupId(pub u64);

/// A template the runtime knows how to instantiate.
pub trait Prefab: Clone {
    /// Stable identity of this template.
    fn key(&self) -> PrefabKey;

    /// Display name, used for the pool's group.
    fn name(&self) -> &str;
}

/// A pooled instance that lives in the scene.
pub trait SceneObject: PoolObject {
    /// Current display name.
    fn name(&self) -> &str;

    /// Renames the instance.
    fn set_name(&mut self, name: String);

    /// Reparents the instance under `group`.
    fn set_parent(&mut self, group: GroupId);

    /// Moves the instance.
    fn set_placement(&mut self, position: Vec3, rotation: Quat);
}

/// Engine-side creation and destruction primitives.
pub trait SceneRuntime {
    /// Template type.
    type Prefab: Prefab;
    /// Instance type.
    type Object: SceneObject;

    /// Creates an instance from `prefab`.
    fn instantiate(&mut self, prefab: &Self::Prefab) -> Option<Self::Object>;

    /// Destroys an instance.
    fn destroy(&mut self, object: Self::Object);

    /// Creates an empty organizational parent named `name`.
    fn create_group(&mut self, name: &str) -> GroupId;

    /// Destroys an organizational parent.
    fn destroy_group(&mut self, group: GroupId);
}

/// Strips the engine's clone suffix from an instance name.
#[must_use]
pub fn strip_clone_suffix(name: &str) -> &str {
    name.strip_suffix(CLONE_SUFFIX).map_or(name, str::trim_end)
}
