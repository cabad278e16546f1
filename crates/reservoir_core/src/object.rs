//! # Poolable Object Contract
//!
//! The minimal capability every pooled instance implements. The pool drives
//! the hooks; the instance never calls them on itself.

use crate::lifecycle::LifecycleEmitter;

/// An instance that can live in an [`ObjectPool`](crate::ObjectPool).
///
/// Hook guarantees:
///
/// | Hook | Fired |
/// |------|-------|
/// | `on_object_creation` | exactly once, at first construction |
/// | `on_object_recycled` | on every Vacant → Occupied transition |
/// | `on_object_deactivation` | on every Occupied → Vacant transition |
/// | `on_object_destruction` | exactly once, on permanent removal by the pool |
pub trait PoolObject {
    /// Called once right after the instance is created.
    fn on_object_creation(&mut self) {}

    /// Called every time the instance is handed out.
    fn on_object_recycled(&mut self) {}

    /// Called every time the instance is returned to the vacant queue.
    fn on_object_deactivation(&mut self) {}

    /// Called once before the instance is torn down.
    fn on_object_destruction(&mut self) {}

    /// Returns whether the instance is currently in use.
    fn is_active(&self) -> bool;

    /// Sets the occupancy flag. Only the pool calls this.
    fn set_active(&mut self, active: bool);

    /// Instances returning `true` survive world-lifecycle teardown.
    fn dont_destroy_on_load(&self) -> bool {
        false
    }

    /// Receives the instance's lifecycle subscription.
    ///
    /// Called exactly once per instance, before `on_object_creation`. Keep the
    /// emitter to report self-initiated deactivation or destruction.
    fn bind_lifecycle(&mut self, _emitter: LifecycleEmitter) {}
}
