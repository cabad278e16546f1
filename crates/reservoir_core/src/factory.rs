//! # Object Factories
//!
//! The creation seam of a pool. A pool never constructs or tears down an
//! instance itself; it asks its factory.

use crate::identity::ObjectId;
use crate::object::PoolObject;

/// Creates and destroys instances on behalf of a pool.
pub trait ObjectFactory {
    /// The pooled instance type.
    type Object: PoolObject;

    /// Builds a new instance, or `None` if nothing can be built right now.
    fn create_object(&mut self) -> Option<Self::Object>;

    /// Called after the pool has subscribed to the new instance and fired its
    /// creation hook.
    fn on_object_created(&mut self, _id: ObjectId, _object: &mut Self::Object) {}

    /// Tears down an instance the pool has permanently removed.
    fn destroy_object(&mut self, object: Self::Object) {
        drop(object);
    }
}

/// Creates instances by cloning a reference object.
#[derive(Clone, Debug)]
pub struct CloneFactory<T> {
    template: T,
}

impl<T> CloneFactory<T> {
    /// Creates a factory around `template`.
    #[must_use]
    pub const fn new(template: T) -> Self {
        Self { template }
    }

    /// Returns the reference object.
    #[must_use]
    pub const fn template(&self) -> &T {
        &self.template
    }
}

impl<T: PoolObject + Clone> ObjectFactory for CloneFactory<T> {
    type Object = T;

    fn create_object(&mut self) -> Option<T> {
        Some(self.template.clone())
    }
}

/// Creates instances from a closure.
pub struct FnFactory<F> {
    create: F,
}

impl<F> FnFactory<F> {
    /// Wraps `create`.
    #[must_use]
    pub const fn new(create: F) -> Self {
        Self { create }
    }
}

impl<T, F> ObjectFactory for FnFactory<F>
where
    T: PoolObject,
    F: FnMut() -> Option<T>,
{
    type Object = T;

    fn create_object(&mut self) -> Option<T> {
        (self.create)()
    }
}
