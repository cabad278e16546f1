//! # Scene Object Pools
//!
//! An [`ObjectPool`] whose instances are engine-managed scene objects.
//!
//! On top of the generic pool this adds:
//! - Creation through the runtime's `instantiate` primitive
//! - Name normalization (`"Bullet(Clone)"` → `"Bullet"`)
//! - One lazily created group per pool that every instance is parented under
//! - Positioned recycling
//! - World-lifecycle teardown that respects persisting instances

use std::rc::Rc;

use reservoir_core::{
    LimitHandling, ObjectFactory, ObjectId, ObjectPool, PoolConfig, PoolId, PoolResult, PoolStats,
    Quat, TeardownReport, Vec3,
};

use crate::scene::{strip_clone_suffix, GroupId, Prefab, RuntimeHandle, SceneObject, SceneRuntime};

/// Factory that creates scene objects through the runtime.
pub struct SceneSpawner<R: SceneRuntime> {
    runtime: RuntimeHandle<R>,
    prefab: Option<R::Prefab>,
    group: Option<GroupId>,
}

impl<R: SceneRuntime> SceneSpawner<R> {
    /// Creates a spawner for `prefab`. Without a prefab nothing is created.
    #[must_use]
    pub fn new(runtime: RuntimeHandle<R>, prefab: Option<R::Prefab>) -> Self {
        Self {
            runtime,
            prefab,
            group: None,
        }
    }

    /// Returns the prefab.
    #[must_use]
    pub fn prefab(&self) -> Option<&R::Prefab> {
        self.prefab.as_ref()
    }

    /// Returns the group, if it has been created.
    #[must_use]
    pub fn group(&self) -> Option<GroupId> {
        self.group
    }

    fn ensure_group(&mut self) -> GroupId {
        if let Some(group) = self.group {
            return group;
        }
        let name = format!(
            "{} Pool",
            self.prefab.as_ref().map_or("Unnamed", Prefab::name)
        );
        let group = self.runtime.borrow_mut().create_group(&name);
        tracing::debug!("Created pool group '{}' ({:?})", name, group);
        self.group = Some(group);
        group
    }

    fn destroy_group(&mut self) -> bool {
        match self.group.take() {
            Some(group) => {
                self.runtime.borrow_mut().destroy_group(group);
                true
            }
            None => false,
        }
    }
}

impl<R: SceneRuntime> ObjectFactory for SceneSpawner<R> {
    type Object = R::Object;

    fn create_object(&mut self) -> Option<R::Object> {
        let prefab = self.prefab.as_ref()?;
        self.runtime.borrow_mut().instantiate(prefab)
    }

    fn on_object_created(&mut self, _id: ObjectId, object: &mut R::Object) {
        let name = strip_clone_suffix(object.name()).to_owned();
        object.set_name(name);
        let group = self.ensure_group();
        object.set_parent(group);
    }

    fn destroy_object(&mut self, object: R::Object) {
        self.runtime.borrow_mut().destroy(object);
    }
}

/// A pool of scene objects created from one prefab.
///
/// # Panics
///
/// Operations that create or destroy instances borrow the runtime mutably.
/// Calling them while the caller holds a borrow of the same runtime panics.
pub struct GameObjectPool<R: SceneRuntime> {
    pool: ObjectPool<SceneSpawner<R>>,
}

impl<R: SceneRuntime> GameObjectPool<R> {
    /// Creates a pool for `prefab` and seeds it per `config`.
    #[must_use]
    pub fn new(runtime: RuntimeHandle<R>, prefab: Option<R::Prefab>, config: &PoolConfig) -> Self {
        Self {
            pool: ObjectPool::new(SceneSpawner::new(runtime, prefab), config),
        }
    }

    /// Creates a pool sharing `runtime`.
    #[must_use]
    pub fn with_runtime(runtime: &RuntimeHandle<R>, prefab: R::Prefab, config: &PoolConfig) -> Self {
        Self::new(Rc::clone(runtime), Some(prefab), config)
    }

    // =========================================================================
    // Pool operations
    // =========================================================================

    /// Creates one vacant instance. See [`ObjectPool::add`].
    pub fn add(&mut self) -> Option<ObjectId> {
        self.pool.add()
    }

    /// Hands out an instance. See [`ObjectPool::recycle`].
    pub fn recycle(&mut self) -> Option<ObjectId> {
        self.pool.recycle()
    }

    /// Hands out an instance already placed at `position`/`rotation`.
    ///
    /// Order of effects: dequeue or create → placement → `pre_hook` →
    /// the instance's recycled hook. The recycled hook always observes the
    /// final placement.
    pub fn recycle_at<H>(&mut self, position: Vec3, rotation: Quat, pre_hook: H) -> Option<ObjectId>
    where
        H: FnOnce(ObjectId, &mut R::Object),
    {
        self.pool.recycle_with(|id, object| {
            object.set_placement(position, rotation);
            pre_hook(id, object);
        })
    }

    /// Returns an instance to the vacant queue. See [`ObjectPool::deactivate`].
    ///
    /// # Errors
    ///
    /// Fails without side effects if `id` is foreign or stale.
    pub fn deactivate(&mut self, id: ObjectId) -> PoolResult<()> {
        self.pool.deactivate(id)
    }

    /// Destroys one instance. See [`ObjectPool::dispatch`].
    pub fn dispatch(&mut self) -> Option<ObjectId> {
        self.pool.dispatch()
    }

    /// Destroys a specific instance. See [`ObjectPool::dispatch_object`].
    ///
    /// # Errors
    ///
    /// Fails without side effects if `id` is foreign or stale.
    pub fn dispatch_object(&mut self, id: ObjectId) -> PoolResult<()> {
        self.pool.dispatch_object(id)
    }

    /// Applies self-reported lifecycle events.
    pub fn process_events(&mut self) -> usize {
        self.pool.process_events()
    }

    /// Evaluates which instances to destroy on a world-lifecycle transition.
    ///
    /// Instances flagged `dont_destroy_on_load` are kept. Every other
    /// instance is destroyed through the runtime. If nothing was kept, the
    /// pool's group is destroyed too and the pool is left empty.
    pub fn evaluate_destruction(&mut self) -> TeardownReport {
        let report = self.pool.release_non_persistent();
        if report.kept == 0 {
            self.pool.clear();
            self.pool.factory_mut().destroy_group();
        }
        report
    }

    /// Destroys every instance and the group.
    pub fn destroy_all(&mut self) {
        self.pool.clear();
        self.pool.factory_mut().destroy_group();
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Returns the pool's identifier.
    #[must_use]
    pub fn id(&self) -> PoolId {
        self.pool.id()
    }

    /// Returns the prefab this pool instantiates.
    #[must_use]
    pub fn prefab(&self) -> Option<&R::Prefab> {
        self.pool.factory().prefab()
    }

    /// Returns the group instances are parented under, once created.
    #[must_use]
    pub fn group(&self) -> Option<GroupId> {
        self.pool.factory().group()
    }

    /// Number of live instances.
    #[must_use]
    pub fn count(&self) -> usize {
        self.pool.count()
    }

    /// Number of instances in use.
    #[must_use]
    pub fn occupied_count(&self) -> usize {
        self.pool.occupied_count()
    }

    /// Number of vacant instances.
    #[must_use]
    pub fn vacant_count(&self) -> usize {
        self.pool.vacant_count()
    }

    /// Capacity limit.
    #[must_use]
    pub fn limit(&self) -> Option<usize> {
        self.pool.limit()
    }

    /// Limit policy.
    #[must_use]
    pub fn limit_handling(&self) -> LimitHandling {
        self.pool.limit_handling()
    }

    /// Usage counters.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.pool.stats()
    }

    /// Gets a live instance.
    #[must_use]
    pub fn get(&self, id: ObjectId) -> Option<&R::Object> {
        self.pool.get(id)
    }

    /// Gets a live instance mutably.
    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut R::Object> {
        self.pool.get_mut(id)
    }

    /// Returns the underlying generic pool.
    #[must_use]
    pub fn pool(&self) -> &ObjectPool<SceneSpawner<R>> {
        &self.pool
    }

    /// Returns the underlying generic pool mutably.
    pub fn pool_mut(&mut self) -> &mut ObjectPool<SceneSpawner<R>> {
        &mut self.pool
    }
}
