//! # Pool Registry
//!
//! One [`GameObjectPool`] per prefab, plus the per-tick synchronization point
//! for deferred requests.
//!
//! ## Lifecycle
//!
//! The registry is an explicit object. The host builds it at startup, calls
//! [`drain`](PoolRegistry::drain) once per tick after game logic has run,
//! forwards world-lifecycle events to
//! [`on_world_event`](PoolRegistry::on_world_event), and calls
//! [`shutdown`](PoolRegistry::shutdown) at the end.
//!
//! ```text
//! ┌──────────────┐  immediate ops  ┌──────────────┐   ┌────────────────────┐
//! │  Game logic  │────────────────>│ PoolRegistry │──>│ GameObjectPool (k) │
//! │              │  request_*      │  [4 queues]  │   └────────────────────┘
//! └──────────────┘────────────────>│              │
//!                 end of tick ───> │   drain()    │
//!                                  └──────────────┘
//! ```

use std::collections::HashMap;
use std::rc::Rc;

use reservoir_core::{ObjectId, PoolConfig, PoolId, Quat, TeardownReport, Vec3};

use crate::config::{RegistryConfig, WorldEvent};
use crate::error::{RegistryError, RegistryResult};
use crate::game_pool::GameObjectPool;
use crate::request::{
    Completion, DrainReport, Placement, PreRecycleHook, Request, RequestKind, RequestQueues,
};
use crate::scene::{Prefab, PrefabKey, RuntimeHandle, SceneRuntime};

/// Registry of scene pools keyed by prefab identity.
pub struct PoolRegistry<R: SceneRuntime> {
    runtime: RuntimeHandle<R>,
    config: RegistryConfig,
    pools: HashMap<PrefabKey, GameObjectPool<R>>,
    owners: HashMap<PoolId, PrefabKey>,
    requests: RequestQueues<R>,
    ticks: u64,
}

impl<R: SceneRuntime> PoolRegistry<R> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new(runtime: RuntimeHandle<R>, config: RegistryConfig) -> Self {
        Self {
            runtime,
            config,
            pools: HashMap::new(),
            owners: HashMap::new(),
            requests: RequestQueues::new(),
            ticks: 0,
        }
    }

    // =========================================================================
    // Pool management
    // =========================================================================

    /// Registers a pool for `prefab`.
    ///
    /// Returns `false` and changes nothing if a pool already exists for the
    /// prefab's key, or if `config` fails [`PoolConfig::validate`].
    pub fn create_pool(&mut self, prefab: &R::Prefab, config: &PoolConfig) -> bool {
        let key = prefab.key();
        if self.pools.contains_key(&key) {
            tracing::info!("Pool for {} ('{}') already exists, ignoring", key, prefab.name());
            return false;
        }
        if let Err(err) = config.validate() {
            tracing::error!("Refusing pool for {} ('{}'): {}", key, prefab.name(), err);
            return false;
        }
        let pool = Self::build_pool(&self.runtime, &mut self.owners, prefab, config);
        self.pools.insert(key, pool);
        true
    }

    /// Removes the pool for `key`, destroying its instances and group.
    ///
    /// Requests already queued for the pool fail at drain time.
    pub fn remove_pool(&mut self, key: PrefabKey) -> bool {
        let Some(mut pool) = self.pools.remove(&key) else {
            return false;
        };
        self.owners.remove(&pool.id());
        pool.destroy_all();
        tracing::debug!("Removed pool for {}", key);
        true
    }

    /// Returns true if a pool exists for `key`.
    #[must_use]
    pub fn contains_pool(&self, key: PrefabKey) -> bool {
        self.pools.contains_key(&key)
    }

    /// Number of registered pools.
    #[must_use]
    pub fn pool_count(&self) -> usize {
        self.pools.len()
    }

    /// Keys of every registered pool.
    pub fn keys(&self) -> impl Iterator<Item = PrefabKey> + '_ {
        self.pools.keys().copied()
    }

    /// Gets the pool for `key`.
    #[must_use]
    pub fn pool(&self, key: PrefabKey) -> Option<&GameObjectPool<R>> {
        self.pools.get(&key)
    }

    /// Gets the pool for `key` mutably.
    pub fn pool_mut(&mut self, key: PrefabKey) -> Option<&mut GameObjectPool<R>> {
        self.pools.get_mut(&key)
    }

    /// Resolves an instance by handle, whichever pool owns it.
    #[must_use]
    pub fn get(&self, id: ObjectId) -> Option<&R::Object> {
        let key = self.owners.get(&id.pool())?;
        self.pools.get(key)?.get(id)
    }

    /// Resolves an instance mutably by handle.
    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut R::Object> {
        let key = self.owners.get(&id.pool())?;
        self.pools.get_mut(key)?.get_mut(id)
    }

    /// Returns the shared runtime.
    #[must_use]
    pub fn runtime(&self) -> &RuntimeHandle<R> {
        &self.runtime
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    // =========================================================================
    // Immediate operations
    // =========================================================================

    /// Creates a vacant instance of `prefab`, creating the pool if needed.
    pub fn add(&mut self, prefab: &R::Prefab) -> Option<ObjectId> {
        self.ensure_pool(prefab).add()
    }

    /// Hands out an instance of `prefab`, creating the pool if needed.
    pub fn recycle(&mut self, prefab: &R::Prefab) -> Option<ObjectId> {
        self.ensure_pool(prefab).recycle()
    }

    /// Hands out an instance of `prefab` placed at `position`/`rotation`.
    ///
    /// See [`GameObjectPool::recycle_at`] for the order of effects.
    pub fn recycle_at<H>(
        &mut self,
        prefab: &R::Prefab,
        position: Vec3,
        rotation: Quat,
        pre_hook: H,
    ) -> Option<ObjectId>
    where
        H: FnOnce(ObjectId, &mut R::Object),
    {
        self.ensure_pool(prefab).recycle_at(position, rotation, pre_hook)
    }

    /// Returns an instance of `prefab` to its pool.
    ///
    /// # Errors
    ///
    /// [`RegistryError::Pool`] if `id` does not belong to `prefab`'s pool or
    /// is stale. Nothing is changed in that case.
    pub fn deactivate(&mut self, prefab: &R::Prefab, id: ObjectId) -> RegistryResult<()> {
        let key = prefab.key();
        self.ensure_pool(prefab)
            .deactivate(id)
            .map_err(|err| Self::report_rejection(key, err))
    }

    /// Destroys one instance of `prefab`.
    pub fn dispatch(&mut self, prefab: &R::Prefab) -> Option<ObjectId> {
        self.ensure_pool(prefab).dispatch()
    }

    /// Creates a vacant instance in an existing pool.
    pub fn add_by_key(&mut self, key: PrefabKey) -> Option<ObjectId> {
        self.registered_pool(key)?.add()
    }

    /// Hands out an instance from an existing pool.
    pub fn recycle_by_key(&mut self, key: PrefabKey) -> Option<ObjectId> {
        self.registered_pool(key)?.recycle()
    }

    /// Destroys one instance from an existing pool.
    pub fn dispatch_by_key(&mut self, key: PrefabKey) -> Option<ObjectId> {
        self.registered_pool(key)?.dispatch()
    }

    /// Returns an instance to an existing pool.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::NoSuchPool`] if no pool is registered for `key`
    /// - [`RegistryError::Pool`] if the pool rejects `id`
    pub fn deactivate_by_key(&mut self, key: PrefabKey, id: ObjectId) -> RegistryResult<()> {
        let pool = self
            .registered_pool(key)
            .ok_or(RegistryError::NoSuchPool(key))?;
        pool.deactivate(id)
            .map_err(|err| Self::report_rejection(key, err))
    }

    // =========================================================================
    // Deferred operations
    // =========================================================================

    /// Queues an add for the next drain.
    pub fn request_add(&mut self, prefab: &R::Prefab) {
        self.enqueue_add(prefab, None);
    }

    /// Queues an add; `on_complete` receives the result at drain time.
    pub fn request_add_then<C>(&mut self, prefab: &R::Prefab, on_complete: C)
    where
        C: FnOnce(&mut Self, Option<ObjectId>) + 'static,
    {
        self.enqueue_add(prefab, Some(Box::new(on_complete)));
    }

    /// Queues a recycle for the next drain.
    pub fn request_recycle(&mut self, prefab: &R::Prefab) {
        self.enqueue_recycle(prefab, None, None);
    }

    /// Queues a recycle; `on_complete` receives the result at drain time.
    pub fn request_recycle_then<C>(&mut self, prefab: &R::Prefab, on_complete: C)
    where
        C: FnOnce(&mut Self, Option<ObjectId>) + 'static,
    {
        self.enqueue_recycle(prefab, None, Some(Box::new(on_complete)));
    }

    /// Queues a positioned recycle; `on_complete` receives the result at
    /// drain time.
    pub fn request_recycle_at<H, C>(
        &mut self,
        prefab: &R::Prefab,
        position: Vec3,
        rotation: Quat,
        pre_hook: Option<H>,
        on_complete: C,
    ) where
        H: FnOnce(ObjectId, &mut R::Object) + 'static,
        C: FnOnce(&mut Self, Option<ObjectId>) + 'static,
    {
        let placement = Placement {
            position,
            rotation,
            pre_hook: pre_hook.map(|hook| Box::new(hook) as PreRecycleHook<R>),
        };
        self.enqueue_recycle(prefab, Some(placement), Some(Box::new(on_complete)));
    }

    /// Queues a deactivation for the next drain.
    pub fn request_deactivation(&mut self, prefab: &R::Prefab, id: ObjectId) {
        self.enqueue_deactivation(prefab, id, None);
    }

    /// Queues a deactivation; `on_complete` receives `Some(id)` on success and
    /// `None` if the pool rejected the handle.
    pub fn request_deactivation_then<C>(&mut self, prefab: &R::Prefab, id: ObjectId, on_complete: C)
    where
        C: FnOnce(&mut Self, Option<ObjectId>) + 'static,
    {
        self.enqueue_deactivation(prefab, id, Some(Box::new(on_complete)));
    }

    /// Queues a dispatch for the next drain.
    pub fn request_dispatch(&mut self, prefab: &R::Prefab) {
        self.enqueue_dispatch(prefab, None);
    }

    /// Queues a dispatch; `on_complete` receives the destroyed handle.
    pub fn request_dispatch_then<C>(&mut self, prefab: &R::Prefab, on_complete: C)
    where
        C: FnOnce(&mut Self, Option<ObjectId>) + 'static,
    {
        self.enqueue_dispatch(prefab, Some(Box::new(on_complete)));
    }

    /// Number of queued requests across all queues.
    #[must_use]
    pub fn pending_requests(&self) -> usize {
        self.requests.total()
    }

    /// Number of queued requests of one kind.
    #[must_use]
    pub fn pending(&self, kind: RequestKind) -> usize {
        self.requests.len(kind)
    }

    // =========================================================================
    // Tick synchronization
    // =========================================================================

    /// Executes every queued request. Call once per tick.
    ///
    /// Self-reported lifecycle events are applied first. Then the queues run
    /// in the order add, recycle, deactivate, dispatch; each is drained until
    /// empty before the next starts.
    pub fn drain(&mut self) -> DrainReport {
        let mut report = DrainReport {
            tick: self.ticks,
            ..DrainReport::default()
        };
        report.lifecycle_events = self
            .pools
            .values_mut()
            .map(GameObjectPool::process_events)
            .sum();

        for kind in RequestKind::DRAIN_ORDER {
            while let Some(request) = self.requests.pop(kind) {
                let succeeded = self.execute(request);
                report.record(kind, succeeded);
            }
        }

        self.ticks += 1;
        if report.executed() > 0 {
            tracing::debug!(
                "Drain {}: {} add, {} recycle, {} deactivate, {} dispatch ({} failed)",
                report.tick,
                report.added,
                report.recycled,
                report.deactivated,
                report.dispatched,
                report.failed
            );
        }
        report
    }

    /// Number of drains performed.
    #[must_use]
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    // =========================================================================
    // World lifecycle
    // =========================================================================

    /// Handles a world-lifecycle transition.
    ///
    /// Returns the combined teardown report if the configuration enables
    /// evaluation for `event`, `None` otherwise.
    pub fn on_world_event(&mut self, event: WorldEvent) -> Option<TeardownReport> {
        if !self.config.evaluates_on(event) {
            return None;
        }
        let report = self.evaluate_all();
        tracing::info!(
            "World {:?}: destroyed {} pooled objects, kept {}",
            event,
            report.destroyed,
            report.kept
        );
        Some(report)
    }

    /// Runs teardown evaluation on every pool.
    pub fn evaluate_all(&mut self) -> TeardownReport {
        let mut report = TeardownReport::default();
        for pool in self.pools.values_mut() {
            report.absorb(pool.evaluate_destruction());
        }
        report
    }

    /// Destroys every pool, instance and group. Pending requests are dropped
    /// without running their completions.
    pub fn shutdown(mut self) {
        let pending = self.requests.total();
        for pool in self.pools.values_mut() {
            pool.destroy_all();
        }
        tracing::info!(
            "Pool registry shut down: {} pools, {} pending requests dropped",
            self.pools.len(),
            pending
        );
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn build_pool(
        runtime: &RuntimeHandle<R>,
        owners: &mut HashMap<PoolId, PrefabKey>,
        prefab: &R::Prefab,
        config: &PoolConfig,
    ) -> GameObjectPool<R> {
        let key = prefab.key();
        let pool = GameObjectPool::new(Rc::clone(runtime), Some(prefab.clone()), config);
        tracing::debug!(
            "Registered {} for {} ('{}') with {} vacant",
            pool.id(),
            key,
            prefab.name(),
            pool.vacant_count()
        );
        owners.insert(pool.id(), key);
        pool
    }

    fn ensure_pool(&mut self, prefab: &R::Prefab) -> &mut GameObjectPool<R> {
        let Self {
            runtime,
            config,
            pools,
            owners,
            ..
        } = self;
        pools.entry(prefab.key()).or_insert_with(|| {
            Self::build_pool(runtime, owners, prefab, &config.default_pool)
        })
    }

    fn registered_pool(&mut self, key: PrefabKey) -> Option<&mut GameObjectPool<R>> {
        let pool = self.pools.get_mut(&key);
        if pool.is_none() {
            tracing::warn!("No pool registered for {}", key);
        }
        pool
    }

    fn report_rejection(key: PrefabKey, err: reservoir_core::PoolError) -> RegistryError {
        tracing::error!("Pool for {} rejected object: {}", key, err);
        RegistryError::Pool(err)
    }

    fn enqueue_add(&mut self, prefab: &R::Prefab, on_complete: Option<Completion<R>>) {
        let key = prefab.key();
        self.ensure_pool(prefab);
        self.requests.push(Request::Add { key, on_complete });
    }

    fn enqueue_recycle(
        &mut self,
        prefab: &R::Prefab,
        placement: Option<Placement<R>>,
        on_complete: Option<Completion<R>>,
    ) {
        let key = prefab.key();
        self.ensure_pool(prefab);
        self.requests.push(Request::Recycle {
            key,
            placement,
            on_complete,
        });
    }

    fn enqueue_deactivation(
        &mut self,
        prefab: &R::Prefab,
        object: ObjectId,
        on_complete: Option<Completion<R>>,
    ) {
        let key = prefab.key();
        self.ensure_pool(prefab);
        self.requests.push(Request::Deactivate {
            key,
            object,
            on_complete,
        });
    }

    fn enqueue_dispatch(&mut self, prefab: &R::Prefab, on_complete: Option<Completion<R>>) {
        let key = prefab.key();
        self.ensure_pool(prefab);
        self.requests.push(Request::Dispatch { key, on_complete });
    }

    /// Runs one request and its completion. Returns whether it produced an
    /// instance.
    fn execute(&mut self, request: Request<R>) -> bool {
        let (result, on_complete) = match request {
            Request::Add { key, on_complete } => {
                (self.registered_pool(key).and_then(GameObjectPool::add), on_complete)
            }
            Request::Recycle {
                key,
                placement,
                on_complete,
            } => {
                let result = self.registered_pool(key).and_then(|pool| match placement {
                    Some(Placement {
                        position,
                        rotation,
                        pre_hook,
                    }) => pool.recycle_at(position, rotation, |id, object| {
                        if let Some(hook) = pre_hook {
                            hook(id, object);
                        }
                    }),
                    None => pool.recycle(),
                });
                (result, on_complete)
            }
            Request::Deactivate {
                key,
                object,
                on_complete,
            } => {
                let result = match self.deactivate_by_key(key, object) {
                    Ok(()) => Some(object),
                    Err(_) => None,
                };
                (result, on_complete)
            }
            Request::Dispatch { key, on_complete } => (
                self.registered_pool(key).and_then(GameObjectPool::dispatch),
                on_complete,
            ),
        };

        if let Some(on_complete) = on_complete {
            on_complete(self, result);
        }
        result.is_some()
    }
}

impl<R: SceneRuntime> std::fmt::Debug for PoolRegistry<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolRegistry")
            .field("pools", &self.pools.len())
            .field("pending_requests", &self.requests.total())
            .field("ticks", &self.ticks)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::mock::{MockPrefab, MockRuntime};
    use crate::scene::runtime_handle;

    fn registry() -> PoolRegistry<MockRuntime> {
        PoolRegistry::new(runtime_handle(MockRuntime::default()), RegistryConfig::default())
    }

    #[test]
    fn test_create_pool_is_idempotent() {
        let mut registry = registry();
        let prefab = MockPrefab::new(1, "Spark");
        assert!(registry.create_pool(&prefab, &PoolConfig::default()));
        assert!(!registry.create_pool(&prefab, &PoolConfig::bounded(3, 3, Default::default())));
        assert_eq!(registry.pool_count(), 1);
        assert_eq!(registry.pool(prefab.key()).unwrap().count(), 0);
    }

    #[test]
    fn test_create_pool_rejects_invalid_config() {
        let mut registry = registry();
        let prefab = MockPrefab::new(1, "Spark");
        let oversized = PoolConfig::bounded(5, 2, Default::default());

        assert!(!registry.create_pool(&prefab, &oversized));
        assert!(!registry.contains_pool(prefab.key()));
        assert_eq!(registry.runtime().borrow().instantiated(), 0);
    }

    #[test]
    fn test_operations_create_pools_lazily() {
        let mut registry = registry();
        let prefab = MockPrefab::new(9, "Shell");
        assert!(!registry.contains_pool(prefab.key()));

        let id = registry.recycle(&prefab).unwrap();
        assert!(registry.contains_pool(prefab.key()));
        assert!(registry.get(id).is_some());
    }

    #[test]
    fn test_by_key_without_pool() {
        let mut registry = registry();
        let key = PrefabKey(404);
        assert!(registry.recycle_by_key(key).is_none());
        assert!(registry.add_by_key(key).is_none());
        assert!(registry.dispatch_by_key(key).is_none());
        assert!(!registry.contains_pool(key));
    }

    #[test]
    fn test_completion_never_runs_synchronously() {
        let mut registry = registry();
        let prefab = MockPrefab::new(1, "Spark");
        let seen = Rc::new(RefCell::new(Vec::new()));

        let sink = Rc::clone(&seen);
        registry.request_recycle_then(&prefab, move |_, id| sink.borrow_mut().push(id));

        assert!(seen.borrow().is_empty());
        assert_eq!(registry.pending_requests(), 1);

        let report = registry.drain();
        assert_eq!(report.recycled, 1);
        assert_eq!(seen.borrow().len(), 1);
        assert!(seen.borrow()[0].is_some());
        assert_eq!(registry.pending_requests(), 0);
    }

    #[test]
    fn test_remove_pool_fails_pending_requests() {
        let mut registry = registry();
        let prefab = MockPrefab::new(1, "Spark");
        let result = Rc::new(RefCell::new(None));

        let sink = Rc::clone(&result);
        registry.request_add_then(&prefab, move |_, id| *sink.borrow_mut() = Some(id));
        assert!(registry.remove_pool(prefab.key()));

        let report = registry.drain();
        assert_eq!(report.failed, 1);
        assert_eq!(*result.borrow(), Some(None));
    }
}
