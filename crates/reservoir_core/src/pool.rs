//! # Object Pool
//!
//! Bounded pool of reusable instances with FIFO recycling.
//!
//! ## Bookkeeping
//!
//! ```text
//!            ┌─────────── vacant ───────────┐      ┌── occupied ──┐
//! recycle <──│ head  [A] [B] [C]  tail      │<──── │  {D, E}      │ <── recycle
//!            └──────────────────────────────┘ deactivate └──────────────┘
//! ```
//!
//! - `vacant_queue` orders vacant instances by the time they were vacated.
//! - `vacant` mirrors the queue's membership for O(1) lookups.
//! - `occupied` is ordered by handle so eviction picks are reproducible.
//!
//! At all times `occupied ∩ vacant = ∅` and `occupied + vacant <= limit`.

use std::collections::{BTreeSet, HashSet, VecDeque};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::{LimitHandling, PoolConfig};
use crate::error::{PoolError, PoolResult};
use crate::factory::ObjectFactory;
use crate::identity::{ObjectId, PoolId};
use crate::lifecycle::{LifecycleChannel, LifecycleEventKind};
use crate::object::PoolObject;

/// Counters describing what a pool has done since it was created.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Instances created through the factory.
    pub created: u64,
    /// Vacant → Occupied transitions.
    pub recycled: u64,
    /// Occupied → Vacant transitions.
    pub deactivated: u64,
    /// Instances permanently removed by the pool.
    pub destroyed: u64,
    /// Instances that reported their own destruction.
    pub self_destroyed: u64,
    /// Occupied instances stolen by `RecycleRandom`.
    pub evicted: u64,
    /// Requests refused at the limit under `LimitHandling::None`.
    pub exhausted: u64,
}

/// Result of a bulk teardown evaluation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TeardownReport {
    /// Instances destroyed.
    pub destroyed: usize,
    /// Instances kept because they persist across world resets.
    pub kept: usize,
}

impl TeardownReport {
    /// Adds another report's counts into this one.
    pub fn absorb(&mut self, other: Self) {
        self.destroyed += other.destroyed;
        self.kept += other.kept;
    }
}

/// Storage slot.
#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    object: Option<T>,
}

/// A bounded pool of reusable instances.
///
/// # Thread Safety
///
/// This pool is NOT thread-safe. All operations take `&mut self`; keep each
/// pool on the thread that drives it.
///
/// # Example
///
/// ```rust,ignore
/// let mut pool = ObjectPool::new(CloneFactory::new(Spark::default()), &PoolConfig::default());
///
/// let a = pool.recycle().expect("unbounded");
/// pool.deactivate(a)?;
/// assert_eq!(pool.recycle(), Some(a)); // same instance reused
/// ```
pub struct ObjectPool<F: ObjectFactory> {
    id: PoolId,
    factory: F,
    slots: Vec<Slot<F::Object>>,
    free_slots: Vec<u32>,
    occupied: BTreeSet<ObjectId>,
    vacant: HashSet<ObjectId>,
    vacant_queue: VecDeque<ObjectId>,
    limit: Option<usize>,
    limit_handling: LimitHandling,
    rng: ChaCha8Rng,
    lifecycle: LifecycleChannel,
    stats: PoolStats,
}

impl<F: ObjectFactory> ObjectPool<F> {
    /// Creates a pool and seeds it with `config.initial_size` vacant instances.
    #[must_use]
    pub fn new(factory: F, config: &PoolConfig) -> Self {
        let mut pool = Self {
            id: PoolId::next(),
            factory,
            slots: Vec::with_capacity(config.initial_size),
            free_slots: Vec::new(),
            occupied: BTreeSet::new(),
            vacant: HashSet::with_capacity(config.initial_size),
            vacant_queue: VecDeque::with_capacity(config.initial_size),
            limit: config.limit,
            limit_handling: config.limit_handling,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            lifecycle: LifecycleChannel::new(),
            stats: PoolStats::default(),
        };
        pool.initialize(config.initial_size);
        tracing::debug!(
            "Pool {} created: {} vacant, limit {:?}, {:?}",
            pool.id,
            pool.vacant_count(),
            pool.limit,
            pool.limit_handling
        );
        pool
    }

    // =========================================================================
    // Core operations
    // =========================================================================

    /// Resets the pool and creates `size` vacant instances.
    ///
    /// Instances the pool already holds are destroyed through the factory
    /// first. Creation stops early if the factory yields nothing or the limit
    /// refuses more.
    pub fn initialize(&mut self, size: usize) {
        self.clear();
        for _ in 0..size {
            if self.is_at_limit() || self.create_vacant().is_none() {
                break;
            }
        }
    }

    /// Creates one vacant instance.
    ///
    /// At the limit the [`LimitHandling`] policy decides: `None` yields no
    /// instance, `RecycleRandom` evicts an occupied instance into the vacant
    /// queue and returns it.
    pub fn add(&mut self) -> Option<ObjectId> {
        self.process_events();
        let id = if self.is_at_limit() {
            self.handle_limit(false)
        } else {
            self.create_vacant()
        };
        debug_assert!(self.check_invariants());
        id
    }

    /// Hands out the oldest vacant instance, creating one if none is vacant.
    ///
    /// Returns `None` only when the pool is full and the policy refuses.
    pub fn recycle(&mut self) -> Option<ObjectId> {
        self.recycle_with(|_, _| {})
    }

    /// Like [`recycle`](Self::recycle), running `prepare` on the instance
    /// after it becomes occupied and before its recycled hook fires.
    pub fn recycle_with<P>(&mut self, prepare: P) -> Option<ObjectId>
    where
        P: FnOnce(ObjectId, &mut F::Object),
    {
        self.process_events();

        let id = match self.pop_vacant() {
            Some(id) => id,
            None if self.is_at_limit() => self.handle_limit(true)?,
            None => self.create()?,
        };

        self.occupied.insert(id);
        let Some(object) = self.object_mut(id) else {
            self.occupied.remove(&id);
            return None;
        };
        prepare(id, object);
        object.set_active(true);
        object.on_object_recycled();
        self.stats.recycled += 1;

        debug_assert!(self.check_invariants());
        Some(id)
    }

    /// Returns an instance to the tail of the vacant queue.
    ///
    /// Deactivating an instance that is already vacant only clears its active
    /// flag again.
    ///
    /// # Errors
    ///
    /// - [`PoolError::ForeignObject`] if `id` was minted by another pool
    /// - [`PoolError::UnknownObject`] if `id` no longer names a live instance
    ///
    /// In both cases nothing is changed.
    pub fn deactivate(&mut self, id: ObjectId) -> PoolResult<()> {
        self.process_events();
        self.check_owned(id)?;
        self.deactivate_owned(id);
        debug_assert!(self.check_invariants());
        Ok(())
    }

    /// Permanently removes one instance.
    ///
    /// The oldest vacant instance is preferred; if none is vacant an occupied
    /// one is taken. Returns the removed handle, or `None` if the pool is empty.
    pub fn dispatch(&mut self) -> Option<ObjectId> {
        self.process_events();
        let id = match self.pop_vacant() {
            Some(id) => id,
            None => self.occupied.first().copied()?,
        };
        self.destroy_owned(id);
        debug_assert!(self.check_invariants());
        Some(id)
    }

    /// Permanently removes a specific instance, vacant or occupied.
    ///
    /// # Errors
    ///
    /// Same as [`deactivate`](Self::deactivate).
    pub fn dispatch_object(&mut self, id: ObjectId) -> PoolResult<()> {
        self.process_events();
        self.check_owned(id)?;
        self.destroy_owned(id);
        debug_assert!(self.check_invariants());
        Ok(())
    }

    /// Applies lifecycle events the instances reported since the last call.
    ///
    /// Returns the number of events applied.
    pub fn process_events(&mut self) -> usize {
        let mut applied = 0;
        while let Some(event) = self.lifecycle.next_event() {
            match event.kind {
                LifecycleEventKind::Deactivated => {
                    if self.occupied.contains(&event.object) {
                        self.deactivate_owned(event.object);
                    }
                }
                LifecycleEventKind::Destroyed => self.forget(event.object),
            }
            applied += 1;
        }
        applied
    }

    /// Destroys every instance that does not persist across world resets.
    ///
    /// Persisting instances keep their current vacant/occupied state.
    pub fn release_non_persistent(&mut self) -> TeardownReport {
        self.process_events();
        let mut report = TeardownReport::default();
        for id in self.ids() {
            let persists = self
                .get(id)
                .is_some_and(PoolObject::dont_destroy_on_load);
            if persists {
                report.kept += 1;
            } else {
                self.destroy_owned(id);
                report.destroyed += 1;
            }
        }
        debug_assert!(self.check_invariants());
        report
    }

    /// Destroys every instance and resets all bookkeeping.
    pub fn clear(&mut self) {
        for id in self.ids() {
            self.destroy_owned(id);
        }
        self.occupied.clear();
        self.vacant.clear();
        self.vacant_queue.clear();
        self.lifecycle.clear();
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Returns this pool's identifier.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> PoolId {
        self.id
    }

    /// Number of live instances (vacant + occupied).
    #[inline]
    #[must_use]
    pub fn count(&self) -> usize {
        self.occupied.len() + self.vacant.len()
    }

    /// Number of instances in use.
    #[inline]
    #[must_use]
    pub fn occupied_count(&self) -> usize {
        self.occupied.len()
    }

    /// Number of instances waiting to be recycled.
    #[inline]
    #[must_use]
    pub fn vacant_count(&self) -> usize {
        self.vacant.len()
    }

    /// Maximum number of live instances, `None` if unbounded.
    #[inline]
    #[must_use]
    pub const fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Returns the limit policy.
    #[inline]
    #[must_use]
    pub const fn limit_handling(&self) -> LimitHandling {
        self.limit_handling
    }

    /// Changes the limit policy.
    pub fn set_limit_handling(&mut self, limit_handling: LimitHandling) {
        self.limit_handling = limit_handling;
    }

    /// Returns true if no more instances can be created.
    #[inline]
    #[must_use]
    pub fn is_at_limit(&self) -> bool {
        self.limit.is_some_and(|limit| self.count() >= limit)
    }

    /// Returns true if `id` names a live instance of this pool.
    #[must_use]
    pub fn contains(&self, id: ObjectId) -> bool {
        self.get(id).is_some()
    }

    /// Returns true if `id` is currently handed out.
    #[must_use]
    pub fn is_occupied(&self, id: ObjectId) -> bool {
        self.occupied.contains(&id)
    }

    /// Returns true if `id` is waiting in the vacant queue.
    #[must_use]
    pub fn is_vacant(&self, id: ObjectId) -> bool {
        self.vacant.contains(&id)
    }

    /// Gets a live instance.
    #[must_use]
    pub fn get(&self, id: ObjectId) -> Option<&F::Object> {
        if id.pool() != self.id {
            return None;
        }
        let slot = self.slots.get(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.object.as_ref()
    }

    /// Gets a live instance mutably.
    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut F::Object> {
        self.object_mut(id)
    }

    /// Iterates over every live instance.
    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &F::Object)> {
        let pool = self.id;
        self.slots.iter().enumerate().filter_map(move |(index, slot)| {
            slot.object
                .as_ref()
                .map(|object| (ObjectId::new(pool, index as u32, slot.generation), object))
        })
    }

    /// Handles of every live instance, in slot order.
    #[must_use]
    pub fn ids(&self) -> Vec<ObjectId> {
        self.iter().map(|(id, _)| id).collect()
    }

    /// Handles of the occupied instances.
    pub fn occupied_ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.occupied.iter().copied()
    }

    /// Handles of the vacant instances, next to be recycled first.
    pub fn vacant_ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.vacant_queue.iter().copied()
    }

    /// Returns the usage counters.
    #[inline]
    #[must_use]
    pub const fn stats(&self) -> PoolStats {
        self.stats
    }

    /// Returns the factory.
    #[inline]
    #[must_use]
    pub const fn factory(&self) -> &F {
        &self.factory
    }

    /// Returns the factory mutably.
    #[inline]
    pub fn factory_mut(&mut self) -> &mut F {
        &mut self.factory
    }

    /// Verifies the bookkeeping.
    ///
    /// Checks the vacant/occupied partition, that the vacant set and queue
    /// hold the same instances, that every classified instance is live and
    /// subscribed, and the capacity limit.
    #[must_use]
    pub fn check_invariants(&self) -> bool {
        let disjoint = self.vacant.iter().all(|id| !self.occupied.contains(id));
        let queue_matches = self.vacant_queue.len() == self.vacant.len()
            && self.vacant_queue.iter().all(|id| self.vacant.contains(id));
        let classified_live = self
            .occupied
            .iter()
            .chain(self.vacant.iter())
            .all(|&id| self.contains(id) && self.lifecycle.is_subscribed(id));
        let live = self.slots.iter().filter(|slot| slot.object.is_some()).count();
        let within_limit = self.limit.map_or(true, |limit| self.count() <= limit);

        disjoint
            && queue_matches
            && classified_live
            && live == self.count()
            && self.lifecycle.subscription_count() == live
            && within_limit
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn object_mut(&mut self, id: ObjectId) -> Option<&mut F::Object> {
        if id.pool() != self.id {
            return None;
        }
        let slot = self.slots.get_mut(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.object.as_mut()
    }

    fn check_owned(&self, id: ObjectId) -> PoolResult<()> {
        if id.pool() != self.id {
            return Err(PoolError::ForeignObject {
                object: id,
                pool: self.id,
            });
        }
        if !self.contains(id) {
            return Err(PoolError::UnknownObject(id));
        }
        Ok(())
    }

    /// Builds a new instance in a fresh slot. It is in neither set yet.
    fn create(&mut self) -> Option<ObjectId> {
        let mut object = self.factory.create_object()?;

        let id = match self.free_slots.pop() {
            Some(index) => ObjectId::new(self.id, index, self.slots[index as usize].generation),
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    object: None,
                });
                ObjectId::new(self.id, (self.slots.len() - 1) as u32, 0)
            }
        };

        object.bind_lifecycle(self.lifecycle.subscribe(id));
        object.on_object_creation();
        self.factory.on_object_created(id, &mut object);
        object.set_active(false);

        self.slots[id.index() as usize].object = Some(object);
        self.stats.created += 1;
        Some(id)
    }

    fn create_vacant(&mut self) -> Option<ObjectId> {
        let id = self.create()?;
        self.push_vacant(id);
        Some(id)
    }

    /// Applies the limit policy. With `occupy`, the result is left out of the
    /// vacant queue for the caller to occupy.
    fn handle_limit(&mut self, occupy: bool) -> Option<ObjectId> {
        match self.limit_handling {
            LimitHandling::None => {
                self.stats.exhausted += 1;
                tracing::debug!(
                    "Pool {} exhausted at limit {:?}",
                    self.id,
                    self.limit
                );
                None
            }
            LimitHandling::RecycleRandom => {
                let Some(victim) = self.pick_random_occupied() else {
                    // Nothing in use: the oldest vacant instance is the answer.
                    return if occupy {
                        self.pop_vacant()
                    } else {
                        self.vacant_queue.front().copied()
                    };
                };
                self.occupied.remove(&victim);
                self.stats.evicted += 1;
                tracing::warn!(
                    "Pool {} at limit {:?}: evicting occupied object {}",
                    self.id,
                    self.limit,
                    victim
                );
                if !occupy {
                    self.push_vacant(victim);
                    if let Some(object) = self.object_mut(victim) {
                        object.set_active(false);
                    }
                }
                Some(victim)
            }
        }
    }

    fn pick_random_occupied(&mut self) -> Option<ObjectId> {
        let len = self.occupied.len();
        if len == 0 {
            return None;
        }
        let pick = self.rng.gen_range(0..len);
        self.occupied.iter().nth(pick).copied()
    }

    fn push_vacant(&mut self, id: ObjectId) {
        if self.vacant.insert(id) {
            self.vacant_queue.push_back(id);
        }
    }

    fn pop_vacant(&mut self) -> Option<ObjectId> {
        let id = self.vacant_queue.pop_front()?;
        self.vacant.remove(&id);
        Some(id)
    }

    fn remove_vacant(&mut self, id: ObjectId) {
        if self.vacant.remove(&id) {
            self.vacant_queue.retain(|&queued| queued != id);
        }
    }

    fn deactivate_owned(&mut self, id: ObjectId) {
        let was_occupied = self.occupied.remove(&id);
        self.push_vacant(id);
        if was_occupied {
            self.stats.deactivated += 1;
        }
        if let Some(object) = self.object_mut(id) {
            if was_occupied {
                object.on_object_deactivation();
            }
            object.set_active(false);
        }
    }

    /// Removes `id` from bookkeeping and frees its slot.
    fn release(&mut self, id: ObjectId) -> Option<F::Object> {
        self.occupied.remove(&id);
        self.remove_vacant(id);
        self.lifecycle.unsubscribe(id);

        let slot = self.slots.get_mut(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        let object = slot.object.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_slots.push(id.index());
        Some(object)
    }

    fn destroy_owned(&mut self, id: ObjectId) {
        if let Some(mut object) = self.release(id) {
            object.on_object_destruction();
            object.set_active(false);
            self.factory.destroy_object(object);
            self.stats.destroyed += 1;
        }
    }

    /// The instance ended itself. Its destruction hook is not fired again,
    /// but the factory still tears it down.
    fn forget(&mut self, id: ObjectId) {
        if let Some(mut object) = self.release(id) {
            object.set_active(false);
            self.factory.destroy_object(object);
            self.stats.self_destroyed += 1;
        }
    }
}

impl<F: ObjectFactory> std::fmt::Debug for ObjectPool<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectPool")
            .field("id", &self.id)
            .field("occupied", &self.occupied.len())
            .field("vacant", &self.vacant.len())
            .field("limit", &self.limit)
            .field("limit_handling", &self.limit_handling)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
