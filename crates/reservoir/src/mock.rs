//! # Mock Scene Runtime
//!
//! An in-memory [`SceneRuntime`] that records every primitive call.
//! Used by the crate's tests and benches, and handy for exercising pooling
//! logic without an engine.

use std::collections::HashMap;

use reservoir_core::{LifecycleEmitter, PoolObject, Quat, Vec3};

use crate::scene::{GroupId, Prefab, PrefabKey, SceneObject, SceneRuntime, CLONE_SUFFIX};

/// A named template.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MockPrefab {
    key: PrefabKey,
    name: String,
}

impl MockPrefab {
    /// Creates a prefab with the given key and name.
    #[must_use]
    pub fn new(key: u64, name: &str) -> Self {
        Self {
            key: PrefabKey(key),
            name: name.to_owned(),
        }
    }
}

impl Prefab for MockPrefab {
    fn key(&self) -> PrefabKey {
        self.key
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// A hook or marker observed by a [`MockObject`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MockHook {
    /// `on_object_creation`.
    Created,
    /// `on_object_recycled`, with the position at that moment.
    Recycled(Vec3),
    /// `on_object_deactivation`.
    Deactivated,
    /// `on_object_destruction`.
    Destroyed,
    /// A caller-supplied marker.
    Marked(&'static str),
}

/// A scene object that records its hooks.
#[derive(Debug)]
pub struct MockObject {
    serial: u64,
    prefab: PrefabKey,
    name: String,
    parent: Option<GroupId>,
    position: Vec3,
    rotation: Quat,
    active: bool,
    persistent: bool,
    emitter: Option<LifecycleEmitter>,
    hooks: Vec<MockHook>,
}

impl MockObject {
    /// Unique serial assigned by the runtime.
    #[must_use]
    pub fn serial(&self) -> u64 {
        self.serial
    }

    /// Key of the prefab this object was instantiated from.
    #[must_use]
    pub fn prefab(&self) -> PrefabKey {
        self.prefab
    }

    /// Current parent group.
    #[must_use]
    pub fn parent(&self) -> Option<GroupId> {
        self.parent
    }

    /// Current position.
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Current rotation.
    #[must_use]
    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    /// Hooks observed so far, oldest first.
    #[must_use]
    pub fn hooks(&self) -> &[MockHook] {
        &self.hooks
    }

    /// Number of times `hook` was observed.
    #[must_use]
    pub fn count_hook(&self, hook: MockHook) -> usize {
        self.hooks.iter().filter(|&&seen| seen == hook).count()
    }

    /// Records a caller-supplied marker.
    pub fn mark(&mut self, label: &'static str) {
        self.hooks.push(MockHook::Marked(label));
    }

    /// Flags the object to survive world-lifecycle teardown.
    pub fn set_persistent(&mut self, persistent: bool) {
        self.persistent = persistent;
    }

    /// Reports, as the object itself, that it is done.
    pub fn finish(&self) {
        if let Some(emitter) = &self.emitter {
            emitter.deactivated();
        }
    }

    /// Reports, as the object itself, that it was destroyed.
    pub fn self_destruct(&self) {
        if let Some(emitter) = &self.emitter {
            emitter.destroyed();
        }
    }
}

impl PoolObject for MockObject {
    fn on_object_creation(&mut self) {
        self.hooks.push(MockHook::Created);
    }

    fn on_object_recycled(&mut self) {
        self.hooks.push(MockHook::Recycled(self.position));
    }

    fn on_object_deactivation(&mut self) {
        self.hooks.push(MockHook::Deactivated);
    }

    fn on_object_destruction(&mut self) {
        self.hooks.push(MockHook::Destroyed);
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    fn dont_destroy_on_load(&self) -> bool {
        self.persistent
    }

    fn bind_lifecycle(&mut self, emitter: LifecycleEmitter) {
        self.emitter = Some(emitter);
    }
}

impl SceneObject for MockObject {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }

    fn set_parent(&mut self, group: GroupId) {
        self.parent = Some(group);
    }

    fn set_placement(&mut self, position: Vec3, rotation: Quat) {
        self.position = position;
        self.rotation = rotation;
    }
}

/// Runtime that keeps everything in memory.
#[derive(Debug, Default)]
pub struct MockRuntime {
    next_serial: u64,
    next_group: u64,
    instantiated: usize,
    destroyed: Vec<(u64, Vec<MockHook>)>,
    groups: HashMap<GroupId, String>,
    destroyed_groups: Vec<GroupId>,
    refuse_instantiation: bool,
}

impl MockRuntime {
    /// Makes every later `instantiate` call fail (or succeed again).
    pub fn set_refuse_instantiation(&mut self, refuse: bool) {
        self.refuse_instantiation = refuse;
    }

    /// Number of objects instantiated.
    #[must_use]
    pub fn instantiated(&self) -> usize {
        self.instantiated
    }

    /// Serials and final hook logs of destroyed objects, in destruction order.
    #[must_use]
    pub fn destroyed(&self) -> &[(u64, Vec<MockHook>)] {
        &self.destroyed
    }

    /// Returns true if the object with `serial` was destroyed.
    #[must_use]
    pub fn was_destroyed(&self, serial: u64) -> bool {
        self.destroyed.iter().any(|(seen, _)| *seen == serial)
    }

    /// Objects instantiated and not yet destroyed.
    #[must_use]
    pub fn live_objects(&self) -> usize {
        self.instantiated - self.destroyed.len()
    }

    /// Groups created and not yet destroyed.
    #[must_use]
    pub fn live_groups(&self) -> usize {
        self.groups.len()
    }

    /// Name of a live group.
    #[must_use]
    pub fn group_name(&self, group: GroupId) -> Option<&str> {
        self.groups.get(&group).map(String::as_str)
    }

    /// Groups destroyed so far.
    #[must_use]
    pub fn destroyed_groups(&self) -> &[GroupId] {
        &self.destroyed_groups
    }
}

impl SceneRuntime for MockRuntime {
    type Prefab = MockPrefab;
    type Object = MockObject;

    fn instantiate(&mut self, prefab: &MockPrefab) -> Option<MockObject> {
        if self.refuse_instantiation {
            return None;
        }
        self.next_serial += 1;
        self.instantiated += 1;
        Some(MockObject {
            serial: self.next_serial,
            prefab: prefab.key(),
            name: format!("{}{}", prefab.name(), CLONE_SUFFIX),
            parent: None,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            active: true,
            persistent: false,
            emitter: None,
            hooks: Vec::new(),
        })
    }

    fn destroy(&mut self, object: MockObject) {
        self.destroyed.push((object.serial, object.hooks));
    }

    fn create_group(&mut self, name: &str) -> GroupId {
        self.next_group += 1;
        let group = GroupId(self.next_group);
        self.groups.insert(group, name.to_owned());
        group
    }

    fn destroy_group(&mut self, group: GroupId) {
        if self.groups.remove(&group).is_some() {
            self.destroyed_groups.push(group);
        }
    }
}
