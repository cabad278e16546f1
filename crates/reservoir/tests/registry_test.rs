//! Integration tests for the pool registry: deferred queues, teardown and world events.

use std::cell::RefCell;
use std::rc::Rc;

use reservoir::mock::{MockHook, MockPrefab, MockRuntime};
use reservoir::{
    runtime_handle, ObjectId, PoolConfig, PoolRegistry, Prefab, Quat, RegistryConfig,
    RegistryError, RequestKind, RuntimeHandle, TeardownReport, Vec3, WorldEvent,
};

type Log = Rc<RefCell<Vec<(&'static str, Option<ObjectId>)>>>;

fn setup(config: RegistryConfig) -> (RuntimeHandle<MockRuntime>, PoolRegistry<MockRuntime>) {
    let runtime = runtime_handle(MockRuntime::default());
    let registry = PoolRegistry::new(Rc::clone(&runtime), config);
    (runtime, registry)
}

fn log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

#[test]
fn test_add_queue_drains_before_recycle_queue() {
    let (_runtime, mut registry) = setup(RegistryConfig::default());
    let prefab = MockPrefab::new(1, "Bullet");
    let seen = log();

    // Enqueued first, but recycle runs after add.
    let sink = Rc::clone(&seen);
    registry.request_recycle_then(&prefab, move |_, id| sink.borrow_mut().push(("recycle", id)));
    let sink = Rc::clone(&seen);
    registry.request_add_then(&prefab, move |_, id| sink.borrow_mut().push(("add", id)));

    assert!(seen.borrow().is_empty());
    assert_eq!(registry.pending(RequestKind::Add), 1);
    assert_eq!(registry.pending(RequestKind::Recycle), 1);

    let report = registry.drain();
    assert_eq!(report.executed(), 2);
    assert_eq!(report.failed, 0);

    let seen = seen.borrow();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].0, "add");
    assert_eq!(seen[1].0, "recycle");
    // The recycle reused the instance the add just created.
    assert_eq!(seen[0].1, seen[1].1);
}

#[test]
fn test_queue_order_across_all_kinds() {
    let (_runtime, mut registry) = setup(RegistryConfig::default());
    let prefab = MockPrefab::new(1, "Bullet");
    let held = registry.recycle(&prefab).unwrap();
    let seen = log();

    let sink = Rc::clone(&seen);
    registry.request_dispatch_then(&prefab, move |_, id| sink.borrow_mut().push(("dispatch", id)));
    let sink = Rc::clone(&seen);
    registry.request_deactivation_then(&prefab, held, move |_, id| {
        sink.borrow_mut().push(("deactivate", id));
    });
    let sink = Rc::clone(&seen);
    registry.request_recycle_then(&prefab, move |_, id| sink.borrow_mut().push(("recycle", id)));
    let sink = Rc::clone(&seen);
    registry.request_add_then(&prefab, move |_, id| sink.borrow_mut().push(("add", id)));

    registry.drain();

    let order: Vec<_> = seen.borrow().iter().map(|(kind, _)| *kind).collect();
    assert_eq!(order, vec!["add", "recycle", "deactivate", "dispatch"]);
    assert_eq!(seen.borrow()[2].1, Some(held));
}

#[test]
fn test_enqueue_into_drained_queue_waits_for_next_tick() {
    let (_runtime, mut registry) = setup(RegistryConfig::default());
    let prefab = MockPrefab::new(1, "Bullet");
    let seen = log();

    let inner_sink = Rc::clone(&seen);
    let inner_prefab = prefab.clone();
    registry.request_recycle_then(&prefab, move |registry, _| {
        let sink = Rc::clone(&inner_sink);
        registry.request_add_then(&inner_prefab, move |_, id| sink.borrow_mut().push(("add", id)));
    });

    let first = registry.drain();
    assert_eq!(first.recycled, 1);
    assert_eq!(first.added, 0);
    assert!(seen.borrow().is_empty());
    assert_eq!(registry.pending(RequestKind::Add), 1);

    let second = registry.drain();
    assert_eq!(second.tick, 1);
    assert_eq!(second.added, 1);
    assert_eq!(seen.borrow().len(), 1);
}

#[test]
fn test_enqueue_into_later_queue_runs_same_tick() {
    let (runtime, mut registry) = setup(RegistryConfig::default());
    let prefab = MockPrefab::new(1, "Bullet");
    let seen = log();

    let sink = Rc::clone(&seen);
    let inner_prefab = prefab.clone();
    registry.request_recycle_then(&prefab, move |registry, id| {
        let id = id.unwrap();
        let sink = Rc::clone(&sink);
        registry.request_deactivation_then(&inner_prefab, id, move |_, id| {
            sink.borrow_mut().push(("deactivate", id));
        });
    });

    let report = registry.drain();
    assert_eq!(report.recycled, 1);
    assert_eq!(report.deactivated, 1);
    assert_eq!(seen.borrow().len(), 1);
    assert_eq!(registry.pending_requests(), 0);

    let pool = registry.pool(prefab.key()).unwrap();
    assert_eq!(pool.vacant_count(), 1);
    assert_eq!(pool.occupied_count(), 0);
    assert_eq!(runtime.borrow().instantiated(), 1);
}

#[test]
fn test_bulk_teardown_keeps_persistent_instances() {
    let (runtime, mut registry) = setup(RegistryConfig::default());
    let prefab = MockPrefab::new(1, "Bullet");

    let a = registry.recycle(&prefab).unwrap();
    let b = registry.recycle(&prefab).unwrap();
    let keeper = registry.recycle(&prefab).unwrap();
    registry.get_mut(keeper).unwrap().set_persistent(true);
    registry.deactivate(&prefab, b).unwrap();

    let group = registry.pool(prefab.key()).unwrap().group().unwrap();
    let report = registry.on_world_event(WorldEvent::Unloaded).unwrap();

    assert_eq!(
        report,
        TeardownReport {
            destroyed: 2,
            kept: 1
        }
    );
    assert!(registry.get(a).is_none());
    assert!(registry.get(b).is_none());
    assert!(registry.get(keeper).is_some());

    let pool = registry.pool(prefab.key()).unwrap();
    assert_eq!(pool.count(), 1);
    assert_eq!(pool.occupied_count(), 1);

    let runtime = runtime.borrow();
    assert_eq!(runtime.live_objects(), 1);
    assert_eq!(runtime.group_name(group), Some("Bullet Pool"));
    for (_, hooks) in runtime.destroyed() {
        assert_eq!(hooks.last(), Some(&MockHook::Destroyed));
    }
}

#[test]
fn test_teardown_without_survivors_destroys_group() {
    let (runtime, mut registry) = setup(RegistryConfig::default());
    let prefab = MockPrefab::new(1, "Bullet");
    registry.recycle(&prefab).unwrap();
    registry.add(&prefab).unwrap();

    let report = registry.evaluate_all();
    assert_eq!(report.destroyed, 2);
    assert_eq!(report.kept, 0);

    let runtime = runtime.borrow();
    assert_eq!(runtime.live_objects(), 0);
    assert_eq!(runtime.live_groups(), 0);
    assert_eq!(runtime.destroyed_groups().len(), 1);
}

#[test]
fn test_world_event_toggles() {
    let (_runtime, mut registry) = setup(RegistryConfig {
        evaluate_on_world_unloaded: false,
        evaluate_on_active_world_changed: true,
        ..RegistryConfig::default()
    });
    let prefab = MockPrefab::new(1, "Bullet");
    let id = registry.recycle(&prefab).unwrap();

    assert!(registry.on_world_event(WorldEvent::Unloaded).is_none());
    assert!(registry.on_world_event(WorldEvent::Loaded).is_none());
    assert!(registry.get(id).is_some());

    let report = registry.on_world_event(WorldEvent::ActiveChanged).unwrap();
    assert_eq!(report.destroyed, 1);
    assert!(registry.get(id).is_none());
}

#[test]
fn test_duplicate_create_pool_is_noop() {
    let (_runtime, mut registry) = setup(RegistryConfig::default());
    let prefab = MockPrefab::new(3, "Crate");

    assert!(registry.create_pool(&prefab, &PoolConfig::bounded(2, 4, Default::default())));
    let id = registry.pool(prefab.key()).unwrap().id();

    assert!(!registry.create_pool(&prefab, &PoolConfig::default()));
    let pool = registry.pool(prefab.key()).unwrap();
    assert_eq!(pool.id(), id);
    assert_eq!(pool.count(), 2);
    assert_eq!(pool.limit(), Some(4));
}

#[test]
fn test_mismatched_deactivate_is_rejected() {
    let (_runtime, mut registry) = setup(RegistryConfig::default());
    let bullet = MockPrefab::new(1, "Bullet");
    let crate_prefab = MockPrefab::new(2, "Crate");

    let id = registry.recycle(&bullet).unwrap();
    registry.recycle(&crate_prefab).unwrap();

    let err = registry.deactivate(&crate_prefab, id).unwrap_err();
    assert!(matches!(err, RegistryError::Pool(_)));

    let bullets = registry.pool(bullet.key()).unwrap();
    assert_eq!(bullets.occupied_count(), 1);
    let crates = registry.pool(crate_prefab.key()).unwrap();
    assert_eq!(crates.occupied_count(), 1);
    assert_eq!(crates.vacant_count(), 0);
    assert_eq!(registry.get(id).unwrap().count_hook(MockHook::Deactivated), 0);
}

#[test]
fn test_deactivate_by_key_without_pool() {
    let (_runtime, mut registry) = setup(RegistryConfig::default());
    let prefab = MockPrefab::new(1, "Bullet");
    let id = registry.recycle(&prefab).unwrap();

    let err = registry.deactivate_by_key(reservoir::PrefabKey(77), id).unwrap_err();
    assert!(matches!(err, RegistryError::NoSuchPool(_)));
    assert!(registry.pool(prefab.key()).unwrap().pool().is_occupied(id));
}

#[test]
fn test_request_recycle_at_places_before_hooks() {
    let (_runtime, mut registry) = setup(RegistryConfig::default());
    let prefab = MockPrefab::new(1, "Bullet");
    let target = Vec3::new(1.0, 2.0, 3.0);
    let result = Rc::new(RefCell::new(None));

    let sink = Rc::clone(&result);
    registry.request_recycle_at(
        &prefab,
        target,
        Quat::from_rotation_y(0.5),
        Some(|_: ObjectId, object: &mut reservoir::mock::MockObject| object.mark("pre_hook")),
        move |registry, id| {
            let id = id.unwrap();
            let object = registry.get(id).unwrap();
            *sink.borrow_mut() = Some((object.position(), object.hooks().to_vec()));
        },
    );
    registry.drain();

    let (position, hooks) = result.borrow_mut().take().unwrap();
    assert_eq!(position, target);
    assert_eq!(
        hooks,
        vec![
            MockHook::Created,
            MockHook::Marked("pre_hook"),
            MockHook::Recycled(target)
        ]
    );
}

#[test]
fn test_self_reported_deactivation_applied_at_drain() {
    let (_runtime, mut registry) = setup(RegistryConfig::default());
    let prefab = MockPrefab::new(1, "Bullet");
    let id = registry.recycle(&prefab).unwrap();

    registry.get(id).unwrap().finish();
    let report = registry.drain();

    assert_eq!(report.lifecycle_events, 1);
    let pool = registry.pool(prefab.key()).unwrap();
    assert!(pool.pool().is_vacant(id));
}

#[test]
fn test_self_destructed_object_is_returned_to_runtime() {
    let (runtime, mut registry) = setup(RegistryConfig::default());
    let prefab = MockPrefab::new(1, "Bullet");
    let id = registry.recycle(&prefab).unwrap();
    let serial = registry.get(id).unwrap().serial();

    registry.get(id).unwrap().self_destruct();
    let report = registry.drain();

    assert_eq!(report.lifecycle_events, 1);
    assert!(registry.get(id).is_none());
    assert_eq!(registry.pool(prefab.key()).unwrap().stats().self_destroyed, 1);

    let runtime = runtime.borrow();
    assert!(runtime.was_destroyed(serial));
    assert_eq!(runtime.live_objects(), 0);
}

#[test]
fn test_shutdown_destroys_everything() {
    let (runtime, mut registry) = setup(RegistryConfig::default());
    let bullet = MockPrefab::new(1, "Bullet");
    let crate_prefab = MockPrefab::new(2, "Crate");
    registry.recycle(&bullet).unwrap();
    registry.add(&crate_prefab).unwrap();

    let ran = Rc::new(RefCell::new(false));
    let flag = Rc::clone(&ran);
    registry.request_add_then(&bullet, move |_, _| *flag.borrow_mut() = true);

    registry.shutdown();

    assert!(!*ran.borrow());
    let runtime = runtime.borrow();
    assert_eq!(runtime.live_objects(), 0);
    assert_eq!(runtime.live_groups(), 0);
}
