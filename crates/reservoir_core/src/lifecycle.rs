//! # Lifecycle Events
//!
//! Instances report their own lifecycle changes back to their pool:
//!
//! ```text
//! ┌──────────────┐  LifecycleEmitter   ┌──────────────┐
//! │   Instance   │────────────────────>│  ObjectPool  │
//! │ (self-ends)  │  Deactivated |      │ (subscriber) │
//! └──────────────┘  Destroyed          └──────────────┘
//! ```
//!
//! The pool owns the receiving end and one subscription per instance.
//! Events are applied the next time the pool is touched, so an instance can
//! report from inside its own update without borrowing the pool.

use std::collections::HashSet;

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::identity::ObjectId;

/// Kind of self-reported lifecycle change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LifecycleEventKind {
    /// The instance finished its work and wants to go back to vacant.
    Deactivated,
    /// The instance ended itself and should be torn down without its hook.
    Destroyed,
}

/// A lifecycle change reported by an instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LifecycleEvent {
    /// Instance that emitted the event.
    pub object: ObjectId,
    /// What happened.
    pub kind: LifecycleEventKind,
}

/// Sending half of an instance's subscription.
///
/// Emitting never blocks. If the pool is gone the event is dropped.
#[derive(Clone, Debug)]
pub struct LifecycleEmitter {
    object: ObjectId,
    sender: Sender<LifecycleEvent>,
}

impl LifecycleEmitter {
    /// Returns the instance this emitter speaks for.
    #[inline]
    #[must_use]
    pub const fn object(&self) -> ObjectId {
        self.object
    }

    /// Reports that the instance is done and should become vacant.
    pub fn deactivated(&self) {
        self.emit(LifecycleEventKind::Deactivated);
    }

    /// Reports that the instance ended itself and should be torn down.
    pub fn destroyed(&self) {
        self.emit(LifecycleEventKind::Destroyed);
    }

    fn emit(&self, kind: LifecycleEventKind) {
        let _ = self.sender.send(LifecycleEvent {
            object: self.object,
            kind,
        });
    }
}

/// Receiving half, owned by a pool.
#[derive(Debug)]
pub(crate) struct LifecycleChannel {
    sender: Sender<LifecycleEvent>,
    receiver: Receiver<LifecycleEvent>,
    subscriptions: HashSet<ObjectId>,
}

impl LifecycleChannel {
    pub(crate) fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self {
            sender,
            receiver,
            subscriptions: HashSet::new(),
        }
    }

    /// Registers `object` and returns its emitter.
    pub(crate) fn subscribe(&mut self, object: ObjectId) -> LifecycleEmitter {
        self.subscriptions.insert(object);
        LifecycleEmitter {
            object,
            sender: self.sender.clone(),
        }
    }

    /// Returns true if `object` was subscribed.
    pub(crate) fn unsubscribe(&mut self, object: ObjectId) -> bool {
        self.subscriptions.remove(&object)
    }

    pub(crate) fn is_subscribed(&self, object: ObjectId) -> bool {
        self.subscriptions.contains(&object)
    }

    pub(crate) fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Next pending event from a still-subscribed instance.
    pub(crate) fn next_event(&self) -> Option<LifecycleEvent> {
        loop {
            let event = self.receiver.try_recv().ok()?;
            if self.subscriptions.contains(&event.object) {
                return Some(event);
            }
        }
    }

    pub(crate) fn clear(&mut self) {
        self.subscriptions.clear();
        while self.receiver.try_recv().is_ok() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::PoolId;

    #[test]
    fn test_events_from_subscribed_objects() {
        let pool = PoolId::next();
        let mut channel = LifecycleChannel::new();
        let a = ObjectId::new(pool, 0, 0);
        let emitter = channel.subscribe(a);

        emitter.deactivated();
        emitter.destroyed();

        assert_eq!(
            channel.next_event(),
            Some(LifecycleEvent {
                object: a,
                kind: LifecycleEventKind::Deactivated
            })
        );
        assert_eq!(channel.next_event().map(|e| e.kind), Some(LifecycleEventKind::Destroyed));
        assert!(channel.next_event().is_none());
    }

    #[test]
    fn test_unsubscribed_events_are_dropped() {
        let pool = PoolId::next();
        let mut channel = LifecycleChannel::new();
        let a = ObjectId::new(pool, 0, 0);
        let emitter = channel.subscribe(a);

        assert!(channel.unsubscribe(a));
        assert!(!channel.unsubscribe(a));
        emitter.deactivated();

        assert!(channel.next_event().is_none());
        assert_eq!(channel.subscription_count(), 0);
    }

    #[test]
    fn test_emit_after_channel_dropped() {
        let pool = PoolId::next();
        let mut channel = LifecycleChannel::new();
        let emitter = channel.subscribe(ObjectId::new(pool, 0, 0));
        drop(channel);

        // Must not panic.
        emitter.destroyed();
    }
}
