//! # Deferred Requests
//!
//! Commands queued on the registry and executed at the next drain.
//!
//! ```text
//! Tick N                                   Drain (end of tick N)
//! ┌────────────────────────┐               ┌──────────────────────────────┐
//! │ request_add(...)       │──> add ──────>│ 1. add         (FIFO)        │
//! │ request_recycle(...)   │──> recycle ──>│ 2. recycle     (FIFO)        │
//! │ request_deactivation() │──> deact. ───>│ 3. deactivate  (FIFO)        │
//! │ request_dispatch(...)  │──> dispatch ─>│ 4. dispatch    (FIFO)        │
//! └────────────────────────┘               └──────────────────────────────┘
//! ```
//!
//! A queue is drained until empty, so a completion that enqueues into a
//! queue not yet drained this tick is serviced this tick. Enqueueing into a
//! queue already drained waits for the next tick.

use std::collections::VecDeque;

use reservoir_core::{ObjectId, Quat, Vec3};

use crate::registry::PoolRegistry;
use crate::scene::{PrefabKey, SceneRuntime};

/// Completion callback, run at drain time with the operation's result.
pub type Completion<R> = Box<dyn FnOnce(&mut PoolRegistry<R>, Option<ObjectId>)>;

/// Adjustment run on a recycled instance after placement, before its hook.
pub type PreRecycleHook<R> = Box<dyn FnOnce(ObjectId, &mut <R as SceneRuntime>::Object)>;

/// Kind of deferred request, in drain order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RequestKind {
    /// Create a vacant instance.
    Add = 0,
    /// Hand out an instance.
    Recycle = 1,
    /// Return an instance.
    Deactivate = 2,
    /// Destroy an instance.
    Dispatch = 3,
}

impl RequestKind {
    /// Fixed order in which queues are drained.
    pub const DRAIN_ORDER: [Self; 4] = [Self::Add, Self::Recycle, Self::Deactivate, Self::Dispatch];
}

/// Placement for a positioned recycle.
pub(crate) struct Placement<R: SceneRuntime> {
    pub(crate) position: Vec3,
    pub(crate) rotation: Quat,
    pub(crate) pre_hook: Option<PreRecycleHook<R>>,
}

/// A queued operation.
pub(crate) enum Request<R: SceneRuntime> {
    Add {
        key: PrefabKey,
        on_complete: Option<Completion<R>>,
    },
    Recycle {
        key: PrefabKey,
        placement: Option<Placement<R>>,
        on_complete: Option<Completion<R>>,
    },
    Deactivate {
        key: PrefabKey,
        object: ObjectId,
        on_complete: Option<Completion<R>>,
    },
    Dispatch {
        key: PrefabKey,
        on_complete: Option<Completion<R>>,
    },
}

impl<R: SceneRuntime> Request<R> {
    pub(crate) const fn kind(&self) -> RequestKind {
        match self {
            Self::Add { .. } => RequestKind::Add,
            Self::Recycle { .. } => RequestKind::Recycle,
            Self::Deactivate { .. } => RequestKind::Deactivate,
            Self::Dispatch { .. } => RequestKind::Dispatch,
        }
    }
}

/// One FIFO queue per request kind.
pub(crate) struct RequestQueues<R: SceneRuntime> {
    queues: [VecDeque<Request<R>>; 4],
}

impl<R: SceneRuntime> RequestQueues<R> {
    pub(crate) fn new() -> Self {
        Self {
            queues: [
                VecDeque::new(),
                VecDeque::new(),
                VecDeque::new(),
                VecDeque::new(),
            ],
        }
    }

    pub(crate) fn push(&mut self, request: Request<R>) {
        self.queues[request.kind() as usize].push_back(request);
    }

    pub(crate) fn pop(&mut self, kind: RequestKind) -> Option<Request<R>> {
        self.queues[kind as usize].pop_front()
    }

    pub(crate) fn len(&self, kind: RequestKind) -> usize {
        self.queues[kind as usize].len()
    }

    pub(crate) fn total(&self) -> usize {
        self.queues.iter().map(VecDeque::len).sum()
    }
}

/// What one drain executed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Drain sequence number, starting at 0.
    pub tick: u64,
    /// Add requests executed.
    pub added: usize,
    /// Recycle requests executed.
    pub recycled: usize,
    /// Deactivation requests executed.
    pub deactivated: usize,
    /// Dispatch requests executed.
    pub dispatched: usize,
    /// Requests whose operation produced no instance.
    pub failed: usize,
    /// Self-reported lifecycle events applied before the queues ran.
    pub lifecycle_events: usize,
}

impl DrainReport {
    pub(crate) fn record(&mut self, kind: RequestKind, succeeded: bool) {
        match kind {
            RequestKind::Add => self.added += 1,
            RequestKind::Recycle => self.recycled += 1,
            RequestKind::Deactivate => self.deactivated += 1,
            RequestKind::Dispatch => self.dispatched += 1,
        }
        if !succeeded {
            self.failed += 1;
        }
    }

    /// Total requests executed.
    #[must_use]
    pub const fn executed(&self) -> usize {
        self.added + self.recycled + self.deactivated + self.dispatched
    }
}
