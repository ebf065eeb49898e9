//! Animation scheduler
//!
//! Owns the top-level tweens and timelines, advances them once per frame,
//! and reclaims them when they finish.
//!
//! # Update passes
//!
//! Each [`AnimationScheduler::update`] call is one pass:
//!
//! 1. every unit registered when the pass starts is advanced, in insertion
//!    order, unless it is already finished (killed units skip straight to
//!    pruning);
//! 2. every unit now reporting finished is removed and released exactly once;
//! 3. operations queued through a [`SchedulerHandle`] during the pass are
//!    applied in the order they were queued.
//!
//! Units cannot touch the scheduler while it advances them. Callbacks that
//! need to add or kill units hold a `SchedulerHandle`, which only queues the
//! request, so the set of units visited by a pass never changes under it.

use crate::config::SchedulerConfig;
use crate::error::Result;
use crate::target::TargetRef;
use crate::unit::{AnimationUnit, RunningCounts};
use slotmap::{new_key_type, SlotMap};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::{Rc, Weak};

new_key_type! {
    /// Handle to a unit registered on the scheduler.
    ///
    /// Keys are generational: once the unit is removed the key goes stale
    /// and never resolves to a later unit.
    pub struct UnitId;
}

/// A mutation requested through a [`SchedulerHandle`]
enum PendingOp {
    Add(Box<dyn AnimationUnit>),
    Kill(UnitId),
    KillTarget(TargetRef),
    KillAll,
}

impl fmt::Debug for PendingOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PendingOp::Add(unit) => f
                .debug_tuple("Add")
                .field(&if unit.is_timeline() { "timeline" } else { "tween" })
                .finish(),
            PendingOp::Kill(id) => f.debug_tuple("Kill").field(id).finish(),
            PendingOp::KillTarget(target) => f.debug_tuple("KillTarget").field(target).finish(),
            PendingOp::KillAll => f.write_str("KillAll"),
        }
    }
}

type PendingQueue = RefCell<VecDeque<PendingOp>>;

/// Updates every registered tween and timeline and handles their lifecycle.
///
/// ```ignore
/// let mut scheduler = AnimationScheduler::new();
/// scheduler
///     .add(Tween::to(TargetRef::of(&sprite), 1.0).to_values([100.0]).build()?)
///     .add(Timeline::sequence().push(fade_in).push(fade_out));
///
/// // once per frame
/// scheduler.update(frame_delta);
/// ```
pub struct AnimationScheduler {
    units: SlotMap<UnitId, Box<dyn AnimationUnit>>,
    /// Insertion order, which is also the update order
    order: Vec<UnitId>,
    paused: bool,
    pending: Rc<PendingQueue>,
    config: SchedulerConfig,
}

impl AnimationScheduler {
    pub fn new() -> Self {
        Self::build(SchedulerConfig::default())
    }

    /// Create a scheduler from a validated config
    pub fn with_config(config: SchedulerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: SchedulerConfig) -> Self {
        Self {
            units: SlotMap::with_capacity_and_key(config.initial_capacity),
            order: Vec::with_capacity(config.initial_capacity),
            paused: false,
            pending: Rc::new(RefCell::new(VecDeque::new())),
            config,
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Get a handle for queueing mutations from inside unit callbacks
    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            pending: Rc::downgrade(&self.pending),
        }
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Add a tween or timeline and (re)start it.
    ///
    /// Returns the scheduler for chaining. Use [`insert`](Self::insert) to
    /// keep a handle to the unit.
    pub fn add<U: AnimationUnit + 'static>(&mut self, unit: U) -> &mut Self {
        self.insert_boxed(Box::new(unit));
        self
    }

    /// Add a unit and return its id
    pub fn insert<U: AnimationUnit + 'static>(&mut self, unit: U) -> UnitId {
        self.insert_boxed(Box::new(unit))
    }

    pub fn insert_boxed(&mut self, mut unit: Box<dyn AnimationUnit>) -> UnitId {
        unit.start();
        let timeline = unit.is_timeline();
        let id = self.units.insert(unit);
        self.order.push(id);
        tracing::debug!(?id, timeline, size = self.order.len(), "animation unit added");
        id
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Whether any live unit animates `target`, looking inside timelines
    pub fn contains_target(&self, target: &TargetRef) -> bool {
        self.live_units().any(|unit| unit.targets(target))
    }

    /// Whether `id` still refers to a registered unit
    pub fn contains(&self, id: UnitId) -> bool {
        self.units.contains_key(id)
    }

    pub fn get(&self, id: UnitId) -> Option<&dyn AnimationUnit> {
        self.units.get(id).map(|unit| unit.as_ref())
    }

    /// Number of top-level units. A timeline counts once however many
    /// children it has.
    pub fn size(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Live tweens, including those nested in timelines. Diagnostics only.
    pub fn running_tweens_count(&self) -> usize {
        self.running_counts().tweens
    }

    /// Live timelines, nested ones included. Diagnostics only.
    pub fn running_timelines_count(&self) -> usize {
        self.running_counts().timelines
    }

    pub fn running_counts(&self) -> RunningCounts {
        self.units_in_order()
            .fold(RunningCounts::default(), |counts, unit| {
                counts + unit.running_counts()
            })
    }

    /// Snapshot of the top-level units in insertion order
    pub fn objects(&self) -> Vec<&dyn AnimationUnit> {
        self.units_in_order().collect()
    }

    fn units_in_order(&self) -> impl Iterator<Item = &dyn AnimationUnit> {
        self.order
            .iter()
            .filter_map(|id| self.units.get(*id))
            .map(|unit| unit.as_ref())
    }

    fn live_units(&self) -> impl Iterator<Item = &dyn AnimationUnit> {
        self.units_in_order().filter(|unit| !unit.is_finished())
    }

    // =========================================================================
    // Cancellation
    // =========================================================================

    /// Release every unit right away and empty the scheduler
    pub fn kill_all(&mut self) {
        let count = self.order.len();
        for id in self.order.drain(..) {
            if let Some(unit) = self.units.remove(id) {
                unit.release();
            }
        }
        tracing::debug!(count, "killed all animation units");
    }

    /// Finish every top-level unit that animates `target`, directly or
    /// through a nested child.
    ///
    /// A timeline is finished as a whole even if only one of its children
    /// matches. Killed units are skipped by the next pass and released by
    /// its prune step. Returns the number of units killed.
    pub fn kill_target(&mut self, target: &TargetRef) -> usize {
        let mut killed = 0;
        for id in &self.order {
            if let Some(unit) = self.units.get_mut(*id) {
                if !unit.is_finished() && unit.targets(target) {
                    unit.kill();
                    killed += 1;
                }
            }
        }
        tracing::debug!(?target, killed, "killed units for target");
        killed
    }

    /// Finish one unit; released on the next pass. Returns false for stale
    /// or already finished ids.
    pub fn kill(&mut self, id: UnitId) -> bool {
        match self.units.get_mut(id) {
            Some(unit) if !unit.is_finished() => {
                unit.kill();
                tracing::debug!(?id, "animation unit killed");
                true
            }
            _ => false,
        }
    }

    // =========================================================================
    // Pause / Resume
    // =========================================================================

    /// Further `update` calls have no effect until `resume`
    pub fn pause(&mut self) {
        if !self.paused {
            tracing::debug!("animation scheduler paused");
        }
        self.paused = true;
    }

    /// Resume updates. Time that passed while paused is never applied.
    pub fn resume(&mut self) {
        if self.paused {
            tracing::debug!("animation scheduler resumed");
        }
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    // =========================================================================
    // Update
    // =========================================================================

    /// Run one pass: advance every unit by `delta`, prune finished ones,
    /// then apply queued handle operations.
    ///
    /// Negative deltas rewind and the magnitude scales speed. The configured
    /// time scale and `max_delta` clamp are applied first. Non-finite deltas
    /// are ignored.
    pub fn update(&mut self, delta: f32) {
        if self.paused {
            return;
        }
        if !delta.is_finite() {
            tracing::warn!(delta, "ignoring non-finite animation delta");
            return;
        }
        let delta = self.config.effective_delta(delta);

        let mut advanced = 0usize;
        for id in &self.order {
            if let Some(unit) = self.units.get_mut(*id) {
                if !unit.is_finished() {
                    unit.advance(delta);
                    advanced += 1;
                }
            }
        }

        let pruned = self.prune();
        let applied = self.apply_pending();
        tracing::trace!(
            delta,
            advanced,
            pruned,
            applied,
            size = self.order.len(),
            "animation pass complete"
        );
    }

    /// Remove and release every finished unit
    fn prune(&mut self) -> usize {
        let units = &mut self.units;
        let mut released = 0;
        self.order.retain(|id| {
            let finished = units.get(*id).map_or(true, |unit| unit.is_finished());
            if finished {
                // A stale key means the unit is already gone; never release twice.
                if let Some(unit) = units.remove(*id) {
                    unit.release();
                    released += 1;
                }
            }
            !finished
        });
        released
    }

    /// Apply every operation queued through a [`SchedulerHandle`], in order.
    ///
    /// `update` calls this at the end of each pass; call it directly to flush
    /// the queue without advancing time. Returns the number applied.
    pub fn apply_pending(&mut self) -> usize {
        let mut applied = 0;
        loop {
            // The borrow ends before the op runs, so releases can't collide with it.
            let next = self.pending.borrow_mut().pop_front();
            let Some(op) = next else {
                break;
            };
            tracing::trace!(?op, "applying queued animation op");
            match op {
                PendingOp::Add(unit) => {
                    self.insert_boxed(unit);
                }
                PendingOp::Kill(id) => {
                    self.kill(id);
                }
                PendingOp::KillTarget(target) => {
                    self.kill_target(&target);
                }
                PendingOp::KillAll => self.kill_all(),
            }
            applied += 1;
        }
        applied
    }
}

impl Default for AnimationScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for AnimationScheduler {
    fn drop(&mut self) {
        // Hand pooled units back instead of leaking them with the scheduler.
        for id in self.order.drain(..) {
            if let Some(unit) = self.units.remove(id) {
                unit.release();
            }
        }
        let queued: Vec<PendingOp> = self.pending.borrow_mut().drain(..).collect();
        for op in queued {
            if let PendingOp::Add(unit) = op {
                unit.release();
            }
        }
    }
}

impl fmt::Debug for AnimationScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationScheduler")
            .field("size", &self.order.len())
            .field("paused", &self.paused)
            .field("pending", &self.pending.borrow().len())
            .field("config", &self.config)
            .finish()
    }
}

/// Non-owning handle that queues scheduler mutations.
///
/// Safe to use from inside tween callbacks while a pass is running. Queued
/// operations are applied after the current (or next) pass finishes
/// pruning. Calls made after the scheduler is dropped are ignored.
#[derive(Clone)]
pub struct SchedulerHandle {
    pending: Weak<PendingQueue>,
}

impl SchedulerHandle {
    fn push(&self, op: PendingOp) {
        if let Some(pending) = self.pending.upgrade() {
            pending.borrow_mut().push_back(op);
        } else {
            tracing::debug!(?op, "scheduler dropped, discarding queued op");
        }
    }

    /// Queue a unit for registration
    pub fn add<U: AnimationUnit + 'static>(&self, unit: U) -> &Self {
        self.push(PendingOp::Add(Box::new(unit)));
        self
    }

    pub fn add_boxed(&self, unit: Box<dyn AnimationUnit>) -> &Self {
        self.push(PendingOp::Add(unit));
        self
    }

    pub fn kill(&self, id: UnitId) {
        self.push(PendingOp::Kill(id));
    }

    pub fn kill_target(&self, target: &TargetRef) {
        self.push(PendingOp::KillTarget(target.clone()));
    }

    pub fn kill_all(&self) {
        self.push(PendingOp::KillAll);
    }

    /// Operations waiting to be applied
    pub fn pending_len(&self) -> usize {
        self.pending
            .upgrade()
            .map_or(0, |pending| pending.borrow().len())
    }

    /// Whether the scheduler this handle came from still exists
    pub fn is_attached(&self) -> bool {
        self.pending.strong_count() > 0
    }
}

impl fmt::Debug for SchedulerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchedulerHandle")
            .field("attached", &self.is_attached())
            .field("pending", &self.pending_len())
            .finish()
    }
}
