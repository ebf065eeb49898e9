//! Timeline orchestration of nested animation units
//!
//! A timeline owns its children and lays them out on its own clock: one
//! after the other for a sequence, all at offset zero for a parallel group.
//! The scheduler only ever sees the timeline.

use crate::target::TargetRef;
use crate::unit::{AnimationUnit, RunningCounts};
use std::fmt;

/// How children are laid out in time
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimelineMode {
    /// Each child starts when the previous one ends
    Sequence,
    /// Every child starts at time zero
    Parallel,
}

/// A child placed on the timeline clock
struct TimelineEntry {
    /// Start time on the timeline clock
    offset: f32,
    unit: Box<dyn AnimationUnit>,
}

/// A composite animation unit
pub struct Timeline {
    mode: TimelineMode,
    entries: Vec<TimelineEntry>,
    /// Where the next sequence child starts
    cursor: f32,
    /// Full duration, infinite if a reachable child never ends
    end: f32,
    time: f32,
    finished: bool,
    killed: bool,
}

impl Timeline {
    pub fn new(mode: TimelineMode) -> Self {
        Self {
            mode,
            entries: Vec::new(),
            cursor: 0.0,
            end: 0.0,
            time: 0.0,
            finished: false,
            killed: false,
        }
    }

    pub fn sequence() -> Self {
        Self::new(TimelineMode::Sequence)
    }

    pub fn parallel() -> Self {
        Self::new(TimelineMode::Parallel)
    }

    /// Append a child unit
    pub fn push<U: AnimationUnit + 'static>(self, unit: U) -> Self {
        self.push_boxed(Box::new(unit))
    }

    pub fn push_boxed(mut self, unit: Box<dyn AnimationUnit>) -> Self {
        let length = unit.duration().unwrap_or(f32::INFINITY);
        let offset = match self.mode {
            TimelineMode::Sequence => self.cursor,
            TimelineMode::Parallel => 0.0,
        };
        self.extend_to(offset, length);
        self.entries.push(TimelineEntry { offset, unit });
        self
    }

    /// Insert a gap of `duration`. In a parallel group this only stretches
    /// the timeline to at least `duration`.
    pub fn push_pause(mut self, duration: f32) -> Self {
        let duration = duration.max(0.0);
        let offset = match self.mode {
            TimelineMode::Sequence => self.cursor,
            TimelineMode::Parallel => 0.0,
        };
        self.extend_to(offset, duration);
        self
    }

    fn extend_to(&mut self, offset: f32, length: f32) {
        let child_end = offset + length;
        if self.mode == TimelineMode::Sequence {
            self.cursor = child_end;
        }
        self.end = self.end.max(child_end);
    }

    pub fn mode(&self) -> TimelineMode {
        self.mode
    }

    /// Child units in insertion order
    pub fn children(&self) -> impl Iterator<Item = &dyn AnimationUnit> {
        self.entries.iter().map(|entry| entry.unit.as_ref())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_killed(&self) -> bool {
        self.killed
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::sequence()
    }
}

/// Move a child to where `time` puts it on the timeline clock.
///
/// `at_end` is set once the timeline reaches its own end, at which point
/// every finite child has to be done.
fn seek_child(entry: &mut TimelineEntry, time: f32, at_end: bool) {
    let length = entry.unit.duration().unwrap_or(f32::INFINITY);
    let raw = time - entry.offset;
    let local = raw.clamp(0.0, length);
    let mut step = local - entry.unit.elapsed();
    if step < 0.0 && entry.unit.is_finished() && !entry.unit.reopen() {
        return;
    }
    if (raw >= length || at_end) && !entry.unit.is_finished() {
        // Nudge past the end so rounding can't leave the child a hair short.
        step += length.max(1.0) * f32::EPSILON * 4.0;
    }
    if step != 0.0 {
        entry.unit.advance(step);
    }
}

impl AnimationUnit for Timeline {
    fn start(&mut self) {
        self.time = 0.0;
        self.finished = false;
        self.killed = false;
        for entry in &mut self.entries {
            entry.unit.start();
        }
    }

    fn advance(&mut self, delta: f32) {
        if self.is_finished() {
            return;
        }

        self.time = (self.time + delta).clamp(0.0, self.end);
        let time = self.time;
        let at_end = time >= self.end;

        if delta >= 0.0 {
            for entry in &mut self.entries {
                seek_child(entry, time, at_end);
            }
        } else {
            for entry in self.entries.iter_mut().rev() {
                seek_child(entry, time, at_end);
            }
        }

        if at_end {
            self.finished = true;
        }
    }

    fn is_finished(&self) -> bool {
        self.finished || self.killed
    }

    fn kill(&mut self) {
        self.killed = true;
        for entry in &mut self.entries {
            entry.unit.kill();
        }
    }

    fn reopen(&mut self) -> bool {
        if self.killed {
            return false;
        }
        // Children are reopened one by one as the rewind reaches them.
        self.finished = false;
        true
    }

    fn elapsed(&self) -> f32 {
        self.time
    }

    fn duration(&self) -> Option<f32> {
        self.end.is_finite().then_some(self.end)
    }

    fn targets(&self, target: &TargetRef) -> bool {
        self.entries.iter().any(|entry| entry.unit.targets(target))
    }

    fn is_timeline(&self) -> bool {
        true
    }

    fn running_counts(&self) -> RunningCounts {
        if self.is_finished() {
            return RunningCounts::default();
        }
        self.entries
            .iter()
            .fold(RunningCounts::timeline(), |counts, entry| {
                counts + entry.unit.running_counts()
            })
    }

    fn release(self: Box<Self>) {
        for entry in self.entries {
            entry.unit.release();
        }
    }
}

impl fmt::Debug for Timeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timeline")
            .field("mode", &self.mode)
            .field("children", &self.entries.len())
            .field("time", &self.time)
            .field("end", &self.end)
            .field("finished", &self.finished)
            .field("killed", &self.killed)
            .finish()
    }
}
