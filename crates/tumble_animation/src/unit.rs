//! The animation unit contract
//!
//! Everything the scheduler manages implements [`AnimationUnit`]. Tweens are
//! leaves, timelines own children, and the scheduler treats both as opaque
//! units it advances and prunes.

use crate::target::TargetRef;
use std::ops::{Add, AddAssign};

/// Live tween and timeline counts for a unit subtree
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunningCounts {
    /// Unfinished leaf tweens
    pub tweens: usize,
    /// Unfinished timelines, nested ones included
    pub timelines: usize,
}

impl RunningCounts {
    pub const fn tween() -> Self {
        Self {
            tweens: 1,
            timelines: 0,
        }
    }

    pub const fn timeline() -> Self {
        Self {
            tweens: 0,
            timelines: 1,
        }
    }
}

impl Add for RunningCounts {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            tweens: self.tweens + rhs.tweens,
            timelines: self.timelines + rhs.timelines,
        }
    }
}

impl AddAssign for RunningCounts {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

/// A time-driven animation the scheduler can own and advance.
///
/// Once [`is_finished`](Self::is_finished) reports true the unit must ignore
/// further calls to [`advance`](Self::advance).
pub trait AnimationUnit {
    /// Reset local time and clear finished/killed state.
    ///
    /// Called by the scheduler every time the unit is added.
    fn start(&mut self);

    /// Move local time by `delta` (negative rewinds)
    fn advance(&mut self, delta: f32);

    /// Whether the unit completed or was killed
    fn is_finished(&self) -> bool;

    /// Force the unit to finish without completing
    fn kill(&mut self);

    /// Clear a natural finish so a parent timeline can rewind the unit.
    ///
    /// Killed units stay finished. Returns whether the unit runs again; the
    /// default keeps finished units where they are.
    fn reopen(&mut self) -> bool {
        false
    }

    /// Local elapsed time, delay included
    fn elapsed(&self) -> f32;

    /// Full duration, or `None` when the unit repeats forever
    fn duration(&self) -> Option<f32>;

    /// Whether this unit, or any unit nested in it, animates `target`
    fn targets(&self, target: &TargetRef) -> bool;

    /// Used for diagnostics only
    fn is_timeline(&self) -> bool {
        false
    }

    /// Live counts for this unit and everything nested in it
    fn running_counts(&self) -> RunningCounts;

    /// Hand the unit back to whatever allocated it.
    ///
    /// Consumes the unit, so a release can only ever happen once. The
    /// default simply drops it.
    fn release(self: Box<Self>) {}
}
