//! Tweens: leaf animation units
//!
//! A tween interpolates a small vector of floats from a start to an end
//! value over a duration, with optional delay, repetition and yoyo. It does
//! not write to its target; interpolated values are published through the
//! update callback and the target is only used for identity queries.

use crate::easing::Easing;
use crate::error::{AnimationError, Result};
use crate::pool::PoolLink;
use crate::target::TargetRef;
use crate::unit::{AnimationUnit, RunningCounts};
use smallvec::SmallVec;
use std::fmt;

/// Interpolated values of a tween
pub type TweenValues = SmallVec<[f32; 4]>;

/// Callback fired on tween lifecycle events
pub type EventCallback = Box<dyn FnMut(TweenEvent)>;

/// Callback receiving interpolated values after each advance
pub type UpdateCallback = Box<dyn FnMut(&[f32])>;

/// Lifecycle events reported by a tween
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TweenEvent {
    /// Local time passed the delay for the first time
    Begin,
    /// An iteration boundary was crossed moving forward
    Repeat,
    /// The tween reached its end; fired once
    Complete,
}

/// A leaf animation unit
pub struct Tween {
    target: Option<TargetRef>,
    duration: f32,
    delay: f32,
    easing: Easing,
    /// Extra iterations, -1 repeats forever
    repeat: i32,
    repeat_delay: f32,
    yoyo: bool,
    from: TweenValues,
    to: TweenValues,
    current: TweenValues,
    time: f32,
    began: bool,
    finished: bool,
    killed: bool,
    on_event: Option<EventCallback>,
    on_update: Option<UpdateCallback>,
    pub(crate) pool: Option<PoolLink>,
}

impl Tween {
    /// Start building a tween that animates `target`
    pub fn to(target: TargetRef, duration: f32) -> TweenBuilder {
        Self::builder(duration).target(target)
    }

    /// Start building a tween without a target (a plain timer when no
    /// values are given)
    pub fn builder(duration: f32) -> TweenBuilder {
        TweenBuilder::new(Self::blank(), None).duration(duration)
    }

    pub(crate) fn blank() -> Self {
        Self {
            target: None,
            duration: 0.0,
            delay: 0.0,
            easing: Easing::Linear,
            repeat: 0,
            repeat_delay: 0.0,
            yoyo: false,
            from: TweenValues::new(),
            to: TweenValues::new(),
            current: TweenValues::new(),
            time: 0.0,
            began: false,
            finished: false,
            killed: false,
            on_event: None,
            on_update: None,
            pool: None,
        }
    }

    /// Clear everything except value storage, for reuse by a pool
    pub(crate) fn reset(&mut self) {
        self.target = None;
        self.duration = 0.0;
        self.delay = 0.0;
        self.easing = Easing::Linear;
        self.repeat = 0;
        self.repeat_delay = 0.0;
        self.yoyo = false;
        self.from.clear();
        self.to.clear();
        self.current.clear();
        self.time = 0.0;
        self.began = false;
        self.finished = false;
        self.killed = false;
        self.on_event = None;
        self.on_update = None;
        self.pool = None;
    }

    pub fn target(&self) -> Option<&TargetRef> {
        self.target.as_ref()
    }

    /// Current interpolated values
    pub fn values(&self) -> &[f32] {
        &self.current
    }

    pub fn easing(&self) -> Easing {
        self.easing
    }

    /// Duration of a single iteration
    pub fn iteration_duration(&self) -> f32 {
        self.duration
    }

    pub fn delay(&self) -> f32 {
        self.delay
    }

    pub fn repeat_count(&self) -> i32 {
        self.repeat
    }

    pub fn has_begun(&self) -> bool {
        self.began
    }

    pub fn is_killed(&self) -> bool {
        self.killed
    }

    pub fn is_pooled(&self) -> bool {
        self.pool.is_some()
    }

    /// Delay plus every iteration and repeat delay; `None` when infinite
    pub fn full_duration(&self) -> Option<f32> {
        if self.repeat < 0 {
            return None;
        }
        let iterations = (self.repeat + 1) as f32;
        Some(self.delay + self.duration * iterations + self.repeat_delay * self.repeat as f32)
    }

    /// Zero-based iteration that local time `t` falls in.
    ///
    /// Zero-length iterations all happen at once, so a tween with no period
    /// jumps straight to its last iteration when it reaches the end.
    fn iteration_at(&self, t: f32, reached_end: bool) -> u32 {
        let local = t - self.delay;
        let period = self.duration + self.repeat_delay;
        if period <= 0.0 {
            return if reached_end {
                u32::try_from(self.repeat).unwrap_or(0)
            } else {
                0
            };
        }
        if local <= 0.0 {
            return 0;
        }
        let index = (local / period).floor() as u32;
        match u32::try_from(self.repeat) {
            Ok(max) => index.min(max),
            Err(_) => index,
        }
    }

    /// Normalized, uneased progress at local time `t`
    fn progress_at(&self, t: f32, reached_end: bool) -> f32 {
        let (iteration, progress) = if reached_end {
            (self.iteration_at(t, true), 1.0)
        } else {
            let local = t - self.delay;
            if local <= 0.0 {
                return 0.0;
            }
            let iteration = self.iteration_at(t, false);
            let within = local - iteration as f32 * (self.duration + self.repeat_delay);
            let progress = if self.duration <= 0.0 {
                1.0
            } else {
                (within / self.duration).min(1.0)
            };
            (iteration, progress)
        };

        if self.yoyo && iteration % 2 == 1 {
            1.0 - progress
        } else {
            progress
        }
    }

    fn emit(&mut self, event: TweenEvent) {
        if let Some(callback) = self.on_event.as_mut() {
            callback(event);
        }
    }

    fn write_values(&mut self, progress: f32) {
        let eased = self.easing.apply(progress);
        for ((current, from), to) in self.current.iter_mut().zip(&self.from).zip(&self.to) {
            *current = from + (to - from) * eased;
        }
        if let Some(callback) = self.on_update.as_mut() {
            callback(&self.current[..]);
        }
    }
}

impl AnimationUnit for Tween {
    fn start(&mut self) {
        self.time = 0.0;
        self.began = false;
        self.finished = false;
        self.killed = false;
        self.current.clone_from(&self.from);
    }

    fn advance(&mut self, delta: f32) {
        if self.is_finished() {
            return;
        }

        let end = self.full_duration();
        let previous_iteration = self.iteration_at(self.time, false);
        let mut time = (self.time + delta).max(0.0);
        if let Some(end) = end {
            time = time.min(end);
        }
        self.time = time;
        let reached_end = end.is_some_and(|end| time >= end);

        if !self.began && (time > self.delay || reached_end) {
            self.began = true;
            self.emit(TweenEvent::Begin);
        }

        if self.began {
            let progress = self.progress_at(time, reached_end);
            self.write_values(progress);
        }

        if delta > 0.0 {
            let crossed = self
                .iteration_at(time, reached_end)
                .saturating_sub(previous_iteration);
            for _ in 0..crossed {
                self.emit(TweenEvent::Repeat);
            }
        }

        if reached_end {
            self.finished = true;
            self.emit(TweenEvent::Complete);
        }
    }

    fn is_finished(&self) -> bool {
        self.finished || self.killed
    }

    fn kill(&mut self) {
        self.killed = true;
    }

    fn reopen(&mut self) -> bool {
        if self.killed {
            return false;
        }
        self.finished = false;
        true
    }

    fn elapsed(&self) -> f32 {
        self.time
    }

    fn duration(&self) -> Option<f32> {
        self.full_duration()
    }

    fn targets(&self, target: &TargetRef) -> bool {
        self.target.as_ref() == Some(target)
    }

    fn running_counts(&self) -> RunningCounts {
        if self.is_finished() {
            RunningCounts::default()
        } else {
            RunningCounts::tween()
        }
    }

    fn release(mut self: Box<Self>) {
        if let Some(pool) = self.pool.take() {
            pool.recycle(*self);
        }
    }
}

impl fmt::Debug for Tween {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tween")
            .field("target", &self.target)
            .field("duration", &self.duration)
            .field("delay", &self.delay)
            .field("repeat", &self.repeat)
            .field("time", &self.time)
            .field("values", &self.current)
            .field("finished", &self.finished)
            .field("killed", &self.killed)
            .field("pooled", &self.pool.is_some())
            .finish_non_exhaustive()
    }
}

/// Builder for [`Tween`]; `build` validates the configuration
pub struct TweenBuilder {
    tween: Tween,
    pool: Option<PoolLink>,
}

impl TweenBuilder {
    pub(crate) fn new(tween: Tween, pool: Option<PoolLink>) -> Self {
        Self { tween, pool }
    }

    pub fn target(mut self, target: TargetRef) -> Self {
        self.tween.target = Some(target);
        self
    }

    /// Duration of one iteration
    pub fn duration(mut self, duration: f32) -> Self {
        self.tween.duration = duration;
        self
    }

    /// Start values; zeros matching `to_values` when omitted
    pub fn from_values(mut self, values: impl IntoIterator<Item = f32>) -> Self {
        self.tween.from = values.into_iter().collect();
        self
    }

    pub fn to_values(mut self, values: impl IntoIterator<Item = f32>) -> Self {
        self.tween.to = values.into_iter().collect();
        self
    }

    pub fn delay(mut self, delay: f32) -> Self {
        self.tween.delay = delay;
        self
    }

    pub fn ease(mut self, easing: Easing) -> Self {
        self.tween.easing = easing;
        self
    }

    /// Play `count` extra iterations (-1 forever), waiting `delay` between them
    pub fn repeat(mut self, count: i32, delay: f32) -> Self {
        self.tween.repeat = count;
        self.tween.repeat_delay = delay;
        self
    }

    /// Play every other iteration backwards
    pub fn yoyo(mut self, yoyo: bool) -> Self {
        self.tween.yoyo = yoyo;
        self
    }

    pub fn on_event<F: FnMut(TweenEvent) + 'static>(mut self, callback: F) -> Self {
        self.tween.on_event = Some(Box::new(callback));
        self
    }

    pub fn on_update<F: FnMut(&[f32]) + 'static>(mut self, callback: F) -> Self {
        self.tween.on_update = Some(Box::new(callback));
        self
    }

    pub fn build(self) -> Result<Tween> {
        let Self { mut tween, pool } = self;
        if let Err(err) = tween.validate() {
            if let Some(pool) = pool {
                pool.restore(tween);
            }
            return Err(err);
        }
        tween.current.clone_from(&tween.from);
        tween.pool = pool;
        Ok(tween)
    }
}

impl Tween {
    /// Check the builder's settings and fill in omitted start values
    fn validate(&mut self) -> Result<()> {
        if !self.duration.is_finite() || self.duration < 0.0 {
            return Err(AnimationError::invalid(format!(
                "tween duration must be finite and non-negative, got {}",
                self.duration
            )));
        }
        if !self.delay.is_finite() || self.delay < 0.0 {
            return Err(AnimationError::invalid(format!(
                "tween delay must be finite and non-negative, got {}",
                self.delay
            )));
        }
        if self.repeat < -1 {
            return Err(AnimationError::invalid(format!(
                "repeat count must be -1 or greater, got {}",
                self.repeat
            )));
        }
        if !self.repeat_delay.is_finite() || self.repeat_delay < 0.0 {
            return Err(AnimationError::invalid(format!(
                "repeat delay must be finite and non-negative, got {}",
                self.repeat_delay
            )));
        }
        if self.repeat < 0 && self.duration + self.repeat_delay <= 0.0 {
            return Err(AnimationError::invalid(
                "an infinitely repeating tween needs a positive period",
            ));
        }
        if self.from.is_empty() {
            self.from.resize(self.to.len(), 0.0);
        }
        if self.from.len() != self.to.len() {
            return Err(AnimationError::invalid(format!(
                "start and end values differ in arity ({} vs {})",
                self.from.len(),
                self.to.len()
            )));
        }
        Ok(())
    }
}
