//! Tumble Animation Scheduler
//!
//! Tweens, timelines, and a scheduler that ticks them once per frame.
//!
//! # Features
//!
//! - **Scheduler**: Advances every registered unit by a caller-supplied delta
//!   and reclaims finished ones automatically
//! - **Tweens**: Eased interpolation with delay, repeat, and yoyo
//! - **Timelines**: Sequence or parallel composition, nestable, counted as one
//!   unit by the scheduler
//! - **Target Queries**: Find and kill everything animating an object without
//!   holding on to it
//! - **Deferred Mutation**: Callbacks queue adds and kills through a
//!   [`SchedulerHandle`]; they apply once the current pass is done
//! - **Pooling**: Released tweens go back to a [`TweenPool`]

pub mod config;
pub mod easing;
pub mod error;
pub mod pool;
pub mod scheduler;
pub mod target;
pub mod timeline;
pub mod tween;
pub mod unit;

pub use config::{PoolConfig, SchedulerConfig};
pub use easing::Easing;
pub use error::{AnimationError, Result};
pub use pool::TweenPool;
pub use scheduler::{AnimationScheduler, SchedulerHandle, UnitId};
pub use target::TargetRef;
pub use timeline::{Timeline, TimelineMode};
pub use tween::{Tween, TweenBuilder, TweenEvent, TweenValues};
pub use unit::{AnimationUnit, RunningCounts};
