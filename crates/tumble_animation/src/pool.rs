//! Tween object pool
//!
//! Tweens built through a [`TweenPool`] remember the pool they came from.
//! When the scheduler releases such a tween it is reset and pushed onto the
//! pool's free list instead of being dropped, so the next
//! [`TweenPool::tween`] call reuses it.

use crate::config::PoolConfig;
use crate::target::TargetRef;
use crate::tween::{Tween, TweenBuilder};
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

struct PoolInner {
    free: Vec<Tween>,
    capacity: usize,
    created: usize,
    recycled: usize,
}

/// Shared, single-threaded pool of tweens. Clones share the free list.
#[derive(Clone)]
pub struct TweenPool {
    inner: Rc<RefCell<PoolInner>>,
}

impl TweenPool {
    pub fn new(config: &PoolConfig) -> Self {
        tracing::debug!(capacity = config.capacity, "tween pool created");
        Self {
            inner: Rc::new(RefCell::new(PoolInner {
                free: Vec::with_capacity(config.capacity.min(64)),
                capacity: config.capacity,
                created: 0,
                recycled: 0,
            })),
        }
    }

    /// Start building a pool-bound tween that animates `target`
    pub fn tween(&self, target: TargetRef, duration: f32) -> TweenBuilder {
        self.builder(duration).target(target)
    }

    /// Start building a pool-bound tween without a target
    pub fn builder(&self, duration: f32) -> TweenBuilder {
        let link = PoolLink(Rc::downgrade(&self.inner));
        TweenBuilder::new(self.take(), Some(link)).duration(duration)
    }

    fn take(&self) -> Tween {
        let mut inner = self.inner.borrow_mut();
        match inner.free.pop() {
            Some(tween) => tween,
            None => {
                inner.created += 1;
                Tween::blank()
            }
        }
    }

    /// Tweens waiting on the free list
    pub fn free_count(&self) -> usize {
        self.inner.borrow().free.len()
    }

    /// Tweens allocated because the free list was empty
    pub fn created(&self) -> usize {
        self.inner.borrow().created
    }

    /// Tweens handed back through `release`
    pub fn recycled(&self) -> usize {
        self.inner.borrow().recycled
    }

    pub fn capacity(&self) -> usize {
        self.inner.borrow().capacity
    }
}

impl Default for TweenPool {
    fn default() -> Self {
        Self::new(&PoolConfig::default())
    }
}

impl fmt::Debug for TweenPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("TweenPool")
            .field("free", &inner.free.len())
            .field("capacity", &inner.capacity)
            .field("created", &inner.created)
            .field("recycled", &inner.recycled)
            .finish()
    }
}

/// Back-reference from a pooled tween to its pool
#[derive(Clone)]
pub(crate) struct PoolLink(Weak<RefCell<PoolInner>>);

impl PoolLink {
    /// Return a released `tween` to the pool. Dropped if the pool is gone
    /// or full.
    pub(crate) fn recycle(&self, tween: Tween) {
        self.push_free(tween, true);
    }

    /// Put back storage taken for a tween that never got built
    pub(crate) fn restore(&self, tween: Tween) {
        self.push_free(tween, false);
    }

    fn push_free(&self, mut tween: Tween, released: bool) {
        // Drop callbacks before touching the pool; they may own pool handles.
        tween.reset();
        let Some(inner) = self.0.upgrade() else {
            return;
        };
        let mut inner = inner.borrow_mut();
        if released {
            inner.recycled += 1;
        }
        if inner.free.len() < inner.capacity {
            inner.free.push(tween);
        }
    }
}

impl fmt::Debug for PoolLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolLink")
            .field("alive", &(self.0.strong_count() > 0))
            .finish()
    }
}
