//! Non-owning references to animated objects
//!
//! A tween remembers which object it animates so the scheduler can answer
//! `contains_target` and honor `kill_target`. The reference never keeps the
//! object alive; two references are equal only when they point at the same
//! allocation.

use std::any::Any;
use std::fmt;
use std::rc::{Rc, Weak};

/// Identity handle to the object a unit animates
#[derive(Clone)]
pub struct TargetRef(Weak<dyn Any>);

impl TargetRef {
    /// Reference the object behind `target` without owning it
    pub fn of<T: Any>(target: &Rc<T>) -> Self {
        let weak: Weak<T> = Rc::downgrade(target);
        Self(weak)
    }

    /// Whether the referenced object is still alive
    pub fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }

    /// Upgrade to a strong reference if the object still exists
    pub fn upgrade(&self) -> Option<Rc<dyn Any>> {
        self.0.upgrade()
    }

    /// Whether this handle refers to `target`
    pub fn is<T: Any>(&self, target: &Rc<T>) -> bool {
        *self == Self::of(target)
    }
}

impl PartialEq for TargetRef {
    fn eq(&self, other: &Self) -> bool {
        Weak::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for TargetRef {}

impl fmt::Debug for TargetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TargetRef")
            .field(&self.0.as_ptr().cast::<()>())
            .finish()
    }
}
