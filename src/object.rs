//! The base contract a pooled object must fulfil before anything else is allowed to
//! release it.

/// Base release eligibility of a pooled object. `ResourceObject` combines it with
/// its own dependency condition.
pub trait Eligibility {
    fn can_release(&self) -> bool;
}

impl Eligibility for bool {
    #[inline]
    fn can_release(&self) -> bool {
        *self
    }
}

/// The default per-object state of a `ResourcePool`.
///
/// An object is eligible for release when it is neither locked nor spawned.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ObjectState {
    locked: bool,
    spawn_count: u32,
}

impl ObjectState {
    #[inline]
    pub fn new() -> Self {
        ObjectState::default()
    }

    /// Returns true if this object is pinned into the pool.
    #[inline]
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    #[inline]
    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    /// Gets the number of outstanding borrows.
    #[inline]
    pub fn spawn_count(&self) -> u32 {
        self.spawn_count
    }

    #[inline]
    pub fn is_in_use(&self) -> bool {
        self.spawn_count > 0
    }

    /// Records a new outstanding borrow.
    #[inline]
    pub fn spawn(&mut self) {
        self.spawn_count += 1;
    }

    /// Returns a borrow. Returns false if there was nothing to return.
    #[inline]
    pub fn unspawn(&mut self) -> bool {
        match self.spawn_count.checked_sub(1) {
            Some(v) => {
                self.spawn_count = v;
                true
            }
            None => false,
        }
    }
}

impl Eligibility for ObjectState {
    #[inline]
    fn can_release(&self) -> bool {
        !self.locked && self.spawn_count == 0
    }
}
