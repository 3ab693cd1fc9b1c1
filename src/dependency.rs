//! # Dependency Counts
//!
//! The `DependencyCounts` table maps a resource identity to the number of other live
//! resources that currently declare it as a dependency. A single table is shared by
//! every `ResourceObject` of a pool, so it is always handed around as a
//! `SharedDependencies`, which is a cheap clonable reference to the same table.
//!
//! A missing entry and an entry holding zero are equivalent when asking "may this
//! be released?", but only a present entry can be decremented. Decrementing a
//! resource that was never counted means the bookkeeping is already broken.

use std::collections::hash_map::{HashMap, Iter};
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Per-resource dependent counters.
#[derive(Debug, Clone)]
pub struct DependencyCounts<T: Eq + Hash> {
    counts: HashMap<T, u32>,
}

impl<T: Eq + Hash> Default for DependencyCounts<T> {
    fn default() -> Self {
        DependencyCounts::new()
    }
}

impl<T: Eq + Hash> DependencyCounts<T> {
    /// Creates a new and empty `DependencyCounts`.
    pub fn new() -> Self {
        DependencyCounts {
            counts: HashMap::default(),
        }
    }

    /// Creates a new `DependencyCounts` with the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        DependencyCounts {
            counts: HashMap::with_capacity(capacity),
        }
    }

    /// Gets the number of dependents of `target`, treating a missing entry as zero.
    #[inline]
    pub fn count(&self, target: &T) -> u32 {
        self.counts.get(target).cloned().unwrap_or(0)
    }

    /// Gets the raw entry of `target`.
    #[inline]
    pub fn get(&self, target: &T) -> Option<u32> {
        self.counts.get(target).cloned()
    }

    /// Returns true if `target` has an entry, even a zeroed one.
    #[inline]
    pub fn contains(&self, target: &T) -> bool {
        self.counts.contains_key(target)
    }

    /// Increases the dependents of `target` by one, inserting a fresh entry if absent.
    /// Returns the new count.
    pub fn increment(&mut self, target: T) -> u32 {
        let count = self.counts.entry(target).or_insert(0);
        *count += 1;
        *count
    }

    /// Decreases the dependents of `target` by one. Returns `None` and leaves the
    /// table untouched if there is no entry, or if the entry is already zero.
    pub fn decrement(&mut self, target: &T) -> Option<u32> {
        let count = self.counts.get_mut(target)?;
        *count = count.checked_sub(1)?;
        Some(*count)
    }

    /// Removes the entry of `target`.
    #[inline]
    pub fn remove(&mut self, target: &T) -> Option<u32> {
        self.counts.remove(target)
    }

    /// Removes all the entries.
    #[inline]
    pub fn clear(&mut self) {
        self.counts.clear();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> Iter<T, u32> {
        self.counts.iter()
    }
}

/// A reference to a `DependencyCounts` shared by all the objects of one pool.
///
/// Cloning a `SharedDependencies` never copies the table. Every read-then-write
/// sequence must happen while holding a single `lock`.
#[derive(Debug)]
pub struct SharedDependencies<T: Eq + Hash> {
    inner: Arc<Mutex<DependencyCounts<T>>>,
}

impl<T: Eq + Hash> Clone for SharedDependencies<T> {
    fn clone(&self) -> Self {
        SharedDependencies {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Eq + Hash> Default for SharedDependencies<T> {
    fn default() -> Self {
        SharedDependencies::new()
    }
}

impl<T: Eq + Hash> SharedDependencies<T> {
    pub fn new() -> Self {
        Self::from(DependencyCounts::new())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::from(DependencyCounts::with_capacity(capacity))
    }

    /// Acquires exclusive access to the table.
    ///
    /// A poisoned lock is recovered; the table only ever holds plain counters.
    #[inline]
    pub fn lock(&self) -> MutexGuard<DependencyCounts<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns true if both references point at the same table.
    #[inline]
    pub fn same_table(&self, rhs: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &rhs.inner)
    }

    /// Gets the number of dependents of `target`.
    #[inline]
    pub fn count(&self, target: &T) -> u32 {
        self.lock().count(target)
    }
}

impl<T: Eq + Hash> From<DependencyCounts<T>> for SharedDependencies<T> {
    fn from(counts: DependencyCounts<T>) -> Self {
        SharedDependencies {
            inner: Arc::new(Mutex::new(counts)),
        }
    }
}
