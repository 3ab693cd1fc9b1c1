//! # ResourceObject
//!
//! A `ResourceObject` wraps one loaded resource (its _target_) inside a pool, and keeps
//! the bookkeeping of the target's place in the dependency graph. A model that uses a
//! couple of textures declares them with `add_dependency`, which bumps the dependents
//! count of every texture in the table shared by the whole pool.
//!
//! ## Release
//!
//! A target could only be released once nothing depends on it anymore. Releasing an
//! object walks its own dependencies back, removes the target from the table, and
//! finally hands the target over to the `ReleaseSink` which does the actual unloading.
//!
//! Releasing with `is_shutdown` set skips every consistency check, since the whole pool
//! is going away and outstanding debts are expected at that point.

use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::dependency::{DependencyCounts, SharedDependencies};
use crate::errors::*;
use crate::object::{Eligibility, ObjectState};

/// Identity of a loaded resource.
pub trait Target: Debug + Clone + Eq + Hash + Send + 'static {}

impl<T: Debug + Clone + Eq + Hash + Send + 'static> Target for T {}

/// Performs the physical unloading of targets.
pub trait ReleaseSink<T>: Send + Sync {
    fn release(&self, target: T);
}

impl<T, F> ReleaseSink<T> for F
where
    F: Fn(T) + Send + Sync,
{
    #[inline]
    fn release(&self, target: T) {
        (self)(target)
    }
}

pub struct ResourceObject<T: Target, B: Eligibility = ObjectState> {
    name: String,
    target: T,
    state: B,
    dependencies: SmallVec<[T; 4]>,
    sink: Arc<dyn ReleaseSink<T>>,
    counts: SharedDependencies<T>,
    released: bool,
}

impl<T: Target> ResourceObject<T> {
    /// Starts building a `ResourceObject` with the default `ObjectState`.
    pub fn build<N: Into<String>>(name: N, target: T) -> ResourceObjectBuilder<T> {
        ResourceObjectBuilder {
            name: name.into(),
            target,
            state: ObjectState::default(),
            sink: None,
            counts: None,
        }
    }
}

impl<T: Target, B: Eligibility> ResourceObject<T, B> {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn target(&self) -> &T {
        &self.target
    }

    #[inline]
    pub fn state(&self) -> &B {
        &self.state
    }

    #[inline]
    pub fn state_mut(&mut self) -> &mut B {
        &mut self.state
    }

    /// Gets the dependencies in declaration order.
    #[inline]
    pub fn dependencies(&self) -> &[T] {
        &self.dependencies
    }

    #[inline]
    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Gets the table this object does its bookkeeping in.
    #[inline]
    pub fn shared_dependencies(&self) -> &SharedDependencies<T> {
        &self.counts
    }

    /// Checks if this object could be released right now: the base state allows it
    /// and no live resource depends on the target.
    pub fn can_release(&self) -> bool {
        let counts = self.counts.lock();
        self.can_release_with(&counts)
    }

    /// Declares `dependency` as a resource this one relies on. Returns false if it
    /// has been declared already.
    pub fn add_dependency(&mut self, dependency: T) -> bool {
        let counts = self.counts.clone();
        let mut counts = counts.lock();
        self.add_dependency_with(&mut counts, dependency)
    }

    /// Releases the target.
    ///
    /// On the normal path this fails with `DanglingReference` if anything still depends
    /// on the target, or with `InconsistentState` if one of the dependencies has no
    /// entry to decrement. Nothing is mutated and the sink is not called in both cases.
    pub fn release(&mut self, is_shutdown: bool) -> Result<()> {
        let counts = self.counts.clone();
        let mut counts = counts.lock();
        self.release_with(&mut counts, is_shutdown)
    }

    /// `can_release` against a guard the caller already holds on this object's table.
    pub(crate) fn can_release_with(&self, counts: &DependencyCounts<T>) -> bool {
        !self.released && self.state.can_release() && counts.count(&self.target) == 0
    }

    pub(crate) fn add_dependency_with(
        &mut self,
        counts: &mut DependencyCounts<T>,
        dependency: T,
    ) -> bool {
        if self.released {
            warn!(
                "Ignores dependency {:?} declared on released resource '{}'.",
                dependency, self.name
            );
            return false;
        }

        if self.dependencies.contains(&dependency) {
            return false;
        }

        self.dependencies.push(dependency.clone());
        let count = counts.increment(dependency);
        trace!(
            "Resource '{}' depends on {:?}, which has {} dependents now.",
            self.name,
            self.dependencies[self.dependencies.len() - 1],
            count
        );

        true
    }

    pub(crate) fn release_with(
        &mut self,
        counts: &mut DependencyCounts<T>,
        is_shutdown: bool,
    ) -> Result<()> {
        if self.released {
            return Err(Error::Released(self.name.clone()));
        }

        if !is_shutdown {
            let count = counts.count(&self.target);
            if count > 0 {
                error!(
                    "Releases resource '{}' while {} resources still depend on it.",
                    self.name, count
                );

                return Err(Error::DanglingReference {
                    name: self.name.clone(),
                    count,
                });
            }

            // Validates every entry before touching any of them.
            for v in &self.dependencies {
                if counts.count(v) == 0 {
                    error!(
                        "Dependency {:?} of resource '{}' has no reference to return.",
                        v, self.name
                    );

                    return Err(Error::InconsistentState {
                        name: self.name.clone(),
                        dependency: format!("{:?}", v),
                    });
                }
            }

            for v in &self.dependencies {
                counts.decrement(v);
            }
        } else if counts.count(&self.target) > 0 {
            debug!(
                "Shutdown releases resource '{}' with {} dependents outstanding.",
                self.name,
                counts.count(&self.target)
            );
        }

        counts.remove(&self.target);
        self.released = true;

        info!("Releases resource '{}'.", self.name);
        self.sink.release(self.target.clone());
        Ok(())
    }
}

impl<T: Target, B: Eligibility + Debug> Debug for ResourceObject<T, B> {
    fn fmt(&self, f: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
        f.debug_struct("ResourceObject")
            .field("name", &self.name)
            .field("target", &self.target)
            .field("state", &self.state)
            .field("dependencies", &self.dependencies)
            .field("released", &self.released)
            .finish()
    }
}

/// Collects everything a `ResourceObject` requires. The release sink and the shared
/// dependency table are mandatory.
pub struct ResourceObjectBuilder<T: Target, B: Eligibility = ObjectState> {
    name: String,
    target: T,
    state: B,
    sink: Option<Arc<dyn ReleaseSink<T>>>,
    counts: Option<SharedDependencies<T>>,
}

impl<T: Target, B: Eligibility> ResourceObjectBuilder<T, B> {
    /// Replaces the base state with any other `Eligibility`.
    pub fn with_state<S: Eligibility>(self, state: S) -> ResourceObjectBuilder<T, S> {
        ResourceObjectBuilder {
            name: self.name,
            target: self.target,
            state,
            sink: self.sink,
            counts: self.counts,
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn ReleaseSink<T>>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn with_dependencies(mut self, counts: SharedDependencies<T>) -> Self {
        self.counts = Some(counts);
        self
    }

    pub fn finish(self) -> Result<ResourceObject<T, B>> {
        let ResourceObjectBuilder {
            name,
            target,
            state,
            sink,
            counts,
        } = self;

        let sink = sink.ok_or_else(|| {
            Error::Configuration(format!("resource '{}' has no release sink", name))
        })?;

        let counts = counts.ok_or_else(|| {
            Error::Configuration(format!("resource '{}' has no dependency table", name))
        })?;

        Ok(ResourceObject {
            name,
            target,
            state,
            dependencies: SmallVec::new(),
            sink,
            counts,
            released: false,
        })
    }
}
