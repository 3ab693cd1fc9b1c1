//! # ResourcePool
//!
//! The `ResourcePool` keeps the `ResourceObject`s of one kind of resource, and owns the
//! dependency table and the release sink they share. It is the piece that decides
//! _when_ an object is asked to release; the `ResourceObject` decides whether it is
//! _safe_ to.
//!
//! Every eligibility check is evaluated under the same table lock as the release it
//! gates, so an object can not pick up a new dependent in between.

use std::collections::hash_map::{Entry, HashMap};
use std::sync::Arc;

use crate::dependency::SharedDependencies;
use crate::errors::*;
use crate::object::ObjectState;
use crate::resource::{ReleaseSink, ResourceObject, Target};

/// The setup parameters of a `ResourcePool`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolParams {
    /// Readable name used in logs.
    pub name: String,
    /// Number of objects to reserve room for.
    pub capacity: usize,
    /// Keeps releasing in `release_all_unused` until nothing else becomes eligible.
    pub cascade: bool,
}

impl Default for PoolParams {
    fn default() -> Self {
        PoolParams {
            name: "resources".into(),
            capacity: 0,
            cascade: true,
        }
    }
}

/// A serializable snapshot of one pooled object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectInfo {
    pub name: String,
    pub locked: bool,
    pub spawn_count: u32,
    /// Number of live objects that depend on this one.
    pub dependents: u32,
    /// Number of objects this one depends on.
    pub dependencies: usize,
    pub releasable: bool,
}

pub struct ResourcePool<T: Target> {
    params: PoolParams,
    objects: HashMap<T, ResourceObject<T>>,
    counts: SharedDependencies<T>,
    sink: Arc<dyn ReleaseSink<T>>,
}

impl<T: Target> ResourcePool<T> {
    /// Creates a new and empty `ResourcePool`.
    pub fn new<S: ReleaseSink<T> + 'static>(params: PoolParams, sink: S) -> Self {
        Self::with_sink(params, Arc::new(sink))
    }

    pub fn with_sink(params: PoolParams, sink: Arc<dyn ReleaseSink<T>>) -> Self {
        debug!("Creates resource pool '{}'.", params.name);

        ResourcePool {
            objects: HashMap::with_capacity(params.capacity),
            counts: SharedDependencies::with_capacity(params.capacity),
            sink,
            params,
        }
    }

    #[inline]
    pub fn params(&self) -> &PoolParams {
        &self.params
    }

    /// Gets the dependency table shared by every object of this pool.
    #[inline]
    pub fn shared_dependencies(&self) -> &SharedDependencies<T> {
        &self.counts
    }

    /// Registers a freshly loaded target.
    pub fn register<N: Into<String>>(&mut self, name: N, target: T) -> Result<()> {
        let object = ResourceObject::build(name, target.clone())
            .with_sink(self.sink.clone())
            .with_dependencies(self.counts.clone())
            .finish()?;

        match self.objects.entry(target) {
            Entry::Occupied(v) => Err(Error::Duplicated(format!("{:?}", v.key()))),
            Entry::Vacant(v) => {
                debug!("Registers resource '{}' into '{}'.", object.name(), self.params.name);
                v.insert(object);
                Ok(())
            }
        }
    }

    /// Declares that `target` depends on `dependency`. Returns false if it has been
    /// declared before.
    pub fn add_dependency(&mut self, target: &T, dependency: T) -> Result<bool> {
        let object = self
            .objects
            .get_mut(target)
            .ok_or_else(|| Error::NotFound(format!("{:?}", target)))?;

        let mut counts = self.counts.lock();
        Ok(object.add_dependency_with(&mut counts, dependency))
    }

    /// Marks `target` as borrowed.
    pub fn spawn(&mut self, target: &T) -> Result<()> {
        self.state_mut(target)?.spawn();
        Ok(())
    }

    /// Returns a borrow of `target`.
    pub fn unspawn(&mut self, target: &T) -> Result<()> {
        let object = self
            .objects
            .get_mut(target)
            .ok_or_else(|| Error::NotFound(format!("{:?}", target)))?;

        if object.state_mut().unspawn() {
            Ok(())
        } else {
            Err(Error::NotInUse(object.name().to_owned()))
        }
    }

    /// Pins or unpins `target` into the pool.
    pub fn set_locked(&mut self, target: &T, locked: bool) -> Result<()> {
        self.state_mut(target)?.set_locked(locked);
        Ok(())
    }

    #[inline]
    pub fn contains(&self, target: &T) -> bool {
        self.objects.contains_key(target)
    }

    #[inline]
    pub fn get(&self, target: &T) -> Option<&ResourceObject<T>> {
        self.objects.get(target)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Gets the number of live objects that depend on `target`.
    #[inline]
    pub fn dependency_count(&self, target: &T) -> u32 {
        self.counts.count(target)
    }

    pub fn can_release(&self, target: &T) -> Result<bool> {
        let object = self
            .objects
            .get(target)
            .ok_or_else(|| Error::NotFound(format!("{:?}", target)))?;

        let counts = self.counts.lock();
        Ok(object.can_release_with(&counts))
    }

    /// Releases `target` if it is eligible, and removes it from this pool. Returns
    /// false if it was not eligible.
    pub fn release(&mut self, target: &T) -> Result<bool> {
        let object = self
            .objects
            .get_mut(target)
            .ok_or_else(|| Error::NotFound(format!("{:?}", target)))?;

        {
            let mut counts = self.counts.lock();
            if !object.can_release_with(&counts) {
                return Ok(false);
            }

            object.release_with(&mut counts, false)?;
        }

        self.objects.remove(target);
        Ok(true)
    }

    /// Releases every eligible object. Returns the number of released objects.
    ///
    /// On error, the objects released before the failure stay released and are gone
    /// from this pool.
    pub fn release_all_unused(&mut self) -> Result<usize> {
        let mut released = 0;

        loop {
            let mut pass = 0;

            {
                let mut counts = self.counts.lock();
                let candidates: Vec<T> = self
                    .objects
                    .iter()
                    .filter(|(_, v)| v.can_release_with(&counts))
                    .map(|(k, _)| k.clone())
                    .collect();

                // Releasing only ever lowers counts, so the candidates stay eligible.
                for target in candidates {
                    if let Some(object) = self.objects.get_mut(&target) {
                        if let Err(err) = object.release_with(&mut counts, false) {
                            warn!(
                                "Stops releasing unused resources from '{}' after {} released.",
                                self.params.name,
                                released + pass
                            );
                            return Err(err);
                        }

                        self.objects.remove(&target);
                        pass += 1;
                    }
                }
            }

            released += pass;
            if pass == 0 || !self.params.cascade {
                break;
            }
        }

        if released > 0 {
            debug!(
                "Releases {} unused resources from '{}', {} left.",
                released,
                self.params.name,
                self.objects.len()
            );
        }

        Ok(released)
    }

    /// Releases every object regardless of what still depends on it.
    pub fn shutdown(&mut self) {
        let mut counts = self.counts.lock();

        if self.objects.is_empty() {
            counts.clear();
            return;
        }

        let debts = counts.iter().filter(|&(_, &v)| v > 0).count();
        if debts > 0 {
            warn!(
                "Shuts down resource pool '{}' with {} resources still depended on.",
                self.params.name, debts
            );
        }

        for (_, mut object) in self.objects.drain() {
            if let Err(err) = object.release_with(&mut counts, true) {
                warn!("{}", err);
            }
        }

        counts.clear();
    }

    /// Takes a snapshot of every object, sorted by name.
    pub fn info(&self) -> Vec<ObjectInfo> {
        let counts = self.counts.lock();

        let mut infos: Vec<ObjectInfo> = self
            .objects
            .values()
            .map(|v| ObjectInfo {
                name: v.name().to_owned(),
                locked: v.state().is_locked(),
                spawn_count: v.state().spawn_count(),
                dependents: counts.count(v.target()),
                dependencies: v.dependencies().len(),
                releasable: v.can_release_with(&counts),
            })
            .collect();

        infos.sort_by(|lhs, rhs| lhs.name.cmp(&rhs.name));
        infos
    }

    fn state_mut(&mut self, target: &T) -> Result<&mut ObjectState> {
        self.objects
            .get_mut(target)
            .map(|v| v.state_mut())
            .ok_or_else(|| Error::NotFound(format!("{:?}", target)))
    }
}

impl<T: Target> Drop for ResourcePool<T> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
