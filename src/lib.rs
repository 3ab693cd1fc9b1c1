//! Dependency-counted release of pooled resources.
//!
//! Loaded resources often form a graph: a model depends on its textures, a material
//! depends on its shaders. None of them may be unloaded while something still depends
//! on it. This crate supplies the bookkeeping that enforces it.
//!
//! # ResourceObject
//!
//! Every loaded resource is wrapped in a `ResourceObject`, which records the resources
//! it depends on and counts itself as a dependent of each of them in a table shared by
//! the whole pool. A `ResourceObject` could only be released once its own count drops
//! to zero, and releasing it returns the references it holds on its dependencies.
//!
//! The physical unloading is delegated to a `ReleaseSink`.
//!
//! # ResourcePool
//!
//! The `ResourcePool` owns the shared table and the sink, tracks whether objects are
//! locked or borrowed, and decides when to release them. During shutdown it forces
//! every object out without consistency checks.
//!
//! ```rust
//! use resource_lifecycle::prelude::*;
//!
//! let mut pool = ResourcePool::new(PoolParams::default(), |_: &'static str| {});
//! pool.register("crate.obj", "model").unwrap();
//! pool.register("crate.png", "texture").unwrap();
//! pool.add_dependency(&"model", "texture").unwrap();
//!
//! assert!(!pool.can_release(&"texture").unwrap());
//! assert_eq!(pool.release_all_unused().unwrap(), 2);
//! ```

#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;
#[macro_use]
extern crate serde;

pub mod dependency;
pub mod errors;
pub mod object;
pub mod pool;
pub mod resource;

pub mod prelude {
    pub use crate::dependency::{DependencyCounts, SharedDependencies};
    pub use crate::errors::{Error, Result};
    pub use crate::object::{Eligibility, ObjectState};
    pub use crate::pool::{ObjectInfo, PoolParams, ResourcePool};
    pub use crate::resource::{ReleaseSink, ResourceObject, ResourceObjectBuilder, Target};
}
