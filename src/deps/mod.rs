//! Dependency resolution and precedence ordering.
//!
//! The walk happens in three stages: a provider turns a root object into a
//! dependency graph (one catalog round trip), the flattener expands the
//! graph path-wise into tiered records, and the precedence step collapses
//! repeats and emits entries in safe application order.

pub mod flatten;
pub mod precedence;
pub mod provider;
pub mod resolver;
pub mod script;
pub mod types;

pub use flatten::{Flattened, flatten};
pub use provider::{CatalogProvider, DependencyProvider};
pub use resolver::{Resolution, ResolveOptions, resolve_dependencies};
pub use types::{
    DependencyGraph, DiscoveryOptions, FlattenedEntry, ObjectDetails, ObjectKind, ObjectRef,
    ResolvedDependency, ServerIdentity, Urn, parse_object_name,
};
