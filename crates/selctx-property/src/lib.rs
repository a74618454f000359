#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::multiple_crate_versions,
    clippy::redundant_pub_crate
)]

//! Per-field label properties and the convergence pass that drives them.
//!
//! Layout: `field.rs` (generic `FieldProperty`), `resource.rs` (`ManagedResource` and the
//! file-backed handle), `converge.rs` (retrieve/compare/sync driver and reports),
//! `error.rs` (property and resource errors).

pub mod converge;
pub mod error;
pub mod field;
pub mod resource;

#[cfg(test)]
mod testing;

pub use converge::{ConvergeMode, Convergence, ConvergenceReport, FieldOutcome, FieldReport};
pub use error::{PropertyError, PropertyResult, ResourceError, ResourceResult};
pub use field::{FieldProperty, FieldState, SyncEvent};
pub use resource::{EnsureKind, FileResource, ManagedResource};
