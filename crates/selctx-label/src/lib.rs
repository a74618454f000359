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
#![allow(clippy::module_name_repetitions, clippy::multiple_crate_versions)]

//! SELinux file-label access: parsing, serialisation and the platform boundary.
//!
//! Layout: `label.rs` (label values, field table, format), `accessor.rs` (the
//! `LabelAccessor` seam), `command.rs` (tool-backed platform accessor), `memory.rs`
//! (in-process simulation), `error.rs` (error taxonomy).

pub mod accessor;
pub mod command;
pub mod error;
pub mod label;
pub mod memory;

pub use accessor::{LabelAccessor, LabelQuery};
pub use command::{CommandAccessor, ToolCommand, ToolSet};
pub use error::{LabelError, LabelResult};
pub use label::{FieldKind, FieldSpec, LabelFormat, SecurityLabel};
pub use memory::{AppliedField, InMemoryAccessor};
