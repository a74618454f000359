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

//! File-backed settings and label declarations for selctx runs.
//!
//! Layout: `model.rs` (settings, declarations, manifest), `loader.rs` (JSON loading and
//! environment overrides), `validate.rs` (validation helpers), `error.rs` (error type).

pub mod error;
pub mod loader;
pub mod model;
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::{
    ENV_LABEL_FORMAT, ENV_LOG_FORMAT, ENV_LOG_LEVEL, apply_env_overrides, apply_process_env,
    load_manifest,
};
pub use model::{LabelDeclaration, LoggingSettings, Manifest, Settings};
pub use validate::{validate_manifest, validate_settings};
