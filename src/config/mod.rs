// src/config/mod.rs

//! Configuration loading and validation for serverun.
//!
//! Responsibilities:
//! - Define the TOML-backed data model and resolved types (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Merge CLI flags over the file and validate the result
//!   (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_options_path, load_from_path, resolve_options};
pub use model::{
    RawOptionsFile, ResolvedOptions, ResolvedService, ServicePatterns, ServiceSection,
    TaskOptions,
};
pub use validate::merge_and_validate;
