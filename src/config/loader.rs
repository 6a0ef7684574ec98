// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::CliArgs;
use crate::config::model::{RawOptionsFile, ResolvedOptions};
use crate::config::validate;
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw
/// `RawOptionsFile`.
///
/// This only performs TOML deserialization; it does **not** merge the
/// CLI or validate the result. Use [`resolve_options`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawOptionsFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawOptionsFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Resolve the effective options for a run.
///
/// The one entry point everything else should go through:
///
/// - Reads TOML from `--config`, or from [`default_options_path`] when
///   that file exists, or starts from an empty file.
/// - Layers the CLI flags on top.
/// - Validates the merged result (command present, service patterns
///   compile, patterns only given alongside a service).
pub fn resolve_options(args: &CliArgs) -> Result<ResolvedOptions> {
    let raw = match &args.config {
        Some(path) => load_from_path(path)?,
        None => {
            let path = default_options_path();
            if path.exists() {
                load_from_path(&path)?
            } else {
                RawOptionsFile::default()
            }
        }
    };

    validate::merge_and_validate(args, raw)
}

/// Where the options file lives when `--config` is not given:
/// `Serverun.toml` in the current working directory. Kept as a
/// function so a search path or an env override has somewhere to go.
pub fn default_options_path() -> PathBuf {
    PathBuf::from("Serverun.toml")
}
