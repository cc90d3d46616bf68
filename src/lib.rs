#![warn(missing_docs)]
#![allow(clippy::arithmetic_side_effects)] // Counters over in-memory collections cannot overflow
#![allow(clippy::indexing_slicing)] // Bounds checked by logic

//! # reapack-index - Package indexer for ReaPack repositories
//!
//! Scans the history of a git repository of REAPER packages and maintains
//! the XML index document ReaPack clients download.
//!
//! ## Features
//!
//! - **Metadata headers**: `@tag value` comments at the top of each package file
//! - **Provides**: extra files, per-platform sources and install destinations
//! - **Conflict detection**: two packages may never install the same file
//! - **Incremental**: only commits after the stored watermark are replayed
//! - **Atomic scans**: a file that fails to scan leaves the index untouched
//!
//! ## Architecture
//!
//! - [`header`]: metadata header parsing and validation rules
//! - [`provides`]: the `@provides` line grammar
//! - [`index`]: the document model, change tracking and XML persistence
//! - [`scanner`]: turns one package file into versions and sources
//! - [`conflicts`]: install path ownership across packages
//! - [`indexer`]: history replay, resume and ad hoc checks
//! - [`git`]: history and working tree access through the `git` executable
//! - [`commands`]: CLI command implementations
//! - [`config`]: repository configuration parsing and validation
//! - [`output`]: output formatting and progress display
//!
//! ## Example Usage
//!
//! ```no_run
//! use reapack_index::git::GitHistory;
//! use reapack_index::index::Index;
//! use reapack_index::indexer::Indexer;
//! use std::path::Path;
//!
//! # fn main() -> anyhow::Result<()> {
//! let history = GitHistory::open(Path::new("."))?;
//! let mut index = Index::load(Path::new("index.xml"))?;
//! index.set_url_template(Some("https://example.com/$commit/$path"))?;
//!
//! let outcome = Indexer::new(&mut index).resume(&history)?;
//! println!("{outcome:?}: {}", index.changelog());
//! index.write(Path::new("index.xml"))?;
//! # Ok(())
//! # }
//! ```

/// Command-line interface definitions (argument parsing structures).
pub mod cli;

/// Command implementations.
pub mod commands;

/// Configuration parsing, validation, and management.
pub mod config;

/// Install path ownership and conflict reporting.
pub mod conflicts;

/// Library error types.
pub mod error;

/// Git history and working tree access.
pub mod git;

/// Metadata header parsing and validation.
pub mod header;

/// Index document model and persistence.
pub mod index;

/// History replay and checks.
pub mod indexer;

/// Output formatting and progress display.
pub mod output;

/// `@provides` line parsing.
pub mod provides;

/// Package file scanning.
pub mod scanner;

/// Package types, platforms and UI sections.
pub mod types;

/// Path and glob helpers.
pub mod utils;

pub use error::{IndexError, Result, ValidationError};
pub use index::Index;

use anyhow::Context;
use std::path::{Path, PathBuf};

/// Current version of the reapack-index binary.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Shared state for CLI commands operating on one repository.
///
/// # Examples
///
/// ```no_run
/// use reapack_index::RepoContext;
/// use std::path::Path;
///
/// # fn main() -> anyhow::Result<()> {
/// let ctx = RepoContext::new(Path::new("."), None)?;
/// println!("index at {}", ctx.index_path.display());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RepoContext {
    /// Repository root; the git work tree top level when available.
    pub root: PathBuf,

    /// Path of the index document.
    pub index_path: PathBuf,

    /// Loaded configuration settings.
    pub config: config::Config,
}

impl RepoContext {
    /// Locate the repository containing `path` and load its configuration.
    ///
    /// `output` overrides the configured document path; relative paths are
    /// resolved against the repository root.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file cannot be read or parsed.
    pub fn new(path: &Path, output: Option<PathBuf>) -> anyhow::Result<Self> {
        let root = match git::GitHistory::open(path) {
            Ok(history) => history.root().to_path_buf(),
            Err(_) => path.to_path_buf(),
        };

        let config_path = root.join(config::CONFIG_FILE);
        config::validator::ConfigValidator::new()
            .validate_config_file(&config_path)
            .context("Failed to validate configuration")?;
        let mut config = config::Config::load(&config_path)?;

        if let Some(output) = output {
            config.index.output = output;
        }
        let index_path = root.join(&config.index.output);

        Ok(Self {
            root,
            index_path,
            config,
        })
    }
}
