//! Command-line interface definitions for reapack-index.
//!
//! The definitions are shared between the main binary and xtask, which
//! renders man pages from them.
//!
//! Field-level documentation is provided via clap attributes, so missing
//! docs are allowed in this module.

#![allow(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

use crate::index::LinkRel;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Main CLI structure for reapack-index.
#[derive(Parser)]
#[command(
    name = "reapack-index",
    version = crate::VERSION,
    about = "Package indexer for ReaPack repositories",
    long_about = "Builds and maintains a ReaPack index document from the history of a git repository"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Show verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress informational messages
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Repository to index
    #[arg(short = 'C', long = "repo", global = true, default_value = ".")]
    pub repo: PathBuf,

    /// Index document path, relative to the repository root
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,
}

/// All available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Index the commits made since the last scan
    Scan {
        /// Discard the stored watermark and replay the whole history
        #[arg(long)]
        rebuild: bool,

        /// Re-process versions that are already indexed
        #[arg(long, overrides_with = "no_amend")]
        amend: bool,

        /// Never modify versions that are already indexed
        #[arg(long)]
        no_amend: bool,

        /// Fail without writing when any file is skipped
        #[arg(long)]
        strict: bool,

        /// Download URL template ($path, $commit, $version, $package)
        #[arg(long)]
        url_template: Option<String>,

        /// Repository name stored in the index
        #[arg(long)]
        name: Option<String>,
    },

    /// Validate the package files of the working tree
    Check,

    /// List indexed packages
    Ls {
        /// Only list packages of this category
        category: Option<String>,

        /// Show every version instead of the latest
        #[arg(short, long)]
        all: bool,
    },

    /// Manage repository links
    Link {
        #[command(subcommand)]
        action: LinkAction,
    },

    /// Set the repository about text
    About {
        /// File holding the text
        #[arg(required_unless_present = "clear")]
        file: Option<PathBuf>,

        /// Remove the about text
        #[arg(long, conflicts_with = "file")]
        clear: bool,
    },

    /// Generate shell completion scripts
    Completion {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum LinkAction {
    /// Add or rename links (`name=url`, `name url` or a bare URL)
    Add {
        /// Link category: website, donation or screenshot
        #[arg(short, long, default_value = "website")]
        rel: LinkRel,

        #[arg(required = true)]
        links: Vec<String>,
    },

    /// Remove links by name or URL
    Remove {
        /// Link category: website, donation or screenshot
        #[arg(short, long, default_value = "website")]
        rel: LinkRel,

        #[arg(required = true)]
        links: Vec<String>,
    },
}
