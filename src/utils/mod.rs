//! Small helpers shared across the crate.
//!
//! # Submodules
//!
//! - [`paths`]: slash-separated repository path manipulation
//! - [`glob`]: provides pattern expansion against the file pool

/// Provides pattern matching with brace alternation
pub mod glob;
/// Repository-relative path manipulation
pub mod paths;
