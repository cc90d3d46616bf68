use crate::RepoContext;
use crate::commands::context::CommandContext;
use anyhow::{Context, Result};
use std::path::Path;

/// Set the repository about text from a file, or clear it
///
/// # Errors
///
/// Returns an error if the file or the index cannot be read, or the index
/// cannot be written
pub fn execute(ctx: &RepoContext, file: Option<&Path>) -> Result<()> {
    let mut index = ctx.load_index()?;

    let about = match file {
        Some(path) => Some(
            std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?,
        ),
        None => None,
    };
    index.metadata_mut().set_about(about.as_deref());

    ctx.save_index(&mut index)?;
    Ok(())
}
