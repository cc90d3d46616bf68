use crate::RepoContext;
use crate::commands::context::CommandContext;
use crate::index::{Index, LinkRel};
use crate::output;
use anyhow::{Result, anyhow};

/// Add or rename repository links, then write the index
///
/// # Errors
///
/// Returns an error if the index cannot be loaded or written, or if any
/// line is not a valid link. Nothing is written on error.
pub fn add(ctx: &RepoContext, rel: LinkRel, lines: &[String]) -> Result<()> {
    let mut index = ctx.load_index()?;
    add_links(&mut index, rel, lines)?;
    ctx.save_index(&mut index)?;
    Ok(())
}

/// Remove repository links by name or URL, then write the index
///
/// # Errors
///
/// Returns an error if the index cannot be loaded or written
pub fn remove(ctx: &RepoContext, rel: LinkRel, names: &[String]) -> Result<()> {
    let mut index = ctx.load_index()?;
    for name in names {
        if !index.metadata_mut().remove_link(rel, name) {
            output::warning(&format!("No {rel} link matches '{name}'"));
        }
    }
    ctx.save_index(&mut index)?;
    Ok(())
}

fn add_links(index: &mut Index, rel: LinkRel, lines: &[String]) -> Result<()> {
    for line in lines {
        index
            .metadata_mut()
            .push_link(rel, line)
            .map_err(|reason| anyhow!("Invalid {rel} link '{line}': {reason}"))?;
    }
    Ok(())
}
