use crate::RepoContext;
use crate::commands::context::CommandContext;
use crate::git::WorkingTree;
use crate::indexer::Indexer;
use crate::output;
use anyhow::{Result, bail};

/// Execute the check command against the working tree
///
/// The index document is read but never written.
///
/// # Errors
///
/// Returns an error if the index cannot be loaded, the working tree cannot
/// be listed, or any package file is invalid
pub fn execute(ctx: &RepoContext) -> Result<()> {
    let index = ctx.load_index()?;
    let tree = WorkingTree::new(&ctx.root);
    let failures = Indexer::check(&index, &tree)?;

    if failures.is_empty() {
        output::success("No errors found");
        return Ok(());
    }

    output::check_failures(&failures);
    bail!(
        "{} invalid package file{}",
        failures.len(),
        if failures.len() == 1 { "" } else { "s" }
    )
}
