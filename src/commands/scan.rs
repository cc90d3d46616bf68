use crate::RepoContext;
use crate::commands::context::CommandContext;
use crate::git::GitHistory;
use crate::indexer::{History, Indexer, Pending, Revision, ScanReport};
use crate::output;
use anyhow::{Context, Result, bail};
use tracing::info;

/// Flags of the `scan` command that override the configuration.
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Replay the whole history into an emptied index
    pub rebuild: bool,
    /// Amend mode override
    pub amend: Option<bool>,
    /// Refuse to write when any file was skipped
    pub strict: bool,
    /// Download URL template override
    pub url_template: Option<String>,
    /// Repository name override
    pub name: Option<String>,
}

/// Execute the scan command to bring the index up to date with history
///
/// # Errors
///
/// Returns an error if:
/// - The repository is not a git repository
/// - The index document or configuration is invalid
/// - Git fails while listing or reading revisions
/// - Strict mode is enabled and any file was skipped
pub fn execute(ctx: &RepoContext, options: &ScanOptions) -> Result<()> {
    let history = GitHistory::open(&ctx.root)?;
    let mut index = ctx.load_index()?;

    if let Some(template) = &options.url_template {
        index.set_url_template(Some(template))?;
    }
    if let Some(name) = &options.name {
        index.set_name(Some(name))?;
    }
    if let Some(amend) = options.amend {
        index.set_amend(amend);
    }
    if index.url_template().is_none() {
        output::warning("No URL template configured; packages with sources will be skipped");
    }

    if options.rebuild {
        index.clear_packages();
    }

    let mut indexer = Indexer::new(&mut index);
    let revisions = match indexer.pending(&history)? {
        Pending::Revisions(revisions) => revisions,
        Pending::UnknownWatermark(id) => {
            output::warning(&format!(
                "Last indexed commit {} is not in the history, rescanning everything",
                output::short_id(&id)
            ));
            history.revisions().context("Failed to list revisions")?
        }
    };

    if revisions.is_empty() {
        output::info("Index is up to date");
    }

    let mut report = ScanReport::default();
    let mut progress = output::start_progress("Indexing commits", revisions.len());
    for revision in &revisions {
        progress.tick(output::short_id(revision.id()));
        output::verbose(&format!("Indexing {}", revision.id()));
        report.warnings.extend(indexer.process(revision)?);
        report.revisions += 1;
    }
    progress.finish();

    info!(
        revisions = report.revisions,
        warnings = report.warnings.len(),
        "scan finished"
    );
    output::scan_warnings(&report.warnings);

    let strict = options.strict || ctx.config.index.strict;
    if strict && !report.warnings.is_empty() {
        bail!(
            "{} file(s) skipped in strict mode, index not written",
            report.warnings.len()
        );
    }

    ctx.save_index(&mut index)?;
    Ok(())
}
