use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::{Generator, generate};
use colored::Colorize;
use reapack_index::RepoContext;
use reapack_index::cli::{Cli, Commands, LinkAction};
use reapack_index::commands;
use reapack_index::commands::scan::ScanOptions;
use reapack_index::output::{self, Verbosity};
use std::io;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "reapack_index=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);
    output::set_verbosity(if cli.quiet {
        Verbosity::Quiet
    } else if cli.verbose {
        Verbosity::Verbose
    } else {
        Verbosity::Normal
    });

    if let Commands::Completion { shell } = cli.command {
        print_completions(shell, &mut Cli::command());
        return Ok(());
    }

    let ctx = RepoContext::new(&cli.repo, cli.output)?;

    match cli.command {
        Commands::Scan {
            rebuild,
            amend,
            no_amend,
            strict,
            url_template,
            name,
        } => {
            let amend = if amend {
                Some(true)
            } else if no_amend {
                Some(false)
            } else {
                None
            };
            commands::scan::execute(
                &ctx,
                &ScanOptions {
                    rebuild,
                    amend,
                    strict,
                    url_template,
                    name,
                },
            )?;
        }
        Commands::Check => commands::check::execute(&ctx)?,
        Commands::Ls { category, all } => commands::ls::execute(&ctx, category.as_deref(), all)?,
        Commands::Link { action } => match action {
            LinkAction::Add { rel, links } => commands::link::add(&ctx, rel, &links)?,
            LinkAction::Remove { rel, links } => commands::link::remove(&ctx, rel, &links)?,
        },
        Commands::About { file, clear } => {
            let file = if clear { None } else { file };
            commands::about::execute(&ctx, file.as_deref())?;
        }
        Commands::Completion { .. } => {}
    }

    Ok(())
}

fn print_completions<G: Generator>(g: G, cmd: &mut clap::Command) {
    generate(g, cmd, cmd.get_name().to_string(), &mut io::stdout());
}
