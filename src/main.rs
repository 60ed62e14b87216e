// src/main.rs

use anyhow::Result;
use clap::{Parser, Subcommand};
use satdex::config::{Config, DEFAULT_CONFIG_PATH};
use satdex::registry::{generate_scaffold, GithubStore};
use satdex::{pipeline, RunReport};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "satdex")]
#[command(author, version, about = "Sat name registry builder for the ordinals content index", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log unrecoverable errors but still exit zero
    #[arg(long, global = true)]
    best_effort: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest the index, rebuild the ledger and publish the registry
    Run,
    /// Ingest the index and stage registry files locally without publishing
    Build,
    /// Create the local placeholder layout only
    Scaffold,
    /// Write a default configuration file
    InitConfig {
        /// Where to write it (default: satdex.toml)
        path: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match dispatch(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            if best_effort(&cli) {
                warn!("Best-effort mode: exiting zero despite the error above");
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn dispatch(cli: &Cli) -> Result<()> {
    match &cli.command {
        Some(Commands::Run) => cmd_run(cli),
        Some(Commands::Build) => cmd_build(cli),
        Some(Commands::Scaffold) => cmd_scaffold(cli),
        Some(Commands::InitConfig { path }) => cmd_init_config(path.as_deref()),
        None => {
            println!("satdex v{}", env!("CARGO_PKG_VERSION"));
            println!("Run 'satdex --help' for usage information");
            Ok(())
        }
    }
}

fn config_path(cli: &Cli) -> PathBuf {
    cli.config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

fn load_config(cli: &Cli) -> Result<Config> {
    Ok(Config::load(&config_path(cli))?)
}

/// Whether unrecoverable errors should still exit zero.
///
/// The flag wins; otherwise the config file decides. Only consulted on
/// the error path, so a config that itself fails to load simply leaves
/// the default propagate policy in place.
fn best_effort(cli: &Cli) -> bool {
    cli.best_effort
        || Config::load(&config_path(cli))
            .map(|config| config.run.best_effort)
            .unwrap_or(false)
}

fn cmd_run(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;
    info!(
        "Publishing registry to {}/{} on branch {}",
        config.github.owner, config.github.repo, config.github.branch
    );

    let store = GithubStore::new(&config.github)?;
    let report = pipeline::run(&config, &store)?;

    print_report(&report);
    println!("Chunks: {}", report.chunk_tally);
    println!("Registry sweep: {}", report.registry_tally);

    let failed = report.chunk_tally.failed + report.registry_tally.failed;
    if failed > 0 {
        warn!("{} objects failed to publish, see the log above", failed);
        println!("Warning: {failed} objects failed to publish");
    }
    Ok(())
}

fn cmd_build(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;
    let report = pipeline::build_local(&config)?;

    print_report(&report);
    println!(
        "Staged registry under {}",
        config.registry.local_dir().display()
    );
    Ok(())
}

fn cmd_scaffold(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;
    let report = generate_scaffold(&config.registry)?;

    println!(
        "Scaffolded {} files ({} already present) under {}",
        report.created,
        report.skipped,
        config.registry.local_dir().display()
    );
    Ok(())
}

fn cmd_init_config(path: Option<&Path>) -> Result<()> {
    let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH));
    if path.exists() {
        return Err(anyhow::anyhow!(
            "{} already exists, refusing to overwrite",
            path.display()
        ));
    }

    fs::write(path, Config::default().to_toml_string()?)?;
    println!("Wrote default configuration to {}", path.display());
    println!("Edit github.owner and set github.token (or GITHUB_TOKEN) before running");
    Ok(())
}

fn print_report(report: &RunReport) {
    println!(
        "Ledger: {} entries in {} chunks",
        report.entries, report.chunks
    );
}
