//! docsync command line.
//!
//! Logs go to stderr and are filtered by `RUST_LOG`; stdout carries the
//! plan, the per-item outcomes, the metadata listing or the path of a
//! downloaded file.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use docsync::source::HttpSource;
use docsync::store::SqliteStore;
use docsync::{load_snapshot, save_snapshot, snapshot_metadata, Settings, Syncer};

#[derive(Parser, Debug)]
#[command(name = "docsync")]
#[command(about = "Copy deliverables missing from the destination store")]
#[command(version)]
struct Cli {
    /// Settings file (JSON)
    #[arg(long, env = "DOCSYNC_SETTINGS", global = true)]
    settings: Option<PathBuf>,

    /// Source password, overriding the settings file
    #[arg(long, env = "DOCSYNC_PASSWORD", hide_env_values = true, global = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the names that would be transferred
    Plan,
    /// Transfer every missing deliverable
    Sync {
        /// Also write the listing snapshot to this file
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },
    /// Fetch one listed deliverable into a local directory
    Download {
        /// Deliverable name as it appears in the listing
        name: String,
        /// Output directory, created if missing
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Upload a local file to the destination under its file name
    Upload {
        /// File to upload
        file: PathBuf,
    },
    /// Print property-bag metadata from a saved snapshot
    Metadata {
        /// Snapshot file written by `sync --snapshot`
        snapshot: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false),
        )
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Plan => {
            let syncer = open_syncer(cli.settings, cli.password)?;
            let plan = syncer.plan().await.context("could not compute sync plan")?;
            for item in &plan.to_transfer {
                println!("{}", item.name);
            }
            for entry in plan.snapshot.skipped() {
                eprintln!("skipped listing row: {}", entry.reason);
            }
            if plan.is_empty() {
                eprintln!("{} listed, destination is up to date", plan.snapshot.len());
            } else {
                eprintln!(
                    "{} listed, {} already stored, {} to transfer",
                    plan.snapshot.len(),
                    plan.already_stored(),
                    plan.to_transfer.len()
                );
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Sync { snapshot } => {
            let syncer = open_syncer(cli.settings, cli.password)?;
            let plan = syncer.plan().await.context("sync aborted before transfer")?;

            if let Some(path) = &snapshot {
                save_snapshot(&plan.snapshot, path)
                    .with_context(|| format!("could not write snapshot {}", path.display()))?;
                tracing::info!(path = %path.display(), "wrote listing snapshot");
            }

            let report = syncer.execute(plan).await;
            for outcome in &report.outcomes {
                match &outcome.detail {
                    Some(detail) => println!("{}\t{}\t{}", outcome.status, outcome.name, detail),
                    None => println!("{}\t{}", outcome.status, outcome.name),
                }
            }
            for name in &report.duplicate_names {
                eprintln!("duplicate name in listing: {}", name);
            }
            for entry in &report.skipped_entries {
                eprintln!("skipped listing row: {}", entry.reason);
            }
            eprintln!("{}", report.summary());

            Ok(if report.is_complete() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Commands::Download { name, out } => {
            let syncer = open_syncer(cli.settings, cli.password)?;
            let path = syncer
                .download(&name, &out)
                .await
                .with_context(|| format!("could not download {}", name))?;
            println!("{}", path.display());
            Ok(ExitCode::SUCCESS)
        }
        Commands::Upload { file } => {
            let syncer = open_syncer(cli.settings, cli.password)?;
            let result = syncer
                .upload_file(&file)
                .await
                .with_context(|| format!("could not upload {}", file.display()))?;
            if result.is_already_present() {
                eprintln!("{} is already stored", file.display());
            } else {
                eprintln!("uploaded {}", file.display());
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Metadata { snapshot } => {
            let snapshot = load_snapshot(&snapshot)
                .with_context(|| format!("could not read snapshot {}", snapshot.display()))?;
            for (name, metadata) in snapshot_metadata(&snapshot) {
                println!("{}", name);
                for (key, value) in metadata.fields() {
                    println!("  {}: {}", key, value.replace('\n', " / "));
                }
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn open_syncer(
    settings: Option<PathBuf>,
    password: Option<String>,
) -> Result<Syncer<HttpSource, SqliteStore>> {
    let path = settings.context("no settings file: pass --settings or set DOCSYNC_SETTINGS")?;
    let settings = Settings::load(&path)
        .with_context(|| format!("could not load settings {}", path.display()))?
        .with_password(password);
    Ok(Syncer::from_settings(&settings)?)
}
