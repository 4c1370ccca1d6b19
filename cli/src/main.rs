//! haltkit CLI - Escalating termination of threads and process trees
//!
//! A command-line tool for demonstrating terminable workers, reaping
//! process trees, and inspecting the escalation settings.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use haltkit_core::{ConfigStore, Pid};

#[derive(Parser)]
#[command(name = "haltkit")]
#[command(author, version, about = "Escalating termination of threads and process trees")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Settings file (defaults to ~/.haltkit/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a heartbeat worker, cancel it, and escalate if needed
    Demo {
        /// Ignore cooperative cancel and only stop on a forced abort
        #[arg(long)]
        non_cooperative: bool,

        /// Label printed with every heartbeat
        #[arg(short, long, default_value = "Harry")]
        label: String,

        /// How long the worker runs before cancel is requested (ms)
        #[arg(long, default_value = "1000")]
        run_for: u64,

        /// How long to wait for a cooperative stop before aborting (ms)
        #[arg(long, default_value = "4000")]
        cooperative_timeout: u64,
    },

    /// Reap the descendants of a process
    Reap {
        /// Root process id
        pid: Pid,

        /// Polling rounds before survivors are killed
        #[arg(short, long)]
        rounds: Option<u32>,
    },

    /// Bring the windows of a process's descendants to the foreground
    #[command(alias = "fg")]
    Foreground {
        /// Root process id
        pid: Pid,
    },

    /// List the direct children of a process
    #[command(alias = "ls")]
    Children {
        /// Parent process id
        pid: Pid,
    },

    /// Broadcast the "show yourself" window message
    Announce {
        /// Message name (defaults to the configured activation message)
        name: Option<String>,
    },

    /// Show current configuration
    Config,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let store = match cli.config {
        Some(path) => ConfigStore::with_path(path),
        None => ConfigStore::new()?,
    };
    let settings = store.load().await?;

    match cli.command {
        Commands::Demo {
            non_cooperative,
            label,
            run_for,
            cooperative_timeout,
        } => {
            let options = commands::demo::DemoOptions {
                label,
                cooperative: !non_cooperative,
                run_for: std::time::Duration::from_millis(run_for),
                cooperative_timeout: std::time::Duration::from_millis(cooperative_timeout),
            };
            commands::demo::run(options, settings, cli.json).await?;
        }
        Commands::Reap { pid, rounds } => {
            commands::reap::run(pid, rounds, settings, cli.json).await?;
        }
        Commands::Foreground { pid } => {
            commands::foreground::run(pid, settings, cli.json).await?;
        }
        Commands::Children { pid } => {
            commands::children::run(pid, cli.json)?;
        }
        Commands::Announce { name } => {
            let name = name.unwrap_or_else(|| settings.activation_message.clone());
            commands::announce::run(&name, cli.json)?;
        }
        Commands::Config => {
            commands::config::show(&store, &settings, cli.json)?;
        }
    }

    Ok(())
}
