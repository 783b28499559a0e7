//! Backup Archiver - command-line entry point.
//!
//! Thin wrapper around the library: turns a run result into a message and
//! an exit code, and optionally pauses before exiting.

use anyhow::Result;
use backup_archiver::archive::{list_archives, resolve_next_version};
use backup_archiver::transfer::format_bytes;
use backup_archiver::{utils, ArchiveNaming, BackupOrchestrator, Config};
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the next versioned archive of a directory (default)
    Create {
        /// Directory to back up; the archive is written into it
        root: Option<PathBuf>,

        /// Wait for Enter before exiting
        #[arg(long)]
        pause: bool,

        /// Do not take the exclusive lock on the directory
        #[arg(long)]
        no_lock: bool,
    },

    /// List existing archives and the next version
    List {
        /// Directory holding the archives
        root: Option<PathBuf>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration as TOML
    Config,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    let args = Args::parse();

    // Load configuration
    let config = Config::load(args.config.as_deref())?;

    // Initialize logging
    let log_level = args.log_level.as_deref().unwrap_or(&config.log.level);
    utils::logger::init(log_level, &config.log.output)?;

    let command = args.command.unwrap_or(Command::Create {
        root: None,
        pause: false,
        no_lock: false,
    });

    match command {
        Command::Create {
            root,
            pause,
            no_lock,
        } => {
            let root = resolve_root(root)?;
            let code = create(&config, &root, no_lock);
            if pause {
                wait_for_enter()?;
            }
            Ok(code)
        }
        Command::List { root, json } => {
            let root = resolve_root(root)?;
            list(&config, &root, json)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Config => {
            print!("{}", config.to_toml()?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn resolve_root(root: Option<PathBuf>) -> Result<PathBuf> {
    match root {
        Some(root) => Ok(root),
        None => Ok(std::env::current_dir()?),
    }
}

fn create(config: &Config, root: &Path, no_lock: bool) -> ExitCode {
    let host = hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown-host".to_string());
    tracing::info!(
        "Starting backup-archiver v{} on {} for {}",
        env!("CARGO_PKG_VERSION"),
        host,
        root.display()
    );

    let mut orchestrator =
        BackupOrchestrator::from_config(config).with_lock(config.lock.enabled && !no_lock);

    match orchestrator.run(root) {
        Ok(outcome) => {
            println!("Backup created: {}", outcome.archive_path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("Backup failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn list(config: &Config, root: &Path, json: bool) -> Result<()> {
    let naming = ArchiveNaming::from_config(&config.archive);
    let archives = list_archives(root, &naming)?;
    let next_version = resolve_next_version(root, &naming)?;

    if json {
        let report = serde_json::json!({
            "root": root,
            "archives": archives,
            "next_version": next_version,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if archives.is_empty() {
        println!("No archives in {}", root.display());
    }
    for archive in &archives {
        let version = archive
            .version
            .map(|v| format!("v{}", v))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:>6}  {:>12}  {}",
            version,
            format_bytes(archive.size),
            archive.name
        );
    }
    println!("Next version: {}", next_version);
    Ok(())
}

fn wait_for_enter() -> Result<()> {
    print!("Press Enter to exit...");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(())
}
