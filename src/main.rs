mod checkpoint;
mod chunker;
mod client;
mod commands;
mod config;
mod diagnostics;
mod error;
mod reviewer;
mod types;
mod walker;

use std::io::Write as _;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use crate::commands::ScanChoices;

#[derive(Parser)]
#[command(name = "coderev", about = "Resumable batch code review with durable checkpoints")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Review eligible files under a mode's root, resuming from the checkpoint
    Scan {
        /// Reprocess files already present in the checkpoint
        #[arg(long)]
        force: bool,
        /// Scan mode from `.coderev.toml`; omit to be asked interactively
        #[arg(long)]
        mode: Option<String>,
        /// Skip files ordered before this path
        #[arg(long)]
        start_from: Option<PathBuf>,
    },
    /// Summarize a mode's checkpoint store
    Status {
        /// Scan mode from `.coderev.toml`
        #[arg(long, default_value = "full")]
        mode: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Scan { force, mode, start_from } => run_scan(mode, force, start_from),
        Commands::Status { mode } => commands::status(&mode),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            diagnostics::print_error(&e);
            ExitCode::FAILURE
        },
    }
}

/// Resolve the scan choices and run the scan.
///
/// Passing `--mode` answers all three questions from the flags; a bare
/// `coderev scan` asks them interactively, mirroring the tool this
/// replaces.
fn run_scan(
    mode: Option<String>,
    force: bool,
    start_from: Option<PathBuf>,
) -> Result<(), error::Error> {
    let choices = match mode {
        None => prompt_scan_choices()?,
        Some(mode) => ScanChoices { force_rescan: force, mode, start_from },
    };
    return commands::scan(&choices);
}

/// Ask the three scan questions on stderr and read answers from stdin.
///
/// # Errors
///
/// Returns `Error::Io` if stdin or stderr is unusable.
fn prompt_scan_choices() -> Result<ScanChoices, error::Error> {
    let mode_answer = prompt("Which mode? (full / backend):")?;
    let mode = if mode_answer.is_empty() { "full".to_string() } else { mode_answer };

    let start_answer = prompt("Start from specific file? (leave blank if not):")?;
    let start_from = if start_answer.is_empty() {
        None
    } else {
        Some(PathBuf::from(start_answer))
    };

    let force_answer = prompt("Rescan files even if already scanned? (yes/no):")?;
    let force_rescan = force_answer.eq_ignore_ascii_case("yes");

    return Ok(ScanChoices { force_rescan, mode, start_from });
}

/// Ask one question and return the trimmed reply.
///
/// # Errors
///
/// Returns `Error::Io` if stdin or stderr is unusable.
fn prompt(question: &str) -> Result<String, error::Error> {
    eprint!("{question} ");
    std::io::stderr().flush()?;

    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    return Ok(line.trim().to_string());
}
