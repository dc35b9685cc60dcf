//! Core CLI commands for coderev: scan and status.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::checkpoint;
use crate::client::{self, HttpReviewClient};
use crate::config::Config;
use crate::error::Error;
use crate::reviewer::Reviewer;
use crate::walker::{self, PathFilter};

/// Resolved choices for one scan pass, whether flagged or prompted.
pub struct ScanChoices {
    /// Reprocess files already present in the checkpoint.
    pub force_rescan: bool,
    /// Name of the configured scan mode.
    pub mode: String,
    /// Skip paths ordered before this one.
    pub start_from: Option<PathBuf>,
}

/// Walk the mode's root, review every eligible file, checkpoint outcomes.
///
/// # Errors
///
/// Returns errors from config loading, client construction, enumeration,
/// or the checkpoint store. Per-file failures are checkpointed, not
/// returned.
pub fn scan(choices: &ScanChoices) -> Result<(), Error> {
    let root = PathBuf::from(".");
    let config = Config::load(&root)?;
    let mode = config.mode(&choices.mode)?;

    let api_key = client::resolve_api_key(&config.api.api_key_env)?;
    let http_client = HttpReviewClient::new(&config.api, api_key)?;

    let filter = PathFilter::new(&config.filter);
    let files = walker::collect_files(&mode.root, &filter)?;
    eprintln!("{} eligible files under {}", files.len(), mode.root.display());

    let reviewer = Reviewer::new(&http_client, &config.review, &config.pacing, &mode.checkpoint);
    let summary = reviewer.run(&files, choices.force_rescan, choices.start_from.as_deref())?;

    eprintln!(
        "scan complete: {} reviewed, {} skipped, {} failed",
        summary.reviewed, summary.skipped, summary.failed
    );
    return Ok(());
}

/// Summarize the mode's checkpoint store: latest status per file,
/// then per-status counts. Always exits 0.
///
/// # Errors
///
/// Returns errors from config loading or checkpoint reading.
pub fn status(mode_name: &str) -> Result<(), Error> {
    let root = PathBuf::from(".");
    let config = Config::load(&root)?;
    let mode = config.mode(mode_name)?;

    let latest = checkpoint::load_latest(&mode.checkpoint)?;
    if latest.is_empty() {
        eprintln!("no checkpoint at {}", mode.checkpoint.display());
        return Ok(());
    }

    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for record in &latest {
        let slot = counts.entry(record.status.as_str()).or_insert(0);
        *slot = slot.saturating_add(1);
        println!("{:<16} {}", record.status, record.file.display());
    }

    println!();
    for (status, count) in &counts {
        println!("{count:>5}  {status}");
    }
    return Ok(());
}
