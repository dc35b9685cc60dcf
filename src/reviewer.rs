//! The scan orchestrator: walks the enumerated file list, reviews each
//! file chunk by chunk, and appends one checkpoint row per outcome.
//!
//! Everything is strictly sequential. One file is read, chunked, and
//! reviewed to completion (or failure) before the next begins; chunks
//! are submitted in index order. Each finished file is checkpointed
//! immediately, so killing the process loses at most the in-flight file.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rand::Rng as _;

use crate::checkpoint::{self, CheckpointRecord};
use crate::chunker;
use crate::client::{ReviewClient, SubmitError};
use crate::config::{PacingConfig, ReviewConfig};
use crate::error::Error;
use crate::types::{FileReviewResult, ReviewStatus};

/// Counters reported after a scan pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScanSummary {
    /// Files that ended in an `Error` row (unreadable or fatal submission).
    pub failed: usize,
    /// Files reviewed to completion in this pass.
    pub reviewed: usize,
    /// Files skipped because the checkpoint already covered them.
    pub skipped: usize,
}

/// Orchestrates one scan pass over an enumerated file list.
pub struct Reviewer<'a, C: ReviewClient> {
    checkpoint_path: &'a Path,
    client: &'a C,
    pacing: &'a PacingConfig,
    review: &'a ReviewConfig,
}

impl<'a, C: ReviewClient> Reviewer<'a, C> {
    /// Wire up a reviewer around an injected client and settings.
    pub fn new(
        client: &'a C,
        review: &'a ReviewConfig,
        pacing: &'a PacingConfig,
        checkpoint_path: &'a Path,
    ) -> Self {
        return Self { checkpoint_path, client, pacing, review };
    }

    /// Run one pass over `files`: skip checkpointed paths (unless forced),
    /// review the rest, append one row per outcome.
    ///
    /// `start_from` cuts the list to paths ordered at or after it, which
    /// restarts a long scan mid-alphabet without consulting the store.
    /// Interrupting and restarting converges to the same end state as an
    /// uninterrupted run; only a forced rescan produces duplicate rows.
    ///
    /// # Errors
    ///
    /// Returns checkpoint store errors. Per-file read and submission
    /// failures are checkpointed as `Error` rows, not returned.
    pub fn run(
        &self,
        files: &[PathBuf],
        force_rescan: bool,
        start_from: Option<&Path>,
    ) -> Result<ScanSummary, Error> {
        let completed: BTreeSet<PathBuf> = if force_rescan {
            BTreeSet::new()
        } else {
            checkpoint::load_completed(self.checkpoint_path)?
        };

        let mut summary = ScanSummary::default();

        for path in files {
            if let Some(cut) = start_from {
                if path.as_path() < cut {
                    continue;
                }
            }

            if completed.contains(path) {
                eprintln!("skip  {}", path.display());
                summary.skipped = summary.skipped.saturating_add(1);
                continue;
            }

            let result = self.review_file(path);
            match result.status {
                ReviewStatus::Error => summary.failed = summary.failed.saturating_add(1),
                ReviewStatus::IssueFound | ReviewStatus::NoMajorIssues => {
                    summary.reviewed = summary.reviewed.saturating_add(1);
                },
            }
            checkpoint::append(self.checkpoint_path, &CheckpointRecord::from_result(&result))?;
        }

        return Ok(summary);
    }

    /// Review one file to completion or failure.
    ///
    /// An unreadable file, a fatal submission, or an exhausted retry
    /// budget all yield an `Error` result carrying the failure message;
    /// verdicts from earlier chunks of that file are discarded so a file
    /// is never recorded as partially successful.
    fn review_file(&self, path: &Path) -> FileReviewResult {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("fail  {}: {e}", path.display());
                return error_result(path, &e.to_string());
            },
        };

        eprintln!("scan  {}", path.display());
        let chunks = chunker::split(&content, self.review.max_chunk_size);
        let instructions = self.review.instructions();
        let mut verdicts: Vec<String> = Vec::with_capacity(chunks.len());

        for chunk in &chunks {
            if chunk.total > 1 {
                eprintln!("      chunk {}/{}", chunk.index.saturating_add(1), chunk.total);
            }
            match self.submit_with_retry(&chunk.text, &instructions) {
                Ok(verdict) => verdicts.push(verdict),
                Err(message) => {
                    eprintln!("fail  {}: {message}", path.display());
                    return error_result(path, &message);
                },
            }
            if chunk.index.saturating_add(1) < chunk.total {
                self.pause_between_chunks();
            }
        }

        let comments = verdicts.join("\n\n");
        let status = ReviewStatus::classify(&comments);
        return FileReviewResult { comments, path: path.to_path_buf(), status };
    }

    /// Submit one chunk, absorbing rate limits and transient failures by
    /// sleeping and retrying the same chunk. Unbounded by default; the
    /// configured attempt cap, when present, converts exhaustion into a
    /// fatal failure message.
    fn submit_with_retry(&self, chunk_text: &str, instructions: &str) -> Result<String, String> {
        let mut attempts: u32 = 0;
        loop {
            match self.client.submit(chunk_text, instructions) {
                Ok(verdict) => return Ok(verdict),
                Err(SubmitError::RateLimited { message, suggested_wait }) => {
                    let wait = suggested_wait.unwrap_or(self.pacing.rate_limit_fallback);
                    eprintln!(
                        "      rate limited, retrying in {:.1}s: {message}",
                        wait.as_secs_f64()
                    );
                    std::thread::sleep(wait);
                },
                Err(SubmitError::Transient { message }) => {
                    let wait = sample_between(self.pacing.transient_min, self.pacing.transient_max);
                    eprintln!(
                        "      transient failure, retrying in {:.1}s: {message}",
                        wait.as_secs_f64()
                    );
                    std::thread::sleep(wait);
                },
                Err(SubmitError::Fatal { message }) => return Err(message),
            }

            attempts = attempts.saturating_add(1);
            if let Some(cap) = self.pacing.max_attempts {
                if attempts >= cap {
                    return Err(format!("retry budget exhausted after {attempts} attempts"));
                }
            }
        }
    }

    /// Self-imposed pacing between chunks of the same file. Never delays
    /// unrelated files; the last chunk of a file is not followed by a pause.
    fn pause_between_chunks(&self) {
        std::thread::sleep(sample_between(self.pacing.pause_min, self.pacing.pause_max));
    }
}

/// Build the `Error` outcome for a failed file.
fn error_result(path: &Path, message: &str) -> FileReviewResult {
    return FileReviewResult {
        comments: format!("Error: {message}"),
        path: path.to_path_buf(),
        status: ReviewStatus::Error,
    };
}

/// Draw a uniform duration from the inclusive range `[min, max]`.
fn sample_between(min: Duration, max: Duration) -> Duration {
    if max <= min {
        return min;
    }
    let secs = rand::thread_rng().gen_range(min.as_secs_f64()..=max.as_secs_f64());
    return Duration::try_from_secs_f64(secs).unwrap_or(min);
}
