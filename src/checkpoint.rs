//! Checkpoint persistence: the append-only CSV ledger a scan resumes from.
//!
//! One row per reviewed file (or failed attempt). Rows are never rewritten
//! or deleted; a forced rescan appends a duplicate row for the same path,
//! and consumers wanting "latest status" take the last matching row.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::types::FileReviewResult;

/// One durable row of the checkpoint store.
///
/// Field order is the wire contract: the store's header is exactly
/// `File,Status,Comments`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointRecord {
    /// Path of the reviewed file, as submitted for review.
    #[serde(rename = "File")]
    pub file: PathBuf,
    /// Status string: `Issue Found`, `No Major Issues`, or `Error`.
    #[serde(rename = "Status")]
    pub status: String,
    /// Verbatim review comments, or the failure message for `Error` rows.
    #[serde(rename = "Comments")]
    pub comments: String,
}

impl CheckpointRecord {
    /// Build a row from a finished review outcome.
    pub fn from_result(result: &FileReviewResult) -> Self {
        return Self {
            comments: result.comments.clone(),
            file: result.path.clone(),
            status: result.status.as_str().to_string(),
        };
    }
}

/// Append one record, creating the store with a header row when absent.
///
/// The handle is opened, written, flushed, and closed per record, so a
/// record that `append` returned for is durably visible to the next
/// `load_completed` — this is the scan's sole recovery mechanism.
///
/// # Errors
///
/// Returns `Error::Io` if the store cannot be opened or flushed,
/// or `Error::Csv` if the record cannot be written.
pub fn append(path: &Path, record: &CheckpointRecord) -> Result<(), Error> {
    let needs_header = match std::fs::metadata(path) {
        Ok(meta) => meta.len() == 0,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
        Err(e) => return Err(Error::Io(e)),
    };

    let file = OpenOptions::new().append(true).create(true).open(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_header)
        .from_writer(file);
    writer.serialize(record)?;
    writer.flush()?;
    return Ok(());
}

/// Every path with an existing record, in sorted order.
/// Fails soft: a store that does not exist yet is an empty set.
///
/// # Errors
///
/// Returns `Error::Csv` if the store cannot be opened (other than
/// not-found), or `Error::CheckpointCorrupt` if a row cannot be parsed.
pub fn load_completed(path: &Path) -> Result<BTreeSet<PathBuf>, Error> {
    let mut completed = BTreeSet::new();
    for record in read_records(path)? {
        completed.insert(record.file);
    }
    return Ok(completed);
}

/// The last record per file, ordered by path.
///
/// The store is append-only, so a forced rescan leaves older rows behind;
/// this is the "latest outcome" view the `status` command reports.
///
/// # Errors
///
/// Returns `Error::Csv` if the store cannot be opened (other than
/// not-found), or `Error::CheckpointCorrupt` if a row cannot be parsed.
pub fn load_latest(path: &Path) -> Result<Vec<CheckpointRecord>, Error> {
    let mut latest: BTreeMap<PathBuf, CheckpointRecord> = BTreeMap::new();
    for record in read_records(path)? {
        latest.insert(record.file.clone(), record);
    }
    return Ok(latest.into_values().collect());
}

/// Parse every row of the store; an absent store yields no rows.
///
/// # Errors
///
/// Returns `Error::Csv` if the store cannot be opened (other than
/// not-found), or `Error::CheckpointCorrupt` naming the first bad row.
fn read_records(path: &Path) -> Result<Vec<CheckpointRecord>, Error> {
    let mut reader = match csv::ReaderBuilder::new().has_headers(true).from_path(path) {
        Err(e) if is_not_found(&e) => return Ok(Vec::new()),
        Err(e) => return Err(Error::Csv(e)),
        Ok(r) => r,
    };

    let mut records = Vec::new();
    for row in reader.deserialize::<CheckpointRecord>() {
        let record = row.map_err(|e| {
            return Error::CheckpointCorrupt {
                path: path.to_path_buf(),
                reason: e.to_string(),
            };
        })?;
        records.push(record);
    }
    return Ok(records);
}

/// Whether a CSV open error is the file simply not existing yet.
fn is_not_found(err: &csv::Error) -> bool {
    return matches!(
        err.kind(),
        csv::ErrorKind::Io(io) if io.kind() == std::io::ErrorKind::NotFound
    );
}
