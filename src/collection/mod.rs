//! Collection module
//!
//! Gathers one CSV per day from a source and merges the days into a
//! single file:
//! - URL templates and file naming
//! - Templated HTTP downloads with retries
//! - Header-preserving concatenation

pub mod download;
pub mod merge;
pub mod template;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::NaiveDate;
use futures::{StreamExt, stream};
use tokio::task;
use tracing::{info, warn};

use crate::dates::DateRange;
use crate::{RailcastError, Result};

pub use download::CsvDownloader;
pub use merge::concat_with_single_header;
pub use template::{FileNaming, UrlTemplate};

/// Something that can produce the CSV for a single day.
#[async_trait]
pub trait DailySource: Send + Sync {
    /// Short description for log output
    fn describe(&self) -> String;

    /// Write the day's CSV to disk and return its path.
    async fn fetch(&self, day: NaiveDate) -> Result<PathBuf>;
}

/// Outcome of a [`collect_range`] run.
#[derive(Debug, Clone)]
pub struct CollectSummary {
    /// Per-day files that were fetched, in date order
    pub downloaded: Vec<PathBuf>,
    /// Days that failed, with the reason
    pub skipped: Vec<(NaiveDate, String)>,
    /// The merged file
    pub output: PathBuf,
}

/// Fetch every day in `[start, end]` and merge the results into `output`.
///
/// Failed days are skipped; the run fails only when no day succeeded.
pub async fn collect_range<S: DailySource + ?Sized>(
    source: &S,
    start: NaiveDate,
    end: NaiveDate,
    output: &Path,
    concurrency: usize,
) -> Result<CollectSummary> {
    if start > end {
        return Err(RailcastError::validation(
            "start date must be on or before end date",
        ));
    }

    info!("Collecting {} to {} from {}", start, end, source.describe());

    let results: Vec<(NaiveDate, Result<PathBuf>)> = stream::iter(DateRange::inclusive(start, end))
        .map(|day| async move { (day, source.fetch(day).await) })
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let mut downloaded = Vec::new();
    let mut skipped = Vec::new();
    for (day, result) in results {
        match result {
            Ok(path) => downloaded.push(path),
            Err(e) => {
                let reason = match e.status() {
                    Some(status) => format!("HTTP {status}"),
                    None => e.to_string(),
                };
                warn!("Skipping {}: {}", day, reason);
                skipped.push((day, reason));
            }
        }
    }

    if downloaded.is_empty() {
        return Err(RailcastError::general(
            "No files were downloaded; cannot create merged CSV",
        ));
    }

    let files = downloaded.clone();
    let out = output.to_path_buf();
    task::spawn_blocking(move || concat_with_single_header(&files, &out))
        .await
        .map_err(|e| RailcastError::general(format!("merge task failed: {e}")))??;

    Ok(CollectSummary {
        downloaded,
        skipped,
        output: output.to_path_buf(),
    })
}
