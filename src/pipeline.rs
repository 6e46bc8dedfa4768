//! Batch extraction pipeline.
//!
//! Combines:
//! - File walking ([`crate::walker`])
//! - Per-file extraction ([`crate::extract`])
//! - Parallel file processing (rayon)
//!
//! Each file is extracted into its own buffer on a rayon worker. Buffers are
//! handed to an [`EntrySink`] afterwards, on the calling thread and in the
//! order the paths were given, so sinks never need to be thread-safe and
//! output order does not depend on scheduling. A file that fails is logged
//! and counted; the batch always runs to completion.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use rayon::prelude::*;

use crate::errors::ExtractError;
use crate::extract::Extractor;
use crate::types::FileEntries;
use crate::walker::Walker;

// ---------------------------------------------------------------------------
// Sink
// ---------------------------------------------------------------------------

/// Destination for extracted files.
///
/// `replace_file` has delete-then-insert semantics: whatever the sink held
/// for `file.rel_path()` before is superseded by `file.entries`.
pub trait EntrySink {
    fn replace_file(&mut self, file: &FileEntries) -> Result<()>;

    /// Called once after the last file of a batch.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Collects files in memory, replacing earlier results for the same path.
impl EntrySink for Vec<FileEntries> {
    fn replace_file(&mut self, file: &FileEntries) -> Result<()> {
        let path = file.rel_path();
        self.retain(|f| f.rel_path() != path);
        self.push(file.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// BatchStats
// ---------------------------------------------------------------------------

/// Statistics returned after a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchStats {
    /// Files extracted and handed to the sink.
    pub files: usize,
    /// Entries handed to the sink, across all files.
    pub entries: usize,
    /// Files passed over on purpose: unsupported, too large, not regular.
    pub skipped: usize,
    /// Files that could not be read or extracted.
    pub failures: usize,
}

impl BatchStats {
    fn record(&mut self, err: &ExtractError) {
        match err {
            ExtractError::Unsupported(_)
            | ExtractError::TooLarge { .. }
            | ExtractError::NotRegularFile(_) => {
                tracing::debug!(%err, "skipped");
                self.skipped += 1;
            }
            _ => {
                tracing::warn!(%err, "extraction failed");
                self.failures += 1;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Extract every path in parallel and hand the results to `sink` in input
/// order. Paths are made relative to `root` in the emitted entries.
///
/// Only sink errors abort the batch; extraction errors are counted in the
/// returned [`BatchStats`].
pub fn extract_paths(
    extractor: &Extractor,
    paths: &[PathBuf],
    root: &Path,
    sink: &mut dyn EntrySink,
) -> Result<BatchStats> {
    let start = Instant::now();

    let results: Vec<Result<FileEntries, ExtractError>> =
        paths.par_iter().map(|path| extractor.extract_file(path, root)).collect();

    let mut stats = BatchStats::default();
    for result in results {
        match result {
            Ok(file) => {
                sink.replace_file(&file)
                    .with_context(|| format!("writing entries for {}", file.rel_path()))?;
                stats.files += 1;
                stats.entries += file.entries.len();
            }
            Err(err) => stats.record(&err),
        }
    }
    sink.finish()?;

    tracing::info!(
        files = stats.files,
        entries = stats.entries,
        skipped = stats.skipped,
        failures = stats.failures,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "batch complete"
    );
    Ok(stats)
}

/// Walk `walker`'s tree and extract everything it yields.
pub fn extract_tree(
    extractor: &Extractor,
    walker: &Walker,
    root: &Path,
    sink: &mut dyn EntrySink,
) -> Result<BatchStats> {
    let paths = walker.collect_paths().context("walking source tree")?;
    tracing::debug!(count = paths.len(), root = %root.display(), "walked");
    extract_paths(extractor, &paths, root, sink)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
