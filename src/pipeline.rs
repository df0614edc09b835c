// src/pipeline.rs
use anyhow::Result;
use std::{path::Path, time::Duration};
use tracing::{debug, info, warn};

use crate::cache;
use crate::dataset::Dataset;
use crate::fetch::{zips, ResolvedFile, Transport};
use crate::process;

/// How a period was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodOutcome {
    /// Loaded from an existing artifact; no network access.
    Cached,
    /// Downloaded and normalized (and persisted unless dry-run).
    Downloaded,
    /// Not published on the archive.
    NotAvailable,
}

#[derive(Debug)]
pub struct PeriodResult {
    pub outcome: PeriodOutcome,
    pub data: Option<Dataset>,
}

/// Last few path components, for status lines.
fn short(path: &Path) -> String {
    let parts: Vec<_> = path
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    parts[parts.len().saturating_sub(4)..].join("/")
}

/// Downloads, normalizes and caches single periods.
pub struct Pipeline<'a> {
    transport: &'a dyn Transport,
    probe_timeout: Duration,
}

impl<'a> Pipeline<'a> {
    pub fn new(transport: &'a dyn Transport, probe_timeout: Duration) -> Self {
        Self {
            transport,
            probe_timeout,
        }
    }

    /// Produce the normalized data for one period, from cache when possible.
    ///
    /// Absence is not an error: a period the archive does not have yields
    /// `NotAvailable` and no data. Parse and filesystem errors propagate.
    #[tracing::instrument(level = "debug", skip_all, fields(table = %file.table.name, period = %file.period()))]
    pub fn process(&self, file: &ResolvedFile, dry_run: bool) -> Result<PeriodResult> {
        let clean = cache::artifact_path(&file.data_directory);
        if cache::is_cached(file) {
            info!(path = %short(&clean), "CACHED");
            return Ok(PeriodResult {
                outcome: PeriodOutcome::Cached,
                data: Some(cache::load(&clean)?),
            });
        }
        info!(path = %short(&clean), "NOT CACHED");

        self.check_for_additional_parts(file);

        if !zips::download_zip(self.transport, &file.url, &file.zipfile_path)? {
            info!(path = %short(&file.zipfile_path), url = %file.url, "NOT AVAILABLE");
            return Ok(PeriodResult {
                outcome: PeriodOutcome::NotAvailable,
                data: None,
            });
        }
        info!(path = %short(&file.zipfile_path), "DOWNLOADING");

        let extracted = zips::unzip(&file.zipfile_path)?;
        let csv = zips::find_csv(&file.zipfile_path, &extracted, &file.csv_name)?;
        let batch = process::normalize_csv(&csv, &file.table)?;
        debug!(rows = batch.num_rows(), columns = batch.num_columns(), "normalized");

        if dry_run {
            debug!("dry run, not saving");
        } else {
            info!(path = %clean.display(), "SAVING");
            cache::persist(&file.data_directory, &batch)?;
        }

        Ok(PeriodResult {
            outcome: PeriodOutcome::Downloaded,
            data: Some(Dataset::from_batches(vec![batch])),
        })
    }

    /// Warn when a `FILE01` table also has a `FILE02` on the archive.
    /// Only the first part is retrieved; probe failures are ignored.
    fn check_for_additional_parts(&self, file: &ResolvedFile) {
        let Some(sibling) = file.sibling_part_url() else {
            return;
        };
        match self.transport.probe(&sibling, self.probe_timeout) {
            Ok(true) => warn!(
                table = %file.table.name,
                period = %file.period(),
                "multiple files exist; only FILE01 is downloaded, additional files (FILE02, etc.) are not supported"
            ),
            Ok(false) => {}
            Err(e) => debug!(url = %sibling, error = %e, "sibling probe failed"),
        }
    }
}
