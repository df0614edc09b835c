// src/download.rs
use anyhow::Result;
use std::path::Path;
use tracing::info;
use url::Url;

use crate::catalog::Catalog;
use crate::config::Config;
use crate::dataset::Dataset;
use crate::fetch::{parse_date, resolve_many, HttpTransport, Transport};
use crate::pipeline::{PeriodOutcome, Pipeline};

/// What happened to one period of a range request.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodSummary {
    pub period: String,
    pub url: Url,
    pub outcome: PeriodOutcome,
    pub rows: usize,
}

#[derive(Debug)]
pub struct DownloadReport {
    pub data: Dataset,
    pub periods: Vec<PeriodSummary>,
}

impl DownloadReport {
    pub fn count(&self, outcome: PeriodOutcome) -> usize {
        self.periods.iter().filter(|p| p.outcome == outcome).count()
    }
}

/// Drives the pipeline over every month of a date range.
pub struct Downloader<T: Transport> {
    catalog: Catalog,
    transport: T,
    config: Config,
}

impl Downloader<HttpTransport> {
    pub fn over_http(catalog: Catalog, config: Config) -> Result<Self> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::new(catalog, transport, config))
    }
}

impl<T: Transport> Downloader<T> {
    pub fn new(catalog: Catalog, transport: T, config: Config) -> Self {
        Self {
            catalog,
            transport,
            config,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Fetch `table_name` for every month from `start` to `end` inclusive.
    ///
    /// Periods run strictly in order. Unpublished periods contribute nothing;
    /// the first parse or filesystem error aborts the whole range.
    /// `base_directory` overrides the configured cache root.
    pub fn download(
        &self,
        start: &str,
        end: &str,
        table_name: &str,
        base_directory: Option<&Path>,
        dry_run: bool,
    ) -> Result<DownloadReport> {
        let table = self.catalog.find(table_name)?;
        let start = parse_date(start)?;
        let end = parse_date(end)?;
        let base = base_directory.unwrap_or(&self.config.base_directory);

        let files = resolve_many(start, end, table, base)?;
        info!(table = %table.name, periods = files.len(), base = %base.display(), "download");

        let pipeline = Pipeline::new(&self.transport, self.config.probe_timeout);
        let mut parts = Vec::with_capacity(files.len());
        let mut periods = Vec::with_capacity(files.len());
        for file in &files {
            let result = pipeline.process(file, dry_run)?;
            let rows = result.data.as_ref().map_or(0, Dataset::num_rows);
            periods.push(PeriodSummary {
                period: file.period(),
                url: file.url.clone(),
                outcome: result.outcome,
                rows,
            });
            if let Some(data) = result.data {
                if !data.is_empty() {
                    parts.push(data);
                }
            }
        }

        let data = Dataset::concat(parts)?;
        info!(table = %table.name, rows = data.num_rows(), "done");
        Ok(DownloadReport { data, periods })
    }
}
