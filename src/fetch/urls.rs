// src/fetch/urls.rs
use anyhow::{bail, Context, Result};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use regex::Regex;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::debug;
use url::Url;

use crate::catalog::TableDescriptor;
use crate::error::NemDataError;

static ARCHIVE_ROOT: &str = "https://www.nemweb.com.au/Data_Archive/Wholesale_Electricity/MMSDM";

/// First (year, month) published under the `PUBLIC_ARCHIVE#...` naming scheme.
pub const NAMING_CUTOVER: (i32, u32) = (2024, 8);

/// File name of the downloaded archive inside a period directory.
pub const RAW_ARCHIVE_NAME: &str = "raw.zip";

/// One (table, year, month) download target with its remote and local locations.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFile {
    pub table: TableDescriptor,
    pub year: i32,
    pub month: u32,
    pub url: Url,
    /// Name of the CSV inside the archive.
    pub csv_name: String,
    /// `<base>/<table name>/<YYYY-MM>`
    pub data_directory: PathBuf,
    pub zipfile_path: PathBuf,
}

impl ResolvedFile {
    /// `YYYY-MM`, as used for the period directory.
    pub fn period(&self) -> String {
        format!("{}-{:02}", self.year, self.month)
    }

    /// Whether this period is published under the pre-cutover `PUBLIC_DVD_` names.
    pub fn is_legacy(&self) -> bool {
        (self.year, self.month) < NAMING_CUTOVER
    }

    /// If the URL names the first part of a multi-part table (`FILE01`),
    /// the URL of the second part.
    pub fn sibling_part_url(&self) -> Option<Url> {
        let part = Regex::new(r"FILE(\d+)").expect("part pattern is valid");
        let caps = part.captures(self.url.as_str())?;
        let digits = caps.get(1)?;
        if digits.as_str().parse::<u32>().ok()? != 1 {
            return None;
        }
        let width = digits.as_str().len();
        let next = format!("FILE{:0width$}", 2, width = width);
        let whole = caps.get(0)?;
        let mut s = self.url.as_str().to_string();
        s.replace_range(whole.range(), &next);
        Url::parse(&s).ok()
    }
}

/// Build the download target for a single month of `table`.
///
/// Creates `data_directory` (and parents) if it does not exist yet.
pub fn resolve_one(
    year: i32,
    month: u32,
    table: &TableDescriptor,
    base_directory: &Path,
) -> Result<ResolvedFile> {
    if !(1..=12).contains(&month) {
        bail!("month {} out of range for {}", month, table.name);
    }
    let padded_month = format!("{:02}", month);
    let prefix = format!(
        "{ARCHIVE_ROOT}/{year}/MMSDM_{year}_{padded_month}/MMSDM_Historical_Data_SQLLoader/{}",
        table.directory
    );
    let stamp = format!("{year}{padded_month}010000");

    let (url, csv_name) = if (year, month) >= NAMING_CUTOVER {
        let url = format!("{prefix}/PUBLIC_ARCHIVE#{}#{stamp}.zip", table.table).replace('#', "%23");
        let csv_name = format!("PUBLIC_ARCHIVE#{}#{stamp}.CSV", table.table);
        (url, csv_name)
    } else {
        let legacy = table.legacy_table.as_deref().unwrap_or(&table.table);
        let url = format!("{prefix}/PUBLIC_DVD_{legacy}_{stamp}.zip");
        let csv_name = format!("PUBLIC_DVD_{legacy}_{stamp}.CSV");
        (url, csv_name)
    };
    let url = Url::parse(&url).with_context(|| format!("building archive URL {}", url))?;

    let data_directory = base_directory
        .join(&table.name)
        .join(format!("{year}-{padded_month}"));
    fs::create_dir_all(&data_directory)
        .with_context(|| format!("creating {}", data_directory.display()))?;

    debug!(table = %table.name, url = %url, "resolved");
    Ok(ResolvedFile {
        table: table.clone(),
        year,
        month,
        url,
        csv_name,
        zipfile_path: data_directory.join(RAW_ARCHIVE_NAME),
        data_directory,
    })
}

/// One `ResolvedFile` per calendar month touched by `start..=end`, oldest first.
pub fn resolve_many(
    start: NaiveDate,
    end: NaiveDate,
    table: &TableDescriptor,
    base_directory: &Path,
) -> Result<Vec<ResolvedFile>> {
    months_between(start, end)
        .into_iter()
        .map(|(year, month)| resolve_one(year, month, table, base_directory))
        .collect()
}

/// (year, month) pairs from `start`'s month to `end`'s month inclusive.
pub fn months_between(start: NaiveDate, end: NaiveDate) -> Vec<(i32, u32)> {
    let mut out = Vec::new();
    let (mut y, mut m) = (start.year(), start.month());
    let last = (end.year(), end.month());
    while (y, m) <= last {
        out.push((y, m));
        if m == 12 {
            y += 1;
            m = 1;
        } else {
            m += 1;
        }
    }
    out
}

/// Parse a command-line date: `YYYY-MM`, `YYYY-MM-DD` or a full datetime.
pub fn parse_date(input: &str) -> Result<NaiveDate, NemDataError> {
    let s = input.trim();
    let parsed = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d"))
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|dt| dt.date()))
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").map(|dt| dt.date()));
    parsed.map_err(|_| NemDataError::InvalidDate {
        input: input.to_string(),
    })
}
