// src/process/mod.rs
pub mod convert;
pub mod date_parser;
pub mod interval;
pub mod raw_table;
pub mod utils;

use anyhow::{Context, Result};
use arrow::record_batch::RecordBatch;
use csv::{ReaderBuilder, StringRecord};
use std::path::Path;
use tracing::debug;

use crate::catalog::TableDescriptor;
use crate::error::NemDataError;
pub use raw_table::RawTable;

/// Leading fields of every MMSDM row: record type, report type, sub-type, version.
const CONTROL_COLUMNS: usize = 4;

fn record_type(record: &StringRecord) -> &str {
    record.get(0).map(str::trim).unwrap_or("")
}

/// Read an extracted MMSDM CSV.
///
/// The file must open with a `C` row followed by the `I` header row and end
/// with a `C` footer row; everything in between must be `D` rows. Both `C`
/// rows are dropped and the four control columns are removed from the rest.
#[tracing::instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub fn load_unzipped_csv(path: &Path) -> Result<RawTable> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true) // C rows are shorter than D rows
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;

    let mut records = rdr.records().enumerate().map(|(idx, result)| {
        result.with_context(|| format!("CSV parse error in {} at record {}", path.display(), idx))
    });
    let too_short = || NemDataError::malformed(path, "expected header, column and footer rows");

    let first = records.next().transpose()?.ok_or_else(too_short)?;
    if record_type(&first) != "C" {
        return Err(NemDataError::malformed(path, "first row is not a C row").into());
    }
    let columns = records.next().transpose()?.ok_or_else(too_short)?;
    if record_type(&columns) != "I" {
        return Err(NemDataError::malformed(path, "second row is not an I row").into());
    }
    let headers: Vec<String> = columns
        .iter()
        .skip(CONTROL_COLUMNS)
        .map(|s| s.trim().to_string())
        .collect();

    // one record of lookahead: the last record read is the footer candidate
    let mut rows = Vec::new();
    let mut pending: Option<StringRecord> = None;
    for (idx, record) in (2..).zip(records) {
        let record = record?;
        if let Some(prev) = pending.replace(record) {
            rows.push(data_row(path, &prev, idx - 1, headers.len())?);
        }
    }
    match pending {
        Some(footer) if record_type(&footer) == "C" => {}
        Some(_) => return Err(NemDataError::malformed(path, "last row is not a C footer").into()),
        None => return Err(too_short().into()),
    }

    debug!(columns = headers.len(), rows = rows.len(), "loaded");
    Ok(RawTable { headers, rows })
}

/// Strip the control columns of a `D` row and pad it to `width` fields.
fn data_row(path: &Path, record: &StringRecord, idx: usize, width: usize) -> Result<Vec<String>> {
    if record_type(record) != "D" {
        return Err(NemDataError::malformed(
            path,
            format!("row {} has record type `{}`", idx, record_type(record)),
        )
        .into());
    }
    let mut row: Vec<String> = record
        .iter()
        .skip(CONTROL_COLUMNS)
        .map(str::to_string)
        .collect();
    if row.len() > width {
        return Err(NemDataError::malformed(
            path,
            format!("row {} has {} fields, header has {}", idx, row.len(), width),
        )
        .into());
    }
    row.resize(width, String::new());
    Ok(row)
}

/// Parse, type and derive intervals for one extracted CSV.
pub fn normalize_csv(path: &Path, table: &TableDescriptor) -> Result<RecordBatch> {
    let raw = load_unzipped_csv(path)?;
    convert::to_record_batch(&raw, table, path)
}
