// src/process/convert.rs
use anyhow::Result;
use arrow::{
    array::{ArrayRef, Float64Builder, StringBuilder, TimestampMillisecondArray},
    datatypes::{DataType, Field, Schema, TimeUnit},
    record_batch::RecordBatch,
};
use std::{collections::HashMap, path::Path, sync::Arc};
use tracing::debug;

use crate::catalog::TableDescriptor;
use crate::error::NemDataError;
use crate::process::interval::{derive_intervals, INTERVAL_END, INTERVAL_START};
use crate::process::raw_table::RawTable;
use crate::process::{date_parser, utils};

/// Outcome of normalizing one named datetime column.
#[derive(Debug, PartialEq)]
pub enum DatetimeColumn {
    Parsed(Vec<Option<i64>>),
    /// The payload has no such column. Tables differ in which optional
    /// columns they carry, so this is expected.
    Absent,
}

pub fn timestamp_type() -> DataType {
    DataType::Timestamp(TimeUnit::Millisecond, Some(date_parser::NEM_TZ.into()))
}

/// Parse column `name` as market-time timestamps. Empty cells become null;
/// any other unparseable value is a malformed payload.
pub fn parse_datetime_column(
    raw: &RawTable,
    name: &str,
    source: &Path,
) -> Result<DatetimeColumn, NemDataError> {
    let Some(idx) = raw.column_index(name) else {
        return Ok(DatetimeColumn::Absent);
    };
    let mut out = Vec::with_capacity(raw.rows.len());
    for (row, v) in raw.column(idx).enumerate() {
        let v = utils::clean_str(v);
        if v.is_empty() {
            out.push(None);
            continue;
        }
        match date_parser::parse_timestamp_millis(v) {
            Some(ms) => out.push(Some(ms)),
            None => {
                return Err(NemDataError::malformed(
                    source,
                    format!("row {row}: `{v}` in {name} is not a datetime"),
                ))
            }
        }
    }
    Ok(DatetimeColumn::Parsed(out))
}

fn plain_column(raw: &RawTable, idx: usize) -> (DataType, ArrayRef) {
    match utils::infer_arrow_dtype(raw.column(idx)) {
        DataType::Float64 => {
            let mut b = Float64Builder::with_capacity(raw.rows.len());
            for v in raw.column(idx) {
                b.append_option(utils::clean_str(v).parse::<f64>().ok());
            }
            (DataType::Float64, Arc::new(b.finish()) as ArrayRef)
        }
        _ => {
            let mut b = StringBuilder::with_capacity(raw.rows.len(), raw.rows.len() * 8);
            for v in raw.column(idx) {
                let v = utils::clean_str(v);
                if v.is_empty() {
                    b.append_null();
                } else {
                    b.append_value(v);
                }
            }
            (DataType::Utf8, Arc::new(b.finish()) as ArrayRef)
        }
    }
}

/// Type every column of `raw` for `table`: datetime columns become market-time
/// timestamps, the rest Float64 or Utf8, then `interval-start` and
/// `interval-end` are appended when the table has an interval column.
pub fn to_record_batch(raw: &RawTable, table: &TableDescriptor, source: &Path) -> Result<RecordBatch> {
    let mut wanted: Vec<&str> = table.datetime_columns().iter().map(String::as_str).collect();
    if let Some(ic) = table.interval_column.as_deref() {
        if !wanted.contains(&ic) {
            wanted.push(ic);
        }
    }

    let mut parsed: HashMap<&str, Vec<Option<i64>>> = HashMap::new();
    for name in wanted {
        match parse_datetime_column(raw, name, source)? {
            DatetimeColumn::Parsed(values) => {
                parsed.insert(name, values);
            }
            DatetimeColumn::Absent => debug!(table = %table.name, column = name, "column absent"),
        }
    }

    let mut fields = Vec::with_capacity(raw.headers.len() + 2);
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(raw.headers.len() + 2);
    for (idx, name) in raw.headers.iter().enumerate() {
        if let Some(values) = parsed.get(name.as_str()) {
            let arr = TimestampMillisecondArray::from(values.clone()).with_timezone(date_parser::NEM_TZ);
            fields.push(Field::new(name, timestamp_type(), true));
            columns.push(Arc::new(arr));
        } else {
            let (dt, arr) = plain_column(raw, idx);
            fields.push(Field::new(name, dt, true));
            columns.push(arr);
        }
    }

    let interval = table
        .interval_column
        .as_deref()
        .and_then(|ic| parsed.get(ic))
        .zip(table.frequency.as_ref());
    match interval {
        Some((ends, frequency)) => {
            let (start, end) = derive_intervals(ends, frequency);
            fields.push(Field::new(INTERVAL_START, timestamp_type(), true));
            columns.push(Arc::new(start));
            fields.push(Field::new(INTERVAL_END, timestamp_type(), true));
            columns.push(Arc::new(end));
        }
        None => debug!(table = %table.name, "no interval column, skipping interval derivation"),
    }

    RecordBatch::try_new(Arc::new(Schema::new(fields)), columns).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use arrow::array::{Array, Float64Array, StringArray};

    fn raw(headers: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable {
            headers: headers.iter().map(|s| s.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn types_columns_and_appends_intervals() -> Result<()> {
        let catalog = Catalog::builtin();
        let table = catalog.find("dispatch-price")?;
        let r = raw(
            &["SETTLEMENTDATE", "REGIONID", "RRP"],
            &[
                &["2020/01/01 00:05:00", "NSW1", "41.5"],
                &["2020/01/01 00:10:00", "QLD1", ""],
            ],
        );
        let batch = to_record_batch(&r, table, Path::new("x.CSV"))?;
        let schema = batch.schema();
        let names: Vec<_> = schema.fields().iter().map(|f| f.name().as_str()).collect();
        assert_eq!(
            names,
            vec!["SETTLEMENTDATE", "REGIONID", "RRP", "interval-start", "interval-end"]
        );
        assert_eq!(schema.field(0).data_type(), &timestamp_type());
        assert_eq!(schema.field(1).data_type(), &DataType::Utf8);
        assert_eq!(schema.field(2).data_type(), &DataType::Float64);

        let rrp = batch.column(2).as_any().downcast_ref::<Float64Array>().unwrap();
        assert_eq!(rrp.value(0), 41.5);
        assert!(rrp.is_null(1));
        let region = batch.column(1).as_any().downcast_ref::<StringArray>().unwrap();
        assert_eq!(region.value(1), "QLD1");

        let start = batch.column(3).as_any().downcast_ref::<TimestampMillisecondArray>().unwrap();
        let end = batch.column(4).as_any().downcast_ref::<TimestampMillisecondArray>().unwrap();
        assert_eq!(end.value(0) - start.value(0), 5 * 60_000);
        Ok(())
    }

    #[test]
    fn absent_datetime_columns_are_skipped() -> Result<()> {
        let catalog = Catalog::builtin();
        // unit-scada declares LASTCHANGED, which this payload lacks
        let table = catalog.find("unit-scada")?;
        let r = raw(&["SETTLEMENTDATE", "DUID", "SCADAVALUE"], &[&["2020/01/01 00:05:00", "AGLHAL", "0"]]);

        assert_eq!(
            parse_datetime_column(&r, "LASTCHANGED", Path::new("x"))?,
            DatetimeColumn::Absent
        );
        let batch = to_record_batch(&r, table, Path::new("x"))?;
        assert_eq!(batch.num_columns(), 5);
        assert!(batch.schema().field_with_name("LASTCHANGED").is_err());
        Ok(())
    }

    #[test]
    fn missing_interval_column_means_no_derived_columns() -> Result<()> {
        let catalog = Catalog::builtin();
        let table = catalog.find("dispatch-price")?;
        let r = raw(&["REGIONID", "RRP"], &[&["NSW1", "1"]]);
        let batch = to_record_batch(&r, table, Path::new("x"))?;
        assert!(batch.schema().field_with_name(INTERVAL_START).is_err());
        assert_eq!(batch.num_columns(), 2);
        Ok(())
    }

    #[test]
    fn bad_datetime_is_malformed() {
        let catalog = Catalog::builtin();
        let table = catalog.find("dispatch-price").unwrap();
        let r = raw(&["SETTLEMENTDATE"], &[&["yesterday"]]);
        let err = to_record_batch(&r, table, Path::new("x.CSV")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<NemDataError>(),
            Some(NemDataError::MalformedPayload { .. })
        ));
    }

    #[test]
    fn datetime_with_trailing_text_is_malformed() {
        let catalog = Catalog::builtin();
        let table = catalog.find("dispatch-price").unwrap();
        let r = raw(&["SETTLEMENTDATE"], &[&["2020/01/01 00:05:00garbage"]]);
        let err = to_record_batch(&r, table, Path::new("x.CSV")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<NemDataError>(),
            Some(NemDataError::MalformedPayload { .. })
        ));
    }
}
