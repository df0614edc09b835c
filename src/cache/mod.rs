// src/cache/mod.rs
//! The on-disk cache: `<base>/<table>/<YYYY-MM>/{raw.zip, clean.csv, clean.parquet}`.
//!
//! `clean.parquet` existing is the only validity signal. It is always the
//! last file renamed into place, so a partially written artifact is never
//! mistaken for a complete one.

pub mod inventory;

use anyhow::{Context, Result};
use arrow::{csv::WriterBuilder, record_batch::RecordBatch};
use parquet::{
    arrow::{arrow_reader::ParquetRecordBatchReaderBuilder, ArrowWriter},
    basic::Compression,
    file::properties::WriterProperties,
};
use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use crate::dataset::Dataset;
use crate::fetch::ResolvedFile;

pub const ARTIFACT_NAME: &str = "clean.parquet";
pub const CSV_ARTIFACT_NAME: &str = "clean.csv";

pub fn artifact_path(data_directory: &Path) -> PathBuf {
    data_directory.join(ARTIFACT_NAME)
}

pub fn csv_artifact_path(data_directory: &Path) -> PathBuf {
    data_directory.join(CSV_ARTIFACT_NAME)
}

/// True iff the normalized artifact for this period exists.
pub fn is_cached(file: &ResolvedFile) -> bool {
    artifact_path(&file.data_directory).exists()
}

/// Read a persisted artifact back.
pub fn load(path: &Path) -> Result<Dataset> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)
        .with_context(|| format!("reading parquet metadata of {}", path.display()))?
        .build()?;
    let batches = reader
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("reading {}", path.display()))?;
    Ok(Dataset::from_batches(batches))
}

/// Write `batch` as `clean.csv` and `clean.parquet` under `data_directory`.
pub fn persist(data_directory: &Path, batch: &RecordBatch) -> Result<()> {
    let csv_path = csv_artifact_path(data_directory);
    write_atomically(&csv_path, |w| {
        let mut writer = WriterBuilder::new().with_header(true).build(w);
        writer.write(batch).context("writing CSV batch")?;
        Ok(())
    })?;

    let parquet_path = artifact_path(data_directory);
    write_atomically(&parquet_path, |w| {
        let props = WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .build();
        let mut writer = ArrowWriter::try_new(w, batch.schema(), Some(props))
            .context("creating parquet writer")?;
        writer.write(batch).context("writing parquet batch")?;
        writer.close().context("closing parquet writer")?;
        Ok(())
    })
}

/// Run `write` against `<path>.tmp`, then rename over `path`.
fn write_atomically<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<()>,
{
    let tmp = tmp_path(path);
    let file = File::create(&tmp).with_context(|| format!("creating {}", tmp.display()))?;
    let mut buf = BufWriter::new(file);
    if let Err(e) = write(&mut buf) {
        drop(buf);
        let _ = fs::remove_file(&tmp);
        return Err(e.context(format!("writing {}", tmp.display())));
    }
    buf.flush()?;
    buf.get_ref().sync_all()?;
    drop(buf);
    fs::rename(&tmp, path)
        .with_context(|| format!("renaming {} -> {}", tmp.display(), path.display()))?;
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::fetch::resolve_one;
    use crate::process::normalize_csv;
    use crate::test_util::trading_price_csv;
    use tempfile::tempdir;

    #[test]
    fn persist_then_load_round_trip() -> Result<()> {
        let tmp = tempdir()?;
        let catalog = Catalog::builtin();
        let table = catalog.find("trading-price")?;
        let file = resolve_one(2020, 1, table, tmp.path())?;
        assert!(!is_cached(&file));

        let csv = file.data_directory.join(&file.csv_name);
        fs::write(&csv, trading_price_csv(&["2020/01/01 00:30:00", "2020/01/01 01:00:00"]))?;
        let batch = normalize_csv(&csv, table)?;

        persist(&file.data_directory, &batch)?;
        assert!(is_cached(&file));
        assert!(csv_artifact_path(&file.data_directory).exists());
        assert!(!file.data_directory.join("clean.parquet.tmp").exists());

        let loaded = load(&artifact_path(&file.data_directory))?;
        assert_eq!(loaded.num_rows(), 2);
        assert_eq!(loaded.schema().unwrap().fields(), batch.schema().fields());

        let header = fs::read_to_string(csv_artifact_path(&file.data_directory))?;
        assert!(header.starts_with("SETTLEMENTDATE,RUNNO,REGIONID"));
        assert!(header.lines().next().unwrap().ends_with("interval-start,interval-end"));
        Ok(())
    }

    #[test]
    fn failed_write_leaves_no_artifact() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join(ARTIFACT_NAME);
        let res = write_atomically(&path, |_| anyhow::bail!("disk full"));
        assert!(res.is_err());
        assert!(!path.exists());
        assert!(!tmp_path(&path).exists());
    }
}
