// src/fetch/zips.rs
use anyhow::{Context, Result};
use std::{
    fs::{self, File},
    io::BufWriter,
    path::{Path, PathBuf},
};
use tracing::debug;
use url::Url;
use zip::ZipArchive;

use super::{Fetched, Transport};
use crate::error::NemDataError;

/// Download `url` to `dest`. Returns `Ok(false)` when the server has nothing
/// for this URL; `dest` is then left untouched.
///
/// The body lands in `<dest>.tmp` first and is renamed once complete.
pub fn download_zip(transport: &dyn Transport, url: &Url, dest: &Path) -> Result<bool> {
    let tmp = dest.with_extension("zip.tmp");
    let file = File::create(&tmp).with_context(|| format!("creating {}", tmp.display()))?;
    let mut writer = BufWriter::new(file);

    let fetched = match transport.fetch(url, &mut writer) {
        Ok(f) => f,
        Err(e) => {
            drop(writer);
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }
    };

    match fetched {
        Fetched::Complete { bytes } => {
            writer
                .into_inner()
                .map_err(|e| e.into_error())
                .and_then(|f| f.sync_all())
                .with_context(|| format!("flushing {}", tmp.display()))?;
            fs::rename(&tmp, dest)
                .with_context(|| format!("renaming {} -> {}", tmp.display(), dest.display()))?;
            debug!(url = %url, bytes, "downloaded");
            Ok(true)
        }
        Fetched::Missing { status } => {
            drop(writer);
            fs::remove_file(&tmp).with_context(|| format!("removing {}", tmp.display()))?;
            debug!(url = %url, status, "not published");
            Ok(false)
        }
    }
}

/// Extract every entry of `zip_path` next to it. Returns the extracted file paths.
pub fn unzip(zip_path: &Path) -> Result<Vec<PathBuf>> {
    let dir = zip_path
        .parent()
        .with_context(|| format!("{} has no parent directory", zip_path.display()))?;
    let file =
        File::open(zip_path).with_context(|| format!("opening {}", zip_path.display()))?;
    let mut archive = ZipArchive::new(file)
        .with_context(|| format!("reading ZIP archive {}", zip_path.display()))?;

    let names: Vec<PathBuf> = archive
        .file_names()
        .filter(|n| !n.ends_with('/'))
        .map(|n| dir.join(n))
        .collect();
    archive
        .extract(dir)
        .with_context(|| format!("extracting {}", zip_path.display()))?;
    debug!(archive = %zip_path.display(), files = names.len(), "extracted");
    Ok(names)
}

/// Locate `csv_name` among extracted files, ignoring case.
pub fn find_csv(zip_path: &Path, extracted: &[PathBuf], csv_name: &str) -> Result<PathBuf> {
    extracted
        .iter()
        .find(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.eq_ignore_ascii_case(csv_name))
        })
        .cloned()
        .ok_or_else(|| {
            NemDataError::MissingCsv {
                archive: zip_path.to_path_buf(),
                csv_name: csv_name.to_string(),
            }
            .into()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{zip_bytes, MemoryTransport};
    use tempfile::tempdir;

    #[test]
    fn download_then_unzip_in_place() -> Result<()> {
        let tmp = tempdir()?;
        let url = Url::parse("https://example.test/a.zip")?;
        let transport = MemoryTransport::default();
        transport.publish(url.as_str(), zip_bytes("INNER.CSV", "C,hello\n"));

        let dest = tmp.path().join("raw.zip");
        assert!(download_zip(&transport, &url, &dest)?);
        assert!(dest.exists());
        assert!(!tmp.path().join("raw.zip.tmp").exists());

        let extracted = unzip(&dest)?;
        assert_eq!(extracted, vec![tmp.path().join("INNER.CSV")]);
        assert_eq!(fs::read_to_string(tmp.path().join("INNER.CSV"))?, "C,hello\n");

        let csv = find_csv(&dest, &extracted, "inner.csv")?;
        assert_eq!(csv, tmp.path().join("INNER.CSV"));
        Ok(())
    }

    #[test]
    fn missing_resource_leaves_nothing_behind() -> Result<()> {
        let tmp = tempdir()?;
        let url = Url::parse("https://example.test/nope.zip")?;
        let transport = MemoryTransport::default();

        let dest = tmp.path().join("raw.zip");
        assert!(!download_zip(&transport, &url, &dest)?);
        assert!(!dest.exists());
        assert_eq!(fs::read_dir(tmp.path())?.count(), 0);
        Ok(())
    }

    #[test]
    fn absent_csv_is_typed_error() {
        let err = find_csv(Path::new("raw.zip"), &[PathBuf::from("OTHER.CSV")], "X.CSV")
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<NemDataError>(),
            Some(NemDataError::MissingCsv { .. })
        ));
    }
}
