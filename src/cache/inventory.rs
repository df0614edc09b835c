// src/cache/inventory.rs
use anyhow::Result;
use glob::{glob, Pattern};
use std::path::Path;

use super::ARTIFACT_NAME;

/// Periods (`YYYY-MM`) of `table` that already have a normalized artifact, sorted.
pub fn cached_periods(base_directory: &Path, table: &str) -> Result<Vec<String>> {
    let root = Pattern::escape(&base_directory.join(table).to_string_lossy());
    let pattern = format!("{}/*/{}", root, ARTIFACT_NAME);

    let mut periods: Vec<String> = glob(&pattern)?
        .filter_map(Result::ok)
        .filter_map(|p| {
            p.parent()
                .and_then(|d| d.file_name())
                .and_then(|n| n.to_str())
                .map(str::to_string)
        })
        .collect();
    periods.sort();
    Ok(periods)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn lists_only_periods_with_artifact() -> Result<()> {
        let tmp = tempdir()?;
        let table = tmp.path().join("demand");
        for (period, done) in [("2020-02", true), ("2020-01", true), ("2020-03", false)] {
            let dir = table.join(period);
            fs::create_dir_all(&dir)?;
            fs::write(dir.join("raw.zip"), b"zip")?;
            if done {
                fs::write(dir.join(ARTIFACT_NAME), b"pq")?;
            }
        }
        assert_eq!(cached_periods(tmp.path(), "demand")?, vec!["2020-01", "2020-02"]);
        assert!(cached_periods(tmp.path(), "trading-price")?.is_empty());
        Ok(())
    }
}
