// src/process/raw_table.rs
/// A parsed MMSDM payload before typing.
#[derive(Debug)]
pub struct RawTable {
    /// Column names from the `I` row, control columns removed.
    pub headers: Vec<String>,
    /// Each `D` row, control columns removed, padded to `headers.len()`.
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Values of column `idx`, row by row.
    pub fn column(&self, idx: usize) -> impl Iterator<Item = &str> + '_ {
        self.rows
            .iter()
            .map(move |r| r.get(idx).map(String::as_str).unwrap_or(""))
    }
}
