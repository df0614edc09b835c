// src/error.rs

use std::path::PathBuf;

use thiserror::Error;

/// Failures a caller may want to tell apart from plain I/O or transport errors.
///
/// Most functions in the crate return `anyhow::Result`; these variants travel
/// inside it and can be recovered with `err.downcast_ref::<NemDataError>()`.
#[derive(Debug, Error)]
pub enum NemDataError {
    #[error("MMSDM table `{name}` not found - tables available are {available:?}")]
    TableNotFound { name: String, available: Vec<String> },

    #[error("MMSDM table `{name}` is defined more than once")]
    DuplicateTable { name: String },

    #[error("invalid date `{input}`: expected YYYY-MM, YYYY-MM-DD or YYYY-MM-DD HH:MM:SS")]
    InvalidDate { input: String },

    #[error("malformed payload {path}: {reason}")]
    MalformedPayload { path: PathBuf, reason: String },

    #[error("archive {archive} does not contain {csv_name}")]
    MissingCsv { archive: PathBuf, csv_name: String },
}

impl NemDataError {
    pub(crate) fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        NemDataError::MalformedPayload {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
