// src/lib.rs
//! Resolve, download and locally cache monthly MMSDM tables from the NEMWeb archive.

pub mod cache;
pub mod catalog;
pub mod config;
pub mod dataset;
pub mod download;
pub mod error;
pub mod fetch;
pub mod pipeline;
pub mod process;

#[cfg(test)]
mod test_util;

pub use catalog::{Catalog, TableDescriptor};
pub use config::Config;
pub use dataset::Dataset;
pub use download::{DownloadReport, Downloader};
pub use error::NemDataError;
pub use pipeline::PeriodOutcome;
