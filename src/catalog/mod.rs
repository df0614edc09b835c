// src/catalog/mod.rs

pub mod tables;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, fs, path::Path};

use crate::error::NemDataError;
pub use tables::{builtin_tables, Frequency, TableDescriptor, VariableFrequency};

/// Immutable registry of table descriptors, built once at startup and
/// handed to whoever needs it.
#[derive(Debug, Clone)]
pub struct Catalog {
    tables: Vec<TableDescriptor>,
}

/// On-disk shape of a catalog override file.
#[derive(Debug, Serialize, Deserialize)]
struct CatalogFile {
    tables: Vec<TableDescriptor>,
}

impl Catalog {
    /// Build a catalog, rejecting duplicate names.
    pub fn new(tables: Vec<TableDescriptor>) -> Result<Self, NemDataError> {
        let mut seen = HashSet::with_capacity(tables.len());
        for t in &tables {
            if !seen.insert(t.name.as_str()) {
                return Err(NemDataError::DuplicateTable {
                    name: t.name.clone(),
                });
            }
        }
        Ok(Self { tables })
    }

    pub fn builtin() -> Self {
        Self {
            tables: builtin_tables(),
        }
    }

    /// Load a catalog from a YAML file with a top-level `tables:` list.
    pub fn from_yaml_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading catalog {}", path.display()))?;
        Self::from_yaml_str(&text).with_context(|| format!("loading catalog {}", path.display()))
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let file: CatalogFile = serde_yaml::from_str(text).context("parsing catalog YAML")?;
        Ok(Self::new(file.tables)?)
    }

    /// Look a table up by its logical name.
    pub fn find(&self, name: &str) -> Result<&TableDescriptor, NemDataError> {
        self.tables
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| NemDataError::TableNotFound {
                name: name.to_string(),
                available: self.names().into_iter().map(str::to_string).collect(),
            })
    }

    pub fn names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn tables(&self) -> &[TableDescriptor] {
        &self.tables
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}
