// src/dataset.rs

use anyhow::{Context, Result};
use arrow::{
    array::{new_null_array, ArrayRef},
    compute::{cast, concat_batches},
    datatypes::{DataType, Field, Schema, SchemaRef},
    record_batch::RecordBatch,
};
use std::sync::Arc;

/// Normalized rows for one or more periods of a table.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    batches: Vec<RecordBatch>,
}

impl Dataset {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_batches(batches: Vec<RecordBatch>) -> Self {
        Self { batches }
    }

    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }

    pub fn num_rows(&self) -> usize {
        self.batches.iter().map(RecordBatch::num_rows).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0
    }

    pub fn schema(&self) -> Option<SchemaRef> {
        self.batches.first().map(RecordBatch::schema)
    }

    /// Stack `parts` in order into a single batch.
    ///
    /// Schemas are unified by name: a column missing from a part is null-filled,
    /// and a column whose type differs between parts becomes Utf8.
    pub fn concat(parts: Vec<Dataset>) -> Result<Dataset> {
        let batches: Vec<RecordBatch> = parts.into_iter().flat_map(|d| d.batches).collect();
        if batches.is_empty() {
            return Ok(Dataset::empty());
        }

        let schema = unify_schemas(&batches);
        let aligned = batches
            .iter()
            .map(|b| align(b, &schema))
            .collect::<Result<Vec<_>>>()?;
        let merged = concat_batches(&schema, &aligned).context("concatenating periods")?;
        Ok(Dataset::from_batches(vec![merged]))
    }
}

/// A unified column: its type, and whether any part had a non-null value in it.
struct Unified {
    name: String,
    data_type: DataType,
    observed: bool,
}

fn unify_schemas(batches: &[RecordBatch]) -> SchemaRef {
    let mut fields: Vec<Unified> = Vec::new();
    for batch in batches {
        let schema = batch.schema();
        for (f, col) in schema.fields().iter().zip(batch.columns()) {
            // an all-empty column carries no type information for the range
            let observed = col.null_count() < col.len();
            match fields.iter_mut().find(|u| &u.name == f.name()) {
                None => fields.push(Unified {
                    name: f.name().clone(),
                    data_type: f.data_type().clone(),
                    observed,
                }),
                Some(_) if !observed => {}
                Some(u) if !u.observed => {
                    u.data_type = f.data_type().clone();
                    u.observed = true;
                }
                Some(u) if &u.data_type != f.data_type() => u.data_type = DataType::Utf8,
                Some(_) => {}
            }
        }
    }
    Arc::new(Schema::new(
        fields
            .into_iter()
            .map(|u| Field::new(u.name, u.data_type, true))
            .collect::<Vec<_>>(),
    ))
}

fn align(batch: &RecordBatch, schema: &SchemaRef) -> Result<RecordBatch> {
    let columns = schema
        .fields()
        .iter()
        .map(|f| match batch.column_by_name(f.name()) {
            Some(col) if col.data_type() == f.data_type() => Ok(col.clone()),
            Some(col) => cast(col, f.data_type())
                .with_context(|| format!("casting {} to {}", f.name(), f.data_type())),
            None => Ok(new_null_array(f.data_type(), batch.num_rows())),
        })
        .collect::<Result<Vec<ArrayRef>>>()?;
    RecordBatch::try_new(schema.clone(), columns).context("aligning batch to unified schema")
}
