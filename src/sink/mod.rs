// src/sink/mod.rs
pub mod tables;
pub mod warehouse;

pub use warehouse::ParquetSink;
pub use tables::{FACT_TABLE, REGION_TABLE, VARIABLE_TABLE};

use arrow::{
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use serde::Serialize;
use std::sync::Arc;

use crate::error::{PipelineError, Result};

/// Column types understood by the sink.
///
/// - UInt8   → UInt8
/// - UInt16  → UInt16
/// - UInt32  → UInt32
/// - Float64 → Float64
/// - String  → Utf8
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ColumnType {
    UInt8,
    UInt16,
    UInt32,
    Float64,
    String,
}

impl ColumnType {
    pub fn arrow_type(self) -> DataType {
        match self {
            ColumnType::UInt8 => DataType::UInt8,
            ColumnType::UInt16 => DataType::UInt16,
            ColumnType::UInt32 => DataType::UInt32,
            ColumnType::Float64 => DataType::Float64,
            ColumnType::String => DataType::Utf8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WriteMode {
    /// Drop whatever the table held and write the new rows.
    DropAndReplace,
}

/// What the sink needs to know about a logical table.
#[derive(Debug, Clone, Copy)]
pub struct TableSpec {
    pub name: &'static str,
    pub primary_key: &'static [&'static str],
    pub columns: &'static [(&'static str, ColumnType)],
    pub mode: WriteMode,
}

impl TableSpec {
    pub fn arrow_schema(&self) -> Arc<Schema> {
        let fields: Vec<Field> = self
            .columns
            .iter()
            .map(|(name, ty)| Field::new(*name, ty.arrow_type(), false))
            .collect();
        Arc::new(Schema::new(fields))
    }

    /// Reject a batch whose columns differ from this table's by name, order or type.
    pub fn check(&self, batch: &RecordBatch) -> Result<()> {
        let mismatch = |reason: String| PipelineError::SinkSchemaMismatch {
            table: self.name.to_string(),
            reason,
        };

        for pk in self.primary_key {
            if !self.columns.iter().any(|(name, _)| name == pk) {
                return Err(mismatch(format!("primary key {} is not a column", pk)));
            }
        }

        let schema = batch.schema();
        if schema.fields().len() != self.columns.len() {
            return Err(mismatch(format!(
                "expected {} columns, batch has {}",
                self.columns.len(),
                schema.fields().len()
            )));
        }
        for (field, (name, ty)) in schema.fields().iter().zip(self.columns) {
            if field.name() != name {
                return Err(mismatch(format!(
                    "expected column {}, found {}",
                    name,
                    field.name()
                )));
            }
            if field.data_type() != &ty.arrow_type() {
                return Err(mismatch(format!(
                    "column {} is {}, expected {:?}",
                    name,
                    field.data_type(),
                    ty
                )));
            }
        }
        Ok(())
    }
}

/// Destination for finished star-schema tables.
pub trait Sink {
    fn load(&mut self, spec: &TableSpec, batch: &RecordBatch) -> Result<()>;
}

/// A row type that maps onto one sink table.
pub trait SinkTable: Sized {
    const SPEC: TableSpec;

    fn to_record_batch(rows: &[Self]) -> Result<RecordBatch>;
}

/// Convert `rows` and hand them to `sink`.
pub fn load_table<T: SinkTable>(sink: &mut (dyn Sink + '_), rows: &[T]) -> Result<()> {
    let batch = T::to_record_batch(rows)?;
    sink.load(&T::SPEC, &batch)
}
