use arrow::{
    array::{ArrayRef, Float64Array, StringArray, UInt16Array, UInt32Array, UInt8Array},
    record_batch::RecordBatch,
};
use std::sync::Arc;

use super::{ColumnType, SinkTable, TableSpec, WriteMode};
use crate::dimension::{RegionRow, VariableRow};
use crate::error::Result;
use crate::fact::FactRow;

pub const REGION_TABLE: TableSpec = TableSpec {
    name: "tic_dim_region",
    primary_key: &["region_id"],
    columns: &[
        ("region_id", ColumnType::UInt32),
        ("region_name", ColumnType::String),
    ],
    mode: WriteMode::DropAndReplace,
};

pub const VARIABLE_TABLE: TableSpec = TableSpec {
    name: "tic_dim_variable",
    primary_key: &["response_id"],
    columns: &[
        ("response_id", ColumnType::UInt32),
        ("variable_name", ColumnType::String),
        ("response_name", ColumnType::String),
        ("combined", ColumnType::String),
    ],
    mode: WriteMode::DropAndReplace,
};

pub const FACT_TABLE: TableSpec = TableSpec {
    name: "tic_fact",
    primary_key: &["region_id"],
    columns: &[
        ("region_id", ColumnType::UInt32),
        ("data_origin_id", ColumnType::UInt8),
        ("response_id", ColumnType::UInt32),
        ("year", ColumnType::UInt16),
        ("percentage", ColumnType::Float64),
    ],
    mode: WriteMode::DropAndReplace,
};

fn strings<'a>(values: impl Iterator<Item = &'a str>) -> ArrayRef {
    Arc::new(values.map(Some).collect::<StringArray>())
}

impl SinkTable for RegionRow {
    const SPEC: TableSpec = REGION_TABLE;

    fn to_record_batch(rows: &[Self]) -> Result<RecordBatch> {
        let columns: Vec<ArrayRef> = vec![
            Arc::new(UInt32Array::from_iter_values(rows.iter().map(|r| r.region_id))),
            strings(rows.iter().map(|r| r.region_name.as_str())),
        ];
        Ok(RecordBatch::try_new(Self::SPEC.arrow_schema(), columns)?)
    }
}

impl SinkTable for VariableRow {
    const SPEC: TableSpec = VARIABLE_TABLE;

    fn to_record_batch(rows: &[Self]) -> Result<RecordBatch> {
        let columns: Vec<ArrayRef> = vec![
            Arc::new(UInt32Array::from_iter_values(rows.iter().map(|r| r.response_id))),
            strings(rows.iter().map(|r| r.variable_name.as_str())),
            strings(rows.iter().map(|r| r.response_name.as_str())),
            strings(rows.iter().map(|r| r.combined.as_str())),
        ];
        Ok(RecordBatch::try_new(Self::SPEC.arrow_schema(), columns)?)
    }
}

impl SinkTable for FactRow {
    const SPEC: TableSpec = FACT_TABLE;

    fn to_record_batch(rows: &[Self]) -> Result<RecordBatch> {
        let columns: Vec<ArrayRef> = vec![
            Arc::new(UInt32Array::from_iter_values(rows.iter().map(|r| r.region_id))),
            Arc::new(UInt8Array::from_iter_values(rows.iter().map(|r| r.data_origin_id))),
            Arc::new(UInt32Array::from_iter_values(rows.iter().map(|r| r.response_id))),
            Arc::new(UInt16Array::from_iter_values(rows.iter().map(|r| r.year))),
            Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.percentage))),
        ];
        Ok(RecordBatch::try_new(Self::SPEC.arrow_schema(), columns)?)
    }
}
