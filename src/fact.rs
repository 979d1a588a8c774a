use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

use crate::dimension::{RegionRow, VariableRow, REGION_DIMENSION, VARIABLE_DIMENSION};
use crate::error::{PipelineError, Result};
use crate::tidy::UnifiedRecord;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactRow {
    pub region_id: u32,
    pub data_origin_id: u8,
    pub response_id: u32,
    pub year: u16,
    pub percentage: f64,
}

/// Replace natural keys with dimension ids, one fact per unified record.
///
/// Every region and `variable|response` key must be present in its
/// dimension; a miss means the dimensions were built from other data.
#[tracing::instrument(level = "info", skip_all, fields(rows = records.len()))]
pub fn build_fact_table(
    records: &[UnifiedRecord],
    regions: &[RegionRow],
    variables: &[VariableRow],
) -> Result<Vec<FactRow>> {
    info!("creating fact table");
    let region_ids: HashMap<&str, u32> = regions
        .iter()
        .map(|r| (r.region_name.as_str(), r.region_id))
        .collect();
    let response_ids: HashMap<&str, u32> = variables
        .iter()
        .map(|v| (v.combined.as_str(), v.response_id))
        .collect();

    records
        .iter()
        .enumerate()
        .map(|(row, r)| {
            let region_id = *region_ids.get(r.region.as_str()).ok_or_else(|| {
                PipelineError::UnresolvedForeignKey {
                    row,
                    dimension: REGION_DIMENSION,
                    key: r.region.clone(),
                }
            })?;
            let combined = r.combined_key();
            let response_id = match response_ids.get(combined.as_str()) {
                Some(id) => *id,
                None => {
                    return Err(PipelineError::UnresolvedForeignKey {
                        row,
                        dimension: VARIABLE_DIMENSION,
                        key: combined,
                    })
                }
            };

            Ok(FactRow {
                region_id,
                data_origin_id: r.data_origin.code(),
                response_id,
                year: r.year,
                percentage: r.percentage,
            })
        })
        .collect()
}
