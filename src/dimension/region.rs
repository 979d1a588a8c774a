use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::info;

use crate::error::{PipelineError, Result};
use crate::tidy::UnifiedRecord;

pub const REGION_DIMENSION: &str = "region";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionRow {
    pub region_id: u32,
    pub region_name: String,
}

/// Distinct regions, sorted ascending, numbered from 0.
#[tracing::instrument(level = "info", skip_all)]
pub fn build_region_dimension(records: &[UnifiedRecord]) -> Result<Vec<RegionRow>> {
    info!("creating region dimension");
    if records.is_empty() {
        return Err(PipelineError::EmptyDimension {
            dimension: REGION_DIMENSION,
        });
    }

    let names: BTreeSet<&str> = records.iter().map(|r| r.region.as_str()).collect();
    let rows: Vec<RegionRow> = names
        .into_iter()
        .enumerate()
        .map(|(id, name)| RegionRow {
            region_id: id as u32,
            region_name: name.to_string(),
        })
        .collect();

    info!(regions = rows.len(), "region dimension built");
    Ok(rows)
}
