use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::info;

use crate::error::{PipelineError, Result};
use crate::tidy::{combined_key, UnifiedRecord};

pub const VARIABLE_DIMENSION: &str = "variable";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableRow {
    pub response_id: u32,
    pub variable_name: String,
    pub response_name: String,
    /// `variable_name|response_name`, the fact builder's join key.
    pub combined: String,
}

/// Distinct (variable, response) pairs numbered from 0 in the order they
/// first appear.
#[tracing::instrument(level = "info", skip_all)]
pub fn build_variable_dimension(records: &[UnifiedRecord]) -> Result<Vec<VariableRow>> {
    info!("creating variable dimension");
    if records.is_empty() {
        return Err(PipelineError::EmptyDimension {
            dimension: VARIABLE_DIMENSION,
        });
    }

    let mut seen: HashSet<(&str, &str)> = HashSet::new();
    let mut keys: HashSet<String> = HashSet::new();
    let mut rows = Vec::new();

    for r in records {
        let pair = (r.variable.as_str(), r.response.as_str());
        if !seen.insert(pair) {
            continue;
        }
        let combined = combined_key(pair.0, pair.1);
        if !keys.insert(combined.clone()) {
            // two different pairs flattened to the same key
            return Err(PipelineError::DuplicateDimensionKey {
                dimension: VARIABLE_DIMENSION,
                key: combined,
            });
        }
        rows.push(VariableRow {
            response_id: rows.len() as u32,
            variable_name: pair.0.to_string(),
            response_name: pair.1.to_string(),
            combined,
        });
    }

    info!(responses = rows.len(), "variable dimension built");
    Ok(rows)
}
