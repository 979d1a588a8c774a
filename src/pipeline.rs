use std::time::Instant;
use tracing::info;

use crate::config::Config;
use crate::dimension::{build_region_dimension, build_variable_dimension, RegionRow, VariableRow};
use crate::error::Result;
use crate::fact::{build_fact_table, FactRow};
use crate::sink::{load_table, ParquetSink, Sink};
use crate::source::load_sources;
use crate::store::{read_csv, write_csv};
use crate::tidy::{normalize, read_unified, write_unified};

/// Row counts of one completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub unified_rows: usize,
    pub regions: usize,
    pub responses: usize,
    pub facts: usize,
    pub ingested: bool,
}

/// The four stages, wired to the directories in a `Config`.
///
/// Each stage reads its input from disk, so stages can also be run one at a
/// time against artifacts left by an earlier run.
pub struct Pipeline {
    config: Config,
}

impl Pipeline {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run every stage, loading into a `ParquetSink` under `warehouse_dir`
    /// when `ingest` is set.
    pub fn run(&self) -> Result<RunSummary> {
        if self.config.ingest {
            let mut warehouse = ParquetSink::new(&self.config.warehouse_dir)?;
            let sink: &mut dyn Sink = &mut warehouse;
            self.run_with_sink(Some(sink))
        } else {
            self.run_with_sink(None)
        }
    }

    /// Run every stage; `None` is a dry run that stops at the CSV outputs.
    pub fn run_with_sink(&self, mut sink: Option<&mut (dyn Sink + '_)>) -> Result<RunSummary> {
        let start = Instant::now();
        self.config.ensure_dirs()?;

        let unified_rows = self.tidy()?;
        let regions = self.region_dimension(sink.as_deref_mut())?.len();
        let responses = self.variable_dimension(sink.as_deref_mut())?.len();
        let facts = self.fact_table(sink.as_deref_mut())?.len();

        let summary = RunSummary {
            unified_rows,
            regions,
            responses,
            facts,
            ingested: sink.is_some(),
        };
        info!(?summary, elapsed = ?start.elapsed(), "pipeline finished");
        Ok(summary)
    }

    /// Load the eight sources and write the unified table.
    pub fn tidy(&self) -> Result<usize> {
        let tables = load_sources(&self.config.source_dir)?;
        let unified = normalize(&tables)?;
        write_unified(&self.config.unified_path(), &unified)?;
        Ok(unified.len())
    }

    pub fn region_dimension(&self, sink: Option<&mut (dyn Sink + '_)>) -> Result<Vec<RegionRow>> {
        let unified = read_unified(&self.config.unified_path())?;
        let rows = build_region_dimension(&unified)?;
        write_csv(&self.config.region_path(), &rows)?;
        if let Some(sink) = sink {
            load_table(sink, &rows)?;
        }
        Ok(rows)
    }

    pub fn variable_dimension(&self, sink: Option<&mut (dyn Sink + '_)>) -> Result<Vec<VariableRow>> {
        let unified = read_unified(&self.config.unified_path())?;
        let rows = build_variable_dimension(&unified)?;
        write_csv(&self.config.variable_path(), &rows)?;
        if let Some(sink) = sink {
            load_table(sink, &rows)?;
        }
        Ok(rows)
    }

    /// Needs both dimension files from the previous stages on disk.
    pub fn fact_table(&self, sink: Option<&mut (dyn Sink + '_)>) -> Result<Vec<FactRow>> {
        let unified = read_unified(&self.config.unified_path())?;
        let regions: Vec<RegionRow> = read_csv(&self.config.region_path())?;
        let variables: Vec<VariableRow> = read_csv(&self.config.variable_path())?;

        let rows = build_fact_table(&unified, &regions, &variables)?;
        write_csv(&self.config.fact_path(), &rows)?;
        info!(rows = rows.len(), "fact table built");
        if let Some(sink) = sink {
            load_table(sink, &rows)?;
        }
        Ok(rows)
    }
}
