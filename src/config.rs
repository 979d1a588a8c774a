use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::sink::{FACT_TABLE, REGION_TABLE, VARIABLE_TABLE};

/// Directories and mode for one pipeline run.
///
/// Every field has a default, so an empty TOML file is a valid config.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Holds `chart1.csv` .. `chart8.csv`.
    pub source_dir: PathBuf,
    /// Holds the unified `tidy_file.csv`.
    pub temp_dir: PathBuf,
    /// Holds the dimension and fact CSVs.
    pub output_dir: PathBuf,
    /// Where the sink writes when `ingest` is on.
    pub warehouse_dir: PathBuf,
    /// Hand finished tables to the sink; `false` is a dry run.
    pub ingest: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("data_source"),
            temp_dir: PathBuf::from("data_temp"),
            output_dir: PathBuf::from("data_output"),
            warehouse_dir: PathBuf::from("warehouse"),
            ingest: true,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        let config: Config = toml::from_str(&content).map_err(|e| {
            PipelineError::Config(format!("failed to parse {}: {}", path.display(), e))
        })?;
        debug!(?config, "loaded config");
        Ok(config)
    }

    /// Create every directory the run writes into.
    pub fn ensure_dirs(&self) -> Result<()> {
        let mut dirs = vec![&self.temp_dir, &self.output_dir];
        if self.ingest {
            dirs.push(&self.warehouse_dir);
        }
        for d in dirs {
            fs::create_dir_all(d).map_err(|e| PipelineError::io(d, e))?;
        }
        Ok(())
    }

    pub fn unified_path(&self) -> PathBuf {
        self.temp_dir.join("tidy_file.csv")
    }

    pub fn region_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.csv", REGION_TABLE.name))
    }

    pub fn variable_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.csv", VARIABLE_TABLE.name))
    }

    pub fn fact_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.csv", FACT_TABLE.name))
    }
}
