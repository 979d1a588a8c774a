use arrow::record_batch::RecordBatch;
use chrono::{DateTime, Utc};
use parquet::{arrow::ArrowWriter, basic::Compression, file::properties::WriterProperties};
use serde::Serialize;
use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};
use tracing::{info, warn};

use super::{ColumnType, Sink, TableSpec, WriteMode};
use crate::error::{PipelineError, Result};

/// Sink writing each table to `<dir>/<table>.parquet` plus a
/// `<table>.schema.json` manifest.
pub struct ParquetSink {
    dir: PathBuf,
}

#[derive(Debug, Serialize)]
struct Manifest<'a> {
    table: &'a str,
    primary_key: &'a [&'a str],
    columns: Vec<ManifestColumn<'a>>,
    mode: WriteMode,
    rows: usize,
    loaded_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct ManifestColumn<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    ty: ColumnType,
}

impl ParquetSink {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| PipelineError::io(&dir, e))?;
        Ok(Self { dir })
    }

    pub fn table_path(&self, table: &str) -> PathBuf {
        self.dir.join(format!("{}.parquet", table))
    }

    pub fn manifest_path(&self, table: &str) -> PathBuf {
        self.dir.join(format!("{}.schema.json", table))
    }

    fn stage_parquet(&self, spec: &TableSpec, batch: &RecordBatch) -> Result<PathBuf> {
        let tmp = self.dir.join(format!(".{}.parquet.tmp", spec.name));

        let file = File::create(&tmp).map_err(|e| PipelineError::io(&tmp, e))?;
        let props = WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .build();
        let mut writer = ArrowWriter::try_new(BufWriter::new(file), batch.schema(), Some(props))?;
        writer.write(batch)?;
        writer.close()?;
        Ok(tmp)
    }

    fn stage_manifest(&self, spec: &TableSpec, rows: usize) -> Result<PathBuf> {
        let manifest = Manifest {
            table: spec.name,
            primary_key: spec.primary_key,
            columns: spec
                .columns
                .iter()
                .map(|&(name, ty)| ManifestColumn { name, ty })
                .collect(),
            mode: spec.mode,
            rows,
            loaded_at: Utc::now(),
        };

        let tmp = self.dir.join(format!(".{}.schema.json.tmp", spec.name));
        let mut file = File::create(&tmp).map_err(|e| PipelineError::io(&tmp, e))?;
        serde_json::to_writer_pretty(&mut file, &manifest)?;
        file.write_all(b"\n").map_err(|e| PipelineError::io(&tmp, e))?;
        Ok(tmp)
    }

    /// Replace the table and its manifest together.
    ///
    /// Both files are staged before either is renamed. If the manifest
    /// cannot be moved into place the new table file is removed again.
    fn drop_and_replace(&self, spec: &TableSpec, batch: &RecordBatch) -> Result<()> {
        let table_tmp = self.stage_parquet(spec, batch)?;
        let manifest_tmp = match self.stage_manifest(spec, batch.num_rows()) {
            Ok(tmp) => tmp,
            Err(e) => {
                discard(&table_tmp);
                return Err(e);
            }
        };

        let table = self.table_path(spec.name);
        if let Err(e) = replace(&table_tmp, &table) {
            discard(&manifest_tmp);
            return Err(e);
        }
        if let Err(e) = replace(&manifest_tmp, &self.manifest_path(spec.name)) {
            discard(&manifest_tmp);
            discard(&table);
            return Err(e);
        }
        Ok(())
    }
}

// the rename drops whatever the table held before
fn replace(tmp: &Path, path: &Path) -> Result<()> {
    fs::rename(tmp, path).map_err(|e| PipelineError::io(path, e))
}

fn discard(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        warn!(path = %path.display(), "could not remove partial load: {}", e);
    }
}

impl Sink for ParquetSink {
    fn load(&mut self, spec: &TableSpec, batch: &RecordBatch) -> Result<()> {
        spec.check(batch)?;
        match spec.mode {
            WriteMode::DropAndReplace => self.drop_and_replace(spec, batch)?,
        }
        info!(
            table = spec.name,
            rows = batch.num_rows(),
            path = %self.table_path(spec.name).display(),
            "loaded table"
        );
        Ok(())
    }
}
