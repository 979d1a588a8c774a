use csv::{ReaderBuilder, Trim};
use glob::glob;
use once_cell::sync::Lazy;
use regex::Regex;
use std::{
    collections::BTreeMap,
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

use super::SourceId;
use crate::error::{PipelineError, Result};

static CHART_FILE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^chart(\d+)\.csv$").expect("static regex"));

#[derive(Debug, Clone)]
pub struct RawTable {
    pub source: SourceId,
    /// File the table was read from, kept for error reporting.
    pub path: PathBuf,
    /// Column names from the header row, as the file spells them.
    pub headers: Vec<String>,
    /// Each data row, one String per field.
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Position of the column named `name`, if present.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}

/// Read all eight `chart{i}.csv` files under `dir`.
///
/// Every index 1..=8 must be present. Other `chart*.csv` files are logged and
/// skipped.
#[tracing::instrument(level = "info", skip(dir), fields(dir = %dir.as_ref().display()))]
pub fn load_sources<P: AsRef<Path>>(dir: P) -> Result<BTreeMap<SourceId, RawTable>> {
    let dir = dir.as_ref();
    info!("opening files from source folder");
    warn_unknown_charts(dir);

    let mut tables = BTreeMap::new();
    for id in SourceId::ALL {
        let path = dir.join(id.file_name());
        if !path.is_file() {
            return Err(PipelineError::MissingSource { chart: id, path });
        }
        let table = read_raw_table(id, &path)?;
        debug!(chart = %id, rows = table.rows.len(), "loaded source");
        tables.insert(id, table);
    }
    Ok(tables)
}

fn warn_unknown_charts(dir: &Path) {
    let pattern = format!("{}/chart*.csv", dir.display());
    let entries = match glob(&pattern) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(%pattern, "bad glob pattern: {}", e);
            return;
        }
    };
    for path in entries.filter_map(|e| e.ok()) {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !is_known_chart(name) {
            warn!(file = name, "ignoring chart file outside 1..=8");
        }
    }
}

/// `chart01.csv` parses to index 1 but is never opened, so it is not known.
fn is_known_chart(name: &str) -> bool {
    CHART_FILE
        .captures(name)
        .and_then(|c| c[1].parse::<u8>().ok())
        .and_then(SourceId::from_index)
        .is_some_and(|id| id.file_name() == name)
}

/// Parse one CSV file into a `RawTable`, header row first.
pub fn read_raw_table(source: SourceId, path: &Path) -> Result<RawTable> {
    let file = File::open(path).map_err(|e| PipelineError::io(path, e))?;
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::Headers)
        .from_reader(BufReader::new(file));

    let headers: Vec<String> = rdr
        .headers()
        .map_err(|e| PipelineError::malformed(path, format!("bad header row: {}", e)))?
        .iter()
        .map(str::to_string)
        .collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(PipelineError::malformed(path, "no header row"));
    }

    let mut rows = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        let record = result.map_err(|e| {
            PipelineError::malformed(path, format!("record {}: {}", idx + 1, e))
        })?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(RawTable {
        source,
        path: path.to_path_buf(),
        headers,
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::fs;
    use tempfile::tempdir;

    fn write_all_charts(dir: &Path) {
        for id in SourceId::ALL {
            fs::write(
                dir.join(id.file_name()),
                "region,respuesta,valor_porcentaje\nlima,Si,10.5\n",
            )
            .unwrap();
        }
    }

    #[test]
    fn loads_every_chart_in_order() -> Result<()> {
        let tmp = tempdir()?;
        write_all_charts(tmp.path());
        fs::write(tmp.path().join("chart9.csv"), "x\n1\n")?;

        let tables = load_sources(tmp.path())?;
        assert_eq!(tables.len(), 8);
        let keys: Vec<SourceId> = tables.keys().copied().collect();
        assert_eq!(keys, SourceId::ALL.to_vec());

        let t = &tables[&SourceId::TicAccess];
        assert_eq!(t.headers, vec!["region", "respuesta", "valor_porcentaje"]);
        assert_eq!(t.rows, vec![vec!["lima", "Si", "10.5"]]);
        assert_eq!(t.column("valor_porcentaje"), Some(2));
        Ok(())
    }

    #[test]
    fn missing_chart_is_reported() -> Result<()> {
        let tmp = tempdir()?;
        write_all_charts(tmp.path());
        fs::remove_file(tmp.path().join("chart6.csv"))?;

        match load_sources(tmp.path()) {
            Err(PipelineError::MissingSource { chart, path }) => {
                assert_eq!(chart, SourceId::InternetUse);
                assert!(path.ends_with("chart6.csv"));
            }
            other => panic!("expected MissingSource, got {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn ragged_rows_are_malformed() -> Result<()> {
        let tmp = tempdir()?;
        write_all_charts(tmp.path());
        fs::write(
            tmp.path().join("chart3.csv"),
            "region,respuesta,valor_porcentaje\nlima,Si\n",
        )?;

        let err = load_sources(tmp.path()).unwrap_err();
        assert!(matches!(err, PipelineError::MalformedSource { .. }), "{err}");
        Ok(())
    }

    #[test]
    fn empty_file_is_malformed() -> Result<()> {
        let tmp = tempdir()?;
        write_all_charts(tmp.path());
        fs::write(tmp.path().join("chart1.csv"), "")?;

        let err = load_sources(tmp.path()).unwrap_err();
        assert!(matches!(err, PipelineError::MalformedSource { .. }), "{err}");
        Ok(())
    }

    #[test]
    fn invalid_utf8_is_malformed() -> Result<()> {
        let tmp = tempdir()?;
        let in_row = tmp.path().join("chart2.csv");
        fs::write(
            &in_row,
            b"region,censo,respuesta,valor_porcentaje\nlim\xff,Censo 2007,Si,1\n",
        )?;
        let in_header = tmp.path().join("chart5.csv");
        fs::write(&in_header, b"regi\xffn,respuesta,valor_porcentaje\nlima,Si,1\n")?;

        for (id, path) in [(SourceId::InternetAccess, in_row), (SourceId::ComputerUse, in_header)] {
            match read_raw_table(id, &path) {
                Err(PipelineError::MalformedSource { path: bad, .. }) => assert_eq!(bad, path),
                other => panic!("expected MalformedSource, got {:?}", other),
            }
        }
        Ok(())
    }

    #[test]
    fn only_exact_chart_names_are_known() {
        assert!(is_known_chart("chart1.csv"));
        assert!(is_known_chart("chart8.csv"));
        assert!(!is_known_chart("chart01.csv"));
        assert!(!is_known_chart("chart9.csv"));
        assert!(!is_known_chart("chart0.csv"));
        assert!(!is_known_chart("chart_old.csv"));
    }
}
