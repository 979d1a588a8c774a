// src/tidy/mod.rs
pub mod text;

use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, path::Path};
use tracing::{debug, info};

use crate::error::{PipelineError, Result};
use crate::store::{read_csv, write_csv};
use crate::source::{
    DataOrigin, RawTable, SourceId, YearRule, PERCENTAGE_COLUMN, REGION_COLUMN,
};
use text::{census_year, parse_percentage, title_case};

/// One row of the long-format table shared by every later stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedRecord {
    pub region: String,
    pub data_origin: DataOrigin,
    pub year: u16,
    pub variable: String,
    pub response: String,
    pub percentage: f64,
}

impl UnifiedRecord {
    /// Join key into the variable dimension.
    pub fn combined_key(&self) -> String {
        combined_key(&self.variable, &self.response)
    }
}

pub fn combined_key(variable: &str, response: &str) -> String {
    format!("{}|{}", variable, response)
}

/// Column positions resolved against one file's header.
struct Columns {
    region: usize,
    percentage: usize,
    response: usize,
    year: YearColumn,
}

enum YearColumn {
    Census(usize),
    Fixed(u16),
}

impl Columns {
    fn resolve(table: &RawTable) -> Result<Self> {
        let layout = table.source.layout();
        let require = |name: &str| {
            table.column(name).ok_or_else(|| {
                PipelineError::malformed(&table.path, format!("missing column {:?}", name))
            })
        };

        let region = require(REGION_COLUMN)?;
        let percentage = require(PERCENTAGE_COLUMN)?;
        let year = match layout.year {
            YearRule::CensusLabel(name) => YearColumn::Census(require(name)?),
            YearRule::Fixed(year) => YearColumn::Fixed(year),
        };
        if layout.response_column >= table.headers.len() {
            return Err(PipelineError::malformed(
                &table.path,
                format!(
                    "response column {} out of range for {} columns",
                    layout.response_column,
                    table.headers.len()
                ),
            ));
        }

        Ok(Self {
            region,
            percentage,
            response: layout.response_column,
            year,
        })
    }
}

/// Reshape one source table into unified records.
pub fn tidy_source(table: &RawTable) -> Result<Vec<UnifiedRecord>> {
    let id = table.source;
    let layout = id.layout();
    let cols = Columns::resolve(table)?;

    table
        .rows
        .iter()
        .enumerate()
        .map(|(idx, row)| {
            if row.len() != table.headers.len() {
                return Err(PipelineError::malformed(
                    &table.path,
                    format!(
                        "record {}: {} fields, header has {}",
                        idx + 1,
                        row.len(),
                        table.headers.len()
                    ),
                ));
            }
            let year = match cols.year {
                YearColumn::Census(c) => {
                    census_year(&row[c]).ok_or_else(|| PipelineError::InvalidYearFormat {
                        chart: id,
                        label: row[c].clone(),
                    })?
                }
                YearColumn::Fixed(year) => year,
            };
            let percentage = parse_percentage(&row[cols.percentage]).ok_or_else(|| {
                PipelineError::malformed(
                    &table.path,
                    format!(
                        "record {}: {:?} is not a percentage",
                        idx + 1,
                        row[cols.percentage]
                    ),
                )
            })?;

            Ok(UnifiedRecord {
                region: title_case(&row[cols.region]),
                data_origin: layout.origin,
                year,
                variable: layout.label.to_string(),
                response: row[cols.response].clone(),
                percentage,
            })
        })
        .collect()
}

/// Reshape all sources and concatenate them in source order.
///
/// A chart absent from `tables` fails with `MissingSource` whose `path` is the
/// bare file name (`chart3.csv`), relative to whatever directory the tables
/// were loaded from.
#[tracing::instrument(level = "info", skip_all)]
pub fn normalize(tables: &BTreeMap<SourceId, RawTable>) -> Result<Vec<UnifiedRecord>> {
    info!("tidying up source tables");
    let mut unified = Vec::new();
    for id in SourceId::ALL {
        let table = tables.get(&id).ok_or_else(|| PipelineError::MissingSource {
            chart: id,
            path: id.file_name().into(),
        })?;
        let records = tidy_source(table)?;
        debug!(chart = %id, rows = records.len(), "tidied source");
        unified.extend(records);
    }
    info!(rows = unified.len(), "unified table built");
    Ok(unified)
}

/// Persist the unified table, quoting every non-numeric field.
pub fn write_unified(path: &Path, records: &[UnifiedRecord]) -> Result<()> {
    write_csv(path, records)?;
    info!(path = %path.display(), rows = records.len(), "wrote unified table");
    Ok(())
}

pub fn read_unified(path: &Path) -> Result<Vec<UnifiedRecord>> {
    read_csv(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn raw(source: SourceId, headers: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable {
            source,
            path: PathBuf::from(source.file_name()),
            headers: headers.iter().map(|s| s.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        }
    }

    fn inei(source: SourceId, rows: &[&[&str]]) -> RawTable {
        raw(
            source,
            &["region", "censo", "respuesta", "valor_porcentaje"],
            rows,
        )
    }

    fn ene(source: SourceId, rows: &[&[&str]]) -> RawTable {
        raw(source, &["region", "respuesta", "valor_porcentaje"], rows)
    }

    fn all_sources() -> BTreeMap<SourceId, RawTable> {
        SourceId::ALL
            .iter()
            .map(|&id| {
                let table = if id.index() <= 4 {
                    inei(id, &[&["lima", "Censo 2007", "Si", "40.0"]])
                } else {
                    ene(id, &[&["LIMA", "No", "60.0"]])
                };
                (id, table)
            })
            .collect()
    }

    #[test]
    fn inei_rows_take_census_year_and_third_column() {
        let t = inei(
            SourceId::InternetAccess,
            &[&["la libertad", "Censo 2007", "No tiene", "12.5"]],
        );
        let out = tidy_source(&t).unwrap();
        assert_eq!(
            out,
            vec![UnifiedRecord {
                region: "La Libertad".into(),
                data_origin: DataOrigin::Inei,
                year: 2007,
                variable: "Acceso a Internet".into(),
                response: "No tiene".into(),
                percentage: 12.5,
            }]
        );
    }

    #[test]
    fn ene_rows_are_stamped_2017() {
        let t = ene(SourceId::ProductSearch, &[&["CUSCO", "Sí", "3.25"]]);
        let out = tidy_source(&t).unwrap();
        assert_eq!(out[0].year, 2017);
        assert_eq!(out[0].data_origin, DataOrigin::Ene);
        assert_eq!(out[0].response, "Sí");
        assert_eq!(
            out[0].variable,
            "Usó Internet para buscar Productos y Servicios"
        );
    }

    #[test]
    fn bad_census_label_is_rejected() {
        let t = inei(SourceId::TicAccess, &[&["lima", "Censo", "Si", "1"]]);
        match tidy_source(&t) {
            Err(PipelineError::InvalidYearFormat { chart, label }) => {
                assert_eq!(chart, SourceId::TicAccess);
                assert_eq!(label, "Censo");
            }
            other => panic!("expected InvalidYearFormat, got {:?}", other),
        }
    }

    #[test]
    fn missing_columns_are_malformed() {
        let t = raw(
            SourceId::CableTv,
            &["region", "respuesta", "x", "valor_porcentaje"],
            &[],
        );
        assert!(matches!(
            tidy_source(&t),
            Err(PipelineError::MalformedSource { .. })
        ));

        let narrow = raw(SourceId::ComputerUse, &["region"], &[]);
        assert!(matches!(
            tidy_source(&narrow),
            Err(PipelineError::MalformedSource { .. })
        ));
    }

    #[test]
    fn unparsable_percentage_is_malformed() {
        let t = ene(SourceId::InternetUse, &[&["lima", "Si", "--"]]);
        assert!(matches!(
            tidy_source(&t),
            Err(PipelineError::MalformedSource { .. })
        ));
    }

    #[test]
    fn normalize_concatenates_in_source_order() {
        let unified = normalize(&all_sources()).unwrap();
        assert_eq!(unified.len(), 8);
        let labels: Vec<&str> = unified.iter().map(|r| r.variable.as_str()).collect();
        let expected: Vec<&str> = SourceId::ALL.iter().map(|s| s.label()).collect();
        assert_eq!(labels, expected);
        assert!(unified.iter().all(|r| r.region == "Lima"));
        assert_eq!(unified[3].year, 2007);
        assert_eq!(unified[4].year, 2017);
    }

    #[test]
    fn absent_chart_reports_its_file_name() {
        let mut tables = all_sources();
        tables.remove(&SourceId::CableTv);
        match normalize(&tables) {
            Err(PipelineError::MissingSource { chart, path }) => {
                assert_eq!(chart, SourceId::CableTv);
                assert_eq!(path, PathBuf::from("chart3.csv"));
            }
            other => panic!("expected MissingSource, got {:?}", other),
        }
    }

    #[test]
    fn unified_file_quotes_text_and_reads_back() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("tidy_file.csv");
        let records = normalize(&all_sources()).unwrap();

        write_unified(&path, &records).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some(r#""region","data_origin","year","variable","response","percentage""#)
        );
        assert_eq!(
            lines.next(),
            Some(r#""Lima","INEI",2007,"Acceso a TIC","Si",40.0"#)
        );

        assert_eq!(read_unified(&path).unwrap(), records);
    }
}
