//! CSV persistence for the intermediate and output tables.

use csv::{QuoteStyle, ReaderBuilder, WriterBuilder};
use serde::{de::DeserializeOwned, ser::Error as _, Serialize};
use serde_json::{Map, Value};
use std::{
    fs::{self, File},
    io::{BufReader, BufWriter},
    path::{Path, PathBuf},
};

use crate::error::{PipelineError, Result};

/// Write `rows` with a header, quoting non-numeric fields.
///
/// Quoting follows the field's type, not its text: a `String` holding `"1"`
/// is still quoted. The file is written next to `path` and renamed over it,
/// so readers never see a half-written table.
pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| PipelineError::io(parent, e))?;
    }
    let tmp = tmp_path(path);
    let file = File::create(&tmp).map_err(|e| PipelineError::io(&tmp, e))?;

    // fields arrive pre-quoted
    let mut wtr = WriterBuilder::new()
        .quote_style(QuoteStyle::Never)
        .from_writer(BufWriter::new(file));
    for (idx, row) in rows.iter().enumerate() {
        let fields = flat_fields(row)?;
        if idx == 0 {
            wtr.write_record(fields.keys().map(|k| quote(k)))?;
        }
        wtr.write_record(fields.values().map(render))?;
    }
    wtr.flush().map_err(|e| PipelineError::io(&tmp, e))?;
    drop(wtr);

    fs::rename(&tmp, path).map_err(|e| PipelineError::io(path, e))?;
    Ok(())
}

pub fn read_csv<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file = File::open(path).map_err(|e| PipelineError::io(path, e))?;
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .from_reader(BufReader::new(file));
    rdr.deserialize()
        .collect::<std::result::Result<Vec<T>, _>>()
        .map_err(Into::into)
}

/// Field names and values of one row, in declaration order.
fn flat_fields<T: Serialize>(row: &T) -> Result<Map<String, Value>> {
    match serde_json::to_value(row)? {
        Value::Object(fields) => Ok(fields),
        other => Err(serde_json::Error::custom(format!("not a flat record: {}", other)).into()),
    }
}

fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\"\""))
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => quote(s),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        nested => quote(&nested.to_string()),
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.tmp", name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::tempdir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Row {
        id: u32,
        name: String,
    }

    #[test]
    fn empty_table_writes_empty_file() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("out").join("empty.csv");
        write_csv::<Row>(&path, &[]).unwrap();
        // the header comes from the first serialized row
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
        assert!(read_csv::<Row>(&path).unwrap().is_empty());
    }

    #[test]
    fn rewrite_replaces_previous_contents() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("t.csv");
        write_csv(
            &path,
            &[Row { id: 0, name: "a".into() }, Row { id: 1, name: "b".into() }],
        )
        .unwrap();
        write_csv(&path, &[Row { id: 7, name: "z".into() }]).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().collect::<Vec<_>>(), vec![r#""id","name""#, r#"7,"z""#]);
        assert_eq!(
            read_csv::<Row>(&path).unwrap(),
            vec![Row { id: 7, name: "z".into() }]
        );
        assert!(!tmp.path().join(".t.csv.tmp").exists());
    }

    #[test]
    fn numeric_looking_text_is_still_quoted() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("t.csv");
        let rows = vec![
            Row { id: 1, name: "2".into() },
            Row { id: 2, name: r#"say "hi", twice"#.into() },
        ];
        write_csv(&path, &rows).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(
            text.lines().collect::<Vec<_>>(),
            vec![r#""id","name""#, r#"1,"2""#, r#"2,"say ""hi"", twice""#]
        );
        assert_eq!(read_csv::<Row>(&path).unwrap(), rows);
    }
}
