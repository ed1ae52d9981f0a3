//! JSON and CSV materialization of a run's records.
//!
//! The JSON file is the canonical output the dashboard reads. The CSV header
//! is the sorted union of every key seen across all records, so optional
//! fields that only some records carry still get a column.

use std::collections::BTreeSet;
use std::io::Write;
use std::path::Path;

use thiserror::Error;

use crate::records::InspectionRecord;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error writing {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),
}

/// Write `records` as a pretty-printed UTF-8 JSON array, creating parent
/// directories as needed.
///
/// # Errors
///
/// Returns [`ExportError`] if serialization or the file write fails.
pub fn write_json(path: &Path, records: &[InspectionRecord]) -> Result<(), ExportError> {
    ensure_parent(path)?;
    let body = serde_json::to_string_pretty(records)?;
    std::fs::write(path, body).map_err(|e| ExportError::Io {
        path: path.display().to_string(),
        source: e,
    })
}

/// Write `records` as CSV to `path`.
///
/// # Errors
///
/// Returns [`ExportError`] if the file cannot be created or written.
pub fn write_csv(path: &Path, records: &[InspectionRecord]) -> Result<(), ExportError> {
    ensure_parent(path)?;
    let file = std::fs::File::create(path).map_err(|e| ExportError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    write_csv_to(file, records)
}

/// Write `records` as CSV into any writer.
///
/// # Errors
///
/// Returns [`ExportError`] if serialization or the write fails.
pub fn write_csv_to<W: Write>(writer: W, records: &[InspectionRecord]) -> Result<(), ExportError> {
    let rows = records
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<Vec<_>, _>>()?;

    let header: BTreeSet<&str> = rows
        .iter()
        .filter_map(serde_json::Value::as_object)
        .flat_map(|obj| obj.keys().map(String::as_str))
        .collect();

    let mut out = csv::Writer::from_writer(writer);
    out.write_record(&header)?;
    for row in &rows {
        let cells = header.iter().map(|key| match row.get(*key) {
            None | Some(serde_json::Value::Null) => String::new(),
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        });
        out.write_record(cells)?;
    }
    out.flush().map_err(|e| ExportError::Io {
        path: "<csv writer>".to_string(),
        source: e,
    })?;
    Ok(())
}

/// Load records previously written by [`write_json`].
///
/// A missing file yields an empty list.
///
/// # Errors
///
/// Returns [`ExportError`] if the file exists but cannot be read or parsed.
pub fn load_records(path: &Path) -> Result<Vec<InspectionRecord>, ExportError> {
    match std::fs::read_to_string(path) {
        Ok(body) => Ok(serde_json::from_str(&body)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(ExportError::Io {
            path: path.display().to_string(),
            source: e,
        }),
    }
}

/// File name used by `--test` runs so they never clobber the canonical output.
#[must_use]
pub fn test_output_filename(stamp: &str) -> String {
    format!("inspections_test_{stamp}.json")
}

fn ensure_parent(path: &Path) -> Result<(), ExportError> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            std::fs::create_dir_all(dir).map_err(|e| ExportError::Io {
                path: dir.display().to_string(),
                source: e,
            })
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::Severity;

    fn record(name: &str, license: Option<&str>) -> InspectionRecord {
        InspectionRecord {
            region: "washtenaw".to_string(),
            business_name: name.to_string(),
            address: "120 Main Street".to_string(),
            inspection_date: "2024-03-02".to_string(),
            violations: "Handwash sink blocked, no soap".to_string(),
            severity: Severity::Critical,
            report_link: String::new(),
            license_number: license.map(str::to_string),
            establishment_type: None,
        }
    }

    fn csv_string(records: &[InspectionRecord]) -> String {
        let mut buf = Vec::new();
        write_csv_to(&mut buf, records).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn csv_header_is_sorted_union_of_keys() {
        let out = csv_string(&[record("Frita Batidos", None), record("Jerusalem Garden", Some("L-1"))]);
        let header = out.lines().next().unwrap();
        assert_eq!(
            header,
            "address,business_name,county,inspection_date,license_number,report_link,severity,violations"
        );
    }

    #[test]
    fn csv_renders_missing_fields_as_empty_cells() {
        let out = csv_string(&[record("Frita Batidos", None), record("Jerusalem Garden", Some("L-1"))]);
        let rows: Vec<&str> = out.lines().collect();
        assert_eq!(rows.len(), 3);
        // license_number column is the fifth; empty for the first record.
        assert!(rows[1].contains("2024-03-02,,"));
        assert!(rows[2].contains("2024-03-02,L-1,"));
    }

    #[test]
    fn csv_quotes_cells_containing_commas() {
        let out = csv_string(&[record("Frita Batidos", None)]);
        assert!(out.contains("\"Handwash sink blocked, no soap\""));
    }

    #[test]
    fn test_output_filename_embeds_stamp() {
        assert_eq!(
            test_output_filename("20240115_093000"),
            "inspections_test_20240115_093000.json"
        );
    }

    #[test]
    fn load_records_returns_empty_for_missing_file() {
        let path = std::env::temp_dir().join("inspdb-export-test-does-not-exist.json");
        assert!(load_records(&path).unwrap().is_empty());
    }

    #[test]
    fn json_written_is_readable_back() {
        let path = std::env::temp_dir().join(format!(
            "inspdb-export-test-{}.json",
            std::process::id()
        ));
        let records = vec![record("Frita Batidos", Some("L-9"))];
        write_json(&path, &records).unwrap();
        let body = std::fs::read_to_string(&path).unwrap();
        assert!(body.starts_with("[\n"));
        assert_eq!(load_records(&path).unwrap(), records);
        std::fs::remove_file(&path).ok();
    }
}
