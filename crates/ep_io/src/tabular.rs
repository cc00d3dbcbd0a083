//! Tabular import of historical results and polls.
//!
//! Contract (shared with the original spreadsheet templates):
//! - first column identifies the row (`Año` for historical, `Encuesta`
//!   for polls); every remaining column is a party with numeric
//!   percentages.
//! - rows whose percentages sum more than 0.1 away from 100 are accepted
//!   and reported as warnings — survey rounding is expected, silence
//!   about it is not.
//! - missing id column, duplicate row keys, and non-numeric cells are
//!   hard errors.
//!
//! CSV is always available; XLSX sits behind the `xlsx` feature.

use std::collections::btree_map::Entry;
use std::path::Path;

use ep_core::parties::PartyId;
use ep_core::shares::{HistoricalRecord, PollSet, ShareMap};

use crate::{IoError, IoResult};

/// Identifying column for historical tables.
pub const HISTORICAL_ID_COLUMN: &str = "Año";
/// Identifying column for poll tables.
pub const POLLS_ID_COLUMN: &str = "Encuesta";

/// Tolerated deviation of a row's percentage sum from 100.
const SUM_TOLERANCE: f64 = 0.1;

/// A row whose percentages do not sum to 100 (within tolerance).
#[derive(Clone, Debug, PartialEq)]
pub struct ImportWarning {
    /// Row key (year or poll id).
    pub row: String,
    /// The row's actual percentage sum.
    pub total: f64,
}

impl std::fmt::Display for ImportWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "row '{}' sums to {:.2}, expected 100", self.row, self.total)
    }
}

/// Imported data plus the warnings gathered while reading it.
#[derive(Clone, Debug)]
pub struct Imported<T> {
    pub data: T,
    pub warnings: Vec<ImportWarning>,
}

/// Read a historical table (years → shares) from CSV or XLSX.
pub fn read_historical(path: &Path) -> IoResult<Imported<HistoricalRecord>> {
    let table = read_table(path)?;
    let (rows, warnings) = parse_share_rows(table, HISTORICAL_ID_COLUMN)?;

    let mut data = HistoricalRecord::new();
    for (key, shares) in rows {
        // Years may arrive as "2020" or "2020.0" depending on the source tool.
        let year = key
            .parse::<f64>()
            .ok()
            .filter(|y| y.fract() == 0.0 && (0.0..=u16::MAX as f64).contains(y))
            .map(|y| y as u16)
            .ok_or_else(|| IoError::Table {
                location: format!("row '{key}'"),
                msg: "year must be a whole number".into(),
            })?;
        match data.entry(year) {
            Entry::Vacant(e) => {
                e.insert(shares);
            }
            Entry::Occupied(_) => {
                return Err(IoError::Table {
                    location: format!("row '{key}'"),
                    msg: "duplicate year".into(),
                })
            }
        }
    }
    Ok(Imported { data, warnings })
}

/// Read a poll table (poll ids → shares) from CSV or XLSX.
pub fn read_polls(path: &Path) -> IoResult<Imported<PollSet>> {
    let table = read_table(path)?;
    let (rows, warnings) = parse_share_rows(table, POLLS_ID_COLUMN)?;

    let mut data = PollSet::new();
    for (key, shares) in rows {
        match data.entry(key.clone()) {
            Entry::Vacant(e) => {
                e.insert(shares);
            }
            Entry::Occupied(_) => {
                return Err(IoError::Table {
                    location: format!("row '{key}'"),
                    msg: "duplicate poll id".into(),
                })
            }
        }
    }
    Ok(Imported { data, warnings })
}

/* ---------------- Raw table reading (format dispatch) ---------------- */

struct RawTable {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

fn read_table(path: &Path) -> IoResult<RawTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "csv" => read_csv(path),
        #[cfg(feature = "xlsx")]
        "xlsx" | "xls" => read_xlsx(path),
        other => Err(IoError::Path(format!(
            "unsupported table format '.{other}': {}",
            path.display()
        ))),
    }
}

fn read_csv(path: &Path) -> IoResult<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;

    let header: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(|c| c.to_string()).collect());
    }
    Ok(RawTable { header, rows })
}

#[cfg(feature = "xlsx")]
fn read_xlsx(path: &Path) -> IoResult<RawTable> {
    use calamine::{open_workbook_auto, DataType, Reader};

    fn cell_to_string(cell: &DataType) -> String {
        match cell {
            DataType::String(s) => s.trim().to_string(),
            DataType::Float(f) => format!("{f}"),
            DataType::Int(i) => format!("{i}"),
            DataType::Bool(b) => format!("{b}"),
            _ => String::new(),
        }
    }

    let mut workbook = open_workbook_auto(path).map_err(|e| IoError::Xlsx(e.to_string()))?;
    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| IoError::Xlsx("workbook has no sheets".into()))?;
    let range = workbook
        .worksheet_range(&sheet)
        .ok_or_else(|| IoError::Xlsx(format!("sheet '{sheet}' unavailable")))?
        .map_err(|e| IoError::Xlsx(e.to_string()))?;

    let mut iter = range.rows();
    let header: Vec<String> = iter
        .next()
        .ok_or_else(|| IoError::Xlsx(format!("sheet '{sheet}' is empty")))?
        .iter()
        .map(cell_to_string)
        .collect();
    let rows = iter
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect();
    Ok(RawTable { header, rows })
}

/* ---------------- Share-row parsing (format-agnostic) ---------------- */

fn parse_share_rows(
    table: RawTable,
    id_column: &str,
) -> IoResult<(Vec<(String, ShareMap)>, Vec<ImportWarning>)> {
    let Some(first_header) = table.header.first() else {
        return Err(IoError::Table { location: "header".into(), msg: "empty table".into() });
    };
    if first_header != id_column {
        return Err(IoError::Table {
            location: "header".into(),
            msg: format!("first column must be '{id_column}', found '{first_header}'"),
        });
    }

    let parties: Vec<PartyId> = table.header[1..]
        .iter()
        .map(|name| {
            name.parse::<PartyId>().map_err(|_| IoError::Table {
                location: "header".into(),
                msg: format!("invalid party name '{name}'"),
            })
        })
        .collect::<IoResult<_>>()?;
    if parties.is_empty() {
        return Err(IoError::Table {
            location: "header".into(),
            msg: "no party columns".into(),
        });
    }

    let mut rows = Vec::with_capacity(table.rows.len());
    let mut warnings = Vec::new();

    for (i, cells) in table.rows.iter().enumerate() {
        let row_no = i + 2; // 1-based, after the header
        let Some(key) = cells.first().filter(|k| !k.is_empty()) else {
            return Err(IoError::Table {
                location: format!("row {row_no}"),
                msg: format!("missing {id_column} value"),
            });
        };

        let mut shares = ShareMap::new();
        for (j, party) in parties.iter().enumerate() {
            let raw = cells.get(j + 1).map(String::as_str).unwrap_or("");
            // An empty cell is an explicit 0 (the party skipped that survey).
            let value = if raw.is_empty() {
                0.0
            } else {
                raw.parse::<f64>().map_err(|_| IoError::Table {
                    location: format!("row {row_no}, column '{party}'"),
                    msg: format!("'{raw}' is not a number"),
                })?
            };
            if !value.is_finite() || value < 0.0 {
                return Err(IoError::Table {
                    location: format!("row {row_no}, column '{party}'"),
                    msg: format!("percentage out of range: {value}"),
                });
            }
            shares.insert(party.clone(), value);
        }

        let total: f64 = shares.values().sum();
        if (total - 100.0).abs() > SUM_TOLERANCE {
            warnings.push(ImportWarning { row: key.clone(), total });
        }
        rows.push((key.clone(), shares));
    }

    Ok((rows, warnings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(name: &str, contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        (dir, path)
    }

    fn party(s: &str) -> PartyId {
        s.parse().unwrap()
    }

    #[test]
    fn historical_csv_round_trip() {
        let (_dir, path) = write_temp(
            "hist.csv",
            "Año,MAS,CC,Creemos\n2019,47.1,36.5,16.4\n2020,55.1,28.8,16.1\n",
        );
        let imported = read_historical(&path).unwrap();
        assert!(imported.warnings.is_empty());
        assert_eq!(imported.data.len(), 2);
        assert!((imported.data[&2020][&party("MAS")] - 55.1).abs() < 1e-12);
    }

    #[test]
    fn off_sum_rows_warn_but_load() {
        let (_dir, path) = write_temp("hist.csv", "Año,MAS,CC\n2020,55.0,30.0\n");
        let imported = read_historical(&path).unwrap();
        assert_eq!(imported.data.len(), 1);
        assert_eq!(imported.warnings.len(), 1);
        assert_eq!(imported.warnings[0].row, "2020");
        assert!((imported.warnings[0].total - 85.0).abs() < 1e-12);
    }

    #[test]
    fn fractional_year_keys_accepted_when_whole() {
        let (_dir, path) = write_temp("hist.csv", "Año,MAS,CC\n2020.0,60.0,40.0\n");
        let imported = read_historical(&path).unwrap();
        assert!(imported.data.contains_key(&2020));
    }

    #[test]
    fn polls_csv_with_empty_cells() {
        let (_dir, path) = write_temp(
            "polls.csv",
            "Encuesta,MAS,CC,Nuevo\nEncuesta1,48.0,32.0,20.0\nEncuesta2,45.0,55.0,\n",
        );
        let imported = read_polls(&path).unwrap();
        assert!((imported.data["Encuesta2"][&party("Nuevo")]).abs() < 1e-12);
        assert!(imported.warnings.is_empty());
    }

    #[test]
    fn wrong_id_column_rejected() {
        let (_dir, path) = write_temp("polls.csv", "Poll,MAS\nP1,100.0\n");
        let err = read_polls(&path).unwrap_err();
        assert!(matches!(err, IoError::Table { .. }), "{err}");
    }

    #[test]
    fn duplicate_keys_rejected() {
        let (_dir, path) = write_temp("hist.csv", "Año,MAS\n2020,100.0\n2020,100.0\n");
        assert!(matches!(read_historical(&path).unwrap_err(), IoError::Table { .. }));
    }

    #[test]
    fn non_numeric_cells_rejected() {
        let (_dir, path) = write_temp("hist.csv", "Año,MAS\n2020,n/a\n");
        let err = read_historical(&path).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("not a number"), "{msg}");
    }

    #[test]
    fn negative_percentages_rejected() {
        let (_dir, path) = write_temp("hist.csv", "Año,MAS,CC\n2020,105.0,-5.0\n");
        assert!(matches!(read_historical(&path).unwrap_err(), IoError::Table { .. }));
    }

    #[test]
    fn unsupported_extension_rejected() {
        let (_dir, path) = write_temp("hist.txt", "Año,MAS\n2020,100.0\n");
        assert!(matches!(read_historical(&path).unwrap_err(), IoError::Path(_)));
    }
}
