//! CSV ingest.
//!
//! Turns a measurement CSV into validated domain types. Design goals:
//!
//! - **Strict schema** for required columns (clear errors, Io/Validation kinds)
//! - **Row-level errors** that name the offending line
//! - **Separation of concerns**: no fitting logic here
//!
//! Noise datasets: `power,sq_db,asq_db`. Gain datasets: `power,v,v0`.
//! Comment lines starting with `#` are skipped (the `sample` subcommand
//! writes its generation spec as such a header).

use std::fs::File;
use std::path::Path;

use crate::domain::{GainMeasurement, Measurement};
use crate::error::AppError;

/// Read a squeezing measurement CSV (`power,sq_db,asq_db`).
pub fn read_noise_csv(path: &Path) -> Result<Measurement, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::io(format!("Failed to open CSV '{}': {e}", path.display())))?;
    let cols = read_columns(file, &["power", "sq_db", "asq_db"])?;
    let [power, sq_db, asq_db] = cols
        .try_into()
        .expect("read_columns returns one vector per requested column");
    Measurement::new(power, sq_db, asq_db)
}

/// Read a parametric-gain CSV (`power,v,v0`).
pub fn read_gain_csv(path: &Path) -> Result<GainMeasurement, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::io(format!("Failed to open CSV '{}': {e}", path.display())))?;
    let cols = read_columns(file, &["power", "v", "v0"])?;
    let [power, v, v0] = cols
        .try_into()
        .expect("read_columns returns one vector per requested column");
    GainMeasurement::new(power, v, v0)
}

/// Read the named columns from a headered CSV, as parallel `f64` vectors.
fn read_columns<R: std::io::Read>(
    reader: R,
    names: &[&str],
) -> Result<Vec<Vec<f64>>, AppError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| AppError::io(format!("Failed to read CSV headers: {e}")))?
        .clone();

    let mut indices = Vec::with_capacity(names.len());
    for name in names {
        let idx = headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
            .ok_or_else(|| {
                AppError::validation(format!(
                    "CSV is missing required column '{name}' (found: {}).",
                    headers.iter().collect::<Vec<_>>().join(", ")
                ))
            })?;
        indices.push(idx);
    }

    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); names.len()];
    for (row_no, record) in csv_reader.records().enumerate() {
        let record =
            record.map_err(|e| AppError::io(format!("Failed to read CSV row {}: {e}", row_no + 2)))?;
        for (slot, (&idx, name)) in indices.iter().zip(names.iter()).enumerate() {
            let raw = record.get(idx).ok_or_else(|| {
                AppError::validation(format!(
                    "CSV row {} has no value for column '{name}'.",
                    row_no + 2
                ))
            })?;
            let value: f64 = raw.parse().map_err(|_| {
                AppError::validation(format!(
                    "CSV row {}: '{raw}' is not a number (column '{name}').",
                    row_no + 2
                ))
            })?;
            columns[slot].push(value);
        }
    }

    Ok(columns)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_noise_columns_by_header_name() {
        let csv = "sq_db,power,asq_db\n-1.5,6,4\n-2,10,6\n";
        let cols = read_columns(csv.as_bytes(), &["power", "sq_db", "asq_db"]).unwrap();
        assert_eq!(cols[0], vec![6.0, 10.0]);
        assert_eq!(cols[1], vec![-1.5, -2.0]);
        assert_eq!(cols[2], vec![4.0, 6.0]);
    }

    #[test]
    fn skips_comment_lines() {
        let csv = "# generated by sq sample\npower,sq_db,asq_db\n5,-1,2\n";
        let cols = read_columns(csv.as_bytes(), &["power", "sq_db", "asq_db"]).unwrap();
        assert_eq!(cols[0], vec![5.0]);
    }

    #[test]
    fn reports_missing_column() {
        let csv = "power,sq_db\n5,-1\n";
        let err = read_columns(csv.as_bytes(), &["power", "sq_db", "asq_db"]).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Validation);
        assert!(err.to_string().contains("asq_db"));
    }

    #[test]
    fn reports_non_numeric_cell_with_row_number() {
        let csv = "power,sq_db,asq_db\n5,-1,2\n6,abc,3\n";
        let err = read_columns(csv.as_bytes(), &["power", "sq_db", "asq_db"]).unwrap_err();
        assert!(err.to_string().contains("row 3"));
    }
}
