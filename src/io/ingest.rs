//! Observation table ingest.
//!
//! Input is a headerless table with at least three numeric columns:
//! time, magnitude (or flux), orbital phase. Columns may be separated by
//! whitespace or commas. Extra columns are ignored.
//!
//! Design goals:
//! - **Strict rows**: any malformed row aborts the load with its line number
//! - **Deterministic behavior**: no guessing beyond the delimiter
//! - **Separation of concerns**: no segmentation or fitting logic here

use std::fs;
use std::io::Write;
use std::path::Path;

use csv::StringRecord;

use crate::domain::ObservationTable;
use crate::error::AppError;

/// Columns read from each row.
const REQUIRED_COLUMNS: usize = 3;

/// Load and validate an observation file.
pub fn load_observations(path: &Path) -> Result<ObservationTable, AppError> {
    let text = fs::read_to_string(path)
        .map_err(|e| AppError::input(format!("Failed to read '{}': {e}", path.display())))?;
    let source = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    parse_observations(&source, &text)
}

/// Parse table text; `source` only labels errors and the resulting table.
pub fn parse_observations(source: &str, text: &str) -> Result<ObservationTable, AppError> {
    let comma_delimited = data_lines(text).any(|(_, line)| line.contains(','));
    let rows = if comma_delimited {
        parse_comma_rows(text)?
    } else {
        parse_whitespace_rows(text)?
    };

    if rows.is_empty() {
        return Err(AppError::input(format!("No data rows found in '{source}'.")));
    }

    let mut time = Vec::with_capacity(rows.len());
    let mut magnitude = Vec::with_capacity(rows.len());
    let mut phase = Vec::with_capacity(rows.len());
    for [t, m, p] in rows {
        time.push(t);
        magnitude.push(m);
        phase.push(p);
    }
    ObservationTable::new(source, time, magnitude, phase)
}

/// Write a table as whitespace-separated columns (the format `load_observations` reads).
pub fn write_observations(path: &Path, table: &ObservationTable) -> Result<(), AppError> {
    let mut out = String::with_capacity(table.len() * 40);
    for i in 0..table.len() {
        out.push_str(&format!(
            "{:.6} {:.6} {:.6}\n",
            table.time[i], table.magnitude[i], table.phase[i]
        ));
    }
    let mut file = fs::File::create(path)
        .map_err(|e| AppError::input(format!("Failed to create '{}': {e}", path.display())))?;
    file.write_all(out.as_bytes())
        .map_err(|e| AppError::input(format!("Failed to write '{}': {e}", path.display())))
}

/// Non-blank, non-comment lines with their 1-based line numbers.
fn data_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
}

fn parse_whitespace_rows(text: &str) -> Result<Vec<[f64; REQUIRED_COLUMNS]>, AppError> {
    data_lines(text)
        .map(|(line, content)| {
            let fields: Vec<&str> = content.split_whitespace().collect();
            parse_fields(line, &fields)
        })
        .collect()
}

fn parse_comma_rows(text: &str) -> Result<Vec<[f64; REQUIRED_COLUMNS]>, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    let mut record = StringRecord::new();
    loop {
        let more = reader
            .read_record(&mut record)
            .map_err(|e| AppError::input(format!("CSV parse error: {e}")))?;
        if !more {
            break;
        }
        let line = record.position().map(|p| p.line() as usize).unwrap_or(0);
        if record.iter().all(|f| f.is_empty()) {
            continue;
        }
        let fields: Vec<&str> = record.iter().collect();
        rows.push(parse_fields(line, &fields)?);
    }
    Ok(rows)
}

fn parse_fields(line: usize, fields: &[&str]) -> Result<[f64; REQUIRED_COLUMNS], AppError> {
    if fields.len() < REQUIRED_COLUMNS {
        return Err(AppError::input(format!(
            "Line {line}: expected at least {REQUIRED_COLUMNS} columns (time, magnitude, phase), found {}",
            fields.len()
        )));
    }
    let mut out = [0.0; REQUIRED_COLUMNS];
    for (slot, raw) in out.iter_mut().zip(fields) {
        let value: f64 = raw
            .parse()
            .map_err(|_| AppError::input(format!("Line {line}: '{raw}' is not a number")))?;
        if !value.is_finite() {
            return Err(AppError::input(format!("Line {line}: non-finite value '{raw}'")));
        }
        *slot = value;
    }
    Ok(out)
}
