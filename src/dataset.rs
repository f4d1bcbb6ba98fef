//! Dataset Module
//!
//! In-memory table of service rows: loading and combining CSV files,
//! ordering by schedule and extracting numeric columns for analysis.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::dates::parse_date;
use crate::{RailcastError, Result};

/// Headed table of string cells; every row has one cell per header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Dataset {
    /// Build a dataset, padding or truncating rows to the header width.
    #[must_use]
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self { headers, rows }
    }

    /// Read a headed CSV file.
    #[tracing::instrument(level = "debug")]
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(RailcastError::validation(format!(
                "Input file not found: {}",
                path.display()
            )));
        }

        let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        debug!("Loaded {} rows from {}", rows.len(), path.display());
        Ok(Self::new(headers, rows))
    }

    /// Load and concatenate several files; directories contribute their `.csv` files.
    pub fn load_many(inputs: &[PathBuf]) -> Result<Self> {
        let files = expand_inputs(inputs)?;
        info!("Found {} files", files.len());
        if files.is_empty() {
            return Err(RailcastError::validation("No CSV files to merge"));
        }

        let datasets = files
            .iter()
            .map(|path| Self::load(path))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::concat(datasets))
    }

    /// Union of columns in first-seen order; absent cells are empty.
    #[must_use]
    pub fn concat(datasets: Vec<Dataset>) -> Self {
        let mut headers: Vec<String> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        for dataset in &datasets {
            for header in &dataset.headers {
                if !positions.contains_key(header) {
                    positions.insert(header.clone(), headers.len());
                    headers.push(header.clone());
                }
            }
        }

        let mut rows = Vec::new();
        for dataset in datasets {
            let mapping: Vec<usize> = dataset.headers.iter().map(|h| positions[h]).collect();
            for row in dataset.rows {
                let mut merged = vec![String::new(); headers.len()];
                for (cell, &target) in row.into_iter().zip(&mapping) {
                    merged[target] = cell;
                }
                rows.push(merged);
            }
        }

        Self { headers, rows }
    }

    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Normalise `run_date` to `YYYY-MM-DD` and order rows by
    /// (`run_date`, `gbtt_dep`, `gbtt_arr`).
    pub fn sort_by_schedule(&mut self) -> Result<()> {
        let date_col = self
            .column_index("run_date")
            .ok_or_else(|| RailcastError::validation("Dataset has no run_date column"))?;
        let dep_col = self.column_index("gbtt_dep");
        let arr_col = self.column_index("gbtt_arr");

        let mut keyed = Vec::with_capacity(self.rows.len());
        for (index, mut row) in std::mem::take(&mut self.rows).into_iter().enumerate() {
            let date = parse_date(&row[date_col]).map_err(|_| {
                RailcastError::validation(format!(
                    "Unparseable run_date '{}' in row {}",
                    row[date_col],
                    index + 1
                ))
            })?;
            row[date_col] = date.format("%Y-%m-%d").to_string();
            keyed.push((date, row));
        }

        keyed.sort_by(|(date_a, row_a), (date_b, row_b)| {
            date_a
                .cmp(date_b)
                .then_with(|| compare_times(dep_col.map(|c| row_a[c].as_str()), dep_col.map(|c| row_b[c].as_str())))
                .then_with(|| compare_times(arr_col.map(|c| row_a[c].as_str()), arr_col.map(|c| row_b[c].as_str())))
        });

        self.rows = keyed.into_iter().map(|(_, row)| row).collect();
        Ok(())
    }

    /// Columns whose non-empty cells all parse as numbers.
    #[must_use]
    pub fn numeric_columns(&self) -> Vec<String> {
        self.headers
            .iter()
            .enumerate()
            .filter(|(index, _)| {
                let mut seen = false;
                let all_numeric = self.rows.iter().all(|row| {
                    let cell = row[*index].trim();
                    if cell.is_empty() {
                        return true;
                    }
                    seen = true;
                    cell.parse::<f64>().is_ok_and(f64::is_finite)
                });
                seen && all_numeric
            })
            .map(|(_, header)| header.clone())
            .collect()
    }

    /// Finite values of `column`, skipping empty, `NaN` and infinite cells.
    pub fn numeric_values(&self, column: &str) -> Result<Vec<f64>> {
        let index = self.require_column(column)?;
        let mut values = Vec::with_capacity(self.rows.len());
        for (row_number, row) in self.rows.iter().enumerate() {
            let cell = row[index].trim();
            if cell.is_empty() {
                continue;
            }
            let value = cell.parse::<f64>().map_err(|_| {
                RailcastError::validation(format!(
                    "Column {column} is not numeric: '{cell}' in row {}",
                    row_number + 1
                ))
            })?;
            if value.is_finite() {
                values.push(value);
            }
        }
        Ok(values)
    }

    pub(crate) fn require_column(&self, column: &str) -> Result<usize> {
        self.column_index(column)
            .ok_or_else(|| RailcastError::validation(format!("Unknown column: {column}")))
    }

    /// Keep only the rows matching `keep`.
    #[must_use]
    pub fn filter_rows(&self, mut keep: impl FnMut(&[String]) -> bool) -> Self {
        Self {
            headers: self.headers.clone(),
            rows: self.rows.iter().filter(|row| keep(row)).cloned().collect(),
        }
    }

    /// Write header and rows as CSV.
    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut writer = csv::Writer::from_path(path)?;
        self.write_to(&mut writer)?;
        info!("Wrote {} rows to {}", self.rows.len(), path.display());
        Ok(())
    }

    pub fn write_to<W: std::io::Write>(&self, writer: &mut csv::Writer<W>) -> Result<()> {
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Times compare numerically (`0712` == `712`); empty or unparseable sort last.
fn compare_times(a: Option<&str>, b: Option<&str>) -> Ordering {
    let parse = |value: Option<&str>| value.and_then(|v| v.trim().parse::<f64>().ok());
    match (parse(a), parse(b)) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn expand_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut found: Vec<PathBuf> = fs::read_dir(input)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|path| {
                    path.is_file()
                        && path
                            .extension()
                            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
                })
                .collect();
            found.sort();
            files.extend(found);
        } else {
            files.push(input.clone());
        }
    }
    Ok(files)
}
