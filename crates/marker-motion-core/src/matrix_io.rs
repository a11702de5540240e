//! Comma-separated matrix files.
//!
//! One matrix row per line, entries separated by `,`. Empty lines are
//! skipped and the column count is taken from the first non-empty line.

use nalgebra::DMatrix;
use std::fs;
use std::path::{Path, PathBuf};

const SEPARATOR: char = ',';

/// Errors raised while reading or validating a tabular matrix.
#[derive(thiserror::Error, Debug)]
pub enum MatrixError {
    #[error("file {path} could not be opened")]
    Load {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{source_name}: invalid entry '{value}' at line {line}, column {column}")]
    Parse {
        source_name: String,
        line: usize,
        column: usize,
        value: String,
    },
    #[error("{source_name}: no matrix rows")]
    Empty { source_name: String },
    #[error("invalid matrix dimensions for {name} (is {rows}x{cols}, expected {expected})")]
    Dimension {
        name: String,
        rows: usize,
        cols: usize,
        expected: String,
    },
}

/// Read a matrix from a comma-separated file.
pub fn read_matrix(path: impl AsRef<Path>) -> Result<DMatrix<f64>, MatrixError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|source| MatrixError::Load {
        path: path.to_path_buf(),
        source,
    })?;
    parse_matrix(&raw, &path.display().to_string())
}

/// Parse matrix text. `source_name` only appears in error messages.
pub fn parse_matrix(text: &str, source_name: &str) -> Result<DMatrix<f64>, MatrixError> {
    let lines: Vec<(usize, &str)> = text
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim_end_matches('\r')))
        .filter(|(_, line)| !line.trim().is_empty())
        .collect();

    let Some(&(_, first)) = lines.first() else {
        return Err(MatrixError::Empty {
            source_name: source_name.to_string(),
        });
    };
    let cols = first
        .split(SEPARATOR)
        .filter(|entry| !entry.trim().is_empty())
        .count();
    if cols == 0 {
        return Err(MatrixError::Empty {
            source_name: source_name.to_string(),
        });
    }

    let mut data = Vec::with_capacity(lines.len() * cols);
    for &(line_no, line) in &lines {
        let mut entries = line.split(SEPARATOR);
        for col in 0..cols {
            let entry = entries.next().unwrap_or("").trim();
            let value = entry.parse::<f64>().map_err(|_| MatrixError::Parse {
                source_name: source_name.to_string(),
                line: line_no,
                column: col + 1,
                value: entry.to_string(),
            })?;
            data.push(value);
        }
    }

    Ok(DMatrix::from_row_slice(lines.len(), cols, &data))
}

/// Check a matrix shape. `None` accepts any count along that axis.
pub fn check_dimensions(
    mat: &DMatrix<f64>,
    rows: Option<usize>,
    cols: Option<usize>,
    name: &str,
) -> Result<(), MatrixError> {
    let rows_ok = rows.is_none_or(|r| mat.nrows() == r);
    let cols_ok = cols.is_none_or(|c| mat.ncols() == c);
    if rows_ok && cols_ok {
        return Ok(());
    }
    let fmt_axis = |axis: Option<usize>| axis.map_or_else(|| "N".to_string(), |n| n.to_string());
    Err(MatrixError::Dimension {
        name: name.to_string(),
        rows: mat.nrows(),
        cols: mat.ncols(),
        expected: format!("{}x{}", fmt_axis(rows), fmt_axis(cols)),
    })
}
