//! # tariffgrid-parser
//!
//! Input formats for tariffgrid.
//!
//! This crate provides:
//! - Coefficient/volume workbook import (`.xlsx`, via calamine)
//! - JSON decoders for hour records, report tables, the subject directory,
//!   tariff directions and plan statuses
//!
//! ## Example
//!
//! ```rust
//! use tariffgrid_parser::decode_hours;
//!
//! let hours = decode_hours(r#"[{"hour": 1, "P1": 100, "coefficient": 1.1, "volume": 5}]"#).unwrap();
//! assert_eq!(hours[0].calculate_p2(), 115.0);
//! ```

pub mod json;
pub mod xlsx;

use std::path::Path;

use thiserror::Error;

use tariffgrid_core::FormatError;

pub use json::{decode_directions, decode_directory, decode_hours, decode_statuses, decode_tables};
pub use xlsx::{import_plan, read_first_sheet};

/// Parsing error
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Invalid {what}: {source}")]
    Json {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Supported file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// Excel workbook (.xlsx, .xlsm)
    Spreadsheet,
    /// JSON payload
    Json,
}

/// Detect file format from extension
pub fn detect_format(path: &Path) -> FileFormat {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("xlsx" | "xlsm") => FileFormat::Spreadsheet,
        _ => FileFormat::Json,
    }
}

/// Read a workbook from disk
pub fn read_workbook(path: &Path) -> Result<Vec<Vec<tariffgrid_core::Cell>>, ParseError> {
    let bytes = std::fs::read(path)?;
    Ok(read_first_sheet(&bytes)?)
}
