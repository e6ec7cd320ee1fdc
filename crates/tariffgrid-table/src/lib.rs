//! # tariffgrid-table
//!
//! Reshapes flat series readings into grouped report tables.
//!
//! This crate provides:
//! - Series aggregation keyed by date and hour ([`aggregate`])
//! - Grouped projection with date row-spans ([`project`])
//! - The flat per-row table with expandable list cells ([`project_main`])
//!
//! ## Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use tariffgrid_core::{GroupMode, NamedSeries, SeriesPoint};
//! use tariffgrid_table::{aggregate, project};
//!
//! let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let a = NamedSeries::new("A").point(SeriesPoint::scalar(day, 10.0));
//! let rows = project(&aggregate(&[a]), GroupMode::ByDate, &["A"]);
//! assert_eq!(rows.len(), 1);
//! ```

pub mod aggregate;
pub mod project;

pub use aggregate::{aggregate, AggregatedTable, DateEntry};
pub use project::{project, project_main, project_row, MainRow, ProjectedRow, SHOW_LIST};
