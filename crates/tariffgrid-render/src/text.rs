//! Plain-text tables for terminal output.

use std::fmt::Write;

use tariffgrid_core::directions::DirectionGrid;
use tariffgrid_core::summary::summarize;
use tariffgrid_core::timegrid::hour_interval_label;
use tariffgrid_core::{Cell, PlanEditor, PlanSeries};
use tariffgrid_table::{MainRow, ProjectedRow};

/// Column-aligned text renderer
#[derive(Clone, Debug)]
pub struct TextRenderer {
    /// Spaces between columns
    pub gap: usize,
}

impl Default for TextRenderer {
    fn default() -> Self {
        Self { gap: 2 }
    }
}

impl TextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the column gap
    pub fn gap(mut self, gap: usize) -> Self {
        self.gap = gap;
        self
    }

    /// Align rows of already-formatted text
    pub fn render_grid(&self, rows: &[Vec<String>]) -> String {
        let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
        let mut widths = vec![0usize; columns];
        for row in rows {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }

        let mut out = String::new();
        for row in rows {
            let mut line = String::new();
            for (i, cell) in row.iter().enumerate() {
                if i > 0 {
                    line.push_str(&" ".repeat(self.gap));
                }
                line.push_str(cell);
                line.push_str(&" ".repeat(widths[i] - cell.chars().count()));
            }
            out.push_str(line.trim_end());
            out.push('\n');
        }
        out
    }

    /// Render cell rows; empty cells show the placeholder
    pub fn render_cells(&self, rows: &[Vec<Cell>]) -> String {
        let text: Vec<Vec<String>> = rows
            .iter()
            .map(|row| row.iter().map(ToString::to_string).collect())
            .collect();
        self.render_grid(&text)
    }

    /// Render a grouped table; rows covered by a date span leave the date blank
    pub fn render_grouped(&self, names: &[&str], rows: &[ProjectedRow], with_hour: bool) -> String {
        let mut header = vec!["Дата".to_string()];
        if with_hour {
            header.push("Час".to_string());
        }
        header.extend(names.iter().map(ToString::to_string));

        let mut grid = vec![header];
        for row in rows {
            let mut cells: Vec<String> = row
                .to_cells(with_hour)
                .iter()
                .map(ToString::to_string)
                .collect();
            if !row.shows_date() {
                cells[0].clear();
            }
            grid.push(cells);
        }
        self.render_grid(&grid)
    }

    /// Render the flat table with a leading label column
    pub fn render_main(&self, names: &[&str], rows: &[(String, MainRow)]) -> String {
        let mut header = vec![String::new()];
        header.extend(names.iter().map(ToString::to_string));
        let mut grid = vec![header];
        for (label, row) in rows {
            let mut cells = vec![label.clone()];
            cells.extend(row.cells.iter().map(ToString::to_string));
            grid.push(cells);
        }
        self.render_grid(&grid)
    }

    /// Hour plan with derived P2 and a sum/average footer
    pub fn render_plan(&self, plan: &PlanEditor, has_generation: bool) -> String {
        let series = PlanSeries::applicable(has_generation);
        let mut header = vec!["Time".to_string()];
        header.extend(series.iter().map(|s| s.column_name().to_string()));
        header.extend(["Coefficient", "Volume"].map(String::from));
        if has_generation {
            header.extend(["Coefficient_Gen", "Volume_Gen"].map(String::from));
        }
        if plan.show_messages() {
            header.push("Message".to_string());
        }

        let mut grid = vec![header];
        for record in plan.hours() {
            let mut row = vec![hour_interval_label(record.hour)];
            for s in &series {
                let value = match s {
                    PlanSeries::P2 => record.display_p2(),
                    PlanSeries::P2Gen => record.display_p2_gen(),
                    other => other.value(record),
                };
                row.push(format!("{value:.2}"));
            }
            row.push(record.coefficient.to_string());
            row.push(record.volume.to_string());
            if has_generation {
                row.push(record.coefficient_gen.to_string());
                row.push(record.volume_gen.to_string());
            }
            if plan.show_messages() {
                row.push(record.message.clone());
            }
            grid.push(row);
        }

        let summaries = summarize(plan.hours(), has_generation);
        let footer = |label: &str, pick: fn(&tariffgrid_core::ColumnSummary) -> f64| {
            let mut row = vec![label.to_string()];
            for s in &series {
                row.push(
                    summaries
                        .iter()
                        .find(|c| c.series == *s)
                        .map_or_else(String::new, |c| format!("{:.2}", pick(c))),
                );
            }
            row
        };
        grid.push(footer("Сумма", |c| c.sum));
        grid.push(footer("Среднее", |c| c.average));
        self.render_grid(&grid)
    }

    /// Month of tariff directions, one line per day
    pub fn render_directions(&self, grid: &DirectionGrid) -> String {
        let mut header = vec![String::new()];
        header.extend((1..=24).map(|h: u8| h.to_string()));
        let mut rows = vec![header];
        for day in &grid.days {
            let mut row = vec![day.label()];
            row.extend(day.hours.iter().map(|d| d.symbol().to_string()));
            rows.push(row);
        }
        self.render_grid(&rows)
    }
}

/// Lines of the month grid: `DD.MM.YYYY  weekday`
pub fn render_month(days: &[chrono::NaiveDate]) -> String {
    let mut out = String::new();
    for day in days {
        let _ = writeln!(out, "{}  {}", day.format("%d.%m.%Y"), day.format("%a"));
    }
    out
}
