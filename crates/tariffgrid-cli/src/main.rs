//! tariffgrid CLI - dispatch plan tables
//!
//! Command-line interface for report tables, hour plans and their
//! spreadsheet exports.

mod commands;
mod config;
mod source;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tariffgrid_core::{dates, SubjectId};

use crate::config::Config;

#[derive(Parser)]
#[command(name = "tariffgrid")]
#[command(author, version, about = "Dispatch plan tables and exports", long_about = None)]
struct Cli {
    /// Verbose output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Config file (default: ./tariffgrid.toml when present)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Override the config's data directory
    #[arg(long, value_name = "DIR", env = "TARIFFGRID_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Override the config's output directory
    #[arg(long, value_name = "DIR", global = true)]
    output_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the days of a month
    Month {
        year: i32,

        /// Month number; values outside 1..=12 roll into neighbouring years
        #[arg(allow_negative_numbers = true)]
        month: i32,
    },

    /// Project report tables from a JSON file
    Table {
        /// Table definition(s) as JSON
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Write one workbook per row into this directory instead of printing
        #[arg(long, value_name = "DIR")]
        xlsx: Option<PathBuf>,

        /// Show hourly lists instead of their collapsed label
        #[arg(long)]
        expand: bool,

        /// Hide rows of this subject (repeatable)
        #[arg(long, value_name = "SUBJECT")]
        hide: Vec<SubjectId>,
    },

    /// Work with a subject's day plan
    Plan {
        #[command(subcommand)]
        action: PlanCommand,
    },

    /// Export a subject's plan and every object's hours to one workbook
    FullExport {
        #[command(flatten)]
        target: PlanTarget,

        /// Output file (default: <output_dir>/full_export_<date>.xlsx)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print a month of tariff directions
    Directions {
        /// Direction records as JSON
        #[arg(value_name = "FILE")]
        file: PathBuf,

        #[arg(long)]
        year: i32,

        #[arg(long, allow_negative_numbers = true)]
        month: i32,
    },
}

#[derive(Subcommand)]
enum PlanCommand {
    /// Print the plan with derived P2 and column totals
    Show {
        #[command(flatten)]
        target: PlanTarget,
    },

    /// Write the coefficient/volume workbook
    Export {
        #[command(flatten)]
        target: PlanTarget,

        /// Export the generation columns
        #[arg(long)]
        gen: bool,

        /// Output file (default: <output_dir>/plan_<subject>_<date>.xlsx)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Import a coefficient/volume workbook and print the save payload
    Import {
        #[command(flatten)]
        target: PlanTarget,

        /// Workbook to import
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Ask for approval instead of a plain save
        #[arg(long)]
        approve: bool,
    },
}

#[derive(Args, Clone, Copy)]
struct PlanTarget {
    #[arg(long)]
    subject: SubjectId,

    /// Plan date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    date: NaiveDate,
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    dates::parse(raw).ok_or_else(|| format!("invalid date '{raw}', expected YYYY-MM-DD"))
}

fn default_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_level(cli.verbose))),
        )
        .init();

    let config = Config::load(cli.config.as_deref())?.with_overrides(cli.data_dir, cli.output_dir);

    match cli.command {
        Commands::Month { year, month } => commands::month(year, month),
        Commands::Table {
            file,
            xlsx,
            expand,
            hide,
        } => commands::table(&config, &file, xlsx.as_deref(), expand, &hide).await,
        Commands::Plan { action } => match action {
            PlanCommand::Show { target } => {
                commands::plan_show(&config, target.subject, target.date).await
            }
            PlanCommand::Export {
                target,
                gen,
                output,
            } => {
                commands::plan_export(&config, target.subject, target.date, gen, output).await
            }
            PlanCommand::Import {
                target,
                file,
                approve,
            } => {
                commands::plan_import(&config, target.subject, target.date, &file, approve).await
            }
        },
        Commands::FullExport { target, output } => {
            commands::full_export(&config, target.subject, target.date, output).await
        }
        Commands::Directions { file, year, month } => {
            commands::directions(&file, year, month).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn verbosity_levels() {
        assert_eq!(default_level(0), "warn");
        assert_eq!(default_level(2), "debug");
        assert_eq!(default_level(9), "trace");
    }

    #[test]
    fn dates_accept_iso_datetimes() {
        assert_eq!(
            parse_date("2024-03-05T10:00:00"),
            Ok(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap())
        );
        assert!(parse_date("05.03.2024").is_err());
    }

    #[test]
    fn plan_import_arguments() {
        let cli = Cli::try_parse_from([
            "tariffgrid",
            "plan",
            "import",
            "--subject",
            "4",
            "--date",
            "2024-01-15",
            "plan.xlsx",
            "--approve",
        ])
        .unwrap();
        match cli.command {
            Commands::Plan {
                action: PlanCommand::Import { target, approve, .. },
            } => {
                assert_eq!(target.subject, 4);
                assert!(approve);
            }
            _ => panic!("expected plan import"),
        }
    }

    #[test]
    fn month_accepts_negative_offsets() {
        let cli = Cli::try_parse_from(["tariffgrid", "month", "2024", "-1"]).unwrap();
        assert!(matches!(cli.command, Commands::Month { month: -1, .. }));
    }
}
