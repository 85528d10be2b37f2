//! runlens - newman run analysis
//!
//! Runs a Postman collection (or reads an existing newman JSON export),
//! writes an aggregated report with failure clusters and budget breaches,
//! and exits with a code describing the worst gate that fired.

#![forbid(unsafe_code)]

mod commands;
mod demo;
mod settings;
mod source;
mod summary;

use anyhow::Result;
use clap::{Parser, Subcommand};
use runlens_common::config::DEFAULT_CONFIG_DIR;
use runlens_common::{LogConfig, init_logging};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "runlens")]
#[command(author, version, about = "Aggregate and gate newman test runs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a collection through newman and analyze the result
    ///
    /// Falls back to the previous newman export in the reports directory
    /// when newman is not installed.
    Run {
        /// Postman collection file
        #[arg(short, long, default_value = "postman_collection.json")]
        collection: PathBuf,

        /// Directory for newman artifacts and the report
        #[arg(short, long, default_value = "reports")]
        reports_dir: PathBuf,

        /// Directory holding newman-budgets.json and newman-config.json
        #[arg(long, default_value = DEFAULT_CONFIG_DIR)]
        config_dir: PathBuf,
    },

    /// Analyze an existing newman JSON export
    Analyze {
        /// newman JSON export (--reporter-json-export)
        #[arg(short, long)]
        input: PathBuf,

        /// Report output path
        #[arg(short, long, default_value = "reports/newman-summary.json")]
        output: PathBuf,

        /// Directory holding newman-budgets.json and newman-config.json
        #[arg(long, default_value = DEFAULT_CONFIG_DIR)]
        config_dir: PathBuf,
    },

    /// Print the failure concentration verdict of a written report
    Gate {
        /// Report to check
        #[arg(short, long, default_value = "reports/newman-summary.demo.json")]
        summary: PathBuf,
    },

    /// Write a demo report with synthetic failures
    Demo {
        /// Report output path
        #[arg(short, long, default_value = "reports/newman-summary.demo.json")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut log_config = LogConfig::from_env("info").with_stderr();
    if cli.verbose {
        log_config = log_config.with_level("debug");
    }
    let logging_guards = init_logging(&log_config)?;

    let outcome = match cli.command {
        Commands::Run {
            collection,
            reports_dir,
            config_dir,
        } => commands::run(&collection, &reports_dir, &config_dir)?,
        Commands::Analyze {
            input,
            output,
            config_dir,
        } => commands::analyze_export(&input, &output, &config_dir)?,
        Commands::Gate { summary } => return commands::gate(&summary),
        Commands::Demo { output } => {
            commands::demo(&output)?;
            return Ok(());
        }
    };

    if !outcome.is_success() {
        // Flush file logging before exiting.
        drop(logging_guards);
        std::process::exit(outcome.exit_code());
    }
    Ok(())
}
