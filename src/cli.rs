//! Command line interface.

use clap::{Parser, Subcommand};

/// NYC yellow-taxi ETL and query API
#[derive(Clone, Debug, Parser)]
#[command(name = "taxi-etl", version)]
pub struct CommandLineArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Clone, Debug, Subcommand)]
pub enum Command {
    /// Download, clean and enrich one year of trips, then write the sinks
    Run {
        /// Calendar year to process; overrides TAXI_YEAR
        #[arg(long)]
        year: Option<i32>,
    },
    /// Serve the query API over the loaded trips table
    Serve,
}

/// Returns parsed command line arguments.
pub fn parse() -> CommandLineArgs {
    CommandLineArgs::parse()
}
