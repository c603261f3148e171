//! CLI command implementations

use clap::{Parser, Subcommand};
use std::net::SocketAddr;

pub mod backfill;
pub mod error;
pub mod transform;
pub mod validate;

pub use backfill::BackfillArgs;
pub use error::CliError;
pub use transform::{LocationsArgs, NoaaArgs, ReadingsArgs, TreesArgs};
pub use validate::ValidateCommand;

/// Air quality data tooling
#[derive(Parser, Debug)]
#[command(name = "airquality-data", version, about)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Serve Prometheus metrics on this address (e.g. 127.0.0.1:9000)
    #[arg(long, global = true)]
    pub metrics_addr: Option<SocketAddr>,
}

/// CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch historical AirNow observations day by day, resumably
    Backfill(BackfillArgs),

    /// Combine sensor reading CSVs into one JSON array
    Readings(ReadingsArgs),

    /// Trim building footprints GeoJSON for the locations layer
    Locations(LocationsArgs),

    /// Convert a NOAA station CSV to JSON
    Noaa(NoaaArgs),

    /// Convert the Berkeley tree inventory to tree observations
    Trees(TreesArgs),

    /// Inspect a backfill checkpoint
    Validate(ValidateCommand),
}
