//! Local dataset transform commands

use crate::transform::{locations, noaa, readings, trees};
use clap::Parser;
use std::path::PathBuf;

use super::CliError;

/// Combine sensor reading CSVs into one JSON array
#[derive(Parser, Debug)]
pub struct ReadingsArgs {
    /// Directory of CSV exports
    #[arg(long, default_value = "data/unprocessed_csv")]
    pub input_dir: PathBuf,

    /// Output JSON file
    #[arg(long, default_value = "data/processed/berkeley_air_quality_all_readings.json")]
    pub output: PathBuf,
}

impl ReadingsArgs {
    /// Execute the transform.
    pub fn execute(&self) -> Result<usize, CliError> {
        let count = readings::run(&self.input_dir, &self.output)?;
        println!("Total readings combined: {count}");
        println!("Wrote {}", self.output.display());
        Ok(count)
    }
}

/// Trim building footprints to the properties the map shows
#[derive(Parser, Debug)]
pub struct LocationsArgs {
    /// Source GeoJSON FeatureCollection
    #[arg(long, default_value = "data/openmap/berkeley-bldgs.geojson")]
    pub input: PathBuf,

    /// Output GeoJSON file
    #[arg(long, default_value = "public/data/locations.geojson")]
    pub output: PathBuf,
}

impl LocationsArgs {
    /// Execute the transform.
    pub fn execute(&self) -> Result<usize, CliError> {
        let count = locations::run(&self.input, &self.output)?;
        println!("Wrote {count} features to {}", self.output.display());
        Ok(count)
    }
}

/// Convert a NOAA station CSV to JSON
#[derive(Parser, Debug)]
pub struct NoaaArgs {
    /// NOAA CSV file
    #[arg(long, default_value = "data/noaa/01001099999.csv")]
    pub input: PathBuf,

    /// Output JSON file
    #[arg(long, default_value = "data/noaa/processed-data.json")]
    pub output: PathBuf,
}

impl NoaaArgs {
    /// Execute the transform.
    pub fn execute(&self) -> Result<usize, CliError> {
        let count = noaa::run(&self.input, &self.output)?;
        println!("Successfully processed {count} records");
        println!("Output saved to {}", self.output.display());
        Ok(count)
    }
}

/// Convert the Berkeley tree inventory to tree observations
#[derive(Parser, Debug)]
pub struct TreesArgs {
    /// Tree inventory GeoJSON FeatureCollection
    #[arg(long, default_value = "data/berkeley-tree-inventory/berkeley-s7gq2s-geojson.json")]
    pub input: PathBuf,

    /// Output JSON file
    #[arg(long, default_value = "data/processed/berkeley_trees_processed.json")]
    pub output: PathBuf,
}

impl TreesArgs {
    /// Execute the transform.
    pub fn execute(&self) -> Result<usize, CliError> {
        let count = trees::run(&self.input, &self.output)?;
        println!("Successfully processed {count} trees");
        println!("Saved to: {}", self.output.display());
        Ok(count)
    }
}
