//! Validation subcommand

use super::CliError;
use crate::backfill::config::DEFAULT_CHECKPOINT_PATH;
use crate::resume::{CheckpointStore, JsonFileStore};
use crate::output::StationSummary;
use clap::Parser;
use std::path::PathBuf;

/// Check that a backfill checkpoint is readable
#[derive(Parser, Debug)]
pub struct ValidateCommand {
    /// Checkpoint file
    #[arg(long, default_value = DEFAULT_CHECKPOINT_PATH)]
    pub checkpoint: PathBuf,
}

impl ValidateCommand {
    /// Execute the validation command
    pub fn execute(&self) -> Result<(), CliError> {
        let store = JsonFileStore::new(&self.checkpoint);
        let Some(checkpoint) = store.load()? else {
            println!("No checkpoint found at {}", self.checkpoint.display());
            return Ok(());
        };

        let stations = StationSummary::from_records(&checkpoint.results);
        println!("Checkpoint: {}", self.checkpoint.display());
        match checkpoint.last_day {
            Some(day) => println!("  Last completed day: {day} (resumes at day {})", day + 1),
            None => println!("  Last completed day: none"),
        }
        println!("  Records: {}", checkpoint.record_count());
        println!("  Unique stations: {}", stations.len());
        Ok(())
    }
}
