//! Checkpoint contents for resumable backfills
//!
//! On disk a checkpoint is `{"results": [...], "last_day": <index>}`. The
//! same file format is read back on the next run, so `last_day` is an
//! integer where a negative value (or its absence) means no day completed.

use crate::Record;
use serde::{Deserialize, Serialize};

/// Partial progress of a backfill run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Records accumulated so far, in window order.
    #[serde(default)]
    pub results: Vec<Record>,
    /// Index of the last window completed successfully.
    #[serde(default, with = "last_day_index")]
    pub last_day: Option<u32>,
}

impl Checkpoint {
    /// Empty progress: nothing fetched yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the window at `index` is already covered.
    pub fn covers(&self, index: u32) -> bool {
        self.last_day.is_some_and(|last| index <= last)
    }

    /// Append a completed window's records and advance the resume point.
    pub fn record_window(&mut self, index: u32, records: Vec<Record>) {
        self.results.extend(records);
        self.last_day = Some(index);
    }

    /// Number of accumulated records.
    pub fn record_count(&self) -> usize {
        self.results.len()
    }
}

mod last_day_index {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<u32>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(index) => serializer.serialize_i64(i64::from(*index)),
            None => serializer.serialize_i64(-1),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
        let raw = Option::<i64>::deserialize(deserializer)?;
        Ok(raw.and_then(|index| u32::try_from(index).ok()))
    }
}
