//! Station coverage summary
//!
//! AirNow records carry `Latitude` and `Longitude`; counting distinct pairs
//! shows how many monitoring stations a backfill actually covered.

use crate::Record;
use std::cmp::Ordering;
use std::fmt;

/// A station position as reported by the API.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StationCoord {
    /// Latitude in degrees
    pub lat: f64,
    /// Longitude in degrees
    pub lon: f64,
}

impl fmt::Display for StationCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Lat {}, Lon {}", self.lat, self.lon)
    }
}

/// Distinct station coordinates found in a set of records.
#[derive(Debug, Clone, Default)]
pub struct StationSummary {
    // sorted by latitude, then longitude, without duplicates
    stations: Vec<StationCoord>,
    without_position: usize,
}

impl StationCoord {
    fn total_cmp(&self, other: &Self) -> Ordering {
        self.lat
            .total_cmp(&other.lat)
            .then_with(|| self.lon.total_cmp(&other.lon))
    }
}

impl StationSummary {
    /// Collect station coordinates from `records`.
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a Record>) -> Self {
        let mut summary = Self::default();
        for record in records {
            summary.add(record);
        }
        summary
    }

    /// Add one record's position, if it has one.
    pub fn add(&mut self, record: &Record) {
        let lat = record.get("Latitude").and_then(serde_json::Value::as_f64);
        let lon = record.get("Longitude").and_then(serde_json::Value::as_f64);
        match (lat, lon) {
            (Some(lat), Some(lon)) => {
                let coord = StationCoord { lat, lon };
                if let Err(pos) = self.stations.binary_search_by(|s| s.total_cmp(&coord)) {
                    self.stations.insert(pos, coord);
                }
            }
            _ => self.without_position += 1,
        }
    }

    /// Number of distinct stations.
    pub fn len(&self) -> usize {
        self.stations.len()
    }

    /// Whether no station was found.
    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Records that had no usable `Latitude`/`Longitude`.
    pub fn without_position(&self) -> usize {
        self.without_position
    }

    /// Stations sorted by latitude, then longitude.
    pub fn stations(&self) -> &[StationCoord] {
        &self.stations
    }
}
