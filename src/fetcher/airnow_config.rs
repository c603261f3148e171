//! AirNow request settings
//!
//! Everything that distinguishes one AirNow backfill from another (bounding
//! box, pollutants, data type, endpoint) lives here as configuration rather
//! than as separate code paths.

use super::FetchError;
use crate::TimeWindow;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Observation data endpoint; supports bounding-box queries over many stations.
pub const AIRNOW_DATA_URL: &str = "https://www.airnowapi.org/aq/data/";

/// Wider Bay Area: San Francisco, Oakland, Berkeley and the South Bay.
pub const BAY_AREA_BBOX: &str = "-122.75,37.3,-121.75,38.0";

/// Geographic filter in `minLon,minLat,maxLon,maxLat` order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BoundingBox {
    min_lon: f64,
    min_lat: f64,
    max_lon: f64,
    max_lat: f64,
}

impl BoundingBox {
    /// Build a bounding box, validating ranges and ordering.
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Result<Self, FetchError> {
        for lon in [min_lon, max_lon] {
            if !(-180.0..=180.0).contains(&lon) {
                return Err(FetchError::InvalidSetting(format!(
                    "longitude {lon} outside [-180, 180]"
                )));
            }
        }
        for lat in [min_lat, max_lat] {
            if !(-90.0..=90.0).contains(&lat) {
                return Err(FetchError::InvalidSetting(format!(
                    "latitude {lat} outside [-90, 90]"
                )));
            }
        }
        if min_lon >= max_lon || min_lat >= max_lat {
            return Err(FetchError::InvalidSetting(format!(
                "bounding box minimums must be below maximums: {min_lon},{min_lat},{max_lon},{max_lat}"
            )));
        }
        Ok(Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        })
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self {
            min_lon: -122.75,
            min_lat: 37.3,
            max_lon: -121.75,
            max_lat: 38.0,
        }
    }
}

impl FromStr for BoundingBox {
    type Err = FetchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s
            .split(',')
            .map(|p| {
                p.trim().parse::<f64>().map_err(|e| {
                    FetchError::InvalidSetting(format!("bounding box component '{p}': {e}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        match parts.as_slice() {
            [min_lon, min_lat, max_lon, max_lat] => {
                Self::new(*min_lon, *min_lat, *max_lon, *max_lat)
            }
            _ => Err(FetchError::InvalidSetting(format!(
                "bounding box needs 4 comma-separated values, got {}",
                parts.len()
            ))),
        }
    }
}

impl TryFrom<String> for BoundingBox {
    type Error = FetchError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BoundingBox> for String {
    fn from(value: BoundingBox) -> Self {
        value.to_string()
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?},{:?},{:?},{:?}",
            self.min_lon, self.min_lat, self.max_lon, self.max_lat
        )
    }
}

/// Pollutant measured by AirNow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Parameter {
    /// Ground-level ozone
    Ozone,
    /// Fine particulate matter (2.5 µm)
    Pm25,
    /// Coarse particulate matter (10 µm)
    Pm10,
    /// Carbon monoxide
    Co,
    /// Nitrogen dioxide
    No2,
    /// Sulfur dioxide
    So2,
}

impl Parameter {
    /// Query-string spelling used by the API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ozone => "OZONE",
            Self::Pm25 => "PM25",
            Self::Pm10 => "PM10",
            Self::Co => "CO",
            Self::No2 => "NO2",
            Self::So2 => "SO2",
        }
    }

    /// Join parameters the way the API expects (`OZONE,PM25`).
    pub fn join(parameters: &[Parameter]) -> String {
        parameters
            .iter()
            .map(Parameter::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl FromStr for Parameter {
    type Err = FetchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().replace('.', "").as_str() {
            "OZONE" | "O3" => Ok(Self::Ozone),
            "PM25" => Ok(Self::Pm25),
            "PM10" => Ok(Self::Pm10),
            "CO" => Ok(Self::Co),
            "NO2" => Ok(Self::No2),
            "SO2" => Ok(Self::So2),
            _ => Err(FetchError::InvalidSetting(format!(
                "unknown parameter '{s}'. Valid options: OZONE, PM25, PM10, CO, NO2, SO2"
            ))),
        }
    }
}

impl TryFrom<String> for Parameter {
    type Error = FetchError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Parameter> for String {
    fn from(value: Parameter) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which values the API returns per observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DataType {
    /// AQI only
    #[serde(rename = "A")]
    Aqi,
    /// Raw concentration only
    #[serde(rename = "C")]
    Concentration,
    /// Both AQI and concentration
    #[default]
    #[serde(rename = "B")]
    Both,
}

impl DataType {
    /// Query-string spelling used by the API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Aqi => "A",
            Self::Concentration => "C",
            Self::Both => "B",
        }
    }
}

impl FromStr for DataType {
    type Err = FetchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "A" | "AQI" => Ok(Self::Aqi),
            "C" | "CONCENTRATION" => Ok(Self::Concentration),
            "B" | "BOTH" => Ok(Self::Both),
            _ => Err(FetchError::InvalidSetting(format!(
                "unknown data type '{s}'. Valid options: A, C, B"
            ))),
        }
    }
}

/// API credential. Never printed in full.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct ApiKey(String);

impl ApiKey {
    /// The raw key, for the request query string only.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// First 8 characters, for diagnostics.
    pub fn preview(&self) -> String {
        self.0.chars().take(8).collect()
    }
}

impl FromStr for ApiKey {
    type Err = FetchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(FetchError::MissingCredential(
                "API key is empty; set AIRNOW_API_KEY or pass --api-key".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }
}

impl TryFrom<String> for ApiKey {
    type Error = FetchError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiKey({}…)", self.preview())
    }
}

/// Per-window request parameters for the AirNow data endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirNowSettings {
    /// Endpoint URL
    pub base_url: String,
    /// Geographic filter
    pub bbox: BoundingBox,
    /// Requested pollutants
    pub parameters: Vec<Parameter>,
    /// AQI, concentration or both
    pub data_type: DataType,
}

impl Default for AirNowSettings {
    fn default() -> Self {
        Self {
            base_url: AIRNOW_DATA_URL.to_string(),
            bbox: BoundingBox::default(),
            parameters: vec![Parameter::Ozone, Parameter::Pm25],
            data_type: DataType::Both,
        }
    }
}

impl AirNowSettings {
    /// Reject settings that can never produce a valid request.
    pub fn validate(&self) -> Result<(), FetchError> {
        if self.parameters.is_empty() {
            return Err(FetchError::InvalidSetting(
                "at least one parameter is required".to_string(),
            ));
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(FetchError::InvalidSetting(format!(
                "base URL must be http(s): {}",
                self.base_url
            )));
        }
        Ok(())
    }

    /// Query parameters for one window.
    pub fn query(&self, window: &TimeWindow, api_key: &ApiKey) -> Vec<(&'static str, String)> {
        vec![
            ("startDate", window.start_param()),
            ("endDate", window.end_param()),
            ("parameters", Parameter::join(&self.parameters)),
            ("BBOX", self.bbox.to_string()),
            ("dataType", self.data_type.as_str().to_string()),
            ("format", "application/json".to_string()),
            ("API_KEY", api_key.expose().to_string()),
        ]
    }
}
