//! Berkeley city tree inventory to tree observations
//!
//! Input is the raw inventory GeoJSON FeatureCollection (`SPECIES`,
//! `Common_Nam`, `DBH_IN`, `CONDITION`, `HEIGHT_FT`, `SPREAD_FT`, `LOCATION`,
//! `NOTE`). Planting sites are dropped; every other feature becomes one
//! baseline observation from the 2013 survey.

use super::{read_json, TransformError, TransformResult};
use crate::output::write_json_pretty;
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::Path;
use tracing::{info, warn};

const PLANTING_SITE: &str = "Planting Site";
const UNKNOWN: &str = "Unknown";
const SURVEY_DATE: &str = "2013-04-30";
const SURVEY_SOURCE: &str = "UCB Geodata Library (2013 Inventory)";
const TOP_SPECIES: usize = 10;

/// One surveyed tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeObservation {
    /// `[lng, lat]`
    pub location: [Value; 2],
    /// `SPECIES`, else `Common_Nam`, else `Unknown`
    pub species: String,
    /// Trunk diameter in inches, `0` when not recorded
    pub dbh: Value,
    /// `Poor`, `Fair`, `Good`, `Excellent`, `Unknown` or the raw label
    pub health_condition: String,
    /// Survey date
    pub observation_date: &'static str,
    /// Survey dataset
    pub source: &'static str,
    /// Always true for survey trees
    pub is_baseline: bool,
    /// `baseline-tree-N`, counted over kept trees from 1
    pub id: String,
    /// `HEIGHT_FT`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<Value>,
    /// `SPREAD_FT`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spread: Option<Value>,
    /// `LOCATION`, e.g. street or park
    #[serde(rename = "location_type", skip_serializing_if = "Option::is_none")]
    pub location_type: Option<Value>,
    /// `NOTE`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<Value>,
}

// Empty strings, zero, false and null all count as absent.
fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::Array(_) | Value::Object(_) => true,
    })
}

fn label(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// Leading integer of `input`, ignoring leading whitespace: "80", " 42 ft", "-3".
fn leading_integer(input: &str) -> Option<i64> {
    let trimmed = input.trim_start();
    let digits_from = usize::from(trimmed.starts_with(['+', '-']));
    let end = trimmed[digits_from..]
        .find(|c: char| !c.is_ascii_digit())
        .map_or(trimmed.len(), |i| i + digits_from);
    if end == digits_from {
        return None;
    }
    trimmed[..end].parse().ok()
}

/// Map a survey condition to a health class.
///
/// Conditions are 0-100 ratings: up to 25 is `Poor`, 50 `Fair`, 75 `Good`,
/// above that `Excellent`. `NA` and blanks are `Unknown`; other text is kept.
pub fn health_condition(condition: Option<&Value>) -> String {
    let Some(raw) = present(condition).map(label) else {
        return UNKNOWN.to_string();
    };
    if raw == "NA" {
        return UNKNOWN.to_string();
    }
    match leading_integer(&raw) {
        None => raw,
        Some(n) if n <= 25 => "Poor".to_string(),
        Some(n) if n <= 50 => "Fair".to_string(),
        Some(n) if n <= 75 => "Good".to_string(),
        Some(_) => "Excellent".to_string(),
    }
}

fn coordinates(feature: &Map<String, Value>) -> Option<[Value; 2]> {
    let coords = feature.get("geometry")?.get("coordinates")?.as_array()?;
    match coords.as_slice() {
        [lng, lat, ..] => Some([lng.clone(), lat.clone()]),
        _ => None,
    }
}

fn observation(id: usize, location: [Value; 2], props: &Map<String, Value>) -> TreeObservation {
    let species = present(props.get("SPECIES"))
        .or_else(|| present(props.get("Common_Nam")))
        .map_or_else(|| UNKNOWN.to_string(), label);

    TreeObservation {
        location,
        species,
        dbh: present(props.get("DBH_IN")).cloned().unwrap_or_else(|| Value::from(0)),
        health_condition: health_condition(props.get("CONDITION")),
        observation_date: SURVEY_DATE,
        source: SURVEY_SOURCE,
        is_baseline: true,
        id: format!("baseline-tree-{id}"),
        height: props.get("HEIGHT_FT").cloned(),
        spread: props.get("SPREAD_FT").cloned(),
        location_type: props.get("LOCATION").cloned(),
        notes: props.get("NOTE").cloned(),
    }
}

/// Convert the inventory FeatureCollection to observations.
///
/// Features without point coordinates are skipped with a warning.
pub fn process_inventory(input: &Value) -> TransformResult<Vec<TreeObservation>> {
    let features = input
        .get("features")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            TransformError::InvalidInput("tree inventory must be a FeatureCollection".to_string())
        })?;

    let empty = Map::new();
    let mut trees = Vec::new();
    for (index, feature) in features.iter().enumerate() {
        let Some(feature) = feature.as_object() else {
            warn!(index, "Skipping non-object feature");
            continue;
        };
        let props = feature
            .get("properties")
            .and_then(Value::as_object)
            .unwrap_or(&empty);
        if props.get("SPECIES").and_then(Value::as_str) == Some(PLANTING_SITE) {
            continue;
        }
        let Some(location) = coordinates(feature) else {
            warn!(index, "Skipping tree without point coordinates");
            continue;
        };
        trees.push(observation(trees.len() + 1, location, props));
    }

    Ok(trees)
}

/// Most common species, ties in first-seen order.
pub fn top_species(trees: &[TreeObservation], limit: usize) -> Vec<(&str, usize)> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for tree in trees {
        match counts.iter_mut().find(|(species, _)| *species == tree.species) {
            Some((_, count)) => *count += 1,
            None => counts.push((tree.species.as_str(), 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.truncate(limit);
    counts
}

/// Process the inventory at `input` and write observations to `output`.
pub fn run(input: &Path, output: &Path) -> TransformResult<usize> {
    let trees = process_inventory(&read_json(input)?)?;
    write_json_pretty(output, &trees)?;
    info!(trees = trees.len(), output = %output.display(), "Wrote tree observations");

    for (species, count) in top_species(&trees, TOP_SPECIES) {
        info!(species, count, "Top species");
    }
    Ok(trees.len())
}
