//! Building footprints GeoJSON trimmed for the locations layer.

use super::{read_json, FeatureCollection, TransformError, TransformResult};
use crate::output::write_json_pretty;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use tracing::info;

/// Feature properties that survive the transform.
pub const KEEP_PROPERTIES: [&str; 9] = [
    "name",
    "building",
    "operator:type",
    "building:levels",
    "building:material",
    "addr:housename",
    "wheelchair",
    "smoking",
    "leisure",
];

/// A feature with its geometry and allow-listed properties.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationFeature {
    #[serde(rename = "type")]
    kind: &'static str,
    /// Geometry, unchanged
    pub geometry: Value,
    /// Allow-listed properties
    pub properties: Map<String, Value>,
}

#[derive(Deserialize)]
struct SourceCollection {
    #[serde(default)]
    features: Vec<SourceFeature>,
}

#[derive(Deserialize)]
struct SourceFeature {
    #[serde(default)]
    geometry: Option<Value>,
    #[serde(default)]
    properties: Option<Map<String, Value>>,
}

/// Drop features without geometry and strip every other property.
pub fn filter_collection(input: Value) -> TransformResult<FeatureCollection<LocationFeature>> {
    let source: SourceCollection = serde_json::from_value(input)
        .map_err(|e| TransformError::InvalidInput(format!("not a FeatureCollection: {e}")))?;

    let features = source
        .features
        .into_iter()
        .filter_map(|feature| {
            let geometry = feature.geometry?;
            let properties = feature
                .properties
                .unwrap_or_default()
                .into_iter()
                .filter(|(key, _)| KEEP_PROPERTIES.contains(&key.as_str()))
                .collect();
            Some(LocationFeature {
                kind: "Feature",
                geometry,
                properties,
            })
        })
        .collect();

    Ok(FeatureCollection::new(features))
}

/// Filter the GeoJSON at `input` and write the result to `output`.
///
/// Returns the number of features written.
pub fn run(input: &Path, output: &Path) -> TransformResult<usize> {
    let collection = filter_collection(read_json(input)?)?;
    write_json_pretty(output, &collection)?;
    info!(features = collection.len(), output = %output.display(), "Wrote locations");
    Ok(collection.len())
}
