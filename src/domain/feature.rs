use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::Geometry;

/// GeoJSON feature collection as returned by a WFS GetFeature request with
/// `outputFormat=json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(default)]
    pub features: Vec<Feature>,
    #[serde(default, rename = "numberMatched")]
    pub number_matched: Option<u64>,
    #[serde(default, rename = "numberReturned")]
    pub number_returned: Option<u64>,
}

/// A single feature: property bag plus optional geometry and bounding box.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feature {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub properties: Map<String, Value>,
    #[serde(default)]
    pub geometry: Option<Geometry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<Vec<f64>>,
}

impl FeatureCollection {
    /// Flatten features into per-feature property maps.
    ///
    /// Server-supplied `bbox` properties are filtered out unless requested;
    /// `with_geometry` re-attaches each feature's geometry under the
    /// `geometry` key.
    #[allow(dead_code)]
    pub fn properties_array(&self, with_geometry: bool, with_bbox: bool) -> Vec<Map<String, Value>> {
        self.features
            .iter()
            .map(|feature| {
                let mut props: Map<String, Value> = feature
                    .properties
                    .iter()
                    .filter(|(key, _)| with_bbox || key.as_str() != "bbox")
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect();

                if with_geometry
                    && let Some(ref geometry) = feature.geometry
                    && let Ok(value) = serde_json::to_value(geometry)
                {
                    props.insert("geometry".to_string(), value);
                }

                props
            })
            .collect()
    }
}
