use serde::Deserialize;

use super::error::LandmarkError;

/// One element of the vision service's top-level response array.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotateResponse {
    #[serde(default)]
    pub landmark_annotations: Vec<Annotation>,
}

/// A single candidate recognition result. `boundingPoly` is present on the
/// wire but intentionally not modeled; nothing consumes it.
#[derive(Debug, Clone, Deserialize)]
pub struct Annotation {
    pub description: String,
    pub mid: String,
    pub score: f32,
    #[serde(default)]
    pub locations: Vec<Location>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub lat_lng: LatLng,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

/// The surfaced result: the top-ranked annotation and its first location.
#[derive(Debug, Clone, PartialEq)]
pub struct Landmark {
    pub description: String,
    pub entity_id: String,
    pub score: f32,
    pub latitude: f64,
    pub longitude: f64,
}

impl Landmark {
    /// Renders the fixed multi-line result block shown to the user.
    pub fn render(&self) -> String {
        format!(
            "Prediction ---\n\
             Description: {}\n\
             Entity ID: {}\n\
             Prediction Score: {}\n\
             Latitude: {}\n\
             Longitude: {}\n\n",
            self.description, self.entity_id, self.score, self.latitude, self.longitude
        )
    }
}

/// Extracts the best match from a raw response document.
///
/// Only the first annotation and its first location are consumed; all other
/// candidates are deliberately dropped. Empty annotation or location lists
/// are explicit errors rather than index faults.
pub fn extract_top(response: &serde_json::Value) -> Result<Landmark, LandmarkError> {
    let responses: Vec<AnnotateResponse> = serde_json::from_value(response.clone())?;

    let annotation = responses
        .first()
        .and_then(|r| r.landmark_annotations.first())
        .ok_or(LandmarkError::NoAnnotations)?;

    let location = annotation.locations.first().ok_or(LandmarkError::NoLocation)?;

    Ok(Landmark {
        description: annotation.description.clone(),
        entity_id: annotation.mid.clone(),
        score: annotation.score,
        latitude: location.lat_lng.latitude,
        longitude: location.lat_lng.longitude,
    })
}
