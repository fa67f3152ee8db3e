use serde::Serialize;

/// Number of candidate annotations requested from the vision service. Only
/// the top one is surfaced, but the request always asks for up to 5.
pub const MAX_RESULTS: u32 = 5;

/// The single detection type this feature uses.
pub const DETECTION_TYPE: &str = "LANDMARK_DETECTION";

/// The vision request document: base64 image content plus one fixed feature
/// descriptor.
#[derive(Debug, Clone, Serialize)]
pub struct AnnotateRequest {
    pub image: ImageContent,
    pub features: Vec<Feature>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageContent {
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Feature {
    pub max_results: u32,
    #[serde(rename = "type")]
    pub feature_type: String,
}

impl AnnotateRequest {
    /// Builds the request for one base64-encoded image.
    pub fn new(base64_content: String) -> Self {
        Self {
            image: ImageContent {
                content: base64_content,
            },
            features: vec![Feature {
                max_results: MAX_RESULTS,
                feature_type: DETECTION_TYPE.to_string(),
            }],
        }
    }
}
