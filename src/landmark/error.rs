/// Errors surfaced by the landmark recognition feature.
#[derive(Debug, thiserror::Error)]
pub enum LandmarkError {
    /// The selected image could not be decoded
    #[error("Image decode failed: {0}")]
    Decode(#[from] image::ImageError),
    /// The scaled image could not be re-encoded for transport
    #[error("Image encode failed: {0}")]
    Encode(String),
    /// The remote call failed (network, authorization, server)
    #[error("Remote call failed: {0}")]
    Call(String),
    /// The response was not valid JSON of the expected shape
    #[error("Malformed response: {0}")]
    Malformed(#[from] serde_json::Error),
    /// The response carried no landmark annotations
    #[error("No landmarks recognized in the image")]
    NoAnnotations,
    /// The top annotation carried no geographic location
    #[error("Top landmark has no associated location")]
    NoLocation,
    /// No image has been selected yet
    #[error("No image selected")]
    NoImage,
    /// A recognition request is already in flight
    #[error("A recognition request is already in progress")]
    Busy,
}

impl From<reqwest::Error> for LandmarkError {
    fn from(err: reqwest::Error) -> Self {
        LandmarkError::Call(err.to_string())
    }
}
