use crate::model_manager::ModelError;

/// Errors surfaced by the sentiment feature.
#[derive(Debug, thiserror::Error)]
pub enum SentimentError {
    /// Error while loading or using the tokenizer
    #[error("Tokenizer error: {0}")]
    Tokenizer(String),
    /// Error while loading or running the ONNX model
    #[error("Model error: {0}")]
    Model(String),
    /// Error during model download or verification
    #[error("Model download failed: {0}")]
    Download(#[from] ModelError),
    /// Error due to invalid input
    #[error("Validation error: {0}")]
    Validation(String),
    /// classify() was called before the session reached Ready
    #[error("Classifier is not ready: {0}")]
    NotReady(String),
}

impl From<ort::Error> for SentimentError {
    fn from(err: ort::Error) -> Self {
        SentimentError::Model(err.to_string())
    }
}
