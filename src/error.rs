use crate::landmark::LandmarkError;
use crate::model_manager::ModelError;
use crate::sentiment::SentimentError;

/// The single error-reporting channel both features flow through. Every
/// user-visible failure is rendered from one of these.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Sentiment(#[from] SentimentError),
    #[error("{0}")]
    Landmark(#[from] LandmarkError),
    #[error("{0}")]
    Model(#[from] ModelError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unknown command: {0}")]
    UnknownCommand(String),
}
