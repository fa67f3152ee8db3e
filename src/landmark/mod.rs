//! Landmark recognition over a cloud-hosted vision function.

mod error;
pub mod functions;
pub mod prepare;
pub mod request;
pub mod response;
mod recognizer;

pub use error::LandmarkError;
pub use functions::{CallableFunction, HttpsCallable};
pub use recognizer::LandmarkRecognizer;
pub use response::Landmark;
