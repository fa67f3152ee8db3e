//! Sightline: on-device sentiment analysis and cloud-backed landmark
//! recognition.
//!
//! The sentiment feature downloads a text-classification model once per
//! session and classifies free text locally:
//!
//! ```no_run
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! use sightline::{DownloadConditions, ModelManager, ModelSpec, SentimentSession};
//!
//! let manager = ModelManager::new_default()?;
//! let session = SentimentSession::new();
//! session
//!     .prepare(&manager, &ModelSpec::sentiment(), DownloadConditions::default())
//!     .await?;
//!
//! for category in session.classify("great service")? {
//!     println!("{}: {}", category.label, category.score);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! The landmark feature prepares a selected image and sends it to a hosted
//! vision function, surfacing the best match:
//!
//! ```no_run
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! use sightline::{HttpsCallable, LandmarkRecognizer};
//!
//! let function = HttpsCallable::new("https://example.com/annotateImage");
//! let recognizer = LandmarkRecognizer::new(function);
//! let image_bytes = std::fs::read("photo.jpg")?;
//! let landmark = recognizer.recognize(&image_bytes).await?;
//! print!("{}", landmark.render());
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod error;
pub mod landmark;
pub mod model_manager;
pub mod sentiment;

pub use error::AppError;
pub use landmark::{CallableFunction, HttpsCallable, Landmark, LandmarkError, LandmarkRecognizer};
pub use model_manager::{DownloadConditions, ModelError, ModelManager, ModelSpec};
pub use sentiment::{
    Category, NlClassifier, SentimentError, SentimentSession, SessionState, TextClassifier,
};

pub fn init_logger() {
    env_logger::init();
}
