//! On-device sentiment classification over a downloaded model.

mod classifier;
mod error;
pub mod runtime;
mod session;

pub use classifier::NlClassifier;
pub use error::SentimentError;
pub use session::{SentimentSession, SessionState};

use std::fmt;

/// A single ranked classification result.
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub label: String,
    pub score: f32,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.label, self.score)
    }
}

/// The text-classification engine seam: model file in, ranked labels out.
pub trait TextClassifier {
    /// Classifies `text` and returns categories ranked by descending score.
    fn classify(&self, text: &str) -> Result<Vec<Category>, SentimentError>;
}

/// Renders a classification transcript entry the way the sentiment screen
/// displays it: the input line followed by one indented line per category.
pub fn render_transcript_entry(input: &str, categories: &[Category]) -> String {
    let mut out = format!("Input: {}\nOutput:\n", input);
    for category in categories {
        out.push_str(&format!("    {}\n", category));
    }
    out.push_str("---------\n");
    out
}
