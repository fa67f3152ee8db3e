use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use log::{error, info};
use ndarray::Array2;
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;

use super::error::SentimentError;
use super::runtime::{create_session, RuntimeConfig};
use super::{Category, TextClassifier};

const DEFAULT_MAX_SEQUENCE_LENGTH: usize = 256;

/// A natural-language classifier over a downloaded ONNX model.
///
/// The model is expected to:
/// - Accept two inputs: input_ids and attention_mask (both shape [1, sequence_length])
/// - Output one logit per label (shape [1, num_labels]), in the label order
///   declared by the model's [`ModelSpec`](crate::model_manager::ModelSpec)
///
/// Thread safety follows from the fields: `Tokenizer` and `Session` are behind
/// `Arc`, everything else is owned.
#[derive(Debug)]
pub struct NlClassifier {
    pub model_path: String,
    tokenizer: Arc<Tokenizer>,
    session: Arc<Session>,
    labels: Vec<String>,
    max_sequence_length: usize,
}

const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<NlClassifier>();
    }
};

impl NlClassifier {
    /// Loads a classifier from local model and tokenizer files.
    ///
    /// Callers are expected to have run the files through
    /// [`ModelManager`](crate::model_manager::ModelManager) first so the
    /// hashes have been checked.
    pub fn from_files(
        model_path: &Path,
        tokenizer_path: &Path,
        labels: Vec<String>,
        config: &RuntimeConfig,
    ) -> Result<Self, SentimentError> {
        if labels.is_empty() {
            return Err(SentimentError::Validation(
                "Classifier needs at least one output label".into(),
            ));
        }
        if !model_path.exists() {
            return Err(SentimentError::Model(format!(
                "Model file not found: {}",
                model_path.display()
            )));
        }

        let tokenizer = Tokenizer::from_file(tokenizer_path).map_err(|e| {
            error!("Failed to load tokenizer: {}", e);
            SentimentError::Tokenizer(format!("Failed to load tokenizer: {}", e))
        })?;
        info!("Tokenizer loaded successfully");

        let session = create_session(model_path, config)?;
        info!("Model session created from {:?}", model_path);

        Ok(Self {
            model_path: model_path.to_string_lossy().to_string(),
            tokenizer: Arc::new(tokenizer),
            session: Arc::new(session),
            labels,
            max_sequence_length: DEFAULT_MAX_SEQUENCE_LENGTH,
        })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    fn tokenize(&self, text: &str) -> Result<Vec<u32>, SentimentError> {
        let encoding = self
            .tokenizer
            .encode(text, false)
            .map_err(|e| SentimentError::Tokenizer(e.to_string()))?;
        let token_ids = encoding.get_ids();

        if token_ids.len() > self.max_sequence_length {
            return Err(SentimentError::Validation(format!(
                "Input text too long: {} tokens (max: {})",
                token_ids.len(),
                self.max_sequence_length
            )));
        }

        Ok(token_ids.to_vec())
    }

    fn run_model(&self, tokens: &[u32]) -> Result<Vec<f32>, SentimentError> {
        let input_array = Array2::from_shape_vec(
            (1, tokens.len()),
            tokens.iter().map(|&x| x as i64).collect(),
        )
        .map_err(|e| SentimentError::Model(format!("Failed to create input array: {}", e)))?;
        let input_dyn = input_array.into_dyn();
        let input_ids = input_dyn.as_standard_layout();

        let mask_array = Array2::from_shape_vec(
            (1, tokens.len()),
            tokens
                .iter()
                .map(|&x| if x == 0 { 0i64 } else { 1i64 })
                .collect(),
        )
        .map_err(|e| SentimentError::Model(format!("Failed to create mask array: {}", e)))?;
        let mask_dyn = mask_array.into_dyn();
        let attention_mask = mask_dyn.as_standard_layout();

        let mut input_tensors = HashMap::new();
        input_tensors.insert(
            "input_ids",
            Tensor::from_array(&input_ids)
                .map_err(|e| SentimentError::Model(format!("Failed to create input tensor: {}", e)))?,
        );
        input_tensors.insert(
            "attention_mask",
            Tensor::from_array(&attention_mask)
                .map_err(|e| SentimentError::Model(format!("Failed to create mask tensor: {}", e)))?,
        );

        let outputs = self
            .session
            .run(input_tensors)
            .map_err(|e| SentimentError::Model(format!("Failed to run model: {}", e)))?;
        let output_tensor = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| SentimentError::Model(format!("Failed to extract output tensor: {}", e)))?;

        let logits: Vec<f32> = output_tensor
            .slice(ndarray::s![0, ..])
            .iter()
            .cloned()
            .collect();

        if logits.len() != self.labels.len() {
            return Err(SentimentError::Model(format!(
                "Model produced {} logits for {} labels",
                logits.len(),
                self.labels.len()
            )));
        }

        Ok(logits)
    }
}

impl TextClassifier for NlClassifier {
    fn classify(&self, text: &str) -> Result<Vec<Category>, SentimentError> {
        if text.is_empty() {
            return Err(SentimentError::Validation(
                "Input text cannot be empty".into(),
            ));
        }

        let tokens = self.tokenize(text)?;
        let logits = self.run_model(&tokens)?;
        let scores = softmax(&logits);

        let mut categories: Vec<Category> = self
            .labels
            .iter()
            .zip(scores)
            .map(|(label, score)| Category {
                label: label.clone(),
                score,
            })
            .collect();
        categories.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

        Ok(categories)
    }
}

fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&x| (x - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    if sum > 0.0 {
        exps.iter().map(|&x| x / sum).collect()
    } else {
        vec![0.0; logits.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_softmax_sums_to_one() {
        let scores = softmax(&[1.0, 2.0, 3.0]);
        let sum: f32 = scores.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
        assert!(scores[2] > scores[1] && scores[1] > scores[0]);
    }

    #[test]
    fn test_softmax_is_stable_for_large_logits() {
        let scores = softmax(&[1000.0, 1001.0]);
        assert!(scores.iter().all(|s| s.is_finite()));
        assert!(scores[1] > scores[0]);
    }

    #[test]
    fn test_missing_model_file_is_an_error() {
        let result = NlClassifier::from_files(
            Path::new("/nonexistent/model.onnx"),
            Path::new("/nonexistent/tokenizer.json"),
            vec!["negative".into(), "positive".into()],
            &RuntimeConfig::default(),
        );
        assert!(matches!(result, Err(SentimentError::Model(_))));
    }

    #[test]
    fn test_empty_labels_are_rejected() {
        let result = NlClassifier::from_files(
            Path::new("/nonexistent/model.onnx"),
            Path::new("/nonexistent/tokenizer.json"),
            vec![],
            &RuntimeConfig::default(),
        );
        assert!(matches!(result, Err(SentimentError::Validation(_))));
    }
}
