use std::sync::{Arc, Mutex};

use log::{error, info};

use crate::model_manager::{DownloadConditions, ModelManager, ModelSpec};

use super::classifier::NlClassifier;
use super::error::SentimentError;
use super::runtime::RuntimeConfig;
use super::{Category, TextClassifier};

/// Observable session state. `Ready` is reached at most once per session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Unloaded,
    Downloading,
    Ready,
    Failed(String),
}

enum Inner {
    Unloaded,
    Downloading,
    Ready(Arc<dyn TextClassifier + Send + Sync>),
    Failed(String),
}

/// Session-scoped holder of the sentiment classifier.
///
/// Replaces the implicit "nullable classifier" pattern with explicit
/// transitions: `Unloaded -> Downloading -> Ready | Failed`. Classification
/// requests issued in any state other than `Ready` are rejected with
/// [`SentimentError::NotReady`] rather than left undefined.
#[derive(Clone)]
pub struct SentimentSession {
    inner: Arc<Mutex<Inner>>,
}

impl Default for SentimentSession {
    fn default() -> Self {
        Self::new()
    }
}

impl SentimentSession {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::Unloaded)),
        }
    }

    pub fn state(&self) -> SessionState {
        match &*self.inner.lock().expect("session state lock poisoned") {
            Inner::Unloaded => SessionState::Unloaded,
            Inner::Downloading => SessionState::Downloading,
            Inner::Ready(_) => SessionState::Ready,
            Inner::Failed(reason) => SessionState::Failed(reason.clone()),
        }
    }

    /// Downloads the model if needed and loads the classifier, driving the
    /// session to `Ready` or `Failed`. Intended to be run once, in a
    /// background task, when the sentiment screen is entered.
    pub async fn prepare(
        &self,
        manager: &ModelManager,
        spec: &ModelSpec,
        conditions: DownloadConditions,
    ) -> Result<(), SentimentError> {
        self.begin_download()?;

        let result = self.download_and_load(manager, spec, conditions).await;
        match result {
            Ok(classifier) => {
                info!("Sentiment model '{}' is ready", spec.name);
                *self.inner.lock().expect("session state lock poisoned") =
                    Inner::Ready(Arc::new(classifier));
                Ok(())
            }
            Err(e) => {
                error!("Failed to prepare sentiment model '{}': {}", spec.name, e);
                *self.inner.lock().expect("session state lock poisoned") =
                    Inner::Failed(e.to_string());
                Err(e)
            }
        }
    }

    /// Installs an already-built classifier, following the same transition
    /// rules as [`prepare`](Self::prepare). Useful for embedders that manage
    /// model loading themselves.
    pub fn install(
        &self,
        classifier: Arc<dyn TextClassifier + Send + Sync>,
    ) -> Result<(), SentimentError> {
        let mut inner = self.inner.lock().expect("session state lock poisoned");
        match &*inner {
            Inner::Unloaded => {
                *inner = Inner::Ready(classifier);
                Ok(())
            }
            Inner::Downloading => Err(SentimentError::NotReady(
                "model download already in progress".into(),
            )),
            Inner::Ready(_) => Err(SentimentError::NotReady(
                "classifier already installed".into(),
            )),
            Inner::Failed(reason) => Err(SentimentError::NotReady(format!(
                "session already failed: {}",
                reason
            ))),
        }
    }

    /// Classifies `text`, requiring the session to be `Ready`.
    pub fn classify(&self, text: &str) -> Result<Vec<Category>, SentimentError> {
        let classifier = {
            let inner = self.inner.lock().expect("session state lock poisoned");
            match &*inner {
                Inner::Ready(classifier) => Arc::clone(classifier),
                Inner::Unloaded => {
                    return Err(SentimentError::NotReady(
                        "model download has not been started".into(),
                    ))
                }
                Inner::Downloading => {
                    return Err(SentimentError::NotReady(
                        "model is still downloading".into(),
                    ))
                }
                Inner::Failed(reason) => {
                    return Err(SentimentError::NotReady(format!(
                        "model download failed: {}",
                        reason
                    )))
                }
            }
        };
        // Inference runs without the state lock held
        classifier.classify(text)
    }

    fn begin_download(&self) -> Result<(), SentimentError> {
        let mut inner = self.inner.lock().expect("session state lock poisoned");
        match &*inner {
            Inner::Unloaded => {
                *inner = Inner::Downloading;
                Ok(())
            }
            Inner::Downloading => Err(SentimentError::NotReady(
                "model download already in progress".into(),
            )),
            Inner::Ready(_) => Err(SentimentError::NotReady(
                "classifier already installed".into(),
            )),
            Inner::Failed(reason) => Err(SentimentError::NotReady(format!(
                "session already failed: {}",
                reason
            ))),
        }
    }

    async fn download_and_load(
        &self,
        manager: &ModelManager,
        spec: &ModelSpec,
        conditions: DownloadConditions,
    ) -> Result<NlClassifier, SentimentError> {
        manager.ensure_downloaded(spec, conditions).await?;

        let model_path = manager.model_path(&spec.name);
        let tokenizer_path = manager.tokenizer_path(&spec.name);
        let labels = spec.labels.clone();

        // Session construction parses the model graph; keep it off the
        // async executor threads.
        tokio::task::spawn_blocking(move || {
            NlClassifier::from_files(
                &model_path,
                &tokenizer_path,
                labels,
                &RuntimeConfig::default(),
            )
        })
        .await
        .map_err(|e| SentimentError::Model(format!("Classifier load task failed: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubClassifier {
        result: Vec<Category>,
    }

    impl TextClassifier for StubClassifier {
        fn classify(&self, _text: &str) -> Result<Vec<Category>, SentimentError> {
            Ok(self.result.clone())
        }
    }

    #[test]
    fn test_classify_before_ready_is_rejected() {
        let session = SentimentSession::new();
        assert_eq!(session.state(), SessionState::Unloaded);

        let err = session.classify("great service").unwrap_err();
        assert!(matches!(err, SentimentError::NotReady(_)));
    }

    #[test]
    fn test_install_reaches_ready_exactly_once() {
        let session = SentimentSession::new();
        let classifier = Arc::new(StubClassifier { result: vec![] });

        session.install(classifier.clone()).unwrap();
        assert_eq!(session.state(), SessionState::Ready);

        let err = session.install(classifier).unwrap_err();
        assert!(matches!(err, SentimentError::NotReady(_)));
    }

    #[test]
    fn test_classify_when_ready_returns_ranked_categories() {
        let session = SentimentSession::new();
        session
            .install(Arc::new(StubClassifier {
                result: vec![
                    Category {
                        label: "positive".into(),
                        score: 0.87,
                    },
                    Category {
                        label: "negative".into(),
                        score: 0.13,
                    },
                ],
            }))
            .unwrap();

        let categories = session.classify("great service").unwrap();
        assert_eq!(categories.len(), 2);
        assert_eq!(categories[0].label, "positive");
        assert!((categories[0].score - 0.87).abs() < 1e-6);
        assert_eq!(categories[1].label, "negative");
    }
}
