use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use sha2::{Digest, Sha256};
use tokio::sync::Mutex;

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Model not downloaded: {0}")]
    NotDownloaded(String),
    #[error("Download error: {0}")]
    Download(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Model verification failed")]
    VerificationFailed,
    #[error("Hash mismatch: expected {expected}, got {actual} for {file_type} file")]
    HashMismatch {
        file_type: String,
        expected: String,
        actual: String,
    },
}

/// Describes a downloadable text-classification model: where its graph and
/// tokenizer live, the hashes they must match, and the ordered output labels
/// the model was trained with.
#[derive(Debug, Clone)]
pub struct ModelSpec {
    pub name: String,
    pub model_url: String,
    pub model_hash: String,
    pub tokenizer_url: String,
    pub tokenizer_hash: String,
    pub labels: Vec<String>,
}

impl ModelSpec {
    /// The default sentiment model: a binary positive/negative classifier.
    pub fn sentiment() -> Self {
        Self {
            name: "sentiment".to_string(),
            model_url: "https://huggingface.co/sightline-dev/sentiment/resolve/main/model.onnx"
                .to_string(),
            model_hash: "37f1ea074b7166e87295fce31299287d5fb79f76b8b7227fccc8a9f2f1ba4e16"
                .to_string(),
            tokenizer_url:
                "https://huggingface.co/sightline-dev/sentiment/resolve/main/tokenizer.json"
                    .to_string(),
            tokenizer_hash: "da0e79933b9ed51798a3ae27893d3c5fa4a201126cef75586296df9b4d2c62a0"
                .to_string(),
            labels: vec!["negative".to_string(), "positive".to_string()],
        }
    }
}

/// Conditions a caller can attach to a download request. On a desktop host
/// network metering is not observable, so the flag is recorded and logged
/// rather than enforced.
#[derive(Debug, Clone, Copy)]
pub struct DownloadConditions {
    pub allow_metered: bool,
}

impl Default for DownloadConditions {
    fn default() -> Self {
        Self {
            allow_metered: false,
        }
    }
}

/// Fetches, verifies and caches model files. This is the crate's model
/// distribution layer: callers hand it a [`ModelSpec`] and get back local
/// files that are guaranteed to match the spec's hashes.
#[derive(Clone)]
pub struct ModelManager {
    models_dir: PathBuf,
    download_lock: Arc<Mutex<()>>,
}

impl ModelManager {
    /// Creates a new ModelManager with the default models directory.
    pub fn new_default() -> io::Result<Self> {
        Self::new(Self::default_models_dir())
    }

    /// Returns the default models directory path.
    pub fn default_models_dir() -> PathBuf {
        // 1. Check environment variable
        if let Ok(path) = env::var("SIGHTLINE_CACHE") {
            return PathBuf::from(path).join("models");
        }

        // 2. Use platform-specific cache directory
        if let Some(cache_dir) = dirs::cache_dir() {
            return cache_dir.join("sightline").join("models");
        }

        // 3. Fallback to user's home directory
        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(".cache").join("sightline").join("models");
        }

        // 4. If all else fails, use system temp directory
        env::temp_dir().join("sightline").join("models")
    }

    pub fn new<P: AsRef<Path>>(models_dir: P) -> io::Result<Self> {
        let models_dir = models_dir.as_ref().to_path_buf();
        fs::create_dir_all(&models_dir)?;
        Ok(Self {
            models_dir,
            download_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn model_path(&self, name: &str) -> PathBuf {
        self.models_dir.join(name).join("model.onnx")
    }

    pub fn tokenizer_path(&self, name: &str) -> PathBuf {
        self.models_dir.join(name).join("tokenizer.json")
    }

    pub fn is_downloaded(&self, name: &str) -> bool {
        let model_path = self.model_path(name);
        let tokenizer_path = self.tokenizer_path(name);
        log::debug!(
            "Model file {:?} (exists: {}), tokenizer file {:?} (exists: {})",
            model_path,
            model_path.exists(),
            tokenizer_path,
            tokenizer_path.exists()
        );
        model_path.exists() && tokenizer_path.exists()
    }

    pub async fn download(
        &self,
        spec: &ModelSpec,
        conditions: DownloadConditions,
    ) -> Result<(), ModelError> {
        let _lock = self.download_lock.lock().await;

        if !conditions.allow_metered {
            log::info!("Download requested with unmetered-network condition (advisory)");
        }

        let model_dir = self.models_dir.join(&spec.name);
        log::info!("Creating model directory at {:?}", model_dir);
        fs::create_dir_all(&model_dir)?;

        let model_path = self.model_path(&spec.name);
        let model_result = if model_path.exists() {
            if !self.verify_file(&model_path, &spec.model_hash)? {
                log::warn!("Model file verification failed, redownloading");
                self.fetch_and_verify(&spec.model_url, &model_path, &spec.model_hash, "model")
                    .await
            } else {
                log::info!("Existing model file verified successfully");
                Ok(())
            }
        } else {
            self.fetch_and_verify(&spec.model_url, &model_path, &spec.model_hash, "model")
                .await
        };

        let tokenizer_path = self.tokenizer_path(&spec.name);
        let tokenizer_result = if tokenizer_path.exists() {
            if !self.verify_file(&tokenizer_path, &spec.tokenizer_hash)? {
                log::warn!("Tokenizer file verification failed, redownloading");
                self.fetch_and_verify(
                    &spec.tokenizer_url,
                    &tokenizer_path,
                    &spec.tokenizer_hash,
                    "tokenizer",
                )
                .await
            } else {
                log::info!("Existing tokenizer file verified successfully");
                Ok(())
            }
        } else {
            self.fetch_and_verify(
                &spec.tokenizer_url,
                &tokenizer_path,
                &spec.tokenizer_hash,
                "tokenizer",
            )
            .await
        };

        match (model_result, tokenizer_result) {
            (Ok(()), Ok(())) => {
                log::info!("Model '{}' ready to use", spec.name);
                Ok(())
            }
            (Err(e), _) | (_, Err(e)) => {
                log::error!("Failed to set up model '{}': {}", spec.name, e);
                // Partial downloads are useless, drop them
                let _ = self.remove(&spec.name);
                Err(e)
            }
        }
    }

    fn verify_file(&self, path: &Path, expected_hash: &str) -> Result<bool, ModelError> {
        let bytes = fs::read(path)?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let hash = format!("{:x}", hasher.finalize());
        log::debug!("Verifying {:?}: calculated {}, expected {}", path, hash, expected_hash);
        Ok(hash == expected_hash)
    }

    pub fn verify(&self, spec: &ModelSpec) -> Result<bool, ModelError> {
        let model_path = self.model_path(&spec.name);
        let tokenizer_path = self.tokenizer_path(&spec.name);

        if !model_path.exists() || !tokenizer_path.exists() {
            log::info!("One or both files for model '{}' do not exist", spec.name);
            return Ok(false);
        }

        let model_ok = self.verify_file(&model_path, &spec.model_hash)?;
        let tokenizer_ok = self.verify_file(&tokenizer_path, &spec.tokenizer_hash)?;
        Ok(model_ok && tokenizer_ok)
    }

    async fn fetch_and_verify(
        &self,
        url: &str,
        path: &Path,
        expected_hash: &str,
        file_type: &str,
    ) -> Result<(), ModelError> {
        log::info!("Downloading {} file from {} to {:?}", file_type, url, path);
        let response = reqwest::get(url).await?;
        log::info!("Download response status: {}", response.status());
        let bytes = response.bytes().await?;
        log::info!("Downloaded {} bytes", bytes.len());

        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let hash = format!("{:x}", hasher.finalize());

        if hash != expected_hash {
            log::error!(
                "{} hash mismatch: expected {}, got {}",
                file_type,
                expected_hash,
                hash
            );
            return Err(ModelError::HashMismatch {
                file_type: file_type.to_string(),
                expected: expected_hash.to_string(),
                actual: hash,
            });
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, bytes)?;

        // Verify after writing
        if !self.verify_file(path, expected_hash)? {
            return Err(ModelError::VerificationFailed);
        }

        log::info!("{} file downloaded and verified successfully", file_type);
        Ok(())
    }

    pub fn remove(&self, name: &str) -> Result<(), ModelError> {
        let model_path = self.model_path(name);
        let tokenizer_path = self.tokenizer_path(name);

        if model_path.exists() {
            fs::remove_file(&model_path)?;
        }
        if tokenizer_path.exists() {
            fs::remove_file(&tokenizer_path)?;
        }
        Ok(())
    }

    /// Ensures that a model is downloaded and verified. Missing files are
    /// fetched; files that fail verification are re-fetched.
    pub async fn ensure_downloaded(
        &self,
        spec: &ModelSpec,
        conditions: DownloadConditions,
    ) -> Result<(), ModelError> {
        if !self.is_downloaded(&spec.name) {
            log::info!("Model '{}' not found, downloading...", spec.name);
            self.download(spec, conditions).await?;
        } else if !self.verify(spec)? {
            log::info!("Model '{}' failed verification, re-downloading...", spec.name);
            self.remove(&spec.name)?;
            self.download(spec, conditions).await?;
        }
        Ok(())
    }
}
