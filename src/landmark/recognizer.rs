use tokio::sync::Mutex;

use super::error::LandmarkError;
use super::functions::CallableFunction;
use super::prepare::{encode_base64, encode_jpeg, scale_down, MAX_DIMENSION};
use super::request::AnnotateRequest;
use super::response::{extract_top, Landmark};

/// Runs the recognition pipeline: decode, bounded downscale, JPEG + base64
/// encode, remote call, best-match extraction.
pub struct LandmarkRecognizer<F: CallableFunction> {
    function: F,
    max_dimension: u32,
    // Guards against duplicate submissions while a call is outstanding
    in_flight: Mutex<()>,
}

impl<F: CallableFunction> LandmarkRecognizer<F> {
    pub fn new(function: F) -> Self {
        Self {
            function,
            max_dimension: MAX_DIMENSION,
            in_flight: Mutex::new(()),
        }
    }

    pub fn with_max_dimension(mut self, max_dimension: u32) -> Self {
        self.max_dimension = max_dimension;
        self
    }

    /// Recognizes the landmark in a selected image. A second call while one
    /// is in flight fails fast with [`LandmarkError::Busy`].
    pub async fn recognize(&self, image_bytes: &[u8]) -> Result<Landmark, LandmarkError> {
        let _guard = self.in_flight.try_lock().map_err(|_| LandmarkError::Busy)?;

        let image = image::load_from_memory(image_bytes)?;
        log::info!(
            "Selected image decoded: {}x{}",
            image.width(),
            image.height()
        );

        let scaled = scale_down(&image, self.max_dimension);
        let jpeg = encode_jpeg(&scaled)?;
        log::info!(
            "Scaled to {}x{}, {} bytes after JPEG encoding",
            scaled.width(),
            scaled.height(),
            jpeg.len()
        );

        let request = AnnotateRequest::new(encode_base64(&jpeg));
        let payload = serde_json::to_value(&request)?;

        let response = self.function.call(payload).await?;
        extract_top(&response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use image::{DynamicImage, RgbImage};
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct RecordingFunction {
        calls: AtomicUsize,
        response: Value,
    }

    #[async_trait]
    impl CallableFunction for &RecordingFunction {
        async fn call(&self, payload: Value) -> Result<Value, LandmarkError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            // The payload must already be the full request document
            assert!(payload["image"]["content"].is_string());
            assert_eq!(payload["features"][0]["maxResults"], 5);
            Ok(self.response.clone())
        }
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = DynamicImage::ImageRgb8(RgbImage::new(width, height));
        let mut bytes = std::io::Cursor::new(Vec::new());
        image
            .write_to(&mut bytes, image::ImageFormat::Png)
            .unwrap();
        bytes.into_inner()
    }

    #[tokio::test]
    async fn test_recognize_surfaces_best_match() {
        let function = RecordingFunction {
            calls: AtomicUsize::new(0),
            response: json!([{
                "landmarkAnnotations": [{
                    "description": "Eiffel Tower",
                    "mid": "/m/02j81",
                    "score": 0.91,
                    "locations": [{"latLng": {"latitude": 48.8584, "longitude": 2.2945}}]
                }]
            }]),
        };

        let recognizer = LandmarkRecognizer::new(&function);
        let landmark = recognizer.recognize(&png_bytes(1200, 800)).await.unwrap();

        assert_eq!(landmark.description, "Eiffel Tower");
        assert_eq!(function.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_recognize_rejects_undecodable_bytes() {
        let function = RecordingFunction {
            calls: AtomicUsize::new(0),
            response: json!([]),
        };
        let recognizer = LandmarkRecognizer::new(&function);

        let err = recognizer.recognize(b"not an image").await.unwrap_err();
        assert!(matches!(err, LandmarkError::Decode(_)));
        // The remote call never happens on decode failure
        assert_eq!(function.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_second_submission_while_in_flight_is_rejected() {
        use std::sync::Arc;
        use tokio::sync::{oneshot, Notify};

        // Parks inside the remote call until released, holding the
        // recognizer's in-flight guard across the await.
        struct ParkedFunction {
            started: Arc<Notify>,
            release: std::sync::Mutex<Option<oneshot::Receiver<()>>>,
            response: Value,
        }

        #[async_trait]
        impl CallableFunction for ParkedFunction {
            async fn call(&self, _payload: Value) -> Result<Value, LandmarkError> {
                self.started.notify_one();
                let rx = self
                    .release
                    .lock()
                    .unwrap()
                    .take()
                    .expect("remote call issued more than once");
                let _ = rx.await;
                Ok(self.response.clone())
            }
        }

        let started = Arc::new(Notify::new());
        let (release_tx, release_rx) = oneshot::channel();
        let recognizer = Arc::new(LandmarkRecognizer::new(ParkedFunction {
            started: Arc::clone(&started),
            release: std::sync::Mutex::new(Some(release_rx)),
            response: json!([{
                "landmarkAnnotations": [{
                    "description": "Eiffel Tower",
                    "mid": "/m/02j81",
                    "score": 0.91,
                    "locations": [{"latLng": {"latitude": 48.8584, "longitude": 2.2945}}]
                }]
            }]),
        }));

        let first = tokio::spawn({
            let recognizer = Arc::clone(&recognizer);
            let bytes = png_bytes(64, 64);
            async move { recognizer.recognize(&bytes).await }
        });

        // Wait until the first request is parked inside the remote call
        started.notified().await;

        let err = recognizer.recognize(&png_bytes(64, 64)).await.unwrap_err();
        assert!(matches!(err, LandmarkError::Busy));

        // Releasing the first call lets it finish normally
        release_tx.send(()).unwrap();
        let landmark = first.await.unwrap().unwrap();
        assert_eq!(landmark.description, "Eiffel Tower");
    }

    #[tokio::test]
    async fn test_empty_response_is_a_defined_error() {
        let function = RecordingFunction {
            calls: AtomicUsize::new(0),
            response: json!([{"landmarkAnnotations": []}]),
        };
        let recognizer = LandmarkRecognizer::new(&function);

        let err = recognizer.recognize(&png_bytes(64, 64)).await.unwrap_err();
        assert!(matches!(err, LandmarkError::NoAnnotations));
    }
}
