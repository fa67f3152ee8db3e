use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use super::error::LandmarkError;

/// A named remote procedure taking one JSON value and returning one JSON
/// value. The call is one-shot: no retries, no timeout override, no
/// idempotency key.
#[async_trait]
pub trait CallableFunction: Send + Sync {
    async fn call(&self, payload: Value) -> Result<Value, LandmarkError>;
}

/// Wire envelope of the callable-functions protocol: the argument travels
/// under `data`, the response under `result` or `error`.
#[derive(Debug, Serialize)]
struct CallEnvelope {
    data: Value,
}

/// HTTPS client for a hosted callable function.
#[derive(Debug, Clone)]
pub struct HttpsCallable {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpsCallable {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl CallableFunction for HttpsCallable {
    async fn call(&self, payload: Value) -> Result<Value, LandmarkError> {
        log::info!("Calling remote function at {}", self.endpoint);
        let response = self
            .client
            .post(&self.endpoint)
            .json(&CallEnvelope { data: payload })
            .send()
            .await?;

        let status = response.status();
        log::info!("Remote function response status: {}", status);

        let mut body: Value = response.json().await?;

        // The callable protocol reports failures in-band as well as via
        // HTTP status; surface whichever is present.
        if let Some(error) = body.get("error") {
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown remote error");
            return Err(LandmarkError::Call(format!(
                "{} (status {})",
                message, status
            )));
        }
        if !status.is_success() {
            return Err(LandmarkError::Call(format!("HTTP status {}", status)));
        }

        match body.get_mut("result") {
            Some(result) => Ok(result.take()),
            None => Err(LandmarkError::Call(
                "response carried neither result nor error".into(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_call_envelope_wire_shape() {
        let envelope = CallEnvelope {
            data: json!({"image": {"content": "aGVsbG8="}}),
        };
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["data"]["image"]["content"], "aGVsbG8=");
    }
}
