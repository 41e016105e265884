//! Google Gemini provider client (video generation).

use std::path::Path;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::{json, Value};

use super::{classify_status, ProviderError, VideoGenerator};
use crate::config::GenerationSettings;

const PROVIDER: &str = "gemini";
const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Longest clip the Gemini video API accepts.
const MAX_CLIP_SECS: u32 = 10;

/// Blocking Gemini API client.
pub struct GeminiClient {
    api_key: String,
    http: reqwest::blocking::Client,
    model: String,
}

impl GeminiClient {
    /// Create a client with the given API key and model settings.
    pub fn new(api_key: String, settings: &GenerationSettings) -> Result<Self, ProviderError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .map_err(|e| ProviderError::Network {
                provider: PROVIDER,
                message: e.to_string(),
            })?;

        Ok(Self {
            api_key,
            http,
            model: settings.gemini_model.clone(),
        })
    }

    fn post_json(&self, url: &str, body: &Value) -> Result<Value, ProviderError> {
        tracing::debug!(url, "POST to Gemini");

        let response = self
            .http
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(body)
            .send()
            .map_err(|e| ProviderError::Network {
                provider: PROVIDER,
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            return Err(classify_status(
                PROVIDER,
                status.as_u16(),
                extract_error_message(&text),
            ));
        }

        response.json().map_err(|e| ProviderError::MalformedResponse {
            provider: PROVIDER,
            message: e.to_string(),
        })
    }
}

impl VideoGenerator for GeminiClient {
    fn generate_clip(
        &self,
        prompt: &str,
        seed_image: Option<&Path>,
        duration_secs: u32,
    ) -> Result<Vec<u8>, ProviderError> {
        if duration_secs > MAX_CLIP_SECS {
            return Err(ProviderError::UnsupportedDuration {
                provider: PROVIDER,
                requested: duration_secs,
                max: MAX_CLIP_SECS,
            });
        }

        let mut body = json!({
            "prompt": { "text": prompt },
            "videoConfig": { "durationSeconds": duration_secs },
        });

        if let Some(path) = seed_image {
            let image_bytes =
                std::fs::read(path).map_err(|e| ProviderError::SeedImage {
                    path: path.display().to_string(),
                    source: e,
                })?;
            body["image"] = json!({
                "inlineData": {
                    "mimeType": "image/png",
                    "data": BASE64.encode(image_bytes),
                }
            });
        }

        let url = format!("{}/models/{}:generateVideo", API_BASE, self.model);
        let response = self.post_json(&url, &body)?;

        let encoded = response["video"]["data"].as_str().ok_or_else(|| {
            ProviderError::MalformedResponse {
                provider: PROVIDER,
                message: "response carried no video data".to_string(),
            }
        })?;

        BASE64
            .decode(encoded)
            .map_err(|e| ProviderError::MalformedResponse {
                provider: PROVIDER,
                message: format!("video data is not valid base64: {}", e),
            })
    }
}

/// Pull the human-readable message out of a Gemini error body.
fn extract_error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        if let Some(message) = value["error"]["message"].as_str() {
            return message.to_string();
        }
    }
    let mut message = body.trim().to_string();
    message.truncate(200);
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn over_long_clip_is_rejected_before_any_request() {
        let client =
            GeminiClient::new("key".into(), &GenerationSettings::default()).unwrap();
        let result = client.generate_clip("a clip", None, 30);
        assert!(matches!(
            result,
            Err(ProviderError::UnsupportedDuration { requested: 30, max: 10, .. })
        ));
    }

    #[test]
    fn extracts_structured_error_message() {
        let body = r#"{"error": {"code": 400, "message": "Unsupported region"}}"#;
        assert_eq!(extract_error_message(body), "Unsupported region");
    }
}
