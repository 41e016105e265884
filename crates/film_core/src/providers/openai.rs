//! OpenAI provider client (DALL-E images, Sora video).

use std::path::Path;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::{json, Value};

use super::{classify_status, ImageGenerator, ProviderError, VideoGenerator};
use crate::config::GenerationSettings;

const PROVIDER: &str = "openai";
const API_BASE: &str = "https://api.openai.com/v1";

/// Longest clip the video model accepts.
const MAX_CLIP_SECS: u32 = 20;

/// Blocking OpenAI API client.
pub struct OpenAiClient {
    api_key: String,
    http: reqwest::blocking::Client,
    image_model: String,
    image_size: String,
    video_model: String,
}

impl OpenAiClient {
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
            image_model: settings.image_model.clone(),
            image_size: settings.image_size.clone(),
            video_model: settings.video_model.clone(),
        })
    }

    /// POST a JSON body and decode a JSON response, classifying failures.
    fn post_json(&self, url: &str, body: &Value) -> Result<Value, ProviderError> {
        tracing::debug!(url, "POST to OpenAI");

        let response = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
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

    /// Download generated content from the URL the API returned.
    fn download(&self, url: &str) -> Result<Vec<u8>, ProviderError> {
        tracing::debug!(url, "downloading generated asset");

        let response = self
            .http
            .get(url)
            .send()
            .map_err(|e| ProviderError::Network {
                provider: PROVIDER,
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(
                PROVIDER,
                status.as_u16(),
                format!("asset download failed for {}", url),
            ));
        }

        let bytes = response.bytes().map_err(|e| ProviderError::Network {
            provider: PROVIDER,
            message: e.to_string(),
        })?;
        Ok(bytes.to_vec())
    }

    /// Pull `data[0].url` out of a generation response.
    fn first_asset_url(response: &Value) -> Result<&str, ProviderError> {
        response["data"][0]["url"]
            .as_str()
            .ok_or_else(|| ProviderError::MalformedResponse {
                provider: PROVIDER,
                message: "response carried no asset URL".to_string(),
            })
    }
}

impl ImageGenerator for OpenAiClient {
    fn generate_image(&self, prompt: &str, style_hints: &str) -> Result<Vec<u8>, ProviderError> {
        let full_prompt = if style_hints.is_empty() {
            prompt.to_string()
        } else {
            format!("{}. {}", prompt, style_hints)
        };

        let body = json!({
            "model": self.image_model,
            "prompt": full_prompt,
            "size": self.image_size,
            "quality": "standard",
            "n": 1,
        });

        let response = self.post_json(&format!("{}/images/generations", API_BASE), &body)?;
        let url = Self::first_asset_url(&response)?;
        self.download(url)
    }
}

impl VideoGenerator for OpenAiClient {
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
            "model": self.video_model,
            "prompt": prompt,
            "duration": duration_secs,
        });

        if let Some(path) = seed_image {
            let image_bytes =
                std::fs::read(path).map_err(|e| ProviderError::SeedImage {
                    path: path.display().to_string(),
                    source: e,
                })?;
            body["input_image"] = json!({ "b64_json": BASE64.encode(image_bytes) });
        }

        let response = self.post_json(&format!("{}/videos/generations", API_BASE), &body)?;
        let url = Self::first_asset_url(&response)?;
        self.download(url)
    }
}

/// Pull the human-readable message out of an OpenAI error body.
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
    fn extracts_structured_error_message() {
        let body = r#"{"error": {"message": "Invalid prompt", "type": "invalid_request_error"}}"#;
        assert_eq!(extract_error_message(body), "Invalid prompt");
    }

    #[test]
    fn falls_back_to_raw_body() {
        assert_eq!(extract_error_message("upstream timeout"), "upstream timeout");
    }

    #[test]
    fn over_long_clip_is_rejected_before_any_request() {
        let client =
            OpenAiClient::new("sk-test".into(), &GenerationSettings::default()).unwrap();
        let result = client.generate_clip("a clip", None, MAX_CLIP_SECS + 1);
        assert!(matches!(
            result,
            Err(ProviderError::UnsupportedDuration { requested, .. }) if requested == MAX_CLIP_SECS + 1
        ));
    }

    #[test]
    fn asset_url_extraction() {
        let response = json!({"data": [{"url": "https://cdn.example/asset.png"}]});
        assert_eq!(
            OpenAiClient::first_asset_url(&response).unwrap(),
            "https://cdn.example/asset.png"
        );

        let empty = json!({"data": []});
        assert!(OpenAiClient::first_asset_url(&empty).is_err());
    }
}
