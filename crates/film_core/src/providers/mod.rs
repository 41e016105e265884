//! Generation provider capabilities.
//!
//! The pipeline is written against [`ImageGenerator`] and
//! [`VideoGenerator`] only; the concrete OpenAI/Gemini clients live
//! behind these traits and are selected once, at job creation.

mod gemini;
mod openai;
mod prompt;

use std::io;
use std::path::Path;

use thiserror::Error;

pub use gemini::GeminiClient;
pub use openai::OpenAiClient;
pub use prompt::{create_image_prompt, create_video_prompt, style_hints};

use crate::config::{ApiKeys, GenerationSettings};
use crate::models::ProviderKind;
use crate::retry::ErrorClass;

/// Errors from generation providers.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The provider throttled the request. Transient.
    #[error("{provider} rate limited the request: {message}")]
    RateLimited {
        provider: &'static str,
        message: String,
    },

    /// Transport-level failure (DNS, connect, timeout). Transient.
    #[error("network error talking to {provider}: {message}")]
    Network {
        provider: &'static str,
        message: String,
    },

    /// Server-side failure (5xx). Transient.
    #[error("{provider} request failed with HTTP {status}: {message}")]
    Http {
        provider: &'static str,
        status: u16,
        message: String,
    },

    /// The provider rejected the request (4xx). Permanent.
    #[error("{provider} rejected the request: {message}")]
    InvalidRequest {
        provider: &'static str,
        message: String,
    },

    /// The requested clip length exceeds what the provider supports.
    #[error("{provider} does not support {requested}s clips (max {max}s)")]
    UnsupportedDuration {
        provider: &'static str,
        requested: u32,
        max: u32,
    },

    /// Required API key is absent from the environment.
    #[error("{0} API key is not set")]
    MissingApiKey(&'static str),

    /// The response arrived but could not be decoded.
    #[error("failed to decode {provider} response: {message}")]
    MalformedResponse {
        provider: &'static str,
        message: String,
    },

    /// The seed image could not be read from disk.
    #[error("failed to read seed image {path}: {source}")]
    SeedImage {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl ProviderError {
    /// How the retry loop should treat this failure.
    pub fn class(&self) -> ErrorClass {
        match self {
            ProviderError::RateLimited { .. } | ProviderError::Network { .. } => {
                ErrorClass::Transient
            }
            ProviderError::Http { status, .. } if *status >= 500 => ErrorClass::Transient,
            _ => ErrorClass::Permanent,
        }
    }
}

/// Map a non-success HTTP status to a provider error.
pub(crate) fn classify_status(
    provider: &'static str,
    status: u16,
    message: String,
) -> ProviderError {
    match status {
        429 => ProviderError::RateLimited { provider, message },
        400..=499 => ProviderError::InvalidRequest { provider, message },
        _ => ProviderError::Http {
            provider,
            status,
            message,
        },
    }
}

/// Generates a still image from a prompt. Used for the starting frame.
pub trait ImageGenerator: Send + Sync {
    /// Generate an image, returning encoded image bytes (PNG or JPEG).
    fn generate_image(&self, prompt: &str, style_hints: &str) -> Result<Vec<u8>, ProviderError>;
}

/// Generates a video clip from a prompt and an optional seed image.
pub trait VideoGenerator: Send + Sync {
    /// Generate a clip of `duration_secs`, returning encoded video bytes.
    ///
    /// When `seed_image` is given the clip starts from that frame
    /// (image-to-video); otherwise text-to-video.
    fn generate_clip(
        &self,
        prompt: &str,
        seed_image: Option<&Path>,
        duration_secs: u32,
    ) -> Result<Vec<u8>, ProviderError>;
}

/// Build the image generator. Starting frames always come from OpenAI
/// (the original tool had no image path for Gemini).
pub fn create_image_generator(
    keys: &ApiKeys,
    settings: &GenerationSettings,
) -> Result<Box<dyn ImageGenerator>, ProviderError> {
    let key = keys
        .openai
        .clone()
        .ok_or(ProviderError::MissingApiKey("openai"))?;
    Ok(Box::new(OpenAiClient::new(key, settings)?))
}

/// Build the video generator for the selected provider.
pub fn create_video_generator(
    kind: ProviderKind,
    keys: &ApiKeys,
    settings: &GenerationSettings,
) -> Result<Box<dyn VideoGenerator>, ProviderError> {
    match kind {
        ProviderKind::OpenAi => {
            let key = keys
                .openai
                .clone()
                .ok_or(ProviderError::MissingApiKey("openai"))?;
            Ok(Box::new(OpenAiClient::new(key, settings)?))
        }
        ProviderKind::Gemini => {
            let key = keys
                .gemini
                .clone()
                .ok_or(ProviderError::MissingApiKey("gemini"))?;
            Ok(Box::new(GeminiClient::new(key, settings)?))
        }
    }
}
