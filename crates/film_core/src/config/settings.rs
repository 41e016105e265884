//! Settings struct with TOML-based sections.
//!
//! Settings cover the ambient knobs of the tool (paths, provider model
//! names, retry budget, logging). Per-film parameters live in
//! [`crate::models::FilmSpec`], not here.

use serde::{Deserialize, Serialize};

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Path-related settings.
    #[serde(default)]
    pub paths: PathSettings,

    /// Generation model/provider settings.
    #[serde(default)]
    pub generation: GenerationSettings,

    /// Retry policy settings for provider calls.
    #[serde(default)]
    pub retry: RetrySettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Path configuration for output and logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSettings {
    /// Default output folder when the command line gives none.
    #[serde(default = "default_output_folder")]
    pub output_folder: String,

    /// Folder for per-job log files, relative to the output folder.
    #[serde(default = "default_logs_folder")]
    pub logs_folder: String,
}

fn default_output_folder() -> String {
    "output".to_string()
}

fn default_logs_folder() -> String {
    "logs".to_string()
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            output_folder: default_output_folder(),
            logs_folder: default_logs_folder(),
        }
    }
}

/// Model names and request knobs for the provider clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationSettings {
    /// OpenAI image model for the starting frame.
    #[serde(default = "default_image_model")]
    pub image_model: String,

    /// Image size requested for the starting frame.
    #[serde(default = "default_image_size")]
    pub image_size: String,

    /// OpenAI video model.
    #[serde(default = "default_video_model")]
    pub video_model: String,

    /// Gemini model for video generation.
    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,

    /// Per-request timeout in seconds (video downloads are large).
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Default per-clip duration in seconds.
    #[serde(default = "default_clip_duration")]
    pub clip_duration_secs: u32,
}

fn default_image_model() -> String {
    "dall-e-3".to_string()
}

fn default_image_size() -> String {
    "1024x1024".to_string()
}

fn default_video_model() -> String {
    "sora-1.0".to_string()
}

fn default_gemini_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_request_timeout() -> u64 {
    300
}

fn default_clip_duration() -> u32 {
    10
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            image_model: default_image_model(),
            image_size: default_image_size(),
            video_model: default_video_model(),
            gemini_model: default_gemini_model(),
            request_timeout_secs: default_request_timeout(),
            clip_duration_secs: default_clip_duration(),
        }
    }
}

/// Retry policy configuration for provider calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Maximum attempts per provider call (first try included).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base backoff delay in seconds; doubled per attempt, plus jitter.
    #[serde(default = "default_base_delay")]
    pub base_delay_secs: f64,
}

fn default_max_attempts() -> u32 {
    5
}

fn default_base_delay() -> f64 {
    2.0
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_secs: default_base_delay(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Use compact log format (filter per-percent progress lines).
    #[serde(default = "default_true")]
    pub compact: bool,

    /// Number of external-tool output lines kept for error diagnosis.
    #[serde(default = "default_error_tail")]
    pub error_tail: u32,

    /// Progress update step percentage.
    #[serde(default = "default_progress_step")]
    pub progress_step: u32,

    /// Show timestamps in job log output.
    #[serde(default = "default_true")]
    pub show_timestamps: bool,
}

fn default_true() -> bool {
    true
}

fn default_error_tail() -> u32 {
    20
}

fn default_progress_step() -> u32 {
    20
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            compact: true,
            error_tail: default_error_tail(),
            progress_step: default_progress_step(),
            show_timestamps: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_serializes() {
        let settings = Settings::default();
        let toml = toml::to_string_pretty(&settings).unwrap();
        assert!(toml.contains("[paths]"));
        assert!(toml.contains("[retry]"));
        assert!(toml.contains("output_folder"));
    }

    #[test]
    fn settings_round_trip() {
        let settings = Settings::default();
        let toml = toml::to_string_pretty(&settings).unwrap();
        let parsed: Settings = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.retry.max_attempts, settings.retry.max_attempts);
        assert_eq!(parsed.generation.image_model, settings.generation.image_model);
    }

    #[test]
    fn missing_fields_use_defaults() {
        let minimal = "[retry]\nmax_attempts = 3";
        let parsed: Settings = toml::from_str(minimal).unwrap();
        // Custom value preserved
        assert_eq!(parsed.retry.max_attempts, 3);
        // Defaults applied for missing
        assert_eq!(parsed.retry.base_delay_secs, 2.0);
        assert_eq!(parsed.generation.clip_duration_secs, 10);
        assert_eq!(parsed.paths.output_folder, "output");
    }
}
