//! Configuration: settings file and provider API keys.

mod manager;
mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{
    GenerationSettings, LoggingSettings, PathSettings, RetrySettings, Settings,
};

/// Provider API keys, read from the environment.
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    pub openai: Option<String>,
    pub gemini: Option<String>,
}

/// Load API keys from `OPENAI_API_KEY` / `GEMINI_API_KEY`.
pub fn load_api_keys() -> ApiKeys {
    ApiKeys {
        openai: std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty()),
        gemini: std::env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty()),
    }
}
