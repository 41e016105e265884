//! Core enums used throughout the application.

use serde::{Deserialize, Serialize};

/// Visual style applied to every generated frame and clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilmStyle {
    #[default]
    Cinematic,
    Noir,
    Anime,
    Documentary,
    Scifi,
    Fantasy,
    Horror,
    Comedy,
}

impl FilmStyle {
    /// Get the lowercase name used on the command line and in checkpoints.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Cinematic => "cinematic",
            Self::Noir => "noir",
            Self::Anime => "anime",
            Self::Documentary => "documentary",
            Self::Scifi => "scifi",
            Self::Fantasy => "fantasy",
            Self::Horror => "horror",
            Self::Comedy => "comedy",
        }
    }

    /// One-line description shown by the `styles` command.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Cinematic => "Dramatic, film-like quality with professional cinematography",
            Self::Noir => "Black and white, high contrast, dramatic shadows",
            Self::Anime => "Japanese animation style with vibrant colors",
            Self::Documentary => "Realistic, natural lighting, authentic feel",
            Self::Scifi => "Futuristic, high-tech, neon-lit environments",
            Self::Fantasy => "Magical, ethereal, fantastical elements",
            Self::Horror => "Dark, ominous, unsettling atmosphere",
            Self::Comedy => "Bright, colorful, lighthearted tone",
        }
    }

    /// Get all available styles.
    pub fn all() -> &'static [FilmStyle] {
        &[
            Self::Cinematic,
            Self::Noir,
            Self::Anime,
            Self::Documentary,
            Self::Scifi,
            Self::Fantasy,
            Self::Horror,
            Self::Comedy,
        ]
    }

    /// Parse from a lowercase name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|s| s.name() == name)
    }
}

impl std::fmt::Display for FilmStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Music vibe for the finished film.
///
/// Carried through the checkpoint as metadata only; no audio is generated
/// or mixed by this tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MusicVibe {
    #[default]
    Epic,
    Suspenseful,
    Calm,
    Upbeat,
    Dark,
    Whimsical,
    None,
}

impl MusicVibe {
    /// Get the lowercase name used on the command line and in checkpoints.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Epic => "epic",
            Self::Suspenseful => "suspenseful",
            Self::Calm => "calm",
            Self::Upbeat => "upbeat",
            Self::Dark => "dark",
            Self::Whimsical => "whimsical",
            Self::None => "none",
        }
    }

    /// One-line description shown by the `vibes` command.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Epic => "Grand, sweeping orchestral music",
            Self::Suspenseful => "Tense, dramatic, keeps you on edge",
            Self::Calm => "Peaceful, relaxing, ambient",
            Self::Upbeat => "Energetic, positive, fun",
            Self::Dark => "Ominous, foreboding, intense",
            Self::Whimsical => "Playful, quirky, lighthearted",
            Self::None => "No music (video only)",
        }
    }

    /// Get all available vibes.
    pub fn all() -> &'static [MusicVibe] {
        &[
            Self::Epic,
            Self::Suspenseful,
            Self::Calm,
            Self::Upbeat,
            Self::Dark,
            Self::Whimsical,
            Self::None,
        ]
    }

    /// Parse from a lowercase name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|v| v.name() == name)
    }
}

impl std::fmt::Display for MusicVibe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Video generation provider selected at job creation time.
///
/// The pipeline only ever talks to the capability traits; this enum picks
/// which concrete client gets constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    OpenAi,
    Gemini,
}

impl ProviderKind {
    /// Get the lowercase name used on the command line and in checkpoints.
    pub fn name(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Gemini => "gemini",
        }
    }

    /// Get all available providers.
    pub fn all() -> &'static [ProviderKind] {
        &[Self::OpenAi, Self::Gemini]
    }

    /// Parse from a lowercase name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|p| p.name() == name)
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Status of a single clip in the generation pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClipStatus {
    /// Not attempted yet.
    #[default]
    Pending,
    /// A provider call is (or was) in flight for this clip.
    Generating,
    /// Video and extracted last frame are on disk.
    Done,
    /// Generation failed permanently; blocks the chain.
    Failed,
}

impl std::fmt::Display for ClipStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClipStatus::Pending => write!(f, "pending"),
            ClipStatus::Generating => write!(f, "generating"),
            ClipStatus::Done => write!(f, "done"),
            ClipStatus::Failed => write!(f, "failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn style_serializes_lowercase() {
        let json = serde_json::to_string(&FilmStyle::Scifi).unwrap();
        assert_eq!(json, "\"scifi\"");
    }

    #[test]
    fn style_round_trips_by_name() {
        for style in FilmStyle::all() {
            assert_eq!(FilmStyle::from_name(style.name()), Some(*style));
        }
        assert_eq!(FilmStyle::from_name("vaporwave"), None);
    }

    #[test]
    fn vibe_count_matches_surface() {
        assert_eq!(MusicVibe::all().len(), 7);
        assert_eq!(MusicVibe::from_name("none"), Some(MusicVibe::None));
    }

    #[test]
    fn provider_deserializes_lowercase() {
        let provider: ProviderKind = serde_json::from_str("\"gemini\"").unwrap();
        assert_eq!(provider, ProviderKind::Gemini);
    }

    #[test]
    fn clip_status_serializes_lowercase() {
        let json = serde_json::to_string(&ClipStatus::Done).unwrap();
        assert_eq!(json, "\"done\"");
    }
}
