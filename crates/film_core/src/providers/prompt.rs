//! Prompt composition from premise, style, and clip position.
//!
//! Pure data transforms; the state machine never makes creative
//! decisions itself.

use crate::models::FilmStyle;

/// Style descriptor appended to image prompts.
pub fn style_hints(style: FilmStyle) -> &'static str {
    match style {
        FilmStyle::Cinematic => "cinematic, dramatic lighting, film grain, anamorphic lens",
        FilmStyle::Noir => "film noir, high contrast black and white, dramatic shadows",
        FilmStyle::Anime => "anime style, vibrant colors, detailed illustration",
        FilmStyle::Documentary => "documentary style, realistic, natural lighting",
        FilmStyle::Scifi => "sci-fi, futuristic, neon lights, high tech",
        FilmStyle::Fantasy => "fantasy, magical, ethereal, dramatic",
        FilmStyle::Horror => "horror, dark, ominous, unsettling atmosphere",
        FilmStyle::Comedy => "bright, colorful, whimsical, fun",
    }
}

/// Prompt for the starting frame. Style hints travel separately through
/// the image capability so providers can place them natively.
pub fn create_image_prompt(premise: &str) -> String {
    format!(
        "{}. Opening shot, establishing scene. High quality, detailed.",
        premise
    )
}

/// Prompt for clip `index` (1-based) of `total`.
///
/// Frames each clip as a narrative beat proportional to its position:
/// opening, rising action, climax, resolution.
pub fn create_video_prompt(premise: &str, index: usize, total: usize) -> String {
    debug_assert!(index >= 1 && index <= total);

    if index == 1 {
        return format!(
            "{}. Opening scene, establishing shot. Smooth camera movement.",
            premise
        );
    }
    if index == total {
        return format!("{}. Final scene, resolution. Dramatic conclusion.", premise);
    }

    // Interior clips split between rising action and climax by position.
    let position = (index - 1) as f64 / (total - 1) as f64;
    if position < 0.5 {
        format!(
            "{}. Rising action (scene {} of {}). Build tension and progression.",
            premise, index, total
        )
    } else {
        format!(
            "{}. Approaching the climax (scene {} of {}). Peak intensity and drama.",
            premise, index, total
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREMISE: &str = "A detective chases a mysterious figure through rain-soaked streets";

    #[test]
    fn image_prompt_frames_the_premise() {
        let prompt = create_image_prompt(PREMISE);
        assert!(prompt.starts_with(PREMISE));
        assert!(prompt.contains("establishing scene"));
    }

    #[test]
    fn first_clip_is_the_opening() {
        let prompt = create_video_prompt(PREMISE, 1, 6);
        assert!(prompt.contains("Opening scene"));
    }

    #[test]
    fn last_clip_is_the_resolution() {
        let prompt = create_video_prompt(PREMISE, 6, 6);
        assert!(prompt.contains("resolution"));
    }

    #[test]
    fn interior_clips_split_rising_and_climax() {
        assert!(create_video_prompt(PREMISE, 2, 6).contains("Rising action"));
        assert!(create_video_prompt(PREMISE, 5, 6).contains("climax"));
    }

    #[test]
    fn every_style_has_hints() {
        for style in FilmStyle::all() {
            assert!(!style_hints(*style).is_empty());
        }
    }
}
