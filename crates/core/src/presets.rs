//! Transition prompt presets.
//!
//! A small catalog of ready-made transition prompts grouped by category,
//! plus the helper used to append short style keywords to a prompt.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PresetCategory {
    Basic,
    Cinematic,
    Creative,
}

impl PresetCategory {
    pub fn label(self) -> &'static str {
        match self {
            Self::Basic => "Basic transitions",
            Self::Cinematic => "Cinematic transitions",
            Self::Creative => "Creative transitions",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransitionPreset {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub prompt: &'static str,
    pub category: PresetCategory,
}

const fn preset(
    id: &'static str,
    name: &'static str,
    description: &'static str,
    prompt: &'static str,
    category: PresetCategory,
) -> TransitionPreset {
    TransitionPreset {
        id,
        name,
        description,
        prompt,
        category,
    }
}

pub const TRANSITION_PRESETS: &[TransitionPreset] = &[
    preset("fade", "Fade", "Smooth fade in and out", "smooth fade transition between scenes", PresetCategory::Basic),
    preset("crossfade", "Crossfade", "Two scenes dissolve into each other", "crossfade transition with gentle blending", PresetCategory::Basic),
    preset("slide", "Slide", "New scene slides in from the side", "smooth sliding transition from left to right", PresetCategory::Basic),
    preset("zoom", "Zoom", "Zoom in or out between scenes", "zoom in transition with smooth camera movement", PresetCategory::Basic),
    preset("camera-pan", "Camera pan", "Film-grade camera pan", "cinematic camera pan transition, smooth and professional", PresetCategory::Cinematic),
    preset("whip-pan", "Whip pan", "Fast whip pan", "fast whip pan transition with motion blur", PresetCategory::Cinematic),
    preset("dolly-zoom", "Dolly zoom", "Hitchcock-style push-pull", "dolly zoom effect transition, hitchcock style", PresetCategory::Cinematic),
    preset("match-cut", "Match cut", "Match on similar shapes", "match cut transition connecting similar shapes or movements", PresetCategory::Cinematic),
    preset("morph", "Morph", "Objects morph into each other", "smooth morphing transition between objects", PresetCategory::Creative),
    preset("particle", "Particles", "Scatter and reassemble", "particle dispersion and reconstruction transition", PresetCategory::Creative),
    preset("paint", "Watercolor", "Watercolor bleed", "watercolor paint spreading transition effect", PresetCategory::Creative),
    preset("glitch", "Glitch", "Digital glitch", "digital glitch transition with RGB split", PresetCategory::Creative),
];

/// Short style keywords offered next to the prompt editor.
pub const STYLE_KEYWORDS: &[&str] = &["cinematic", "slow shutter", "fast paced", "handheld"];

pub fn find_preset(id: &str) -> Option<&'static TransitionPreset> {
    TRANSITION_PRESETS.iter().find(|p| p.id == id)
}

pub fn presets_in(category: PresetCategory) -> impl Iterator<Item = &'static TransitionPreset> {
    TRANSITION_PRESETS.iter().filter(move |p| p.category == category)
}

/// Append `keyword` to `prompt` unless it already appears in it.
pub fn apply_preset_keyword(prompt: &str, keyword: &str) -> String {
    if prompt.contains(keyword) {
        prompt.to_string()
    } else if prompt.trim().is_empty() {
        keyword.to_string()
    } else {
        format!("{prompt}, {keyword}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preset_ids_are_unique() {
        let mut ids: Vec<_> = TRANSITION_PRESETS.iter().map(|p| p.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), TRANSITION_PRESETS.len());
    }

    #[test]
    fn each_category_has_four_presets() {
        for category in [PresetCategory::Basic, PresetCategory::Cinematic, PresetCategory::Creative] {
            assert_eq!(presets_in(category).count(), 4, "{}", category.label());
        }
    }

    #[test]
    fn find_preset_by_id() {
        assert_eq!(find_preset("whip-pan").unwrap().category, PresetCategory::Cinematic);
        assert!(find_preset("wipe").is_none());
    }

    #[test]
    fn keyword_appended_once() {
        assert_eq!(apply_preset_keyword("", "cinematic"), "cinematic");
        assert_eq!(apply_preset_keyword("drone shot", "cinematic"), "drone shot, cinematic");
        assert_eq!(
            apply_preset_keyword("drone shot, cinematic", "cinematic"),
            "drone shot, cinematic"
        );
    }
}
