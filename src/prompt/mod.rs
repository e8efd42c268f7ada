//! Prompt text for the image, video and text models.
//!
//! Clips are generated by independent remote jobs that share nothing but the
//! source image, so the character rules are repeated in every prompt. The
//! rules live in a [`CharacterSheet`] and are rendered here.

mod image;
mod text;
mod video;

pub use image::compose_image_prompt;
pub use text::{compose_dialogue_prompt, compose_idea_prompt};
pub use video::{compose_scene_prompt, compose_unified_prompt, scene_windows, TimeWindow};

use serde::{Deserialize, Serialize};

/// Heads the full voice block of the first scene.
pub const INTRODUCTION_MARKER: &str = "VOICE INTRODUCTION";
/// Heads the voice-matching block of every later scene.
pub const CONTINUATION_MARKER: &str = "CONTINUATION";
pub const NO_SMILE_MARKER: &str = "No smiling in this scene";
pub const SMILE_AFTER_DIALOGUE_MARKER: &str = "Smile together only AFTER the dialogue ends";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterVoice {
    pub name: String,
    pub voice: String,
    pub traits: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceProfile {
    pub mascot: CharacterVoice,
    pub reporter: CharacterVoice,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandingRequirement {
    /// Text that must be readable on the prop
    pub label: String,
    pub prop: String,
    pub holder: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostureRule {
    pub posture: String,
    pub appearance: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpressionRule {
    pub smile_only_in_final_scene: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpressionDirective {
    NoSmile,
    SmileAfterDialogue,
    Unrestricted,
}

impl ExpressionRule {
    pub fn directive_for(&self, is_last_scene: bool) -> ExpressionDirective {
        match (self.smile_only_in_final_scene, is_last_scene) {
            (false, _) => ExpressionDirective::Unrestricted,
            (true, false) => ExpressionDirective::NoSmile,
            (true, true) => ExpressionDirective::SmileAfterDialogue,
        }
    }
}

/// Voice, branding, posture and expression rules shared by every prompt of a
/// run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterSheet {
    pub voice: VoiceProfile,
    pub branding: BrandingRequirement,
    pub posture: PostureRule,
    pub expression: ExpressionRule,
}

impl Default for CharacterSheet {
    fn default() -> Self {
        Self {
            voice: VoiceProfile {
                mascot: CharacterVoice {
                    name: "Gooreum-i".to_string(),
                    voice: "a VERY HIGH-PITCHED 4-year-old Korean baby girl voice".to_string(),
                    traits: vec![
                        "Pitch: EXTREMELY HIGH like a real toddler (NOT an adult pretending)".to_string(),
                        "Pronunciation: cute baby lisp (joa instead of choa, meohae instead of mwohae)".to_string(),
                        "Style: \"joa-joa~!\", \"hehe~\", \"ehehe~\", short sentences ending in \"~yo\"".to_string(),
                        "Never mature, never grown-up sounding".to_string(),
                    ],
                },
                reporter: CharacterVoice {
                    name: "Reporter".to_string(),
                    voice: "a 20-year-old Korean female reporter".to_string(),
                    traits: vec![
                        "Young, bright and lively".to_string(),
                        "Professional yet youthful broadcasting voice".to_string(),
                    ],
                },
            },
            branding: BrandingRequirement {
                label: "Gureumi TV".to_string(),
                prop: "microphone".to_string(),
                holder: "the reporter".to_string(),
            },
            posture: PostureRule {
                posture: "must stay SEATED or LYING DOWN (never standing up)".to_string(),
                appearance: "a small cute white Pomeranian (apply clothing from the scene description)"
                    .to_string(),
            },
            expression: ExpressionRule {
                smile_only_in_final_scene: true,
            },
        }
    }
}

impl CharacterSheet {
    pub fn mascot_name(&self) -> &str {
        &self.voice.mascot.name
    }

    pub(crate) fn render_voice(voice: &CharacterVoice) -> String {
        let mut out = format!("{}: {}", voice.name, voice.voice);
        for t in &voice.traits {
            out.push_str("\n   - ");
            out.push_str(t);
        }
        out
    }

    pub(crate) fn render_branding(&self) -> String {
        let b = &self.branding;
        format!(
            "{holder} MUST hold a {prop} with \"{label}\" CLEARLY VISIBLE on it\n\
             - The text \"{label}\" must be readable and face the camera\n\
             - This is a branding requirement - DO NOT skip this!",
            holder = capitalize(&b.holder),
            prop = b.prop,
            label = b.label,
        )
    }

    pub(crate) fn render_posture(&self) -> String {
        let name = self.mascot_name();
        format!(
            "=== POSTURE & APPEARANCE ===\n\
             - {name} {}\n\
             - {name} is {}",
            self.posture.posture, self.posture.appearance
        )
    }

    pub(crate) fn render_expression(&self, is_last_scene: bool) -> Option<String> {
        match self.expression.directive_for(is_last_scene) {
            ExpressionDirective::NoSmile => Some(format!(
                "=== EXPRESSION ===\n- {NO_SMILE_MARKER} (smiles are saved for the final scene)"
            )),
            ExpressionDirective::SmileAfterDialogue => Some(format!(
                "=== FINAL SCENE ===\n- {SMILE_AFTER_DIALOGUE_MARKER}"
            )),
            ExpressionDirective::Unrestricted => None,
        }
    }

    pub(crate) fn render_dialogue_rule(&self) -> String {
        format!(
            "=== DIALOGUE ===\n- The {} stays near the speaking character's mouth",
            self.branding.prop
        )
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
