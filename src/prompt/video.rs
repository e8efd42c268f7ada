use super::{
    CharacterSheet, ExpressionDirective, CONTINUATION_MARKER, INTRODUCTION_MARKER, NO_SMILE_MARKER,
};

/// Time span of one scene inside a combined clip, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeWindow {
    pub start: f64,
    pub end: f64,
}

/// Splits `total_seconds` evenly across `scene_count` scenes.
pub fn scene_windows(total_seconds: u32, scene_count: usize) -> Vec<TimeWindow> {
    if scene_count == 0 {
        return Vec::new();
    }
    let per_scene = f64::from(total_seconds) / scene_count as f64;
    (0..scene_count)
        .map(|k| TimeWindow {
            start: k as f64 * per_scene,
            end: (k + 1) as f64 * per_scene,
        })
        .collect()
}

fn fmt_seconds(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}

impl CharacterSheet {
    /// Prompt for one clip of a sequential run.
    pub fn compose_scene_prompt(
        &self,
        scene_text: &str,
        scene_index: usize,
        total_scenes: usize,
        is_last_scene: bool,
    ) -> String {
        let mascot = &self.voice.mascot;
        let reporter = &self.voice.reporter;
        let mut prompt = if scene_index == 1 {
            format!(
                "*** {INTRODUCTION_MARKER}: {mascot_name} ***\n\
                 Voice for {mascot_name}: Use {mascot_voice}.\n\
                 - This voice MUST stay EXACTLY the same in every later scene!\n\
                 \n\
                 [SCENE {scene_index}/{total_scenes}]\n\
                 {scene_text}\n\
                 \n\
                 === VOICE RULES ===\n\
                 1. {mascot_block}\n\
                 \n\
                 2. {reporter_block}\n\
                 \n\
                 === BRANDING ===\n\
                 {branding}",
                mascot_name = mascot.name,
                mascot_voice = mascot.voice,
                mascot_block = Self::render_voice(mascot),
                reporter_block = Self::render_voice(reporter),
                branding = self.render_branding(),
            )
        } else {
            format!(
                "!!! IMPORTANT: keep {mascot_name}'s voice EXACTLY as in Scene 1 !!!\n\
                 Continue {mascot_name}'s voice EXACTLY from Scene 1:\n\
                 - SAME pitch as Scene 1 ({mascot_voice})\n\
                 - SAME speaking style as Scene 1\n\
                 - DO NOT change the pitch or register. DO NOT make the voice deeper or more mature!\n\
                 - If the voice changes at all = REJECTED\n\
                 \n\
                 [SCENE {scene_index}/{total_scenes}] - {CONTINUATION_MARKER}\n\
                 {scene_text}\n\
                 \n\
                 === VOICE {CONTINUATION_MARKER} ===\n\
                 1. {mascot_name} voice = 100% IDENTICAL to Scene 1\n\
                 \x20  - Same HIGH pitch, same speech pattern\n\
                 \x20  - NEVER deeper, NEVER more mature\n\
                 \n\
                 2. {reporter_name} voice = identical to Scene 1 ({reporter_voice})\n\
                 \n\
                 === BRANDING ===\n\
                 {branding}",
                mascot_name = mascot.name,
                mascot_voice = mascot.voice,
                reporter_name = reporter.name,
                reporter_voice = reporter.voice,
                branding = self.render_branding(),
            )
        };

        prompt.push_str("\n\n");
        prompt.push_str(&self.render_posture());

        if scene_text.contains('"') {
            prompt.push_str("\n\n");
            prompt.push_str(&self.render_dialogue_rule());
        }

        if let Some(expression) = self.render_expression(is_last_scene) {
            prompt.push_str("\n\n");
            prompt.push_str(&expression);
        }

        prompt.push_str(&format!(
            "\n\n=== FINAL CHECK ===\n\
             - {} voice = {} (same as Scene 1)",
            mascot.name, mascot.voice
        ));

        prompt
    }

    /// Prompt for one clip covering every scene of the run.
    pub fn compose_unified_prompt<S: AsRef<str>>(&self, scene_texts: &[S], total_seconds: u32) -> String {
        let scene_count = scene_texts.len();
        let windows = scene_windows(total_seconds, scene_count);
        let per_scene = windows
            .first()
            .map(|w| w.end - w.start)
            .unwrap_or_default();

        let scenes = scene_texts
            .iter()
            .zip(&windows)
            .enumerate()
            .map(|(k, (text, window))| {
                let mut block = format!(
                    "[Scene {}] ({}s - {}s)\n{}",
                    k + 1,
                    fmt_seconds(window.start),
                    fmt_seconds(window.end),
                    text.as_ref(),
                );
                match self.expression.directive_for(k + 1 == scene_count) {
                    ExpressionDirective::NoSmile => block.push_str(&format!("\n({NO_SMILE_MARKER})")),
                    ExpressionDirective::SmileAfterDialogue => {
                        block.push_str("\n(Smile together brightly only after the dialogue ends)")
                    }
                    ExpressionDirective::Unrestricted => {}
                }
                block
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        let mascot = &self.voice.mascot;
        format!(
            "*** IMPORTANT: generate ONE {total_seconds}-second video ***\n\
             The video has {scene_count} scenes of about {per_scene}s each.\n\
             \n\
             === CHARACTER VOICES (keep consistent for the whole video!) ===\n\
             \n\
             1. {mascot_block}\n\
             \n\
             2. {reporter_block}\n\
             \n\
             === RULES ===\n\
             {branding}\n\
             \n\
             {posture}\n\
             \n\
             {dialogue}\n\
             \n\
             === SCENES ({total_seconds}-second video) ===\n\
             \n\
             {scenes}\n\
             \n\
             === FINAL CHECK ===\n\
             - Total length: {total_seconds}s\n\
             - {mascot_name} voice stays {mascot_voice} for the whole video\n\
             - Reporter voice stays the same for the whole video{smile_check}",
            per_scene = fmt_seconds(per_scene),
            mascot_block = Self::render_voice(mascot),
            reporter_block = Self::render_voice(&self.voice.reporter),
            branding = self.render_branding(),
            posture = self.render_posture(),
            dialogue = self.render_dialogue_rule(),
            mascot_name = mascot.name,
            mascot_voice = mascot.voice,
            smile_check = if self.expression.smile_only_in_final_scene {
                "\n- Smile together only in the final scene"
            } else {
                ""
            },
        )
    }
}

/// [`CharacterSheet::compose_scene_prompt`] with the default sheet.
pub fn compose_scene_prompt(
    scene_text: &str,
    scene_index: usize,
    total_scenes: usize,
    is_last_scene: bool,
) -> String {
    CharacterSheet::default().compose_scene_prompt(scene_text, scene_index, total_scenes, is_last_scene)
}

/// [`CharacterSheet::compose_unified_prompt`] with the default sheet.
pub fn compose_unified_prompt<S: AsRef<str>>(scene_texts: &[S], total_seconds: u32) -> String {
    CharacterSheet::default().compose_unified_prompt(scene_texts, total_seconds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::SMILE_AFTER_DIALOGUE_MARKER;

    #[test]
    fn first_scene_introduces_voice() {
        for total in 1..=4 {
            let prompt = compose_scene_prompt("A dog runs", 1, total, total == 1);
            assert!(prompt.contains(INTRODUCTION_MARKER));
            assert!(!prompt.contains(CONTINUATION_MARKER));
            assert!(prompt.contains(&format!("[SCENE 1/{total}]")));
        }
    }

    #[test]
    fn later_scenes_continue_voice() {
        for total in 2..=4 {
            for index in 2..=total {
                let prompt = compose_scene_prompt("A dog barks", index, total, index == total);
                assert!(prompt.contains(CONTINUATION_MARKER));
                assert!(!prompt.contains(INTRODUCTION_MARKER));
                assert!(prompt.contains("DO NOT change the pitch or register"));
            }
        }
    }

    #[test]
    fn smiling_only_in_final_scene() {
        for total in 1..=4 {
            for index in 1..=total {
                let last = index == total;
                let prompt = compose_scene_prompt("scene", index, total, last);
                assert_eq!(prompt.contains(NO_SMILE_MARKER), !last);
                assert_eq!(prompt.contains(SMILE_AFTER_DIALOGUE_MARKER), last);
            }
        }
    }

    #[test]
    fn smile_rule_follows_dialogue_rule() {
        let prompt = compose_scene_prompt("Reporter: \"How was your day?\"", 2, 2, true);
        let dialogue = prompt.find("=== DIALOGUE ===").unwrap();
        let smile = prompt.find(SMILE_AFTER_DIALOGUE_MARKER).unwrap();
        assert!(dialogue < smile);

        let quiet = compose_scene_prompt("The dog naps", 2, 2, true);
        assert!(!quiet.contains("=== DIALOGUE ==="));
    }

    #[test]
    fn scene_prompt_is_deterministic_and_keeps_text() {
        let a = compose_scene_prompt("A dog runs on the beach", 1, 3, false);
        let b = compose_scene_prompt("A dog runs on the beach", 1, 3, false);
        assert_eq!(a, b);
        assert!(a.contains("A dog runs on the beach"));
        assert!(a.contains("Gureumi TV"));
    }

    #[test]
    fn windows_split_duration_evenly() {
        let windows = scene_windows(32, 4);
        assert_eq!(windows.len(), 4);
        for (k, w) in windows.iter().enumerate() {
            assert_eq!(w.start, k as f64 * 8.0);
            assert_eq!(w.end, (k + 1) as f64 * 8.0);
        }
        assert!(scene_windows(16, 0).is_empty());
    }

    #[test]
    fn unified_prompt_keeps_scene_order_and_text() {
        let scenes = ["A dog runs", "A dog barks", "A dog sleeps"];
        let prompt = compose_unified_prompt(&scenes, 24);

        let positions: Vec<usize> = scenes.iter().map(|s| prompt.find(s).unwrap()).collect();
        assert!(positions.windows(2).all(|p| p[0] < p[1]));

        assert!(prompt.contains("[Scene 1] (0s - 8s)"));
        assert!(prompt.contains("[Scene 2] (8s - 16s)"));
        assert!(prompt.contains("[Scene 3] (16s - 24s)"));
        assert_eq!(prompt.matches(NO_SMILE_MARKER).count(), 2);
        assert_eq!(prompt.matches("=== CHARACTER VOICES").count(), 1);
    }

    #[test]
    fn unified_prompt_drops_smile_hints_when_unrestricted() {
        let mut sheet = CharacterSheet::default();
        sheet.expression.smile_only_in_final_scene = false;

        let prompt = sheet.compose_unified_prompt(&["A dog runs", "A dog barks"], 16);
        assert!(!prompt.contains(NO_SMILE_MARKER));
        assert!(!prompt.contains("Smile together"));

        let strict = compose_unified_prompt(&["A dog runs", "A dog barks"], 16);
        assert_eq!(strict.matches("Smile together brightly only after the dialogue ends").count(), 1);
        assert!(strict.contains("- Smile together only in the final scene"));
    }

    #[test]
    fn unified_prompt_formats_fractional_windows() {
        let prompt = compose_unified_prompt(&["a", "b", "c"], 32);
        assert!(prompt.contains("[Scene 2] (10.7s - 21.3s)"));
    }
}
