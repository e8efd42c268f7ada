use super::CharacterSheet;
use crate::scene::SECONDS_PER_SCENE;

impl CharacterSheet {
    fn render_speech_style(&self) -> String {
        let mascot = &self.voice.mascot;
        let mut out = format!("- {} speaks like {}.", mascot.name, mascot.voice);
        for t in &mascot.traits {
            out.push_str("\n- ");
            out.push_str(t);
        }
        out
    }

    /// Asks the text model for funny lines to add to the final clip.
    pub fn compose_dialogue_prompt<S: AsRef<str>>(&self, scene_texts: &[S]) -> String {
        let scene_list = scene_texts
            .iter()
            .enumerate()
            .map(|(i, p)| format!("{}. {}", i + 1, p.as_ref()))
            .collect::<Vec<_>>()
            .join("\n");
        let last = scene_texts.len();

        format!(
            "You are a short-form video content expert. Below are the prompts for {last} consecutive videos.\n\
             Analyze the last video (video {last}) and recommend **witty, funny lines** the characters could say.\n\
             \n\
             ## Video prompts:\n\
             {scene_list}\n\
             \n\
             ## Character notes:\n\
             - **{name}**: {appearance}.\n\
             {style}\n\
             - Keep lines short; a toddler never speaks in long sentences.\n\
             \n\
             ## Request:\n\
             1. First, define **3-5 evaluation criteria** for whether a line is witty and fun enough.\n\
             2. Then recommend **2-3 lines** that satisfy every criterion.\n\
             3. Lines spoken by {name} must follow the voice notes above exactly.\n\
             4. For each line give: the line (with the speaker), when it should be said \
             (video {last} is about {seconds} seconds long, 0-{seconds}), and why it is funny.\n\
             \n\
             ## Output format (JSON only, inside a markdown code block):\n\
             ```json\n\
             {{\n\
             \x20 \"evaluationCriteria\": [\"criterion 1: description\"],\n\
             \x20 \"recommendations\": [\n\
             \x20   {{ \"dialogue\": \"line (speaker)\", \"timingSeconds\": 2, \"reasoning\": \"why it is funny\" }}\n\
             \x20 ]\n\
             }}\n\
             ```",
            name = self.mascot_name(),
            appearance = self.posture.appearance,
            style = self.render_speech_style(),
            seconds = SECONDS_PER_SCENE,
        )
    }

    /// Asks the text model for fresh interview situations.
    pub fn compose_idea_prompt(&self) -> String {
        let name = self.mascot_name();
        format!(
            "You plan content for a short-form channel where a reporter interviews \"{name}\", {appearance}.\n\
             \n\
             ## Concept:\n\
             - The reporter holds a \"{label}\" {prop} and interviews {name} in different situations\n\
             - {name} answers cutely and unexpectedly, like a 4-year-old\n\
             - {name}'s last answer must always be witty and funny\n\
             \n\
             ## {name}'s speech:\n\
             {style}\n\
             \n\
             ## Request:\n\
             Suggest 5 varied, creative interview situations. Each must be fresh and fun, \
             and {name}'s final answer must be a witty, unexpected reply.\n\
             \n\
             ## Output format (JSON array):\n\
             ```json\n\
             [\n\
             \x20 {{\n\
             \x20   \"location\": \"place (e.g. amusement park, vet clinic, cafe)\",\n\
             \x20   \"time\": \"time of day (e.g. sunny afternoon, snowy evening)\",\n\
             \x20   \"situation\": \"short situation description\",\n\
             \x20   \"reporterDialogue\": \"the reporter's question\",\n\
             \x20   \"mascotDialogue\": \"{name}'s witty answer in toddler speech\"\n\
             \x20 }}\n\
             ]\n\
             ```",
            appearance = self.posture.appearance,
            label = self.branding.label,
            prop = self.branding.prop,
            style = self.render_speech_style(),
        )
    }
}

/// [`CharacterSheet::compose_dialogue_prompt`] with the default sheet.
pub fn compose_dialogue_prompt<S: AsRef<str>>(scene_texts: &[S]) -> String {
    CharacterSheet::default().compose_dialogue_prompt(scene_texts)
}

/// [`CharacterSheet::compose_idea_prompt`] with the default sheet.
pub fn compose_idea_prompt() -> String {
    CharacterSheet::default().compose_idea_prompt()
}
