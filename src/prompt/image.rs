use super::CharacterSheet;
use crate::scene::AspectRatio;

impl CharacterSheet {
    /// Prompt for the still a run is anchored to.
    ///
    /// With `has_character_reference` the model is told the first attached
    /// image shows the mascot and is given strict size and breed rules.
    pub fn compose_image_prompt(
        &self,
        location: &str,
        time: &str,
        situation: &str,
        aspect_ratio: AspectRatio,
        has_character_reference: bool,
    ) -> String {
        let name = self.mascot_name();
        let branding = self.render_branding();
        let orientation = aspect_ratio.orientation();
        let ratio = aspect_ratio.description();

        if has_character_reference {
            format!(
                "Look at the reference image carefully. This is \"{name}\", {appearance}. \
                 Create a high-quality, cinematic photograph with {ratio} aspect ratio based on these details:\n\
                 \n\
                 Location: {location}\n\
                 Time: {time}\n\
                 Situation: {situation}\n\
                 \n\
                 === CRITICAL CHARACTER REQUIREMENTS FOR \"{name}\" ===\n\
                 1. SIZE: {name} is a VERY SMALL dog, about 20-25cm tall, MUCH SMALLER than a human\n\
                 2. BREED: small white Pomeranian (NOT Samoyed, NOT Spitz, NOT any large breed)\n\
                 3. APPEARANCE: must match the reference image (fluffy white fur, round face, black button eyes)\n\
                 \x20  - Apply clothing exactly as the situation describes\n\
                 4. SCALE: when with humans, {name} is small enough to be held in arms or sit on a lap\n\
                 \n\
                 === REPORTER REQUIREMENT (MANDATORY) ===\n\
                 The reporter MUST be {reporter}.\n\
                 {branding}\n\
                 \n\
                 Style: Realistic, cinematic lighting, high resolution, detailed, Korean aesthetic, {orientation} composition",
                appearance = self.posture.appearance,
                reporter = self.voice.reporter.voice,
            )
        } else {
            format!(
                "Create a high-quality, cinematic photograph scene with {ratio} aspect ratio:\n\
                 Location: {location}\n\
                 Time: {time}\n\
                 Situation: {situation}\n\
                 \n\
                 === REPORTER REQUIREMENT (MANDATORY) ===\n\
                 If there is a reporter in the scene, the reporter MUST be {reporter}.\n\
                 {branding}\n\
                 \n\
                 Style: Realistic, cinematic lighting, high resolution, detailed, {orientation} composition for short-form video",
                reporter = self.voice.reporter.voice,
            )
        }
    }
}

/// [`CharacterSheet::compose_image_prompt`] with the default sheet.
pub fn compose_image_prompt(
    location: &str,
    time: &str,
    situation: &str,
    aspect_ratio: AspectRatio,
    has_character_reference: bool,
) -> String {
    CharacterSheet::default().compose_image_prompt(
        location,
        time,
        situation,
        aspect_ratio,
        has_character_reference,
    )
}
