//! The scene still that every clip of a run is anchored to.

use std::path::Path;

use tracing::info;

use crate::api::{GenerativeBackend, ImageRequest, InlineImage};
use crate::error::{Result, StudioError};
use crate::prompt::CharacterSheet;
use crate::scene::{mime_type_for, AspectRatio, SourceImage};

#[derive(Debug, Clone)]
pub struct SceneImageRequest {
    pub location: String,
    pub time: String,
    pub situation: String,
    pub aspect_ratio: AspectRatio,
    /// Photo of the mascot; attached only when the situation names it
    pub character_reference: Option<InlineImage>,
    /// Mood and lighting reference supplied by the user
    pub situation_reference: Option<InlineImage>,
}

/// Reads a reference image from disk.
pub async fn load_reference(path: &Path) -> Result<InlineImage> {
    let bytes = tokio::fs::read(path).await?;
    if bytes.is_empty() {
        return Err(StudioError::Validation(format!(
            "reference image is empty: {}",
            path.display()
        )));
    }
    Ok(InlineImage {
        mime_type: mime_type_for(path).to_string(),
        bytes,
    })
}

fn uses_character_reference(sheet: &CharacterSheet, request: &SceneImageRequest) -> bool {
    request.character_reference.is_some() && request.situation.contains(sheet.mascot_name())
}

fn build_request(sheet: &CharacterSheet, request: &SceneImageRequest) -> ImageRequest {
    let character_reference = request
        .character_reference
        .as_ref()
        .filter(|_| uses_character_reference(sheet, request));

    let mut prompt = sheet.compose_image_prompt(
        &request.location,
        &request.time,
        &request.situation,
        request.aspect_ratio,
        character_reference.is_some(),
    );

    match (&character_reference, &request.situation_reference) {
        (Some(_), Some(_)) => prompt.push_str(
            "\n\n=== ADDITIONAL REFERENCE IMAGE ===\n\
             Also refer to the second image as a style/situation reference. \
             Match the overall mood, lighting, and atmosphere from this reference while creating the scene.",
        ),
        (None, Some(_)) => prompt.push_str(
            "\n\n=== REFERENCE IMAGE ===\n\
             Refer to the provided image as a style/situation reference. \
             Match the overall mood, lighting, composition, and atmosphere from this reference while creating the scene.",
        ),
        _ => {}
    }

    let references = character_reference
        .into_iter()
        .chain(request.situation_reference.as_ref())
        .cloned()
        .collect();

    ImageRequest {
        prompt,
        references,
        aspect_ratio: request.aspect_ratio,
    }
}

/// Generates the scene still from its location, time and situation.
pub async fn generate_scene_image<P>(
    backend: &dyn GenerativeBackend,
    sheet: &CharacterSheet,
    request: &SceneImageRequest,
    mut on_progress: P,
) -> Result<SourceImage>
where
    P: FnMut(&str) + Send,
{
    if uses_character_reference(sheet, request) {
        on_progress("Applying character reference image...");
    }
    let image_request = build_request(sheet, request);

    on_progress("Requesting scene image...");
    let images = backend.generate_image(&image_request).await?;

    on_progress("Processing image...");
    let image = images.into_iter().next().ok_or_else(|| {
        StudioError::Remote("image generation failed: response contained no image".to_string())
    })?;
    info!("Generated scene image ({} bytes, {})", image.bytes.len(), image.mime_type);

    on_progress("Image generation complete!");
    Ok(SourceImage {
        bytes: image.bytes,
        mime_type: image.mime_type,
        aspect_ratio: request.aspect_ratio,
    })
}
