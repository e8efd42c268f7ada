//! Single-shot text model features: dialogue suggestions for the final clip
//! and interview ideas.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::api::GenerativeBackend;
use crate::error::{Result, StudioError};
use crate::prompt::CharacterSheet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogueRecommendation {
    pub dialogue: String,
    #[serde(default)]
    pub timing_seconds: f64,
    #[serde(default)]
    pub reasoning: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogueAnalysis {
    #[serde(default)]
    pub evaluation_criteria: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<DialogueRecommendation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewIdea {
    pub location: String,
    pub time: String,
    pub situation: String,
    pub reporter_dialogue: String,
    #[serde(alias = "gooreumiDialogue")]
    pub mascot_dialogue: String,
}

/// Returns the JSON carried by a model reply.
///
/// The body of the first fenced code block wins; without a fence the whole
/// reply is used.
pub fn extract_json_block(text: &str) -> &str {
    let Some(open) = text.find("```") else {
        return text.trim();
    };
    let after_fence = &text[open + 3..];
    let body = after_fence.strip_prefix("json").unwrap_or(after_fence);
    match body.find("```") {
        Some(close) => body[..close].trim(),
        None => text.trim(),
    }
}

fn parse_reply<T: DeserializeOwned>(text: &str, what: &str) -> Result<T> {
    serde_json::from_str(extract_json_block(text)).map_err(|e| {
        warn!("Failed to parse {} response: {}", what, text);
        StudioError::Parse(format!("{what} response is not valid JSON: {e}"))
    })
}

/// Asks the text model for funny lines to add to the last clip.
pub async fn recommend_dialogue<S, P>(
    backend: &dyn GenerativeBackend,
    sheet: &CharacterSheet,
    scene_texts: &[S],
    mut on_progress: P,
) -> Result<DialogueAnalysis>
where
    S: AsRef<str> + Sync,
    P: FnMut(&str) + Send,
{
    if scene_texts.is_empty() {
        return Err(StudioError::Validation(
            "at least one scene is needed for dialogue suggestions".to_string(),
        ));
    }
    on_progress("Building evaluation criteria for dialogue...");
    let prompt = sheet.compose_dialogue_prompt(scene_texts);

    on_progress("Analyzing dialogue with the text model...");
    let reply = backend.generate_text(&prompt).await?;

    on_progress("Parsing response...");
    let analysis: DialogueAnalysis = parse_reply(&reply, "dialogue")?;
    info!(
        "Received {} dialogue recommendations",
        analysis.recommendations.len()
    );
    Ok(analysis)
}

/// Asks the text model for new interview situations.
pub async fn suggest_ideas<P>(
    backend: &dyn GenerativeBackend,
    sheet: &CharacterSheet,
    mut on_progress: P,
) -> Result<Vec<InterviewIdea>>
where
    P: FnMut(&str) + Send,
{
    on_progress("Generating ideas...");
    let reply = backend.generate_text(&sheet.compose_idea_prompt()).await?;

    on_progress("Parsing response...");
    let parsed: Value = parse_reply(&reply, "idea")?;
    let ideas = match parsed {
        Value::Array(_) => serde_json::from_value(parsed)
            .map_err(|e| StudioError::Parse(format!("idea response has an unexpected shape: {e}")))?,
        _ => Vec::new(),
    };
    info!("Received {} interview ideas", ideas.len());
    Ok(ideas)
}
