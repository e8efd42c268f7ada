use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info};

use super::{GenerativeBackend, ImageRequest, InlineImage, MediaFetcher, Operation, VideoRequest};
use crate::config::StudioConfig;
use crate::error::{Result, StudioError};

/// Client for the Generative Language REST API.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    api_key: String,
    api_base: String,
    image_model: String,
    video_model: String,
    text_model: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    text: Option<String>,
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: Option<String>,
    data: String,
}

impl GeminiClient {
    pub fn new(config: &StudioConfig) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(300)).build()?;

        Ok(Self {
            api_key: config.api_key.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            image_model: config.image_model.clone(),
            video_model: config.video_model.clone(),
            text_model: config.text_model.clone(),
            client,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path.trim_start_matches('/'))
    }

    async fn check(response: Response, context: &str) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let error_text = response.text().await?;
        Err(StudioError::Remote(format!(
            "{context} failed (HTTP {status}): {error_text}"
        )))
    }

    async fn generate_content(&self, model: &str, body: &Value) -> Result<Vec<Part>> {
        let response = self
            .client
            .post(self.endpoint(&format!("models/{model}:generateContent")))
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await?;
        let response = Self::check(response, "generateContent").await?;

        let parsed: GenerateContentResponse = response.json().await?;
        Ok(parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts)
            .unwrap_or_default())
    }
}

fn with_key(uri: &str, api_key: &str) -> String {
    let separator = if uri.contains('?') { '&' } else { '?' };
    format!("{uri}{separator}key={api_key}")
}

#[async_trait]
impl MediaFetcher for GeminiClient {
    async fn fetch_media(&self, uri: &str) -> Result<Vec<u8>> {
        info!("Downloading media from: {}", uri);
        let response = self
            .client
            .get(with_key(uri, &self.api_key))
            .header("Accept", "video/mp4,video/*,*/*")
            .send()
            .await?;
        let response = Self::check(response, "Media download").await?;
        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl GenerativeBackend for GeminiClient {
    async fn generate_image(&self, request: &ImageRequest) -> Result<Vec<InlineImage>> {
        info!("Requesting image from {}", self.image_model);

        let mut parts: Vec<Value> = request
            .references
            .iter()
            .map(|r| {
                json!({
                    "inlineData": { "mimeType": r.mime_type, "data": STANDARD.encode(&r.bytes) }
                })
            })
            .collect();
        parts.push(json!({ "text": request.prompt }));

        let body = json!({
            "contents": [{ "parts": parts }],
            "generationConfig": {
                "responseModalities": ["TEXT", "IMAGE"],
                "imageConfig": { "aspectRatio": request.aspect_ratio.as_str() }
            }
        });

        let mut images = Vec::new();
        for part in self.generate_content(&self.image_model, &body).await? {
            if let Some(text) = part.text {
                debug!("Image model text: {}", text);
            }
            if let Some(inline) = part.inline_data {
                let bytes = STANDARD.decode(inline.data.trim()).map_err(|e| {
                    StudioError::Remote(format!("image part is not valid base64: {e}"))
                })?;
                images.push(InlineImage {
                    mime_type: inline.mime_type.unwrap_or_else(|| "image/png".to_string()),
                    bytes,
                });
            }
        }
        Ok(images)
    }

    async fn start_video(&self, request: &VideoRequest) -> Result<Operation> {
        let mut parameters = json!({
            "aspectRatio": request.aspect_ratio.as_str(),
            "sampleCount": request.sample_count,
        });
        if let Some(seconds) = request.duration_seconds {
            parameters["durationSeconds"] = json!(seconds);
        }

        let body = json!({
            "instances": [{
                "prompt": request.prompt,
                "image": {
                    "bytesBase64Encoded": STANDARD.encode(&request.image.bytes),
                    "mimeType": request.image.mime_type
                }
            }],
            "parameters": parameters
        });

        let response = self
            .client
            .post(self.endpoint(&format!("models/{}:predictLongRunning", self.video_model)))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;
        let response = Self::check(response, "Video generation").await?;

        let operation: Operation = response.json().await?;
        info!("Video generation task submitted: {}", operation.name);
        Ok(operation)
    }

    async fn poll_video(&self, operation: &Operation) -> Result<Operation> {
        let response = self
            .client
            .get(self.endpoint(&operation.name))
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await?;
        let response = Self::check(response, "Operation status").await?;
        Ok(response.json().await?)
    }

    async fn generate_text(&self, prompt: &str) -> Result<String> {
        let body = json!({ "contents": [{ "parts": [{ "text": prompt }] }] });
        let text = self
            .generate_content(&self.text_model, &body)
            .await?
            .into_iter()
            .filter_map(|p| p.text)
            .collect::<Vec<_>>()
            .join("");

        if text.trim().is_empty() {
            return Err(StudioError::Remote("text model returned no text".to_string()));
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_appended_to_uri() {
        assert_eq!(
            with_key("https://host/files/v.mp4", "k1"),
            "https://host/files/v.mp4?key=k1"
        );
        assert_eq!(
            with_key("https://host/files/v.mp4?alt=media", "k1"),
            "https://host/files/v.mp4?alt=media&key=k1"
        );
    }

    #[test]
    fn parses_inline_image_parts() {
        let raw = r#"{
            "candidates": [{
                "content": { "parts": [
                    { "text": "Here you go" },
                    { "inlineData": { "mimeType": "image/png", "data": "iVBO" } }
                ] }
            }]
        }"#;
        let parsed: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        let parts = &parsed.candidates[0].content.as_ref().unwrap().parts;
        assert_eq!(parts[0].text.as_deref(), Some("Here you go"));
        assert_eq!(parts[1].inline_data.as_ref().unwrap().data, "iVBO");
    }
}
