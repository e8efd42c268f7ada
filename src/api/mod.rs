mod gemini;

pub use gemini::GeminiClient;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::error::Result;
use crate::scene::{AspectRatio, SourceImage};

/// Image bytes sent to or received from a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl From<&SourceImage> for InlineImage {
    fn from(image: &SourceImage) -> Self {
        Self {
            mime_type: image.mime_type.clone(),
            bytes: image.bytes.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImageRequest {
    pub prompt: String,
    /// Attached ahead of the prompt, in order.
    pub references: Vec<InlineImage>,
    pub aspect_ratio: AspectRatio,
}

#[derive(Debug, Clone)]
pub struct VideoRequest {
    pub prompt: String,
    pub image: InlineImage,
    pub aspect_ratio: AspectRatio,
    pub sample_count: u32,
    pub duration_seconds: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OperationError {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: String,
}

/// Handle of a long-running generation job.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Operation {
    pub name: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub response: Option<Value>,
    #[serde(default)]
    pub error: Option<OperationError>,
}

impl Operation {
    /// First generated media record of a finished job.
    ///
    /// The REST surface nests samples under `generateVideoResponse`; SDK-shaped
    /// payloads use `generatedVideos`. A record's `video` object is returned
    /// when present, otherwise the record itself.
    pub fn first_result(&self) -> Option<&Value> {
        let response = self.response.as_ref()?;
        let record = response
            .pointer("/generateVideoResponse/generatedSamples/0")
            .or_else(|| response.pointer("/generatedVideos/0"))
            .or_else(|| response.pointer("/videos/0"))?;
        Some(record.get("video").unwrap_or(record))
    }
}

/// Downloads media referenced by URI.
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    async fn fetch_media(&self, uri: &str) -> Result<Vec<u8>>;
}

/// The remote generative service.
#[async_trait]
pub trait GenerativeBackend: MediaFetcher {
    /// Single-shot image generation. Returns the inline image parts.
    async fn generate_image(&self, request: &ImageRequest) -> Result<Vec<InlineImage>>;

    /// Submits a video job.
    async fn start_video(&self, request: &VideoRequest) -> Result<Operation>;

    /// Re-reads the state of a submitted job.
    async fn poll_video(&self, operation: &Operation) -> Result<Operation>;

    async fn generate_text(&self, prompt: &str) -> Result<String>;
}
