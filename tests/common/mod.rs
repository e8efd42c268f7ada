#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use scene_studio::api::{
    GenerativeBackend, ImageRequest, InlineImage, MediaFetcher, Operation, OperationError,
    VideoRequest,
};
use scene_studio::scene::{AspectRatio, SourceImage};
use scene_studio::{CancelToken, Result, StudioError};
use serde_json::{json, Value};

/// How finished jobs hand back their media.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    InlineBytes,
    Uri,
    Nothing,
}

/// In-memory backend that plays out a fixed script for every job.
pub struct ScriptedBackend {
    polls_until_done: u32,
    delivery: Delivery,
    fail_submit: Option<usize>,
    fail_poll: Option<usize>,
    operation_error: Option<usize>,
    cancel_while_polling: Option<(usize, CancelToken)>,
    text_reply: String,
    image_parts: Vec<InlineImage>,
    submitted: Mutex<Vec<VideoRequest>>,
    poll_counts: Mutex<HashMap<String, u32>>,
    fetched: Mutex<Vec<String>>,
    image_requests: Mutex<Vec<ImageRequest>>,
    text_prompts: Mutex<Vec<String>>,
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self {
            polls_until_done: 2,
            delivery: Delivery::InlineBytes,
            fail_submit: None,
            fail_poll: None,
            operation_error: None,
            cancel_while_polling: None,
            text_reply: String::new(),
            image_parts: Vec::new(),
            submitted: Mutex::new(Vec::new()),
            poll_counts: Mutex::new(HashMap::new()),
            fetched: Mutex::new(Vec::new()),
            image_requests: Mutex::new(Vec::new()),
            text_prompts: Mutex::new(Vec::new()),
        }
    }
}

pub fn clip_bytes(job: usize) -> Vec<u8> {
    format!("clip-{job}").into_bytes()
}

fn job_number(name: &str) -> usize {
    name.rsplit('-')
        .next()
        .and_then(|n| n.parse().ok())
        .unwrap_or_default()
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn polls_until_done(mut self, polls: u32) -> Self {
        self.polls_until_done = polls;
        self
    }

    pub fn delivery(mut self, delivery: Delivery) -> Self {
        self.delivery = delivery;
        self
    }

    /// Rejects the submission of the given 1-based job.
    pub fn fail_submit(mut self, job: usize) -> Self {
        self.fail_submit = Some(job);
        self
    }

    /// Rejects every status poll of the given job.
    pub fn fail_poll(mut self, job: usize) -> Self {
        self.fail_poll = Some(job);
        self
    }

    /// Finishes the given job with an operation error.
    pub fn operation_error(mut self, job: usize) -> Self {
        self.operation_error = Some(job);
        self
    }

    /// Sets the token during the first poll of the given job.
    pub fn cancel_while_polling(mut self, job: usize, token: CancelToken) -> Self {
        self.cancel_while_polling = Some((job, token));
        self
    }

    pub fn text_reply(mut self, reply: &str) -> Self {
        self.text_reply = reply.to_string();
        self
    }

    pub fn image_parts(mut self, parts: Vec<InlineImage>) -> Self {
        self.image_parts = parts;
        self
    }

    pub fn submitted(&self) -> Vec<VideoRequest> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }

    pub fn image_requests(&self) -> Vec<ImageRequest> {
        self.image_requests.lock().unwrap().clone()
    }

    pub fn text_prompts(&self) -> Vec<String> {
        self.text_prompts.lock().unwrap().clone()
    }

    fn operation(&self, job: usize, polls: u32) -> Operation {
        let name = format!("operations/job-{job}");
        if polls < self.polls_until_done {
            return Operation {
                name,
                done: false,
                response: None,
                error: None,
            };
        }
        if self.operation_error == Some(job) {
            return Operation {
                name,
                done: true,
                response: None,
                error: Some(OperationError {
                    code: Some(400),
                    message: "safety filter triggered".to_string(),
                }),
            };
        }
        let video: Value = match self.delivery {
            Delivery::InlineBytes => json!({ "videoBytes": STANDARD.encode(clip_bytes(job)), "mimeType": "video/mp4" }),
            Delivery::Uri => json!({ "uri": format!("https://media.test/files/job-{job}:download?alt=media") }),
            Delivery::Nothing => json!({ "mimeType": "video/mp4" }),
        };
        Operation {
            name,
            done: true,
            response: Some(json!({
                "generateVideoResponse": { "generatedSamples": [ { "video": video } ] }
            })),
            error: None,
        }
    }
}

#[async_trait]
impl MediaFetcher for ScriptedBackend {
    async fn fetch_media(&self, uri: &str) -> Result<Vec<u8>> {
        self.fetched.lock().unwrap().push(uri.to_string());
        let job = uri
            .split("job-")
            .nth(1)
            .and_then(|rest| rest.split(':').next())
            .and_then(|n| n.parse().ok())
            .ok_or_else(|| StudioError::Remote(format!("unknown uri {uri}")))?;
        Ok(clip_bytes(job))
    }
}

#[async_trait]
impl GenerativeBackend for ScriptedBackend {
    async fn generate_image(&self, request: &ImageRequest) -> Result<Vec<InlineImage>> {
        self.image_requests.lock().unwrap().push(request.clone());
        Ok(self.image_parts.clone())
    }

    async fn start_video(&self, request: &VideoRequest) -> Result<Operation> {
        let job = {
            let mut submitted = self.submitted.lock().unwrap();
            submitted.push(request.clone());
            submitted.len()
        };
        if self.fail_submit == Some(job) {
            return Err(StudioError::Remote("quota exceeded".to_string()));
        }
        Ok(self.operation(job, 0))
    }

    async fn poll_video(&self, operation: &Operation) -> Result<Operation> {
        let job = job_number(&operation.name);
        let polls = {
            let mut counts = self.poll_counts.lock().unwrap();
            let count = counts.entry(operation.name.clone()).or_insert(0);
            *count += 1;
            *count
        };
        if let Some((cancel_job, token)) = &self.cancel_while_polling {
            if *cancel_job == job {
                token.cancel();
            }
        }
        if self.fail_poll == Some(job) {
            return Err(StudioError::Remote("network unreachable".to_string()));
        }
        Ok(self.operation(job, polls))
    }

    async fn generate_text(&self, prompt: &str) -> Result<String> {
        self.text_prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.text_reply.clone())
    }
}

pub fn source_image() -> SourceImage {
    SourceImage {
        bytes: vec![0x89, b'P', b'N', b'G'],
        mime_type: "image/png".to_string(),
        aspect_ratio: AspectRatio::Portrait,
    }
}
