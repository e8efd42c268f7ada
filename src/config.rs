use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Result, StudioError};
use crate::video::PollPolicy;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_VIDEO_MODEL: &str = "veo-3.1-generate-preview";
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.0-flash";

/// Runtime settings, read from the environment and overridden by CLI flags.
#[derive(Debug, Clone)]
pub struct StudioConfig {
    pub api_key: String,
    pub api_base: String,
    pub image_model: String,
    pub video_model: String,
    pub text_model: String,
    pub poll: PollPolicy,
    /// Photo of the mascot, attached to image requests that mention it
    pub character_reference: Option<PathBuf>,
    pub work_dir: PathBuf,
}

impl StudioConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let interval_secs = match get("STUDIO_POLL_INTERVAL_SECS") {
            Some(v) => v.trim().parse::<u64>().map_err(|_| {
                StudioError::Config(format!("STUDIO_POLL_INTERVAL_SECS is not a number: {v}"))
            })?,
            None => PollPolicy::DEFAULT_INTERVAL.as_secs(),
        };
        let max_polls = match get("STUDIO_MAX_POLLS") {
            Some(v) if v.trim().eq_ignore_ascii_case("unbounded") => None,
            Some(v) => Some(v.trim().parse::<u32>().map_err(|_| {
                StudioError::Config(format!("STUDIO_MAX_POLLS is not a number: {v}"))
            })?),
            None => PollPolicy::default().max_polls,
        };

        Ok(Self {
            api_key: get("GEMINI_API_KEY").unwrap_or_default(),
            api_base: get("STUDIO_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            image_model: get("STUDIO_IMAGE_MODEL").unwrap_or_else(|| DEFAULT_IMAGE_MODEL.to_string()),
            video_model: get("STUDIO_VIDEO_MODEL").unwrap_or_else(|| DEFAULT_VIDEO_MODEL.to_string()),
            text_model: get("STUDIO_TEXT_MODEL").unwrap_or_else(|| DEFAULT_TEXT_MODEL.to_string()),
            poll: PollPolicy {
                interval: Duration::from_secs(interval_secs),
                max_polls,
            },
            character_reference: get("STUDIO_CHARACTER_REFERENCE").map(PathBuf::from),
            work_dir: get("STUDIO_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./output")),
        })
    }

    /// Fails before any remote call when the credential is missing.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(StudioError::Validation(
                "GEMINI_API_KEY not found. Set it via --api-key or the GEMINI_API_KEY environment variable"
                    .to_string(),
            ));
        }
        Ok(())
    }
}
