//! Scene-anchored short-form video generation.
//!
//! A run turns a source image and a list of scene descriptions into video
//! clips, one remote generation job per scene, with the character rules
//! repeated in every prompt.

pub mod api;
pub mod cancel;
pub mod config;
pub mod dialogue;
pub mod error;
pub mod image;
pub mod prompt;
pub mod scene;
pub mod video;

pub use cancel::CancelToken;
pub use config::StudioConfig;
pub use error::{Result, StudioError};
