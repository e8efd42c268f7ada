use thiserror::Error;

#[derive(Error, Debug)]
pub enum StudioError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Generation stopped")]
    Cancelled,

    #[error("Could not extract media from response. Available fields: {}", display_fields(.fields))]
    Extraction { fields: Vec<String> },

    #[error("API error: {0}")]
    Remote(String),

    #[error("Scene {index} failed: {source}")]
    Scene {
        index: usize,
        #[source]
        source: Box<StudioError>,
    },

    #[error("Operation still running after {polls} polls")]
    PollTimeout { polls: u32 },

    #[error("Failed to parse model response: {0}")]
    Parse(String),

    #[error("Invalid run transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl StudioError {
    /// Wraps an error with the 1-based scene index it occurred in.
    pub fn in_scene(self, index: usize) -> Self {
        match self {
            StudioError::Cancelled => StudioError::Cancelled,
            other => StudioError::Scene {
                index,
                source: Box::new(other),
            },
        }
    }

    pub fn is_cancellation(&self) -> bool {
        match self {
            StudioError::Cancelled => true,
            StudioError::Scene { source, .. } => source.is_cancellation(),
            _ => false,
        }
    }

    /// Scene index carried by a per-scene failure.
    pub fn scene_index(&self) -> Option<usize> {
        match self {
            StudioError::Scene { index, .. } => Some(*index),
            _ => None,
        }
    }
}

fn display_fields(fields: &[String]) -> String {
    if fields.is_empty() {
        "none".to_string()
    } else {
        fields.join(", ")
    }
}

pub type Result<T> = std::result::Result<T, StudioError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scene_error_names_index() {
        let err = StudioError::Remote("quota exceeded".into()).in_scene(2);
        assert_eq!(err.scene_index(), Some(2));
        assert_eq!(err.to_string(), "Scene 2 failed: API error: quota exceeded");
    }

    #[test]
    fn cancellation_is_never_wrapped() {
        let err = StudioError::Cancelled.in_scene(3);
        assert!(matches!(err, StudioError::Cancelled));
        assert!(err.is_cancellation());
    }

    #[test]
    fn extraction_lists_fields() {
        let err = StudioError::Extraction { fields: vec![] };
        assert!(err.to_string().ends_with("Available fields: none"));

        let err = StudioError::Extraction {
            fields: vec!["mimeType".into(), "size".into()],
        };
        assert!(err.to_string().ends_with("Available fields: mimeType, size"));
    }
}
