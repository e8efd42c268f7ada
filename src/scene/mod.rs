use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StudioError};

/// Length of the video segment covered by one scene, in seconds.
pub const SECONDS_PER_SCENE: u32 = 8;

/// One user-described scene, positioned within its run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneSpec {
    /// 1-based position
    pub index: usize,
    pub total: usize,
    pub text: String,
    pub is_first: bool,
    pub is_last: bool,
}

impl SceneSpec {
    pub fn new(index: usize, total: usize, text: impl Into<String>) -> Self {
        debug_assert!((1..=total).contains(&index));
        Self {
            index,
            total,
            text: text.into(),
            is_first: index == 1,
            is_last: index == total,
        }
    }

    /// Numbers the texts 1..N in order.
    pub fn sequence<S: AsRef<str>>(texts: &[S]) -> Vec<SceneSpec> {
        let total = texts.len();
        texts
            .iter()
            .enumerate()
            .map(|(i, text)| SceneSpec::new(i + 1, total, text.as_ref()))
            .collect()
    }
}

/// Total video length. Each scene covers a fixed 8-second segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VideoDuration {
    Eight,
    Sixteen,
    TwentyFour,
    ThirtyTwo,
}

impl VideoDuration {
    pub fn from_seconds(seconds: u32) -> Result<Self> {
        match seconds {
            8 => Ok(Self::Eight),
            16 => Ok(Self::Sixteen),
            24 => Ok(Self::TwentyFour),
            32 => Ok(Self::ThirtyTwo),
            other => Err(StudioError::Validation(format!(
                "duration must be 8, 16, 24 or 32 seconds, got {other}"
            ))),
        }
    }

    pub fn seconds(self) -> u32 {
        match self {
            Self::Eight => 8,
            Self::Sixteen => 16,
            Self::TwentyFour => 24,
            Self::ThirtyTwo => 32,
        }
    }

    pub fn scene_count(self) -> usize {
        (self.seconds() / SECONDS_PER_SCENE) as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AspectRatio {
    #[serde(rename = "16:9")]
    Landscape,
    #[default]
    #[serde(rename = "9:16")]
    Portrait,
    #[serde(rename = "1:1")]
    Square,
}

impl AspectRatio {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Landscape => "16:9",
            Self::Portrait => "9:16",
            Self::Square => "1:1",
        }
    }

    pub(crate) fn orientation(self) -> &'static str {
        match self {
            Self::Landscape => "horizontal",
            Self::Portrait => "vertical",
            Self::Square => "square",
        }
    }

    pub(crate) fn description(self) -> &'static str {
        match self {
            Self::Landscape => "horizontal landscape (16:9)",
            Self::Portrait => "vertical portrait (9:16)",
            Self::Square => "square (1:1)",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "16:9" => Ok(Self::Landscape),
            "9:16" => Ok(Self::Portrait),
            "1:1" => Ok(Self::Square),
            other => Err(StudioError::Validation(format!(
                "unsupported aspect ratio: {other}"
            ))),
        }
    }
}

/// The still every clip of a run is anchored to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub aspect_ratio: AspectRatio,
}

impl SourceImage {
    pub async fn load(path: &Path, aspect_ratio: AspectRatio) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        if bytes.is_empty() {
            return Err(StudioError::Validation(format!(
                "image file is empty: {}",
                path.display()
            )));
        }
        Ok(Self {
            bytes,
            mime_type: mime_type_for(path).to_string(),
            aspect_ratio,
        })
    }
}

/// Guesses an image media type from the file extension.
pub fn mime_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "image/png",
    }
}

/// Turns the user's scene inputs into the list handed to the orchestrator.
///
/// Inputs beyond the duration's scene count are ignored. The first scene is
/// required; blank scenes after it are dropped.
pub fn prepare_scenes<S: AsRef<str>>(inputs: &[S], duration: VideoDuration) -> Result<Vec<String>> {
    let in_range = &inputs[..inputs.len().min(duration.scene_count())];

    match in_range.first() {
        Some(first) if !first.as_ref().trim().is_empty() => {}
        _ => {
            return Err(StudioError::Validation(
                "scene 1 description is required".to_string(),
            ))
        }
    }

    Ok(in_range
        .iter()
        .map(|s| s.as_ref().trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scene_count_follows_duration() {
        for (seconds, scenes) in [(8, 1), (16, 2), (24, 3), (32, 4)] {
            let duration = VideoDuration::from_seconds(seconds).unwrap();
            assert_eq!(duration.scene_count(), scenes);
            assert_eq!(duration.seconds(), seconds);
        }
        assert!(VideoDuration::from_seconds(12).is_err());
    }

    #[test]
    fn sequence_marks_first_and_last() {
        let specs = SceneSpec::sequence(&["a", "b", "c"]);
        assert_eq!(specs.len(), 3);
        assert!(specs[0].is_first && !specs[0].is_last);
        assert!(!specs[1].is_first && !specs[1].is_last);
        assert!(specs[2].is_last);
        assert_eq!(specs[2].index, 3);
        assert!(specs.iter().all(|s| s.total == 3));

        let single = SceneSpec::sequence(&["only"]);
        assert!(single[0].is_first && single[0].is_last);
    }

    #[test]
    fn prepare_truncates_to_duration() {
        let inputs = ["A dog runs", "A dog barks", "A dog sleeps", "A dog eats"];
        let scenes = prepare_scenes(&inputs, VideoDuration::Sixteen).unwrap();
        assert_eq!(scenes, vec!["A dog runs", "A dog barks"]);
    }

    #[test]
    fn prepare_drops_blank_later_scenes() {
        let inputs = ["first", "  ", "third"];
        let scenes = prepare_scenes(&inputs, VideoDuration::TwentyFour).unwrap();
        assert_eq!(scenes, vec!["first", "third"]);
    }

    #[test]
    fn prepare_requires_first_scene() {
        let err = prepare_scenes(&["", "second"], VideoDuration::Sixteen).unwrap_err();
        assert!(matches!(err, StudioError::Validation(_)));

        let empty: [&str; 0] = [];
        assert!(prepare_scenes(&empty, VideoDuration::Eight).is_err());
    }

    #[test]
    fn aspect_ratio_parses_and_serializes() {
        assert_eq!("16:9".parse::<AspectRatio>().unwrap(), AspectRatio::Landscape);
        assert!("4:3".parse::<AspectRatio>().is_err());
        assert_eq!(
            serde_json::to_string(&AspectRatio::Portrait).unwrap(),
            "\"9:16\""
        );
    }

    #[test]
    fn mime_type_from_extension() {
        assert_eq!(mime_type_for(Path::new("still.JPG")), "image/jpeg");
        assert_eq!(mime_type_for(Path::new("still.png")), "image/png");
        assert_eq!(mime_type_for(Path::new("still")), "image/png");
    }
}
