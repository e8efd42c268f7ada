use std::fmt;
use std::time::Duration;

use tracing::{error, info};

use super::clip::GeneratedClip;
use super::extract::extract_media;
use super::poller::{run_job, PollPolicy};
use crate::api::{GenerativeBackend, VideoRequest};
use crate::cancel::CancelToken;
use crate::error::{Result, StudioError};
use crate::prompt::CharacterSheet;
use crate::scene::{SceneSpec, SourceImage, VideoDuration};

pub const UNIFIED_CLIP_ID: &str = "unified-video";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Idle,
    Running,
    Cancelled,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Cancelled | Self::Completed | Self::Failed)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// State of one generation run, as the caller sees it.
#[derive(Debug)]
pub struct OrchestrationRun {
    status: RunStatus,
    total_scenes: usize,
    current_scene: usize,
    clips: Vec<GeneratedClip>,
}

impl Default for OrchestrationRun {
    fn default() -> Self {
        Self::new()
    }
}

impl OrchestrationRun {
    pub fn new() -> Self {
        Self {
            status: RunStatus::Idle,
            total_scenes: 0,
            current_scene: 0,
            clips: Vec::new(),
        }
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn total_scenes(&self) -> usize {
        self.total_scenes
    }

    /// 1-based scene being generated, 0 before the first dispatch.
    pub fn current_scene(&self) -> usize {
        self.current_scene
    }

    /// Finished clips in scene order.
    pub fn clips(&self) -> &[GeneratedClip] {
        &self.clips
    }

    pub fn into_clips(self) -> Vec<GeneratedClip> {
        self.clips
    }

    fn transition(&mut self, to: RunStatus) -> Result<()> {
        let allowed = match (self.status, to) {
            (RunStatus::Idle, RunStatus::Running) => true,
            (RunStatus::Running, next) => next.is_terminal(),
            _ => false,
        };
        if !allowed {
            return Err(StudioError::InvalidTransition {
                from: self.status.to_string(),
                to: to.to_string(),
            });
        }
        self.status = to;
        Ok(())
    }

    fn begin(&mut self, total_scenes: usize) -> Result<()> {
        self.transition(RunStatus::Running)?;
        self.total_scenes = total_scenes;
        self.current_scene = 0;
        self.clips.clear();
        Ok(())
    }

    /// Returns a finished run to Idle, dropping its clips.
    pub fn reset(&mut self) -> Result<()> {
        if self.status == RunStatus::Running {
            return Err(StudioError::InvalidTransition {
                from: self.status.to_string(),
                to: RunStatus::Idle.to_string(),
            });
        }
        *self = Self::new();
        Ok(())
    }
}

/// Progress reported while a run advances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Submitting { scene: usize, total: usize },
    Polling { scene: usize, total: usize, elapsed: Duration },
    Downloading { scene: usize, total: usize },
    Done { scene: usize, total: usize },
    Stopped { scene: usize, total: usize },
}

impl ProgressEvent {
    pub fn scene(&self) -> usize {
        match self {
            Self::Submitting { scene, .. }
            | Self::Polling { scene, .. }
            | Self::Downloading { scene, .. }
            | Self::Done { scene, .. }
            | Self::Stopped { scene, .. } => *scene,
        }
    }
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Submitting { scene, total } => {
                write!(f, "Video {scene}/{total}: submitting generation request...")
            }
            Self::Polling {
                scene,
                total,
                elapsed,
            } => write!(
                f,
                "Video {scene}/{total}: processing... ({}s elapsed)",
                elapsed.as_secs()
            ),
            Self::Downloading { scene, total } => write!(f, "Video {scene}/{total}: downloading..."),
            Self::Done { scene, total } => write!(f, "Video {scene}/{total}: done!"),
            Self::Stopped { .. } => write!(f, "Generation stopped."),
        }
    }
}

/// Which job layout a run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GenerationMode {
    /// One independent job per scene.
    #[default]
    Sequential,
    /// A single job covering every scene.
    Unified,
}

/// Drives video jobs for a run, one at a time.
pub struct Orchestrator<'a> {
    backend: &'a dyn GenerativeBackend,
    sheet: CharacterSheet,
    policy: PollPolicy,
}

impl<'a> Orchestrator<'a> {
    pub fn new(backend: &'a dyn GenerativeBackend, policy: PollPolicy) -> Self {
        Self {
            backend,
            sheet: CharacterSheet::default(),
            policy,
        }
    }

    pub fn with_sheet(mut self, sheet: CharacterSheet) -> Self {
        self.sheet = sheet;
        self
    }

    /// Generates one clip per scene text, in order.
    ///
    /// Every job is anchored to the same `source` image. `on_clip` sees each
    /// clip before the next scene is dispatched. A stop request ends the run
    /// as Cancelled with the clips finished so far; any other failure ends it
    /// as Failed and is returned with the scene index attached.
    pub async fn run_sequence<S, P, C>(
        &self,
        run: &mut OrchestrationRun,
        source: &SourceImage,
        scene_texts: &[S],
        mut on_progress: P,
        mut on_clip: C,
        cancel: &CancelToken,
    ) -> Result<()>
    where
        S: AsRef<str>,
        P: FnMut(&ProgressEvent) + Send,
        C: FnMut(&GeneratedClip) + Send,
    {
        if scene_texts.is_empty() {
            return Err(StudioError::Validation("no scenes to generate".to_string()));
        }
        let scenes = SceneSpec::sequence(scene_texts);
        cancel.reset();
        run.begin(scenes.len())?;
        info!("Starting sequential generation of {} videos", scenes.len());

        for spec in &scenes {
            if cancel.is_cancelled() {
                return self.stop(run, spec.index, &mut on_progress);
            }
            run.current_scene = spec.index;

            let prompt = self.sheet.compose_scene_prompt(
                &spec.text,
                spec.index,
                spec.total,
                spec.is_last,
            );
            let outcome = self
                .generate_clip(
                    source,
                    prompt,
                    None,
                    (spec.index, spec.total),
                    &mut on_progress,
                    cancel,
                )
                .await;

            match outcome {
                Ok((bytes, mime_type)) => {
                    let clip = GeneratedClip {
                        id: format!("video-{}", spec.index),
                        scene_index: spec.index,
                        source_prompt: spec.text.clone(),
                        mime_type,
                        bytes,
                    };
                    on_clip(&clip);
                    on_progress(&ProgressEvent::Done {
                        scene: spec.index,
                        total: spec.total,
                    });
                    info!("Generated video {} ({}/{})", clip.id, spec.index, spec.total);
                    run.clips.push(clip);
                }
                Err(e) if e.is_cancellation() || cancel.is_cancelled() => {
                    return self.stop(run, spec.index, &mut on_progress);
                }
                Err(e) => {
                    error!("Error generating video {}: {}", spec.index, e);
                    run.transition(RunStatus::Failed)?;
                    return Err(e.in_scene(spec.index));
                }
            }
        }

        run.transition(RunStatus::Completed)?;
        info!("All {} videos generated", run.clips.len());
        Ok(())
    }

    /// Generates a single clip that covers every scene.
    #[allow(clippy::too_many_arguments)]
    pub async fn run_unified<S, P, C>(
        &self,
        run: &mut OrchestrationRun,
        source: &SourceImage,
        scene_texts: &[S],
        duration: VideoDuration,
        mut on_progress: P,
        mut on_clip: C,
        cancel: &CancelToken,
    ) -> Result<()>
    where
        S: AsRef<str>,
        P: FnMut(&ProgressEvent) + Send,
        C: FnMut(&GeneratedClip) + Send,
    {
        if scene_texts.is_empty() {
            return Err(StudioError::Validation("no scenes to generate".to_string()));
        }
        cancel.reset();
        run.begin(1)?;
        run.current_scene = 1;

        let prompt = self.sheet.compose_unified_prompt(scene_texts, duration.seconds());
        info!(
            "Starting unified generation: {} scenes in one {}s video",
            scene_texts.len(),
            duration.seconds()
        );

        let outcome = self
            .generate_clip(
                source,
                prompt.clone(),
                Some(duration.seconds()),
                (1, 1),
                &mut on_progress,
                cancel,
            )
            .await;

        match outcome {
            Ok((bytes, mime_type)) => {
                let clip = GeneratedClip {
                    id: UNIFIED_CLIP_ID.to_string(),
                    scene_index: 1,
                    source_prompt: prompt,
                    mime_type,
                    bytes,
                };
                on_clip(&clip);
                on_progress(&ProgressEvent::Done { scene: 1, total: 1 });
                run.clips.push(clip);
                run.transition(RunStatus::Completed)
            }
            Err(e) if e.is_cancellation() || cancel.is_cancelled() => {
                self.stop(run, 1, &mut on_progress)
            }
            Err(e) => {
                error!("Error generating unified video: {}", e);
                run.transition(RunStatus::Failed)?;
                Err(e)
            }
        }
    }

    async fn generate_clip<P>(
        &self,
        source: &SourceImage,
        prompt: String,
        duration_seconds: Option<u32>,
        (scene, total): (usize, usize),
        on_progress: &mut P,
        cancel: &CancelToken,
    ) -> Result<(Vec<u8>, String)>
    where
        P: FnMut(&ProgressEvent) + Send,
    {
        on_progress(&ProgressEvent::Submitting { scene, total });

        let request = VideoRequest {
            prompt,
            image: source.into(),
            aspect_ratio: source.aspect_ratio,
            sample_count: 1,
            duration_seconds,
        };
        let mut on_tick = |elapsed: Duration| {
            on_progress(&ProgressEvent::Polling {
                scene,
                total,
                elapsed,
            })
        };
        let record = run_job(self.backend, &request, self.policy, cancel, &mut on_tick).await?;

        on_progress(&ProgressEvent::Downloading { scene, total });
        let bytes = extract_media(&record, self.backend).await?;
        let mime_type = record
            .get("mimeType")
            .and_then(|v| v.as_str())
            .unwrap_or("video/mp4")
            .to_string();
        Ok((bytes, mime_type))
    }

    fn stop<P>(&self, run: &mut OrchestrationRun, scene: usize, on_progress: &mut P) -> Result<()>
    where
        P: FnMut(&ProgressEvent) + Send,
    {
        info!(
            "Generation stopped at scene {} with {} videos finished",
            scene,
            run.clips.len()
        );
        on_progress(&ProgressEvent::Stopped {
            scene,
            total: run.total_scenes,
        });
        run.transition(RunStatus::Cancelled)
    }
}
