use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use scene_studio::api::GeminiClient;
use scene_studio::dialogue::{recommend_dialogue, suggest_ideas};
use scene_studio::image::{generate_scene_image, load_reference, SceneImageRequest};
use scene_studio::prompt::CharacterSheet;
use scene_studio::scene::{prepare_scenes, AspectRatio, SourceImage, VideoDuration};
use scene_studio::video::{
    ClipLibrary, ClipWriter, GeneratedClip, GenerationMode, OrchestrationRun, Orchestrator,
    PollPolicy, ProgressEvent, RunStatus,
};
use scene_studio::{CancelToken, StudioConfig};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "scene-studio")]
#[command(about = "Scene image and multi-clip video generation using generative models", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Gemini API key
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Working directory for generated media
    #[arg(short = 'w', long, global = true)]
    work_dir: Option<PathBuf>,

    /// JSON file replacing the built-in character sheet
    #[arg(long, global = true)]
    character_sheet: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate the scene still that videos are anchored to
    Image {
        #[arg(long)]
        location: String,

        #[arg(long)]
        time: String,

        #[arg(long)]
        situation: String,

        #[arg(long, default_value = "9:16")]
        aspect_ratio: AspectRatio,

        /// Style/situation reference image
        #[arg(long)]
        reference: Option<PathBuf>,

        /// Output image path (defaults to <work-dir>/scene.png)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate video clips from a source image and scene descriptions
    Video {
        /// Source image every clip is anchored to
        #[arg(short, long)]
        image: PathBuf,

        /// Scene description, repeat once per scene
        #[arg(short, long = "scene", required = true)]
        scenes: Vec<String>,

        /// Total length in seconds: 8, 16, 24 or 32
        #[arg(short, long, default_value_t = 8)]
        duration: u32,

        #[arg(long, default_value = "9:16")]
        aspect_ratio: AspectRatio,

        /// Generate one video covering all scenes instead of one per scene
        #[arg(long)]
        unified: bool,

        /// Seconds between status polls
        #[arg(long)]
        poll_interval: Option<u64>,

        /// Give up on a job after this many polls
        #[arg(long, conflicts_with = "no_poll_limit")]
        max_polls: Option<u32>,

        /// Wait on every job until it finishes
        #[arg(long)]
        no_poll_limit: bool,
    },

    /// Suggest dialogue for the final clip
    Dialogue {
        #[arg(short, long = "scene", required = true)]
        scenes: Vec<String>,
    },

    /// Suggest interview situations
    Ideas,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true)
        .init();

    dotenvy::dotenv().ok();

    let args = Args::parse();

    let mut config = StudioConfig::from_env()?;
    if let Some(key) = args.api_key {
        config.api_key = key;
    }
    if let Some(dir) = args.work_dir {
        config.work_dir = dir;
    }
    if let Err(e) = config.validate() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    let sheet = load_sheet(args.character_sheet.as_deref()).await?;

    if let Err(e) = run_command(args.command, config, sheet).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
    Ok(())
}

async fn load_sheet(path: Option<&Path>) -> anyhow::Result<CharacterSheet> {
    let Some(path) = path else {
        return Ok(CharacterSheet::default());
    };
    let raw = tokio::fs::read_to_string(path)
        .await
        .context(format!("Failed to read character sheet: {}", path.display()))?;
    serde_json::from_str(&raw).context("Character sheet is not valid JSON")
}

async fn run_command(command: Command, mut config: StudioConfig, sheet: CharacterSheet) -> anyhow::Result<()> {
    match command {
        Command::Image {
            location,
            time,
            situation,
            aspect_ratio,
            reference,
            output,
        } => {
            let client = GeminiClient::new(&config)?;
            let character_reference = match &config.character_reference {
                Some(path) => Some(load_reference(path).await?),
                None => None,
            };
            let situation_reference = match &reference {
                Some(path) => Some(load_reference(path).await?),
                None => None,
            };
            let request = SceneImageRequest {
                location,
                time,
                situation,
                aspect_ratio,
                character_reference,
                situation_reference,
            };

            let image = generate_scene_image(&client, &sheet, &request, |msg| info!("{}", msg)).await?;

            let output = output.unwrap_or_else(|| config.work_dir.join("scene.png"));
            if let Some(parent) = output.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .context("Failed to create output directory")?;
            }
            tokio::fs::write(&output, &image.bytes).await?;
            info!("Image saved to: {}", output.display());
        }

        Command::Video {
            image,
            scenes,
            duration,
            aspect_ratio,
            unified,
            poll_interval,
            max_polls,
            no_poll_limit,
        } => {
            if let Some(secs) = poll_interval {
                config.poll.interval = Duration::from_secs(secs);
            }
            if max_polls.is_some() {
                config.poll.max_polls = max_polls;
            }
            if no_poll_limit {
                config.poll = PollPolicy::unbounded(config.poll.interval);
            }
            let mode = if unified {
                GenerationMode::Unified
            } else {
                GenerationMode::Sequential
            };
            generate_videos(&config, sheet, &image, &scenes, duration, aspect_ratio, mode).await?;
        }

        Command::Dialogue { scenes } => {
            let client = GeminiClient::new(&config)?;
            let analysis = recommend_dialogue(&client, &sheet, &scenes, |msg| info!("{}", msg)).await?;
            println!("{}", serde_json::to_string_pretty(&analysis)?);
        }

        Command::Ideas => {
            let client = GeminiClient::new(&config)?;
            let ideas = suggest_ideas(&client, &sheet, |msg| info!("{}", msg)).await?;
            println!("{}", serde_json::to_string_pretty(&ideas)?);
        }
    }
    Ok(())
}

async fn generate_videos(
    config: &StudioConfig,
    sheet: CharacterSheet,
    image_path: &Path,
    scene_inputs: &[String],
    duration: u32,
    aspect_ratio: AspectRatio,
    mode: GenerationMode,
) -> anyhow::Result<()> {
    // 1. Validate input before any remote call
    let duration = VideoDuration::from_seconds(duration)?;
    let scenes = prepare_scenes(scene_inputs, duration)?;
    let source = SourceImage::load(image_path, aspect_ratio)
        .await
        .context(format!("Failed to read image: {}", image_path.display()))?;
    info!(
        "Generating {} scene(s) for a {}s video ({:?} mode)",
        scenes.len(),
        duration.seconds(),
        mode
    );

    // 2. Ctrl-C stops the run at its next checkpoint, a second press quits
    let cancel = CancelToken::new();
    let stop = cancel.clone();
    tokio::spawn(async move {
        let mut presses = 0;
        while tokio::signal::ctrl_c().await.is_ok() {
            presses += 1;
            match interrupt_action(presses) {
                Interrupt::Stop => {
                    warn!("Stop requested, finishing at the next checkpoint (Ctrl-C again to quit)...");
                    stop.cancel();
                }
                Interrupt::Quit => {
                    error!("Interrupted");
                    std::process::exit(130);
                }
            }
        }
    });

    // 3. Drive the jobs; clips are saved in the background as they arrive
    let client = GeminiClient::new(config)?;
    let orchestrator = Orchestrator::new(&client, config.poll).with_sheet(sheet);
    let library = ClipLibrary::new(config.work_dir.join("clips"));
    let writer = ClipWriter::spawn(library, cancel.clone());
    let mut run = OrchestrationRun::new();

    let on_progress = |event: &ProgressEvent| info!("{}", event);
    let on_clip = |clip: &GeneratedClip| writer.submit(clip);

    let result = match mode {
        GenerationMode::Sequential => {
            orchestrator
                .run_sequence(&mut run, &source, &scenes, on_progress, on_clip, &cancel)
                .await
        }
        GenerationMode::Unified => {
            orchestrator
                .run_unified(&mut run, &source, &scenes, duration, on_progress, on_clip, &cancel)
                .await
        }
    };

    // 4. Report
    let saved = writer.finish().await;
    result?;
    let library = saved?;
    match run.status() {
        RunStatus::Cancelled => info!(
            "Generation stopped. {} of {} video(s) kept in {}",
            library.len(),
            run.total_scenes(),
            library.dir().display()
        ),
        status => info!(
            "Video generation {}: {} video(s) in {}",
            status,
            library.len(),
            library.dir().display()
        ),
    }
    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum Interrupt {
    Stop,
    Quit,
}

fn interrupt_action(presses: u32) -> Interrupt {
    if presses <= 1 {
        Interrupt::Stop
    } else {
        Interrupt::Quit
    }
}
