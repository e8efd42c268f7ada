use std::path::{Path, PathBuf};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::cancel::CancelToken;
use crate::error::{Result, StudioError};

/// Media produced by one finished job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedClip {
    pub id: String,
    /// 1-based scene the clip was generated for
    pub scene_index: usize,
    pub source_prompt: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl GeneratedClip {
    pub fn file_name(&self) -> String {
        let ext = match self.mime_type.as_str() {
            "video/webm" => "webm",
            "video/quicktime" => "mov",
            _ => "mp4",
        };
        format!("{}.{}", self.id, ext)
    }
}

#[derive(Debug)]
struct PublishedClip {
    clip: GeneratedClip,
    path: PathBuf,
}

/// Owns the clips of the current session and the files they are shown from.
///
/// Files are only removed through [`ClipLibrary::release`] and
/// [`ClipLibrary::reset`]. A clip whose file could not be deleted stays in
/// the library.
#[derive(Debug)]
pub struct ClipLibrary {
    dir: PathBuf,
    entries: Vec<PublishedClip>,
}

impl ClipLibrary {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            entries: Vec::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes the clip to the library directory and appends it.
    pub async fn publish(&mut self, clip: GeneratedClip) -> Result<PathBuf> {
        if self.entries.iter().any(|e| e.clip.id == clip.id) {
            return Err(StudioError::Validation(format!(
                "clip {} is already in the library",
                clip.id
            )));
        }
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(clip.file_name());
        tokio::fs::write(&path, &clip.bytes).await?;
        info!("Saved clip {} to {}", clip.id, path.display());

        self.entries.push(PublishedClip {
            clip,
            path: path.clone(),
        });
        Ok(path)
    }

    /// Clips in the order they were published.
    pub fn clips(&self) -> impl Iterator<Item = &GeneratedClip> {
        self.entries.iter().map(|e| &e.clip)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Deletes a clip's file and drops the clip.
    pub async fn release(&mut self, id: &str) -> Result<Option<GeneratedClip>> {
        let Some(pos) = self.entries.iter().position(|e| e.clip.id == id) else {
            return Ok(None);
        };
        remove_file(&self.entries[pos].path).await?;
        Ok(Some(self.entries.remove(pos).clip))
    }

    /// Releases every clip.
    ///
    /// Every file is attempted. Clips whose file could not be deleted are
    /// kept and the first failure is returned.
    pub async fn reset(&mut self) -> Result<()> {
        let mut first_error = None;
        let mut kept = Vec::new();

        for entry in std::mem::take(&mut self.entries) {
            if let Err(e) = remove_file(&entry.path).await {
                warn!("Failed to delete clip {}: {}", entry.clip.id, e);
                if first_error.is_none() {
                    first_error = Some(e);
                }
                kept.push(entry);
            }
        }

        self.entries = kept;
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

async fn remove_file(path: &Path) -> Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("Clip file already gone: {}", path.display());
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Publishes clips on a background task as the orchestrator hands them over.
///
/// The first failed save stops the run through `cancel`; later clips are
/// dropped.
pub struct ClipWriter {
    tx: mpsc::UnboundedSender<GeneratedClip>,
    task: JoinHandle<(ClipLibrary, Result<()>)>,
}

impl ClipWriter {
    pub fn spawn(mut library: ClipLibrary, cancel: CancelToken) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<GeneratedClip>();
        let task = tokio::spawn(async move {
            while let Some(clip) = rx.recv().await {
                let id = clip.id.clone();
                if let Err(e) = library.publish(clip).await {
                    error!("Failed to save clip {}: {}", id, e);
                    cancel.cancel();
                    return (library, Err(e));
                }
            }
            (library, Ok(()))
        });
        Self { tx, task }
    }

    /// Queues a clip for saving. Never blocks.
    pub fn submit(&self, clip: &GeneratedClip) {
        if self.tx.send(clip.clone()).is_err() {
            warn!("Clip {} not saved: saving already stopped", clip.id);
        }
    }

    /// Waits for queued clips to be written and returns the library.
    pub async fn finish(self) -> Result<ClipLibrary> {
        drop(self.tx);
        let (library, outcome) = self.task.await?;
        outcome.map(|()| library)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip(index: usize) -> GeneratedClip {
        GeneratedClip {
            id: format!("video-{index}"),
            scene_index: index,
            source_prompt: format!("scene {index}"),
            mime_type: "video/mp4".to_string(),
            bytes: vec![index as u8; 4],
        }
    }

    #[tokio::test]
    async fn publish_keeps_order_and_writes_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut library = ClipLibrary::new(dir.path().join("clips"));

        let first = library.publish(clip(1)).await.unwrap();
        library.publish(clip(2)).await.unwrap();

        assert_eq!(std::fs::read(&first).unwrap(), vec![1, 1, 1, 1]);
        assert!(first.ends_with("video-1.mp4"));
        let order: Vec<usize> = library.clips().map(|c| c.scene_index).collect();
        assert_eq!(order, vec![1, 2]);
        assert!(library.publish(clip(1)).await.is_err());
    }

    #[tokio::test]
    async fn release_deletes_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut library = ClipLibrary::new(dir.path());
        let path = library.publish(clip(1)).await.unwrap();

        let released = library.release("video-1").await.unwrap().unwrap();
        assert_eq!(released.scene_index, 1);
        assert!(!path.exists());
        assert!(library.is_empty());
        assert!(library.release("video-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn reset_releases_everything() {
        let dir = tempfile::tempdir().unwrap();
        let mut library = ClipLibrary::new(dir.path());
        let mut paths = Vec::new();
        for i in 1..=3 {
            paths.push(library.publish(clip(i)).await.unwrap());
        }

        library.reset().await.unwrap();
        assert_eq!(library.len(), 0);
        assert!(paths.iter().all(|p| !p.exists()));
    }

    #[tokio::test]
    async fn reset_keeps_clips_it_could_not_delete() {
        let dir = tempfile::tempdir().unwrap();
        let mut library = ClipLibrary::new(dir.path());
        let first = library.publish(clip(1)).await.unwrap();
        let second = library.publish(clip(2)).await.unwrap();

        // A non-empty directory in place of the file cannot be removed as one.
        std::fs::remove_file(&first).unwrap();
        std::fs::create_dir(&first).unwrap();
        std::fs::write(first.join("keep"), b"x").unwrap();

        assert!(library.reset().await.is_err());
        assert!(!second.exists());
        let left: Vec<&str> = library.clips().map(|c| c.id.as_str()).collect();
        assert_eq!(left, vec!["video-1"]);
    }

    #[tokio::test]
    async fn failed_release_keeps_clip() {
        let dir = tempfile::tempdir().unwrap();
        let mut library = ClipLibrary::new(dir.path());
        let path = library.publish(clip(1)).await.unwrap();
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("keep"), b"x").unwrap();

        assert!(library.release("video-1").await.is_err());
        assert_eq!(library.len(), 1);
    }

    #[tokio::test]
    async fn writer_saves_in_arrival_order() {
        let dir = tempfile::tempdir().unwrap();
        let cancel = CancelToken::new();
        let writer = ClipWriter::spawn(ClipLibrary::new(dir.path()), cancel.clone());

        writer.submit(&clip(1));
        writer.submit(&clip(2));
        let library = writer.finish().await.unwrap();

        let order: Vec<usize> = library.clips().map(|c| c.scene_index).collect();
        assert_eq!(order, vec![1, 2]);
        assert!(!cancel.is_cancelled());
    }

    #[tokio::test]
    async fn failed_save_stops_the_run() {
        let blocker = tempfile::NamedTempFile::new().unwrap();
        let cancel = CancelToken::new();
        let writer = ClipWriter::spawn(ClipLibrary::new(blocker.path()), cancel.clone());

        writer.submit(&clip(1));
        let err = writer.finish().await.unwrap_err();

        assert!(matches!(err, StudioError::Io(_)));
        assert!(cancel.is_cancelled());
    }
}
