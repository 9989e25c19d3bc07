use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::Context;

use crate::foundation::error::{PipelineError, PipelineResult};
use crate::scheduler::task::{OwnerId, TaskId, TaskKey};

/// Content of the rendezvous marker.
pub const MARKER_CONTENT: &str = "done";

/// The per-task files kept in the storage area.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// `{owner}_{task}_image`
    Source,
    /// `{owner}_{task}_image.partial`, a deposit in flight.
    SourcePartial,
    /// `{owner}_{task}_video.mp4`
    Video,
    /// `{owner}_{task}_video.partial.mp4`, an encode in flight.
    VideoPartial,
    /// `{owner}_{task}_done`
    Marker,
}

impl ArtifactKind {
    /// Every kind, used when removing a task's files.
    pub const ALL: [ArtifactKind; 5] = [
        Self::Source,
        Self::SourcePartial,
        Self::Video,
        Self::VideoPartial,
        Self::Marker,
    ];

    fn suffix(self) -> &'static str {
        match self {
            Self::Source => "image",
            Self::SourcePartial => "image.partial",
            Self::Video => "video.mp4",
            Self::VideoPartial => "video.partial.mp4",
            Self::Marker => "done",
        }
    }

    fn from_suffix(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.suffix() == s)
    }
}

/// One file found by [`ArtifactStore::scan`].
#[derive(Clone, Debug)]
pub struct StoredFile {
    /// Absolute path.
    pub path: PathBuf,
    /// Owning task, `None` for files that do not follow the naming scheme.
    pub key: Option<TaskKey>,
    /// Parsed artifact kind.
    pub kind: Option<ArtifactKind>,
    /// Last modification time.
    pub modified: SystemTime,
}

/// Owner/task-qualified file naming over a flat storage directory.
#[derive(Clone, Debug)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Use `root` as the storage area, creating it if needed.
    pub fn open(root: impl Into<PathBuf>) -> PipelineResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)
            .with_context(|| format!("create storage directory '{}'", root.display()))?;
        Ok(Self { root })
    }

    /// Storage directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `{owner}_{task}_{suffix}` inside the root.
    pub fn path(&self, key: &TaskKey, kind: ArtifactKind) -> PathBuf {
        self.root
            .join(format!("{}_{}_{}", key.owner, key.task, kind.suffix()))
    }

    /// Uploaded source image.
    pub fn source_path(&self, key: &TaskKey) -> PathBuf {
        self.path(key, ArtifactKind::Source)
    }

    /// Published MP4.
    pub fn video_path(&self, key: &TaskKey) -> PathBuf {
        self.path(key, ArtifactKind::Video)
    }

    /// Encoder output before publishing.
    pub fn partial_path(&self, key: &TaskKey) -> PathBuf {
        self.path(key, ArtifactKind::VideoPartial)
    }

    /// Rendezvous marker.
    pub fn marker_path(&self, key: &TaskKey) -> PathBuf {
        self.path(key, ArtifactKind::Marker)
    }

    /// Whether a source image is stored for `key`.
    pub fn has_source(&self, key: &TaskKey) -> bool {
        self.source_path(key).is_file()
    }

    /// Store source bytes for `key` atomically (temporary file, then rename).
    pub fn write_source(&self, key: &TaskKey, bytes: &[u8]) -> PipelineResult<PathBuf> {
        let tmp = self.path(key, ArtifactKind::SourcePartial);
        let dst = self.source_path(key);
        std::fs::write(&tmp, bytes)
            .with_context(|| format!("write source image '{}'", tmp.display()))?;
        if let Err(e) = std::fs::rename(&tmp, &dst) {
            let _ = std::fs::remove_file(&tmp);
            return Err(anyhow::Error::new(e)
                .context(format!("publish source image '{}'", dst.display()))
                .into());
        }
        Ok(dst)
    }

    /// Store source bytes under a freshly generated task id.
    pub fn deposit_source(&self, owner: &OwnerId, bytes: &[u8]) -> PipelineResult<TaskId> {
        let task = TaskId::generate();
        self.write_source(&TaskKey::new(owner.clone(), task.clone()), bytes)?;
        Ok(task)
    }

    /// Promote the finished temporary artifact and write the rendezvous marker.
    ///
    /// On failure neither the final artifact nor the marker is left behind.
    pub fn publish(&self, key: &TaskKey) -> PipelineResult<PathBuf> {
        let partial = self.partial_path(key);
        let video = self.video_path(key);
        let len = std::fs::metadata(&partial)
            .with_context(|| format!("stat encoded artifact '{}'", partial.display()))?
            .len();
        if len == 0 {
            return Err(PipelineError::encode("encoder produced an empty artifact"));
        }
        std::fs::rename(&partial, &video)
            .with_context(|| format!("rename artifact to '{}'", video.display()))?;
        if let Err(e) = std::fs::write(self.marker_path(key), MARKER_CONTENT) {
            let _ = std::fs::remove_file(&video);
            return Err(anyhow::Error::new(e)
                .context("write rendezvous marker")
                .into());
        }
        Ok(video)
    }

    /// Remove the temporary artifact if present.
    pub fn discard_partial(&self, key: &TaskKey) {
        let _ = std::fs::remove_file(self.partial_path(key));
    }

    /// Remove every file belonging to `key`. Returns how many were deleted.
    pub fn remove_all(&self, key: &TaskKey) -> usize {
        ArtifactKind::ALL
            .into_iter()
            .filter(|&kind| std::fs::remove_file(self.path(key, kind)).is_ok())
            .count()
    }

    /// Rendezvous check: marker present and final artifact non-empty.
    pub fn is_ready(&self, key: &TaskKey) -> bool {
        let marker_ok = std::fs::read_to_string(self.marker_path(key))
            .map(|s| s.trim() == MARKER_CONTENT)
            .unwrap_or(false);
        marker_ok
            && std::fs::metadata(self.video_path(key))
                .map(|m| m.is_file() && m.len() > 0)
                .unwrap_or(false)
    }

    /// List regular files in the storage area with their owning task, if any.
    pub fn scan(&self) -> PipelineResult<Vec<StoredFile>> {
        let mut out = Vec::new();
        let entries = std::fs::read_dir(&self.root)
            .with_context(|| format!("read storage directory '{}'", self.root.display()))?;
        for entry in entries {
            let entry = entry.context("read storage directory entry")?;
            let Ok(meta) = entry.metadata() else {
                continue;
            };
            if !meta.is_file() {
                continue;
            }
            let name = entry.file_name();
            let parsed = name.to_str().and_then(parse_artifact_name);
            out.push(StoredFile {
                path: entry.path(),
                key: parsed.as_ref().map(|(k, _)| k.clone()),
                kind: parsed.map(|(_, kind)| kind),
                modified: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            });
        }
        Ok(out)
    }
}

/// Split `{owner}_{task}_{suffix}` back into its parts.
pub fn parse_artifact_name(name: &str) -> Option<(TaskKey, ArtifactKind)> {
    let mut parts = name.splitn(3, '_');
    let owner = OwnerId::new(parts.next()?).ok()?;
    let task = TaskId::new(parts.next()?).ok()?;
    let kind = ArtifactKind::from_suffix(parts.next()?)?;
    Some((TaskKey::new(owner, task), kind))
}

#[cfg(test)]
#[path = "../../tests/unit/scheduler/storage.rs"]
mod tests;
