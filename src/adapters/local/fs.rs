use crate::config::PipelineConfig;
use crate::ports::storage::{FileKind, StorageLocator};
use std::io;
use std::path::{Path, PathBuf};

/// Local filesystem storage with one root directory per file kind.
#[derive(Clone, Debug)]
pub struct FsStorage {
    picture_dir: PathBuf,
    video_dir: PathBuf,
    subtitle_dir: PathBuf,
}

impl FsStorage {
    pub fn new(
        picture_dir: impl Into<PathBuf>,
        video_dir: impl Into<PathBuf>,
        subtitle_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            picture_dir: picture_dir.into(),
            video_dir: video_dir.into(),
            subtitle_dir: subtitle_dir.into(),
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(&config.picture_dir, &config.video_dir, &config.subtitle_dir)
    }

    /// All three roots under one base directory.
    pub fn under(base: &Path) -> Self {
        Self::new(
            base.join("pictures"),
            base.join("videos"),
            base.join("subtitles"),
        )
    }
}

impl StorageLocator for FsStorage {
    fn root(&self, kind: FileKind) -> PathBuf {
        match kind {
            FileKind::Picture => self.picture_dir.clone(),
            FileKind::Video => self.video_dir.clone(),
            FileKind::Subtitle => self.subtitle_dir.clone(),
        }
    }

    fn new_file(&self, name: &str, kind: FileKind) -> io::Result<PathBuf> {
        let root = self.root(kind);
        if !root.exists() {
            std::fs::create_dir_all(&root)?;
        }
        Ok(root.join(format!("{}.{}", name, kind.extension())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_new_file_creates_root() {
        let dir = tempdir().unwrap();
        let storage = FsStorage::under(dir.path());

        let path = storage.new_file("abc_vtt", FileKind::Subtitle).unwrap();

        assert_eq!(path, dir.path().join("subtitles").join("abc_vtt.vtt"));
        assert!(dir.path().join("subtitles").is_dir());
        assert!(!path.exists());
    }

    #[test]
    fn test_extension_per_kind() {
        let dir = tempdir().unwrap();
        let storage = FsStorage::under(dir.path());

        let picture = storage.new_file("thumb", FileKind::Picture).unwrap();
        let video = storage.new_file("upload", FileKind::Video).unwrap();

        assert_eq!(picture, dir.path().join("pictures").join("thumb.png"));
        assert_eq!(video, dir.path().join("videos").join("upload.mp4"));
    }
}
