use std::io;
use std::path::PathBuf;

/// Kind of stored file; picks the root directory and extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    Picture,
    Video,
    Subtitle,
}

impl FileKind {
    pub fn extension(&self) -> &'static str {
        match self {
            FileKind::Picture => "png",
            FileKind::Video => "mp4",
            FileKind::Subtitle => "vtt",
        }
    }
}

pub trait StorageLocator: Send + Sync {
    /// Root directory for a kind of file
    fn root(&self, kind: FileKind) -> PathBuf;

    /// Resolve `<root>/<name>.<ext>`, creating the root on first use
    fn new_file(&self, name: &str, kind: FileKind) -> io::Result<PathBuf>;
}
