use std::path::PathBuf;
use uuid::Uuid;

/// An accepted upload waiting to be turned into a streamable asset.
#[derive(Debug, Clone)]
pub struct ProcessingTask {
    /// Uploaded temp file; deleted only after a successful run
    pub source_path: PathBuf,
    pub course_id: Uuid,
    pub video_id: Uuid,
    pub uploader_id: Uuid,
}

impl ProcessingTask {
    pub fn new(source_path: PathBuf, course_id: Uuid, video_id: Uuid, uploader_id: Uuid) -> Self {
        Self {
            source_path,
            course_id,
            video_id,
            uploader_id,
        }
    }
}

/// Output of the fingerprinting tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFingerprint {
    pub duration: String,
    pub fingerprint: String,
}

/// Persisted fingerprint, append-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FingerprintRecord {
    pub id: Uuid,
    /// Item id of the owning content (`VM_<video id>`)
    pub item_id: String,
    pub author_id: Uuid,
    pub duration: String,
    pub fingerprint: String,
}

impl FingerprintRecord {
    pub fn for_video(video_id: Uuid, author_id: Uuid, audio: AudioFingerprint) -> Self {
        Self {
            id: Uuid::new_v4(),
            item_id: format!("VM_{}", video_id),
            author_id,
            duration: audio.duration,
            fingerprint: audio.fingerprint,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FingerprintVerdict {
    /// Never seen before; considered original content.
    Unique,
    /// The author uploaded their own content again.
    AccidentalReupload,
    /// Someone else uploaded content that already exists.
    Stolen,
}

/// Video metadata row owned by the metadata store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoMetadata {
    pub id: Uuid,
    pub item_id: String,
    pub course_id: Uuid,
    pub video_file_id: Uuid,
    pub is_processing: bool,
    pub subtitle_file_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAccount {
    pub id: Uuid,
    pub shadow_banned: bool,
    pub used_storage_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Course {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub hidden: bool,
}
