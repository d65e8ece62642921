use super::PortError;
use crate::domain::jobs::{FingerprintRecord, UserAccount, VideoMetadata};
use async_trait::async_trait;
use uuid::Uuid;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VideoMetadataRepository: Send + Sync {
    /// Find the metadata row whose video file id matches
    async fn find_by_file_id(&self, video_id: Uuid) -> Result<Option<VideoMetadata>, PortError>;

    async fn save(&self, metadata: &VideoMetadata) -> Result<(), PortError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<UserAccount>, PortError>;

    async fn save(&self, user: &UserAccount) -> Result<(), PortError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FingerprintRepository: Send + Sync {
    /// Exact match on the fingerprint token
    async fn find_by_fingerprint(
        &self,
        fingerprint: &str,
    ) -> Result<Option<FingerprintRecord>, PortError>;

    async fn save(&self, record: &FingerprintRecord) -> Result<(), PortError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CourseRepository: Send + Sync {
    async fn hide_all_by_owner(&self, owner_id: Uuid) -> Result<(), PortError>;

    /// Ids of the owner's hidden courses
    async fn find_hidden_by_owner(&self, owner_id: Uuid) -> Result<Vec<Uuid>, PortError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SearchIndex: Send + Sync {
    async fn remove_courses(&self, course_ids: &[Uuid]) -> Result<(), PortError>;
}
