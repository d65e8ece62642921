//! In-memory collaborators for single-process deployment and tests.

use crate::domain::jobs::{Course, FingerprintRecord, UserAccount, VideoMetadata};
use crate::ports::repository::{
    CourseRepository, FingerprintRepository, SearchIndex, UserRepository, VideoMetadataRepository,
};
use crate::ports::PortError;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    metadata: HashMap<Uuid, VideoMetadata>,
    users: HashMap<Uuid, UserAccount>,
    fingerprints: Vec<FingerprintRecord>,
    courses: HashMap<Uuid, Course>,
    search_index: HashSet<Uuid>,
}

/// Implements every store port over shared maps. Clones share state.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_user(&self, user: UserAccount) {
        self.tables.write().await.users.insert(user.id, user);
    }

    pub async fn insert_metadata(&self, metadata: VideoMetadata) {
        self.tables
            .write()
            .await
            .metadata
            .insert(metadata.video_file_id, metadata);
    }

    /// Adds a course and indexes it for search.
    pub async fn insert_course(&self, course: Course) {
        let mut tables = self.tables.write().await;
        tables.search_index.insert(course.id);
        tables.courses.insert(course.id, course);
    }

    pub async fn user(&self, id: Uuid) -> Option<UserAccount> {
        self.tables.read().await.users.get(&id).cloned()
    }

    pub async fn metadata(&self, video_id: Uuid) -> Option<VideoMetadata> {
        self.tables.read().await.metadata.get(&video_id).cloned()
    }

    pub async fn course(&self, id: Uuid) -> Option<Course> {
        self.tables.read().await.courses.get(&id).cloned()
    }

    pub async fn fingerprints(&self) -> Vec<FingerprintRecord> {
        self.tables.read().await.fingerprints.clone()
    }

    pub async fn is_indexed(&self, course_id: Uuid) -> bool {
        self.tables.read().await.search_index.contains(&course_id)
    }
}

#[async_trait]
impl VideoMetadataRepository for MemoryStore {
    async fn find_by_file_id(&self, video_id: Uuid) -> Result<Option<VideoMetadata>, PortError> {
        Ok(self.metadata(video_id).await)
    }

    async fn save(&self, metadata: &VideoMetadata) -> Result<(), PortError> {
        self.insert_metadata(metadata.clone()).await;
        Ok(())
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<UserAccount>, PortError> {
        Ok(self.user(user_id).await)
    }

    async fn save(&self, user: &UserAccount) -> Result<(), PortError> {
        self.insert_user(user.clone()).await;
        Ok(())
    }
}

#[async_trait]
impl FingerprintRepository for MemoryStore {
    async fn find_by_fingerprint(
        &self,
        fingerprint: &str,
    ) -> Result<Option<FingerprintRecord>, PortError> {
        let tables = self.tables.read().await;
        Ok(tables
            .fingerprints
            .iter()
            .find(|record| record.fingerprint == fingerprint)
            .cloned())
    }

    async fn save(&self, record: &FingerprintRecord) -> Result<(), PortError> {
        self.tables.write().await.fingerprints.push(record.clone());
        Ok(())
    }
}

#[async_trait]
impl CourseRepository for MemoryStore {
    async fn hide_all_by_owner(&self, owner_id: Uuid) -> Result<(), PortError> {
        let mut tables = self.tables.write().await;
        tables
            .courses
            .values_mut()
            .filter(|course| course.owner_id == owner_id)
            .for_each(|course| course.hidden = true);
        Ok(())
    }

    async fn find_hidden_by_owner(&self, owner_id: Uuid) -> Result<Vec<Uuid>, PortError> {
        let tables = self.tables.read().await;
        let mut ids: Vec<Uuid> = tables
            .courses
            .values()
            .filter(|course| course.owner_id == owner_id && course.hidden)
            .map(|course| course.id)
            .collect();
        ids.sort();
        Ok(ids)
    }
}

#[async_trait]
impl SearchIndex for MemoryStore {
    async fn remove_courses(&self, course_ids: &[Uuid]) -> Result<(), PortError> {
        let mut tables = self.tables.write().await;
        for id in course_ids {
            tables.search_index.remove(id);
        }
        Ok(())
    }
}
