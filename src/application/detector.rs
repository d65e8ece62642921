//! Duplicate and stolen content detection on audio fingerprints.

use crate::domain::jobs::{FingerprintRecord, FingerprintVerdict};
use crate::error::{ProcessingError, ProcessingResult};
use crate::ports::repository::{
    CourseRepository, FingerprintRepository, SearchIndex, UserRepository,
};
use crate::ports::PortError;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

pub struct FingerprintDetector {
    fingerprints: Arc<dyn FingerprintRepository>,
    users: Arc<dyn UserRepository>,
    courses: Arc<dyn CourseRepository>,
    search: Arc<dyn SearchIndex>,
}

fn store_error(action: &str) -> impl FnOnce(PortError) -> ProcessingError + '_ {
    move |e| ProcessingError::process(format!("{}: {}", action, e))
}

impl FingerprintDetector {
    pub fn new(
        fingerprints: Arc<dyn FingerprintRepository>,
        users: Arc<dyn UserRepository>,
        courses: Arc<dyn CourseRepository>,
        search: Arc<dyn SearchIndex>,
    ) -> Self {
        Self {
            fingerprints,
            users,
            courses,
            search,
        }
    }

    /// Classify `record` against stored fingerprints and persist it when unique.
    ///
    /// A `Stolen` verdict shadow-bans the uploader, hides all of their courses and
    /// drops those courses from search before returning. The upload itself is
    /// not rejected.
    pub async fn examine_and_save(
        &self,
        record: &FingerprintRecord,
    ) -> ProcessingResult<FingerprintVerdict> {
        let existing = self
            .fingerprints
            .find_by_fingerprint(&record.fingerprint)
            .await
            .map_err(store_error("fingerprint lookup failed"))?;

        let verdict = match existing {
            None => {
                self.fingerprints
                    .save(record)
                    .await
                    .map_err(store_error("failed to save fingerprint"))?;
                FingerprintVerdict::Unique
            }
            Some(found) if found.author_id == record.author_id => {
                FingerprintVerdict::AccidentalReupload
            }
            Some(found) => {
                warn!(
                    uploader = %record.author_id,
                    original_author = %found.author_id,
                    original_item = %found.item_id,
                    "uploaded content matches another author's fingerprint"
                );
                self.punish(record.author_id).await?;
                FingerprintVerdict::Stolen
            }
        };

        info!(item = %record.item_id, ?verdict, "fingerprint examined");
        Ok(verdict)
    }

    async fn punish(&self, uploader_id: Uuid) -> ProcessingResult<()> {
        let Some(mut thief) = self
            .users
            .find_by_id(uploader_id)
            .await
            .map_err(store_error("user lookup failed"))?
        else {
            warn!(user = %uploader_id, "content thief's account not found, nothing to enforce");
            return Ok(());
        };

        thief.shadow_banned = true;
        self.users
            .save(&thief)
            .await
            .map_err(store_error("failed to shadow-ban user"))?;

        self.courses
            .hide_all_by_owner(uploader_id)
            .await
            .map_err(store_error("failed to hide courses"))?;
        let hidden = self
            .courses
            .find_hidden_by_owner(uploader_id)
            .await
            .map_err(store_error("hidden course lookup failed"))?;
        self.search
            .remove_courses(&hidden)
            .await
            .map_err(store_error("failed to remove courses from search"))?;

        warn!(user = %uploader_id, hidden_courses = hidden.len(), "user shadow-banned");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::local::MemoryStore;
    use crate::domain::jobs::{AudioFingerprint, Course, UserAccount};
    use crate::ports::repository::MockSearchIndex;

    fn record(author_id: Uuid, token: &str) -> FingerprintRecord {
        FingerprintRecord::for_video(
            Uuid::new_v4(),
            author_id,
            AudioFingerprint {
                duration: "42".to_string(),
                fingerprint: token.to_string(),
            },
        )
    }

    fn detector(store: &MemoryStore, search: Arc<dyn SearchIndex>) -> FingerprintDetector {
        FingerprintDetector::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            search,
        )
    }

    fn user(id: Uuid) -> UserAccount {
        UserAccount {
            id,
            shadow_banned: false,
            used_storage_bytes: 0,
        }
    }

    #[tokio::test]
    async fn test_unique_is_persisted_once() {
        let store = MemoryStore::new();
        let detector = detector(&store, Arc::new(store.clone()));
        let new = record(Uuid::new_v4(), "AQAAunique");

        let verdict = detector.examine_and_save(&new).await.unwrap();

        assert_eq!(verdict, FingerprintVerdict::Unique);
        assert_eq!(store.fingerprints().await, vec![new]);
    }

    #[tokio::test]
    async fn test_same_author_is_accidental_reupload() {
        let store = MemoryStore::new();
        let detector = detector(&store, Arc::new(store.clone()));
        let author = Uuid::new_v4();
        store.insert_user(user(author)).await;
        detector
            .examine_and_save(&record(author, "AQAAsame"))
            .await
            .unwrap();

        let verdict = detector
            .examine_and_save(&record(author, "AQAAsame"))
            .await
            .unwrap();

        assert_eq!(verdict, FingerprintVerdict::AccidentalReupload);
        assert_eq!(store.fingerprints().await.len(), 1);
        assert!(!store.user(author).await.unwrap().shadow_banned);
    }

    #[tokio::test]
    async fn test_other_author_is_stolen_and_punished() {
        let store = MemoryStore::new();
        let original = Uuid::new_v4();
        let thief = Uuid::new_v4();
        store.insert_user(user(thief)).await;

        let mut thief_courses = vec![Uuid::new_v4(), Uuid::new_v4()];
        thief_courses.sort();
        for id in &thief_courses {
            store
                .insert_course(Course {
                    id: *id,
                    owner_id: thief,
                    hidden: false,
                })
                .await;
        }
        let bystander = Course {
            id: Uuid::new_v4(),
            owner_id: original,
            hidden: false,
        };
        store.insert_course(bystander.clone()).await;
        FingerprintRepository::save(&store, &record(original, "AQAAshared"))
            .await
            .unwrap();

        let expected = thief_courses.clone();
        let mut search = MockSearchIndex::new();
        search
            .expect_remove_courses()
            .withf(move |ids: &[Uuid]| {
                let mut ids = ids.to_vec();
                ids.sort();
                ids == expected
            })
            .times(1)
            .returning(|_| Ok(()));

        let detector = detector(&store, Arc::new(search));
        let verdict = detector
            .examine_and_save(&record(thief, "AQAAshared"))
            .await
            .unwrap();

        assert_eq!(verdict, FingerprintVerdict::Stolen);
        assert!(store.user(thief).await.unwrap().shadow_banned);
        for id in &thief_courses {
            assert!(store.course(*id).await.unwrap().hidden);
        }
        assert!(!store.course(bystander.id).await.unwrap().hidden);
        assert_eq!(store.fingerprints().await.len(), 1);
    }

    #[tokio::test]
    async fn test_stolen_with_unknown_account_skips_enforcement() {
        let store = MemoryStore::new();
        FingerprintRepository::save(&store, &record(Uuid::new_v4(), "AQAAtaken"))
            .await
            .unwrap();

        let mut search = MockSearchIndex::new();
        search.expect_remove_courses().never();

        let verdict = detector(&store, Arc::new(search))
            .examine_and_save(&record(Uuid::new_v4(), "AQAAtaken"))
            .await
            .unwrap();

        assert_eq!(verdict, FingerprintVerdict::Stolen);
    }
}
