use crate::application::detector::FingerprintDetector;
use crate::application::pipeline::{Pipeline, ProcessedVideo};
use crate::application::queue::TaskReceiver;
use crate::config::PipelineConfig;
use crate::domain::jobs::ProcessingTask;
use crate::error::ProcessingError;
use crate::ports::repository::{
    CourseRepository, FingerprintRepository, SearchIndex, UserRepository, VideoMetadataRepository,
};
use crate::ports::storage::StorageLocator;
use crate::ports::tools::ToolRunner;
use crate::ports::PortError;
use std::io;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;
use walkdir::WalkDir;

/// Stores the worker reads and updates.
#[derive(Clone)]
pub struct Stores {
    pub metadata: Arc<dyn VideoMetadataRepository>,
    pub users: Arc<dyn UserRepository>,
    pub fingerprints: Arc<dyn FingerprintRepository>,
    pub courses: Arc<dyn CourseRepository>,
    pub search: Arc<dyn SearchIndex>,
}

impl Stores {
    /// Every store backed by the same value.
    pub fn shared<S>(store: S) -> Self
    where
        S: VideoMetadataRepository
            + UserRepository
            + FingerprintRepository
            + CourseRepository
            + SearchIndex
            + Clone
            + 'static,
    {
        Self {
            metadata: Arc::new(store.clone()),
            users: Arc::new(store.clone()),
            fingerprints: Arc::new(store.clone()),
            courses: Arc::new(store.clone()),
            search: Arc::new(store),
        }
    }
}

#[derive(Debug, Error)]
pub enum FinalizeError {
    #[error("no metadata for video file {0}")]
    MetadataNotFound(Uuid),

    #[error("uploader {0} not found")]
    UserNotFound(Uuid),

    #[error("store request failed: {0}")]
    Store(#[from] PortError),
}

/// How a dequeued task ended.
#[derive(Debug)]
pub enum TaskOutcome {
    /// Processed and recorded; carries the bytes charged to the uploader.
    Completed(ProcessedVideo, u64),
    /// A stage failed; nothing was recorded.
    Abandoned(ProcessingError),
    /// Processing finished but recording it did not.
    Unrecorded(ProcessedVideo, FinalizeError),
}

pub struct WorkerService {
    pipeline: Pipeline,
    metadata: Arc<dyn VideoMetadataRepository>,
    users: Arc<dyn UserRepository>,
    cleanup_on_abort: bool,
}

impl WorkerService {
    pub fn new(
        config: PipelineConfig,
        tools: Arc<dyn ToolRunner>,
        storage: Arc<dyn StorageLocator>,
        stores: Stores,
    ) -> Self {
        let cleanup_on_abort = config.cleanup_on_abort;
        let detector = FingerprintDetector::new(
            stores.fingerprints,
            Arc::clone(&stores.users),
            stores.courses,
            stores.search,
        );
        Self {
            pipeline: Pipeline::new(Arc::new(config), tools, storage, detector),
            metadata: stores.metadata,
            users: stores.users,
            cleanup_on_abort,
        }
    }

    /// Run the loop on its own task.
    pub fn spawn(self, tasks: TaskReceiver, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move { self.run_worker_loop(tasks, shutdown).await })
    }

    /// Process tasks one at a time until shutdown or until every producer is gone.
    pub async fn run_worker_loop(&self, mut tasks: TaskReceiver, shutdown: CancellationToken) {
        info!("worker started");
        while let Some(task) = tasks.dequeue(&shutdown).await {
            self.handle_task(task).await;
        }
        info!("worker stopped");
    }

    pub async fn handle_task(&self, task: ProcessingTask) -> TaskOutcome {
        info!(
            video_id = %task.video_id,
            source = ?task.source_path,
            "processing started"
        );

        let processed = match self.pipeline.process(&task).await {
            Ok(processed) => processed,
            Err(e) => {
                error!(video_id = %task.video_id, error = %e, "processing abandoned");
                if self.cleanup_on_abort {
                    self.remove_partial_output(task.video_id).await;
                }
                return TaskOutcome::Abandoned(e);
            }
        };

        match self.finalize(&task, &processed).await {
            Ok(bytes) => {
                info!(
                    video_id = %task.video_id,
                    verdict = ?processed.verdict,
                    stored_bytes = bytes,
                    "processing finished"
                );
                TaskOutcome::Completed(processed, bytes)
            }
            Err(e) => {
                error!(video_id = %task.video_id, error = %e, "failed to record processed video");
                TaskOutcome::Unrecorded(processed, e)
            }
        }
    }

    async fn finalize(
        &self,
        task: &ProcessingTask,
        processed: &ProcessedVideo,
    ) -> Result<u64, FinalizeError> {
        if let Err(e) = tokio::fs::remove_file(&task.source_path).await {
            warn!(source = ?task.source_path, error = %e, "failed to delete original upload");
        }

        let mut metadata = self
            .metadata
            .find_by_file_id(task.video_id)
            .await?
            .ok_or(FinalizeError::MetadataNotFound(task.video_id))?;
        metadata.is_processing = false;
        metadata.subtitle_file_name = processed
            .subtitle_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());
        self.metadata.save(&metadata).await?;

        let mut user = self
            .users
            .find_by_id(task.uploader_id)
            .await?
            .ok_or(FinalizeError::UserNotFound(task.uploader_id))?;
        let bytes = directory_size(&processed.video_dir).await;
        user.used_storage_bytes = user.used_storage_bytes.saturating_add(bytes);
        self.users.save(&user).await?;

        Ok(bytes)
    }

    /// Drop the per-video directory and the produced subtitle of an abandoned task.
    async fn remove_partial_output(&self, video_id: Uuid) {
        let video_dir = self.pipeline.video_dir(video_id);
        match tokio::fs::remove_dir_all(&video_dir).await {
            Ok(()) => info!(dir = ?video_dir, "removed partial output"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(dir = ?video_dir, error = %e, "failed to remove partial output"),
        }

        let subtitle = self.pipeline.subtitle_file(video_id);
        match tokio::fs::remove_file(&subtitle).await {
            Ok(()) => info!(path = ?subtitle, "removed partial subtitles"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = ?subtitle, error = %e, "failed to remove partial subtitles"),
        }
    }
}

/// Total size of the regular files below `dir`.
pub async fn directory_size(dir: &Path) -> u64 {
    let dir = dir.to_path_buf();
    tokio::task::spawn_blocking(move || {
        WalkDir::new(&dir)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| entry.metadata().ok())
            .map(|meta| meta.len())
            .sum::<u64>()
    })
    .await
    .unwrap_or_else(|e| {
        warn!(error = %e, "directory size computation panicked");
        0
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::local::{FsStorage, MemoryStore};
    use crate::domain::jobs::{UserAccount, VideoMetadata};
    use crate::error::ProcessingErrorKind;
    use crate::ports::tools::{MockToolRunner, ToolInvocation, ToolOutput};
    use std::path::PathBuf;

    const FPCALC_STDOUT: &str = "DURATION=60\nFINGERPRINT=AQADworker\n";

    struct Fixture {
        dir: tempfile::TempDir,
        store: MemoryStore,
        task: ProcessingTask,
    }

    impl Fixture {
        async fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let source = dir.path().join("upload.mp4");
            std::fs::write(&source, b"raw upload").unwrap();

            let store = MemoryStore::new();
            let task = ProcessingTask::new(source, Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
            store
                .insert_user(UserAccount {
                    id: task.uploader_id,
                    shadow_banned: false,
                    used_storage_bytes: 100,
                })
                .await;
            store
                .insert_metadata(VideoMetadata {
                    id: Uuid::new_v4(),
                    item_id: format!("VM_{}", task.video_id),
                    course_id: task.course_id,
                    video_file_id: task.video_id,
                    is_processing: true,
                    subtitle_file_name: None,
                })
                .await;
            Self { dir, store, task }
        }

        fn worker(&self, tools: MockToolRunner) -> WorkerService {
            let placeholder = self.dir.path().join("placeholder.vtt");
            std::fs::write(&placeholder, "WEBVTT\n\n00:00:00.000 --> 00:00:01.000\nhi\n").unwrap();
            let placeholder = placeholder.to_string_lossy().into_owned();
            let config = PipelineConfig::from_lookup(move |key| match key {
                "VIDEO_QUALITIES" => Some("720p,360p".to_string()),
                "TEST_VTT_FILE" => Some(placeholder.clone()),
                _ => None,
            })
            .unwrap();
            WorkerService::new(
                config,
                Arc::new(tools),
                Arc::new(FsStorage::under(self.dir.path())),
                Stores::shared(self.store.clone()),
            )
        }

        fn video_dir(&self) -> PathBuf {
            self.dir
                .path()
                .join("videos")
                .join(self.task.video_id.to_string())
        }
    }

    /// Writes what ffmpeg would write and answers fpcalc.
    fn fake_tools() -> MockToolRunner {
        let mut tools = MockToolRunner::new();
        tools.expect_invoke().returning(|inv: &ToolInvocation| {
            if inv.name() == "fpcalc" {
                return Ok(ToolOutput::success(FPCALC_STDOUT));
            }
            let cwd = inv.cwd.clone().unwrap();
            let output = cwd.join(inv.args.last().unwrap());
            std::fs::write(output, vec![0u8; 64]).unwrap();
            Ok(ToolOutput::success(""))
        });
        tools
    }

    #[tokio::test]
    async fn test_successful_task_is_recorded() {
        let fixture = Fixture::new().await;
        let worker = fixture.worker(fake_tools());

        let outcome = worker.handle_task(fixture.task.clone()).await;

        let TaskOutcome::Completed(processed, bytes) = outcome else {
            panic!("expected completion, got {:?}", outcome);
        };
        let video_dir = fixture.video_dir();
        assert_eq!(processed.video_dir, video_dir);
        assert!(video_dir.join("master.m3u8").exists());
        assert!(video_dir.join("sub.m3u8").exists());
        assert!(video_dir.join("subtitle.vtt").exists());
        assert!(!fixture.task.source_path.exists());
        assert!(!fixture
            .dir
            .path()
            .join("videos")
            .join(format!("{}_pcm16.wav", fixture.task.video_id))
            .exists());

        let metadata = fixture.store.metadata(fixture.task.video_id).await.unwrap();
        assert!(!metadata.is_processing);
        assert_eq!(
            metadata.subtitle_file_name,
            Some(format!("{}_vtt.vtt", fixture.task.video_id))
        );

        assert_eq!(bytes, directory_size(&video_dir).await);
        assert!(bytes > 0);
        let user = fixture.store.user(fixture.task.uploader_id).await.unwrap();
        assert_eq!(user.used_storage_bytes, 100 + bytes);
    }

    #[tokio::test]
    async fn test_failed_transcode_records_nothing() {
        let fixture = Fixture::new().await;
        let mut tools = MockToolRunner::new();
        tools
            .expect_invoke()
            .times(1)
            .returning(|_| Ok(ToolOutput::failure(1)));
        let worker = fixture.worker(tools);

        let outcome = worker.handle_task(fixture.task.clone()).await;

        let TaskOutcome::Abandoned(e) = outcome else {
            panic!("expected abandonment, got {:?}", outcome);
        };
        assert_eq!(e.kind(), ProcessingErrorKind::FailedToProcess);
        assert!(fixture.task.source_path.exists());
        assert!(!fixture.video_dir().exists());
        assert!(fixture.store.fingerprints().await.is_empty());

        let metadata = fixture.store.metadata(fixture.task.video_id).await.unwrap();
        assert!(metadata.is_processing);
        assert_eq!(metadata.subtitle_file_name, None);
        let user = fixture.store.user(fixture.task.uploader_id).await.unwrap();
        assert_eq!(user.used_storage_bytes, 100);
    }

    #[tokio::test]
    async fn test_failed_manifest_removes_produced_subtitles() {
        let fixture = Fixture::new().await;
        let mut tools = MockToolRunner::new();
        tools.expect_invoke().returning(|inv: &ToolInvocation| {
            if inv.name() == "fpcalc" {
                return Ok(ToolOutput::success(FPCALC_STDOUT));
            }
            let cwd = inv.cwd.clone().unwrap();
            std::fs::write(cwd.join(inv.args.last().unwrap()), vec![0u8; 8]).unwrap();
            // a directory where the subtitle copy should go
            if inv.has_arg("-hls_time") {
                std::fs::create_dir_all(cwd.join("subtitle.vtt")).unwrap();
            }
            Ok(ToolOutput::success(""))
        });
        let worker = fixture.worker(tools);
        let subtitle = fixture
            .dir
            .path()
            .join("subtitles")
            .join(format!("{}_vtt.vtt", fixture.task.video_id));

        let outcome = worker.handle_task(fixture.task.clone()).await;

        assert!(matches!(outcome, TaskOutcome::Abandoned(_)));
        assert!(!subtitle.exists());
        assert!(!fixture.video_dir().exists());
        assert!(fixture.task.source_path.exists());
    }

    #[tokio::test]
    async fn test_missing_metadata_skips_storage_accounting() {
        let fixture = Fixture::new().await;
        let worker = fixture.worker(fake_tools());
        let mut task = fixture.task.clone();
        task.video_id = Uuid::new_v4();

        let outcome = worker.handle_task(task).await;

        assert!(matches!(
            outcome,
            TaskOutcome::Unrecorded(_, FinalizeError::MetadataNotFound(_))
        ));
        let user = fixture.store.user(fixture.task.uploader_id).await.unwrap();
        assert_eq!(user.used_storage_bytes, 100);
    }

    #[tokio::test]
    async fn test_loop_drains_queue_then_stops() {
        let fixture = Fixture::new().await;
        let worker = fixture.worker(fake_tools());
        let (queue, tasks) = crate::application::queue::admission_queue(4);
        queue.enqueue(fixture.task.clone()).await.unwrap();
        drop(queue);

        worker
            .spawn(tasks, CancellationToken::new())
            .await
            .unwrap();

        let metadata = fixture.store.metadata(fixture.task.video_id).await.unwrap();
        assert!(!metadata.is_processing);
    }

    #[tokio::test]
    async fn test_directory_size_counts_nested_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("v720")).unwrap();
        std::fs::write(dir.path().join("master.m3u8"), vec![0u8; 10]).unwrap();
        std::fs::write(dir.path().join("v720").join("seg_000.ts"), vec![0u8; 32]).unwrap();

        assert_eq!(directory_size(dir.path()).await, 42);
        assert_eq!(directory_size(&dir.path().join("missing")).await, 0);
    }
}
