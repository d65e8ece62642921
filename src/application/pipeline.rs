//! Sequential per-task processing: renditions, audio fingerprint, subtitles, manifests.

use crate::application::detector::FingerprintDetector;
use crate::config::PipelineConfig;
use crate::domain::jobs::{FingerprintVerdict, ProcessingTask};
use crate::domain::ladder::{RenditionSpec, VideoEncoder};
use crate::error::{ProcessingError, ProcessingResult};
use crate::ports::storage::{FileKind, StorageLocator};
use crate::ports::tools::{ToolInvocation, ToolOutput, ToolRunner};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error};
use uuid::Uuid;

/// What a successful run produced.
#[derive(Debug, Clone)]
pub struct ProcessedVideo {
    pub video_dir: PathBuf,
    pub renditions: Vec<RenditionSpec>,
    pub verdict: FingerprintVerdict,
    pub subtitle_path: PathBuf,
}

pub struct Pipeline {
    pub(super) config: Arc<PipelineConfig>,
    pub(super) tools: Arc<dyn ToolRunner>,
    pub(super) storage: Arc<dyn StorageLocator>,
    pub(super) detector: FingerprintDetector,
}

impl Pipeline {
    pub fn new(
        config: Arc<PipelineConfig>,
        tools: Arc<dyn ToolRunner>,
        storage: Arc<dyn StorageLocator>,
        detector: FingerprintDetector,
    ) -> Self {
        Self {
            config,
            tools,
            storage,
            detector,
        }
    }

    /// Per-video working directory.
    pub fn video_dir(&self, video_id: Uuid) -> PathBuf {
        self.storage.root(FileKind::Video).join(video_id.to_string())
    }

    /// Subtitle file produced for a video.
    pub fn subtitle_file(&self, video_id: Uuid) -> PathBuf {
        self.storage.root(FileKind::Subtitle).join(format!(
            "{}_vtt.{}",
            video_id,
            FileKind::Subtitle.extension()
        ))
    }

    /// Run every stage in order, stopping at the first failure.
    pub async fn process(&self, task: &ProcessingTask) -> ProcessingResult<ProcessedVideo> {
        let video_dir = self.video_dir(task.video_id);
        let source = absolute(&task.source_path)?;
        let renditions = RenditionSpec::from_heights(&self.config.video_qualities);
        let encoder = VideoEncoder::select(self.config.use_gpu);

        self.transcode_renditions(&source, &video_dir, &renditions, encoder)
            .await?;

        let audio = self.extract_audio(&source, task.video_id).await?;
        let verdict = self.fingerprint(task, &audio).await?;
        let subtitle_path = self.produce_subtitles(task.video_id, &audio).await?;
        drop(audio);

        self.write_manifests(&video_dir, &subtitle_path, &renditions)
            .await?;

        Ok(ProcessedVideo {
            video_dir,
            renditions,
            verdict,
            subtitle_path,
        })
    }

    /// Run a tool off the async threads and require a zero exit status.
    pub(super) async fn run_tool(
        &self,
        invocation: ToolInvocation,
    ) -> ProcessingResult<ToolOutput> {
        let tool = invocation.name();
        let tools = Arc::clone(&self.tools);
        debug!(%tool, args = ?invocation.args, cwd = ?invocation.cwd, "running tool");

        let output = tokio::task::spawn_blocking(move || tools.invoke(&invocation))
            .await
            .map_err(|e| ProcessingError::process(format!("{} task panicked: {}", tool, e)))?
            .map_err(|e| {
                error!(%tool, error = %e, "failed to run tool");
                ProcessingError::process(format!("failed to run {}: {}", tool, e))
            })?;

        if !output.succeeded() {
            error!(%tool, exit_code = ?output.exit_code, "tool exited with failure");
            return Err(ProcessingError::process(format!(
                "{} exited with code {:?}",
                tool, output.exit_code
            )));
        }
        Ok(output)
    }
}

fn absolute(path: &Path) -> ProcessingResult<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .map_err(|e| ProcessingError::process(format!("cannot resolve {:?}: {}", path, e)))
}

/// Pipeline over a temp base directory with in-memory stores.
#[cfg(test)]
pub(crate) fn test_pipeline(
    tools: crate::ports::tools::MockToolRunner,
    base: &Path,
    config: PipelineConfig,
) -> (Pipeline, crate::adapters::local::MemoryStore) {
    let store = crate::adapters::local::MemoryStore::new();
    let detector = FingerprintDetector::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(store.clone()),
    );
    let pipeline = Pipeline::new(
        Arc::new(config),
        Arc::new(tools),
        Arc::new(crate::adapters::local::FsStorage::under(base)),
        detector,
    );
    (pipeline, store)
}
