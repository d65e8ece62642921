//! Monolith Binary - Single-process pipeline over local adapters
//!
//! Wires up:
//! - In-memory stores and local filesystem storage
//! - External tools run as child processes
//! - One worker draining the admission queue
//!
//! Each command line argument is an uploaded video to process.

use lectern::adapters::local::{FsStorage, MemoryStore, ProcessRunner};
use lectern::application::{admission_queue, Stores, WorkerService};
use lectern::config::{PipelineConfig, QUEUE_CAPACITY};
use lectern::domain::jobs::{ProcessingTask, UserAccount, VideoMetadata};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = match PipelineConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };

    // 1. Adapters
    let store = MemoryStore::new();
    let storage = FsStorage::from_config(&config);

    // 2. Worker
    let (queue, tasks) = admission_queue(QUEUE_CAPACITY);
    let shutdown = CancellationToken::new();
    let worker = WorkerService::new(
        config,
        Arc::new(ProcessRunner::new()),
        Arc::new(storage),
        Stores::shared(store.clone()),
    );
    let worker = worker.spawn(tasks, shutdown.clone());

    let on_signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, stopping after the current task");
            on_signal.cancel();
        }
    });

    // 3. Admit uploads
    let uploader_id = Uuid::new_v4();
    let course_id = Uuid::new_v4();
    store
        .insert_user(UserAccount {
            id: uploader_id,
            shadow_banned: false,
            used_storage_bytes: 0,
        })
        .await;

    for path in std::env::args().skip(1) {
        let video_id = Uuid::new_v4();
        store
            .insert_metadata(VideoMetadata {
                id: Uuid::new_v4(),
                item_id: format!("VM_{}", video_id),
                course_id,
                video_file_id: video_id,
                is_processing: true,
                subtitle_file_name: None,
            })
            .await;

        let task = ProcessingTask::new(PathBuf::from(&path), course_id, video_id, uploader_id);
        match queue.enqueue_cancellable(task, &shutdown).await {
            Ok(()) => info!(%video_id, %path, "upload admitted"),
            Err(e) => {
                warn!(%path, error = %e, "upload not admitted");
                break;
            }
        }
    }
    drop(queue);

    // 4. Drain
    if let Err(e) = worker.await {
        error!(error = %e, "worker task failed");
        std::process::exit(1);
    }

    if let Some(user) = store.user(uploader_id).await {
        info!(used_storage_bytes = user.used_storage_bytes, "all uploads handled");
    }
}
