//! Application layer - Services that drive the pipeline through ports.

pub mod audio;
pub mod detector;
pub mod manifest;
pub mod pipeline;
pub mod queue;
pub mod subtitles;
pub mod transcode;
pub mod worker;

pub use pipeline::{Pipeline, ProcessedVideo};
pub use queue::{admission_queue, AdmissionQueue, TaskReceiver};
pub use worker::{Stores, TaskOutcome, WorkerService};
