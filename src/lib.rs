//! Lectern - Uploaded video processing pipeline
//!
//! Hexagonal Architecture:
//! - domain/: Pure business logic (bitrate ladder, playlists, subtitles, fingerprints)
//! - ports/: Trait definitions for stores, storage and external tools
//! - adapters/: Concrete implementations
//! - application/: Admission queue, worker and pipeline stages
//! - config: Environment configuration
//! - error: Error types

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;

// Re-exports for convenience
pub use application::{admission_queue, AdmissionQueue, WorkerService};
pub use config::PipelineConfig;
pub use error::{ProcessingError, QueueError};
