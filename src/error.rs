//! Error taxonomy for the processing pipeline.

use thiserror::Error;

/// Result type returned by every pipeline stage.
pub type ProcessingResult<T> = Result<T, ProcessingError>;

/// The two ways a task can fail. Neither is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingErrorKind {
    FailedToCreateOutputFile,
    FailedToProcess,
}

#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("failed to create output file: {0}")]
    FailedToCreateOutputFile(String),

    #[error("failed to process video: {0}")]
    FailedToProcess(String),
}

impl ProcessingError {
    pub fn output(message: impl Into<String>) -> Self {
        Self::FailedToCreateOutputFile(message.into())
    }

    pub fn process(message: impl Into<String>) -> Self {
        Self::FailedToProcess(message.into())
    }

    pub fn kind(&self) -> ProcessingErrorKind {
        match self {
            Self::FailedToCreateOutputFile(_) => ProcessingErrorKind::FailedToCreateOutputFile,
            Self::FailedToProcess(_) => ProcessingErrorKind::FailedToProcess,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    /// The producer gave up while waiting for space in a full queue.
    #[error("enqueue interrupted while waiting for queue capacity")]
    Interrupted,

    /// The worker side of the queue has been dropped.
    #[error("admission queue is closed")]
    Closed,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid video quality `{0}`, expected something like `720p`")]
    InvalidQuality(String),

    #[error("no video qualities configured")]
    NoQualities,

    #[error("invalid boolean `{value}` for {key}")]
    InvalidFlag { key: String, value: String },
}
