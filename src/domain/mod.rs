//! Domain layer - Pure business logic.

pub mod fingerprint;
pub mod hls;
pub mod jobs;
pub mod ladder;
pub mod vtt;
