//! Configuration loaded from the environment.

use crate::error::ConfigError;
use std::env;
use std::path::PathBuf;

/// Fixed bound of the admission queue.
pub const QUEUE_CAPACITY: usize = 1024;

const DEFAULT_QUALITIES: &str = "1080p,720p,480p,360p";

/// Configuration for the video processing pipeline.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Root of per-video working directories
    pub video_dir: PathBuf,
    pub picture_dir: PathBuf,
    /// Root for produced subtitle files
    pub subtitle_dir: PathBuf,
    /// Rendition heights, in the order they are produced and listed
    pub video_qualities: Vec<u32>,
    pub use_gpu: bool,
    /// Run speech-to-text instead of copying `test_vtt_file`
    pub transcribe: bool,
    pub test_vtt_file: PathBuf,
    pub ffmpeg_path: PathBuf,
    pub fpcalc_path: PathBuf,
    pub whisper_cli_path: PathBuf,
    pub whisper_model_path: PathBuf,
    /// Remove the per-video directory when a task is abandoned
    pub cleanup_on_abort: bool,
}

impl PipelineConfig {
    /// Load configuration from environment variables, reading `.env` first.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = |key: &str, default: &str| {
            PathBuf::from(lookup(key).unwrap_or_else(|| default.to_string()))
        };
        let flag = |key: &str, default: bool| match lookup(key) {
            Some(value) => parse_flag(key, &value),
            None => Ok(default),
        };

        let qualities = lookup("VIDEO_QUALITIES").unwrap_or_else(|| DEFAULT_QUALITIES.to_string());

        Ok(Self {
            video_dir: path("VIDEO_DIR", "./media/videos"),
            picture_dir: path("PICTURE_DIR", "./media/pictures"),
            subtitle_dir: path("SUBTITLE_DIR", "./media/subtitles"),
            video_qualities: parse_qualities(&qualities)?,
            use_gpu: flag("USE_GPU", false)?,
            transcribe: flag("TRANSCRIBE", false)?,
            test_vtt_file: path("TEST_VTT_FILE", "./assets/placeholder.vtt"),
            ffmpeg_path: path("FFMPEG_PATH", "ffmpeg"),
            fpcalc_path: path("FPCALC_PATH", "fpcalc"),
            whisper_cli_path: path("WHISPER_CLI_PATH", "whisper-cli"),
            whisper_model_path: path("WHISPER_MODEL_PATH", "./models/ggml-base.en.bin"),
            cleanup_on_abort: flag("CLEANUP_ON_ABORT", true)?,
        })
    }
}

/// Parse a comma separated list like `1080p,720p` into heights.
pub fn parse_qualities(raw: &str) -> Result<Vec<u32>, ConfigError> {
    let heights = raw
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            entry
                .strip_suffix('p')
                .and_then(|height| height.parse::<u32>().ok())
                .filter(|height| *height > 0)
                .ok_or_else(|| ConfigError::InvalidQuality(entry.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if heights.is_empty() {
        return Err(ConfigError::NoQualities);
    }
    Ok(heights)
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidFlag {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}
