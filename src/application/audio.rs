use crate::application::pipeline::Pipeline;
use crate::domain::fingerprint::parse_fpcalc_output;
use crate::domain::jobs::{FingerprintRecord, FingerprintVerdict, ProcessingTask};
use crate::error::{ProcessingError, ProcessingResult};
use crate::ports::storage::FileKind;
use crate::ports::tools::ToolInvocation;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Extracted PCM audio. The file is removed when this is dropped.
#[derive(Debug)]
pub(crate) struct TempAudio {
    path: PathBuf,
}

impl TempAudio {
    #[cfg(test)]
    pub(crate) fn at(path: PathBuf) -> Self {
        Self { path }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempAudio {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = ?self.path, "removed extracted audio"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = ?self.path, error = %e, "failed to remove extracted audio"),
        }
    }
}

pub(crate) fn wav_file_name(video_id: Uuid) -> String {
    format!("{}_pcm16.wav", video_id)
}

impl Pipeline {
    /// Decode the source audio track to 16-bit PCM WAV in the video root.
    pub(crate) async fn extract_audio(
        &self,
        source: &Path,
        video_id: Uuid,
    ) -> ProcessingResult<TempAudio> {
        let root = self.storage.root(FileKind::Video);
        fs::create_dir_all(&root).await.map_err(|e| {
            error!(dir = ?root, error = %e, "failed to create video root");
            ProcessingError::output(format!("{:?}: {}", root, e))
        })?;

        let name = wav_file_name(video_id);
        let audio = TempAudio {
            path: root.join(&name),
        };

        let invocation = ToolInvocation::new(&self.config.ffmpeg_path)
            .arg("-y")
            .arg("-i")
            .arg(source)
            .args(["-acodec", "pcm_s16le"])
            .arg(&name)
            .current_dir(&root);
        self.run_tool(invocation).await.map_err(|e| {
            error!(%video_id, error = %e, "audio extraction failed");
            e
        })?;

        debug!(path = ?audio.path(), "audio extracted");
        Ok(audio)
    }

    /// Fingerprint the extracted audio and run duplicate detection on it.
    pub(crate) async fn fingerprint(
        &self,
        task: &ProcessingTask,
        audio: &TempAudio,
    ) -> ProcessingResult<FingerprintVerdict> {
        let invocation = ToolInvocation::new(&self.config.fpcalc_path).arg(audio.path());
        let output = self.run_tool(invocation).await?;

        let fingerprint = parse_fpcalc_output(&output.stdout).ok_or_else(|| {
            error!(video_id = %task.video_id, "fingerprinter produced no usable output");
            ProcessingError::process("audio fingerprint is empty or malformed")
        })?;

        let record = FingerprintRecord::for_video(task.video_id, task.uploader_id, fingerprint);
        let verdict = self.detector.examine_and_save(&record).await?;
        match verdict {
            FingerprintVerdict::Unique => {
                info!(video_id = %task.video_id, "audio fingerprint is unique")
            }
            FingerprintVerdict::AccidentalReupload => warn!(
                video_id = %task.video_id,
                uploader = %task.uploader_id,
                "uploader already published this content"
            ),
            FingerprintVerdict::Stolen => warn!(
                video_id = %task.video_id,
                uploader = %task.uploader_id,
                "content belongs to another author, processing continues"
            ),
        }
        Ok(verdict)
    }
}
