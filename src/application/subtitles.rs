use crate::application::audio::TempAudio;
use crate::application::pipeline::Pipeline;
use crate::domain::vtt;
use crate::error::{ProcessingError, ProcessingResult};
use crate::ports::storage::FileKind;
use crate::ports::tools::ToolInvocation;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, warn};
use uuid::Uuid;

impl Pipeline {
    /// Produce `<subtitle root>/<id>_vtt.vtt`, transcribing or copying the placeholder.
    ///
    /// A file that fails validation is kept; the problem is only logged.
    pub(crate) async fn produce_subtitles(
        &self,
        video_id: Uuid,
        audio: &TempAudio,
    ) -> ProcessingResult<PathBuf> {
        let vtt_path = self
            .storage
            .new_file(&format!("{}_vtt", video_id), FileKind::Subtitle)
            .map_err(|e| {
                error!(%video_id, error = %e, "failed to create subtitle file");
                ProcessingError::process(format!("failed to create the output VTT file: {}", e))
            })?;

        if self.config.transcribe {
            self.transcribe(video_id, audio, &vtt_path).await?;
        } else {
            fs::copy(&self.config.test_vtt_file, &vtt_path)
                .await
                .map_err(|e| {
                    error!(
                        source = ?self.config.test_vtt_file,
                        error = %e,
                        "failed to copy placeholder subtitles"
                    );
                    ProcessingError::process(format!(
                        "failed to copy {:?}: {}",
                        self.config.test_vtt_file, e
                    ))
                })?;
        }

        match vtt::validate_vtt_file(&vtt_path).await {
            Ok(cues) => info!(%video_id, cues, "subtitles ready"),
            Err(e) => warn!(
                %video_id,
                path = ?vtt_path,
                error = %e,
                "subtitle file failed validation"
            ),
        }
        Ok(vtt_path)
    }

    async fn transcribe(
        &self,
        video_id: Uuid,
        audio: &TempAudio,
        vtt_path: &Path,
    ) -> ProcessingResult<()> {
        let invocation = ToolInvocation::new(&self.config.whisper_cli_path)
            .arg("-m")
            .arg(&self.config.whisper_model_path)
            .arg("-f")
            .arg(audio.path());
        let output = self.run_tool(invocation).await.map_err(|e| {
            error!(%video_id, error = %e, "speech-to-text failed");
            e
        })?;

        let transcript = tempfile::Builder::new()
            .prefix(&format!("{}_temp", video_id))
            .suffix(".txt")
            .tempfile_in(self.storage.root(FileKind::Subtitle))
            .map_err(|e| {
                ProcessingError::process(format!("failed to create transcript file: {}", e))
            })?;

        fs::write(transcript.path(), output.stdout.as_bytes())
            .await
            .map_err(|e| ProcessingError::process(format!("failed to write transcript: {}", e)))?;

        vtt::convert_file(transcript.path(), vtt_path)
            .await
            .map_err(|e| {
                error!(%video_id, error = %e, "transcript conversion failed");
                ProcessingError::process(format!("failed to convert transcript: {}", e))
            })?;

        if let Err(e) = transcript.close() {
            warn!(%video_id, error = %e, "failed to remove transcript file");
        }
        Ok(())
    }
}
