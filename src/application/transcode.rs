use crate::application::pipeline::Pipeline;
use crate::domain::ladder::{RenditionSpec, VideoEncoder};
use crate::error::{ProcessingError, ProcessingResult};
use crate::ports::tools::ToolInvocation;
use std::path::Path;
use tokio::fs;
use tracing::{error, info};

const AUDIO_BITRATE: &str = "128k";
const GOP_SIZE: &str = "48";
const SEGMENT_SECONDS: &str = "2";

/// ffmpeg call producing one HLS rendition, relative to the per-video directory.
pub(crate) fn transcode_invocation(
    ffmpeg: &Path,
    source: &Path,
    spec: &RenditionSpec,
    encoder: VideoEncoder,
) -> ToolInvocation {
    ToolInvocation::new(ffmpeg)
        .arg("-y")
        .arg("-i")
        .arg(source)
        .args(["-c:v", encoder.codec()])
        .args(["-preset", encoder.preset()])
        .args(["-profile:v", "main"])
        .arg("-b:v")
        .arg(format!("{}k", spec.target_kbps))
        .arg("-maxrate")
        .arg(format!("{}k", spec.max_kbps))
        .arg("-bufsize")
        .arg(format!("{}k", spec.buffer_kbps))
        .arg("-vf")
        .arg(format!("scale=-2:{}", spec.height))
        .args(["-c:a", "aac", "-ac", "2", "-b:a", AUDIO_BITRATE])
        .args(["-g", GOP_SIZE])
        .args(["-force_key_frames", "expr:gte(t,n_forced*2)"])
        .args(["-fflags", "+genpts", "-start_at_zero"])
        .args(["-hls_time", SEGMENT_SECONDS, "-hls_list_size", "0"])
        .arg("-hls_segment_filename")
        .arg(spec.segment_pattern())
        .arg(spec.playlist_uri())
}

impl Pipeline {
    /// Produce every rendition in configured order. The first failure aborts the rest.
    pub(crate) async fn transcode_renditions(
        &self,
        source: &Path,
        video_dir: &Path,
        renditions: &[RenditionSpec],
        encoder: VideoEncoder,
    ) -> ProcessingResult<()> {
        for spec in renditions {
            self.transcode_rendition(source, video_dir, spec, encoder)
                .await?;
        }
        Ok(())
    }

    async fn transcode_rendition(
        &self,
        source: &Path,
        video_dir: &Path,
        spec: &RenditionSpec,
        encoder: VideoEncoder,
    ) -> ProcessingResult<()> {
        let rendition_dir = video_dir.join(spec.dir_name());
        fs::create_dir_all(&rendition_dir).await.map_err(|e| {
            error!(dir = ?rendition_dir, error = %e, "failed to create rendition directory");
            ProcessingError::output(format!("{:?}: {}", rendition_dir, e))
        })?;

        let invocation = transcode_invocation(&self.config.ffmpeg_path, source, spec, encoder)
            .current_dir(video_dir);
        self.run_tool(invocation).await.map_err(|e| {
            error!(height = spec.height, error = %e, "transcoding failed");
            e
        })?;

        info!(
            height = spec.height,
            width = spec.width,
            codec = encoder.codec(),
            "rendition ready"
        );
        Ok(())
    }
}
