use crate::application::pipeline::Pipeline;
use crate::domain::hls::{
    MasterPlaylist, MediaPlaylist, MASTER_PLAYLIST, SUBTITLE_FILE, SUBTITLE_PLAYLIST,
};
use crate::domain::ladder::RenditionSpec;
use crate::error::{ProcessingError, ProcessingResult};
use std::path::Path;
use tokio::fs;
use tracing::{error, info};

fn write_error(path: &Path, e: std::io::Error) -> ProcessingError {
    error!(path = ?path, error = %e, "failed to write manifest output");
    ProcessingError::process(format!("failed to write {:?}: {}", path, e))
}

impl Pipeline {
    /// Place the subtitle track next to the renditions and write both playlists.
    pub(crate) async fn write_manifests(
        &self,
        video_dir: &Path,
        subtitle_path: &Path,
        renditions: &[RenditionSpec],
    ) -> ProcessingResult<()> {
        let subtitle_copy = video_dir.join(SUBTITLE_FILE);
        fs::copy(subtitle_path, &subtitle_copy)
            .await
            .map_err(|e| write_error(&subtitle_copy, e))?;

        let subtitle_playlist = video_dir.join(SUBTITLE_PLAYLIST);
        MediaPlaylist::subtitle_track()
            .write_to(&subtitle_playlist)
            .await
            .map_err(|e| write_error(&subtitle_playlist, e))?;

        let master_path = video_dir.join(MASTER_PLAYLIST);
        let master = MasterPlaylist::for_renditions(renditions);
        master
            .write_to(&master_path)
            .await
            .map_err(|e| write_error(&master_path, e))?;

        info!(dir = ?video_dir, variants = master.variants.len(), "manifests written");
        Ok(())
    }
}
