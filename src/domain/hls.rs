use crate::domain::ladder::{is_known_height, RenditionSpec};
use std::path::Path;
use tokio::fs;

/// Duration used for the single subtitle entry, since subtitles are not segmented.
pub const SUBTITLE_SENTINEL_DURATION: u64 = 9999;
pub const SUBTITLE_GROUP_ID: &str = "subs";
pub const SUBTITLE_PLAYLIST: &str = "sub.m3u8";
pub const SUBTITLE_FILE: &str = "subtitle.vtt";
pub const MASTER_PLAYLIST: &str = "master.m3u8";

pub struct MediaSegment {
    pub duration: f64,
    pub uri: String,
}

pub struct MediaPlaylist {
    pub version: u8,
    pub target_duration: u64,
    pub media_sequence: u64,
    pub segments: Vec<MediaSegment>,
    pub end_list: bool,
}

impl MediaPlaylist {
    pub fn new(target_duration: u64) -> Self {
        Self {
            version: 3,
            target_duration,
            media_sequence: 0,
            segments: Vec::new(),
            end_list: true,
        }
    }

    /// The whole subtitle track as one very long entry.
    pub fn subtitle_track() -> Self {
        let mut playlist = Self::new(SUBTITLE_SENTINEL_DURATION);
        playlist.add_segment(SUBTITLE_SENTINEL_DURATION as f64, SUBTITLE_FILE.to_string());
        playlist
    }

    pub fn add_segment(&mut self, duration: f64, uri: String) {
        self.segments.push(MediaSegment { duration, uri });
    }

    pub fn render(&self) -> String {
        let mut out = String::from("#EXTM3U\n");
        out.push_str(&format!("#EXT-X-VERSION:{}\n", self.version));
        out.push_str(&format!("#EXT-X-TARGETDURATION:{}\n", self.target_duration));
        out.push_str(&format!("#EXT-X-MEDIA-SEQUENCE:{}\n", self.media_sequence));

        for segment in &self.segments {
            out.push_str(&format!("#EXTINF:{:.1},\n", segment.duration));
            out.push_str(&segment.uri);
            out.push('\n');
        }

        if self.end_list {
            out.push_str("#EXT-X-ENDLIST\n");
        }
        out
    }

    pub async fn write_to(&self, path: &Path) -> Result<(), std::io::Error> {
        fs::write(path, self.render()).await
    }
}

pub struct VariantStream {
    pub bandwidth: u64,
    pub width: u32,
    pub height: u32,
    pub uri: String,
}

/// Master playlist: one subtitle group plus one variant per rendition.
pub struct MasterPlaylist {
    pub subtitle_uri: String,
    pub variants: Vec<VariantStream>,
}

impl MasterPlaylist {
    /// Variants follow the order of `renditions`; heights without a ladder entry are skipped.
    pub fn for_renditions(renditions: &[RenditionSpec]) -> Self {
        let variants = renditions
            .iter()
            .filter(|spec| is_known_height(spec.height))
            .map(|spec| VariantStream {
                bandwidth: spec.target_kbps as u64 * 1000,
                width: spec.width,
                height: spec.height,
                uri: spec.playlist_uri(),
            })
            .collect();

        Self {
            subtitle_uri: SUBTITLE_PLAYLIST.to_string(),
            variants,
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::from("#EXTM3U\n#EXT-X-VERSION:3\n\n");
        out.push_str(&format!(
            "#EXT-X-MEDIA:TYPE=SUBTITLES,GROUP-ID=\"{}\",NAME=\"English\",LANGUAGE=\"en\",\
             DEFAULT=YES,AUTOSELECT=YES,FORCED=NO,URI=\"{}\"\n\n",
            SUBTITLE_GROUP_ID, self.subtitle_uri
        ));

        for variant in &self.variants {
            out.push_str(&format!(
                "#EXT-X-STREAM-INF:BANDWIDTH={},RESOLUTION={}x{},SUBTITLES=\"{}\"\n",
                variant.bandwidth, variant.width, variant.height, SUBTITLE_GROUP_ID
            ));
            out.push_str(&variant.uri);
            out.push('\n');
        }
        out
    }

    pub async fn write_to(&self, path: &Path) -> Result<(), std::io::Error> {
        fs::write(path, self.render()).await
    }
}
