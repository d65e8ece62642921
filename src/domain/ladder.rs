//! Bitrate ladder: rendition height to encoding bounds.

/// Bitrates are kilobits per second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LadderEntry {
    pub width: u32,
    pub target_kbps: u32,
    pub max_kbps: u32,
    pub buffer_kbps: u32,
}

/// (height, target, max, buffer)
const LADDER: [(u32, u32, u32, u32); 4] = [
    (1080, 5000, 5350, 7500),
    (720, 2500, 2675, 3750),
    (480, 800, 856, 1200),
    (360, 400, 428, 600),
];

const FALLBACK: (u32, u32, u32) = (95, 100, 150);

/// Width for a 16:9 frame of the given height.
pub fn derived_width(height: u32) -> u32 {
    (height as f64 / 9.0 * 16.0).round() as u32
}

pub fn is_known_height(height: u32) -> bool {
    LADDER.iter().any(|(h, ..)| *h == height)
}

pub fn ladder_entry(height: u32) -> LadderEntry {
    let (target_kbps, max_kbps, buffer_kbps) = LADDER
        .iter()
        .find(|(h, ..)| *h == height)
        .map(|(_, target, max, buffer)| (*target, *max, *buffer))
        .unwrap_or(FALLBACK);

    LadderEntry {
        width: derived_width(height),
        target_kbps,
        max_kbps,
        buffer_kbps,
    }
}

/// One configured quality level, resolved at task start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenditionSpec {
    pub height: u32,
    pub width: u32,
    pub target_kbps: u32,
    pub max_kbps: u32,
    pub buffer_kbps: u32,
}

impl RenditionSpec {
    pub fn for_height(height: u32) -> Self {
        let entry = ladder_entry(height);
        Self {
            height,
            width: entry.width,
            target_kbps: entry.target_kbps,
            max_kbps: entry.max_kbps,
            buffer_kbps: entry.buffer_kbps,
        }
    }

    pub fn from_heights(heights: &[u32]) -> Vec<Self> {
        heights.iter().copied().map(Self::for_height).collect()
    }

    /// Directory of this rendition relative to the video directory.
    pub fn dir_name(&self) -> String {
        format!("v{}", self.height)
    }

    pub fn playlist_uri(&self) -> String {
        format!("v{}/prog.m3u8", self.height)
    }

    pub fn segment_pattern(&self) -> String {
        format!("v{}/seg_%03d.ts", self.height)
    }
}

/// Video encoder, chosen once per task from the GPU flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoEncoder {
    Nvenc,
    X264,
}

impl VideoEncoder {
    pub fn select(use_gpu: bool) -> Self {
        if use_gpu {
            VideoEncoder::Nvenc
        } else {
            VideoEncoder::X264
        }
    }

    pub fn codec(&self) -> &'static str {
        match self {
            VideoEncoder::Nvenc => "h264_nvenc",
            VideoEncoder::X264 => "libx264",
        }
    }

    pub fn preset(&self) -> &'static str {
        match self {
            VideoEncoder::Nvenc => "p6",
            VideoEncoder::X264 => "medium",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_heights() {
        let cases = [
            (1080, 1920, 5000, 5350, 7500),
            (720, 1280, 2500, 2675, 3750),
            (480, 853, 800, 856, 1200),
            (360, 640, 400, 428, 600),
        ];
        for (height, width, target, max, buffer) in cases {
            assert_eq!(
                ladder_entry(height),
                LadderEntry {
                    width,
                    target_kbps: target,
                    max_kbps: max,
                    buffer_kbps: buffer,
                },
                "height {}",
                height
            );
            assert!(is_known_height(height));
        }
    }

    #[test]
    fn test_unknown_height_falls_back() {
        for height in [144, 240, 1440, 2160] {
            let entry = ladder_entry(height);
            assert_eq!(
                (entry.target_kbps, entry.max_kbps, entry.buffer_kbps),
                (95, 100, 150)
            );
            assert!(!is_known_height(height));
        }
    }

    #[test]
    fn test_width_is_rounded_sixteen_ninths() {
        for height in [1, 100, 144, 240, 480, 1000, 2160] {
            let expected = (height as f64 * 16.0 / 9.0).round() as u32;
            assert_eq!(ladder_entry(height).width, expected);
        }
        assert_eq!(derived_width(144), 256);
    }

    #[test]
    fn test_rendition_paths() {
        let spec = RenditionSpec::for_height(720);
        assert_eq!(spec.dir_name(), "v720");
        assert_eq!(spec.playlist_uri(), "v720/prog.m3u8");
        assert_eq!(spec.segment_pattern(), "v720/seg_%03d.ts");
    }

    #[test]
    fn test_encoder_selection() {
        let gpu = VideoEncoder::select(true);
        assert_eq!((gpu.codec(), gpu.preset()), ("h264_nvenc", "p6"));
        let cpu = VideoEncoder::select(false);
        assert_eq!((cpu.codec(), cpu.preset()), ("libx264", "medium"));
    }
}
