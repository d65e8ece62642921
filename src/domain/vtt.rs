//! WebVTT conversion from speech-to-text transcripts, and WebVTT validation.

use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;
use thiserror::Error;
use tokio::fs;

pub const HEADER: &str = "WEBVTT";

/// `HH:MM:SS.mmm`, ASCII digits only.
const TIMESTAMP: &str = r"[0-9]{2}:[0-9]{2}:[0-9]{2}\.[0-9]{3}";

/// A transcript line such as `[00:00:01.000 --> 00:00:02.000]   hello`.
fn transcript_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(r"^\[({0}) --> ({0})\]   (.*)$", TIMESTAMP))
            .expect("transcript pattern is valid")
    })
}

fn cue_timing_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(r"^({0}) --> ({0})$", TIMESTAMP))
            .expect("cue timing pattern is valid")
    })
}

/// Timings are kept exactly as the transcript wrote them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleCue {
    pub start: String,
    pub end: String,
    pub text: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VttError {
    #[error("Line {line}: {reason}")]
    Invalid { line: usize, reason: String },

    #[error("No valid subtitle cues found in file")]
    NoCues,

    #[error("Error reading file: {0}")]
    Read(String),
}

impl VttError {
    fn at(line: usize, reason: &str) -> Self {
        VttError::Invalid {
            line,
            reason: reason.to_string(),
        }
    }
}

/// Parse `HH:MM:SS.mmm` into milliseconds.
pub fn parse_timestamp(ts: &str) -> Option<u64> {
    let (hms, millis) = ts.split_once('.')?;
    let mut parts = hms.split(':');
    let hours: u64 = parts.next()?.parse().ok()?;
    let minutes: u64 = parts.next()?.parse().ok()?;
    let seconds: u64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    let millis: u64 = millis.parse().ok()?;
    Some((hours * 3600 + minutes * 60 + seconds) * 1000 + millis)
}

/// Extract cues from raw transcript text. Lines that do not match are dropped.
pub fn parse_transcript(transcript: &str) -> Vec<SubtitleCue> {
    transcript
        .lines()
        .filter_map(|line| {
            let caps = transcript_line().captures(line)?;
            Some(SubtitleCue {
                start: caps[1].to_string(),
                end: caps[2].to_string(),
                text: caps[3].trim().to_string(),
            })
        })
        .collect()
}

pub fn render_vtt(cues: &[SubtitleCue]) -> String {
    let mut out = format!("{}\n\n", HEADER);
    for cue in cues {
        out.push_str(&format!("{} --> {}\n{}\n\n", cue.start, cue.end, cue.text));
    }
    out
}

pub fn convert_transcript(transcript: &str) -> String {
    render_vtt(&parse_transcript(transcript))
}

pub async fn convert_file(input: &Path, output: &Path) -> std::io::Result<()> {
    let transcript = fs::read_to_string(input).await?;
    fs::write(output, convert_transcript(&transcript)).await
}

/// Check well-formedness. Returns the number of cues on success.
pub fn validate_vtt(content: &str) -> Result<usize, VttError> {
    let mut lines = content.lines();

    match lines.next() {
        Some(first) if first.trim() == HEADER => {}
        _ => return Err(VttError::at(1, "File must start with 'WEBVTT'")),
    }

    let mut cues = 0;
    let mut last_end: Option<u64> = None;

    for (index, line) in lines.enumerate() {
        let line_number = index + 2;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let Some(caps) = cue_timing_line().captures(line) else {
            continue;
        };
        let (Some(start), Some(end)) = (parse_timestamp(&caps[1]), parse_timestamp(&caps[2]))
        else {
            return Err(VttError::at(line_number, "malformed timestamp"));
        };

        if start >= end {
            return Err(VttError::at(
                line_number,
                "start time must be before end time",
            ));
        }
        if last_end.is_some_and(|last| last > start) {
            return Err(VttError::at(line_number, "cue overlaps or is out of order"));
        }

        last_end = Some(end);
        cues += 1;
    }

    if cues == 0 {
        return Err(VttError::NoCues);
    }
    Ok(cues)
}

pub async fn validate_vtt_file(path: &Path) -> Result<usize, VttError> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| VttError::Read(e.to_string()))?;
    validate_vtt(&content)
}
