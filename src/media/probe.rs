//! Media inspection with `ffprobe`

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use crate::error::{Error, Result};

/// Stream layout and duration of a media file
#[derive(Debug, Clone, PartialEq)]
pub struct MediaInfo {
    /// Container duration in seconds
    pub duration: f64,
    /// Width of the first video stream, 0 for audio-only files
    pub width: u32,
    /// Height of the first video stream, 0 for audio-only files
    pub height: u32,
    pub has_video: bool,
    pub has_audio: bool,
    /// Duration of the first audio stream, when ffprobe reports one
    pub audio_duration: Option<f64>,
}

impl MediaInfo {
    /// Length of the audio track, falling back to the container duration.
    #[must_use]
    pub fn audio_secs(&self) -> f64 {
        self.audio_duration.unwrap_or(self.duration)
    }
}

/// `FFprobe` JSON output structure
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
    format: Option<FfprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

fn parse_probe(path: &Path, stdout: &[u8]) -> Result<MediaInfo> {
    let probe: FfprobeOutput = serde_json::from_slice(stdout)
        .map_err(|e| Error::MediaOpen(format!("{}: unreadable probe output: {e}", path.display())))?;

    let video = probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"));
    let audio = probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("audio"));
    let has_audio = audio.is_some();
    let audio_duration = audio
        .and_then(|a| a.duration.as_deref())
        .and_then(|d| d.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0);

    if video.is_none() && !has_audio {
        return Err(Error::MediaOpen(format!("{}: no audio or video stream", path.display())));
    }

    // Some containers only report duration per stream
    let duration = probe
        .format
        .and_then(|f| f.duration)
        .or_else(|| probe.streams.iter().find_map(|s| s.duration.clone()))
        .and_then(|d| d.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0)
        .ok_or_else(|| Error::MediaOpen(format!("{}: unknown duration", path.display())))?;

    Ok(MediaInfo {
        duration,
        width: video.and_then(|v| v.width).unwrap_or(0),
        height: video.and_then(|v| v.height).unwrap_or(0),
        has_video: video.is_some(),
        has_audio,
        audio_duration,
    })
}

/// Probe `path` with the `ffprobe` binary at `ffprobe_path`.
///
/// Anything that prevents reading the stream layout (missing file, decode
/// failure, no duration) is reported as [`Error::MediaOpen`].
pub async fn probe(ffprobe_path: &str, path: &Path, timeout: Duration) -> Result<MediaInfo> {
    if !path.exists() {
        return Err(Error::MediaOpen(format!("{}: no such file", path.display())));
    }

    let run = Command::new(ffprobe_path)
        .args(["-v", "quiet", "-print_format", "json", "-show_format", "-show_streams"])
        .arg(path)
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .output();

    let output = tokio::time::timeout(timeout, run)
        .await
        .map_err(|_| Error::Timeout(format!("ffprobe of {}", path.display())))?
        .map_err(|e| Error::MediaOpen(format!("cannot run {ffprobe_path}: {e}")))?;

    if !output.status.success() {
        return Err(Error::MediaOpen(format!(
            "{}: ffprobe exited with {}",
            path.display(),
            output.status
        )));
    }

    let info = parse_probe(path, &output.stdout)?;
    debug!(path = %path.display(), duration = info.duration, width = info.width, height = info.height, has_audio = info.has_audio, "Probed media");
    Ok(info)
}
