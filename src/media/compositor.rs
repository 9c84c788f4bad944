//! ffmpeg-based compositor: footage + narration + burned-in word subtitles
//!
//! Footage is normalized to the fixed canvas (scale + letterbox), looped or
//! trimmed to the narration duration, and the word overlays are rendered by
//! libass through the `ass` filter above the footage layer.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tokio::process::Command;
use tracing::{debug, info, instrument};

use super::overlay::{overlays_from_words, OverlayStyle};
use super::probe::{probe, MediaInfo};
use super::subtitle::AssScript;
use super::{AudioTrack, CompositionJob, MediaBackend};
use crate::config::{MediaConfig, VideoConfig};
use crate::error::{Error, Result};
use crate::http_client;
use crate::model::{FootageSource, VideoArtifact};

/// Footage longer than the narration by less than this needs no trim
const FIT_TOLERANCE_SECS: f64 = 0.05;

/// How the footage track is brought to the narration duration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitPlan {
    /// Footage already matches
    Exact,
    /// Footage is longer; cut at the narration end
    Trim,
    /// Footage is shorter; play it `repeats` extra times, then cut
    Loop { repeats: u32 },
}

impl FitPlan {
    /// Extra plays passed to `-stream_loop`, if any
    #[must_use]
    pub fn stream_loop(self) -> Option<u32> {
        match self {
            Self::Loop { repeats } => Some(repeats),
            Self::Exact | Self::Trim => None,
        }
    }
}

/// Decide how footage of `footage_secs` covers `audio_secs`.
#[must_use]
pub fn plan_fit(footage_secs: f64, audio_secs: f64) -> FitPlan {
    // Any shortfall loops, however small; `-t` cuts the excess either way.
    if footage_secs < audio_secs {
        let plays = (audio_secs / footage_secs).ceil() as u32;
        FitPlan::Loop {
            repeats: plays.saturating_sub(1).max(1),
        }
    } else if footage_secs - audio_secs < FIT_TOLERANCE_SECS {
        FitPlan::Exact
    } else {
        FitPlan::Trim
    }
}

/// Compositor backed by the `ffmpeg` and `ffprobe` binaries
pub struct FfmpegCompositor {
    client: Client,
    video: VideoConfig,
    media: MediaConfig,
    download_timeout: Duration,
    work_dir: PathBuf,
}

impl FfmpegCompositor {
    #[must_use]
    pub fn new(
        client: Client,
        video: VideoConfig,
        media: MediaConfig,
        download_timeout: Duration,
        work_dir: PathBuf,
    ) -> Self {
        Self {
            client,
            video,
            media,
            download_timeout,
            work_dir,
        }
    }

    fn overlay_style(&self) -> OverlayStyle {
        OverlayStyle {
            font_name: self.video.font_name.clone(),
            font_size: self.video.font_size,
            margin: self.video.bottom_margin,
            ..OverlayStyle::default()
        }
    }

    /// Check whether ffmpeg can be launched
    pub async fn check_available(&self) -> bool {
        tool_runs(&self.media.ffmpeg_path, "-version").await
    }

    /// Build the video filter chain for `footage` on the canvas
    fn build_filter(&self, footage: &MediaInfo, subtitle_file: Option<&Path>) -> String {
        let (w, h) = (self.video.width, self.video.height);
        let mut filters = Vec::new();

        if footage.width != w || footage.height != h {
            filters.push(format!("scale={w}:{h}:force_original_aspect_ratio=decrease"));
            filters.push(format!("pad={w}:{h}:(ow-iw)/2:(oh-ih)/2:color=black"));
        }
        filters.push("setsar=1".to_string());
        filters.push(format!("fps={}", self.video.fps));

        if let Some(ass_path) = subtitle_file {
            let path_escaped = ass_path
                .to_string_lossy()
                .replace('\\', "\\\\")
                .replace(':', "\\:")
                .replace('\'', "\\'");
            filters.push(format!("ass='{path_escaped}'"));
        }

        filters.join(",")
    }

    /// Build ffmpeg arguments for one composition
    fn build_args(
        &self,
        footage: &Path,
        audio: &AudioTrack,
        plan: FitPlan,
        duration: f64,
        filter: &str,
        output: &Path,
    ) -> Vec<String> {
        let mut args: Vec<String> = ["-hide_banner", "-loglevel", "warning", "-nostdin"]
            .iter()
            .map(std::string::ToString::to_string)
            .collect();

        if let Some(repeats) = plan.stream_loop() {
            args.push("-stream_loop".to_string());
            args.push(repeats.to_string());
        }
        args.push("-i".to_string());
        args.push(footage.to_string_lossy().to_string());

        let audio_map = match audio {
            AudioTrack::Narration(asset) => {
                args.push("-i".to_string());
                args.push(asset.path.to_string_lossy().to_string());
                "1:a:0"
            }
            AudioTrack::Original => "0:a:0",
        };

        args.extend(
            ["-map", "0:v:0", "-map", audio_map, "-vf", filter]
                .iter()
                .map(std::string::ToString::to_string),
        );

        // Output duration always follows the audio
        args.push("-t".to_string());
        args.push(format!("{duration:.3}"));

        args.extend([
            "-c:v".to_string(),
            self.video.video_codec.clone(),
            "-preset".to_string(),
            self.video.preset.clone(),
            "-b:v".to_string(),
            self.video.video_bitrate.clone(),
            "-pix_fmt".to_string(),
            "yuv420p".to_string(),
            "-r".to_string(),
            self.video.fps.to_string(),
            "-c:a".to_string(),
            self.video.audio_codec.clone(),
            "-b:a".to_string(),
            self.video.audio_bitrate.clone(),
            "-movflags".to_string(),
            "+faststart".to_string(),
            "-y".to_string(),
            output.to_string_lossy().to_string(),
        ]);

        args
    }

    async fn run_ffmpeg(&self, args: &[String], what: &str) -> Result<()> {
        debug!(?args, "Running ffmpeg");

        let run = Command::new(&self.media.ffmpeg_path)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.media.encode_timeout(), run)
            .await
            .map_err(|_| Error::Timeout(what.to_string()))?
            .map_err(|e| Error::Ffmpeg(format!("cannot run {}: {e}", self.media.ffmpeg_path)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let tail = stderr.lines().rev().take(5).collect::<Vec<_>>().join(" | ");
            return Err(Error::Ffmpeg(format!("{what}: exited with {}: {tail}", output.status)));
        }
        Ok(())
    }

    /// Make remote footage local; the file lives inside `scratch`.
    async fn fetch_footage(&self, source: &FootageSource, scratch: &Path) -> Result<PathBuf> {
        match source {
            FootageSource::Local(path) => Ok(path.clone()),
            FootageSource::Remote(url) => {
                let dest = scratch.join("footage.mp4");
                let bytes =
                    http_client::download(&self.client, url, &dest, self.download_timeout).await?;
                if bytes == 0 {
                    return Err(Error::EmptyArtifact(format!("footage download from {url}")));
                }
                Ok(dest)
            }
        }
    }
}

pub(crate) async fn tool_runs(path: &str, arg: &str) -> bool {
    Command::new(path)
        .arg(arg)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .status()
        .await
        .map(|s| s.success())
        .unwrap_or(false)
}

#[async_trait]
impl MediaBackend for FfmpegCompositor {
    async fn probe(&self, path: &Path) -> Result<MediaInfo> {
        probe(&self.media.ffprobe_path, path, self.media.probe_timeout()).await
    }

    async fn extract_audio(&self, video: &Path, dest: &Path) -> Result<()> {
        let args: Vec<String> = vec![
            "-hide_banner".into(),
            "-loglevel".into(),
            "warning".into(),
            "-nostdin".into(),
            "-i".into(),
            video.to_string_lossy().to_string(),
            "-vn".into(),
            "-acodec".into(),
            "pcm_s16le".into(),
            "-ar".into(),
            "16000".into(),
            "-ac".into(),
            "1".into(),
            "-y".into(),
            dest.to_string_lossy().to_string(),
        ];
        self.run_ffmpeg(&args, "audio extraction").await
    }

    #[instrument(skip(self, job), fields(output = %job.output.display(), words = job.words.len()))]
    async fn compose(&self, job: &CompositionJob) -> Result<VideoArtifact> {
        tokio::fs::create_dir_all(&self.work_dir).await?;
        // Downloaded footage and the subtitle script are removed with this
        // directory on every exit path.
        let scratch = tempfile::Builder::new()
            .prefix("compose_")
            .tempdir_in(&self.work_dir)?;

        let footage_path = self.fetch_footage(&job.footage, scratch.path()).await?;
        let footage = self.probe(&footage_path).await?;
        if !footage.has_video {
            return Err(Error::MediaOpen(format!(
                "{}: no video stream",
                footage_path.display()
            )));
        }

        let duration = match &job.audio {
            AudioTrack::Narration(asset) => match asset.duration {
                Some(secs) if secs > 0.0 => secs,
                _ => self.probe(&asset.path).await?.duration,
            },
            AudioTrack::Original if footage.has_audio => footage.audio_secs(),
            AudioTrack::Original => return Err(Error::NoAudioTrack),
        };

        let plan = plan_fit(footage.duration, duration);
        debug!(footage_secs = footage.duration, audio_secs = duration, ?plan, "Fitting footage");

        let overlays = overlays_from_words(&job.words);
        let subtitle_file = if overlays.is_empty() {
            None
        } else {
            let script = AssScript::new(self.video.width, self.video.height, self.overlay_style());
            let path = scratch.path().join("words.ass");
            tokio::fs::write(&path, script.render(&overlays)).await?;
            Some(path)
        };

        let filter = self.build_filter(&footage, subtitle_file.as_deref());
        let args = self.build_args(&footage_path, &job.audio, plan, duration, &filter, &job.output);
        self.run_ffmpeg(&args, "composition").await?;

        info!(
            path = %job.output.display(),
            duration,
            overlays = overlays.len(),
            "Composited video"
        );

        Ok(VideoArtifact {
            path: job.output.clone(),
            duration,
            width: self.video.width,
            height: self.video.height,
            overlay_count: overlays.len(),
        })
    }

    async fn check_tools(&self) -> Vec<(String, bool)> {
        vec![
            ("ffmpeg".to_string(), self.check_available().await),
            ("ffprobe".to_string(), tool_runs(&self.media.ffprobe_path, "-version").await),
        ]
    }
}
