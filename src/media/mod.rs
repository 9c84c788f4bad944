//! Media handling: probing, audio extraction and final composition
//!
//! The orchestrator talks to media through [`MediaBackend`];
//! [`FfmpegCompositor`] is the production implementation.

pub mod compositor;
pub mod overlay;
pub mod probe;
pub mod subtitle;

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{AudioAsset, FootageSource, VideoArtifact};
use crate::timing::WordTiming;

pub use compositor::{plan_fit, FfmpegCompositor, FitPlan};
pub use overlay::{overlays_from_words, OverlayPosition, OverlayStyle, SubtitleOverlay};
pub use probe::MediaInfo;
pub use subtitle::AssScript;

/// Audio placed under the composed video
#[derive(Debug, Clone, PartialEq)]
pub enum AudioTrack {
    /// Separate narration file; its duration sets the output duration
    Narration(AudioAsset),
    /// The footage's own audio stream (captioning an uploaded video)
    Original,
}

/// Everything needed to render one video
#[derive(Debug, Clone)]
pub struct CompositionJob {
    pub footage: FootageSource,
    pub audio: AudioTrack,
    /// Ordered, non-overlapping word timings; may be empty
    pub words: Vec<WordTiming>,
    pub output: PathBuf,
}

impl CompositionJob {
    #[must_use]
    pub fn use_original_audio(&self) -> bool {
        self.audio == AudioTrack::Original
    }
}

/// Media operations used by the pipeline
#[async_trait]
pub trait MediaBackend: Send + Sync {
    /// Read duration and stream layout; undecodable input is `MediaOpen`
    async fn probe(&self, path: &Path) -> Result<MediaInfo>;

    /// Write the audio track of `video` to `dest` as 16 kHz mono WAV
    async fn extract_audio(&self, video: &Path, dest: &Path) -> Result<()>;

    /// Render `job` and return the artifact written to `job.output`.
    ///
    /// The output duration equals the audio duration. Temporary files made
    /// here (downloaded footage, subtitle script) are gone when this returns.
    async fn compose(&self, job: &CompositionJob) -> Result<VideoArtifact>;

    /// Availability of the external tools this backend shells out to
    async fn check_tools(&self) -> Vec<(String, bool)> {
        Vec::new()
    }
}
