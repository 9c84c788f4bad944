//! Job-level data model shared by the pipeline stages

use std::path::PathBuf;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::timing::WordTiming;

/// One user-initiated generation job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Video concept
    pub prompt: String,
    /// Tone of the script (e.g., "percutant")
    pub tone: String,
    /// Category used for generic footage queries (astuce, motivation, lifestyle)
    pub category: String,
    /// Narration language code
    pub language: String,
    /// `auto` or the name of a narration provider to try first
    pub tts_preference: String,
}

impl GenerationRequest {
    #[must_use]
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            tone: "percutant".to_string(),
            category: "astuce".to_string(),
            language: "fr".to_string(),
            tts_preference: "auto".to_string(),
        }
    }

    #[must_use]
    pub fn with_tone(mut self, tone: &str) -> Self {
        self.tone = tone.to_string();
        self
    }

    #[must_use]
    pub fn with_category(mut self, category: &str) -> Self {
        self.category = category.to_string();
        self
    }

    #[must_use]
    pub fn with_language(mut self, language: &str) -> Self {
        self.language = language.to_string();
        self
    }

    #[must_use]
    pub fn with_tts_preference(mut self, preference: &str) -> Self {
        self.tts_preference = preference.to_string();
        self
    }
}

/// Generated narration text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    pub text: String,
    pub tone: String,
}

impl Script {
    /// Number of whitespace-separated words
    #[must_use]
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

/// Where background footage comes from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FootageSource {
    /// Remote clip, downloaded during composition
    Remote(String),
    /// Clip already on disk (e.g., an uploaded video)
    Local(PathBuf),
}

impl FootageSource {
    /// Interpret `s` as a URL when it parses as http(s), else as a path
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match url::Url::parse(s) {
            Ok(u) if u.scheme() == "http" || u.scheme() == "https" => Self::Remote(s.to_string()),
            _ => Self::Local(PathBuf::from(s)),
        }
    }
}

/// Selected background clip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FootageAsset {
    pub source: FootageSource,
    pub width: u32,
    pub height: u32,
    /// Duration in seconds, when the search API reports it
    pub duration: Option<f64>,
}

/// Audio container produced by a narration provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioFormat {
    Mp3,
    Wav,
}

impl AudioFormat {
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Wav => "wav",
        }
    }
}

/// Raw narration returned by a text-to-speech provider
#[derive(Debug, Clone)]
pub struct SynthesizedAudio {
    pub bytes: Bytes,
    pub format: AudioFormat,
    /// Inline word alignment, empty when the provider has none
    pub word_timings: Vec<WordTiming>,
    /// Provider that produced the audio
    pub provider: String,
}

/// Narration written to disk for composition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioAsset {
    pub path: PathBuf,
    /// Duration in seconds, once probed
    pub duration: Option<f64>,
}

/// Final rendered output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoArtifact {
    pub path: PathBuf,
    /// Duration in seconds (equals the narration duration)
    pub duration: f64,
    pub width: u32,
    pub height: u32,
    /// Number of word overlays burned in
    pub overlay_count: usize,
}
