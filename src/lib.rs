//! `clipcast` - prompt-to-short-video generator
//!
//! # Features
//!
//! - **Script + footage**: chat-completions script, Pexels portrait footage
//! - **Narration**: Deepgram, ElevenLabs, Cartesia, Google TTS with fallback
//! - **Word timing**: inline TTS alignment or Deepgram/Whisper transcription
//! - **Compositing**: ffmpeg render on a 1080x1920 canvas with burned-in
//!   word-by-word subtitles
//!
//! # Example
//!
//! ```rust,no_run
//! use clipcast::{Config, Credentials, GenerationRequest, Pipeline};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let pipeline = Pipeline::from_config(Config::load(None)?, &Credentials::from_env())?;
//!     let request = GenerationRequest::new("three memory tricks").with_language("en");
//!     let video = pipeline.generate(&request).await?;
//!     println!("{} ({:.1}s)", video.path.display(), video.duration);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod footage;
pub mod http_client;
pub mod media;
pub mod model;
pub mod pipeline;
pub mod retry;
pub mod script;
pub mod stt;
pub mod timing;
pub mod tts;

pub use config::{Config, Credentials};
pub use error::{Error, Result, Stage};
pub use footage::{FootageSearch, PexelsClient};
pub use media::{AudioTrack, CompositionJob, FfmpegCompositor, MediaBackend, MediaInfo};
pub use model::{
    AudioFormat, FootageAsset, FootageSource, GenerationRequest, Script, SynthesizedAudio,
    VideoArtifact,
};
pub use pipeline::Pipeline;
pub use retry::RetryPolicy;
pub use script::{OpenAiScriptClient, ScriptGenerator};
pub use stt::{Transcriber, TranscriptionChain};
pub use timing::{Transcript, WordTiming};
pub use tts::{SpeechSynthesizer, SynthesisChain};

/// Version of clipcast
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
