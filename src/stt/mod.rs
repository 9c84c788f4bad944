//! Speech-to-text with provider fallback
//!
//! Unlike narration, transcription never fails the job: when every provider
//! fails the chain returns an empty [`Transcript`] and the video is rendered
//! without subtitles.

pub mod deepgram;
pub mod whisper;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::retry::RetryPolicy;
use crate::timing::{normalize, Transcript};

pub use deepgram::DeepgramTranscriber;
pub use whisper::WhisperTranscriber;

/// Speech-to-text provider
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Short lowercase provider name (e.g., `"whisper"`)
    fn name(&self) -> &'static str;

    /// Local providers are not retried; their failures are not transient.
    fn is_local(&self) -> bool {
        false
    }

    /// Transcribe the audio file at `audio_path`.
    ///
    /// `language = None` asks the provider to detect the language when it
    /// can. A result with no words but a detected language is valid; the
    /// chain treats it as a failure while keeping the language as a hint.
    async fn transcribe(&self, audio_path: &Path, language: Option<&str>) -> Result<Transcript>;
}

/// Ordered transcription providers
#[derive(Clone)]
pub struct TranscriptionChain {
    providers: Vec<Arc<dyn Transcriber>>,
    retry: RetryPolicy,
    default_language: String,
}

impl TranscriptionChain {
    #[must_use]
    pub fn new(
        providers: Vec<Arc<dyn Transcriber>>,
        retry: RetryPolicy,
        default_language: impl Into<String>,
    ) -> Self {
        Self {
            providers,
            retry,
            default_language: default_language.into(),
        }
    }

    #[must_use]
    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Run providers in order until one yields words.
    ///
    /// The first provider receives `language` as given (`None` lets it
    /// detect). Later providers receive the language detected so far, else
    /// `language`, else the configured default.
    pub async fn run(&self, audio_path: &Path, language: Option<&str>) -> Transcript {
        let mut detected: Option<String> = None;

        for (idx, provider) in self.providers.iter().enumerate() {
            let name = provider.name();
            let hint = if idx == 0 {
                language.map(str::to_string)
            } else {
                Some(
                    detected
                        .clone()
                        .or_else(|| language.map(str::to_string))
                        .unwrap_or_else(|| self.default_language.clone()),
                )
            };
            info!(provider = name, language = hint.as_deref().unwrap_or("auto"), "Transcribing");

            let retry = if provider.is_local() {
                RetryPolicy::none()
            } else {
                self.retry.clone()
            };
            let outcome = retry
                .run(name, || provider.transcribe(audio_path, hint.as_deref()))
                .await;

            match outcome {
                Ok(transcript) => {
                    if let Some(lang) = transcript.detected_language.as_ref() {
                        detected = Some(lang.clone());
                    }
                    let words = normalize(transcript.words);
                    if words.is_empty() {
                        warn!(provider = name, "Transcription returned no words, trying next");
                        continue;
                    }
                    info!(provider = name, words = words.len(), "Transcription complete");
                    return Transcript {
                        words,
                        detected_language: detected.or(hint),
                    };
                }
                Err(err) => {
                    warn!(provider = name, error = %err, "Transcription provider failed, trying next");
                }
            }
        }

        warn!("Every transcription provider failed; continuing without subtitles");
        Transcript {
            words: Vec::new(),
            detected_language: detected,
        }
    }
}

/// Map a finished subprocess to an error when it did not succeed
pub(crate) fn check_exit(provider: &str, output: &std::process::Output) -> Result<()> {
    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    let tail: String = stderr
        .lines()
        .rev()
        .take(5)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect::<Vec<_>>()
        .join(" | ");
    Err(Error::ProviderRejected {
        provider: provider.to_string(),
        message: format!("exited with {}: {tail}", output.status),
    })
}
