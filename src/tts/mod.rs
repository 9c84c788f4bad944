//! Narration synthesis with provider fallback
//!
//! A [`SynthesisChain`] holds an ordered list of [`SpeechSynthesizer`]
//! adapters. Each provider gets the retry policy for transient failures;
//! any other failure is logged and the next provider is tried. The chain
//! only fails once every provider has failed.

pub mod cartesia;
pub mod deepgram;
pub mod elevenlabs;
pub mod google;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::model::SynthesizedAudio;
use crate::retry::RetryPolicy;

pub use cartesia::CartesiaSynthesizer;
pub use deepgram::DeepgramSynthesizer;
pub use elevenlabs::ElevenLabsSynthesizer;
pub use google::GoogleTranslateSynthesizer;

/// Text-to-speech provider
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Short lowercase provider name (e.g., `"deepgram"`)
    fn name(&self) -> &'static str;

    /// Synthesize `text`, returning audio bytes and any inline word timings.
    async fn synthesize(&self, text: &str, language: Option<&str>) -> Result<SynthesizedAudio>;
}

/// Ordered narration providers
#[derive(Clone)]
pub struct SynthesisChain {
    providers: Vec<Arc<dyn SpeechSynthesizer>>,
    retry: RetryPolicy,
    /// Configured providers left out for missing credentials: (name, missing variables)
    skipped: Vec<(String, String)>,
}

impl SynthesisChain {
    #[must_use]
    pub fn new(providers: Vec<Arc<dyn SpeechSynthesizer>>, retry: RetryPolicy) -> Self {
        Self {
            providers,
            retry,
            skipped: Vec::new(),
        }
    }

    /// Record configured providers that were left out, so a preference for
    /// one of them is reported as a credentials problem.
    #[must_use]
    pub fn with_skipped(mut self, skipped: Vec<(String, String)>) -> Self {
        self.skipped = skipped;
        self
    }

    /// Provider names in the order they will be tried
    #[must_use]
    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Reorder for a per-request preference.
    ///
    /// `auto` (or an empty string) keeps the configured order; any other
    /// value must name a provider in the chain, which is moved to the front.
    pub fn preferring(&self, preference: &str) -> Result<Self> {
        let preference = preference.trim();
        if preference.is_empty() || preference.eq_ignore_ascii_case("auto") {
            return Ok(self.clone());
        }

        let Some(idx) = self
            .providers
            .iter()
            .position(|p| p.name().eq_ignore_ascii_case(preference))
        else {
            if let Some((name, missing)) = self
                .skipped
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(preference))
            {
                return Err(Error::Config(format!(
                    "narration provider '{name}' is configured but has no credentials (set {missing})"
                )));
            }
            return Err(Error::Config(format!(
                "unknown narration provider '{preference}' (available: {})",
                self.provider_names().join(", ")
            )));
        };

        let mut providers = self.providers.clone();
        let preferred = providers.remove(idx);
        providers.insert(0, preferred);
        Ok(Self {
            providers,
            retry: self.retry.clone(),
            skipped: self.skipped.clone(),
        })
    }

    /// Try every provider in order until one returns non-empty audio.
    pub async fn run(&self, text: &str, language: Option<&str>) -> Result<SynthesizedAudio> {
        let mut failures = Vec::new();

        for provider in &self.providers {
            let name = provider.name();
            info!(provider = name, "Synthesizing narration");

            let attempt = self
                .retry
                .run(name, || provider.synthesize(text, language))
                .await
                .and_then(|audio| {
                    if audio.bytes.is_empty() {
                        Err(Error::EmptyResponse {
                            provider: name.to_string(),
                        })
                    } else {
                        Ok(audio)
                    }
                });

            match attempt {
                Ok(audio) => {
                    info!(
                        provider = name,
                        bytes = audio.bytes.len(),
                        timed_words = audio.word_timings.len(),
                        "Narration synthesized"
                    );
                    return Ok(audio);
                }
                Err(err) => {
                    warn!(provider = name, error = %err, "Narration provider failed, trying next");
                    failures.push(format!("{name}: {err}"));
                }
            }
        }

        Err(Error::ProvidersExhausted {
            chain: "narration",
            failures,
        })
    }
}
