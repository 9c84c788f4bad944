//! Assemble provider chains from configuration and credentials
//!
//! A provider whose credentials are missing is skipped with a warning; a
//! provider name nobody knows is a configuration error.

use std::sync::Arc;

use reqwest::Client;
use tracing::warn;

use crate::config::{Config, Credentials};
use crate::error::{Error, Result};
use crate::retry::RetryPolicy;
use crate::stt::{DeepgramTranscriber, Transcriber, TranscriptionChain, WhisperTranscriber};
use crate::tts::{
    CartesiaSynthesizer, DeepgramSynthesizer, ElevenLabsSynthesizer, GoogleTranslateSynthesizer,
    SpeechSynthesizer, SynthesisChain,
};

fn skip(kind: &str, name: &str, missing: &str) -> (String, String) {
    warn!(provider = name, missing, "Skipping {kind} provider without credentials");
    (name.to_string(), missing.to_string())
}

/// Narration chain in `[narration] providers` order
pub fn synthesis_chain(
    config: &Config,
    credentials: &Credentials,
    client: &Client,
    retry: RetryPolicy,
) -> Result<SynthesisChain> {
    let narration = &config.narration;
    let mut providers: Vec<Arc<dyn SpeechSynthesizer>> = Vec::new();
    let mut skipped = Vec::new();

    for name in &narration.providers {
        match name.as_str() {
            "deepgram" => match &credentials.deepgram_api_key {
                Some(key) => providers.push(Arc::new(DeepgramSynthesizer::new(
                    client.clone(),
                    key.clone(),
                    narration.deepgram_model.clone(),
                ))),
                None => skipped.push(skip("narration", name, "DEEPGRAM_API_KEY")),
            },
            "elevenlabs" => match (&credentials.elevenlabs_api_key, &credentials.elevenlabs_voice_id) {
                (Some(key), Some(voice)) => providers.push(Arc::new(ElevenLabsSynthesizer::new(
                    client.clone(),
                    key.clone(),
                    voice.clone(),
                    narration.elevenlabs_model.clone(),
                ))),
                _ => skipped.push(skip("narration", name, "ELEVENLABS_API_KEY/ELEVENLABS_VOICE_ID")),
            },
            "cartesia" => match (&credentials.cartesia_api_key, &credentials.cartesia_voice_id) {
                (Some(key), Some(voice)) => providers.push(Arc::new(CartesiaSynthesizer::new(
                    client.clone(),
                    key.clone(),
                    voice.clone(),
                    narration.cartesia_model.clone(),
                ))),
                _ => skipped.push(skip("narration", name, "CARTESIA_API_KEY/CARTESIA_VOICE_ID")),
            },
            "google" => providers.push(Arc::new(GoogleTranslateSynthesizer::new(
                client.clone(),
                config.transcription.default_language.clone(),
            ))),
            other => {
                return Err(Error::Config(format!("unknown narration provider '{other}'")));
            }
        }
    }

    Ok(SynthesisChain::new(providers, retry).with_skipped(skipped))
}

/// Transcription chain in `[transcription] providers` order
pub fn transcription_chain(
    config: &Config,
    credentials: &Credentials,
    client: &Client,
    retry: RetryPolicy,
) -> Result<TranscriptionChain> {
    let stt = &config.transcription;
    let mut providers: Vec<Arc<dyn Transcriber>> = Vec::new();

    for name in &stt.providers {
        match name.as_str() {
            "deepgram" => match &credentials.deepgram_api_key {
                Some(key) => providers.push(Arc::new(DeepgramTranscriber::new(
                    client.clone(),
                    key.clone(),
                    stt.deepgram_model.clone(),
                ))),
                None => {
                    skip("transcription", name, "DEEPGRAM_API_KEY");
                }
            },
            "whisper" => providers.push(Arc::new(WhisperTranscriber::new(
                stt.whisper_path.clone(),
                stt.whisper_model.clone(),
                std::time::Duration::from_secs(stt.whisper_timeout_secs),
            ))),
            other => {
                return Err(Error::Config(format!("unknown transcription provider '{other}'")));
            }
        }
    }

    Ok(TranscriptionChain::new(providers, retry, stt.default_language.clone()))
}
