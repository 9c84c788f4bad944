//! ElevenLabs text-to-speech with character alignment
//!
//! The `with-timestamps` endpoint returns base64 MP3 audio plus per-character
//! start/end times, which are grouped into word timings here so nothing
//! provider-specific reaches the compositor.

use async_trait::async_trait;
use base64::Engine as _;
use bytes::Bytes;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use super::SpeechSynthesizer;
use crate::error::{Error, Result};
use crate::model::{AudioFormat, SynthesizedAudio};
use crate::timing::{words_from_characters, WordTiming};

const NAME: &str = "elevenlabs";
const ENDPOINT: &str = "https://api.elevenlabs.io/v1/text-to-speech";

#[derive(Debug, Deserialize)]
struct TimestampedResponse {
    audio_base64: Option<String>,
    alignment: Option<Alignment>,
}

#[derive(Debug, Deserialize)]
struct Alignment {
    #[serde(default)]
    characters: Vec<String>,
    #[serde(default)]
    character_start_times_seconds: Vec<f64>,
    #[serde(default)]
    character_end_times_seconds: Vec<f64>,
}

impl Alignment {
    fn into_words(self) -> Vec<WordTiming> {
        words_from_characters(
            &self.characters,
            &self.character_start_times_seconds,
            &self.character_end_times_seconds,
        )
    }
}

pub struct ElevenLabsSynthesizer {
    client: Client,
    api_key: String,
    voice_id: String,
    model: String,
}

impl ElevenLabsSynthesizer {
    #[must_use]
    pub fn new(client: Client, api_key: String, voice_id: String, model: String) -> Self {
        Self {
            client,
            api_key,
            voice_id,
            model,
        }
    }
}

fn decode_response(parsed: TimestampedResponse) -> Result<SynthesizedAudio> {
    let (Some(audio_b64), Some(alignment)) = (parsed.audio_base64, parsed.alignment) else {
        return Err(Error::EmptyResponse {
            provider: NAME.to_string(),
        });
    };

    let audio = base64::engine::general_purpose::STANDARD
        .decode(audio_b64.as_bytes())
        .map_err(|e| Error::ProviderRejected {
            provider: NAME.to_string(),
            message: format!("invalid base64 audio: {e}"),
        })?;

    Ok(SynthesizedAudio {
        bytes: Bytes::from(audio),
        format: AudioFormat::Mp3,
        word_timings: alignment.into_words(),
        provider: NAME.to_string(),
    })
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsSynthesizer {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn synthesize(&self, text: &str, _language: Option<&str>) -> Result<SynthesizedAudio> {
        let url = format!("{ENDPOINT}/{}/with-timestamps", self.voice_id);
        let body = json!({
            "text": text,
            "model_id": self.model,
            "voice_settings": {
                "stability": 0.5,
                "similarity_boost": 0.5
            }
        });

        let response = self
            .client
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::from_transport(NAME, &e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::from_status(NAME, status, &body));
        }

        let parsed: TimestampedResponse = response
            .json()
            .await
            .map_err(|e| Error::from_transport(NAME, &e))?;

        decode_response(parsed)
    }
}
