//! Cartesia bytes text-to-speech (WAV, no word timing)

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use super::SpeechSynthesizer;
use crate::error::{Error, Result};
use crate::model::{AudioFormat, SynthesizedAudio};

const NAME: &str = "cartesia";
const ENDPOINT: &str = "https://api.cartesia.ai/tts/bytes";
const API_VERSION: &str = "2024-06-10";

pub struct CartesiaSynthesizer {
    client: Client,
    api_key: String,
    voice_id: String,
    model: String,
}

impl CartesiaSynthesizer {
    #[must_use]
    pub fn new(client: Client, api_key: String, voice_id: String, model: String) -> Self {
        Self {
            client,
            api_key,
            voice_id,
            model,
        }
    }

    fn payload(&self, text: &str, language: Option<&str>) -> serde_json::Value {
        json!({
            "model_id": self.model,
            "transcript": text,
            "voice": { "mode": "id", "id": self.voice_id },
            "language": language.unwrap_or("fr"),
            "output_format": {
                "container": "wav",
                "encoding": "pcm_s16le",
                "sample_rate": 44_100
            }
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for CartesiaSynthesizer {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn synthesize(&self, text: &str, language: Option<&str>) -> Result<SynthesizedAudio> {
        let response = self
            .client
            .post(ENDPOINT)
            .bearer_auth(&self.api_key)
            .header("Cartesia-Version", API_VERSION)
            .json(&self.payload(text, language))
            .send()
            .await
            .map_err(|e| Error::from_transport(NAME, &e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::from_status(NAME, status, &body));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::from_transport(NAME, &e))?;

        Ok(SynthesizedAudio {
            bytes,
            format: AudioFormat::Wav,
            word_timings: Vec::new(),
            provider: NAME.to_string(),
        })
    }
}
