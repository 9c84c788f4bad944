//! Deepgram Aura text-to-speech (WAV, no word timing)

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use serde_json::json;

use super::SpeechSynthesizer;
use crate::error::{Error, Result};
use crate::model::{AudioFormat, SynthesizedAudio};

const NAME: &str = "deepgram";
const ENDPOINT: &str = "https://api.deepgram.com/v1/speak";

pub struct DeepgramSynthesizer {
    client: Client,
    api_key: String,
    model: String,
}

impl DeepgramSynthesizer {
    #[must_use]
    pub fn new(client: Client, api_key: String, model: String) -> Self {
        Self {
            client,
            api_key,
            model,
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for DeepgramSynthesizer {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn synthesize(&self, text: &str, _language: Option<&str>) -> Result<SynthesizedAudio> {
        let response = self
            .client
            .post(ENDPOINT)
            .header("Authorization", format!("Token {}", self.api_key))
            .query(&[
                ("model", self.model.as_str()),
                ("encoding", "linear16"),
                ("container", "wav"),
            ])
            .json(&json!({ "text": text }))
            .send()
            .await
            .map_err(|e| Error::from_transport(NAME, &e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::from_status(NAME, status, &body));
        }

        let bytes: Bytes = response
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
