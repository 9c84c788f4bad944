//! Deepgram pre-recorded transcription

use std::path::Path;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::Transcriber;
use crate::error::{Error, Result};
use crate::timing::{normalize, Transcript, WordTiming};

const NAME: &str = "deepgram";
const ENDPOINT: &str = "https://api.deepgram.com/v1/listen";

#[derive(Debug, Deserialize)]
struct ListenResponse {
    results: Option<ListenResults>,
}

#[derive(Debug, Deserialize)]
struct ListenResults {
    #[serde(default)]
    channels: Vec<Channel>,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(default)]
    detected_language: Option<String>,
    #[serde(default)]
    alternatives: Vec<Alternative>,
}

#[derive(Debug, Deserialize)]
struct Alternative {
    #[serde(default)]
    words: Vec<ListenWord>,
}

#[derive(Debug, Deserialize)]
struct ListenWord {
    word: String,
    #[serde(default)]
    punctuated_word: Option<String>,
    start: f64,
    end: f64,
}

pub struct DeepgramTranscriber {
    client: Client,
    api_key: String,
    model: String,
}

impl DeepgramTranscriber {
    #[must_use]
    pub fn new(client: Client, api_key: String, model: String) -> Self {
        Self {
            client,
            api_key,
            model,
        }
    }

    fn query(&self, language: Option<&str>) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("model", self.model.clone()),
            ("smart_format", "true".to_string()),
            ("punctuate", "true".to_string()),
        ];
        match language {
            Some(lang) => query.push(("language", lang.to_string())),
            None => query.push(("detect_language", "true".to_string())),
        }
        query
    }
}

fn content_type(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("mp3") => "audio/mpeg",
        Some("m4a" | "mp4") => "audio/mp4",
        _ => "audio/wav",
    }
}

fn parse_response(parsed: ListenResponse) -> Result<Transcript> {
    let channel = parsed
        .results
        .and_then(|r| r.channels.into_iter().next())
        .ok_or_else(|| Error::EmptyResponse {
            provider: NAME.to_string(),
        })?;

    let words = channel
        .alternatives
        .into_iter()
        .next()
        .map(|alt| alt.words)
        .unwrap_or_default()
        .into_iter()
        .map(|w| WordTiming::new(w.punctuated_word.unwrap_or(w.word), w.start, w.end))
        .collect();

    Ok(Transcript {
        words: normalize(words),
        detected_language: channel.detected_language,
    })
}

#[async_trait]
impl Transcriber for DeepgramTranscriber {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn transcribe(&self, audio_path: &Path, language: Option<&str>) -> Result<Transcript> {
        let audio = tokio::fs::read(audio_path).await?;

        let response = self
            .client
            .post(ENDPOINT)
            .header("Authorization", format!("Token {}", self.api_key))
            .header("Content-Type", content_type(audio_path))
            .query(&self.query(language))
            .body(audio)
            .send()
            .await
            .map_err(|e| Error::from_transport(NAME, &e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::from_status(NAME, status, &body));
        }

        let parsed: ListenResponse = response
            .json()
            .await
            .map_err(|e| Error::from_transport(NAME, &e))?;

        parse_response(parsed)
    }
}
