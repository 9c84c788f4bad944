//! Google Translate text-to-speech (MP3, no word timing)
//!
//! The endpoint accepts at most 100 characters per request, so the text is
//! split on word boundaries and the MP3 frames of each part concatenated.

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use reqwest::Client;

use super::SpeechSynthesizer;
use crate::error::{Error, Result};
use crate::model::{AudioFormat, SynthesizedAudio};

const NAME: &str = "google";
const ENDPOINT: &str = "https://translate.google.com/translate_tts";
const MAX_CHUNK_CHARS: usize = 100;

pub struct GoogleTranslateSynthesizer {
    client: Client,
    default_language: String,
}

impl GoogleTranslateSynthesizer {
    #[must_use]
    pub fn new(client: Client, default_language: String) -> Self {
        Self {
            client,
            default_language,
        }
    }

    async fn fetch_chunk(&self, chunk: &str, lang: &str, idx: usize, total: usize) -> Result<Bytes> {
        let idx = idx.to_string();
        let total = total.to_string();
        let textlen = chunk.chars().count().to_string();

        let response = self
            .client
            .get(ENDPOINT)
            .query(&[
                ("ie", "UTF-8"),
                ("client", "tw-ob"),
                ("tl", lang),
                ("q", chunk),
                ("idx", idx.as_str()),
                ("total", total.as_str()),
                ("textlen", textlen.as_str()),
            ])
            .send()
            .await
            .map_err(|e| Error::from_transport(NAME, &e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::from_status(NAME, status, &body));
        }

        response
            .bytes()
            .await
            .map_err(|e| Error::from_transport(NAME, &e))
    }
}

/// Split `text` into pieces of at most `max_chars` characters.
///
/// Breaks happen between words; a single word longer than the limit is cut.
fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            let rest = word.split_off(max_chars);
            chunks.push(word.into_iter().collect());
            word = rest;
        }
        let word: String = word.into_iter().collect();

        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > max_chars && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[async_trait]
impl SpeechSynthesizer for GoogleTranslateSynthesizer {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn synthesize(&self, text: &str, language: Option<&str>) -> Result<SynthesizedAudio> {
        let lang = language.unwrap_or(&self.default_language);
        let chunks = chunk_text(text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            return Err(Error::ProviderRejected {
                provider: NAME.to_string(),
                message: "nothing to synthesize".to_string(),
            });
        }

        let mut audio = BytesMut::new();
        for (idx, chunk) in chunks.iter().enumerate() {
            let part = self.fetch_chunk(chunk, lang, idx, chunks.len()).await?;
            audio.extend_from_slice(&part);
        }

        Ok(SynthesizedAudio {
            bytes: audio.freeze(),
            format: AudioFormat::Mp3,
            word_timings: Vec::new(),
            provider: NAME.to_string(),
        })
    }
}
