//! Local Whisper CLI transcription
//!
//! Runs `whisper <audio> --output_format json --word_timestamps True` and
//! reads the `<stem>.json` it writes into a scratch directory next to the
//! audio file.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::fs;
use tokio::process::Command;
use tracing::debug;

use super::{check_exit, Transcriber};
use crate::error::{Error, Result};
use crate::timing::{normalize, Transcript, WordTiming};

const NAME: &str = "whisper";

/// Whisper JSON output (only the fields used here)
#[derive(Debug, Deserialize)]
struct WhisperOutput {
    #[serde(default)]
    segments: Vec<WhisperSegment>,
    #[serde(default)]
    language: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WhisperSegment {
    #[serde(default)]
    words: Vec<WhisperWord>,
}

#[derive(Debug, Deserialize)]
struct WhisperWord {
    word: String,
    start: f64,
    end: f64,
}

impl From<WhisperOutput> for Transcript {
    fn from(output: WhisperOutput) -> Self {
        let words = output
            .segments
            .into_iter()
            .flat_map(|s| s.words)
            .map(|w| WordTiming::new(w.word, w.start, w.end))
            .collect();
        Self {
            words: normalize(words),
            detected_language: output.language,
        }
    }
}

pub struct WhisperTranscriber {
    whisper_path: String,
    model: String,
    timeout: Duration,
}

impl WhisperTranscriber {
    #[must_use]
    pub fn new(whisper_path: String, model: String, timeout: Duration) -> Self {
        Self {
            whisper_path,
            model,
            timeout,
        }
    }

    fn build_args(&self, audio_path: &Path, output_dir: &Path, language: Option<&str>) -> Vec<String> {
        let mut args = vec![
            audio_path.to_string_lossy().to_string(),
            "--model".to_string(),
            self.model.clone(),
            "--output_format".to_string(),
            "json".to_string(),
            "--output_dir".to_string(),
            output_dir.to_string_lossy().to_string(),
            "--word_timestamps".to_string(),
            "True".to_string(),
        ];
        if let Some(lang) = language {
            args.push("--language".to_string());
            args.push(lang.to_string());
        }
        args
    }
}

fn output_json_path(audio_path: &Path, output_dir: &Path) -> Result<PathBuf> {
    let stem = audio_path
        .file_stem()
        .ok_or_else(|| Error::MediaOpen(audio_path.display().to_string()))?;
    Ok(output_dir.join(format!("{}.json", stem.to_string_lossy())))
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    fn name(&self) -> &'static str {
        NAME
    }

    fn is_local(&self) -> bool {
        true
    }

    async fn transcribe(&self, audio_path: &Path, language: Option<&str>) -> Result<Transcript> {
        let parent = audio_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        // Whatever whisper writes is removed with this directory, on failure too.
        let scratch = tempfile::Builder::new()
            .prefix("whisper_")
            .tempdir_in(&parent)?;
        let json_path = output_json_path(audio_path, scratch.path())?;
        let args = self.build_args(audio_path, scratch.path(), language);

        debug!(?args, "Running whisper");

        let child = Command::new(&self.whisper_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, child).await {
            Ok(result) => result.map_err(|e| Error::ProviderRejected {
                provider: NAME.to_string(),
                message: format!("cannot run {}: {e}", self.whisper_path),
            })?,
            Err(_) => return Err(Error::Timeout(format!("whisper after {:?}", self.timeout))),
        };
        check_exit(NAME, &output)?;

        let content = fs::read_to_string(&json_path)
            .await
            .map_err(|_| Error::EmptyResponse {
                provider: NAME.to_string(),
            })?;

        let parsed: WhisperOutput = serde_json::from_str(&content)?;
        Ok(parsed.into())
    }
}
