//! Error taxonomy for the generation pipeline
//!
//! Provider-level errors (`ProviderAuth`, `ProviderTransient`, ...) are
//! absorbed by the fallback chains and only escape wrapped in
//! [`Error::ProvidersExhausted`]. Stage-level failures reach the caller as a
//! single [`Error::Stage`].

use std::fmt;

use thiserror::Error;

/// Pipeline stage a failure is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Script,
    Footage,
    Narration,
    Transcription,
    AudioExtraction,
    Composition,
    Output,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Script => "script generation",
            Self::Footage => "footage search",
            Self::Narration => "narration synthesis",
            Self::Transcription => "transcription",
            Self::AudioExtraction => "audio extraction",
            Self::Composition => "video composition",
            Self::Output => "output verification",
        };
        f.write_str(name)
    }
}

/// Crate-wide error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("{provider}: authentication rejected")]
    ProviderAuth { provider: String },

    #[error("{provider}: transient failure: {message}")]
    ProviderTransient { provider: String, message: String },

    #[error("{provider}: request rejected: {message}")]
    ProviderRejected { provider: String, message: String },

    #[error("{provider}: empty response")]
    EmptyResponse { provider: String },

    #[error("no result for query '{0}'")]
    NoResult(String),

    #[error("empty artifact: {0}")]
    EmptyArtifact(String),

    #[error("cannot open media: {0}")]
    MediaOpen(String),

    #[error("uploaded video has no audio track")]
    NoAudioTrack,

    #[error("all {chain} providers failed ({})", .failures.join("; "))]
    ProvidersExhausted {
        chain: &'static str,
        failures: Vec<String>,
    },

    #[error("ffmpeg error: {0}")]
    Ffmpeg(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("{0} timed out")]
    Timeout(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("{stage} failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: Box<Error>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether the per-provider retry loop should try the same call again.
    ///
    /// Only transient provider failures and timeouts qualify; authentication
    /// errors advance the chain immediately.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ProviderTransient { .. } | Self::Timeout(_))
    }

    /// Attach the pipeline stage to an error, unless it already carries one.
    #[must_use]
    pub fn at(self, stage: Stage) -> Self {
        match self {
            already @ Self::Stage { .. } => already,
            other => Self::Stage {
                stage,
                source: Box::new(other),
            },
        }
    }

    /// Stage this error was attributed to, if any.
    #[must_use]
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Classify a transport-level `reqwest` error for `provider`.
    pub(crate) fn from_transport(provider: &str, err: &reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() || err.is_request() {
            Self::ProviderTransient {
                provider: provider.to_string(),
                message: err.to_string(),
            }
        } else if err.is_decode() {
            Self::ProviderRejected {
                provider: provider.to_string(),
                message: format!("malformed response: {err}"),
            }
        } else {
            Self::Network(format!("{provider}: {err}"))
        }
    }

    /// Classify a non-success HTTP status returned by `provider`.
    pub(crate) fn from_status(provider: &str, status: reqwest::StatusCode, body: &str) -> Self {
        let provider = provider.to_string();
        let snippet: String = body.chars().take(200).collect();
        match status.as_u16() {
            401 | 403 => Self::ProviderAuth { provider },
            408 | 429 | 500..=599 => Self::ProviderTransient {
                provider,
                message: format!("HTTP {status}: {snippet}"),
            },
            _ => Self::ProviderRejected {
                provider,
                message: format!("HTTP {status}: {snippet}"),
            },
        }
    }
}
