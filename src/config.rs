//! Configuration loaded from `~/.config/clipcast/config.toml`.
//!
//! Every field has a default, so an absent file yields a working setup.
//! Credentials never live in the file; they are read from the environment
//! into [`Credentials`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Top-level configuration file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub video: VideoConfig,
    pub paths: PathsConfig,
    pub http: HttpConfig,
    pub retry: RetryConfig,
    pub script: ScriptConfig,
    pub footage: FootageConfig,
    pub narration: NarrationConfig,
    pub transcription: TranscriptionConfig,
    pub media: MediaConfig,
}

/// Output canvas and encoding profile
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// Canvas width in pixels
    pub width: u32,
    /// Canvas height in pixels
    pub height: u32,
    /// Output frame rate
    pub fps: u32,
    /// Video codec passed to ffmpeg
    pub video_codec: String,
    /// x264 preset
    pub preset: String,
    /// Video bitrate (e.g., "4M")
    pub video_bitrate: String,
    /// Audio codec passed to ffmpeg
    pub audio_codec: String,
    /// Audio bitrate (e.g., "192k")
    pub audio_bitrate: String,
    /// Subtitle font family (resolved by libass/fontconfig)
    pub font_name: String,
    /// Subtitle font size in canvas pixels
    pub font_size: u32,
    /// Distance between the subtitle baseline and the bottom edge
    pub bottom_margin: u32,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            width: 1080,
            height: 1920,
            fps: 24,
            video_codec: "libx264".to_string(),
            preset: "medium".to_string(),
            video_bitrate: "4M".to_string(),
            audio_codec: "aac".to_string(),
            audio_bitrate: "192k".to_string(),
            font_name: "Arial".to_string(),
            font_size: 60,
            bottom_margin: 50,
        }
    }
}

/// Where artifacts are written
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Final videos
    pub output_dir: PathBuf,
    /// Per-job intermediates (audio, uploads)
    pub work_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            work_dir: std::env::temp_dir().join("clipcast"),
        }
    }
}

/// Shared HTTP client settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    /// Footage downloads can be large; they get their own bound
    pub download_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            request_timeout_secs: 60,
            download_timeout_secs: 120,
        }
    }
}

/// Per-provider retry policy for transient failures
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub multiplier: f64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 2_000,
            multiplier: 2.0,
            max_delay_ms: 16_000,
        }
    }
}

/// Text generation endpoint settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScriptConfig {
    /// OpenAI-compatible base URL
    pub endpoint: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Scripts shorter than this (in characters, trimmed) are rejected
    pub min_chars: usize,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            max_tokens: 150,
            temperature: 0.7,
            min_chars: 10,
        }
    }
}

/// Stock footage search settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FootageConfig {
    pub endpoint: String,
    pub min_width: u32,
    pub orientation: String,
    pub per_page: u32,
    /// Words of the script used as the search query
    pub query_words: usize,
    /// Category -> generic query used when the script query finds nothing
    pub generic_terms: HashMap<String, String>,
    /// Generic query for categories missing from `generic_terms`
    pub fallback_term: String,
}

impl Default for FootageConfig {
    fn default() -> Self {
        let generic_terms = [
            ("astuce", "tips advice"),
            ("motivation", "motivation success"),
            ("lifestyle", "lifestyle daily routine"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            endpoint: "https://api.pexels.com/videos/search".to_string(),
            min_width: 1080,
            orientation: "portrait".to_string(),
            per_page: 10,
            query_words: 5,
            generic_terms,
            fallback_term: "background".to_string(),
        }
    }
}

impl FootageConfig {
    /// Generic query for a category
    #[must_use]
    pub fn generic_term(&self, category: &str) -> &str {
        self.generic_terms
            .get(category)
            .map_or(self.fallback_term.as_str(), String::as_str)
    }
}

/// Narration (text-to-speech) chain settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NarrationConfig {
    /// Provider names, highest priority first
    pub providers: Vec<String>,
    pub deepgram_model: String,
    pub elevenlabs_model: String,
    pub cartesia_model: String,
}

impl Default for NarrationConfig {
    fn default() -> Self {
        Self {
            providers: vec![
                "deepgram".to_string(),
                "elevenlabs".to_string(),
                "google".to_string(),
            ],
            deepgram_model: "aura-2-zeus-en".to_string(),
            elevenlabs_model: "eleven_multilingual_v2".to_string(),
            cartesia_model: "sonic-2".to_string(),
        }
    }
}

/// Transcription (speech-to-text) chain settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TranscriptionConfig {
    /// Provider names, highest priority first
    pub providers: Vec<String>,
    pub deepgram_model: String,
    /// Path to whisper executable (or "whisper" for PATH lookup)
    pub whisper_path: String,
    /// Whisper model size (tiny, base, small, medium, large)
    pub whisper_model: String,
    /// Language used by the offline provider when nothing was detected
    pub default_language: String,
    pub whisper_timeout_secs: u64,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            providers: vec!["deepgram".to_string(), "whisper".to_string()],
            deepgram_model: "nova-2".to_string(),
            whisper_path: "whisper".to_string(),
            whisper_model: "base".to_string(),
            default_language: "fr".to_string(),
            whisper_timeout_secs: 300,
        }
    }
}

/// External media tools
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
    pub probe_timeout_secs: u64,
    pub encode_timeout_secs: u64,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: which::which("ffmpeg").map_or_else(
                |_| "ffmpeg".to_string(),
                |p| p.to_string_lossy().to_string(),
            ),
            ffprobe_path: which::which("ffprobe").map_or_else(
                |_| "ffprobe".to_string(),
                |p| p.to_string_lossy().to_string(),
            ),
            probe_timeout_secs: 30,
            encode_timeout_secs: 600,
        }
    }
}

impl MediaConfig {
    #[must_use]
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    #[must_use]
    pub fn encode_timeout(&self) -> Duration {
        Duration::from_secs(self.encode_timeout_secs)
    }
}

impl Config {
    /// Load from `path`, or from the default location when `None`.
    ///
    /// A missing file yields defaults; a file that exists but cannot be read
    /// or parsed is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map_or_else(default_path, Path::to_path_buf);
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("invalid TOML in {}: {e}", path.display())))
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("invalid TOML: {e}")))
    }
}

/// Return the path to the default config file.
fn default_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("clipcast")
        .join("config.toml")
}

/// API credentials, read from the environment
#[derive(Clone, Default)]
pub struct Credentials {
    pub openai_api_key: Option<String>,
    pub pexels_api_key: Option<String>,
    pub deepgram_api_key: Option<String>,
    pub elevenlabs_api_key: Option<String>,
    pub elevenlabs_voice_id: Option<String>,
    pub cartesia_api_key: Option<String>,
    pub cartesia_voice_id: Option<String>,
}

impl Credentials {
    /// Read every credential from its environment variable.
    ///
    /// Blank values count as missing.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        Self {
            openai_api_key: get("OPENAI_API_KEY"),
            pexels_api_key: get("PEXELS_API_KEY"),
            deepgram_api_key: get("DEEPGRAM_API_KEY"),
            elevenlabs_api_key: get("ELEVENLABS_API_KEY"),
            elevenlabs_voice_id: get("ELEVENLABS_VOICE_ID"),
            cartesia_api_key: get("CARTESIA_API_KEY"),
            cartesia_voice_id: get("CARTESIA_VOICE_ID"),
        }
    }

    /// Names of the credentials that are present (never their values)
    #[must_use]
    pub fn present(&self) -> Vec<&'static str> {
        [
            ("OPENAI_API_KEY", &self.openai_api_key),
            ("PEXELS_API_KEY", &self.pexels_api_key),
            ("DEEPGRAM_API_KEY", &self.deepgram_api_key),
            ("ELEVENLABS_API_KEY", &self.elevenlabs_api_key),
            ("ELEVENLABS_VOICE_ID", &self.elevenlabs_voice_id),
            ("CARTESIA_API_KEY", &self.cartesia_api_key),
            ("CARTESIA_VOICE_ID", &self.cartesia_voice_id),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.as_ref().map(|_| name))
        .collect()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("present", &self.present())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_empty_config() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.video.width, 1080);
        assert_eq!(config.video.height, 1920);
        assert_eq!(config.video.fps, 24);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(
            config.narration.providers,
            vec!["deepgram", "elevenlabs", "google"]
        );
    }

    #[test]
    fn parse_partial_sections() {
        let toml_str = r#"
[video]
fps = 30

[narration]
providers = ["google"]

[footage.generic_terms]
cuisine = "cooking kitchen"
"#;
        let config = Config::from_toml(toml_str).unwrap();
        assert_eq!(config.video.fps, 30);
        assert_eq!(config.video.width, 1080);
        assert_eq!(config.narration.providers, vec!["google"]);
        assert_eq!(config.footage.generic_term("cuisine"), "cooking kitchen");
        assert_eq!(config.footage.generic_term("unknown"), "background");
    }

    #[test]
    fn default_generic_terms() {
        let footage = FootageConfig::default();
        assert_eq!(footage.generic_term("astuce"), "tips advice");
        assert_eq!(footage.generic_term("motivation"), "motivation success");
        assert_eq!(footage.generic_term("lifestyle"), "lifestyle daily routine");
    }

    #[test]
    fn invalid_toml_is_config_error() {
        let err = Config::from_toml("[video\nfps = ").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config.script.min_chars, 10);
    }

    #[test]
    fn credentials_treat_blank_as_missing() {
        let creds = Credentials::from_lookup(|name| match name {
            "OPENAI_API_KEY" => Some("  sk-test \n".to_string()),
            "PEXELS_API_KEY" => Some("   ".to_string()),
            _ => None,
        });
        assert_eq!(creds.openai_api_key.as_deref(), Some("sk-test"));
        assert!(creds.pexels_api_key.is_none());
        assert_eq!(creds.present(), vec!["OPENAI_API_KEY"]);
        assert!(!format!("{creds:?}").contains("sk-test"));
    }
}
