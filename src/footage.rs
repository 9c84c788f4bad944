//! Stock footage search
//!
//! Queries a Pexels-compatible video search API for portrait clips and picks
//! a rendition that meets the minimum width.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use rand::seq::SliceRandom;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::FootageConfig;
use crate::error::{Error, Result};
use crate::model::{FootageAsset, FootageSource};
use crate::retry::RetryPolicy;

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").expect("valid regex"));

/// Footage search service
#[async_trait]
pub trait FootageSearch: Send + Sync {
    /// Find one clip for `query`, or `None` when nothing suitable matches.
    async fn search(&self, query: &str) -> Result<Option<FootageAsset>>;
}

/// Derive a search query from the first `max_words` words of the script.
///
/// Punctuation and symbols are stripped first. When the cleaned query is
/// shorter than 3 characters, `prompt` is used instead.
#[must_use]
pub fn query_from_script(script: &str, prompt: &str, max_words: usize) -> String {
    let cleaned = NON_WORD.replace_all(script, "");
    let query = cleaned
        .split_whitespace()
        .take(max_words)
        .collect::<Vec<_>>()
        .join(" ");

    if query.trim().chars().count() < 3 {
        prompt.trim().to_string()
    } else {
        query
    }
}

const PROVIDER: &str = "pexels";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    videos: Vec<Video>,
}

#[derive(Debug, Clone, Deserialize)]
struct Video {
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    video_files: Vec<VideoFile>,
}

#[derive(Debug, Clone, Deserialize)]
struct VideoFile {
    link: String,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
}

/// Pexels video search client
pub struct PexelsClient {
    client: Client,
    api_key: String,
    config: FootageConfig,
    retry: RetryPolicy,
}

impl PexelsClient {
    #[must_use]
    pub fn new(client: Client, api_key: String, config: FootageConfig, retry: RetryPolicy) -> Self {
        Self {
            client,
            api_key,
            config,
            retry,
        }
    }

    async fn request_once(&self, query: &str) -> Result<SearchResponse> {
        let per_page = self.config.per_page.to_string();
        let response = self
            .client
            .get(&self.config.endpoint)
            .header("Authorization", &self.api_key)
            .query(&[
                ("query", query),
                ("orientation", self.config.orientation.as_str()),
                ("per_page", per_page.as_str()),
            ])
            .send()
            .await
            .map_err(|e| Error::from_transport(PROVIDER, &e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::from_status(PROVIDER, status, &text));
        }

        response
            .json()
            .await
            .map_err(|e| Error::from_transport(PROVIDER, &e))
    }
}

/// Pick a random video and its first rendition at least `min_width` wide.
fn select_clip(videos: &[Video], min_width: u32) -> Option<FootageAsset> {
    let mut rng = rand::thread_rng();
    let video = videos.choose(&mut rng)?;
    video
        .video_files
        .iter()
        .find(|f| f.width.unwrap_or(0) >= min_width)
        .map(|f| FootageAsset {
            source: FootageSource::Remote(f.link.clone()),
            width: f.width.unwrap_or(0),
            height: f.height.unwrap_or(0),
            duration: video.duration,
        })
}

#[async_trait]
impl FootageSearch for PexelsClient {
    async fn search(&self, query: &str) -> Result<Option<FootageAsset>> {
        debug!(query, "Searching footage");
        let response = self.retry.run(PROVIDER, || self.request_once(query)).await?;

        if response.videos.is_empty() {
            info!(query, "No footage found");
            return Ok(None);
        }

        let clip = select_clip(&response.videos, self.config.min_width);
        match &clip {
            Some(asset) => info!(query, width = asset.width, height = asset.height, "Selected footage"),
            None => info!(query, "No rendition meets the minimum width"),
        }
        Ok(clip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_uses_first_five_clean_words() {
        let script = "🤯 This trick will change your life! Say the name three times.";
        assert_eq!(
            query_from_script(script, "memory", 5),
            "This trick will change your"
        );
    }

    #[test]
    fn test_query_falls_back_to_prompt() {
        assert_eq!(query_from_script("!! ?", "a memory trick", 5), "a memory trick");
        assert_eq!(query_from_script("a.", "a memory trick", 5), "a memory trick");
    }

    #[test]
    fn test_query_keeps_accented_words() {
        assert_eq!(
            query_from_script("Réveil sans snooze, c'est dur.", "x", 5),
            "Réveil sans snooze cest dur"
        );
    }

    #[test]
    fn test_select_clip_respects_min_width() {
        let response: SearchResponse = serde_json::from_str(
            r#"{"videos":[{"duration":14,"video_files":[
                {"link":"https://v/sd.mp4","width":540,"height":960},
                {"link":"https://v/hd.mp4","width":1080,"height":1920}
            ]}]}"#,
        )
        .unwrap();

        let clip = select_clip(&response.videos, 1080).unwrap();
        assert_eq!(clip.source, FootageSource::Remote("https://v/hd.mp4".to_string()));
        assert_eq!(clip.height, 1920);
        assert_eq!(clip.duration, Some(14.0));
    }

    #[test]
    fn test_select_clip_none_when_too_small() {
        let response: SearchResponse = serde_json::from_str(
            r#"{"videos":[{"video_files":[{"link":"https://v/sd.mp4","width":540}]}]}"#,
        )
        .unwrap();
        assert!(select_clip(&response.videos, 1080).is_none());
        assert!(select_clip(&[], 1080).is_none());
    }
}
