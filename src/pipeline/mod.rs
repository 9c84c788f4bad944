//! Job orchestration: generate-from-prompt and caption-existing-video
//!
//! Stages run strictly in sequence. Every file a job creates is tracked by a
//! [`TempArtifacts`] guard, so any early return (including `?`) removes it;
//! only the verified output video is released from the guard.

pub mod artifacts;
pub mod providers;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, info_span, Instrument};

use crate::config::{Config, Credentials};
use crate::error::{Error, Result, Stage};
use crate::footage::{query_from_script, FootageSearch, PexelsClient};
use crate::http_client::build_client;
use crate::media::compositor::tool_runs;
use crate::media::{AudioTrack, CompositionJob, FfmpegCompositor, MediaBackend};
use crate::model::{
    AudioAsset, FootageAsset, FootageSource, GenerationRequest, Script, VideoArtifact,
};
use crate::retry::RetryPolicy;
use crate::script::{OpenAiScriptClient, ScriptGenerator};
use crate::stt::TranscriptionChain;
use crate::timing::normalize;
use crate::tts::SynthesisChain;

pub use artifacts::{caption_job_name, generated_job_name, TempArtifacts};

/// The prompt-to-video pipeline and its injected services
pub struct Pipeline {
    config: Config,
    script: Option<Arc<dyn ScriptGenerator>>,
    footage: Option<Arc<dyn FootageSearch>>,
    synthesis: SynthesisChain,
    transcription: TranscriptionChain,
    media: Arc<dyn MediaBackend>,
}

impl Pipeline {
    /// Pipeline that can caption uploads; add a script generator and a
    /// footage search with [`Pipeline::with_script`] and
    /// [`Pipeline::with_footage`] to generate videos.
    #[must_use]
    pub fn new(
        config: Config,
        media: Arc<dyn MediaBackend>,
        synthesis: SynthesisChain,
        transcription: TranscriptionChain,
    ) -> Self {
        Self {
            config,
            script: None,
            footage: None,
            synthesis,
            transcription,
            media,
        }
    }

    #[must_use]
    pub fn with_script(mut self, script: Arc<dyn ScriptGenerator>) -> Self {
        self.script = Some(script);
        self
    }

    #[must_use]
    pub fn with_footage(mut self, footage: Arc<dyn FootageSearch>) -> Self {
        self.footage = Some(footage);
        self
    }

    /// Build production providers from configuration and credentials
    pub fn from_config(config: Config, credentials: &Credentials) -> Result<Self> {
        let client = build_client(&config.http)?;
        let retry = RetryPolicy::from(&config.retry);

        let synthesis = providers::synthesis_chain(&config, credentials, &client, retry.clone())?;
        let transcription =
            providers::transcription_chain(&config, credentials, &client, retry.clone())?;
        let media = Arc::new(FfmpegCompositor::new(
            client.clone(),
            config.video.clone(),
            config.media.clone(),
            std::time::Duration::from_secs(config.http.download_timeout_secs),
            config.paths.work_dir.clone(),
        ));

        let script_config = config.script.clone();
        let footage_config = config.footage.clone();
        let mut pipeline = Self::new(config, media, synthesis, transcription);

        match &credentials.openai_api_key {
            Some(key) => {
                pipeline = pipeline.with_script(Arc::new(OpenAiScriptClient::new(
                    client.clone(),
                    key.clone(),
                    script_config,
                    retry.clone(),
                )));
            }
            None => tracing::warn!("OPENAI_API_KEY not set; script generation unavailable"),
        }
        match &credentials.pexels_api_key {
            Some(key) => {
                pipeline = pipeline.with_footage(Arc::new(PexelsClient::new(
                    client,
                    key.clone(),
                    footage_config,
                    retry,
                )));
            }
            None => tracing::warn!("PEXELS_API_KEY not set; footage search unavailable"),
        }

        Ok(pipeline)
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Availability of every external tool the configured pipeline needs
    pub async fn check_dependencies(&self) -> Vec<(String, bool)> {
        let mut results = self.media.check_tools().await;
        if self.transcription.provider_names().contains(&"whisper") {
            let ok = tool_runs(&self.config.transcription.whisper_path, "--help").await;
            results.push(("whisper".to_string(), ok));
        }
        results
    }

    /// Generate a narrated, subtitled video from a prompt.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<VideoArtifact> {
        let job = generated_job_name();
        let span = info_span!("job", job = %job);
        self.run_generate(&job, request).instrument(span).await
    }

    /// Add word subtitles to an uploaded video, keeping its own audio.
    pub async fn caption_existing(&self, video: &[u8], filename: &str) -> Result<VideoArtifact> {
        let job = caption_job_name(filename);
        let span = info_span!("job", job = %job);
        self.run_caption(&job, video, filename).instrument(span).await
    }

    async fn prepare_dirs(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.config.paths.work_dir).await?;
        tokio::fs::create_dir_all(&self.config.paths.output_dir).await?;
        Ok(())
    }

    fn output_path(&self, job: &str) -> PathBuf {
        self.config.paths.output_dir.join(format!("{job}.mp4"))
    }

    async fn run_generate(&self, job: &str, request: &GenerationRequest) -> Result<VideoArtifact> {
        let script_gen = self.script.as_ref().ok_or_else(|| {
            Error::Config("no script generator configured (OPENAI_API_KEY)".into()).at(Stage::Script)
        })?;
        let footage_search = self.footage.as_ref().ok_or_else(|| {
            Error::Config("no footage search configured (PEXELS_API_KEY)".into()).at(Stage::Footage)
        })?;
        let synthesis = self
            .synthesis
            .preferring(&request.tts_preference)
            .map_err(|e| e.at(Stage::Narration))?;

        self.prepare_dirs().await.map_err(|e| e.at(Stage::Output))?;
        let mut temps = TempArtifacts::new();

        // 1. Script
        info!(stage = %Stage::Script, prompt = %request.prompt, "Starting stage");
        let text = script_gen
            .generate(&request.prompt, &request.tone, &request.language)
            .await
            .map_err(|e| e.at(Stage::Script))?;
        let min_chars = self.config.script.min_chars;
        if text.trim().chars().count() < min_chars {
            return Err(
                Error::EmptyArtifact(format!("script shorter than {min_chars} characters"))
                    .at(Stage::Script),
            );
        }
        let script = Script {
            text,
            tone: request.tone.clone(),
        };
        info!(words = script.word_count(), "Script ready");

        // 2. Footage
        info!(stage = %Stage::Footage, "Starting stage");
        let query = query_from_script(
            &script.text,
            &request.prompt,
            self.config.footage.query_words,
        );
        let footage = self
            .find_footage(footage_search.as_ref(), &query, &request.category)
            .await
            .map_err(|e| e.at(Stage::Footage))?;

        // 3. Narration
        info!(stage = %Stage::Narration, chain = ?synthesis.provider_names(), "Starting stage");
        let audio = synthesis
            .run(&script.text, Some(&request.language))
            .await
            .map_err(|e| e.at(Stage::Narration))?;
        let narration_path = temps.track(
            self.config
                .paths
                .work_dir
                .join(format!("{job}_narration.{}", audio.format.extension())),
        );
        tokio::fs::write(&narration_path, &audio.bytes)
            .await
            .map_err(|e| Error::from(e).at(Stage::Narration))?;

        // 4. Timing, only when synthesis had none
        let words = if audio.word_timings.is_empty() {
            info!(stage = %Stage::Transcription, "Starting stage");
            self.transcription
                .run(&narration_path, Some(&request.language))
                .await
                .words
        } else {
            info!(provider = %audio.provider, "Using word timing from narration");
            normalize(audio.word_timings)
        };

        // 5. Composition
        info!(stage = %Stage::Composition, words = words.len(), "Starting stage");
        let output = temps.track(self.output_path(job));
        let composition = CompositionJob {
            footage: footage.source,
            audio: AudioTrack::Narration(AudioAsset {
                path: narration_path,
                duration: None,
            }),
            words,
            output,
        };
        let artifact = self.finish(&composition, &mut temps).await?;

        info!(path = %artifact.path.display(), duration = artifact.duration, "Video generated");
        Ok(artifact)
    }

    async fn run_caption(&self, job: &str, video: &[u8], filename: &str) -> Result<VideoArtifact> {
        if video.is_empty() {
            return Err(Error::EmptyArtifact(format!("upload '{filename}' is empty"))
                .at(Stage::AudioExtraction));
        }
        self.prepare_dirs().await.map_err(|e| e.at(Stage::Output))?;
        let mut temps = TempArtifacts::new();

        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or("mp4");
        let work_dir = &self.config.paths.work_dir;
        let upload = temps.track(work_dir.join(format!("{job}_upload.{ext}")));
        tokio::fs::write(&upload, video)
            .await
            .map_err(|e| Error::from(e).at(Stage::AudioExtraction))?;

        // 1. Audio extraction
        info!(stage = %Stage::AudioExtraction, "Starting stage");
        let probed = self
            .media
            .probe(&upload)
            .await
            .map_err(|e| e.at(Stage::AudioExtraction))?;
        if !probed.has_audio {
            return Err(Error::NoAudioTrack.at(Stage::AudioExtraction));
        }
        let audio = temps.track(work_dir.join(format!("{job}_audio.wav")));
        self.media
            .extract_audio(&upload, &audio)
            .await
            .map_err(|e| e.at(Stage::AudioExtraction))?;

        // 2. Transcription
        info!(stage = %Stage::Transcription, "Starting stage");
        let transcript = self.transcription.run(&audio, None).await;

        // 3. Composition over the original audio
        info!(stage = %Stage::Composition, words = transcript.words.len(), "Starting stage");
        let output = temps.track(self.output_path(job));
        let composition = CompositionJob {
            footage: FootageSource::Local(upload),
            audio: AudioTrack::Original,
            words: transcript.words,
            output,
        };
        let artifact = self.finish(&composition, &mut temps).await?;

        info!(path = %artifact.path.display(), "Video captioned");
        Ok(artifact)
    }

    /// Compose, verify the output, and release it from the guard
    async fn finish(
        &self,
        composition: &CompositionJob,
        temps: &mut TempArtifacts,
    ) -> Result<VideoArtifact> {
        let artifact = self
            .media
            .compose(composition)
            .await
            .map_err(|e| e.at(Stage::Composition))?;
        verify_output(&artifact.path)
            .await
            .map_err(|e| e.at(Stage::Output))?;
        temps.release(&artifact.path);
        Ok(artifact)
    }

    /// Search footage, retrying once with the category's generic term.
    async fn find_footage(
        &self,
        search: &dyn FootageSearch,
        query: &str,
        category: &str,
    ) -> Result<FootageAsset> {
        info!(query, "Searching footage");
        if let Some(asset) = search.search(query).await? {
            return Ok(asset);
        }

        let generic = self.config.footage.generic_term(category);
        info!(query, generic, "No footage found, retrying with generic term");
        search
            .search(generic)
            .await?
            .ok_or_else(|| Error::NoResult(format!("{query} (then {generic})")))
    }
}

async fn verify_output(path: &Path) -> Result<()> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.len() > 0 => Ok(()),
        Ok(_) => Err(Error::EmptyArtifact(format!("{} is empty", path.display()))),
        Err(_) => Err(Error::EmptyArtifact(format!("{} was not written", path.display()))),
    }
}
