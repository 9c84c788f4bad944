//! Orchestrator tests with in-memory providers and a fake media backend.
//!
//! No network and no ffmpeg: every external service is replaced by a fake
//! that records how it was called.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;

use clipcast::media::overlays_from_words;
use clipcast::{
    AudioFormat, AudioTrack, CompositionJob, Config, Error, FootageAsset, FootageSearch,
    FootageSource, GenerationRequest, MediaBackend, MediaInfo, Pipeline, RetryPolicy,
    ScriptGenerator, SpeechSynthesizer, Stage, SynthesisChain, SynthesizedAudio, Transcriber,
    Transcript, TranscriptionChain, VideoArtifact, WordTiming,
};

const AUDIO_SECS: f64 = 12.0;

// ─── Fakes ───────────────────────────────────────────────────────────────────

struct FakeScript(&'static str);

#[async_trait]
impl ScriptGenerator for FakeScript {
    async fn generate(&self, _prompt: &str, _tone: &str, _language: &str) -> clipcast::Result<String> {
        Ok(self.0.to_string())
    }
}

#[derive(Default)]
struct FakeFootage {
    results: Mutex<VecDeque<Option<FootageAsset>>>,
    queries: Mutex<Vec<String>>,
}

impl FakeFootage {
    fn with(results: Vec<Option<FootageAsset>>) -> Arc<Self> {
        Arc::new(Self {
            results: Mutex::new(results.into()),
            queries: Mutex::new(Vec::new()),
        })
    }

    fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl FootageSearch for FakeFootage {
    async fn search(&self, query: &str) -> clipcast::Result<Option<FootageAsset>> {
        self.queries.lock().unwrap().push(query.to_string());
        Ok(self.results.lock().unwrap().pop_front().flatten())
    }
}

fn clip() -> FootageAsset {
    FootageAsset {
        source: FootageSource::Remote("https://videos.example.com/clip.mp4".into()),
        width: 1080,
        height: 1920,
        duration: Some(5.0),
    }
}

struct FakeSynth {
    name: &'static str,
    outcome: fn() -> clipcast::Result<SynthesizedAudio>,
    calls: AtomicU32,
}

impl FakeSynth {
    fn new(name: &'static str, outcome: fn() -> clipcast::Result<SynthesizedAudio>) -> Arc<Self> {
        Arc::new(Self {
            name,
            outcome,
            calls: AtomicU32::new(0),
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for FakeSynth {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn synthesize(&self, _text: &str, _language: Option<&str>) -> clipcast::Result<SynthesizedAudio> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.outcome)()
    }
}

fn audio_with_timings() -> clipcast::Result<SynthesizedAudio> {
    Ok(SynthesizedAudio {
        bytes: Bytes::from_static(b"ID3 narration"),
        format: AudioFormat::Mp3,
        word_timings: vec![
            WordTiming::new("Trois", 0.0, 0.4),
            WordTiming::new("astuces", 0.4, 0.9),
        ],
        provider: "timed".into(),
    })
}

fn audio_without_timings() -> clipcast::Result<SynthesizedAudio> {
    Ok(SynthesizedAudio {
        bytes: Bytes::from_static(b"RIFF narration"),
        format: AudioFormat::Wav,
        word_timings: Vec::new(),
        provider: "plain".into(),
    })
}

fn auth_failure() -> clipcast::Result<SynthesizedAudio> {
    Err(Error::ProviderAuth {
        provider: "fake".into(),
    })
}

fn empty_audio() -> clipcast::Result<SynthesizedAudio> {
    Ok(SynthesizedAudio {
        bytes: Bytes::new(),
        format: AudioFormat::Mp3,
        word_timings: Vec::new(),
        provider: "silent".into(),
    })
}

struct FakeTranscriber {
    words: Vec<WordTiming>,
    hints: Mutex<Vec<Option<String>>>,
}

impl FakeTranscriber {
    fn new(words: Vec<WordTiming>) -> Arc<Self> {
        Arc::new(Self {
            words,
            hints: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.hints.lock().unwrap().len()
    }
}

#[async_trait]
impl Transcriber for FakeTranscriber {
    fn name(&self) -> &'static str {
        "fake-stt"
    }

    async fn transcribe(&self, audio_path: &Path, language: Option<&str>) -> clipcast::Result<Transcript> {
        assert!(audio_path.exists(), "audio must exist while transcribing");
        self.hints.lock().unwrap().push(language.map(str::to_string));
        Ok(Transcript {
            words: self.words.clone(),
            detected_language: Some("fr".into()),
        })
    }
}

#[derive(Clone, Copy, PartialEq)]
enum ComposeMode {
    Ok,
    Fail,
    EmptyOutput,
}

struct FakeMedia {
    has_audio: bool,
    mode: ComposeMode,
    compose_calls: AtomicU32,
    jobs: Mutex<Vec<CompositionJob>>,
}

impl FakeMedia {
    fn new(has_audio: bool, mode: ComposeMode) -> Arc<Self> {
        Arc::new(Self {
            has_audio,
            mode,
            compose_calls: AtomicU32::new(0),
            jobs: Mutex::new(Vec::new()),
        })
    }

    fn last_job(&self) -> CompositionJob {
        self.jobs.lock().unwrap().last().cloned().expect("compose was called")
    }
}

#[async_trait]
impl MediaBackend for FakeMedia {
    async fn probe(&self, path: &Path) -> clipcast::Result<MediaInfo> {
        assert!(path.exists());
        Ok(MediaInfo {
            duration: AUDIO_SECS,
            width: 1920,
            height: 1080,
            has_video: true,
            has_audio: self.has_audio,
            audio_duration: None,
        })
    }

    async fn extract_audio(&self, _video: &Path, dest: &Path) -> clipcast::Result<()> {
        tokio::fs::write(dest, b"RIFF extracted").await?;
        Ok(())
    }

    async fn compose(&self, job: &CompositionJob) -> clipcast::Result<VideoArtifact> {
        self.compose_calls.fetch_add(1, Ordering::SeqCst);
        self.jobs.lock().unwrap().push(job.clone());

        if let AudioTrack::Narration(asset) = &job.audio {
            assert!(asset.path.exists(), "narration must exist while composing");
        }

        match self.mode {
            ComposeMode::Fail => {
                // partial output left behind by a failed encode
                tokio::fs::write(&job.output, b"partial").await?;
                Err(Error::Ffmpeg("encoder crashed".into()))
            }
            ComposeMode::EmptyOutput => {
                tokio::fs::write(&job.output, b"").await?;
                Ok(artifact(job))
            }
            ComposeMode::Ok => {
                tokio::fs::write(&job.output, b"mp4 video").await?;
                Ok(artifact(job))
            }
        }
    }
}

fn artifact(job: &CompositionJob) -> VideoArtifact {
    VideoArtifact {
        path: job.output.clone(),
        duration: AUDIO_SECS,
        width: 1080,
        height: 1920,
        overlay_count: overlays_from_words(&job.words).len(),
    }
}

// ─── Harness ─────────────────────────────────────────────────────────────────

struct Harness {
    _dir: tempfile::TempDir,
    work: PathBuf,
    out: PathBuf,
    config: Config,
}

impl Harness {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let work = dir.path().join("work");
        let out = dir.path().join("out");
        let mut config = Config::default();
        config.paths.work_dir = work.clone();
        config.paths.output_dir = out.clone();
        Self {
            _dir: dir,
            work,
            out,
            config,
        }
    }

    fn pipeline(
        &self,
        synths: &[&Arc<FakeSynth>],
        stt: &Arc<FakeTranscriber>,
        media: &Arc<FakeMedia>,
        footage: &Arc<FakeFootage>,
    ) -> Pipeline {
        let synthesis = SynthesisChain::new(
            synths
                .iter()
                .map(|s| Arc::clone(s) as Arc<dyn SpeechSynthesizer>)
                .collect(),
            RetryPolicy::none(),
        );
        let transcription = TranscriptionChain::new(
            vec![Arc::clone(stt) as Arc<dyn Transcriber>],
            RetryPolicy::none(),
            "fr",
        );
        Pipeline::new(
            self.config.clone(),
            Arc::clone(media) as Arc<dyn MediaBackend>,
            synthesis,
            transcription,
        )
        .with_script(Arc::new(FakeScript(
            "Trois astuces pour retenir un prénom facilement.",
        )))
        .with_footage(Arc::clone(footage) as Arc<dyn FootageSearch>)
    }

    fn work_files(&self) -> Vec<PathBuf> {
        list(&self.work)
    }

    fn out_files(&self) -> Vec<PathBuf> {
        list(&self.out)
    }
}

fn list(dir: &Path) -> Vec<PathBuf> {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
        Err(_) => Vec::new(),
    }
}

fn inner(err: Error) -> Error {
    match err {
        Error::Stage { source, .. } => *source,
        other => other,
    }
}

fn request() -> GenerationRequest {
    GenerationRequest::new("retenir les prénoms")
}

// ─── Generate flow ───────────────────────────────────────────────────────────

#[tokio::test]
async fn generate_uses_inline_timing_and_keeps_only_the_video() {
    let h = Harness::new();
    let synth = FakeSynth::new("timed", audio_with_timings);
    let stt = FakeTranscriber::new(Vec::new());
    let media = FakeMedia::new(true, ComposeMode::Ok);
    let footage = FakeFootage::with(vec![Some(clip())]);

    let video = h
        .pipeline(&[&synth], &stt, &media, &footage)
        .generate(&request())
        .await
        .unwrap();

    assert_eq!(stt.calls(), 0);
    assert_eq!(video.overlay_count, 2);
    assert!(video.path.exists());
    assert!(video
        .path
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("short_"));
    assert_eq!(h.out_files(), vec![video.path.clone()]);
    assert!(h.work_files().is_empty());
    assert_eq!(footage.queries(), vec!["Trois astuces pour retenir un"]);
}

#[tokio::test]
async fn generate_transcribes_when_narration_has_no_timing() {
    let h = Harness::new();
    let synth = FakeSynth::new("plain", audio_without_timings);
    let stt = FakeTranscriber::new(vec![
        WordTiming::new("astuces", 0.5, 1.0),
        WordTiming::new("Trois", 0.0, 0.5),
    ]);
    let media = FakeMedia::new(true, ComposeMode::Ok);
    let footage = FakeFootage::with(vec![Some(clip())]);

    let video = h
        .pipeline(&[&synth], &stt, &media, &footage)
        .generate(&request().with_language("es"))
        .await
        .unwrap();

    assert_eq!(stt.hints.lock().unwrap().clone(), vec![Some("es".to_string())]);
    let job = media.last_job();
    assert_eq!(job.words[0].word, "Trois");
    assert_eq!(video.overlay_count, 2);
    assert!(h.work_files().is_empty());
}

#[tokio::test]
async fn empty_timing_still_renders_full_length_video() {
    let h = Harness::new();
    let synth = FakeSynth::new("plain", audio_without_timings);
    let stt = FakeTranscriber::new(Vec::new());
    let media = FakeMedia::new(true, ComposeMode::Ok);
    let footage = FakeFootage::with(vec![Some(clip())]);

    let video = h
        .pipeline(&[&synth], &stt, &media, &footage)
        .generate(&request())
        .await
        .unwrap();

    assert_eq!(stt.calls(), 1);
    assert!(media.last_job().words.is_empty());
    assert_eq!(video.overlay_count, 0);
    assert_eq!(video.duration, AUDIO_SECS);
}

#[tokio::test]
async fn tts_exhaustion_stops_before_transcription_and_composition() {
    let h = Harness::new();
    let first = FakeSynth::new("first", auth_failure);
    let second = FakeSynth::new("second", empty_audio);
    let stt = FakeTranscriber::new(Vec::new());
    let media = FakeMedia::new(true, ComposeMode::Ok);
    let footage = FakeFootage::with(vec![Some(clip())]);

    let err = h
        .pipeline(&[&first, &second], &stt, &media, &footage)
        .generate(&request())
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Some(Stage::Narration));
    match inner(err) {
        Error::ProvidersExhausted { chain, failures } => {
            assert_eq!(chain, "narration");
            assert_eq!(failures.len(), 2);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(first.calls.load(Ordering::SeqCst), 1);
    assert_eq!(second.calls.load(Ordering::SeqCst), 1);
    assert_eq!(stt.calls(), 0);
    assert_eq!(media.compose_calls.load(Ordering::SeqCst), 0);
    assert!(h.work_files().is_empty());
    assert!(h.out_files().is_empty());
}

#[tokio::test]
async fn tts_preference_moves_provider_first() {
    let h = Harness::new();
    let first = FakeSynth::new("deepgram", audio_without_timings);
    let second = FakeSynth::new("google", audio_with_timings);
    let stt = FakeTranscriber::new(Vec::new());
    let media = FakeMedia::new(true, ComposeMode::Ok);
    let footage = FakeFootage::with(vec![Some(clip())]);

    h.pipeline(&[&first, &second], &stt, &media, &footage)
        .generate(&request().with_tts_preference("google"))
        .await
        .unwrap();

    assert_eq!(first.calls.load(Ordering::SeqCst), 0);
    assert_eq!(second.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unknown_tts_preference_is_rejected() {
    let h = Harness::new();
    let synth = FakeSynth::new("deepgram", audio_with_timings);
    let stt = FakeTranscriber::new(Vec::new());
    let media = FakeMedia::new(true, ComposeMode::Ok);
    let footage = FakeFootage::with(vec![Some(clip())]);

    let err = h
        .pipeline(&[&synth], &stt, &media, &footage)
        .generate(&request().with_tts_preference("polly"))
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Some(Stage::Narration));
    assert!(matches!(inner(err), Error::Config(_)));
    assert_eq!(synth.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn footage_retries_once_with_generic_term() {
    let h = Harness::new();
    let synth = FakeSynth::new("timed", audio_with_timings);
    let stt = FakeTranscriber::new(Vec::new());
    let media = FakeMedia::new(true, ComposeMode::Ok);
    let footage = FakeFootage::with(vec![None, Some(clip())]);

    h.pipeline(&[&synth], &stt, &media, &footage)
        .generate(&request().with_category("motivation"))
        .await
        .unwrap();

    assert_eq!(
        footage.queries(),
        vec!["Trois astuces pour retenir un", "motivation success"]
    );
}

#[tokio::test]
async fn footage_not_found_after_retry_fails_cleanly() {
    let h = Harness::new();
    let synth = FakeSynth::new("timed", audio_with_timings);
    let stt = FakeTranscriber::new(Vec::new());
    let media = FakeMedia::new(true, ComposeMode::Ok);
    let footage = FakeFootage::with(vec![None, None, Some(clip())]);

    let err = h
        .pipeline(&[&synth], &stt, &media, &footage)
        .generate(&request())
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Some(Stage::Footage));
    assert!(matches!(inner(err), Error::NoResult(_)));
    assert_eq!(footage.queries().len(), 2);
    assert_eq!(synth.calls.load(Ordering::SeqCst), 0);
    assert!(h.work_files().is_empty());
}

#[tokio::test]
async fn composition_failure_removes_every_temporary() {
    let h = Harness::new();
    let synth = FakeSynth::new("timed", audio_with_timings);
    let stt = FakeTranscriber::new(Vec::new());
    let media = FakeMedia::new(true, ComposeMode::Fail);
    let footage = FakeFootage::with(vec![Some(clip())]);

    let err = h
        .pipeline(&[&synth], &stt, &media, &footage)
        .generate(&request())
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Some(Stage::Composition));
    assert!(matches!(inner(err), Error::Ffmpeg(_)));
    assert!(h.work_files().is_empty());
    assert!(h.out_files().is_empty());
}

#[tokio::test]
async fn empty_output_is_never_returned() {
    let h = Harness::new();
    let synth = FakeSynth::new("timed", audio_with_timings);
    let stt = FakeTranscriber::new(Vec::new());
    let media = FakeMedia::new(true, ComposeMode::EmptyOutput);
    let footage = FakeFootage::with(vec![Some(clip())]);

    let err = h
        .pipeline(&[&synth], &stt, &media, &footage)
        .generate(&request())
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Some(Stage::Output));
    assert!(matches!(inner(err), Error::EmptyArtifact(_)));
    assert!(h.out_files().is_empty());
    assert!(h.work_files().is_empty());
}

#[tokio::test]
async fn short_script_is_rejected_before_footage_search() {
    let h = Harness::new();
    let synth = FakeSynth::new("timed", audio_with_timings);
    let stt = FakeTranscriber::new(Vec::new());
    let media = FakeMedia::new(true, ComposeMode::Ok);
    let footage = FakeFootage::with(vec![Some(clip())]);

    let err = h
        .pipeline(&[&synth], &stt, &media, &footage)
        .with_script(Arc::new(FakeScript("Ok.")))
        .generate(&request())
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Some(Stage::Script));
    assert!(matches!(inner(err), Error::EmptyArtifact(_)));
    assert!(footage.queries().is_empty());
}

// ─── Caption flow ────────────────────────────────────────────────────────────

#[tokio::test]
async fn caption_without_audio_fails_before_transcription() {
    let h = Harness::new();
    let synth = FakeSynth::new("timed", audio_with_timings);
    let stt = FakeTranscriber::new(vec![WordTiming::new("salut", 0.0, 0.5)]);
    let media = FakeMedia::new(false, ComposeMode::Ok);
    let footage: Arc<FakeFootage> = FakeFootage::default().into();

    let err = h
        .pipeline(&[&synth], &stt, &media, &footage)
        .caption_existing(b"mp4 bytes", "holiday.mp4")
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Some(Stage::AudioExtraction));
    assert!(matches!(inner(err), Error::NoAudioTrack));
    assert_eq!(stt.calls(), 0);
    assert_eq!(media.compose_calls.load(Ordering::SeqCst), 0);
    assert!(h.work_files().is_empty());
}

#[tokio::test]
async fn caption_keeps_original_audio() {
    let h = Harness::new();
    let synth = FakeSynth::new("timed", audio_with_timings);
    let stt = FakeTranscriber::new(vec![
        WordTiming::new("salut", 0.0, 0.5),
        WordTiming::new("vous", 0.5, 0.9),
    ]);
    let media = FakeMedia::new(true, ComposeMode::Ok);
    let footage: Arc<FakeFootage> = FakeFootage::default().into();

    let video = h
        .pipeline(&[&synth], &stt, &media, &footage)
        .caption_existing(b"mp4 bytes", "My Holiday.mov")
        .await
        .unwrap();

    let job = media.last_job();
    assert!(job.use_original_audio());
    assert!(matches!(job.footage, FootageSource::Local(_)));
    assert_eq!(stt.hints.lock().unwrap().clone(), vec![None]);
    assert_eq!(synth.calls.load(Ordering::SeqCst), 0);

    let name = video.path.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("subtitled_"));
    assert!(name.ends_with("_My_Holiday.mp4"));
    assert_eq!(video.overlay_count, 2);
    assert!(h.work_files().is_empty());
}

#[tokio::test]
async fn caption_rejects_empty_upload() {
    let h = Harness::new();
    let synth = FakeSynth::new("timed", audio_with_timings);
    let stt = FakeTranscriber::new(Vec::new());
    let media = FakeMedia::new(true, ComposeMode::Ok);
    let footage: Arc<FakeFootage> = FakeFootage::default().into();

    let err = h
        .pipeline(&[&synth], &stt, &media, &footage)
        .caption_existing(b"", "empty.mp4")
        .await
        .unwrap_err();

    assert!(matches!(inner(err), Error::EmptyArtifact(_)));
    assert!(h.work_files().is_empty());
}
