use anyhow::Result;

use clipcast::{Config, Credentials, GenerationRequest, Pipeline};

pub async fn cmd_generate(
    config: Config,
    credentials: &Credentials,
    request: &GenerationRequest,
) -> Result<()> {
    eprintln!("🎬 Generating: {}", request.prompt);
    eprintln!("   Tone: {}  Category: {}", request.tone, request.category);
    eprintln!("   Language: {}  TTS: {}", request.language, request.tts_preference);

    let pipeline = Pipeline::from_config(config, credentials)?;

    let start = std::time::Instant::now();
    let artifact = pipeline.generate(request).await?;

    super::print_artifact(&artifact, start.elapsed());
    Ok(())
}
