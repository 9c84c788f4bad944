use std::path::Path;

use anyhow::{Context, Result};

use clipcast::{Config, Credentials, Pipeline};

pub async fn cmd_caption(config: Config, credentials: &Credentials, video: &Path) -> Result<()> {
    eprintln!("🎬 Captioning: {}", video.display());

    let bytes = tokio::fs::read(video)
        .await
        .with_context(|| format!("cannot read {}", video.display()))?;
    let filename = video
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "video.mp4".to_string());

    let pipeline = Pipeline::from_config(config, credentials)?;

    let start = std::time::Instant::now();
    let artifact = pipeline.caption_existing(&bytes, &filename).await?;

    if artifact.overlay_count == 0 {
        eprintln!("⚠️  No speech transcribed; video has no subtitles");
    }
    super::print_artifact(&artifact, start.elapsed());
    Ok(())
}
