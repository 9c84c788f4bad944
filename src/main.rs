//! `clipcast` CLI - generate short vertical videos or caption existing ones

mod cmd;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "clipcast")]
#[command(about = "Prompt-to-short-video generator with word-synchronized subtitles")]
#[command(version)]
struct Cli {
    /// Config file (default: ~/.config/clipcast/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a narrated, subtitled video from a prompt
    Generate {
        /// Video concept
        #[arg(short, long)]
        prompt: String,

        /// Script tone
        #[arg(short, long, default_value = "percutant")]
        tone: String,

        /// Category for fallback footage (astuce, motivation, lifestyle)
        #[arg(long, default_value = "astuce")]
        category: String,

        /// Narration language
        #[arg(short, long, default_value = "fr")]
        lang: String,

        /// Narration provider to try first, or "auto"
        #[arg(long, default_value = "auto")]
        tts: String,
    },

    /// Burn word-synchronized subtitles into an existing video
    Caption {
        /// Video file to caption
        video: PathBuf,
    },

    /// Report external tools and credentials
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let config = clipcast::Config::load(cli.config.as_deref())?;
    let credentials = clipcast::Credentials::from_env();

    match cli.command {
        Commands::Generate {
            prompt,
            tone,
            category,
            lang,
            tts,
        } => {
            let request = clipcast::GenerationRequest::new(prompt)
                .with_tone(&tone)
                .with_category(&category)
                .with_language(&lang)
                .with_tts_preference(&tts);
            cmd::generate::cmd_generate(config, &credentials, &request).await?;
        }
        Commands::Caption { video } => {
            cmd::caption::cmd_caption(config, &credentials, &video).await?;
        }
        Commands::Check => {
            cmd::check::cmd_check(config, &credentials).await?;
        }
    }

    Ok(())
}
