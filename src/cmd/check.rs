use anyhow::Result;

use clipcast::{Config, Credentials, Pipeline};

pub async fn cmd_check(config: Config, credentials: &Credentials) -> Result<()> {
    eprintln!("🔍 clipcast {}", clipcast::VERSION);
    eprintln!("   Output: {}", config.paths.output_dir.display());
    eprintln!("   Work dir: {}", config.paths.work_dir.display());

    let pipeline = Pipeline::from_config(config, credentials)?;

    eprintln!("\nTools:");
    let mut all_ok = true;
    for (tool, ok) in pipeline.check_dependencies().await {
        all_ok &= ok;
        eprintln!("   {} {tool}", if ok { "✅" } else { "❌" });
    }

    eprintln!("\nCredentials:");
    let present = credentials.present();
    if present.is_empty() {
        eprintln!("   (none set)");
    }
    for name in present {
        eprintln!("   ✅ {name}");
    }

    if !all_ok {
        anyhow::bail!("required tools are missing");
    }
    Ok(())
}
