pub mod caption;
pub mod check;
pub mod generate;

use clipcast::VideoArtifact;

/// Print the finished artifact; the path goes to stdout for scripting.
pub fn print_artifact(artifact: &VideoArtifact, elapsed: std::time::Duration) {
    eprintln!("\n✅ Done in {:.1}s", elapsed.as_secs_f64());
    eprintln!(
        "   {}x{}, {:.1}s, {} subtitle words",
        artifact.width, artifact.height, artifact.duration, artifact.overlay_count
    );
    println!("{}", artifact.path.display());
}
