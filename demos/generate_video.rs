//! Basic image-to-video example.
//!
//! Run with: `cargo run --example generate_video -- <image> "<prompt>"`
//!
//! Requires `GOOGLE_API_KEY` environment variable.

use motionframe::{AssetCollector, Credential, JobOrchestrator, VeoService};

#[tokio::main]
async fn main() -> motionframe::Result<()> {
    let mut args = std::env::args().skip(1);
    let image = args.next().unwrap_or_else(|| "input.png".to_string());
    let prompt = args
        .next()
        .unwrap_or_else(|| "The subject slowly turns and smiles at the camera".to_string());

    let mut assets = AssetCollector::new();
    assets.load_image(&image).await?;
    assets.set_prompt(prompt);
    let submission = assets.take_submission()?;

    let credential = Credential::new(std::env::var("GOOGLE_API_KEY").unwrap_or_default())?;
    let orchestrator = JobOrchestrator::builder(VeoService::builder().build()?).build();

    println!("Generating video (this may take a few minutes)...");
    let video = orchestrator
        .submit_and_await(&submission.prompt, submission.image, &credential, |msg: &str| {
            println!("  {msg}")
        })
        .await?;

    video.save("output.mp4")?;
    println!(
        "Generated video: {} bytes in {:?}ms",
        video.size(),
        video.metadata.duration_ms
    );

    Ok(())
}
