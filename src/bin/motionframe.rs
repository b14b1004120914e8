//! CLI for motionframe - turn an image and a prompt into a video.

use clap::{Args, Parser, Subcommand, ValueEnum};
use motionframe::{
    user_message, AssetCollector, Credential, CredentialStore, JobOrchestrator, Session,
    VeoModel, VeoService, VideoService,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "motionframe")]
#[command(about = "Animate an image into a video with Veo (Gemini API)")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Credential file (defaults to $MOTIONFRAME_CREDENTIALS or the user config dir)
    #[arg(long, global = true)]
    credentials: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a video from an image and a prompt
    Generate(GenerateArgs),

    /// Manage the stored API key
    #[command(subcommand)]
    Key(KeyCommand),
}

#[derive(Args)]
struct GenerateArgs {
    /// Source image (PNG, JPEG, WebP or GIF)
    image: PathBuf,

    /// The text prompt describing the motion
    prompt: String,

    /// Output file path
    #[arg(short, long, default_value = "output.mp4")]
    output: PathBuf,

    /// Veo model
    #[arg(short, long, value_enum, default_value = "fast")]
    model: ModelArg,

    /// Seconds between status polls
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    poll_interval: u64,

    /// Seconds between progress messages (0 disables them)
    #[arg(long, default_value_t = 5)]
    progress_interval: u64,

    /// Give up after this many seconds (unbounded by default)
    #[arg(long)]
    timeout: Option<u64>,
}

#[derive(Subcommand)]
enum KeyCommand {
    /// Store an API key
    Set {
        /// The Gemini API key
        key: String,

        /// Check the key against the API before storing it
        #[arg(long)]
        verify: bool,
    },
    /// Remove the stored API key
    Clear,
    /// Show the stored API key (masked)
    Show,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModelArg {
    /// veo-3.1-fast-generate-preview
    Fast,
    /// veo-3.1-generate-preview
    Standard,
}

impl From<ModelArg> for VeoModel {
    fn from(arg: ModelArg) -> Self {
        match arg {
            ModelArg::Fast => VeoModel::Veo31FastPreview,
            ModelArg::Standard => VeoModel::Veo31Preview,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let message = match e.downcast_ref::<motionframe::MotionError>() {
                Some(err) => user_message(err),
                None => e.to_string(),
            };
            eprintln!("Error: {message}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let store = match cli.credentials {
        Some(path) => CredentialStore::at(path),
        None => CredentialStore::default_location()?,
    };

    match cli.command {
        Commands::Generate(args) => generate_video(args, store, cli.json).await,
        Commands::Key(command) => manage_key(command, store, cli.json).await,
    }
}

async fn generate_video(
    args: GenerateArgs,
    store: CredentialStore,
    json_output: bool,
) -> anyhow::Result<()> {
    let service = VeoService::builder().model(args.model.into()).build()?;
    let mut builder = JobOrchestrator::builder(service)
        .poll_interval(Duration::from_secs(args.poll_interval))
        .progress_interval(Duration::from_secs(args.progress_interval));
    if let Some(secs) = args.timeout {
        builder = builder.timeout(Duration::from_secs(secs));
    }

    let mut session = Session::open(store, builder.build())?;
    if !session.has_credential() {
        anyhow::bail!(
            "No API key found. Run `motionframe key set <KEY>` or set GOOGLE_API_KEY."
        );
    }

    let mut assets = AssetCollector::new();
    assets.load_image(&args.image).await?;
    assets.set_prompt(args.prompt);

    let video = session
        .generate(&mut assets, |message: &str| eprintln!("{message}"))
        .await?;
    video.save(&args.output)?;

    if json_output {
        let result = serde_json::json!({
            "type": "video",
            "success": true,
            "output": args.output.display().to_string(),
            "size_bytes": video.size(),
            "mime_type": video.mime_type,
            "model": video.metadata.model,
            "duration_ms": video.metadata.duration_ms,
            "resolution": video.metadata.resolution,
            "aspect_ratio": video.metadata.aspect_ratio,
            "polls": video.metadata.polls,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!(
            "Generated video: {} ({} bytes)",
            args.output.display(),
            video.size()
        );
        if let Some(duration) = video.metadata.duration_ms {
            println!("Generation time: {}ms", duration);
        }
    }

    Ok(())
}

async fn manage_key(
    command: KeyCommand,
    store: CredentialStore,
    json_output: bool,
) -> anyhow::Result<()> {
    match command {
        KeyCommand::Set { key, verify } => {
            let credential = Credential::new(key)?;
            if verify {
                let service = VeoService::builder().build()?;
                service.health_check(&credential).await?;
            }
            store.save(&credential)?;
            if json_output {
                let result = serde_json::json!({
                    "stored": true,
                    "path": store.path().display().to_string(),
                    "key": credential.masked(),
                });
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("Stored API key {} in {}", credential, store.path().display());
            }
        }
        KeyCommand::Clear => {
            let removed = store.clear()?;
            if json_output {
                println!("{}", serde_json::json!({ "cleared": removed }));
            } else if removed {
                println!("Removed stored API key");
            } else {
                println!("No API key stored");
            }
        }
        KeyCommand::Show => {
            let stored = store.load()?;
            if json_output {
                let result = serde_json::json!({
                    "path": store.path().display().to_string(),
                    "key": stored.as_ref().map(Credential::masked),
                });
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                match stored {
                    Some(credential) => println!("{} ({})", credential, store.path().display()),
                    None => println!("No API key stored ({})", store.path().display()),
                }
            }
        }
    }
    Ok(())
}
