use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use stylizer::{
    config::Config,
    generation::{ImageGenerator, LimitedGenerator, StableDiffusionApi},
    imaging::{self, ImageKind},
    server::{self, AppState},
    storage::{self, ArtifactStore},
    StyleRegistry, TransformEngine,
};

#[derive(Parser)]
#[command(
    name = "stylizer",
    version,
    about = "Turn portrait photos into stylized renditions",
    long_about = "Stylizer serves an upload API that re-renders photos in a chosen art style (anime, manga, pop art, ...) through a Stable Diffusion img2img backend."
)]
struct Cli {
    /// Configuration file (optional)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP service
    Serve(ServeArgs),

    /// Stylize a single local image
    Render {
        /// Input image (png, jpg, jpeg)
        #[arg(short, long)]
        input: PathBuf,

        /// Output image; the format follows the extension
        #[arg(short, long)]
        output: PathBuf,

        /// Style to apply
        #[arg(short, long, default_value = "anime")]
        style: String,

        /// Prompt for styles outside the registry
        #[arg(short, long)]
        prompt: Option<String>,
    },

    /// List the available styles
    Styles,
}

#[derive(clap::Args, Default)]
struct ServeArgs {
    /// Interface to bind
    #[arg(long, env = "STYLIZER_HOST")]
    host: Option<String>,

    /// Port to bind
    #[arg(long, env = "STYLIZER_PORT")]
    port: Option<u16>,

    /// Base URL of the Stable Diffusion web API
    #[arg(long, env = "STYLIZER_BACKEND_URL")]
    backend_url: Option<String>,

    /// Externally visible base URL for generated image links
    #[arg(long, env = "STYLIZER_PUBLIC_URL")]
    public_url: Option<String>,
}

impl ServeArgs {
    fn apply(self, config: &mut Config) {
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(backend_url) = self.backend_url {
            config.generation.backend_url = backend_url;
        }
        if let Some(public_url) = self.public_url {
            config.server.public_url = Some(public_url);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Load configuration
    let mut config = match &cli.config {
        Some(config_path) => {
            info!("Loading configuration from {:?}", config_path);
            Config::from_file(config_path)?
        }
        None => Config::default(),
    };

    match cli.command.unwrap_or(Command::Serve(ServeArgs::default())) {
        Command::Serve(args) => {
            args.apply(&mut config);
            config.validate()?;
            serve(config).await
        }
        Command::Render { input, output, style, prompt } => {
            config.validate()?;
            render(config, input, output, style, prompt).await
        }
        Command::Styles => {
            print_styles();
            Ok(())
        }
    }
}

fn build_generator(config: &Config) -> Result<Arc<dyn ImageGenerator>> {
    let settings = &config.generation;
    let backend = StableDiffusionApi::new(&settings.backend_url, settings.model.clone(), settings.timeout())?;
    info!("Generation backend: {} (max {} concurrent)", backend.endpoint(), settings.max_concurrent);

    Ok(Arc::new(LimitedGenerator::new(Arc::new(backend), settings.max_concurrent)))
}

async fn serve(config: Config) -> Result<()> {
    info!("Starting Stylizer v{}", env!("CARGO_PKG_VERSION"));

    let store = ArtifactStore::from_config(&config.storage)?;
    let engine = TransformEngine::new(build_generator(&config)?, store, &config.generation);
    let state = Arc::new(AppState::new(engine, &config.server));

    server::serve(state, &config.server).await?;
    Ok(())
}

async fn render(
    config: Config,
    input: PathBuf,
    output: PathBuf,
    style_name: String,
    prompt: Option<String>,
) -> Result<()> {
    let kind = ImageKind::from_path(&output)
        .with_context(|| format!("Unsupported output format: {:?}", output))?;

    let registry = StyleRegistry::new();
    let style = registry.resolve(&style_name, prompt.as_deref())?;
    if !storage::is_allowed_file(&input.to_string_lossy()) {
        bail!("Unsupported input file: {:?}", input);
    }

    // Nothing is persisted, so the storage directories are left alone
    let store = ArtifactStore::new(&config.storage.upload_dir, &config.storage.generated_dir);
    let engine = TransformEngine::new(build_generator(&config)?, store, &config.generation);

    info!("Input: {:?}", input);
    info!("Style: {}", style.name());

    let bytes = tokio::fs::read(&input)
        .await
        .with_context(|| format!("Failed to read {:?}", input))?;
    let image = engine.normalize(bytes).await?;
    let generated = engine.stylize(image, &style).await?;

    let encoded = imaging::encode(&generated, kind)?;
    tokio::fs::write(&output, encoded)
        .await
        .with_context(|| format!("Failed to write {:?}", output))?;

    info!("Render complete! Output saved to: {:?}", output);
    Ok(())
}

fn print_styles() {
    let registry = StyleRegistry::new();

    println!("{:<12} {:>8} {:>8} {:>5}  {}", "STYLE", "STRENGTH", "GUIDANCE", "MASK", "DESCRIPTION");
    for name in registry.available_styles() {
        if let Some(preset) = registry.get_style(&name) {
            let config = preset.config();
            println!("{:<12} {:>8.2} {:>8.1} {:>5}  {}",
                     name, config.strength, config.guidance_scale,
                     if config.use_mask { "yes" } else { "no" },
                     preset.description());
        }
    }
}
