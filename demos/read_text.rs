use clap::Parser;
use image_text_reader::{engines, Config, ImageSource, TextExtractor};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "read_text")]
#[command(about = "Print the text found in an image")]
#[command(version)]
struct Args {
    /// Image file or http(s) URL (uses the bundled sample if omitted)
    image: Option<String>,

    /// OCR language (e.g., "eng", "deu", "fra")
    #[arg(long, env = "OCR_LANGUAGE", default_value = "eng")]
    language: String,

    /// Directory for downloaded models
    #[arg(long, env = "OCR_CACHE_DIR")]
    cache_dir: Option<PathBuf>,

    /// Path to tessdata directory (uses TESSDATA_PREFIX env var if not set)
    #[arg(long, env = "TESSDATA_PREFIX")]
    tessdata_path: Option<PathBuf>,

    /// Print the full recognition result as JSON
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    log_level: String,
}

impl From<&Args> for Config {
    fn from(args: &Args) -> Self {
        let mut config = Config {
            language: args.language.clone(),
            tessdata_path: args.tessdata_path.clone(),
            ..Config::default()
        };
        if let Some(dir) = &args.cache_dir {
            config.cache_dir = dir.clone();
        }
        config
    }
}

fn image_source(arg: &str) -> ImageSource {
    if arg.starts_with("http://") || arg.starts_with("https://") {
        ImageSource::url(arg)
    } else {
        ImageSource::path(arg)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Compiled engines: {:?}", engines::available());

    let extractor = TextExtractor::with_config(&Config::from(&args));
    let image = args.image.as_deref().map(image_source);
    let recognition = extractor.recognize(image.as_ref()).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&recognition)?);
    } else {
        println!("{}", recognition.text);
    }

    Ok(())
}
