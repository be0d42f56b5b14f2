//! One-shot command line stylizer.
//!
//!   stylize me.jpg --style "Watercolor Painting" --provider replicate

use anyhow::{Context, Result};
use clap::Parser;
use portrait_stylizer::cli::ProviderOptions;
use portrait_stylizer::config::setup_logging;
use portrait_stylizer::constants::DOWNLOAD_FILENAME;
use portrait_stylizer::providers::CancelFlag;
use portrait_stylizer::{Provider, Stylizer, codec, styles};
use std::path::PathBuf;
use tracing::{info, warn};

/// Turn a photo into an AI art portrait.
#[derive(Parser, Debug)]
#[command(name = "stylize")]
struct Args {
    /// Photo to stylize (jpg or png)
    input: Option<PathBuf>,

    /// Style label, see --list-styles
    #[arg(long, short, default_value = "Cinematic Portrait")]
    style: String,

    /// openai or replicate
    #[arg(long, short, default_value = "openai")]
    provider: String,

    /// Where to write the PNG result
    #[arg(long, short, default_value = DOWNLOAD_FILENAME)]
    output: PathBuf,

    /// Print the available styles and exit
    #[arg(long)]
    list_styles: bool,

    /// Enable debug logging
    #[arg(long, env = "STYLIZER_DEBUG")]
    debug: bool,

    #[command(flatten)]
    providers: ProviderOptions,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.list_styles {
        for style in styles::all() {
            println!("{:<22} {}", style.label, style.prompt_text);
        }
        return Ok(());
    }

    setup_logging(args.debug).context("Failed to set up logging")?;

    let input = args
        .input
        .as_deref()
        .context("An input photo is required")?;
    let provider: Provider = args.provider.parse()?;
    let bytes =
        std::fs::read(input).with_context(|| format!("Failed to read {}", input.display()))?;
    let image = codec::decode(&bytes)?;

    let stylizer = Stylizer::new(args.providers.settings())?;
    let credentials = args.providers.credentials();

    let cancel = CancelFlag::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping after the current poll");
            on_ctrl_c.cancel();
        }
    });

    info!("Generating with {}...", provider);
    let result = stylizer
        .run_with_cancel(provider, image, &args.style, &credentials, &cancel)
        .await?;

    codec::write_png(&result.image, &args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    eprintln!("Saved: {}", args.output.display());
    Ok(())
}
