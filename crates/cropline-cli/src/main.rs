//! Cropline CLI: issue crop URLs and manage crops from the command line.
//!
//! Reads the same environment as the HTTP server (`CROPLINE_*`, `.env`).

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use cropline_cli::{init_tracing, parse_option};
use cropline_core::{CropOption, CroplineConfig};
use cropline_services::Cropper;
use serde::Serialize;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "cropline", about = "Cropline image crop CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Source image plus the crop to derive from it.
#[derive(Args)]
struct CropArgs {
    /// Source path or a URL previously issued for it
    src: String,
    /// Target width in pixels (omit to derive from the aspect ratio)
    #[arg(long)]
    width: Option<u32>,
    /// Target height in pixels (omit to derive from the aspect ratio)
    #[arg(long)]
    height: Option<u32>,
    /// Crop option in path form, repeatable: `crop`, `quality(80)`, `pad(0,0,0)`
    #[arg(long = "option", value_parser = parse_option)]
    options: Vec<CropOption>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the signed URL of a crop
    Url(CropArgs),
    /// Print an <img> tag for a crop
    Tag(CropArgs),
    /// Render a crop now and print its storage key
    Render {
        /// Encoded crop path or URL
        path: String,
    },
    /// Render a crop now and print the URL it is served from
    Resolve {
        /// Encoded crop path or URL
        path: String,
    },
    /// Delete a source image and all of its crops
    Delete {
        /// Source path or URL
        src: String,
    },
    /// Delete all crops of a source image, keeping the source
    Reset {
        /// Source path or URL
        src: String,
    },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    let config = CroplineConfig::from_env().context("Failed to load configuration")?;
    let cropper = Cropper::from_config(Arc::new(config))
        .await
        .context("Failed to initialize crop services")?;

    match cli.command {
        Commands::Url(args) => {
            let crop = cropper.url(&args.src, args.width, args.height, args.options)?;
            print_json(&serde_json::json!({
                "path": crop.path,
                "token": crop.token,
                "url": crop.url,
            }))?;
        }
        Commands::Tag(args) => {
            let tag = cropper.tag(&args.src, args.width, args.height, args.options)?;
            println!("{}", tag);
        }
        Commands::Render { path } => {
            let key = cropper.render(&path).await?;
            print_json(&serde_json::json!({ "key": key }))?;
        }
        Commands::Resolve { path } => {
            let url = cropper.render_to_actual_path(&path).await?;
            print_json(&serde_json::json!({ "url": url }))?;
        }
        Commands::Delete { src } => {
            let report = cropper.delete(&src).await?;
            print_json(&serde_json::json!({
                "source": report.source,
                "crops": report.crops,
            }))?;
        }
        Commands::Reset { src } => {
            let crops = cropper.reset(&src).await?;
            print_json(&serde_json::json!({ "crops": crops }))?;
        }
    }

    Ok(())
}
