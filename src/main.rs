// SPDX-License-Identifier: MIT
//! carbom: inspect BOM stores and extract images from CoreUI asset catalogs

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use image::{ImageFormat, RgbaImage};
use serde_json::json;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use carbom::bom::BomError;
use carbom::car::{PixelBuffer, RenditionPayload, UnsupportedKind};
use carbom::{AssetCatalog, CarError, ExtractConfig};

#[derive(Parser)]
#[command(name = "carbom")]
#[command(about = "Inspect BOM stores and CoreUI asset catalogs", long_about = None)]
struct Cli {
    /// Path to a .car or other BOM store file
    file: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List named blocks with their block index and length
    Blocks,
    /// Show the catalog header, extended metadata and key format
    Info {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// List FACETKEYS
    Facets,
    /// List APPEARANCEKEYS
    Appearances,
    /// List every rendition and how it decoded
    Renditions,
    /// Write every decoded image as PNG
    Extract {
        /// Output directory (overrides CARBOM_OUTPUT_DIR)
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Stop at the first rendition that fails to decode
        #[arg(long)]
        stop_on_error: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = ExtractConfig::from_env();
    if let Commands::Extract { out, stop_on_error } = &cli.command {
        if let Some(out) = out {
            config.output_dir = out.clone();
        }
        config.stop_on_error |= *stop_on_error;
    }
    config.validate().map_err(|e| anyhow!(e))?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let file = File::open(&cli.file).with_context(|| format!("Failed to open {:?}", cli.file))?;
    let mut catalog = AssetCatalog::open(BufReader::new(file))
        .with_context(|| format!("Failed to read BOM store {:?}", cli.file))?;

    match cli.command {
        Commands::Blocks => list_blocks(&mut catalog)?,
        Commands::Info { json } => show_info(&mut catalog, json)?,
        Commands::Facets => list_facets(&mut catalog)?,
        Commands::Appearances => list_appearances(&mut catalog)?,
        Commands::Renditions => list_renditions(&mut catalog)?,
        Commands::Extract { .. } => extract(&mut catalog, &config)?,
    }

    Ok(())
}

fn list_blocks(catalog: &mut AssetCatalog<BufReader<File>>) -> Result<()> {
    let container = catalog.container();
    for var in container.vars() {
        let pointer = container.block_table().get(var.index)?;
        if pointer.length == 0 {
            println!("{:<24} block {:>5}  empty", var.name, var.index);
        } else {
            println!(
                "{:<24} block {:>5}  {} bytes at {:#x}",
                var.name, var.index, pointer.length, pointer.address
            );
        }
    }
    Ok(())
}

fn show_info(catalog: &mut AssetCatalog<BufReader<File>>, as_json: bool) -> Result<()> {
    let header = catalog.car_header().context("Failed to read CARHEADER")?;
    let metadata = optional(catalog.extended_metadata()).context("Failed to read EXTENDED_METADATA")?;
    let key_format = catalog.key_format().context("Failed to read KEYFORMAT")?;

    if as_json {
        let value = json!({
            "header": header,
            "extended_metadata": metadata,
            "key_format": key_format,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("CoreUI version:   {}", header.coreui_version);
    println!("Storage version:  {}", header.storage_version);
    if let Some(time) = header.storage_time() {
        println!("Stored at:        {}", time.to_rfc3339());
    }
    println!("Renditions:       {}", header.rendition_count);
    println!("Main version:     {}", header.main_version_string);
    println!("Version:          {}", header.version_string);
    println!("UUID:             {}", header.uuid);
    println!("Schema version:   {}", header.schema_version);
    println!("Color space:      {}", header.color_space_id);
    println!("Key semantics:    {}", header.key_semantics);
    if let Some(metadata) = metadata {
        println!(
            "Deployment:       {} {}",
            metadata.deployment_platform, metadata.deployment_platform_version
        );
        println!("Authoring tool:   {}", metadata.authoring_tool);
    }
    let tokens: Vec<String> = key_format.tokens.iter().map(|t| t.to_string()).collect();
    println!("Key format:       {}", tokens.join(", "));
    Ok(())
}

fn list_facets(catalog: &mut AssetCatalog<BufReader<File>>) -> Result<()> {
    for (name, facet) in catalog.facet_keys().context("Failed to read FACETKEYS")? {
        let attributes: Vec<String> = facet
            .attributes
            .iter()
            .map(|(attribute, value)| format!("{}={:#06x}", attribute, value))
            .collect();
        println!("{}: {}", name, attributes.join(" "));
    }
    Ok(())
}

fn list_appearances(catalog: &mut AssetCatalog<BufReader<File>>) -> Result<()> {
    for (name, value) in catalog
        .appearance_keys()
        .context("Failed to read APPEARANCEKEYS")?
    {
        println!("{}: {}", name, value);
    }
    Ok(())
}

fn list_renditions(catalog: &mut AssetCatalog<BufReader<File>>) -> Result<()> {
    for rendition in catalog.renditions()? {
        let rendition = rendition.context("Failed to walk RENDITIONS")?;
        let outcome = match &rendition.payload {
            Ok(RenditionPayload::Image(image)) => format!(
                "image {}x{} {:?} {}",
                image.buffer.width(),
                image.buffer.height(),
                image.framing,
                image.compression
            ),
            Ok(RenditionPayload::MultisizeImageSet(set)) => {
                format!("multisize {} {}x{}", set.idiom, set.width, set.height)
            }
            Ok(RenditionPayload::Color { raw }) => format!("color ({} bytes)", raw.len()),
            Ok(RenditionPayload::Unsupported(unsupported)) => match unsupported.kind {
                UnsupportedKind::PixelFormat(tag) => format!("unsupported format {}", tag),
                UnsupportedKind::Layout(layout) => format!("unsupported layout {}", layout),
            },
            Err(e) => format!("error: {}", e),
        };
        println!(
            "{:>4}  [{}]  {}  {}  {}  {}",
            rendition.index,
            rendition.key,
            rendition.header.name,
            rendition.header.pixel_format,
            rendition.header.layout,
            outcome
        );
    }
    Ok(())
}

fn extract(catalog: &mut AssetCatalog<BufReader<File>>, config: &ExtractConfig) -> Result<()> {
    fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("Failed to create {:?}", config.output_dir))?;

    let mut written = 0usize;
    let mut failed = 0usize;
    for rendition in catalog.renditions()? {
        let rendition = rendition.context("Failed to walk RENDITIONS")?;
        match &rendition.payload {
            Ok(RenditionPayload::Image(image)) => {
                let path = config.output_dir.join(format!(
                    "{}-{}.png",
                    rendition.index,
                    file_stem(&rendition.header.name)
                ));
                write_png(&image.buffer, &path)?;
                debug!(path = %path.display(), "Wrote image");
                written += 1;
            }
            Ok(_) => {}
            Err(e) if config.stop_on_error => {
                bail!("Rendition {} ({}): {}", rendition.index, rendition.key, e)
            }
            Err(e) => {
                warn!(index = rendition.index, key = %rendition.key, error = %e, "Skipping rendition");
                failed += 1;
            }
        }
    }

    info!(written, failed, output = %config.output_dir.display(), "Extraction finished");
    Ok(())
}

fn write_png(buffer: &PixelBuffer, path: &Path) -> Result<()> {
    if buffer.width() == 0 || buffer.height() == 0 {
        warn!(path = %path.display(), "Skipping empty image");
        return Ok(());
    }
    let image = RgbaImage::from_raw(buffer.width(), buffer.height(), buffer.to_rgba8())
        .ok_or_else(|| anyhow!("RGBA buffer does not match {}x{}", buffer.width(), buffer.height()))?;
    image
        .save_with_format(path, ImageFormat::Png)
        .with_context(|| format!("Failed to write {:?}", path))
}

/// File-system safe stem of a rendition name
fn file_stem(name: &str) -> String {
    let stem = Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(name);
    let cleaned: String = stem
        .chars()
        .map(|c| if c.is_alphanumeric() || "-_@.".contains(c) { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "rendition".to_string()
    } else {
        cleaned
    }
}

/// Treat a missing block as absent rather than an error
fn optional<T>(result: Result<T, CarError>) -> Result<Option<T>, CarError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(CarError::Bom(BomError::NameNotFound(_))) => Ok(None),
        Err(e) => Err(e),
    }
}
