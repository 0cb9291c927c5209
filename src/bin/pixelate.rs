use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use pixelizer::{PaletteMode, PixelizerOptions, decode_raster, encode_png, process_image};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Turn images into low-color pixel art.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// One or more input image paths
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Number of colors for k-means; also caps colors tracked per pixel block
    #[arg(short = 'k', long, default_value_t = 8)]
    n_colors: usize,

    /// Pixel block granularity; larger values give bigger blocks
    #[arg(short, long, default_value_t = 1.0)]
    relative_scale: f32,

    /// Bias towards darker colors when picking each block's color (0 = most frequent)
    #[arg(short, long, default_value_t = 0.0)]
    weight_c: f32,

    /// Only reduce the palette, keep the original resolution
    #[arg(long)]
    no_pixelize: bool,

    /// Longest side of the output. If omitted, original dimensions are used.
    #[arg(short, long)]
    output_size: Option<u32>,

    /// Comma-separated list of hex colors to use as palette (skip k-means)
    #[arg(short = 'c', long)]
    palette: Option<String>,

    /// Reference image to build the k-means palette from
    #[arg(long, conflicts_with = "palette")]
    palette_source: Option<PathBuf>,

    /// Output directory
    #[arg(short = 'd', long)]
    out_dir: Option<PathBuf>,

    /// Output filename prefix (ignored when --out-dir supplied)
    #[arg(short = 'p', long, default_value = "pixelated_")]
    prefix: String,

    /// Print a JSON report of every written file and its palette
    #[arg(long)]
    json: bool,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn output_path(args: &Args, input: &Path) -> Result<PathBuf> {
    if let Some(dir) = &args.out_dir {
        let stem = input.file_stem().unwrap_or_default().to_string_lossy();
        return Ok(dir.join(format!("{stem}.png")));
    }
    let name = input
        .file_name()
        .with_context(|| format!("{} has no file name", input.display()))?
        .to_string_lossy();
    let out = match input.parent() {
        Some(parent) => parent.join(format!("{}{}", args.prefix, name)),
        None => PathBuf::from(format!("{}{}", args.prefix, name)),
    };
    Ok(out.with_extension("png"))
}

fn build_options(args: &Args) -> Result<PixelizerOptions> {
    let mut options = PixelizerOptions {
        n_colors: args.n_colors,
        should_pixelize: !args.no_pixelize,
        relative_scale: args.relative_scale,
        weight_c: args.weight_c,
        output_size: args.output_size,
        ..PixelizerOptions::default()
    };

    if let Some(spec) = &args.palette {
        options.palette_mode = PaletteMode::Custom;
        options.custom_palette_spec = spec.clone();
    } else if let Some(path) = &args.palette_source {
        let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        let raster = decode_raster(&bytes)
            .with_context(|| format!("decoding palette source {}", path.display()))?;
        options.fix_palette_source = Some(raster);
    }

    Ok(options)
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let options = build_options(&args)?;
    debug!(palette_mode = ?options.palette_mode, n_colors = options.n_colors, "options parsed");

    let mut report = Vec::new();

    for input in &args.inputs {
        let bytes = fs::read(input).with_context(|| format!("reading {}", input.display()))?;
        let raster =
            decode_raster(&bytes).with_context(|| format!("decoding {}", input.display()))?;

        let result = process_image(&raster, &options)
            .with_context(|| format!("pixelating {}", input.display()))?;
        let png = encode_png(&result.final_image).context("PNG encode failed")?;

        let out_path = output_path(&args, input)?;
        if let Some(parent) = out_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&out_path, png).with_context(|| format!("writing {}", out_path.display()))?;
        info!(path = %out_path.display(), colors = result.palette.len(), "saved");

        if args.json {
            let (width, height) = result.final_image.dimensions();
            report.push(serde_json::json!({
                "input": input.display().to_string(),
                "output": out_path.display().to_string(),
                "width": width,
                "height": height,
                "palette": result.palette.to_hex(),
            }));
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(())
}
