use anyhow::{Context, Result, anyhow};
use clap::Parser;
use image_color_inspector_wasm::{
    ExtractOptions, PaletteStrategy, PixelBuffer, decode_rgba, downscale_for_palette,
    extract_palette_with, sample_pixel,
};
use log::info;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

/// Print the dominant colors of images and the exact color of chosen pixels.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// One or more input image paths
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Maximum number of palette colors
    #[arg(short = 'k', long, default_value_t = 8)]
    max_colors: usize,

    /// Scan every n-th pixel when building the palette
    #[arg(short, long, default_value_t = 4)]
    stride: usize,

    /// Pixels with alpha below this are ignored
    #[arg(short, long, default_value_t = 125)]
    alpha_threshold: u8,

    /// Use k-means clustering instead of the bucket histogram
    #[arg(long)]
    kmeans: bool,

    /// Shrink the image so its longest side is at most this many pixels before extraction
    #[arg(short, long)]
    downscale: Option<u32>,

    /// Pixel to sample, as `X,Y` in natural-resolution coordinates (repeatable)
    #[arg(long = "sample", value_parser = parse_point)]
    samples: Vec<(i64, i64)>,

    /// Emit JSON instead of text
    #[arg(long)]
    json: bool,

    /// Log extraction details
    #[arg(short, long)]
    verbose: bool,
}

fn parse_point(s: &str) -> Result<(i64, i64)> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| anyhow!("expected X,Y, got {s:?}"))?;
    Ok((x.trim().parse()?, y.trim().parse()?))
}

#[derive(Serialize)]
struct Report<'a> {
    input: &'a str,
    palette: Vec<image_color_inspector_wasm::ColorSwatch>,
    samples: Vec<SampleReport>,
}

#[derive(Serialize)]
struct SampleReport {
    x: i64,
    y: i64,
    color: Option<image_color_inspector_wasm::SampledColor>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let options = ExtractOptions::default()
        .with_max_colors(args.max_colors)
        .with_sample_stride(args.stride)
        .with_alpha_threshold(args.alpha_threshold)
        .with_strategy(if args.kmeans {
            PaletteStrategy::KMeans
        } else {
            PaletteStrategy::Histogram
        });
    options.validate()?;

    for input in &args.inputs {
        let bytes = fs::read(input).with_context(|| format!("reading {}", input.display()))?;
        let natural = decode_rgba(&bytes)
            .with_context(|| format!("decoding {}", input.display()))?;
        let buffer = PixelBuffer::from_image(&natural);

        let palette = match args.downscale {
            Some(side) => {
                let preview = downscale_for_palette(&natural, side);
                let shrunk = PixelBuffer::from_image(&preview);
                extract_palette_with(&shrunk, &options)
            }
            None => extract_palette_with(&buffer, &options),
        }
        .with_context(|| format!("palette extraction failed for {}", input.display()))?;
        info!("{}: {} swatches", input.display(), palette.len());

        let mut samples = Vec::with_capacity(args.samples.len());
        for &(x, y) in &args.samples {
            let color = match sample_pixel(&buffer, x, y) {
                Ok(c) => Some(c),
                Err(e) if e.is_out_of_bounds() => None,
                Err(e) => return Err(e).context("sampling failed"),
            };
            samples.push(SampleReport { x, y, color });
        }

        let name = input.to_string_lossy();
        if args.json {
            let report = Report {
                input: &name,
                palette,
                samples,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
            continue;
        }

        println!("{name}");
        if palette.is_empty() {
            println!("  (no opaque pixels)");
        }
        for swatch in &palette {
            println!("  {}  {:>8}  {}", swatch.hex, swatch.population, swatch.name);
        }
        for s in &samples {
            match &s.color {
                Some(c) => println!("  @({}, {})  {}  {}  {}", s.x, s.y, c.hex, c.rgb, c.name),
                None => println!("  @({}, {})  outside image", s.x, s.y),
            }
        }
    }

    Ok(())
}
