//! Encoded-image adapters around the raster pipeline.

use std::io::Cursor;

use image::ImageFormat;

use crate::error::Result;
use crate::palette_source::{Palette, extract_palette};
use crate::pipeline::{PixelizerOptions, process_image};
use crate::raster::RasterImage;

/// Decode any supported image format into straight RGBA8.
pub fn decode_raster(bytes: &[u8]) -> Result<RasterImage> {
    let img = image::load_from_memory(bytes)?;
    RasterImage::try_from(img.to_rgba8())
}

/// Encode a raster as PNG.
pub fn encode_png(raster: &RasterImage) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    raster
        .clone()
        .into_rgba_image()
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
    Ok(buf)
}

/// Decode `input`, run [`process_image`] and return the PNG-encoded result with its palette.
pub fn pixelate_bytes(input: &[u8], options: &PixelizerOptions) -> Result<(Vec<u8>, Palette)> {
    let raster = decode_raster(input)?;
    let result = process_image(&raster, options)?;
    Ok((encode_png(&result.final_image)?, result.palette))
}

/// Decode `input` and return its k-means palette as hex strings.
pub fn extract_palette_bytes(
    input: &[u8],
    n_colors: usize,
    downscale: Option<u32>,
) -> Result<Vec<String>> {
    let raster = decode_raster(input)?;
    Ok(extract_palette(&raster, n_colors, downscale)?.to_hex())
}
