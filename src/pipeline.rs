use tracing::{debug, instrument};

use crate::downscale::{estimate_downscale_resolution, mode_downscale};
use crate::error::{PixelizerError, Result};
use crate::kmeans::MAX_CLUSTERS;
use crate::palette_source::{Palette, kmeans_palette, parse_custom_palette};
use crate::quantize::apply_palette_quantization;
use crate::raster::RasterImage;
use crate::resize::{resize_nearest_neighbor, scaled_dimensions};

/// Where the palette comes from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PaletteMode {
    /// Cluster a sample of the image (or of `fix_palette_source`).
    #[default]
    KMeans,
    /// Parse `custom_palette_spec`.
    Custom,
}

/// Options for [`process_image`].
#[derive(Clone, Debug)]
pub struct PixelizerOptions {
    pub palette_mode: PaletteMode,
    /// Cluster count in k-means mode; also caps the colors tracked per downscale band.
    pub n_colors: usize,
    /// Run the downscale and resize stages.
    pub should_pixelize: bool,
    /// Controls the downscale resolution; see [`estimate_downscale_resolution`].
    pub relative_scale: f32,
    /// Darkness bias for dominant-color selection; `0.0` is a plain mode.
    pub weight_c: f32,
    /// Longest side of the final image. `None` restores the input size.
    pub output_size: Option<u32>,
    /// Separate image used only to derive a k-means palette.
    pub fix_palette_source: Option<RasterImage>,
    /// Comma-separated hex colors used in custom mode.
    pub custom_palette_spec: String,
}

impl Default for PixelizerOptions {
    fn default() -> Self {
        Self {
            palette_mode: PaletteMode::KMeans,
            n_colors: 8,
            should_pixelize: true,
            relative_scale: 1.0,
            weight_c: 0.0,
            output_size: None,
            fix_palette_source: None,
            custom_palette_spec: String::new(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct PixelizerResult {
    pub final_image: RasterImage,
    pub palette: Palette,
}

pub(crate) fn validate_color_count(n_colors: usize) -> Result<()> {
    if (1..=MAX_CLUSTERS).contains(&n_colors) {
        Ok(())
    } else {
        Err(PixelizerError::InvalidDimensions(format!(
            "color count must be between 1 and {MAX_CLUSTERS}, got {n_colors}"
        )))
    }
}

fn validate(options: &PixelizerOptions) -> Result<()> {
    validate_color_count(options.n_colors)?;
    if options.output_size == Some(0) {
        return Err(PixelizerError::InvalidDimensions(
            "output size must be at least 1".to_owned(),
        ));
    }
    if !(options.relative_scale.is_finite() && options.relative_scale > 0.0) {
        return Err(PixelizerError::InvalidDimensions(format!(
            "relative scale must be positive, got {}",
            options.relative_scale
        )));
    }
    if !options.weight_c.is_finite() {
        return Err(PixelizerError::InvalidDimensions(format!(
            "luminance weight must be finite, got {}",
            options.weight_c
        )));
    }
    Ok(())
}

fn build_palette(image: &RasterImage, options: &PixelizerOptions) -> Result<Palette> {
    match options.palette_mode {
        PaletteMode::Custom => {
            let palette = parse_custom_palette(&options.custom_palette_spec)?;
            if palette.is_empty() {
                return Err(PixelizerError::InvalidPaletteSpec(
                    options.custom_palette_spec.clone(),
                ));
            }
            Ok(palette)
        }
        PaletteMode::KMeans => {
            let source = options.fix_palette_source.as_ref().unwrap_or(image);
            kmeans_palette(source, options.n_colors)
        }
    }
}

/// Build a palette, quantize the image to it and optionally pixelize the result.
///
/// Pixelizing downscales to the size given by [`estimate_downscale_resolution`]
/// with [`mode_downscale`], then scales back up with nearest-neighbor, either
/// to `output_size` on the longest side or to the original dimensions. A
/// downscale or output size above [`MAX_PIXELS`](crate::raster::MAX_PIXELS)
/// fails with [`PixelizerError::InvalidDimensions`].
#[instrument(level = "debug", skip_all, fields(width = image.width(), height = image.height()))]
pub fn process_image(image: &RasterImage, options: &PixelizerOptions) -> Result<PixelizerResult> {
    validate(options)?;

    let palette = build_palette(image, options)?;
    debug!(mode = ?options.palette_mode, colors = palette.len(), "palette ready");

    let quantized = apply_palette_quantization(image, &palette);
    if !options.should_pixelize {
        return Ok(PixelizerResult { final_image: quantized, palette });
    }

    let (orig_w, orig_h) = image.dimensions();
    let target = estimate_downscale_resolution(orig_w, orig_h, options.relative_scale);
    let (down_w, down_h) = scaled_dimensions(orig_w, orig_h, target)?;
    debug!(down_w, down_h, "downscaling");
    let downscaled = mode_downscale(&quantized, down_w, down_h, options.n_colors, options.weight_c)?;

    let (final_w, final_h) = match options.output_size {
        Some(size) => scaled_dimensions(orig_w, orig_h, size)?,
        None => (orig_w, orig_h),
    };
    debug!(final_w, final_h, "upscaling");
    let final_image = resize_nearest_neighbor(&downscaled, final_w, final_h)?;

    Ok(PixelizerResult { final_image, palette })
}
