//! Palette construction: parsed from a hex list or clustered from an image.

use palette::{Lab, Srgb};
use tracing::debug;

use crate::color::{to_lab, to_rgb};
use crate::error::{PixelizerError, Result};
use crate::kmeans;
use crate::raster::RasterImage;
use crate::resize::{resize_nearest_neighbor, scaled_dimensions};

/// Upper bound on the number of pixels fed to k-means.
pub const MAX_SAMPLES: usize = 5000;

/// An ordered, immutable list of colors.
///
/// Duplicates are allowed; order follows the hex list or the cluster
/// initialization order.
#[derive(Clone, Debug, PartialEq)]
pub struct Palette(Vec<Srgb<u8>>);

impl Palette {
    pub fn new(colors: Vec<Srgb<u8>>) -> Self {
        Self(colors)
    }

    pub fn colors(&self) -> &[Srgb<u8>] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Srgb<u8>> + Clone {
        self.0.iter()
    }

    /// Uppercase `RRGGBB` strings, in palette order.
    pub fn to_hex(&self) -> Vec<String> {
        self.0
            .iter()
            .map(|c| format!("{:02X}{:02X}{:02X}", c.red, c.green, c.blue))
            .collect()
    }
}

impl From<Vec<Srgb<u8>>> for Palette {
    fn from(colors: Vec<Srgb<u8>>) -> Self {
        Self(colors)
    }
}

fn parse_hex_color(token: &str) -> Result<Srgb<u8>> {
    let hex = token.strip_prefix('#').unwrap_or(token);
    if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(PixelizerError::InvalidPaletteSpec(token.to_owned()));
    }
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&hex[range], 16)
            .map_err(|_| PixelizerError::InvalidPaletteSpec(token.to_owned()))
    };
    Ok(Srgb::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

/// Parse a comma-separated list of 6-digit hex colors, e.g. `"#FF0000, 00ff00"`.
///
/// Tokens are trimmed and may carry a leading `#`; empty tokens are skipped.
/// Any other malformed token rejects the whole list.
pub fn parse_custom_palette(spec: &str) -> Result<Palette> {
    spec.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(parse_hex_color)
        .collect::<Result<Vec<_>>>()
        .map(Palette)
}

/// Sample up to [`MAX_SAMPLES`] non-transparent pixels in raster order and convert them to CIELAB.
pub fn sample_lab_pixels(image: &RasterImage) -> Vec<Lab> {
    let stride = (image.pixel_count() / MAX_SAMPLES).max(1);
    image
        .pixels()
        .step_by(stride)
        .filter(|px| px[3] != 0)
        .take(MAX_SAMPLES)
        .map(|[r, g, b, _]| to_lab(Srgb::new(r, g, b)))
        .collect()
}

/// Cluster a sample of `source` into at most `n_colors` colors.
pub fn kmeans_palette(source: &RasterImage, n_colors: usize) -> Result<Palette> {
    let samples = sample_lab_pixels(source);
    if samples.is_empty() {
        return Err(PixelizerError::EmptyPaletteSource);
    }

    let centroids = kmeans::run(&samples, n_colors, kmeans::DEFAULT_MAX_ITERATIONS);
    debug!(samples = samples.len(), colors = centroids.len(), "clustered palette");

    Ok(Palette(centroids.into_iter().map(to_rgb).collect()))
}

/// Derive a k-means palette without quantizing anything.
///
/// When `downscale` is set the image is first shrunk with nearest-neighbor
/// so that its longest side is `downscale` pixels.
pub fn extract_palette(
    image: &RasterImage,
    n_colors: usize,
    downscale: Option<u32>,
) -> Result<Palette> {
    crate::pipeline::validate_color_count(n_colors)?;
    match downscale {
        Some(size) => {
            let (w, h) = scaled_dimensions(image.width(), image.height(), size)?;
            kmeans_palette(&resize_nearest_neighbor(image, w, h)?, n_colors)
        }
        None => kmeans_palette(image, n_colors),
    }
}
