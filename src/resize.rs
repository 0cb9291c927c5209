use crate::error::{PixelizerError, Result};
use crate::raster::{RasterImage, check_dimensions};

/// Dimensions of `(width, height)` scaled so the longest side becomes `longest`.
///
/// Each side is rounded to the nearest integer and never drops below 1. The
/// result must fit in [`MAX_PIXELS`](crate::raster::MAX_PIXELS).
pub fn scaled_dimensions(width: u32, height: u32, longest: u32) -> Result<(u32, u32)> {
    if longest == 0 {
        return Err(PixelizerError::InvalidDimensions(
            "target size must be at least 1".to_owned(),
        ));
    }
    let ratio = f64::from(longest) / f64::from(width.max(height));
    let scale = |side: u32| (f64::from(side) * ratio).round().max(1.0) as u32;
    let (w, h) = (scale(width), scale(height));
    check_dimensions(w, h)?;
    Ok((w, h))
}

/// Nearest-neighbor resize to `new_w x new_h`.
///
/// Destination pixel `(x, y)` copies source pixel
/// `(floor(x * in_w / new_w), floor(y * in_h / new_h))` verbatim, alpha included.
pub fn resize_nearest_neighbor(image: &RasterImage, new_w: u32, new_h: u32) -> Result<RasterImage> {
    check_dimensions(new_w, new_h)?;
    let (in_w, in_h) = image.dimensions();

    let src_x: Vec<u32> = (0..new_w)
        .map(|x| (u64::from(x) * u64::from(in_w) / u64::from(new_w)) as u32)
        .collect();

    let mut out = Vec::with_capacity(new_w as usize * new_h as usize);
    for y in 0..new_h {
        let sy = (u64::from(y) * u64::from(in_h) / u64::from(new_h)) as u32;
        out.extend(src_x.iter().map(|&sx| image.pixel(sx, sy)));
    }

    Ok(RasterImage::from_pixels(new_w, new_h, out))
}
