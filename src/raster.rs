use image::RgbaImage;

use crate::error::{PixelizerError, Result};

/// Largest raster any stage will allocate, in pixels (16384 x 16384).
pub const MAX_PIXELS: u64 = 1 << 28;

/// Reject a `width x height` buffer that is empty or larger than [`MAX_PIXELS`].
pub(crate) fn check_dimensions(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(PixelizerError::InvalidDimensions(format!(
            "image must be at least 1x1, got {width}x{height}"
        )));
    }
    if u64::from(width) * u64::from(height) > MAX_PIXELS {
        return Err(PixelizerError::InvalidDimensions(format!(
            "{width}x{height} exceeds the limit of {MAX_PIXELS} pixels"
        )));
    }
    Ok(())
}

/// An owned, straight (non-premultiplied) RGBA8 raster in row-major order.
///
/// Every transform in this crate takes a raster by reference and returns a
/// new one; nothing is modified in place.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl RasterImage {
    /// Wrap a raw RGBA buffer, checking that it holds exactly `width * height` pixels.
    pub fn from_raw(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        check_dimensions(width, height)?;
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(PixelizerError::InvalidDimensions(format!(
                "{width}x{height} image needs {expected} bytes, got {}",
                pixels.len()
            )));
        }
        Ok(Self { width, height, pixels })
    }

    /// Build a raster from a pixel list that is already known to match the dimensions.
    pub(crate) fn from_pixels(width: u32, height: u32, pixels: Vec<[u8; 4]>) -> Self {
        debug_assert_eq!(pixels.len(), width as usize * height as usize);
        Self {
            width,
            height,
            pixels: pixels.into_iter().flatten().collect(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn as_raw(&self) -> &[u8] {
        &self.pixels
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.pixels
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// The pixel at `(x, y)`.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.pixels[idx],
            self.pixels[idx + 1],
            self.pixels[idx + 2],
            self.pixels[idx + 3],
        ]
    }

    /// Iterate over pixels in raster order.
    pub fn pixels(&self) -> impl Iterator<Item = [u8; 4]> + '_ {
        self.pixels
            .chunks_exact(4)
            .map(|chunk| [chunk[0], chunk[1], chunk[2], chunk[3]])
    }

    pub fn into_rgba_image(self) -> RgbaImage {
        // Length was validated on construction.
        let (width, height) = (self.width, self.height);
        match RgbaImage::from_raw(width, height, self.pixels) {
            Some(img) => img,
            None => unreachable!("raster buffer length matches {width}x{height}"),
        }
    }
}

impl TryFrom<RgbaImage> for RasterImage {
    type Error = PixelizerError;

    fn try_from(img: RgbaImage) -> Result<Self> {
        let (width, height) = img.dimensions();
        Self::from_raw(width, height, img.into_raw())
    }
}
