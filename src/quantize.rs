use std::collections::HashMap;

use palette::{Lab, Srgb};

use crate::color::{nearest_index, to_lab};
use crate::palette_source::Palette;
use crate::raster::RasterImage;

/// Nearest palette color lookup, memoized per exact RGB triple.
///
/// One instance lives for a single quantization call.
struct NearestColor<'p> {
    colors: &'p [Srgb<u8>],
    lab: Vec<Lab>,
    memo: HashMap<u32, Srgb<u8>>,
}

impl<'p> NearestColor<'p> {
    fn new(palette: &'p Palette) -> Self {
        Self {
            colors: palette.colors(),
            lab: palette.iter().map(|&c| to_lab(c)).collect(),
            memo: HashMap::new(),
        }
    }

    fn lookup(&mut self, rgb: Srgb<u8>) -> Srgb<u8> {
        let key = u32::from_be_bytes([0, rgb.red, rgb.green, rgb.blue]);
        let (colors, lab) = (self.colors, &self.lab);
        *self
            .memo
            .entry(key)
            .or_insert_with(|| colors[nearest_index(lab, &to_lab(rgb))])
    }
}

/// Recolor every pixel with its nearest palette entry in CIELAB.
///
/// Alpha is carried over unchanged; fully transparent pixels become
/// `(0, 0, 0, 0)`. An empty palette leaves the color channels of visible
/// pixels as they are.
pub fn apply_palette_quantization(image: &RasterImage, palette: &Palette) -> RasterImage {
    let mut nearest = (!palette.is_empty()).then(|| NearestColor::new(palette));
    let pixels = image
        .pixels()
        .map(|px| match (px, nearest.as_mut()) {
            ([_, _, _, 0], _) => [0, 0, 0, 0],
            ([r, g, b, a], Some(nearest)) => {
                let c = nearest.lookup(Srgb::new(r, g, b));
                [c.red, c.green, c.blue, a]
            }
            (px, None) => px,
        })
        .collect();

    RasterImage::from_pixels(image.width(), image.height(), pixels)
}
