//! Turn an image into low-color pixel art.
//!
//! The pipeline builds a palette (k-means in CIELAB, or a user hex list),
//! maps every pixel to its nearest palette color, and optionally reduces the
//! image to a coarse grid of dominant colors before scaling it back up with
//! nearest-neighbor.
//!
//! ```no_run
//! use pixelizer::{PixelizerOptions, RasterImage, process_image};
//!
//! let rgba = image::open("input.png").unwrap().to_rgba8();
//! let raster = RasterImage::try_from(rgba).unwrap();
//! let result = process_image(&raster, &PixelizerOptions::default()).unwrap();
//! println!("{:?}", result.palette.to_hex());
//! ```

use js_sys::{Array, Object, Reflect, Uint8Array};
use wasm_bindgen::prelude::*;

pub mod codec;
pub mod color;
pub mod downscale;
pub mod error;
pub mod kmeans;
pub mod palette_source;
pub mod pipeline;
pub mod quantize;
pub mod raster;
pub mod resize;

pub use codec::{decode_raster, encode_png, extract_palette_bytes, pixelate_bytes};
pub use color::{distance_squared, to_lab, to_rgb};
pub use downscale::{estimate_downscale_resolution, mode_downscale, select_dominant_pixel};
pub use error::{PixelizerError, Result};
pub use palette_source::{Palette, extract_palette, kmeans_palette, parse_custom_palette};
pub use pipeline::{PaletteMode, PixelizerOptions, PixelizerResult, process_image};
pub use quantize::apply_palette_quantization;
pub use raster::RasterImage;
pub use resize::resize_nearest_neighbor;

fn js_error(err: PixelizerError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn hex_array(palette: &Palette) -> Array {
    let out = Array::new();
    for hex in palette.to_hex() {
        out.push(&JsValue::from_str(&hex));
    }
    out
}

/// Convert an encoded image to low-color pixel art.
///
/// When `palette` (an array of hex strings) is given it is used as-is;
/// otherwise `n_colors` colors are clustered from `palette_source`, or from
/// the input itself when no source is given.
///
/// Returns `{ image: Uint8Array, palette: string[] }` where `image` is PNG data.
#[wasm_bindgen]
#[allow(clippy::too_many_arguments)]
pub fn pixelate(
    input: Vec<u8>,
    n_colors: usize,
    relative_scale: f32,
    should_pixelize: bool,
    weight_c: f32,
    output_size: Option<u32>,
    palette: Option<Array>,
    palette_source: Option<Vec<u8>>,
) -> std::result::Result<Object, JsValue> {
    let raster = decode_raster(&input).map_err(js_error)?;

    let mut options = PixelizerOptions {
        n_colors,
        should_pixelize,
        relative_scale,
        weight_c,
        output_size,
        ..PixelizerOptions::default()
    };

    if let Some(js_palette) = palette {
        let mut tokens = Vec::new();
        for val in js_palette.iter() {
            let s = val
                .as_string()
                .ok_or_else(|| JsValue::from_str("Palette values must be strings"))?;
            tokens.push(s);
        }
        options.palette_mode = PaletteMode::Custom;
        options.custom_palette_spec = tokens.join(",");
    } else if let Some(bytes) = palette_source {
        options.fix_palette_source = Some(decode_raster(&bytes).map_err(js_error)?);
    }

    let result = process_image(&raster, &options).map_err(js_error)?;
    let encoded = encode_png(&result.final_image).map_err(js_error)?;

    let out = Object::new();
    Reflect::set(&out, &JsValue::from_str("image"), &Uint8Array::from(encoded.as_slice()))?;
    Reflect::set(&out, &JsValue::from_str("palette"), &hex_array(&result.palette))?;
    Ok(out)
}

/// Extract a k-means palette from an encoded image as an array of hex strings.
///
/// `downscale` shrinks the image (longest side) before clustering.
#[wasm_bindgen]
pub fn extract_palette_hex(
    input: Vec<u8>,
    n_colors: usize,
    downscale: Option<u32>,
) -> std::result::Result<Array, JsValue> {
    let raster = decode_raster(&input).map_err(js_error)?;
    let palette = extract_palette(&raster, n_colors, downscale).map_err(js_error)?;
    Ok(hex_array(&palette))
}
