use palette::Srgb;
use pixelizer::{
    PaletteMode, PixelizerOptions, RasterImage, apply_palette_quantization, decode_raster,
    encode_png, extract_palette_bytes, kmeans, mode_downscale, parse_custom_palette,
    pixelate_bytes, process_image, resize_nearest_neighbor, to_lab,
};

fn raster(width: u32, height: u32, f: impl Fn(u32, u32) -> [u8; 4]) -> RasterImage {
    let mut raw = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            raw.extend_from_slice(&f(x, y));
        }
    }
    RasterImage::from_raw(width, height, raw).unwrap()
}

/// Diagonal gradient with a transparent corner.
fn gradient(width: u32, height: u32) -> RasterImage {
    raster(width, height, |x, y| {
        if x < 3 && y < 3 {
            [77, 77, 77, 0]
        } else {
            let r = (x * 255 / width) as u8;
            let g = (y * 255 / height) as u8;
            [r, g, 255 - r / 2, 128 + (x % 2) as u8 * 127]
        }
    })
}

#[test]
fn solid_red_with_custom_palette_is_unchanged() {
    let img = raster(10, 10, |_, _| [255, 0, 0, 255]);
    let options = PixelizerOptions {
        palette_mode: PaletteMode::Custom,
        custom_palette_spec: "FF0000".to_owned(),
        should_pixelize: false,
        ..PixelizerOptions::default()
    };
    let result = process_image(&img, &options).unwrap();
    assert_eq!(result.final_image, img);
    assert_eq!(result.palette.colors(), &[Srgb::new(255, 0, 0)]);
}

#[test]
fn every_visible_pixel_uses_the_palette() {
    let img = gradient(48, 32);
    let options = PixelizerOptions { n_colors: 6, relative_scale: 0.5, ..PixelizerOptions::default() };
    let result = process_image(&img, &options).unwrap();

    assert!(result.palette.len() <= 6);
    assert_eq!(result.final_image.dimensions(), (48, 32));
    for [r, g, b, a] in result.final_image.pixels() {
        if a > 0 {
            assert!(result.palette.colors().contains(&Srgb::new(r, g, b)));
        }
    }
}

#[test]
fn quantization_preserves_alpha_and_zeroes_transparent() {
    let img = gradient(20, 20);
    let palette = parse_custom_palette("000000,FFFFFF,FF0000,0000FF").unwrap();
    let out = apply_palette_quantization(&img, &palette);

    for (before, after) in img.pixels().zip(out.pixels()) {
        if before[3] == 0 {
            assert_eq!(after, [0, 0, 0, 0]);
        } else {
            assert_eq!(after[3], before[3]);
        }
    }
}

#[test]
fn quantizing_twice_is_stable() {
    let img = gradient(24, 24);
    let palette = parse_custom_palette("102030,F0E0D0,808080,20C040").unwrap();
    let once = apply_palette_quantization(&img, &palette);
    let twice = apply_palette_quantization(&once, &palette);
    assert_eq!(once, twice);
}

#[test]
fn kmeans_is_deterministic_on_images() {
    let img = gradient(64, 40);
    let points: Vec<_> = img
        .pixels()
        .filter(|px| px[3] > 0)
        .map(|[r, g, b, _]| to_lab(Srgb::new(r, g, b)))
        .collect();
    let a = kmeans::run(&points, 5, kmeans::DEFAULT_MAX_ITERATIONS);
    let b = kmeans::run(&points, 5, kmeans::DEFAULT_MAX_ITERATIONS);
    assert_eq!(a, b);

    let options = PixelizerOptions { n_colors: 5, ..PixelizerOptions::default() };
    let first = process_image(&img, &options).unwrap();
    let second = process_image(&img, &options).unwrap();
    assert_eq!(first.palette, second.palette);
    assert_eq!(first.final_image, second.final_image);
}

#[test]
fn dominant_color_of_a_column() {
    let a = [10, 20, 30, 255];
    let b = [200, 210, 220, 255];
    let img = RasterImage::from_raw(1, 4, [a, a, a, b].concat()).unwrap();
    let out = mode_downscale(&img, 1, 1, 8, 0.0).unwrap();
    assert_eq!(out.as_raw(), &a);
}

#[test]
fn nearest_neighbor_quadrants() {
    let (r, g, b, w) = ([255, 0, 0, 255], [0, 255, 0, 255], [0, 0, 255, 255], [255, 255, 255, 255]);
    let img = RasterImage::from_raw(2, 2, [r, g, b, w].concat()).unwrap();
    let out = resize_nearest_neighbor(&img, 4, 4).unwrap();
    let expected = raster(4, 4, |x, y| match (x / 2, y / 2) {
        (0, 0) => r,
        (1, 0) => g,
        (0, 1) => b,
        _ => w,
    });
    assert_eq!(out, expected);
}

#[test]
fn pixelized_output_is_blocky() {
    // 64x64 at relative scale 2 reduces to 16x16, so each block is 4x4 pixels.
    let img = gradient(64, 64);
    let options = PixelizerOptions { n_colors: 4, relative_scale: 2.0, ..PixelizerOptions::default() };
    let result = process_image(&img, &options).unwrap();
    let out = &result.final_image;
    for by in 0..16 {
        for bx in 0..16 {
            let first = out.pixel(bx * 4, by * 4);
            for dy in 0..4 {
                for dx in 0..4 {
                    assert_eq!(out.pixel(bx * 4 + dx, by * 4 + dy), first);
                }
            }
        }
    }
}

#[test]
fn encoded_pipeline_roundtrip() {
    let img = gradient(30, 20);
    let png = encode_png(&img).unwrap();
    assert_eq!(decode_raster(&png).unwrap(), img);

    let options = PixelizerOptions { output_size: Some(60), ..PixelizerOptions::default() };
    let (out_png, palette) = pixelate_bytes(&png, &options).unwrap();
    let out = decode_raster(&out_png).unwrap();
    assert_eq!(out.dimensions(), (60, 40));
    assert!(!palette.is_empty());

    let hex = extract_palette_bytes(&png, 3, Some(10)).unwrap();
    assert!(!hex.is_empty() && hex.len() <= 3);
    assert!(hex.iter().all(|h| h.len() == 6));
}
