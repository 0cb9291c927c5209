//! Dominant-color downscaling.
//!
//! The reduction is separable: a vertical pass collapses each column's row
//! bands, then a horizontal pass collapses each row's column bands of the
//! intermediate image. Each band keeps a small first-seen tally of exact
//! RGBA values and picks one via [`select_dominant_pixel`].

use std::ops::Range;

use crate::error::Result;
use crate::pipeline::validate_color_count;
use crate::raster::{RasterImage, check_dimensions};

/// Scores closer than this are treated as equal.
const SCORE_EPSILON: f32 = 1e-6;

/// Number of pixel blocks the longest side of a `width x height` image should be reduced to.
///
/// Larger `relative_scale` values give fewer, bigger blocks. Never returns less than 1.
pub fn estimate_downscale_resolution(width: u32, height: u32, relative_scale: f32) -> u32 {
    let longest = f64::from(width.max(height));
    let target = longest * (2.0 / (longest * f64::from(relative_scale) * 0.5).sqrt());
    target.round().max(1.0) as u32
}

#[inline]
fn luminance(px: &[u8; 4]) -> f32 {
    0.2126 * f32::from(px[0]) + 0.7152 * f32::from(px[1]) + 0.0722 * f32::from(px[2])
}

/// Pick the representative color of a band from its distinct colors and their counts.
///
/// Each candidate scores `count * (1 + weight_c * (1 - lum / 255))`; the highest
/// score wins and near-equal scores go to the darker color. No candidates
/// gives transparent black.
pub fn select_dominant_pixel(colors: &[[u8; 4]], counts: &[u32], weight_c: f32) -> [u8; 4] {
    let mut best: Option<[u8; 4]> = None;
    let mut best_score = f32::NEG_INFINITY;
    let mut best_lum = f32::INFINITY;

    for (color, &count) in colors.iter().zip(counts) {
        let lum = luminance(color);
        let score = count as f32 * (1.0 + weight_c * (1.0 - lum / 255.0));

        if (score - best_score).abs() < SCORE_EPSILON {
            if lum < best_lum {
                best = Some(*color);
                best_lum = lum;
            }
        } else if score > best_score {
            best = Some(*color);
            best_score = score;
            best_lum = lum;
        }
    }

    best.unwrap_or([0; 4])
}

/// First-seen tally of up to `capacity` distinct colors.
///
/// Colors arriving after the tally is full are ignored, not counted.
struct ColorTally {
    colors: Vec<[u8; 4]>,
    counts: Vec<u32>,
    capacity: usize,
}

impl ColorTally {
    fn new(capacity: usize) -> Self {
        Self {
            colors: Vec::with_capacity(capacity),
            counts: Vec::with_capacity(capacity),
            capacity,
        }
    }

    fn clear(&mut self) {
        self.colors.clear();
        self.counts.clear();
    }

    fn add(&mut self, px: [u8; 4]) {
        match self.colors.iter().position(|c| *c == px) {
            Some(i) => self.counts[i] += 1,
            None if self.colors.len() < self.capacity => {
                self.colors.push(px);
                self.counts.push(1);
            }
            None => {}
        }
    }

    fn dominant(&self, weight_c: f32) -> [u8; 4] {
        select_dominant_pixel(&self.colors, &self.counts, weight_c)
    }
}

/// Source indices covered by output index `i` when `scale` source pixels map to one output pixel.
#[inline]
fn band(i: u32, scale: f64, limit: u32) -> Range<u32> {
    let start = (f64::from(i) * scale).floor() as u32;
    let end = ((f64::from(i + 1) * scale).ceil() as u32).min(limit);
    start..end
}

/// Reduce `image` to `out_w x out_h`, keeping the dominant color of each band.
///
/// At most `n_colors` distinct colors are tracked per band; `n_colors` must be
/// in `1..=MAX_CLUSTERS`. The output and the intermediate `in_w x out_h`
/// raster must fit in [`MAX_PIXELS`](crate::raster::MAX_PIXELS). Returns a copy
/// of the input when the size is unchanged.
pub fn mode_downscale(
    image: &RasterImage,
    out_w: u32,
    out_h: u32,
    n_colors: usize,
    weight_c: f32,
) -> Result<RasterImage> {
    check_dimensions(out_w, out_h)?;
    validate_color_count(n_colors)?;

    let (in_w, in_h) = image.dimensions();
    check_dimensions(in_w, out_h)?;
    if (out_w, out_h) == (in_w, in_h) {
        return Ok(image.clone());
    }

    let mut tally = ColorTally::new(n_colors);

    // Vertical pass: in_w x out_h
    let stride = in_w as usize;
    let mut vertical = vec![[0u8; 4]; stride * out_h as usize];
    let scale_y = f64::from(in_h) / f64::from(out_h);

    for x in 0..in_w {
        for y_out in 0..out_h {
            tally.clear();
            for y in band(y_out, scale_y, in_h) {
                tally.add(image.pixel(x, y));
            }
            vertical[y_out as usize * stride + x as usize] = tally.dominant(weight_c);
        }
    }

    // Horizontal pass: out_w x out_h
    let mut out = Vec::with_capacity(out_w as usize * out_h as usize);
    let scale_x = f64::from(in_w) / f64::from(out_w);

    for y_out in 0..out_h {
        let row = &vertical[y_out as usize * stride..(y_out as usize + 1) * stride];
        for x_out in 0..out_w {
            tally.clear();
            for x in band(x_out, scale_x, in_w) {
                tally.add(row[x as usize]);
            }
            out.push(tally.dominant(weight_c));
        }
    }

    Ok(RasterImage::from_pixels(out_w, out_h, out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PixelizerError;
    use crate::kmeans::MAX_CLUSTERS;

    const A: [u8; 4] = [200, 40, 40, 255];
    const B: [u8; 4] = [40, 200, 40, 255];
    const WHITE: [u8; 4] = [255, 255, 255, 255];
    const BLACK: [u8; 4] = [0, 0, 0, 255];

    #[test]
    fn estimate_matches_reference_points() {
        assert_eq!(estimate_downscale_resolution(512, 300, 1.0), 64);
        assert_eq!(estimate_downscale_resolution(300, 512, 4.0), 32);
        assert_eq!(estimate_downscale_resolution(1, 1, 100.0), 1);
    }

    #[test]
    fn smaller_relative_scale_is_finer() {
        let coarse = estimate_downscale_resolution(800, 600, 2.0);
        let fine = estimate_downscale_resolution(800, 600, 0.5);
        assert!(coarse < fine);
    }

    #[test]
    fn same_size_is_identity() {
        let img = RasterImage::from_pixels(2, 2, vec![A, B, WHITE, [1, 2, 3, 0]]);
        assert_eq!(mode_downscale(&img, 2, 2, 4, 0.5).unwrap(), img);
    }

    #[test]
    fn most_frequent_color_wins() {
        let img = RasterImage::from_pixels(1, 4, vec![A, A, A, B]);
        let out = mode_downscale(&img, 1, 1, 8, 0.0).unwrap();
        assert_eq!(out.pixels().collect::<Vec<_>>(), vec![A]);
    }

    #[test]
    fn equal_counts_prefer_darker() {
        let img = RasterImage::from_pixels(2, 1, vec![WHITE, BLACK]);
        let out = mode_downscale(&img, 1, 1, 8, 0.0).unwrap();
        assert_eq!(out.pixel(0, 0), BLACK);
    }

    #[test]
    fn weight_biases_towards_dark() {
        let colors = [WHITE, BLACK];
        let counts = [2, 1];
        assert_eq!(select_dominant_pixel(&colors, &counts, 0.0), WHITE);
        assert_eq!(select_dominant_pixel(&colors, &counts, 2.0), BLACK);
    }

    #[test]
    fn no_candidates_is_transparent() {
        assert_eq!(select_dominant_pixel(&[], &[], 1.0), [0, 0, 0, 0]);
    }

    #[test]
    fn tally_ignores_colors_past_capacity() {
        let img = RasterImage::from_pixels(1, 3, vec![A, B, B]);
        let out = mode_downscale(&img, 1, 1, 1, 0.0).unwrap();
        assert_eq!(out.pixel(0, 0), A);
    }

    #[test]
    fn alpha_is_part_of_color_identity() {
        let faded = [A[0], A[1], A[2], 10];
        let img = RasterImage::from_pixels(1, 3, vec![faded, A, faded]);
        let out = mode_downscale(&img, 1, 1, 4, 0.0).unwrap();
        assert_eq!(out.pixel(0, 0), faded);
    }

    #[test]
    fn vertical_pass_runs_first() {
        // Columns reduce to [A, B] first, then the row tie goes to the darker one.
        let img = RasterImage::from_pixels(2, 3, vec![A, B, A, B, WHITE, WHITE]);
        let out = mode_downscale(&img, 1, 1, 8, 0.0).unwrap();
        let darker = if luminance(&A) < luminance(&B) { A } else { B };
        assert_eq!(out.pixel(0, 0), darker);
    }

    #[test]
    fn bands_overlap_on_fractional_scale() {
        assert_eq!(band(0, 1.5, 3), 0..2);
        assert_eq!(band(1, 1.5, 3), 1..3);
    }

    #[test]
    fn output_has_requested_size() {
        let pixels = (0..60u8).map(|i| [i, i, i, 255]).collect();
        let img = RasterImage::from_pixels(10, 6, pixels);
        let out = mode_downscale(&img, 3, 2, 16, 0.3).unwrap();
        assert_eq!(out.dimensions(), (3, 2));
    }

    #[test]
    fn rejects_zero_target() {
        let img = RasterImage::from_pixels(1, 1, vec![A]);
        assert!(mode_downscale(&img, 0, 1, 4, 0.0).is_err());
        assert!(mode_downscale(&img, 2, 2, 0, 0.0).is_err());
    }

    #[test]
    fn rejects_out_of_range_color_counts() {
        let img = RasterImage::from_pixels(1, 2, vec![A, B]);
        for n_colors in [MAX_CLUSTERS + 1, usize::MAX] {
            assert!(matches!(
                mode_downscale(&img, 1, 1, n_colors, 0.0),
                Err(PixelizerError::InvalidDimensions(_))
            ));
        }
        assert!(mode_downscale(&img, 1, 1, MAX_CLUSTERS, 0.0).is_ok());
    }

    #[test]
    fn rejects_oversized_target() {
        let img = RasterImage::from_pixels(10, 10, vec![A; 100]);
        assert!(matches!(
            mode_downscale(&img, 10, u32::MAX, 4, 0.0),
            Err(PixelizerError::InvalidDimensions(_))
        ));
    }
}
