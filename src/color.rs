//! sRGB <-> CIELAB conversion and perceptual distance.
//!
//! The transform uses the D65 reference white `(0.95047, 1.0, 1.08883)` and
//! the classic `0.008856` / `7.787` piecewise constants, so results are
//! reproducible independently of any color-management library.

use kmeans_colors::Calculate;
use palette::{Lab, Srgb};

const WHITE_X: f32 = 0.95047;
const WHITE_Y: f32 = 1.0;
const WHITE_Z: f32 = 1.08883;

const LAB_EPSILON: f32 = 0.008856;
const LAB_SLOPE: f32 = 7.787;
const LAB_OFFSET: f32 = 16.0 / 116.0;

#[inline]
fn srgb_to_linear(c: u8) -> f32 {
    let c = f32::from(c) / 255.0;
    if c > 0.04045 {
        ((c + 0.055) / 1.055).powf(2.4)
    } else {
        c / 12.92
    }
}

#[inline]
fn linear_to_srgb(c: f32) -> u8 {
    let v = if c > 0.0031308 {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    } else {
        12.92 * c
    };
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

#[inline]
fn lab_f(t: f32) -> f32 {
    if t > LAB_EPSILON {
        t.cbrt()
    } else {
        LAB_SLOPE * t + LAB_OFFSET
    }
}

#[inline]
fn lab_f_inv(t: f32) -> f32 {
    let t3 = t * t * t;
    if t3 > LAB_EPSILON {
        t3
    } else {
        (t - LAB_OFFSET) / LAB_SLOPE
    }
}

/// Convert an 8-bit sRGB color to CIELAB.
pub fn to_lab(rgb: Srgb<u8>) -> Lab {
    let r = srgb_to_linear(rgb.red);
    let g = srgb_to_linear(rgb.green);
    let b = srgb_to_linear(rgb.blue);

    let x = (r * 0.4124 + g * 0.3576 + b * 0.1805) / WHITE_X;
    let y = (r * 0.2126 + g * 0.7152 + b * 0.0722) / WHITE_Y;
    let z = (r * 0.0193 + g * 0.1192 + b * 0.9505) / WHITE_Z;

    let (fx, fy, fz) = (lab_f(x), lab_f(y), lab_f(z));

    Lab::new(116.0 * fy - 16.0, 500.0 * (fx - fy), 200.0 * (fy - fz))
}

/// Convert a CIELAB color back to 8-bit sRGB, clamping out-of-gamut channels.
pub fn to_rgb(lab: Lab) -> Srgb<u8> {
    let fy = (lab.l + 16.0) / 116.0;
    let fx = lab.a / 500.0 + fy;
    let fz = fy - lab.b / 200.0;

    let x = lab_f_inv(fx) * WHITE_X;
    let y = lab_f_inv(fy) * WHITE_Y;
    let z = lab_f_inv(fz) * WHITE_Z;

    let r = x * 3.2406 + y * -1.5372 + z * -0.4986;
    let g = x * -0.9689 + y * 1.8758 + z * 0.0415;
    let b = x * 0.0557 + y * -0.2040 + z * 1.0570;

    Srgb::new(linear_to_srgb(r), linear_to_srgb(g), linear_to_srgb(b))
}

/// Squared euclidean distance between two CIELAB colors.
///
/// All nearest-color comparisons in the crate use this value directly; the
/// square root is never taken.
#[inline]
pub fn distance_squared(a: &Lab, b: &Lab) -> f32 {
    Lab::difference(a, b)
}

/// Index of the candidate closest to `target`; the first of several equal minima wins.
///
/// Returns 0 for an empty candidate list.
pub fn nearest_index(candidates: &[Lab], target: &Lab) -> usize {
    let mut best_idx = 0;
    let mut best_dist = f32::INFINITY;
    for (idx, c) in candidates.iter().enumerate() {
        let dist = distance_squared(target, c);
        if dist < best_dist {
            best_dist = dist;
            best_idx = idx;
        }
    }
    best_idx
}
