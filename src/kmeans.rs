//! Deterministic k-means over CIELAB points.
//!
//! Starting centroids are picked at an even stride from the distinct input
//! points sorted by lightness, so repeated runs on the same data always give
//! the same palette.

use std::collections::HashSet;

use palette::Lab;
use tracing::trace;

use crate::color::{distance_squared, nearest_index};

/// Iteration cap used by the palette builder.
pub const DEFAULT_MAX_ITERATIONS: usize = 20;

/// A centroid that moves by at most this squared distance is considered settled.
pub const CONVERGENCE_THRESHOLD: f32 = 1e-4;

/// Assignments are stored as `u8`, which bounds the number of clusters.
pub const MAX_CLUSTERS: usize = u8::MAX as usize + 1;

/// Bit pattern of a point, with `-0.0` folded into `0.0`.
fn point_key(p: &Lab) -> [u32; 3] {
    [(p.l + 0.0).to_bits(), (p.a + 0.0).to_bits(), (p.b + 0.0).to_bits()]
}

/// Choose the starting centroids.
///
/// Distinct points keep their first-seen order before a stable sort by `L`.
/// If there are no more distinct points than `k`, every one of them is used.
fn initial_centroids(points: &[Lab], k: usize) -> Vec<Lab> {
    let mut seen = HashSet::with_capacity(points.len());
    let mut distinct: Vec<Lab> = points
        .iter()
        .filter(|p| seen.insert(point_key(p)))
        .copied()
        .collect();

    distinct.sort_by(|a, b| a.l.total_cmp(&b.l));

    if distinct.len() <= k {
        return distinct;
    }

    let stride = distinct.len() / k;
    (0..k).map(|i| distinct[i * stride]).collect()
}

/// Move every centroid to the mean of its assigned points.
///
/// Returns `true` when no centroid moved by more than [`CONVERGENCE_THRESHOLD`].
fn update_centroids(points: &[Lab], assignment: &[u8], centroids: &mut [Lab]) -> bool {
    let mut sums = vec![[0.0f64; 3]; centroids.len()];
    let mut counts = vec![0u32; centroids.len()];
    for (point, &cluster) in points.iter().zip(assignment) {
        let i = usize::from(cluster);
        sums[i][0] += f64::from(point.l);
        sums[i][1] += f64::from(point.a);
        sums[i][2] += f64::from(point.b);
        counts[i] += 1;
    }

    let mut converged = true;
    for ((centroid, sum), &count) in centroids.iter_mut().zip(&sums).zip(&counts) {
        if count == 0 {
            continue;
        }
        let n = f64::from(count);
        let updated = Lab::new((sum[0] / n) as f32, (sum[1] / n) as f32, (sum[2] / n) as f32);
        if distance_squared(centroid, &updated) > CONVERGENCE_THRESHOLD {
            converged = false;
        }
        *centroid = updated;
    }
    converged
}

/// Run k-means on `points`, returning the final centroids in initialization order.
///
/// Fewer than `k` centroids come back when the input has fewer than `k`
/// distinct points; an empty input gives an empty result. `k` is capped at
/// [`MAX_CLUSTERS`]. A centroid that loses all its points keeps its previous
/// position.
pub fn run(points: &[Lab], k: usize, max_iterations: usize) -> Vec<Lab> {
    let k = k.min(MAX_CLUSTERS);
    if points.is_empty() || k == 0 {
        return Vec::new();
    }

    let mut centroids = initial_centroids(points, k);
    let mut assignment = vec![0u8; points.len()];

    for iteration in 0..max_iterations {
        for (slot, point) in assignment.iter_mut().zip(points) {
            // centroids.len() <= MAX_CLUSTERS, so the index fits in a u8
            *slot = nearest_index(&centroids, point) as u8;
        }

        if update_centroids(points, &assignment, &mut centroids) {
            trace!(iterations = iteration + 1, "k-means converged");
            return centroids;
        }
    }

    trace!(iterations = max_iterations, "k-means stopped at iteration cap");
    centroids
}
