use ndarray::{Array2, Axis};
use rayon::prelude::*;

use crate::consts::PARALLEL_PIXEL_THRESHOLD;

/// Gaussian blur of one plane using two separable 1-D passes.
/// Borders are extended by clamping, so the kernel never reaches further
/// than the longer side of the plane.
pub fn gaussian_blur_plane(data: &Array2<f32>, sigma: f32) -> Array2<f32> {
    let (h, w) = data.dim();
    let kernel = make_gaussian_kernel(sigma, h.max(w));
    let row_pass = convolve_pass(data, &kernel, Axis(1));
    convolve_pass(&row_pass, &kernel, Axis(0))
}

/// Normalized 1-D Gaussian of radius `ceil(3 * sigma)`, capped at
/// `max_radius`. Non-positive sigma yields the identity kernel.
pub fn make_gaussian_kernel(sigma: f32, max_radius: usize) -> Vec<f32> {
    if sigma.is_nan() || sigma <= 0.0 || sigma.is_infinite() {
        return vec![1.0];
    }
    let radius = ((sigma * 3.0).ceil() as usize).min(max_radius);
    let size = 2 * radius + 1;
    let mut kernel = vec![0.0f32; size];
    let s2 = 2.0 * sigma * sigma;
    let mut sum = 0.0f32;

    for (i, k) in kernel.iter_mut().enumerate() {
        let x = i as f32 - radius as f32;
        *k = (-x * x / s2).exp();
        sum += *k;
    }

    for v in &mut kernel {
        *v /= sum;
    }

    kernel
}

/// Convolve every line along `axis` with `kernel`.
fn convolve_pass(data: &Array2<f32>, kernel: &[f32], axis: Axis) -> Array2<f32> {
    let (h, w) = data.dim();
    let radius = kernel.len() / 2;
    let mut result = Array2::<f32>::zeros((h, w));

    let sample = |row: usize, col: usize| -> f32 {
        kernel
            .iter()
            .enumerate()
            .map(|(ki, &kv)| {
                let offset = ki as isize - radius as isize;
                let value = if axis == Axis(1) {
                    let src = (col as isize + offset).clamp(0, w as isize - 1) as usize;
                    data[[row, src]]
                } else {
                    let src = (row as isize + offset).clamp(0, h as isize - 1) as usize;
                    data[[src, col]]
                };
                value * kv
            })
            .sum()
    };

    if h * w >= PARALLEL_PIXEL_THRESHOLD {
        result
            .axis_iter_mut(Axis(0))
            .into_par_iter()
            .enumerate()
            .for_each(|(row, mut out)| {
                for (col, v) in out.iter_mut().enumerate() {
                    *v = sample(row, col);
                }
            });
    } else {
        for (row, mut out) in result.axis_iter_mut(Axis(0)).enumerate() {
            for (col, v) in out.iter_mut().enumerate() {
                *v = sample(row, col);
            }
        }
    }

    result
}
