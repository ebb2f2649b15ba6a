use std::sync::Arc;

use ndarray::{Array2, ArrayView1, Zip};
use num_complex::Complex;
use rustfft::FftPlanner;
use tracing::debug;

use super::{arg_count, arg_f32, arg_matrix, normalize_min_max, unit_luminance};
use crate::array::NdArray;
use crate::consts::EPSILON;
use crate::provider::{algorithm, Algorithm, AlgorithmError, CallContext, Module};
use crate::value::Value;

pub const MODULE: &str = "algorithms.deconvolution";

/// Both methods return a gray `float64` image scaled to `0..=255`.
const OUTPUT_SCALE: f64 = 255.0;

pub fn module() -> Module {
    Module::new(MODULE).with(wiener()).with(richardson_lucy())
}

fn wiener() -> Arc<dyn Algorithm> {
    algorithm("wiener", &["kernel", "K"], |image, args, _ctx| {
        let kernel = arg_matrix(args, 0, "kernel")?;
        let k = arg_f32(args, 1, "K")? as f64;
        let observed = prepare(image)?;
        let psf = padded_psf(&kernel, observed.dim(), false)?;
        let restored = wiener_filter(&observed, &psf, k);
        Ok(to_output(restored.mapv(|c| c.norm())))
    })
}

fn richardson_lucy() -> Arc<dyn Algorithm> {
    algorithm(
        "richardson_lucy",
        &["kernel", "iterations"],
        |image, args, ctx| {
            let kernel = arg_matrix(args, 0, "kernel")?;
            let iterations = arg_count(args, 1, "iterations")?;
            let observed = prepare(image)?;
            let psf = padded_psf(&kernel, observed.dim(), true)?;
            let estimate = richardson_lucy_fft(&observed, &psf, iterations, ctx)?;
            Ok(to_output(estimate.mapv(f64::from)))
        },
    )
}

/// Gray image stretched onto `[0, 1]`.
fn prepare(image: &NdArray) -> Result<Array2<f32>, AlgorithmError> {
    Ok(normalize_min_max(&unit_luminance(image)?))
}

fn to_output(data: Array2<f64>) -> Value {
    Value::Array(NdArray::F64(data.mapv(|v| v * OUTPUT_SCALE).into_dyn()))
}

/// Normalize `kernel` to unit sum and zero-pad it to `(h, w)` at the top-left
/// corner. With `centered`, the kernel center is rolled to the origin so the
/// filter does not shift the image.
fn padded_psf(
    kernel: &Array2<f64>,
    (h, w): (usize, usize),
    centered: bool,
) -> Result<Array2<f32>, AlgorithmError> {
    let (kh, kw) = kernel.dim();
    if kh == 0 || kw == 0 {
        return Err(AlgorithmError::invalid("Kernel is empty."));
    }
    if kh > h || kw > w {
        return Err(AlgorithmError::invalid(format!(
            "Kernel of shape ({kh}, {kw}) is larger than the image ({h}, {w})."
        )));
    }
    let sum: f64 = kernel.sum();
    if sum.abs() < EPSILON as f64 {
        return Err(AlgorithmError::invalid("Kernel values sum to zero."));
    }

    let (dy, dx) = if centered { (kh / 2, kw / 2) } else { (0, 0) };
    let mut psf = Array2::<f32>::zeros((h, w));
    for ((r, c), &v) in kernel.indexed_iter() {
        let row = (r + h - dy) % h;
        let col = (c + w - dx) % w;
        psf[[row, col]] = (v / sum) as f32;
    }
    Ok(psf)
}

// ---------------------------------------------------------------------------
// FFT utilities
// ---------------------------------------------------------------------------

fn fft2d(data: &Array2<f32>) -> Array2<Complex<f64>> {
    let (h, w) = data.dim();
    let mut planner = FftPlanner::new();
    let fft_row = planner.plan_fft_forward(w);
    let fft_col = planner.plan_fft_forward(h);

    let mut result = data.mapv(|v| Complex::new(v as f64, 0.0));

    for mut row in result.rows_mut() {
        let mut buf: Vec<Complex<f64>> = row.to_vec();
        fft_row.process(&mut buf);
        row.assign(&ArrayView1::from(buf.as_slice()));
    }

    for mut col in result.columns_mut() {
        let mut buf: Vec<Complex<f64>> = col.to_vec();
        fft_col.process(&mut buf);
        col.assign(&ArrayView1::from(buf.as_slice()));
    }

    result
}

/// Inverse 2-D FFT, normalized by `1 / (h * w)`.
fn ifft2d(data: &Array2<Complex<f64>>) -> Array2<Complex<f64>> {
    let (h, w) = data.dim();
    let mut planner = FftPlanner::new();
    let ifft_row = planner.plan_fft_inverse(w);
    let ifft_col = planner.plan_fft_inverse(h);

    let mut work = data.clone();

    for mut col in work.columns_mut() {
        let mut buf: Vec<Complex<f64>> = col.to_vec();
        ifft_col.process(&mut buf);
        col.assign(&ArrayView1::from(buf.as_slice()));
    }

    for mut row in work.rows_mut() {
        let mut buf: Vec<Complex<f64>> = row.to_vec();
        ifft_row.process(&mut buf);
        row.assign(&ArrayView1::from(buf.as_slice()));
    }

    let scale = 1.0 / (h * w) as f64;
    work.mapv_inplace(|v| v * scale);
    work
}

// ---------------------------------------------------------------------------
// Wiener filter
// ---------------------------------------------------------------------------

/// `F_restored = F_obs * conj(H) / (|H|^2 + K)`
fn wiener_filter(observed: &Array2<f32>, psf: &Array2<f32>, k: f64) -> Array2<Complex<f64>> {
    let f_obs = fft2d(observed);
    let h_fft = fft2d(psf);

    let f_restored = Zip::from(&f_obs)
        .and(&h_fft)
        .map_collect(|&obs, &h_val| obs * h_val.conj() / (h_val.norm_sqr() + k));

    ifft2d(&f_restored)
}

// ---------------------------------------------------------------------------
// Richardson-Lucy deconvolution
// ---------------------------------------------------------------------------

fn richardson_lucy_fft(
    observed: &Array2<f32>,
    psf: &Array2<f32>,
    iterations: usize,
    ctx: &CallContext,
) -> Result<Array2<f32>, AlgorithmError> {
    let h_fft = fft2d(psf);
    // Correlating with the PSF is multiplying by its conjugate spectrum.
    let h_conj = h_fft.mapv(|c| c.conj());

    let mut estimate = observed.clone();

    for iter in 0..iterations {
        ctx.check_cancelled()?;
        debug!(iteration = iter + 1, total = iterations, "Richardson-Lucy iteration");

        let blurred = ifft2d(&(fft2d(&estimate) * &h_fft));
        let ratio = Zip::from(observed)
            .and(&blurred)
            .map_collect(|&obs, &b| obs / (b.re as f32 + EPSILON));

        let correction = ifft2d(&(fft2d(&ratio) * &h_conj));
        Zip::from(&mut estimate)
            .and(&correction)
            .for_each(|e, c| *e *= c.re as f32);
    }

    estimate.mapv_inplace(|v| v.clamp(0.0, 1.0));
    Ok(estimate)
}
