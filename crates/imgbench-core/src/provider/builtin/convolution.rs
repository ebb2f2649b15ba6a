use std::sync::Arc;

use ndarray::{array, Array2, Axis};
use rayon::prelude::*;

use super::arg_matrix;
use crate::array::NdArray;
use crate::consts::PARALLEL_PIXEL_THRESHOLD;
use crate::provider::{algorithm, Algorithm, AlgorithmError, CallContext, Module};
use crate::value::Value;

pub const MODULE: &str = "algorithms.convolution";

pub fn module() -> Module {
    Module::new(MODULE).with(sharpen()).with(convolve())
}

fn sharpen() -> Arc<dyn Algorithm> {
    algorithm("sharpen", &[], |image, _, ctx| {
        let kernel = array![[-1.0, -1.0, -1.0], [-1.0, 9.0, -1.0], [-1.0, -1.0, -1.0]];
        convolve_image(image, &kernel, ctx)
    })
}

fn convolve() -> Arc<dyn Algorithm> {
    algorithm("convolve", &["kernel"], |image, args, ctx| {
        let kernel = arg_matrix(args, 0, "kernel")?;
        convolve_image(image, &kernel, ctx)
    })
}

/// Correlate every channel of `image` with a square, odd-sized kernel in the
/// image's native value scale. Results saturate to the input dtype.
pub fn convolve_image(
    image: &NdArray,
    kernel: &Array2<f64>,
    ctx: &CallContext,
) -> Result<Value, AlgorithmError> {
    let (kh, kw) = kernel.dim();
    if kh != kw {
        return Err(AlgorithmError::invalid("Kernel is not a square matrix."));
    }
    if kh % 2 == 0 {
        return Err(AlgorithmError::invalid(
            "Invalid kernel, size should be an odd number.",
        ));
    }

    let planes = image.planes().ok_or_else(|| {
        AlgorithmError::invalid(format!(
            "expected an (m, n) or (m, n, c) image, got shape {}",
            image.shape_string()
        ))
    })?;

    let kernel = kernel.mapv(|v| v as f32);
    let mut out = Vec::with_capacity(planes.len());
    for plane in &planes {
        ctx.check_cancelled()?;
        out.push(correlate_plane(plane, &kernel));
    }

    NdArray::from_planes(&out, image.dtype())
        .map(Value::Array)
        .ok_or_else(|| AlgorithmError::invalid("image has no channels"))
}

/// Sliding-window sum of `data * kernel`, borders extended by clamping.
fn correlate_plane(data: &Array2<f32>, kernel: &Array2<f32>) -> Array2<f32> {
    let (h, w) = data.dim();
    let radius = (kernel.nrows() / 2) as isize;
    let mut result = Array2::<f32>::zeros((h, w));

    let sample = |row: usize, col: usize| -> f32 {
        let mut sum = 0.0f32;
        for ((ky, kx), &kv) in kernel.indexed_iter() {
            let sy = (row as isize + ky as isize - radius).clamp(0, h as isize - 1) as usize;
            let sx = (col as isize + kx as isize - radius).clamp(0, w as isize - 1) as usize;
            sum += data[[sy, sx]] * kv;
        }
        sum
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
        for ((row, col), v) in result.indexed_iter_mut() {
            *v = sample(row, col);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_kernel_preserves_image() {
        let image = NdArray::probe();
        let kernel = array![[0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 0.0]];
        let out = convolve_image(&image, &kernel, &CallContext::default()).unwrap();
        assert_eq!(out, Value::Array(image));
    }

    #[test]
    fn rejects_bad_kernels() {
        let image = NdArray::probe();
        let ctx = CallContext::default();

        let rect = Array2::<f64>::zeros((3, 5));
        let err = convolve_image(&image, &rect, &ctx).unwrap_err();
        assert_eq!(err.to_string(), "Kernel is not a square matrix.");

        let even = Array2::<f64>::zeros((4, 4));
        let err = convolve_image(&image, &even, &ctx).unwrap_err();
        assert_eq!(err.to_string(), "Invalid kernel, size should be an odd number.");
    }
}
