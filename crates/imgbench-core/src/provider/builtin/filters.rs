use std::sync::Arc;

use ndarray::{Array2, Zip};

use super::gaussian_blur::gaussian_blur_plane;
use super::{arg_f32, from_unit_planes, unit_planes};
use crate::array::NdArray;
use crate::provider::{algorithm, Algorithm, AlgorithmError, CallContext, Module};
use crate::value::Value;

pub const MODULE: &str = "algorithms.filters";

pub fn module() -> Module {
    Module::new(MODULE)
        .with(gaussian_blur())
        .with(unsharp_mask())
        .with(gamma())
        .with(brightness_contrast())
}

/// Apply `f` to every channel plane in `[0, 1]` scale, keeping the input dtype.
fn per_plane<F>(image: &NdArray, ctx: &CallContext, f: F) -> Result<Value, AlgorithmError>
where
    F: Fn(&Array2<f32>) -> Array2<f32>,
{
    let mut out = Vec::new();
    for plane in unit_planes(image)? {
        ctx.check_cancelled()?;
        out.push(f(&plane));
    }
    from_unit_planes(out, image.dtype())
}

fn gaussian_blur() -> Arc<dyn Algorithm> {
    algorithm("gaussian_blur", &["sigma"], |image, args, ctx| {
        let sigma = arg_f32(args, 0, "sigma")?;
        per_plane(image, ctx, |plane| gaussian_blur_plane(plane, sigma))
    })
}

/// `radius` is the blur sigma of the mask, `amount` the fraction of the
/// difference added back, `threshold` the minimum difference that is sharpened.
fn unsharp_mask() -> Arc<dyn Algorithm> {
    algorithm(
        "unsharp_mask",
        &["radius", "amount", "threshold"],
        |image, args, ctx| {
            let radius = arg_f32(args, 0, "radius")?;
            let amount = arg_f32(args, 1, "amount")?;
            let threshold = arg_f32(args, 2, "threshold")?;
            per_plane(image, ctx, |plane| {
                unsharp_mask_plane(plane, radius, amount, threshold)
            })
        },
    )
}

pub fn unsharp_mask_plane(data: &Array2<f32>, radius: f32, amount: f32, threshold: f32) -> Array2<f32> {
    let blurred = gaussian_blur_plane(data, radius);
    Zip::from(data).and(&blurred).map_collect(|&orig, &blur| {
        let diff = orig - blur;
        if diff.abs() > threshold {
            (orig + diff * amount).clamp(0.0, 1.0)
        } else {
            orig
        }
    })
}

/// `output = input^(1/gamma)`; gamma above 1 brightens midtones.
fn gamma() -> Arc<dyn Algorithm> {
    algorithm("gamma", &["gamma"], |image, args, ctx| {
        let gamma = arg_f32(args, 0, "gamma")?;
        if gamma <= 0.0 || !gamma.is_finite() {
            return Err(AlgorithmError::invalid(format!(
                "gamma must be a positive number, got {gamma}"
            )));
        }
        let inv_gamma = 1.0 / gamma;
        per_plane(image, ctx, |plane| {
            plane.mapv(|v| v.clamp(0.0, 1.0).powf(inv_gamma))
        })
    })
}

/// `brightness` is added after `contrast` scales around mid-gray.
fn brightness_contrast() -> Arc<dyn Algorithm> {
    algorithm(
        "brightness_contrast",
        &["brightness", "contrast"],
        |image, args, ctx| {
            let brightness = arg_f32(args, 0, "brightness")?;
            let contrast = arg_f32(args, 1, "contrast")?;
            per_plane(image, ctx, |plane| {
                plane.mapv(|v| ((v - 0.5) * contrast + 0.5 + brightness).clamp(0.0, 1.0))
            })
        },
    )
}
