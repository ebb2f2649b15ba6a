mod common;

use approx::assert_abs_diff_eq;
use imgbench_core::array::{DType, NdArray};
use imgbench_core::expr::evaluate;
use imgbench_core::provider::{
    builtin_registry, call_algorithm, AlgorithmProvider, CallContext, CallError, CancelToken,
    ResolveError,
};
use imgbench_core::value::Value;
use ndarray::{ArrayD, IxDyn};

use common::gray_u8;

const FILTERS: &str = "algorithms.filters";
const CONVOLUTION: &str = "algorithms.convolution";
const DECONVOLUTION: &str = "algorithms.deconvolution";

fn run(module: &str, method: &str, image: &NdArray, args: &[Value]) -> Result<NdArray, CallError> {
    let algorithm = builtin_registry().resolve(module, method).unwrap();
    let value = call_algorithm(algorithm.as_ref(), image, args, &CallContext::default())?;
    Ok(value.into_array().expect("algorithm returned a non-array"))
}

fn expr(source: &str) -> Value {
    evaluate(source).unwrap()
}

/// 32x32 gray image with a bright square in the middle.
fn square_image() -> NdArray {
    NdArray::U8(ArrayD::from_shape_fn(IxDyn(&[32, 32]), |idx| {
        if (12..20).contains(&idx[0]) && (12..20).contains(&idx[1]) {
            220
        } else {
            30
        }
    }))
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

#[test]
fn test_builtin_modules_resolve() {
    let registry = builtin_registry();
    for (module, method) in [
        (FILTERS, "gaussian_blur"),
        (FILTERS, "unsharp_mask"),
        (FILTERS, "gamma"),
        (FILTERS, "brightness_contrast"),
        (CONVOLUTION, "sharpen"),
        (CONVOLUTION, "convolve"),
        (DECONVOLUTION, "wiener"),
        (DECONVOLUTION, "richardson_lucy"),
    ] {
        let algorithm = registry.resolve(module, method).unwrap();
        assert_eq!(algorithm.signature().name, method);
    }
}

#[test]
fn test_resolve_errors() {
    let registry = builtin_registry();
    assert_eq!(
        registry.resolve("algorithms.nope", "x").err().unwrap(),
        ResolveError::ModuleNotFound("algorithms.nope".into())
    );
    let err = registry.resolve(FILTERS, "median").err().unwrap();
    assert_eq!(
        err.to_string(),
        "module 'algorithms.filters' has no attribute 'median'"
    );
}

// ---------------------------------------------------------------------------
// Convolution
// ---------------------------------------------------------------------------

#[test]
fn test_sharpen_keeps_flat_image() {
    let image = gray_u8(10, 10, 128);
    let out = run(CONVOLUTION, "sharpen", &image, &[]).unwrap();
    assert_eq!(out.dtype(), DType::U8);
    assert_eq!(out, image);
}

#[test]
fn test_sharpen_increases_edge_contrast() {
    let image = square_image();
    let out = run(CONVOLUTION, "sharpen", &image, &[]).unwrap().to_f64();
    // Just inside the square edge gets brighter, just outside darker.
    assert!(out[[12, 15]] > 220.0 - 1e-9);
    assert!(out[[11, 15]] < 30.0 + 1e-9);
    assert_abs_diff_eq!(out[[15, 15]], 220.0);
}

#[test]
fn test_convolve_identity_kernel() {
    let image = square_image();
    let kernel = expr("array([[0, 0, 0], [0, 1, 0], [0, 0, 0]])");
    let out = run(CONVOLUTION, "convolve", &image, &[kernel]).unwrap();
    assert_eq!(out, image);
}

#[test]
fn test_convolve_color_image() {
    let image = common::color_ramp_f64(8, 8);
    let kernel = expr("np.ones((3, 3)) / 9");
    let out = run(CONVOLUTION, "convolve", &image, &[kernel]).unwrap();
    assert_eq!(out.shape(), &[8, 8, 3]);
    assert_eq!(out.dtype(), DType::F64);
}

#[test]
fn test_convolve_rejects_bad_kernels() {
    let image = gray_u8(8, 8, 1);
    let err = run(CONVOLUTION, "convolve", &image, &[expr("np.ones((3, 5))")]).unwrap_err();
    assert_eq!(err.to_string(), "Kernel is not a square matrix.");
    let err = run(CONVOLUTION, "convolve", &image, &[expr("np.ones((4, 4))")]).unwrap_err();
    assert_eq!(err.to_string(), "Invalid kernel, size should be an odd number.");
}

#[test]
fn test_convolve_argument_type() {
    let err = run(CONVOLUTION, "convolve", &gray_u8(4, 4, 1), &[Value::Float(1.0)]).unwrap_err();
    assert_eq!(err.to_string(), "argument 'kernel' must be an array, not 'float'");
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

#[test]
fn test_gaussian_blur_flat_image() {
    let image = gray_u8(16, 16, 90);
    let out = run(FILTERS, "gaussian_blur", &image, &[Value::Float(2.0)]).unwrap();
    assert_eq!(out.dtype(), DType::U8);
    for &v in out.to_f64().iter() {
        assert_abs_diff_eq!(v, 90.0, epsilon = 1.0);
    }
}

#[test]
fn test_gaussian_blur_smooths_edges() {
    let image = square_image();
    let out = run(FILTERS, "gaussian_blur", &image, &[Value::Float(1.5)]).unwrap().to_f64();
    assert!(out[[12, 15]] < 220.0);
    assert!(out[[11, 15]] > 30.0);
}

#[test]
fn test_unsharp_mask_zero_amount_is_identity() {
    let image = square_image();
    let args = [Value::Float(1.0), Value::Float(0.0), Value::Float(0.0)];
    let out = run(FILTERS, "unsharp_mask", &image, &args).unwrap();
    assert_eq!(out, image);
}

#[test]
fn test_unsharp_mask_arity() {
    let err = run(FILTERS, "unsharp_mask", &gray_u8(4, 4, 1), &[Value::Float(1.0)]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "unsharp_mask() missing 2 required positional arguments: 'amount' and 'threshold'"
    );
}

#[test]
fn test_gamma() {
    let image = gray_u8(4, 4, 64);
    let same = run(FILTERS, "gamma", &image, &[Value::Float(1.0)]).unwrap();
    assert_eq!(same, image);

    let brighter = run(FILTERS, "gamma", &image, &[Value::Float(2.0)]).unwrap().to_f64();
    assert!(brighter[[0, 0]] > 64.0);

    let err = run(FILTERS, "gamma", &image, &[Value::Float(0.0)]).unwrap_err();
    assert!(err.to_string().starts_with("gamma must be a positive number"));
}

#[test]
fn test_brightness_contrast() {
    let image = gray_u8(4, 4, 100);
    let same = run(FILTERS, "brightness_contrast", &image, &[Value::Float(0.0), Value::Float(1.0)]).unwrap();
    assert_eq!(same, image);

    let flat = run(FILTERS, "brightness_contrast", &image, &[Value::Float(0.0), Value::Float(0.0)])
        .unwrap()
        .to_f64();
    assert_abs_diff_eq!(flat[[0, 0]], 128.0, epsilon = 1.0);
}

#[test]
fn test_filters_preserve_float_dtype() {
    let image = common::color_ramp_f64(6, 6);
    let out = run(FILTERS, "gaussian_blur", &image, &[Value::Float(1.0)]).unwrap();
    assert_eq!(out.dtype(), DType::F64);
    assert_eq!(out.shape(), &[6, 6, 3]);
}

// ---------------------------------------------------------------------------
// Deconvolution
// ---------------------------------------------------------------------------

#[test]
fn test_wiener_output() {
    let image = square_image();
    let args = [expr("np.ones((5, 5)) / 25"), Value::Float(0.05)];
    let out = run(DECONVOLUTION, "wiener", &image, &args).unwrap();
    assert_eq!(out.dtype(), DType::F64);
    assert_eq!(out.shape(), &[32, 32]);
    assert!(out.to_f64().iter().all(|v| v.is_finite()));
}

#[test]
fn test_richardson_lucy_output() {
    let image = square_image();
    let args = [expr("np.ones((3, 3))"), Value::Int(10)];
    let out = run(DECONVOLUTION, "richardson_lucy", &image, &args).unwrap().to_f64();
    assert_eq!(out.shape(), &[32, 32]);
    assert!(out.iter().all(|v| v.is_finite() && *v >= 0.0));
    // The bright square stays brighter than the background.
    assert!(out[[15, 15]] > out[[2, 2]]);
}

#[test]
fn test_deconvolution_kernel_errors() {
    let image = gray_u8(4, 4, 10);
    let err = run(DECONVOLUTION, "wiener", &image, &[expr("np.ones((5, 5))"), Value::Float(0.1)])
        .unwrap_err();
    assert!(err.to_string().contains("larger than the image"));

    let err = run(
        DECONVOLUTION,
        "richardson_lucy",
        &image,
        &[expr("array([[1, -1], [-1, 1]])"), Value::Int(3)],
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "Kernel values sum to zero.");
}

#[test]
fn test_richardson_lucy_negative_iterations() {
    let err = run(
        DECONVOLUTION,
        "richardson_lucy",
        &gray_u8(8, 8, 10),
        &[expr("np.ones((3, 3))"), Value::Int(-1)],
    )
    .unwrap_err();
    assert!(err.to_string().contains("must not be negative"));
}

#[test]
fn test_richardson_lucy_cancelled() {
    let algorithm = builtin_registry()
        .resolve(DECONVOLUTION, "richardson_lucy")
        .unwrap();
    let token = CancelToken::new();
    token.cancel();
    let err = call_algorithm(
        algorithm.as_ref(),
        &square_image(),
        &[expr("np.ones((3, 3))"), Value::Int(50)],
        &CallContext::new(token),
    )
    .unwrap_err();
    assert!(err.is_cancelled());
}
