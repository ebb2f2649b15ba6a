//! Algorithms shipped with imgbench.
//!
//! | module                    | methods                                                |
//! |---------------------------|--------------------------------------------------------|
//! | `algorithms.filters`      | `gaussian_blur`, `unsharp_mask`, `gamma`, `brightness_contrast` |
//! | `algorithms.convolution`  | `sharpen`, `convolve`                                  |
//! | `algorithms.deconvolution`| `wiener`, `richardson_lucy`                            |

pub mod convolution;
pub mod deconvolution;
pub mod filters;
pub mod gaussian_blur;

use ndarray::Array2;

use super::{AlgorithmError, ModuleRegistry};
use crate::array::{DType, NdArray};
use crate::config::{AlgorithmEntry, ConfigDocument};
use crate::params::ParamType;
use crate::value::Value;

/// Registry holding every built-in module.
pub fn builtin_registry() -> ModuleRegistry {
    ModuleRegistry::new()
        .with_module(filters::module())
        .with_module(convolution::module())
        .with_module(deconvolution::module())
}

/// A config document declaring every built-in algorithm with working defaults.
pub fn example_document() -> ConfigDocument {
    let float = |v: f64| Some(toml::Value::Float(v));
    let text = |s: &str| Some(toml::Value::String(s.to_string()));

    ConfigDocument {
        algorithms: vec![
            AlgorithmEntry::new("Sharpen", convolution::MODULE, "sharpen"),
            AlgorithmEntry::new("Convolution", convolution::MODULE, "convolve").param(
                "Kernel",
                ParamType::Array,
                "Square kernel with an odd side length",
                text("[[0, -1, 0], [-1, 5, -1], [0, -1, 0]]"),
            ),
            AlgorithmEntry::new("Gaussian blur", filters::MODULE, "gaussian_blur").param(
                "Sigma",
                ParamType::Float,
                "Standard deviation of the Gaussian, in pixels",
                float(1.5),
            ),
            AlgorithmEntry::new("Unsharp mask", filters::MODULE, "unsharp_mask")
                .param("Radius", ParamType::Float, "Blur sigma of the mask", float(1.0))
                .param("Amount", ParamType::Float, "Fraction of the difference added back", float(0.5))
                .param("Threshold", ParamType::Float, "Minimum difference to sharpen", float(0.0)),
            AlgorithmEntry::new("Gamma", filters::MODULE, "gamma").param(
                "Gamma",
                ParamType::Float,
                "Values above 1 brighten midtones",
                float(1.2),
            ),
            AlgorithmEntry::new("Brightness/contrast", filters::MODULE, "brightness_contrast")
                .param("Brightness", ParamType::Float, "Offset added after scaling", float(0.0))
                .param("Contrast", ParamType::Float, "Scale around mid-gray", float(1.0)),
            AlgorithmEntry::new("Wiener", deconvolution::MODULE, "wiener")
                .param("Kernel", ParamType::Array, "Point spread function", text("np.ones((5, 5)) / 25"))
                .param("K", ParamType::Float, "Noise-to-signal ratio", float(0.05)),
            AlgorithmEntry::new("Richardson-Lucy", deconvolution::MODULE, "richardson_lucy")
                .param("Kernel", ParamType::Array, "Point spread function", text("np.ones((5, 5))"))
                .param(
                    "Iterations",
                    ParamType::Int,
                    "Number of multiplicative updates",
                    Some(toml::Value::Integer(30)),
                ),
        ],
    }
}

// ---------------------------------------------------------------------------
// Argument helpers
// ---------------------------------------------------------------------------

fn arg<'a>(args: &'a [Value], index: usize, name: &'static str) -> Result<&'a Value, AlgorithmError> {
    args.get(index)
        .ok_or_else(|| AlgorithmError::invalid(format!("missing argument '{name}'")))
}

pub(crate) fn arg_f32(args: &[Value], index: usize, name: &'static str) -> Result<f32, AlgorithmError> {
    let value = arg(args, index, name)?;
    value
        .as_f64()
        .map(|v| v as f32)
        .ok_or(AlgorithmError::ArgumentType {
            name,
            expected: "a real number",
            got: value.type_name(),
        })
}

pub(crate) fn arg_count(args: &[Value], index: usize, name: &'static str) -> Result<usize, AlgorithmError> {
    let value = arg(args, index, name)?;
    let n = value.as_i64().ok_or(AlgorithmError::ArgumentType {
        name,
        expected: "an integer",
        got: value.type_name(),
    })?;
    usize::try_from(n)
        .map_err(|_| AlgorithmError::invalid(format!("'{name}' must not be negative, got {n}")))
}

/// A 2-D `float64` matrix argument such as a kernel.
pub(crate) fn arg_matrix(args: &[Value], index: usize, name: &'static str) -> Result<Array2<f64>, AlgorithmError> {
    let value = arg(args, index, name)?;
    let array = value.as_array().ok_or(AlgorithmError::ArgumentType {
        name,
        expected: "an array",
        got: value.type_name(),
    })?;
    array
        .to_f64()
        .into_dimensionality::<ndarray::Ix2>()
        .map_err(|e| AlgorithmError::failed(format!("'{name}' must be a 2-D array"), e))
}

// ---------------------------------------------------------------------------
// Image helpers
// ---------------------------------------------------------------------------

/// Channel planes of `image`, scaled so the dtype's white level maps to 1.0.
pub(crate) fn unit_planes(image: &NdArray) -> Result<Vec<Array2<f32>>, AlgorithmError> {
    let white = image.dtype().white_level() as f32;
    let planes = image.planes().ok_or_else(|| {
        AlgorithmError::invalid(format!(
            "expected an (m, n) or (m, n, c) image, got shape {}",
            image.shape_string()
        ))
    })?;
    Ok(planes.into_iter().map(|p| p / white).collect())
}

/// Inverse of [`unit_planes`]: rescale to the white level of `dtype`.
pub(crate) fn from_unit_planes(planes: Vec<Array2<f32>>, dtype: DType) -> Result<Value, AlgorithmError> {
    let white = dtype.white_level() as f32;
    let scaled: Vec<Array2<f32>> = planes.into_iter().map(|p| p * white).collect();
    NdArray::from_planes(&scaled, dtype)
        .map(Value::Array)
        .ok_or_else(|| AlgorithmError::invalid("algorithm produced no channels"))
}

/// Luminance of an image in `[0, 1]` scale. Gray images pass through.
pub(crate) fn unit_luminance(image: &NdArray) -> Result<Array2<f32>, AlgorithmError> {
    let planes = unit_planes(image)?;
    match planes.as_slice() {
        [gray] => Ok(gray.clone()),
        [r, g, b] => Ok(r * 0.2125 + g * 0.7154 + b * 0.0721),
        other => Err(AlgorithmError::invalid(format!(
            "cannot convert a {}-channel image to grayscale",
            other.len()
        ))),
    }
}

/// Stretch `data` linearly onto `[0, 1]`. A flat input becomes all zeros.
pub(crate) fn normalize_min_max(data: &Array2<f32>) -> Array2<f32> {
    let (min, max) = data
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let range = max - min;
    if !range.is_finite() || range <= 0.0 {
        return Array2::zeros(data.dim());
    }
    data.mapv(|v| (v - min) / range)
}
