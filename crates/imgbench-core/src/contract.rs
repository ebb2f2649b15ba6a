use thiserror::Error;

use crate::array::{format_shape, DType, NdArray};
use crate::value::Value;

/// Pixel types an image may carry.
pub const IMAGE_PIXEL_TYPES: [DType; 4] = [DType::U8, DType::U16, DType::F32, DType::F64];

/// Ways a value can fail to be an image.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageContractError {
    #[error("Object is {0}. Expected numpy.array.")]
    NotAnArray(&'static str),

    #[error("Array has invalid shape {0}. Expected (m, n) or (m, n, 3).")]
    InvalidShape(String),

    #[error("Image pixel type is {0}. Expected one of: uint8, uint16, float32, float64.")]
    InvalidPixelType(DType),
}

/// Check that `value` is an image: a non-empty `(H, W)` or `(H, W, 3)` array
/// of `uint8`, `uint16`, `float32` or `float64`.
pub fn check_image(value: &Value) -> Result<&NdArray, ImageContractError> {
    let array = value
        .as_array()
        .ok_or(ImageContractError::NotAnArray(value.type_name()))?;
    check_array(array)?;
    Ok(array)
}

pub fn check_array(array: &NdArray) -> Result<(), ImageContractError> {
    let shape = array.shape();
    let valid_shape = match shape {
        [h, w] => *h > 0 && *w > 0,
        [h, w, 3] => *h > 0 && *w > 0,
        _ => false,
    };
    if !valid_shape {
        return Err(ImageContractError::InvalidShape(format_shape(shape)));
    }

    let dtype = array.dtype();
    if !IMAGE_PIXEL_TYPES.contains(&dtype) {
        return Err(ImageContractError::InvalidPixelType(dtype));
    }
    Ok(())
}
