use std::path::Path;

use image::{ColorType, DynamicImage, ImageBuffer, ImageFormat, Luma, Rgb};
use ndarray::{ArrayD, IxDyn};
use tracing::debug;

use crate::array::{DType, NdArray};
use crate::contract::check_array;
use crate::error::{ImgbenchError, Result};

/// Load an image file into an array.
///
/// 8-bit files give `uint8`, 16-bit files `uint16`, float files `float32`.
/// Gray images are `(H, W)`, everything else is converted to `(H, W, 3)`;
/// alpha is dropped.
pub fn load_image(path: &Path) -> Result<NdArray> {
    let img = image::open(path)?;
    let (w, h) = (img.width(), img.height());
    if w == 0 || h == 0 {
        return Err(ImgbenchError::InvalidDimensions {
            width: w,
            height: h,
        });
    }

    let gray = IxDyn(&[h as usize, w as usize]);
    let rgb = IxDyn(&[h as usize, w as usize, 3]);

    let array = match img.color() {
        ColorType::L8 | ColorType::La8 => {
            NdArray::U8(ArrayD::from_shape_vec(gray, img.to_luma8().into_raw())?)
        }
        ColorType::L16 | ColorType::La16 => {
            NdArray::U16(ArrayD::from_shape_vec(gray, img.to_luma16().into_raw())?)
        }
        ColorType::Rgb16 | ColorType::Rgba16 => {
            NdArray::U16(ArrayD::from_shape_vec(rgb, img.to_rgb16().into_raw())?)
        }
        ColorType::Rgb32F | ColorType::Rgba32F => {
            NdArray::F32(ArrayD::from_shape_vec(rgb, img.to_rgb32f().into_raw())?)
        }
        _ => NdArray::U8(ArrayD::from_shape_vec(rgb, img.to_rgb8().into_raw())?),
    };

    debug!(
        path = %path.display(),
        shape = %array.shape_string(),
        dtype = %array.dtype(),
        "Image loaded"
    );
    Ok(array)
}

/// Save an image array, choosing the format from the file extension.
///
/// `uint16` data stays 16-bit for PNG and TIFF. Everything else is written
/// as 8-bit: float data in `[0, 1]` is scaled to `0..=255`, float data
/// exceeding 1 is clamped to `0..=255`.
pub fn save_image(array: &NdArray, path: &Path) -> Result<()> {
    check_array(array).map_err(|e| ImgbenchError::UnsupportedImage(e.to_string()))?;

    let format = ImageFormat::from_path(path)?;
    let shape = array.shape();
    let (h, w) = (shape[0] as u32, shape[1] as u32);
    let color = shape.len() == 3;
    let keep_16 = array.dtype() == DType::U16 && matches!(format, ImageFormat::Png | ImageFormat::Tiff);

    let img = if keep_16 {
        let data = array.to_f64().iter().map(|&v| v as u16).collect::<Vec<u16>>();
        if color {
            DynamicImage::ImageRgb16(buffer::<Rgb<u16>>(w, h, data)?)
        } else {
            DynamicImage::ImageLuma16(buffer::<Luma<u16>>(w, h, data)?)
        }
    } else {
        let data = to_u8(array);
        if color {
            DynamicImage::ImageRgb8(buffer::<Rgb<u8>>(w, h, data)?)
        } else {
            DynamicImage::ImageLuma8(buffer::<Luma<u8>>(w, h, data)?)
        }
    };

    img.save_with_format(path, format)?;
    debug!(path = %path.display(), format = ?format, "Image saved");
    Ok(())
}

fn buffer<P: image::Pixel>(w: u32, h: u32, data: Vec<P::Subpixel>) -> Result<ImageBuffer<P, Vec<P::Subpixel>>> {
    ImageBuffer::from_raw(w, h, data).ok_or(ImgbenchError::InvalidDimensions {
        width: w,
        height: h,
    })
}

/// 8-bit samples of `array` in row-major order.
fn to_u8(array: &NdArray) -> Vec<u8> {
    let data = array.to_f64();
    let scale = match array.dtype() {
        DType::U16 => 255.0 / u16::MAX as f64,
        dtype if dtype.is_float() => {
            let max = data.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            if max <= 1.0 {
                255.0
            } else {
                1.0
            }
        }
        _ => 1.0,
    };
    data.iter()
        .map(|&v| (v * scale).round().clamp(0.0, 255.0) as u8)
        .collect()
}
