use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImgbenchError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image format error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("TOML write error: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    #[error("Invalid image dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Unsupported image: {0}")]
    UnsupportedImage(String),

    #[error("Array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

pub type Result<T> = std::result::Result<T, ImgbenchError>;
