use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image decode error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Filter asset serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Crop ({left}, {top}) {width}x{height} lies outside {image_width}x{image_height} image")]
    CropOutOfBounds {
        left: i64,
        top: i64,
        width: u32,
        height: u32,
        image_width: u32,
        image_height: u32,
    },

    #[error("Training set is empty")]
    EmptyTrainingSet,

    #[error("Sample {index} has zero energy after mean removal (flat crop)")]
    ZeroNormSample { index: usize },

    #[error("Invalid filter dimensions {width}x{height}: both sides must be at least 2")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("Unknown landmark: {0}")]
    UnknownLandmark(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Image {path:?} is {actual:?}, expected {expected:?}")]
    SourceSizeMismatch {
        path: PathBuf,
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error("Invalid filter asset: {0}")]
    InvalidAsset(String),
}

pub type Result<T> = std::result::Result<T, Error>;
