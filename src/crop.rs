use image::imageops::{self, FilterType};
use image::GrayImage;
use ndarray::Array2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Inclusive integer range a jitter component is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JitterRange {
    pub min: i32,
    pub max: i32,
}

impl JitterRange {
    pub const fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    pub const fn none() -> Self {
        Self { min: 0, max: 0 }
    }
}

impl Default for JitterRange {
    fn default() -> Self {
        Self::new(-5, 5)
    }
}

/// Per-sample offset between the nominal crop center and the landmark.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Jitter {
    pub x: i32,
    pub y: i32,
}

impl Jitter {
    pub fn draw<R: Rng + ?Sized>(rng: &mut R, rx: JitterRange, ry: JitterRange) -> Self {
        let x = rng.random_range(rx.min..=rx.max);
        let y = rng.random_range(ry.min..=ry.max);
        Self { x, y }
    }
}

/// Filter size plus how many source pixels one filter pixel covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropSpec {
    pub width: u32,
    pub height: u32,
    pub scale: u32,
}

impl CropSpec {
    pub fn new(width: u32, height: u32, scale: u32) -> Self {
        Self { width, height, scale }
    }

    /// Size of the source region before it is resampled to filter size.
    pub fn extent(&self) -> (u32, u32) {
        (self.width * self.scale, self.height * self.scale)
    }

    /// Top-left corner of the source region for a given anchor and jitter.
    pub fn origin(&self, anchor: (i64, i64), jitter: Jitter) -> (i64, i64) {
        let (ew, eh) = self.extent(/**/);
        let s = self.scale as i64;
        let left = anchor.0 - ew as i64 / 2 - jitter.x as i64 * s;
        let top = anchor.1 - eh as i64 / 2 - jitter.y as i64 * s;
        (left, top)
    }

    /// Where the true landmark sits inside the cropped patch.
    pub fn displacement(&self, jitter: Jitter) -> (f64, f64) {
        let nux = (self.width / 2) as i64 + jitter.x as i64;
        let nuy = (self.height / 2) as i64 + jitter.y as i64;
        (nux as f64, nuy as f64)
    }
}

/// A cropped observation and the landmark position inside it.
#[derive(Debug, Clone)]
pub struct Sample {
    pub patch: Array2<f64>,
    pub displacement: (f64, f64),
}

pub fn crop(image: &GrayImage, anchor: (i64, i64), spec: &CropSpec, jitter: Jitter) -> Result<Sample> {
    let (ew, eh) = spec.extent(/**/);
    let (left, top) = spec.origin(anchor, jitter);
    let (iw, ih) = image.dimensions(/**/);

    let outside = left < 0 || top < 0
        || left + ew as i64 > iw as i64
        || top + eh as i64 > ih as i64;

    if outside {
        return Err(Error::CropOutOfBounds {
            left, top, width: ew, height: eh,
            image_width: iw, image_height: ih,
        });
    }

    let region = imageops::crop_imm(image, left as u32, top as u32, ew, eh).to_image(/**/);
    let region = if spec.scale == 1 { region } else {
        // Bilinear downsample of the oversized region to filter size
        imageops::resize(&region, spec.width, spec.height, FilterType::Triangle)
    };

    let (w, h) = (spec.width as usize, spec.height as usize);
    let patch = Array2::from_shape_fn((h, w), |(r, c)| {
        region.get_pixel(c as u32, r as u32)[0] as f64
    });

    let displacement = spec.displacement(jitter);
    Ok(Sample { patch, displacement })
}
