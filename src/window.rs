use ndarray::Array2;
use std::f64::consts::PI;

use crate::error::{Error, Result};

/// Apodization mask of `height` rows by `width` columns.
///
/// Each cell is the smaller of two half-sine profiles, one running along
/// the row and one along the column. Both profiles reach zero on the
/// border, so every edge pixel is suppressed. This is a separable
/// approximation of a cosine taper, not a radial one.
pub fn window(width: usize, height: usize) -> Result<Array2<f64>> {
    if width < 2 || height < 2 {
        return Err(Error::InvalidDimensions { width, height });
    }

    let nw = (width - 1) as f64;
    let nh = (height - 1) as f64;

    let mask = Array2::from_shape_fn((height, width), |(j, i)| {
        let cww = (PI * i as f64 / nw).sin(/**/);
        let cwh = (PI * j as f64 / nh).sin(/**/);
        cww.min(cwh)
    });

    Ok(mask)
}
