use ndarray::Array2;

/// Default spread of the desired correlation peak.
pub const DEFAULT_SIGMA: f64 = 2.0;

/// Desired correlation output for one sample: a Gaussian bump peaking at
/// `(nux, nuy)` in crop coordinates, with `exp(-d² / 2σ²)` falloff.
pub fn response(width: usize, height: usize, nux: f64, nuy: f64, sigma: f64) -> Array2<f64> {
    let sigma22 = 2f64 * sigma.powi(2);

    Array2::from_shape_fn((height, width), |(yr, xr)| {
        let dx = xr as f64 - nux;
        let dy = yr as f64 - nuy;
        (-(dx * dx + dy * dy) / sigma22).exp(/**/)
    })
}
