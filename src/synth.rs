use image::{GrayImage, Luma};
use ndarray::{Array2, Zip};
use rustfft::num_complex::Complex64;

use crate::error::{Error, Result};
use crate::fourier::Fourier2d;

/// Elementwise `top / bottom`. Bins where `bottom` is zero come out
/// non-finite and are left that way.
pub fn synthesize(top: &Array2<Complex64>, bottom: &Array2<Complex64>) -> Result<Array2<Complex64>> {
    synthesize_regularized(top, bottom, 0f64)
}

/// Same as [`synthesize`] with `lambda` added to every denominator bin.
/// A `lambda` of zero leaves the division untouched.
pub fn synthesize_regularized(
    top: &Array2<Complex64>,
    bottom: &Array2<Complex64>,
    lambda: f64,
) -> Result<Array2<Complex64>> {
    if top.dim(/**/) != bottom.dim(/**/) {
        return Err(Error::ShapeMismatch { expected: top.dim(/**/), actual: bottom.dim(/**/) });
    }

    let floor = Complex64::new(lambda, 0f64);
    let filter = Zip::from(top).and(bottom).map_collect(|&a, &b| {
        if lambda == 0f64 { a / b } else { a / (b + floor) }
    });

    Ok(filter)
}

/// Spatial-domain picture of the filter, stretched to the full 8-bit range.
pub fn render_preview(filter: &Array2<Complex64>, fourier: &Fourier2d) -> Result<GrayImage> {
    let spatial = fourier.inverse(filter)?;
    let real = spatial.mapv(|v| v.re);

    let min = real.iter(/**/).cloned(/**/).fold(f64::INFINITY, f64::min);
    let shifted = real.mapv(|v| v - min);
    let max = shifted.iter(/**/).cloned(/**/).fold(0f64, f64::max);
    let gain = if max > 0f64 { 255f64 / max } else { 0f64 };

    let (h, w) = shifted.dim(/**/);
    let preview = GrayImage::from_fn(w as u32, h as u32, |x, y| {
        let level = (shifted[[y as usize, x as usize]] * gain).floor(/**/);
        Luma([level.clamp(0f64, 255f64) as u8])
    });

    Ok(preview)
}

/// Number of filter bins that are NaN or infinite in either component.
pub fn non_finite_bins(filter: &Array2<Complex64>) -> usize {
    filter.iter(/**/).filter(|v| !v.re.is_finite(/**/) || !v.im.is_finite(/**/)).count(/**/)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rustfft::FftPlanner;

    fn parts() -> (Array2<Complex64>, Array2<Complex64>) {
        let top = Array2::from_shape_fn((4, 5), |(r, c)| Complex64::new(r as f64 - 1.5, c as f64 * 0.25));
        let bottom = Array2::from_shape_fn((4, 5), |(r, c)| Complex64::new(1.0 + (r * c) as f64, 0.0));
        (top, bottom)
    }

    #[test]
    fn division_inverts_multiplication() {
        let (top, bottom) = parts();
        let filter = synthesize(&top, &bottom).unwrap();
        for ((h, a), b) in filter.iter().zip(top.iter()).zip(bottom.iter()) {
            let back = h * b;
            assert_relative_eq!(back.re, a.re, epsilon = 1e-12);
            assert_relative_eq!(back.im, a.im, epsilon = 1e-12);
        }
    }

    #[test]
    fn zero_bins_stay_non_finite() {
        let (top, mut bottom) = parts();
        bottom[[2, 3]] = Complex64::ZERO;
        let filter = synthesize(&top, &bottom).unwrap();
        assert!(!filter[[2, 3]].re.is_finite() || !filter[[2, 3]].im.is_finite());
        assert_eq!(non_finite_bins(&filter), 1);
    }

    #[test]
    fn zero_lambda_matches_plain_division() {
        let (top, bottom) = parts();
        let plain = synthesize(&top, &bottom).unwrap();
        let reg = synthesize_regularized(&top, &bottom, 0.0).unwrap();
        assert_eq!(plain, reg);

        let damped = synthesize_regularized(&top, &bottom, 0.5).unwrap();
        assert_eq!(damped[[1, 1]], top[[1, 1]] / (bottom[[1, 1]] + 0.5));
    }

    #[test]
    fn preview_spans_full_range() {
        let fourier = Fourier2d::new(&mut FftPlanner::new(), 5, 4);
        let (top, bottom) = parts();
        let filter = synthesize(&top, &bottom).unwrap();
        let preview = render_preview(&filter, &fourier).unwrap();

        assert_eq!(preview.dimensions(), (5, 4));
        let values: Vec<u8> = preview.pixels().map(|p| p[0]).collect();
        assert_eq!(values.iter().min(), Some(&0));
        // 255 / max can round just below the top level before flooring
        assert!(*values.iter().max().unwrap() >= 254);
    }

    #[test]
    fn flat_preview_is_black() {
        let fourier = Fourier2d::new(&mut FftPlanner::new(), 4, 4);
        let filter = Array2::from_elem((4, 4), Complex64::ZERO);
        let preview = render_preview(&filter, &fourier).unwrap();
        assert!(preview.pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn mismatched_parts_are_rejected() {
        let (top, _) = parts();
        let bottom = Array2::from_elem((5, 4), Complex64::ONE);
        assert!(matches!(synthesize(&top, &bottom), Err(Error::ShapeMismatch { .. })));
    }
}
