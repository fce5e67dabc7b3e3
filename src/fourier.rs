use ndarray::Array2;
use rayon::prelude::*;
use rustfft::num_complex::Complex64;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

use crate::error::{Error, Result};

type FftF64 = dyn Fft<f64>;

/// Planned 2D DFT for one fixed `height` x `width` shape.
///
/// Forward is unscaled, inverse scales by `1 / (width * height)`, so a
/// forward/inverse pair is the identity.
pub struct Fourier2d {
    row_fft: Arc<FftF64>,
    row_ifft: Arc<FftF64>,
    col_fft: Arc<FftF64>,
    col_ifft: Arc<FftF64>,
    width: usize,
    height: usize,
}

impl Fourier2d {
    pub fn new(planner: &mut FftPlanner<f64>, width: usize, height: usize) -> Self {
        let row_fft = planner.plan_fft_forward(width);
        let row_ifft = planner.plan_fft_inverse(width);
        let col_fft = planner.plan_fft_forward(height);
        let col_ifft = planner.plan_fft_inverse(height);
        Self { row_fft, row_ifft, col_fft, col_ifft, width, height }
    }

    pub fn dim(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    pub fn forward(&self, real: &Array2<f64>) -> Result<Array2<Complex64>> {
        self.check(real.dim(/**/))?;
        let buf = real.iter(/**/).map(|&v| Complex64::new(v, 0f64)).collect(/**/);
        self.run(buf, false)
    }

    pub fn inverse(&self, spectrum: &Array2<Complex64>) -> Result<Array2<Complex64>> {
        self.check(spectrum.dim(/**/))?;
        let buf = spectrum.iter(/**/).cloned(/**/).collect(/**/);
        self.run(buf, true)
    }

    fn run(&self, mut buf: Vec<Complex64>, inverse: bool) -> Result<Array2<Complex64>> {
        let (rows, cols) = if inverse {
            (&self.row_ifft, &self.col_ifft)
        } else {
            (&self.row_fft, &self.col_fft)
        };
        let scale = if inverse { 1f64 / (self.width * self.height) as f64 } else { 1f64 };

        fft2d(&mut buf, rows, cols, scale, self.width, self.height);
        Array2::from_shape_vec((self.height, self.width), buf).map_err(|_| {
            Error::InvalidDimensions { width: self.width, height: self.height }
        })
    }

    fn check(&self, actual: (usize, usize)) -> Result<()> {
        if actual != self.dim(/**/) {
            return Err(Error::ShapeMismatch { expected: self.dim(/**/), actual });
        }
        Ok(())
    }
}

#[inline]
fn fft2d(buf: &mut [Complex64], rows: &Arc<FftF64>, cols: &Arc<FftF64>, scale: f64, width: usize, height: usize) {
    // Row pass in place, then column pass through gathered copies
    buf.par_chunks_mut(width).for_each(|row| {
        rows.process(row);
    });

    let view: &[Complex64] = &*buf;
    let columns: Vec<Vec<Complex64>> = (0..width).into_par_iter(/**/).map(|column| {
        let mut col: Vec<Complex64> = (0..height).map(|i| view[i * width + column]).collect(/**/);
        cols.process(&mut col);
        col
    }).collect(/**/);

    for (column, col) in columns.iter(/**/).enumerate(/**/) {
        for (i, val) in col.iter(/**/).enumerate(/**/) {
            buf[i * width + column] = *val * scale;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn fourier(w: usize, h: usize) -> Fourier2d {
        Fourier2d::new(&mut FftPlanner::new(), w, h)
    }

    #[test]
    fn round_trip_restores_input() {
        let f = fourier(12, 7);
        let input = Array2::from_shape_fn((7, 12), |(r, c)| ((r * 31 + c * 17) % 13) as f64 - 6.5);
        let back = f.inverse(&f.forward(&input).unwrap()).unwrap();
        for (a, b) in input.iter().zip(back.iter()) {
            assert_abs_diff_eq!(*a, b.re, epsilon = 1e-12);
            assert_abs_diff_eq!(b.im, 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn forward_is_unscaled() {
        let f = fourier(4, 4);
        let ones = Array2::ones((4, 4));
        let spectrum = f.forward(&ones).unwrap();
        assert_abs_diff_eq!(spectrum[[0, 0]].re, 16.0, epsilon = 1e-12);
        for (i, v) in spectrum.iter().enumerate().skip(1) {
            assert!(v.norm() < 1e-12, "bin {i} = {v}");
        }
    }

    #[test]
    fn matches_direct_dft() {
        let (w, h) = (5, 3);
        let f = fourier(w, h);
        let input = Array2::from_shape_fn((h, w), |(r, c)| (r as f64 + 1.0) * (c as f64 - 2.0));
        let spectrum = f.forward(&input).unwrap();

        let tau = std::f64::consts::TAU;
        for v in 0..h {
            for u in 0..w {
                let mut acc = Complex64::new(0.0, 0.0);
                for y in 0..h {
                    for x in 0..w {
                        let phase = -tau * (u as f64 * x as f64 / w as f64 + v as f64 * y as f64 / h as f64);
                        acc += Complex64::from_polar(input[[y, x]], phase);
                    }
                }
                assert_abs_diff_eq!(spectrum[[v, u]].re, acc.re, epsilon = 1e-9);
                assert_abs_diff_eq!(spectrum[[v, u]].im, acc.im, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn rejects_wrong_shape() {
        let f = fourier(8, 8);
        assert!(matches!(f.forward(&Array2::zeros((8, 4))), Err(Error::ShapeMismatch { .. })));
    }
}
