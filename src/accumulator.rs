use ndarray::{Array2, Zip};
use rustfft::num_complex::Complex64;

use crate::error::{Error, Result};

/// Running numerator and denominator sums over training samples.
///
/// `top` collects the cross-power between desired response and observation,
/// `bottom` the observation's auto-power. Both are plain sums, so partial
/// accumulators built over disjoint samples can be merged in any order.
#[derive(Debug, Clone, PartialEq)]
pub struct Accumulator {
    top: Array2<Complex64>,
    bottom: Array2<Complex64>,
    samples: usize,
}

impl Accumulator {
    pub fn new(width: usize, height: usize) -> Self {
        let top = Array2::from_elem((height, width), Complex64::ZERO);
        let bottom = top.clone(/**/);
        Self { top, bottom, samples: 0 }
    }

    pub fn dim(&self) -> (usize, usize) {
        self.top.dim(/**/)
    }

    pub fn samples(&self) -> usize {
        self.samples
    }

    pub fn top(&self) -> &Array2<Complex64> {
        &self.top
    }

    pub fn bottom(&self) -> &Array2<Complex64> {
        &self.bottom
    }

    pub fn into_parts(self) -> (Array2<Complex64>, Array2<Complex64>) {
        (self.top, self.bottom)
    }

    /// Adds one sample given its observation and response spectra.
    pub fn accumulate(&mut self, observation: &Array2<Complex64>, response: &Array2<Complex64>) -> Result<()> {
        self.check(observation.dim(/**/))?;
        self.check(response.dim(/**/))?;

        Zip::from(&mut self.top)
            .and(&mut self.bottom)
            .and(observation)
            .and(response)
            .for_each(|a, b, &f, &g| {
                let conjugate = f.conj(/**/);
                *a += g * conjugate;
                *b += f * conjugate;
            });

        self.samples += 1;
        Ok(())
    }

    /// Folds another partial sum into this one.
    pub fn merge(&mut self, other: &Accumulator) -> Result<()> {
        self.check(other.dim(/**/))?;
        self.top += &other.top;
        self.bottom += &other.bottom;
        self.samples += other.samples;
        Ok(())
    }

    fn check(&self, actual: (usize, usize)) -> Result<()> {
        if actual != self.dim(/**/) {
            return Err(Error::ShapeMismatch { expected: self.dim(/**/), actual });
        }
        Ok(())
    }
}
