use ndarray::Array2;

use crate::error::{Error, Result};

// Below this a crop is treated as flat; rounding alone leaves ~1e-14
const ZERO_NORM: f64 = 1e-9;

/// Photometric normalization applied to every observation before it is
/// transformed. Holds the apodization mask so it is built once per run.
pub struct Preprocessor {
    window: Array2<f64>,
}

impl Preprocessor {
    pub fn new(window: Array2<f64>) -> Self {
        Self { window }
    }

    pub fn dim(&self) -> (usize, usize) {
        self.window.dim(/**/)
    }

    /// Log-compress, remove the mean, scale to unit energy, then window.
    ///
    /// Windowing has to come last: the energy normalization assumes it sees
    /// the full, unattenuated patch. `index` only labels the error.
    pub fn apply(&self, patch: &Array2<f64>, index: usize) -> Result<Array2<f64>> {
        if patch.dim(/**/) != self.window.dim(/**/) {
            return Err(Error::ShapeMismatch {
                expected: self.window.dim(/**/),
                actual: patch.dim(/**/),
            });
        }

        let logged = patch.mapv(|p| (p + 1f64).ln(/**/));

        let mean = logged.mean(/**/).unwrap_or(0f64);
        let centered = logged.mapv(|v| v - mean);

        let norm = centered.iter(/**/).map(|v| v * v).sum::<f64>(/**/).sqrt(/**/);
        if !norm.is_finite(/**/) || norm <= ZERO_NORM {
            return Err(Error::ZeroNormSample { index });
        }
        let normalized = centered.mapv(|v| v / norm);

        Ok(normalized * &self.window)
    }
}
