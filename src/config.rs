use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::asset::DEFAULT_VARIABLE;
use crate::crop::{CropSpec, JitterRange};
use crate::error::{Error, Result};
use crate::landmark::Landmark;
use crate::response::DEFAULT_SIGMA;

/// Every recognized training option. Missing keys in a config file fall
/// back to the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrainConfig {
    /// Entry of the landmark table to train for.
    pub landmark: String,
    /// Explicit anchor overriding the table entry.
    pub anchor: Option<[i64; 2]>,
    pub width: u32,
    pub height: u32,
    pub jitter_x: JitterRange,
    pub jitter_y: JitterRange,
    pub sigma: f64,
    /// Overrides the landmark's own scale.
    pub scale: Option<u32>,
    /// Fixed jitter seed; drawn from OS entropy when absent.
    pub seed: Option<u64>,
    pub regularization: f64,
    /// Required `[width, height]` of every training image.
    pub source_size: Option<[u32; 2]>,
    /// Variable name used by the script wrapper.
    pub variable: String,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            landmark: "left_eye".to_string(/**/),
            anchor: None,
            width: 32,
            height: 32,
            jitter_x: JitterRange::default(/**/),
            jitter_y: JitterRange::default(/**/),
            sigma: DEFAULT_SIGMA,
            scale: None,
            seed: None,
            regularization: 0f64,
            source_size: None,
            variable: DEFAULT_VARIABLE.to_string(/**/),
        }
    }
}

/// Validated, fully resolved parameters of one training run.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainPlan {
    pub anchor: (i64, i64),
    pub crop: CropSpec,
    pub jitter_x: JitterRange,
    pub jitter_y: JitterRange,
    pub sigma: f64,
    pub regularization: f64,
    pub source_size: Option<(u32, u32)>,
}

impl TrainConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let config = serde_json::from_str(&text)?;
        Ok(config)
    }

    pub fn plan(&self) -> Result<TrainPlan> {
        if self.width < 2 || self.height < 2 {
            return Err(Error::InvalidDimensions {
                width: self.width as usize,
                height: self.height as usize,
            });
        }

        for (axis, range) in [("x", self.jitter_x), ("y", self.jitter_y)] {
            if range.min > range.max {
                return Err(Error::InvalidConfig(format!(
                    "jitter_{axis} range {}..={} is empty", range.min, range.max
                )));
            }
        }

        if !(self.sigma.is_finite(/**/) && self.sigma > 0f64) {
            return Err(Error::InvalidConfig(format!("sigma must be positive, got {}", self.sigma)));
        }

        if !(self.regularization.is_finite(/**/) && self.regularization >= 0f64) {
            return Err(Error::InvalidConfig(format!(
                "regularization must be non-negative, got {}", self.regularization
            )));
        }

        let landmark = Landmark::lookup(&self.landmark);
        let (anchor, table_scale) = match (self.anchor, landmark) {
            (Some([x, y]), Ok(mark)) => ((x, y), mark.scale),
            (Some([x, y]), Err(_)) => ((x, y), 1),
            (None, Ok(mark)) => (mark.anchor(/**/), mark.scale),
            (None, Err(e)) => return Err(e),
        };

        let scale = self.scale.unwrap_or(table_scale);
        if scale == 0 {
            return Err(Error::InvalidConfig("scale must be at least 1".to_string(/**/)));
        }

        Ok(TrainPlan {
            anchor,
            crop: CropSpec::new(self.width, self.height, scale),
            jitter_x: self.jitter_x,
            jitter_y: self.jitter_y,
            sigma: self.sigma,
            regularization: self.regularization,
            source_size: self.source_size.map(|[w, h]| (w, h)),
        })
    }
}
