//! # landmark-mosse
//!
//! Trains MOSSE correlation filters that localize a facial landmark (an
//! eye, the nose, the mouth or the whole face) in aligned face images.
//!
//! For every training face a patch is cropped around the landmark with a
//! random offset, log-compressed, normalized and windowed. A Gaussian peak
//! is placed where the landmark really sits inside the patch. Both go to
//! the frequency domain and are summed into a numerator (response times
//! conjugate observation) and a denominator (observation power):
//!
//! ```text
//! H = Σ G ⊙ F* / Σ F ⊙ F*
//! ```
//!
//! The filter is exported together with both sums as a [`FilterAsset`], the
//! document a browser-side tracker loads.
//!
//! ```no_run
//! use landmark_mosse::{train_directory, AssetFormat, TrainConfig};
//! use std::path::Path;
//!
//! let config = TrainConfig { seed: Some(1), ..TrainConfig::default() };
//! let (trainer, trained) = train_directory(Path::new("data"), &config).unwrap();
//! trained.asset().unwrap()
//!     .save(Path::new("left_eye_filter.js"), &AssetFormat::Script { variable: "left_eye_filter".into() })
//!     .unwrap();
//! trainer.preview(&trained).unwrap().save("left_eye_filter.bmp").unwrap();
//! ```

pub mod accumulator;
pub mod asset;
pub mod config;
pub mod crop;
pub mod dataset;
mod error;
pub mod fourier;
pub mod landmark;
pub mod pipeline;
pub mod preprocess;
pub mod response;
pub mod synth;
pub mod window;

#[cfg(feature = "python")]
mod python;

pub use accumulator::Accumulator;
pub use asset::{AssetFormat, ComplexParts, FilterAsset};
pub use config::{TrainConfig, TrainPlan};
pub use crop::{CropSpec, Jitter, JitterRange, Sample};
pub use error::{Error, Result};
pub use fourier::Fourier2d;
pub use landmark::{Landmark, LANDMARKS};
pub use pipeline::{train_directory, train_images, TrainedFilter, Trainer};
pub use preprocess::Preprocessor;
