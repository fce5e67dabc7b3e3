use image::GrayImage;
use log::{debug, info, warn};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use rustfft::num_complex::Complex64;
use rustfft::FftPlanner;
use std::path::Path;

use crate::accumulator::Accumulator;
use crate::asset::FilterAsset;
use crate::config::{TrainConfig, TrainPlan};
use crate::crop::{self, Jitter};
use crate::dataset;
use crate::error::{Error, Result};
use crate::fourier::Fourier2d;
use crate::preprocess::Preprocessor;
use crate::response;
use crate::synth;
use crate::window;

type Spectrum = Array2<Complex64>;

// Samples per partial sum; fixed so merge order never depends on thread count
const PARTIAL_CHUNK: usize = 16;

/// Result of one training run.
#[derive(Debug, Clone)]
pub struct TrainedFilter {
    pub filter: Spectrum,
    pub top: Spectrum,
    pub bottom: Spectrum,
    pub samples: usize,
}

impl TrainedFilter {
    pub fn asset(&self) -> Result<FilterAsset> {
        FilterAsset::from_parts(&self.filter, &self.top, &self.bottom)
    }
}

/// The training pipeline for one landmark. Built once per run; holds the
/// FFT plans and apodization mask shared by every sample.
pub struct Trainer {
    plan: TrainPlan,
    fourier: Fourier2d,
    preprocessor: Preprocessor,
}

impl Trainer {
    pub fn new(plan: TrainPlan) -> Result<Self> {
        let (w, h) = (plan.crop.width as usize, plan.crop.height as usize);
        let preprocessor = Preprocessor::new(window::window(w, h)?);
        let fourier = Fourier2d::new(&mut FftPlanner::new(/**/), w, h);
        Ok(Self { plan, fourier, preprocessor })
    }

    pub fn plan(&self) -> &TrainPlan {
        &self.plan
    }

    /// One jitter per sample, drawn in sample order from a single stream.
    pub fn draw_jitters(&self, count: usize, seed: u64) -> Vec<Jitter> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..count)
            .map(|_| Jitter::draw(&mut rng, self.plan.jitter_x, self.plan.jitter_y))
            .collect(/**/)
    }

    /// Observation and desired-response spectra of one training image.
    pub fn sample_spectra(&self, image: &GrayImage, jitter: Jitter, index: usize) -> Result<(Spectrum, Spectrum)> {
        let spec = &self.plan.crop;
        let sample = crop::crop(image, self.plan.anchor, spec, jitter)?;
        debug!(
            "sample {index}: jitter ({}, {}) origin {:?}",
            jitter.x, jitter.y, spec.origin(self.plan.anchor, jitter)
        );

        let observation = self.preprocessor.apply(&sample.patch, index)?;
        let (nux, nuy) = sample.displacement;
        let target = response::response(
            spec.width as usize, spec.height as usize, nux, nuy, self.plan.sigma,
        );

        Ok((self.fourier.forward(&observation)?, self.fourier.forward(&target)?))
    }

    /// Sums every sample's contribution. Chunks are summed in parallel and
    /// merged in chunk order, so the result is reproducible.
    pub fn accumulate(&self, images: &[GrayImage], jitters: &[Jitter]) -> Result<Accumulator> {
        if images.is_empty(/**/) {
            return Err(Error::EmptyTrainingSet);
        }
        if images.len(/**/) != jitters.len(/**/) {
            return Err(Error::InvalidConfig(format!(
                "{} images but {} jitter offsets", images.len(/**/), jitters.len(/**/)
            )));
        }

        let (w, h) = (self.plan.crop.width as usize, self.plan.crop.height as usize);
        let partials = images
            .par_chunks(PARTIAL_CHUNK)
            .zip(jitters.par_chunks(PARTIAL_CHUNK))
            .enumerate(/**/)
            .map(|(chunk, (imgs, jits))| -> Result<Accumulator> {
                let mut partial = Accumulator::new(w, h);
                for (i, (image, &jitter)) in imgs.iter(/**/).zip(jits).enumerate(/**/) {
                    let index = chunk * PARTIAL_CHUNK + i;
                    let (f, g) = self.sample_spectra(image, jitter, index)?;
                    partial.accumulate(&f, &g)?;
                }
                Ok(partial)
            })
            .collect::<Result<Vec<_>>>(/**/)?;

        let mut total = Accumulator::new(w, h);
        for partial in &partials {
            total.merge(partial)?;
        }

        info!("accumulated {} samples", total.samples(/**/));
        Ok(total)
    }

    pub fn train(&self, images: &[GrayImage], jitters: &[Jitter]) -> Result<TrainedFilter> {
        let total = self.accumulate(images, jitters)?;
        self.finish(total)
    }

    /// Divides the accumulated sums into the filter.
    pub fn finish(&self, total: Accumulator) -> Result<TrainedFilter> {
        let samples = total.samples(/**/);
        let (top, bottom) = total.into_parts(/**/);
        let filter = synth::synthesize_regularized(&top, &bottom, self.plan.regularization)?;

        let bad = synth::non_finite_bins(&filter);
        if bad > 0 {
            warn!("{bad} filter bins are not finite (zero denominator energy)");
        }

        Ok(TrainedFilter { filter, top, bottom, samples })
    }

    pub fn preview(&self, trained: &TrainedFilter) -> Result<GrayImage> {
        synth::render_preview(&trained.filter, &self.fourier)
    }
}

/// Loads the training set in `dir` and trains the landmark `config` names.
pub fn train_directory(dir: &Path, config: &TrainConfig) -> Result<(Trainer, TrainedFilter)> {
    let source_size = config.source_size.map(|[w, h]| (w, h));
    let images: Vec<GrayImage> = dataset::load_images(dir, source_size)?
        .into_iter(/**/)
        .map(|image| image.pixels)
        .collect(/**/);

    train_images(&images, config)
}

/// Trains on already decoded faces. Without a configured seed one is drawn
/// from the OS and logged so the run can be repeated.
pub fn train_images(images: &[GrayImage], config: &TrainConfig) -> Result<(Trainer, TrainedFilter)> {
    let trainer = Trainer::new(config.plan(/**/)?)?;

    let seed = config.seed.unwrap_or_else(|| rand::rng(/**/).random(/**/));
    info!("training {} ({} images, jitter seed {seed})", config.landmark, images.len(/**/));

    let jitters = trainer.draw_jitters(images.len(/**/), seed);
    let trained = trainer.train(images, &jitters)?;
    Ok((trainer, trained))
}
