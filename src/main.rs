//! Command-line front end for training landmark filters.
//!
//! Usage:
//!   landmark-mosse train --data faces/ --landmark left_eye --out left_eye_filter.js --preview left_eye.bmp
//!   landmark-mosse train --data faces/ --all --out filters/
//!   landmark-mosse landmarks
//!   landmark-mosse inspect left_eye_filter.js

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use image::GrayImage;
use landmark_mosse::{
    dataset, synth, train_images, AssetFormat, FilterAsset, Fourier2d, JitterRange, TrainConfig, LANDMARKS,
};
use log::info;
use rustfft::FftPlanner;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "landmark-mosse")]
#[command(version, about = "Train MOSSE correlation filters for facial landmarks")]
struct Cli {
    /// Log per-sample details.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a filter from a directory of aligned face images.
    Train(TrainArgs),

    /// Print the built-in landmark table.
    Landmarks,

    /// Summarize a saved filter asset.
    Inspect {
        /// Asset file (.js or .json).
        asset: PathBuf,

        /// Write the filter's spatial-domain preview here.
        #[arg(long)]
        preview: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Args)]
struct TrainArgs {
    /// Directory of training images.
    #[arg(long)]
    data: PathBuf,

    /// Output asset path, or output directory with --all.
    #[arg(long)]
    out: PathBuf,

    /// JSON file with training options; flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Landmark to train (see `landmarks`).
    #[arg(long, conflicts_with = "all")]
    landmark: Option<String>,

    /// Train every landmark in the table.
    #[arg(long)]
    all: bool,

    /// Explicit anchor as X,Y in source pixels.
    #[arg(long, value_parser = parse_anchor)]
    anchor: Option<[i64; 2]>,

    /// Filter width in pixels.
    #[arg(long)]
    width: Option<u32>,

    /// Filter height in pixels.
    #[arg(long)]
    height: Option<u32>,

    /// Jitter range for both axes: N, MIN..MAX or MIN..=MAX (inclusive).
    #[arg(long, value_parser = parse_range, allow_hyphen_values = true)]
    jitter: Option<JitterRange>,

    /// Standard deviation of the target peak.
    #[arg(long)]
    sigma: Option<f64>,

    /// Source pixels per filter pixel.
    #[arg(long)]
    scale: Option<u32>,

    /// Seed for the jitter generator.
    #[arg(long)]
    seed: Option<u64>,

    /// Constant added to the denominator before division.
    #[arg(long)]
    regularization: Option<f64>,

    /// Required source image size as WxH.
    #[arg(long, value_parser = parse_size)]
    source_size: Option<[u32; 2]>,

    /// Variable name for script output.
    #[arg(long)]
    variable: Option<String>,

    /// Write plain JSON even for .js paths.
    #[arg(long)]
    json: bool,

    /// Where to write the spatial-domain preview image.
    #[arg(long, conflicts_with = "all")]
    preview: Option<PathBuf>,
}

fn parse_range(s: &str) -> std::result::Result<JitterRange, String> {
    let number = |t: &str| t.trim(/**/).parse::<i32>(/**/).map_err(|e| format!("{t:?}: {e}"));

    if let Some((lo, hi)) = s.split_once("..") {
        let hi = hi.strip_prefix('=').unwrap_or(hi);
        return Ok(JitterRange::new(number(lo)?, number(hi)?));
    }

    let n = number(s)?.abs(/**/);
    Ok(JitterRange::new(-n, n))
}

fn parse_anchor(s: &str) -> std::result::Result<[i64; 2], String> {
    let (x, y) = s.split_once(',').ok_or("expected X,Y")?;
    let x = x.trim(/**/).parse(/**/).map_err(|e| format!("{x:?}: {e}"))?;
    let y = y.trim(/**/).parse(/**/).map_err(|e| format!("{y:?}: {e}"))?;
    Ok([x, y])
}

fn parse_size(s: &str) -> std::result::Result<[u32; 2], String> {
    let (w, h) = s.split_once(['x', 'X']).ok_or("expected WxH")?;
    let w = w.trim(/**/).parse(/**/).map_err(|e| format!("{w:?}: {e}"))?;
    let h = h.trim(/**/).parse(/**/).map_err(|e| format!("{h:?}: {e}"))?;
    Ok([w, h])
}

impl TrainArgs {
    fn config(&self) -> Result<TrainConfig> {
        let mut config = match &self.config {
            Some(path) => TrainConfig::from_file(path)
                .with_context(|| format!("reading config {}", path.display(/**/)))?,
            None => TrainConfig::default(/**/),
        };

        if let Some(landmark) = &self.landmark {
            config.landmark = landmark.clone(/**/);
        }
        if let Some(range) = self.jitter {
            config.jitter_x = range;
            config.jitter_y = range;
        }
        if let Some(variable) = &self.variable {
            config.variable = variable.clone(/**/);
        }

        config.anchor = self.anchor.or(config.anchor);
        config.width = self.width.unwrap_or(config.width);
        config.height = self.height.unwrap_or(config.height);
        config.sigma = self.sigma.unwrap_or(config.sigma);
        config.scale = self.scale.or(config.scale);
        config.seed = self.seed.or(config.seed);
        config.regularization = self.regularization.unwrap_or(config.regularization);
        config.source_size = self.source_size.or(config.source_size);
        Ok(config)
    }

    fn format(&self, path: &Path, variable: &str) -> AssetFormat {
        if self.json { AssetFormat::Json } else { AssetFormat::for_path(path, variable) }
    }
}

/// Everything one landmark writes, held until every landmark has trained.
struct Outputs {
    asset: FilterAsset,
    format: AssetFormat,
    out: PathBuf,
    preview: Option<(GrayImage, PathBuf)>,
    samples: usize,
}

fn train_one(
    images: &[GrayImage],
    config: &TrainConfig,
    format: AssetFormat,
    out: PathBuf,
    preview: Option<PathBuf>,
) -> Result<Outputs> {
    let (trainer, trained) = train_images(images, config)
        .with_context(|| format!("training {}", config.landmark))?;

    let asset = trained.asset(/**/)?;
    let preview = match preview {
        Some(path) => Some((trainer.preview(&trained)?, path)),
        None => None,
    };

    Ok(Outputs { asset, format, out, preview, samples: trained.samples })
}

fn write_outputs(outputs: &Outputs) -> Result<()> {
    let Outputs { asset, format, out, preview, samples } = outputs;
    asset.save(out, format)
        .with_context(|| format!("writing {}", out.display(/**/)))?;
    info!("wrote {} ({samples} samples)", out.display(/**/));

    if let Some((image, path)) = preview {
        image.save(path)
            .with_context(|| format!("writing preview {}", path.display(/**/)))?;
        info!("wrote preview {}", path.display(/**/));
    }

    Ok(())
}

fn run_train(args: &TrainArgs) -> Result<()> {
    let config = args.config(/**/)?;
    if args.all && config.anchor.is_some() {
        bail!("--anchor cannot be combined with --all");
    }

    let source_size = config.source_size.map(|[w, h]| (w, h));
    let images: Vec<GrayImage> = dataset::load_images(&args.data, source_size)
        .with_context(|| format!("loading training set {}", args.data.display(/**/)))?
        .into_iter(/**/)
        .map(|image| image.pixels)
        .collect(/**/);

    if !args.all {
        let format = args.format(&args.out, &config.variable);
        let outputs = train_one(&images, &config, format, args.out.clone(/**/), args.preview.clone(/**/))?;
        return write_outputs(&outputs);
    }

    // Train every landmark before touching the output directory
    let ext = if args.json { "json" } else { "js" };
    let mut pending = Vec::with_capacity(LANDMARKS.len(/**/));
    for mark in LANDMARKS {
        let name = format!("{}_filter", mark.name);
        let config = TrainConfig {
            landmark: mark.name.to_string(/**/),
            variable: name.clone(/**/),
            ..config.clone(/**/)
        };

        let out = args.out.join(format!("{name}.{ext}"));
        let preview = args.out.join(format!("{name}.bmp"));
        let format = args.format(&out, &config.variable);
        pending.push(train_one(&images, &config, format, out, Some(preview))?);
    }

    fs::create_dir_all(&args.out)
        .with_context(|| format!("creating {}", args.out.display(/**/)))?;
    for outputs in &pending {
        write_outputs(outputs)?;
    }

    Ok(())
}

fn run_inspect(asset: &Path, preview: Option<&Path>) -> Result<()> {
    let filter = FilterAsset::load(asset)
        .with_context(|| format!("loading {}", asset.display(/**/)))?;
    let spectrum = filter.filter(/**/)?;

    println!("{}: {}x{}", asset.display(/**/), filter.width, filter.height);
    println!("  non-finite bins: {}", synth::non_finite_bins(&spectrum));

    let energy: f64 = filter.denominator(/**/)?.iter(/**/).map(|v| v.re).sum(/**/);
    println!("  denominator energy: {energy:.6}");

    if let Some(path) = preview {
        let fourier = Fourier2d::new(&mut FftPlanner::new(/**/), filter.width, filter.height);
        synth::render_preview(&spectrum, &fourier)?
            .save(path)
            .with_context(|| format!("writing preview {}", path.display(/**/)))?;
    }

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse(/**/);

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default(/**/).default_filter_or(level)).init(/**/);

    match &cli.command {
        Commands::Train(args) => run_train(args),
        Commands::Landmarks => {
            println!("{:<10} {:>5} {:>5} {:>6}", "name", "x", "y", "scale");
            for mark in LANDMARKS {
                println!("{:<10} {:>5} {:>5} {:>6}", mark.name, mark.x, mark.y, mark.scale);
            }
            Ok(())
        }
        Commands::Inspect { asset, preview } => run_inspect(asset, preview.as_deref()),
    }
}
