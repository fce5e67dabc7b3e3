use image::{GrayImage, ImageFormat};
use log::{info, warn};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// One decoded grayscale training face.
#[derive(Debug, Clone)]
pub struct TrainingImage {
    pub path: PathBuf,
    pub pixels: GrayImage,
}

/// Image files directly inside `dir`, sorted by file name.
///
/// Entries whose extension no decoder claims are skipped with a warning.
pub fn list_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new(/**/);

    for entry in fs::read_dir(dir)? {
        let path = entry?.path(/**/);
        if !path.is_file(/**/) {
            continue;
        }
        if ImageFormat::from_path(&path).is_err(/**/) {
            warn!("skipping {}: not a recognized image format", path.display(/**/));
            continue;
        }
        paths.push(path);
    }

    paths.sort(/**/);
    Ok(paths)
}

/// Decodes every image in `dir` to 8-bit grayscale.
///
/// With `source_size` set, any image of different dimensions fails the load.
pub fn load_images(dir: &Path, source_size: Option<(u32, u32)>) -> Result<Vec<TrainingImage>> {
    let paths = list_images(dir)?;
    if paths.is_empty(/**/) {
        return Err(Error::EmptyTrainingSet);
    }

    let images = paths.into_par_iter(/**/).map(|path| -> Result<TrainingImage> {
        let pixels = image::open(&path)?.into_luma8(/**/);

        if let Some(expected) = source_size {
            let actual = pixels.dimensions(/**/);
            if actual != expected {
                return Err(Error::SourceSizeMismatch { path, expected, actual });
            }
        }

        Ok(TrainingImage { path, pixels })
    }).collect::<Result<Vec<_>>>(/**/)?;

    info!("loaded {} training images from {}", images.len(/**/), dir.display(/**/));
    Ok(images)
}
