use image::GrayImage;
use numpy::PyReadonlyArray2;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::asset::AssetFormat;
use crate::config::TrainConfig;
use crate::crop::JitterRange;
use crate::pipeline;

type Unit = ();
const UNIT: Unit = ();

#[inline]
fn to_py_err(e: crate::Error) -> PyErr {
    PyValueError::new_err(e.to_string(/**/))
}

/// Trains a filter from grayscale faces and returns the asset as JSON.
/// `scale` defaults to the landmark table's value.
#[pyfunction]
#[pyo3(signature = (images, landmark = "left_eye", anchor = None, width = 32, height = 32, jitter = 5, seed = 0, sigma = 2.0, regularization = 0.0, scale = None))]
#[allow(clippy::too_many_arguments)]
fn train_filter(
    images: Vec<PyReadonlyArray2<u8>>,
    landmark: &str,
    anchor: Option<[i64; 2]>,
    width: u32,
    height: u32,
    jitter: i32,
    seed: u64,
    sigma: f64,
    regularization: f64,
    scale: Option<u32>,
) -> PyResult<String> {
    let config = TrainConfig {
        landmark: landmark.to_string(/**/),
        anchor,
        width,
        height,
        jitter_x: JitterRange::new(-jitter, jitter),
        jitter_y: JitterRange::new(-jitter, jitter),
        sigma,
        seed: Some(seed),
        regularization,
        scale,
        ..TrainConfig::default(/**/)
    };

    let faces: Vec<GrayImage> = images.iter(/**/).map(|array| {
        let view = array.as_array(/**/);
        let (rows, cols) = view.dim(/**/);
        GrayImage::from_fn(cols as u32, rows as u32, |x, y| image::Luma([view[(y as usize, x as usize)]]))
    }).collect(/**/);

    let (_, trained) = pipeline::train_images(&faces, &config).map_err(to_py_err)?;
    let asset = trained.asset(/**/).map_err(to_py_err)?;
    asset.render(&AssetFormat::Json).map_err(to_py_err)
}

#[pymodule]
fn landmark_mosse(m: &Bound<'_, PyModule>) -> PyResult<Unit> {
    m.add_function(wrap_pyfunction!(train_filter, m)?)?;
    Ok(UNIT)
}
