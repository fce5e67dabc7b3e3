//! End-to-end training scenarios over synthetic faces.

use image::{GrayImage, Luma};
use landmark_mosse::{
    train_directory, train_images, AssetFormat, CropSpec, Error, FilterAsset, Fourier2d, Jitter, JitterRange, TrainConfig,
    TrainPlan, Trainer,
};
use rustfft::FftPlanner;
use std::fs;
use std::path::PathBuf;

const SOURCE: (u32, u32) = (96, 80);

/// Smooth synthetic face: two dark blobs for eyes on a textured background.
fn synthetic_face(variant: u32) -> GrayImage {
    let eyes = [(43.0, 34.0), (73.0, 33.0)];
    GrayImage::from_fn(SOURCE.0, SOURCE.1, |x, y| {
        let texture = ((x * 3 + y * 5 + variant * 11) % 23) as f64;
        let shade = eyes.iter().fold(0.0, |acc, &(ex, ey)| {
            let d2 = (x as f64 - ex).powi(2) + (y as f64 - ey).powi(2);
            acc + 150.0 * (-d2 / 30.0).exp()
        });
        Luma([(200.0 - shade + texture).clamp(0.0, 255.0) as u8])
    })
}

fn plan() -> TrainPlan {
    TrainConfig { jitter_x: JitterRange::new(-5, 5), jitter_y: JitterRange::new(-5, 5), ..TrainConfig::default() }
        .plan()
        .unwrap()
}

fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("landmark-mosse-it-{name}-{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn duplicate_sample_doubles_sums() {
    let trainer = Trainer::new(plan()).unwrap();
    let face = synthetic_face(0);
    let jitter = Jitter { x: 2, y: -3 };

    let once = trainer.train(&[face.clone()], &[jitter]).unwrap();
    let twice = trainer.train(&[face.clone(), face], &[jitter, jitter]).unwrap();

    assert_eq!(twice.samples, 2);
    assert_eq!(twice.top, once.top.mapv(|v| v * 2.0));
    assert_eq!(twice.bottom, once.bottom.mapv(|v| v * 2.0));

    let (a, b) = (once.asset().unwrap(), twice.asset().unwrap());
    for (x, y) in a.top.real.iter().zip(&b.top.real) {
        assert_eq!(x * 2.0, *y);
    }
    for (x, y) in a.bottom.real.iter().zip(&b.bottom.real) {
        assert_eq!(x * 2.0, *y);
    }
}

#[test]
fn flat_image_is_rejected() {
    let trainer = Trainer::new(plan()).unwrap();
    let flat = GrayImage::from_pixel(SOURCE.0, SOURCE.1, Luma([120]));
    let err = trainer.train(&[flat], &[Jitter::default()]).unwrap_err();
    assert!(matches!(err, Error::ZeroNormSample { index: 0 }));
}

#[test]
fn crop_outside_image_is_rejected() {
    let trainer = Trainer::new(plan()).unwrap();
    let small = GrayImage::from_fn(50, 40, |x, y| Luma([(x + y) as u8]));
    let err = trainer.train(&[small], &[Jitter::default()]).unwrap_err();
    assert!(matches!(err, Error::CropOutOfBounds { .. }));
}

#[test]
fn single_sample_filter_recovers_target() {
    let plan = plan();
    let trainer = Trainer::new(plan.clone()).unwrap();
    let face = synthetic_face(4);
    let jitter = Jitter { x: -4, y: 3 };
    let trained = trainer.train(&[face.clone()], &[jitter]).unwrap();

    // Correlating the training sample with its own filter returns its target
    let (observation, _) = trainer.sample_spectra(&face, jitter, 0).unwrap();
    let product = &observation * &trained.filter;
    let fourier = Fourier2d::new(&mut FftPlanner::new(), 32, 32);
    let response = fourier.inverse(&product).unwrap();

    let (mut best, mut peak) = (f64::MIN, (0, 0));
    for ((r, c), v) in response.indexed_iter() {
        if v.re > best {
            best = v.re;
            peak = (c, r);
        }
    }

    let (nux, nuy) = plan.crop.displacement(jitter);
    assert_eq!(peak, (nux as usize, nuy as usize));
    assert!((best - 1.0).abs() < 1e-6);
}

#[test]
fn whole_face_scale() {
    let config = TrainConfig { landmark: "face".into(), seed: Some(3), jitter_x: JitterRange::new(-2, 2), jitter_y: JitterRange::new(-2, 2), ..TrainConfig::default() };
    let plan = config.plan().unwrap();
    assert_eq!(plan.crop, CropSpec::new(32, 32, 2));

    let trainer = Trainer::new(plan).unwrap();
    let faces: Vec<_> = (0..3).map(|v| {
        let small = synthetic_face(v);
        image::imageops::resize(&small, 160, 130, image::imageops::FilterType::Triangle)
    }).collect();
    let jitters = trainer.draw_jitters(3, 3);
    let trained = trainer.train(&faces, &jitters).unwrap();
    assert_eq!(trained.filter.dim(), (32, 32));
}

#[test]
fn seeded_runs_are_byte_identical() {
    let dir = scratch("seeded");
    let data = dir.join("data");
    fs::create_dir_all(&data).unwrap();
    for v in 0..40 {
        synthetic_face(v).save(data.join(format!("face_{v:02}.png"))).unwrap();
    }

    let config = TrainConfig { seed: Some(42), ..TrainConfig::default() };
    let format = AssetFormat::Script { variable: "left_eye_filter".into() };

    let (_, first) = train_directory(&data, &config).unwrap();
    let (_, second) = train_directory(&data, &config).unwrap();
    first.asset().unwrap().save(&dir.join("a.js"), &format).unwrap();
    second.asset().unwrap().save(&dir.join("b.js"), &format).unwrap();

    let a = fs::read(dir.join("a.js")).unwrap();
    let b = fs::read(dir.join("b.js")).unwrap();
    assert_eq!(a, b);

    let loaded = FilterAsset::load(&dir.join("a.js")).unwrap();
    assert_eq!((loaded.width, loaded.height), (32, 32));
    assert_eq!(loaded.real.len(), 32 * 32);
    assert_eq!(loaded, first.asset().unwrap());

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn thread_count_does_not_change_output() {
    // Enough faces for three partial sums
    let faces: Vec<GrayImage> = (0..40).map(synthetic_face).collect();
    let config = TrainConfig { seed: Some(7), ..TrainConfig::default() };
    let format = AssetFormat::Script { variable: "left_eye_filter".into() };

    let render = |threads: usize| {
        let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build().unwrap();
        pool.install(|| {
            let (_, trained) = train_images(&faces, &config).unwrap();
            assert_eq!(trained.samples, 40);
            trained.asset().unwrap().render(&format).unwrap()
        })
    };

    let single = render(1);
    let pooled = render(4);
    assert_eq!(single.as_bytes(), pooled.as_bytes());
}

#[test]
fn different_seeds_change_jitter() {
    let trainer = Trainer::new(plan()).unwrap();
    assert_ne!(trainer.draw_jitters(16, 1), trainer.draw_jitters(16, 2));
}
