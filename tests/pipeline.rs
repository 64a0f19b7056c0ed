//! End-to-end pipeline tests against an in-process averaging model.

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb, Rgba};
use parking_lot::Mutex;

use spiralscore::engine::{
    InferenceEngine, InferenceRuntime, Interpreter, ModelHandle, RuntimeError, TensorBuffer,
    INPUT_SHAPE, OUTPUT_SHAPE, TENSOR_LEN,
};
use spiralscore::{Config, ScreeningError, ScreeningService};

const MAGIC: &[u8] = b"MEAN";

/// "Model" whose forward pass is the mean of every input value.
#[derive(Default)]
struct MeanRuntime {
    live: Arc<AtomicUsize>,
}

struct MeanInterpreter {
    live: Arc<AtomicUsize>,
}

impl Interpreter for MeanInterpreter {
    fn input_shape(&self) -> &[usize] {
        &INPUT_SHAPE
    }

    fn output_shape(&self) -> &[usize] {
        &OUTPUT_SHAPE
    }

    fn invoke(&mut self, input: &[f32]) -> Result<Vec<f32>, RuntimeError> {
        if input.len() != TENSOR_LEN {
            return Err(format!("bad input length {}", input.len()).into());
        }
        let sum: f64 = input.iter().map(|&v| v as f64).sum();
        Ok(vec![(sum / input.len() as f64) as f32])
    }
}

impl Drop for MeanInterpreter {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

impl InferenceRuntime for MeanRuntime {
    type Interpreter = MeanInterpreter;

    fn name(&self) -> &'static str {
        "mean"
    }

    fn load(&self, model: &[u8]) -> Result<MeanInterpreter, RuntimeError> {
        if model != MAGIC {
            return Err("truncated or corrupt model".into());
        }
        self.live.fetch_add(1, Ordering::SeqCst);
        Ok(MeanInterpreter {
            live: self.live.clone(),
        })
    }
}

fn solid(width: u32, height: u32, value: u8) -> DynamicImage {
    DynamicImage::ImageRgb8(ImageBuffer::from_pixel(width, height, Rgb([value, value, value])))
}

fn spiral(size: u32) -> DynamicImage {
    // dark strokes on white paper, roughly an Archimedean spiral
    let center = size as f32 / 2.0;
    let img = ImageBuffer::from_fn(size, size, |x, y| {
        let dx = x as f32 - center;
        let dy = y as f32 - center;
        let r = (dx * dx + dy * dy).sqrt();
        let theta = dy.atan2(dx) + std::f32::consts::PI;
        let phase = (r - theta * 4.0).rem_euclid(25.0);
        if phase < 3.0 {
            Rgba([20u8, 20, 30, 255])
        } else {
            Rgba([250u8, 250, 245, 255])
        }
    });
    DynamicImage::ImageRgba8(img)
}

#[test]
fn mid_gray_scores_half_at_any_resolution() {
    let runtime = MeanRuntime::default();
    let mut handle = ModelHandle::load(&runtime, MAGIC).unwrap();
    let engine = InferenceEngine::default();

    let expected = 128.0 / 255.0;
    for (w, h) in [(10, 10), (224, 224), (800, 600), (3, 900)] {
        let result = engine.analyze(&mut handle, &solid(w, h, 128)).unwrap();
        assert!((result.score - expected).abs() < 1e-6, "{w}x{h}: {}", result.score);
        assert!((result.score - 0.5).abs() < 0.01);
    }
}

#[test]
fn repeated_analysis_is_identical() {
    let runtime = MeanRuntime::default();
    let mut handle = ModelHandle::load(&runtime, MAGIC).unwrap();
    let engine = InferenceEngine::default();
    let image = spiral(517);

    let first = engine.analyze(&mut handle, &image).unwrap();
    for _ in 0..5 {
        assert_eq!(engine.analyze(&mut handle, &image).unwrap(), first);
    }
    assert!(first.score > 0.0 && first.score < 1.0);
}

#[test]
fn encoded_bytes_match_decoded_image() {
    let runtime = MeanRuntime::default();
    let mut handle = ModelHandle::load(&runtime, MAGIC).unwrap();
    let engine = InferenceEngine::default();
    let image = spiral(300);

    let mut png = Cursor::new(Vec::new());
    image.write_to(&mut png, ImageFormat::Png).unwrap();

    let from_image = engine.analyze(&mut handle, &image).unwrap();
    let from_bytes = engine.analyze_bytes(&mut handle, png.get_ref()).unwrap();
    assert_eq!(from_image, from_bytes);
}

#[test]
fn truncated_model_is_load_error() {
    let runtime = MeanRuntime::default();
    let cases: [&[u8]; 3] = [&MAGIC[..2], &[], b"MEANX"];
    for bytes in cases {
        let err = ModelHandle::load(&runtime, bytes).unwrap_err();
        assert!(matches!(err, ScreeningError::Load { .. }), "{err}");
    }
    assert_eq!(runtime.live.load(Ordering::SeqCst), 0);
}

#[test]
fn released_handle_never_returns_a_score() {
    let runtime = MeanRuntime::default();
    let mut handle = ModelHandle::load(&runtime, MAGIC).unwrap();
    handle.release().unwrap();

    assert!(matches!(
        handle.run(&TensorBuffer::zeros()),
        Err(ScreeningError::InvalidState { .. })
    ));
    assert!(matches!(
        InferenceEngine::default().analyze(&mut handle, &solid(5, 5, 200)),
        Err(ScreeningError::InvalidState { .. })
    ));
    assert!(matches!(
        handle.release(),
        Err(ScreeningError::InvalidState { .. })
    ));
}

#[test]
fn handle_shared_behind_a_lock() {
    let runtime = MeanRuntime::default();
    let handle = Arc::new(Mutex::new(ModelHandle::load(&runtime, MAGIC).unwrap()));
    let engine = InferenceEngine::default();

    let workers: Vec<_> = (0..4u8)
        .map(|i| {
            let handle = handle.clone();
            thread::spawn(move || {
                // preprocessing runs unlocked; only the forward pass is serialized
                let value = 60 * i;
                let tensor = engine.preprocessor().encode(&solid(40, 40, value)).unwrap();
                let mut guard = handle.lock();
                let result = engine.score_tensor(&mut *guard, &tensor).unwrap();
                (value, result.score)
            })
        })
        .collect();

    for worker in workers {
        let (value, score) = worker.join().unwrap();
        assert!((score - value as f32 / 255.0).abs() < 1e-6);
    }
}

#[test]
fn service_round_trip_through_model_file() {
    let path = std::env::temp_dir().join(format!("spiralscore-it-{}.bin", std::process::id()));
    std::fs::write(&path, MAGIC).unwrap();

    let mut config = Config::default();
    config.model.path = path.clone();
    let runtime = MeanRuntime::default();
    let live = runtime.live.clone();
    let service = ScreeningService::new(runtime, &config);

    service.initialize().unwrap();
    let report = service.analyze(&solid(10, 10, 255)).unwrap();
    assert_eq!(report.score, 1.0);

    service.release().unwrap();
    assert_eq!(live.load(Ordering::SeqCst), 0);
    assert!(matches!(
        service.analyze(&solid(10, 10, 255)),
        Err(ScreeningError::InvalidState { .. })
    ));

    std::fs::remove_file(path).ok();
}
