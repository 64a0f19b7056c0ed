//! Screening Service - host-facing surface
//!
//! Wraps one model handle for the lifetime of a screening session:
//! `initialize`, `analyze`, `release`. The handle is not thread-safe, so it
//! lives behind a mutex; preprocessing runs outside the lock.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use image::DynamicImage;
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::config::Config;
use crate::engine::{
    ImagePreprocessor, InferenceEngine, InferenceRuntime, Interpreter, ModelHandle, TensorBuffer,
};
use crate::error::{Result, ScreeningError};
use crate::utils::decode_image;

use super::types::{ScoreReport, ServiceStatus};

enum ModelSlot<I: Interpreter> {
    /// Nothing loaded yet; the first analyze loads lazily
    Unloaded,
    Loaded(ModelHandle<I>),
    /// Released by the host; only an explicit `initialize` loads again
    Released,
}

impl<I: Interpreter> ModelSlot<I> {
    fn as_str(&self) -> &'static str {
        match self {
            ModelSlot::Unloaded => "unloaded",
            ModelSlot::Loaded(_) => "loaded",
            ModelSlot::Released => "released",
        }
    }
}

/// Spiral screening service
pub struct ScreeningService<R: InferenceRuntime> {
    runtime: R,
    engine: InferenceEngine,
    model_path: PathBuf,
    slot: Mutex<ModelSlot<R::Interpreter>>,
}

impl<R: InferenceRuntime> ScreeningService<R> {
    /// Create a new service. No model is loaded until `initialize` or the
    /// first `analyze`.
    pub fn new(runtime: R, config: &Config) -> Self {
        let engine = InferenceEngine::new(ImagePreprocessor::new(config.preprocess.filter));
        Self {
            runtime,
            engine,
            model_path: config.model.path.clone(),
            slot: Mutex::new(ModelSlot::Unloaded),
        }
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    /// Load the model if it is not loaded. Also loads a fresh handle after
    /// `release`.
    pub fn initialize(&self) -> Result<()> {
        let mut slot = self.slot.lock();
        self.ensure_loaded(&mut slot)
    }

    pub fn is_loaded(&self) -> bool {
        matches!(*self.slot.lock(), ModelSlot::Loaded(_))
    }

    pub fn status(&self) -> ServiceStatus {
        ServiceStatus {
            version: env!("CARGO_PKG_VERSION").to_string(),
            runtime: self.runtime.name().to_string(),
            model_path: self.model_path.display().to_string(),
            model_state: self.slot.lock().as_str().to_string(),
        }
    }

    /// Score a decoded image.
    pub fn analyze(&self, image: &DynamicImage) -> Result<ScoreReport> {
        let start = Instant::now();
        let tensor = self.engine.preprocessor().encode(image)?;
        self.score(&tensor, start)
    }

    /// Decode and score an encoded image.
    pub fn analyze_bytes(&self, data: &[u8]) -> Result<ScoreReport> {
        let start = Instant::now();
        let image = decode_image(data)?;
        let tensor = self.engine.preprocessor().encode(&image)?;
        self.score(&tensor, start)
    }

    /// Release the model handle. Fails if nothing is loaded.
    pub fn release(&self) -> Result<()> {
        let mut slot = self.slot.lock();
        match std::mem::replace(&mut *slot, ModelSlot::Released) {
            ModelSlot::Loaded(mut handle) => handle.release(),
            previous => {
                let state = previous.as_str();
                *slot = previous;
                Err(ScreeningError::invalid_state(format!(
                    "release with no loaded model ({state})"
                )))
            }
        }
    }

    fn score(&self, tensor: &TensorBuffer, start: Instant) -> Result<ScoreReport> {
        let mut slot = self.slot.lock();
        if matches!(*slot, ModelSlot::Released) {
            return Err(ScreeningError::invalid_state(
                "analyze after release; call initialize first",
            ));
        }
        self.ensure_loaded(&mut slot)?;

        let ModelSlot::Loaded(handle) = &mut *slot else {
            return Err(ScreeningError::invalid_state("model is not loaded"));
        };
        let result = self.engine.score_tensor(handle, tensor)?;

        let inference_time_ms = start.elapsed().as_millis() as u64;
        info!("Spiral scored {:.4} in {}ms", result.score, inference_time_ms);
        Ok(ScoreReport {
            score: result.score,
            inference_time_ms,
        })
    }

    fn ensure_loaded(&self, slot: &mut ModelSlot<R::Interpreter>) -> Result<()> {
        if matches!(slot, ModelSlot::Loaded(_)) {
            return Ok(());
        }
        debug!("Model slot is {}, loading", slot.as_str());
        let handle = ModelHandle::load_file(&self.runtime, &self.model_path)?;
        *slot = ModelSlot::Loaded(handle);
        Ok(())
    }
}

impl<R> ScreeningService<R>
where
    R: InferenceRuntime + 'static,
    R::Interpreter: 'static,
{
    /// Decode and score on the blocking thread pool.
    pub async fn analyze_async(self: &Arc<Self>, data: Vec<u8>) -> Result<ScoreReport> {
        let service = self.clone();
        tokio::task::spawn_blocking(move || service.analyze_bytes(&data))
            .await
            .map_err(|e| ScreeningError::inference("analysis task failed", e))?
    }
}
