//! Model session lifecycle
//!
//! A [`ModelHandle`] owns one interpreter. It moves through
//! `Loaded -> Released` exactly once; an unloaded handle never exists because
//! `load` either returns a loaded handle or an error.

use std::fmt;
use std::path::Path;
use std::time::Instant;

use tracing::{debug, info, warn};

use super::runtime::{InferenceRuntime, Interpreter};
use super::tensor::{TensorBuffer, INPUT_SHAPE, OUTPUT_SHAPE};
use crate::error::{Result, ScreeningError};

/// Lifecycle state of a handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleState {
    Loaded,
    Released,
}

impl HandleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            HandleState::Loaded => "loaded",
            HandleState::Released => "released",
        }
    }
}

/// Raw output 0 of a forward pass
#[derive(Debug, Clone, PartialEq)]
pub struct OutputTensor {
    pub shape: Vec<usize>,
    pub data: Vec<f32>,
}

impl OutputTensor {
    /// The single score of a `[1, 1]` output.
    pub fn scalar(&self) -> Result<f32> {
        match self.data.as_slice() {
            [score] if score.is_finite() => Ok(*score),
            [score] => Err(ScreeningError::inference_msg(format!(
                "model produced a non-finite score ({score})"
            ))),
            other => Err(ScreeningError::inference_msg(format!(
                "expected exactly one output value, got {}",
                other.len()
            ))),
        }
    }
}

/// Exclusively owned, loaded model.
///
/// Dropping a loaded handle releases it, so every exit path frees the native
/// interpreter. `run` needs `&mut self`; share a handle across threads only
/// behind a lock.
pub struct ModelHandle<I: Interpreter> {
    interpreter: Option<I>,
    runtime: &'static str,
}

impl<I: Interpreter> ModelHandle<I> {
    /// Load a model from bytes.
    ///
    /// The interpreter must report input `[1, 224, 224, 3]` and output `[1, 1]`,
    /// and must survive one warm-up pass on a black image. Anything else is a
    /// load error and no handle is returned.
    pub fn load<R>(runtime: &R, model: &[u8]) -> Result<Self>
    where
        R: InferenceRuntime<Interpreter = I>,
    {
        if model.is_empty() {
            return Err(ScreeningError::load_msg("model bytes are empty"));
        }

        let start = Instant::now();
        let interpreter = runtime
            .load(model)
            .map_err(|e| ScreeningError::load(format!("{} rejected the model", runtime.name()), e))?;

        check_shape("input", interpreter.input_shape(), &INPUT_SHAPE)?;
        check_shape("output", interpreter.output_shape(), &OUTPUT_SHAPE)?;

        let mut handle = Self {
            interpreter: Some(interpreter),
            runtime: runtime.name(),
        };

        // Some runtimes only validate bindings on the first forward pass.
        handle.run(&TensorBuffer::zeros()).map_err(|e| match e {
            ScreeningError::Inference { message, source } => ScreeningError::Load {
                message: format!("warm-up pass failed: {message}"),
                source,
            },
            other => other,
        })?;

        info!(
            "Model loaded via {} ({} bytes) in {:?}",
            runtime.name(),
            model.len(),
            start.elapsed()
        );
        Ok(handle)
    }

    /// Read a model artifact from disk and load it.
    pub fn load_file<R>(runtime: &R, path: impl AsRef<Path>) -> Result<Self>
    where
        R: InferenceRuntime<Interpreter = I>,
    {
        let path = path.as_ref();
        info!("Loading model from {}", path.display());
        let bytes = std::fs::read(path).map_err(|e| {
            ScreeningError::load(format!("cannot read model file {}", path.display()), e)
        })?;
        Self::load(runtime, &bytes)
    }

    pub fn state(&self) -> HandleState {
        if self.interpreter.is_some() {
            HandleState::Loaded
        } else {
            HandleState::Released
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.interpreter.is_some()
    }

    pub fn runtime_name(&self) -> &'static str {
        self.runtime
    }

    /// Bind `input`, run one forward pass, and read output 0.
    pub fn run(&mut self, input: &TensorBuffer) -> Result<OutputTensor> {
        let interpreter = self
            .interpreter
            .as_mut()
            .ok_or_else(|| ScreeningError::invalid_state("run on a released model handle"))?;

        let start = Instant::now();
        let data = interpreter
            .invoke(input.as_slice())
            .map_err(|e| ScreeningError::inference("forward pass failed", e))?;
        debug!("Forward pass took {:?}", start.elapsed());

        let shape = interpreter.output_shape().to_vec();
        let expected: usize = shape.iter().product();
        if data.len() != expected {
            return Err(ScreeningError::inference_msg(format!(
                "output has {} values, shape {:?} needs {}",
                data.len(),
                shape,
                expected
            )));
        }

        Ok(OutputTensor { shape, data })
    }

    /// Free the interpreter. A second release is an error, not a no-op.
    pub fn release(&mut self) -> Result<()> {
        match self.interpreter.take() {
            Some(interpreter) => {
                drop(interpreter);
                info!("Released {} model handle", self.runtime);
                Ok(())
            }
            None => Err(ScreeningError::invalid_state(
                "model handle was already released",
            )),
        }
    }
}

impl<I: Interpreter> Drop for ModelHandle<I> {
    fn drop(&mut self) {
        if self.interpreter.take().is_some() {
            debug!("Releasing {} model handle on drop", self.runtime);
        }
    }
}

impl<I: Interpreter> fmt::Debug for ModelHandle<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelHandle")
            .field("runtime", &self.runtime)
            .field("state", &self.state())
            .finish()
    }
}

fn check_shape(which: &str, actual: &[usize], expected: &[usize]) -> Result<()> {
    if actual != expected {
        warn!("Model {} shape {:?} does not match {:?}", which, actual, expected);
        return Err(ScreeningError::load_msg(format!(
            "model {which} shape {actual:?} does not match {expected:?}"
        )));
    }
    Ok(())
}
