//! Inference runtime capability
//!
//! The pipeline needs exactly four things from a native runtime: load model
//! bytes, bind an input tensor, run a forward pass, read an output tensor.
//! Each platform provides those through these two traits and nothing else,
//! so the preprocessing and result handling exist once.

use crate::error::BoxError;

/// Error reported by a runtime implementation.
pub type RuntimeError = BoxError;

/// A loaded model ready to execute forward passes.
///
/// Interpreters are not assumed to be thread-safe: `invoke` takes `&mut self`
/// and callers sharing one across threads must serialize access themselves.
pub trait Interpreter: Send {
    /// Shape of input 0 as compiled into the model
    fn input_shape(&self) -> &[usize];

    /// Shape of output 0 as compiled into the model
    fn output_shape(&self) -> &[usize];

    /// Bind `input` at input 0, run synchronously, and return output 0 flattened.
    fn invoke(&mut self, input: &[f32]) -> Result<Vec<f32>, RuntimeError>;
}

/// Factory for interpreters on one platform runtime.
pub trait InferenceRuntime: Send + Sync {
    type Interpreter: Interpreter;

    /// Short runtime name used in logs
    fn name(&self) -> &'static str;

    /// Build an interpreter from raw model bytes.
    fn load(&self, model: &[u8]) -> Result<Self::Interpreter, RuntimeError>;
}
