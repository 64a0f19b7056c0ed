//! Inference engine module
//!
//! Provides the spiral scoring pipeline:
//! - Fixed-layout tensor codec and image preprocessing
//! - A narrow runtime capability each platform implements
//! - Model handle lifecycle and scoring

pub mod tensor;
pub mod preprocess;
pub mod runtime;
pub mod session;
pub mod inference;
#[cfg(feature = "openvino")]
pub mod openvino_runtime;

pub use tensor::{TensorBuffer, INPUT_SIZE, INPUT_SHAPE, OUTPUT_SHAPE, TENSOR_LEN};
pub use preprocess::{ImagePreprocessor, ResizeFilter};
pub use runtime::{InferenceRuntime, Interpreter, RuntimeError};
pub use session::{HandleState, ModelHandle, OutputTensor};
pub use inference::{InferenceEngine, InferenceResult};
#[cfg(feature = "openvino")]
pub use openvino_runtime::OpenVinoRuntime;
