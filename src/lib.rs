//! Spiral Screening Library
//!
//! Turns a hand-drawn spiral image into the model's fixed 1x224x224x3 input
//! tensor, runs the screening model, and returns its single score.

pub mod config;
pub mod engine;
pub mod error;
pub mod service;
pub mod utils;

pub use config::Config;
pub use engine::{
    ImagePreprocessor, InferenceEngine, InferenceResult, InferenceRuntime, Interpreter,
    ModelHandle, TensorBuffer,
};
pub use error::{Result, ScreeningError};
pub use service::ScreeningService;
