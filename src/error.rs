//! Error types for the screening pipeline.
//!
//! Every failure in the pipeline surfaces as one of four kinds. None of them is
//! ever turned into a default score: a caller that receives an error has no
//! score for that image.

use thiserror::Error;

/// Boxed error coming from a collaborator (image codec, inference runtime, I/O).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, ScreeningError>;

/// Errors produced by the preprocessing and inference pipeline.
#[derive(Error, Debug)]
pub enum ScreeningError {
    /// The image could not be interpreted as pixel data.
    #[error("decode failed: {message}")]
    Decode {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// The model bytes are missing, corrupt, or incompatible with the fixed shapes.
    #[error("model load failed: {message}")]
    Load {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// The forward pass failed or produced malformed output.
    #[error("inference failed: {message}")]
    Inference {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// An operation was attempted on a handle that is not loaded.
    #[error("invalid state: {message}")]
    InvalidState { message: String },
}

impl ScreeningError {
    pub fn decode(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Decode {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn decode_msg(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
            source: None,
        }
    }

    pub fn load(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Load {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn load_msg(message: impl Into<String>) -> Self {
        Self::Load {
            message: message.into(),
            source: None,
        }
    }

    pub fn inference(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Inference {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn inference_msg(message: impl Into<String>) -> Self {
        Self::Inference {
            message: message.into(),
            source: None,
        }
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Short name of the error kind, used in logs and CLI reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Decode { .. } => "decode",
            Self::Load { .. } => "load",
            Self::Inference { .. } => "inference",
            Self::InvalidState { .. } => "invalid_state",
        }
    }
}
