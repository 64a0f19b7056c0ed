//! Spiral scoring: preprocessing composed with a model session

use std::path::Path;
use std::time::Instant;

use image::DynamicImage;
use serde::Serialize;
use tracing::debug;

use super::preprocess::ImagePreprocessor;
use super::runtime::Interpreter;
use super::session::ModelHandle;
use super::tensor::TensorBuffer;
use crate::error::{Result, ScreeningError};
use crate::utils::{decode_image, load_image_file};

/// Score produced by one analysis.
///
/// The range is whatever the model defines (the bundled model emits a
/// probability-like value in `[0, 1]`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InferenceResult {
    pub score: f32,
}

/// Stateless scorer. Holds only the preprocessing policy; the model handle is
/// passed in per call so ownership stays with whoever loaded it.
#[derive(Debug, Clone, Copy, Default)]
pub struct InferenceEngine {
    preprocessor: ImagePreprocessor,
}

impl InferenceEngine {
    pub fn new(preprocessor: ImagePreprocessor) -> Self {
        Self { preprocessor }
    }

    pub fn preprocessor(&self) -> &ImagePreprocessor {
        &self.preprocessor
    }

    /// Encode `image`, run it through `handle`, and return the score.
    pub fn analyze<I: Interpreter>(
        &self,
        handle: &mut ModelHandle<I>,
        image: &DynamicImage,
    ) -> Result<InferenceResult> {
        if !handle.is_loaded() {
            return Err(ScreeningError::invalid_state(
                "analyze on a released model handle",
            ));
        }

        let start = Instant::now();
        let tensor = self.preprocessor.encode(image)?;
        debug!(
            "Preprocessed {}x{} image in {:?}",
            image.width(),
            image.height(),
            start.elapsed()
        );

        self.score_tensor(handle, &tensor)
    }

    /// Decode an encoded image (PNG, JPEG, ...) and analyze it.
    pub fn analyze_bytes<I: Interpreter>(
        &self,
        handle: &mut ModelHandle<I>,
        data: &[u8],
    ) -> Result<InferenceResult> {
        let image = decode_image(data)?;
        self.analyze(handle, &image)
    }

    /// Read an image file and analyze it.
    pub fn analyze_path<I: Interpreter>(
        &self,
        handle: &mut ModelHandle<I>,
        path: impl AsRef<Path>,
    ) -> Result<InferenceResult> {
        let image = load_image_file(path)?;
        self.analyze(handle, &image)
    }

    /// Run an already encoded tensor and extract the single score.
    pub fn score_tensor<I: Interpreter>(
        &self,
        handle: &mut ModelHandle<I>,
        tensor: &TensorBuffer,
    ) -> Result<InferenceResult> {
        let output = handle.run(tensor)?;
        let score = output.scalar()?;
        debug!("Spiral score: {:.6}", score);
        Ok(InferenceResult { score })
    }
}
