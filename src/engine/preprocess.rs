//! Image preprocessing for the spiral model

use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView};
use serde::Deserialize;

use super::tensor::{TensorBuffer, INPUT_SIZE};
use crate::error::{Result, ScreeningError};

/// Resampling filter used when stretching to the input size.
///
/// Bilinear (`Triangle`) is what the model was trained against; the others
/// exist for experimentation and change the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizeFilter {
    Nearest,
    #[default]
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl ResizeFilter {
    pub fn as_filter_type(&self) -> FilterType {
        match self {
            ResizeFilter::Nearest => FilterType::Nearest,
            ResizeFilter::Triangle => FilterType::Triangle,
            ResizeFilter::CatmullRom => FilterType::CatmullRom,
            ResizeFilter::Gaussian => FilterType::Gaussian,
            ResizeFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResizeFilter::Nearest => "nearest",
            ResizeFilter::Triangle => "triangle",
            ResizeFilter::CatmullRom => "catmull_rom",
            ResizeFilter::Gaussian => "gaussian",
            ResizeFilter::Lanczos3 => "lanczos3",
        }
    }
}

/// Turns arbitrary images into model input tensors.
///
/// Pure and stateless: one preprocessor may be shared across threads and
/// encode independent images concurrently.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImagePreprocessor {
    filter: ResizeFilter,
}

impl ImagePreprocessor {
    pub fn new(filter: ResizeFilter) -> Self {
        Self { filter }
    }

    pub fn filter(&self) -> ResizeFilter {
        self.filter
    }

    /// Stretch the image to 224x224 and encode it.
    ///
    /// The stretch is direct (no crop, no padding, aspect ratio not kept).
    /// Alpha is dropped without compositing.
    pub fn encode(&self, image: &DynamicImage) -> Result<TensorBuffer> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(ScreeningError::decode_msg(format!(
                "image has no pixels ({width}x{height})"
            )));
        }

        let rgb = image.to_rgb8();
        let resized = if (width, height) == (INPUT_SIZE, INPUT_SIZE) {
            rgb
        } else {
            imageops::resize(&rgb, INPUT_SIZE, INPUT_SIZE, self.filter.as_filter_type())
        };

        TensorBuffer::from_rgb(&resized)
    }
}

/// Encode with the default (bilinear) preprocessor.
pub fn encode(image: &DynamicImage) -> Result<TensorBuffer> {
    ImagePreprocessor::default().encode(image)
}
