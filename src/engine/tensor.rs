//! Fixed-shape input tensor for the spiral model
//!
//! The model was trained on 224x224 RGB images laid out NHWC: pixels in
//! row-major order, each pixel contributing R, G, B as `value / 255.0`.
//! Any other layout silently corrupts the score, so the layout lives here
//! and nowhere else.

use image::RgbImage;
use ndarray::{Array4, ArrayView4};

use crate::error::{Result, ScreeningError};

/// Spatial input size (width and height) of the model
pub const INPUT_SIZE: u32 = 224;

/// Channels per pixel (R, G, B)
pub const CHANNELS: usize = 3;

/// Compiled input shape `[batch, height, width, channels]`
pub const INPUT_SHAPE: [usize; 4] = [1, INPUT_SIZE as usize, INPUT_SIZE as usize, CHANNELS];

/// Compiled output shape `[batch, score]`
pub const OUTPUT_SHAPE: [usize; 2] = [1, 1];

/// Number of floats in one input tensor
pub const TENSOR_LEN: usize = INPUT_SIZE as usize * INPUT_SIZE as usize * CHANNELS;

/// A 1x224x224x3 float tensor holding normalized RGB values.
///
/// Construction always checks the shape, so a `TensorBuffer` in hand is
/// guaranteed to be exactly `TENSOR_LEN` floats in standard layout.
#[derive(Debug, Clone, PartialEq)]
pub struct TensorBuffer {
    data: Array4<f32>,
}

impl TensorBuffer {
    /// Encode an RGB image that is already at the model's input size.
    pub fn from_rgb(image: &RgbImage) -> Result<Self> {
        let (width, height) = image.dimensions();
        if width != INPUT_SIZE || height != INPUT_SIZE {
            return Err(ScreeningError::decode_msg(format!(
                "expected {INPUT_SIZE}x{INPUT_SIZE} pixels, got {width}x{height}"
            )));
        }

        let shape = (INPUT_SHAPE[0], INPUT_SHAPE[1], INPUT_SHAPE[2], INPUT_SHAPE[3]);
        let data = Array4::from_shape_fn(shape, |(_, y, x, c)| {
            let pixel = image.get_pixel(x as u32, y as u32);
            pixel[c] as f32 / 255.0
        });

        Ok(Self { data })
    }

    /// Rebuild a buffer from flat NHWC data.
    pub fn from_vec(values: Vec<f32>) -> Result<Self> {
        if let Some(bad) = values.iter().find(|v| !(0.0..=1.0).contains(*v)) {
            return Err(ScreeningError::decode_msg(format!(
                "tensor value {bad} is outside [0, 1]"
            )));
        }

        let shape = (INPUT_SHAPE[0], INPUT_SHAPE[1], INPUT_SHAPE[2], INPUT_SHAPE[3]);
        let data = Array4::from_shape_vec(shape, values)
            .map_err(|e| ScreeningError::decode("tensor data does not match 1x224x224x3", e))?;

        Ok(Self { data })
    }

    /// An all-black input, used to warm up a freshly loaded model.
    pub fn zeros() -> Self {
        let shape = (INPUT_SHAPE[0], INPUT_SHAPE[1], INPUT_SHAPE[2], INPUT_SHAPE[3]);
        Self {
            data: Array4::zeros(shape),
        }
    }

    /// Flat row-major view, `R, G, B` per pixel.
    pub fn as_slice(&self) -> &[f32] {
        self.data
            .as_slice()
            .expect("tensor buffer is always in standard layout")
    }

    pub fn view(&self) -> ArrayView4<'_, f32> {
        self.data.view()
    }

    /// Normalized `[r, g, b]` at pixel `(x, y)`
    pub fn pixel(&self, x: usize, y: usize) -> [f32; 3] {
        [
            self.data[[0, y, x, 0]],
            self.data[[0, y, x, 1]],
            self.data[[0, y, x, 2]],
        ]
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// Native-endian bytes of the tensor, the form a runtime copies into its
    /// input binding.
    pub fn to_ne_bytes(&self) -> Vec<u8> {
        self.as_slice()
            .iter()
            .flat_map(|v| v.to_ne_bytes())
            .collect()
    }
}
