//! OpenVINO implementation of the inference runtime capability
//!
//! OpenVINO reads the model straight from memory (TFLite and ONNX frontends),
//! compiles it for the configured device and keeps one infer request per
//! interpreter.

use std::time::Instant;

use openvino::{CompiledModel, Core, ElementType, InferRequest, Shape, Tensor};
use parking_lot::Mutex;
use tracing::{debug, info};

use super::runtime::{InferenceRuntime, Interpreter, RuntimeError};
use crate::config::InferenceConfig;

/// The native core handle. Every use goes through the runtime's mutex.
struct CoreCell(Core);

unsafe impl Send for CoreCell {}

/// OpenVINO runtime bound to one device ("CPU", "GPU", ...)
pub struct OpenVinoRuntime {
    core: Mutex<CoreCell>,
    device: String,
}

impl OpenVinoRuntime {
    pub fn new(config: &InferenceConfig) -> Result<Self, RuntimeError> {
        let core = Core::new()?;
        info!("OpenVINO core ready, device: {}", config.device);
        Ok(Self {
            core: Mutex::new(CoreCell(core)),
            device: config.device.clone(),
        })
    }

    pub fn device(&self) -> &str {
        &self.device
    }
}

impl InferenceRuntime for OpenVinoRuntime {
    type Interpreter = OpenVinoInterpreter;

    fn name(&self) -> &'static str {
        "openvino"
    }

    fn load(&self, model: &[u8]) -> Result<OpenVinoInterpreter, RuntimeError> {
        let start = Instant::now();

        let mut cell = self.core.lock();
        let core = &mut cell.0;
        let model = core.read_model_from_buffer(model, None)?;
        let mut compiled = core.compile_model(&model, self.device.as_str().into())?;
        let mut request = compiled.create_infer_request()?;

        // The request pre-allocates its tensors with the compiled static shapes.
        let input_shape = static_dims(
            request.get_input_tensor_by_index(0)?.get_shape()?.get_dimensions(),
        )?;
        let output_shape = static_dims(
            request.get_output_tensor_by_index(0)?.get_shape()?.get_dimensions(),
        )?;
        debug!("Compiled shapes: input {:?}, output {:?}", input_shape, output_shape);

        info!("OpenVINO compiled model for {} in {:?}", self.device, start.elapsed());

        Ok(OpenVinoInterpreter {
            request,
            _compiled: compiled,
            input_shape,
            output_shape,
        })
    }
}

/// Convert compiled dimensions, rejecting dynamic (negative) ones.
fn static_dims(dims: &[i64]) -> Result<Vec<usize>, RuntimeError> {
    dims.iter()
        .map(|&d| {
            usize::try_from(d).map_err(|_| {
                RuntimeError::from(format!("model has a dynamic dimension in {dims:?}"))
            })
        })
        .collect()
}

/// One compiled model plus its infer request.
///
/// The request is declared first so it is dropped before the compiled model
/// that created it.
pub struct OpenVinoInterpreter {
    request: InferRequest,
    _compiled: CompiledModel,
    input_shape: Vec<usize>,
    output_shape: Vec<usize>,
}

// invoke takes &mut self, so a request is never driven from two threads
unsafe impl Send for OpenVinoInterpreter {}

impl Interpreter for OpenVinoInterpreter {
    fn input_shape(&self) -> &[usize] {
        &self.input_shape
    }

    fn output_shape(&self) -> &[usize] {
        &self.output_shape
    }

    fn invoke(&mut self, input: &[f32]) -> Result<Vec<f32>, RuntimeError> {
        let dims: Vec<i64> = self.input_shape.iter().map(|&d| d as i64).collect();
        let shape = Shape::new(&dims)?;
        let mut tensor = Tensor::new(ElementType::F32, &shape)?;

        let raw = tensor.get_raw_data_mut()?;
        if raw.len() != input.len() * 4 {
            return Err(format!(
                "input tensor holds {} bytes, got {} floats",
                raw.len(),
                input.len()
            )
            .into());
        }
        for (dst, value) in raw.chunks_exact_mut(4).zip(input) {
            dst.copy_from_slice(&value.to_ne_bytes());
        }

        self.request.set_input_tensor(&tensor)?;
        self.request.infer()?;

        let output = self.request.get_output_tensor()?;
        let data = output
            .get_raw_data()?
            .chunks_exact(4)
            .map(|b| f32::from_ne_bytes([b[0], b[1], b[2], b[3]]))
            .collect();

        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_dims() {
        assert_eq!(static_dims(&[1, 224, 224, 3]).unwrap(), vec![1, 224, 224, 3]);
        assert_eq!(static_dims(&[1, 3, 224, 224]).unwrap(), vec![1, 3, 224, 224]);
        assert!(static_dims(&[-1, 224, 224, 3]).is_err());
    }
}
