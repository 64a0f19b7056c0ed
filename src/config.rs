//! Screening configuration

use anyhow::{bail, Context};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::engine::preprocess::ResizeFilter;
use crate::engine::tensor::INPUT_SIZE;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub model: ModelConfig,
    pub inference: InferenceConfig,
    pub preprocess: PreprocessConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub path: PathBuf,
    pub input_size: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    pub device: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    pub filter: ResizeFilter,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("models/spiral_model01.tflite"),
            input_size: INPUT_SIZE,
        }
    }
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            device: "CPU".to_string(),
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content).context("parsing config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn default_path() -> &'static str {
        "config.toml"
    }

    /// The model input size is compiled into the model; only 224 is accepted.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.model.input_size != INPUT_SIZE {
            bail!(
                "model.input_size must be {}, got {}",
                INPUT_SIZE,
                self.model.input_size
            );
        }
        if self.model.path.as_os_str().is_empty() {
            bail!("model.path must not be empty");
        }
        if self.inference.device.trim().is_empty() {
            bail!("inference.device must not be empty");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.model.input_size, 224);
        assert_eq!(config.model.path, PathBuf::from("models/spiral_model01.tflite"));
        assert_eq!(config.inference.device, "CPU");
        assert_eq!(config.preprocess.filter, ResizeFilter::Triangle);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml() {
        let config = Config::from_toml(
            r#"
            [model]
            path = "assets/spiral.onnx"

            [preprocess]
            filter = "lanczos3"
            "#,
        )
        .unwrap();
        assert_eq!(config.model.path, PathBuf::from("assets/spiral.onnx"));
        assert_eq!(config.model.input_size, 224);
        assert_eq!(config.inference.device, "CPU");
        assert_eq!(config.preprocess.filter, ResizeFilter::Lanczos3);
    }

    #[test]
    fn test_rejects_other_input_size() {
        let err = Config::from_toml("[model]\ninput_size = 256\n").unwrap_err();
        assert!(err.to_string().contains("input_size"));
    }

    #[test]
    fn test_rejects_unknown_filter() {
        assert!(Config::from_toml("[preprocess]\nfilter = \"bicubic\"\n").is_err());
    }

    #[test]
    fn test_missing_file() {
        assert!(Config::load("/nonexistent/config.toml").is_err());
    }
}
