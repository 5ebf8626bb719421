//! Error types for the SignEase library.

use thiserror::Error;

/// Errors raised by the SignEase pipelines and stores
#[derive(Error, Debug)]
pub enum Error {
    /// File read or write failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Frame decoding or encoding failed
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// JSON (de)serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML (de)serialization failed
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Base64 payload could not be decoded
    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// `ONNX` Runtime session setup or inference failed
    #[cfg(feature = "onnx")]
    #[error("ONNX Runtime error: {0}")]
    OnnxRuntime(#[from] ort::OrtError),

    /// Caller-supplied data was rejected
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Model could not be loaded or produced no usable result
    #[error("Model error: {0}")]
    ModelError(String),

    /// Model input metadata is missing or unsupported
    #[error("Model input error: {0}")]
    ModelInputError(String),

    /// Model returned no output tensor
    #[error("Model output error: {0}")]
    ModelOutputError(String),

    /// Model output has an unexpected shape
    #[error("Model data format error: {0}")]
    ModelDataFormatError(String),

    /// Landmark extraction failed or returned malformed data
    #[error("Landmark error: {0}")]
    LandmarkError(String),

    /// A capability failed to initialize and is permanently disabled
    #[error("Unavailable: {0}")]
    Unavailable(String),

    /// History store operation failed
    #[error("History error: {0}")]
    HistoryError(String),

    /// Configuration failed validation
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;
