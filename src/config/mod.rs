//! Configuration module

pub mod settings;

pub use settings::{
    DetectorConfig, LlmConfig, LogFormat, LoggingConfig, OcrConfig, ServerConfig, Settings,
};
