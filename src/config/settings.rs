//! Application settings and configuration management

use crate::error::{AppError, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Default location of the optional settings file
pub const DEFAULT_CONFIG_PATH: &str = "config/pantry.yaml";

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub detector: DetectorConfig,
    #[serde(default)]
    pub ocr: OcrConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Largest accepted request body, uploads included
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_max_body_bytes() -> usize {
    20 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

/// Object detector (YOLO inference server) configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DetectorConfig {
    #[serde(default = "default_detector_endpoint")]
    pub endpoint: String,
    /// Weights selector forwarded to the inference server
    #[serde(default = "default_detector_model")]
    pub model: String,
    #[serde(default = "default_detector_timeout")]
    pub timeout_ms: u64,
    /// Minimum confidence; the server default applies when unset
    #[serde(default)]
    pub confidence: Option<f32>,
}

fn default_detector_endpoint() -> String {
    "http://localhost:8000".to_string()
}

fn default_detector_model() -> String {
    "yolov8n.pt".to_string()
}

fn default_detector_timeout() -> u64 {
    60000
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            endpoint: default_detector_endpoint(),
            model: default_detector_model(),
            timeout_ms: default_detector_timeout(),
            confidence: None,
        }
    }
}

/// Cloud Vision OCR configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OcrConfig {
    #[serde(default = "default_ocr_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_remote_timeout")]
    pub timeout_ms: u64,
}

fn default_ocr_endpoint() -> String {
    "https://vision.googleapis.com/v1".to_string()
}

fn default_remote_timeout() -> u64 {
    30000
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            endpoint: default_ocr_endpoint(),
            timeout_ms: default_remote_timeout(),
        }
    }
}

/// Hosted LLM (OpenRouter) configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmConfig {
    /// Recipe generation is disabled without a key
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    #[serde(default = "default_remote_timeout")]
    pub timeout_ms: u64,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Sent as `HTTP-Referer` for OpenRouter attribution
    #[serde(default)]
    pub referer: Option<String>,
    /// Sent as `X-Title` for OpenRouter attribution
    #[serde(default)]
    pub title: Option<String>,
}

fn default_llm_model() -> String {
    "mistralai/mistral-small-3.2-24b-instruct:free".to_string()
}

fn default_llm_base_url() -> String {
    "https://openrouter.ai/api/v1".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_llm_model(),
            base_url: default_llm_base_url(),
            timeout_ms: default_remote_timeout(),
            temperature: default_temperature(),
            referer: None,
            title: None,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl Settings {
    /// Load settings from the default file and the process environment
    pub fn load() -> Result<Self> {
        let vars: HashMap<String, String> = std::env::vars().collect();
        Self::load_from(DEFAULT_CONFIG_PATH, vars)
    }

    /// Load settings from a config file (YAML or TOML, optional) and an
    /// explicit environment map.
    ///
    /// Precedence, lowest first: defaults, file, `PANTRY__SECTION__KEY`
    /// variables, then the flat variables `PORT`, `YOLO_MODEL`,
    /// `DETECTOR_URL`, `OPENROUTER_API_KEY` and `OPENROUTER_MODEL`.
    pub fn load_from<P: AsRef<Path>>(path: P, vars: HashMap<String, String>) -> Result<Self> {
        let path = path.as_ref();

        let format = if path
            .extension()
            .map_or(false, |ext| ext == "yaml" || ext == "yml")
        {
            FileFormat::Yaml
        } else {
            FileFormat::Toml
        };

        let mut builder = Config::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", i64::from(default_port()))?
            .set_default("server.max_body_bytes", default_max_body_bytes() as i64)?
            .set_default("detector.endpoint", default_detector_endpoint())?
            .set_default("detector.model", default_detector_model())?
            .set_default("detector.timeout_ms", default_detector_timeout() as i64)?
            .set_default("ocr.endpoint", default_ocr_endpoint())?
            .set_default("ocr.timeout_ms", default_remote_timeout() as i64)?
            .set_default("llm.model", default_llm_model())?
            .set_default("llm.base_url", default_llm_base_url())?
            .set_default("llm.timeout_ms", default_remote_timeout() as i64)?
            .set_default("llm.temperature", f64::from(default_temperature()))?
            .set_default("logging.level", default_log_level())?
            .set_default("logging.format", "json")?;

        if path.exists() {
            builder = builder.add_source(File::from(path).format(format));
        }

        builder = builder.add_source(
            Environment::with_prefix("PANTRY")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true)
                .source(Some(vars.clone())),
        );

        let flat = |name: &str| {
            vars.get(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        builder = builder
            .set_override_option("server.port", flat("PORT"))?
            .set_override_option("detector.model", flat("YOLO_MODEL"))?
            .set_override_option("detector.endpoint", flat("DETECTOR_URL"))?
            .set_override_option("llm.api_key", flat("OPENROUTER_API_KEY"))?
            .set_override_option("llm.model", flat("OPENROUTER_MODEL"))?;

        let settings: Settings = builder.build()?.try_deserialize()?;
        Ok(settings)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(config_error("Server port cannot be 0"));
        }

        if self.detector.endpoint.trim().is_empty() {
            return Err(config_error("Detector endpoint cannot be empty"));
        }

        if self.detector.model.trim().is_empty() {
            return Err(config_error("Detector model cannot be empty"));
        }

        if let Some(confidence) = self.detector.confidence {
            if !(0.0..=1.0).contains(&confidence) {
                return Err(config_error(format!(
                    "Detector confidence must be within 0..=1, got {}",
                    confidence
                )));
            }
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(config_error(format!(
                "LLM temperature must be within 0..=2, got {}",
                self.llm.temperature
            )));
        }

        Ok(())
    }

    /// Socket address string the server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn config_error(message: impl Into<String>) -> AppError {
    AppError::Config(config::ConfigError::Message(message.into()))
}
