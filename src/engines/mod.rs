//! OCR engine implementations
//!
//! This module contains implementations of the OcrProvider trait for different
//! OCR backends. Engines are conditionally compiled based on feature flags.

#[cfg(feature = "engine-ocrs")]
pub mod ocrs;

#[cfg(feature = "engine-tesseract")]
pub mod tesseract;

use crate::config::Config;
use crate::engine::OcrProvider;
use crate::error::OcrError;
use async_trait::async_trait;
use std::convert::Infallible;

/// Provider used when the caller does not inject one: ocrs first, then tesseract
#[cfg(feature = "engine-ocrs")]
pub type DefaultProvider = ocrs::OcrsProvider;

#[cfg(all(not(feature = "engine-ocrs"), feature = "engine-tesseract"))]
pub type DefaultProvider = tesseract::TesseractProvider;

#[cfg(not(any(feature = "engine-ocrs", feature = "engine-tesseract")))]
pub type DefaultProvider = Unavailable;

/// Build the default provider from `config`
pub fn default_provider(config: &Config) -> DefaultProvider {
    DefaultProvider::new(config)
}

/// Names of the engines compiled into this build
pub fn available() -> Vec<&'static str> {
    #[allow(unused_mut)]
    let mut engines = Vec::new();

    #[cfg(feature = "engine-ocrs")]
    engines.push("ocrs");

    #[cfg(feature = "engine-tesseract")]
    engines.push("tesseract");

    engines
}

/// Run CPU-bound recognition work on the blocking pool
///
/// A panicked or cancelled task is a recognition failure.
#[cfg_attr(
    not(any(feature = "engine-ocrs", feature = "engine-tesseract")),
    allow(dead_code)
)]
pub(crate) async fn recognize_blocking<F, T>(work: F) -> Result<T, OcrError>
where
    F: FnOnce() -> Result<T, OcrError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| OcrError::Recognition(format!("Recognition task failed: {}", e)))?
}

/// Stand-in provider for builds without any engine feature
pub struct Unavailable;

impl Unavailable {
    pub fn new(_config: &Config) -> Self {
        Unavailable
    }
}

#[async_trait]
impl OcrProvider for Unavailable {
    type Engine = Infallible;

    fn name(&self) -> &'static str {
        "unavailable"
    }

    async fn create(&self, _language: &str) -> Result<Infallible, OcrError> {
        Err(OcrError::EngineInitialization(
            "No OCR engines available. Build with --features engine-ocrs or --features engine-tesseract".to_string(),
        ))
    }
}
