use crate::error::OcrError;
use async_trait::async_trait;
use image::DynamicImage;
use serde::Serialize;

/// OCR recognition result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recognition {
    pub text: String,
    /// Mean confidence in 0.0..=1.0, when the engine reports one
    pub confidence: Option<f32>,
    /// Name of the provider that produced the text
    pub engine: &'static str,
}

/// Factory for recognition engines (e.g., "ocrs", "tesseract")
#[async_trait]
pub trait OcrProvider: Send + Sync {
    type Engine: RecognitionEngine;

    /// Returns the provider identifier
    fn name(&self) -> &'static str;

    /// Create a ready engine for `language`, loading models as needed
    async fn create(&self, language: &str) -> Result<Self::Engine, OcrError>;
}

/// A live engine instance owned by one extraction
#[async_trait]
pub trait RecognitionEngine: Send {
    /// Recognize the text in a decoded image
    async fn recognize(&mut self, image: &DynamicImage) -> Result<Recognition, OcrError>;

    /// Release the engine's execution context
    async fn terminate(&mut self);
}

/// Engine that cannot exist, for providers that always fail to create one
#[async_trait]
impl RecognitionEngine for std::convert::Infallible {
    async fn recognize(&mut self, _image: &DynamicImage) -> Result<Recognition, OcrError> {
        match *self {}
    }

    async fn terminate(&mut self) {
        match *self {}
    }
}

/// Scoped ownership of a created engine
///
/// `finish` terminates the engine exactly once. A session dropped without
/// `finish` (cancelled future, panic) skips `terminate` and leaves cleanup to
/// the engine's own `Drop`.
pub struct EngineSession<E: RecognitionEngine> {
    engine: Option<E>,
    provider: &'static str,
}

impl<E: RecognitionEngine> EngineSession<E> {
    /// Create an engine from `provider` and take ownership of it
    pub async fn open<P>(provider: &P, language: &str) -> Result<Self, OcrError>
    where
        P: OcrProvider<Engine = E>,
    {
        tracing::info!("Initializing {} engine ({})", provider.name(), language);
        let engine = provider.create(language).await?;

        Ok(Self {
            engine: Some(engine),
            provider: provider.name(),
        })
    }

    pub async fn recognize(&mut self, image: &DynamicImage) -> Result<Recognition, OcrError> {
        let engine = self
            .engine
            .as_mut()
            .ok_or_else(|| OcrError::Internal("Engine already terminated".to_string()))?;
        engine.recognize(image).await
    }

    /// Terminate the engine and end the session
    pub async fn finish(mut self) {
        if let Some(mut engine) = self.engine.take() {
            engine.terminate().await;
            tracing::info!("{} engine terminated", self.provider);
        }
    }
}

impl<E: RecognitionEngine> Drop for EngineSession<E> {
    fn drop(&mut self) {
        if self.engine.is_some() {
            tracing::warn!(
                "{} engine session dropped without termination",
                self.provider
            );
        }
    }
}
