use crate::config::{Config, DEFAULT_LANGUAGE};
use crate::engine::{EngineSession, OcrProvider, Recognition};
use crate::engines::{self, DefaultProvider};
use crate::error::OcrError;
use crate::image_source::ImageSource;
use std::time::Instant;

/// Reads the text in a single image with a freshly created engine
///
/// Every call creates its own engine, uses it once, and terminates it before
/// returning, whether recognition succeeded or not.
pub struct TextExtractor<P: OcrProvider> {
    provider: P,
    language: String,
}

impl<P: OcrProvider> TextExtractor<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Extract the text of `image`, or of the bundled sample when `None`
    pub async fn extract_text(&self, image: Option<&ImageSource>) -> Result<String, OcrError> {
        Ok(self.recognize(image).await?.text)
    }

    /// Like `extract_text`, keeping the engine's metadata
    pub async fn recognize(&self, image: Option<&ImageSource>) -> Result<Recognition, OcrError> {
        let sample;
        let image = match image {
            Some(image) => image,
            None => {
                sample = ImageSource::sample();
                &sample
            }
        };

        let start = Instant::now();
        let decoded = image.load().await?;

        let mut session = EngineSession::open(&self.provider, &self.language).await?;
        let outcome = session.recognize(&decoded).await;

        if let Ok(recognition) = &outcome {
            tracing::info!(
                "{} read {} in {}ms: {}",
                recognition.engine,
                image.describe(),
                start.elapsed().as_millis(),
                recognition.text
            );
        }

        session.finish().await;

        outcome
    }
}

impl TextExtractor<DefaultProvider> {
    /// Extractor over the default compiled-in engine
    pub fn default_engine() -> Self {
        Self::with_config(&Config::default())
    }

    pub fn with_config(config: &Config) -> Self {
        Self::new(engines::default_provider(config)).with_language(config.language.clone())
    }
}

/// Extract the text of `image` in English with the default engine
///
/// Uses the bundled sample image when `image` is `None`.
pub async fn extract_text(image: Option<&ImageSource>) -> Result<String, OcrError> {
    TextExtractor::default_engine().extract_text(image).await
}
