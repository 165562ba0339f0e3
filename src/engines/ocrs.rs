//! OCRS engine implementation
//!
//! Pure Rust OCR engine using the ocrs library. No system dependencies required.
//! Downloads neural network models automatically on first use.

use crate::config::Config;
use crate::download::ensure_cached;
use crate::engine::{OcrProvider, Recognition, RecognitionEngine};
use crate::engines::recognize_blocking;
use crate::error::OcrError;
use async_trait::async_trait;
use image::{DynamicImage, RgbImage};
use ocrs::{DecodeMethod, ImageSource, OcrEngine as OcrsOcrEngine, OcrEngineParams};
use rten::Model;
use std::path::PathBuf;
use std::sync::Arc;

/// Default model URLs from the ocrs project
const DETECTION_MODEL_URL: &str =
    "https://ocrs-models.s3-accelerate.amazonaws.com/text-detection.rten";
const RECOGNITION_MODEL_URL: &str =
    "https://ocrs-models.s3-accelerate.amazonaws.com/text-recognition.rten";

const NAME: &str = "ocrs";

/// Creates ocrs engines; ocrs only reads English/Latin text
pub struct OcrsProvider {
    cache_dir: PathBuf,
}

impl OcrsProvider {
    pub fn new(config: &Config) -> Self {
        Self {
            cache_dir: config.cache_dir.clone(),
        }
    }

    pub fn supported_languages(&self) -> &'static [&'static str] {
        &["eng"]
    }
}

#[async_trait]
impl OcrProvider for OcrsProvider {
    type Engine = OcrsEngine;

    fn name(&self) -> &'static str {
        NAME
    }

    async fn create(&self, language: &str) -> Result<OcrsEngine, OcrError> {
        if !self.supported_languages().iter().any(|l| *l == language) {
            return Err(OcrError::EngineInitialization(format!(
                "ocrs does not support language '{}'",
                language
            )));
        }

        let cache_dir = self.cache_dir.clone();
        let engine = tokio::task::spawn_blocking(move || load_engine(cache_dir)).await??;

        tracing::info!("ocrs engine initialized successfully");

        Ok(OcrsEngine {
            engine: Some(Arc::new(engine)),
        })
    }
}

/// A loaded pair of detection and recognition models
pub struct OcrsEngine {
    engine: Option<Arc<OcrsOcrEngine>>,
}

#[async_trait]
impl RecognitionEngine for OcrsEngine {
    async fn recognize(&mut self, image: &DynamicImage) -> Result<Recognition, OcrError> {
        let engine = self
            .engine
            .clone()
            .ok_or_else(|| OcrError::Recognition("ocrs engine was terminated".to_string()))?;

        // ocrs expects RGB8 in HWC layout
        let rgb_img = image.to_rgb8();
        let text = recognize_blocking(move || read_text(&engine, &rgb_img)).await?;

        Ok(Recognition {
            text,
            confidence: None,
            engine: NAME,
        })
    }

    async fn terminate(&mut self) {
        // Dropping the last handle frees both models
        self.engine = None;
    }
}

/// Ensure both models are cached, then load them into an engine
fn load_engine(cache_dir: PathBuf) -> Result<OcrsOcrEngine, OcrError> {
    let detection_model_path =
        ensure_cached(DETECTION_MODEL_URL, &cache_dir, "text-detection.rten")?;
    let recognition_model_path =
        ensure_cached(RECOGNITION_MODEL_URL, &cache_dir, "text-recognition.rten")?;

    let detection_model = Model::load_file(&detection_model_path).map_err(|e| {
        OcrError::EngineInitialization(format!("Failed to load detection model: {}", e))
    })?;
    let recognition_model = Model::load_file(&recognition_model_path).map_err(|e| {
        OcrError::EngineInitialization(format!("Failed to load recognition model: {}", e))
    })?;

    OcrsOcrEngine::new(OcrEngineParams {
        detection_model: Some(detection_model),
        recognition_model: Some(recognition_model),
        decode_method: DecodeMethod::Greedy,
        ..Default::default()
    })
    .map_err(|e| OcrError::EngineInitialization(format!("Failed to create OCR engine: {}", e)))
}

/// Detect words, group them into lines, and read each line
fn read_text(engine: &OcrsOcrEngine, rgb_img: &RgbImage) -> Result<String, OcrError> {
    let img_source = ImageSource::from_bytes(rgb_img.as_raw(), rgb_img.dimensions())
        .map_err(|e| OcrError::Recognition(format!("Failed to create image source: {}", e)))?;

    let ocr_input = engine
        .prepare_input(img_source)
        .map_err(|e| OcrError::Recognition(format!("Failed to prepare input: {}", e)))?;

    let word_rects = engine
        .detect_words(&ocr_input)
        .map_err(|e| OcrError::Recognition(format!("Failed to detect words: {}", e)))?;

    let line_rects = engine.find_text_lines(&ocr_input, &word_rects);

    let line_texts = engine
        .recognize_text(&ocr_input, &line_rects)
        .map_err(|e| OcrError::Recognition(format!("Failed to recognize text: {}", e)))?;

    Ok(line_texts
        .iter()
        .filter_map(|line| line.as_ref())
        .map(|line| {
            line.words()
                .map(|word| word.to_string())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n"))
}
