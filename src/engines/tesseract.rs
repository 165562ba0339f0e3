//! Tesseract engine implementation
//!
//! Tesseract-based OCR engine. Better for noisy/messy images like phone photos.
//! Uses tesseract-static crate for static linking (no system dependencies).
//! Downloads tessdata (training data) automatically on first use.

use crate::config::Config;
use crate::download::ensure_cached;
use crate::engine::{OcrProvider, Recognition, RecognitionEngine};
use crate::engines::recognize_blocking;
use crate::error::OcrError;
use async_trait::async_trait;
use image::DynamicImage;
use std::path::{Path, PathBuf};
use tesseract_static::tesseract::Tesseract;

const NAME: &str = "tesseract";

/// Creates Tesseract engines for any language with available tessdata
pub struct TesseractProvider {
    cache_dir: PathBuf,
    tessdata_path: Option<PathBuf>,
}

impl TesseractProvider {
    pub fn new(config: &Config) -> Self {
        Self {
            cache_dir: config.cache_dir.join("tessdata"),
            tessdata_path: config.tessdata_path.clone(),
        }
    }
}

#[async_trait]
impl OcrProvider for TesseractProvider {
    type Engine = TesseractEngine;

    fn name(&self) -> &'static str {
        NAME
    }

    async fn create(&self, language: &str) -> Result<TesseractEngine, OcrError> {
        let cache_dir = self.cache_dir.clone();
        let configured = self.tessdata_path.clone();
        let lang = language.to_string();

        let tessdata_path = tokio::task::spawn_blocking(move || {
            let dir = match configured {
                Some(dir) => dir,
                None => ensure_tessdata(&cache_dir, &lang)?,
            };
            let dir = path_str(&dir)?;

            // Validate that tessdata is accessible by doing a test initialization
            Tesseract::new(Some(&dir), Some(&lang)).map_err(|e| {
                OcrError::EngineInitialization(format!("Failed to initialize Tesseract: {}", e))
            })?;

            Ok::<_, OcrError>(dir)
        })
        .await??;

        tracing::info!(
            "Tesseract engine initialized (tessdata: {}, language: {})",
            tessdata_path,
            language
        );

        Ok(TesseractEngine {
            state: Some(TessState {
                tessdata_path,
                language: language.to_string(),
            }),
        })
    }
}

struct TessState {
    tessdata_path: String,
    language: String,
}

/// Validated tessdata for one language
///
/// Tesseract's API consumes its handle at each step, so a fresh handle is
/// built on the blocking pool for every recognition.
pub struct TesseractEngine {
    state: Option<TessState>,
}

#[async_trait]
impl RecognitionEngine for TesseractEngine {
    async fn recognize(&mut self, image: &DynamicImage) -> Result<Recognition, OcrError> {
        let state = self
            .state
            .as_ref()
            .ok_or_else(|| OcrError::Recognition("Tesseract engine was terminated".to_string()))?;

        let bmp_data = encode_bmp(image)?;
        let tessdata_path = state.tessdata_path.clone();
        let language = state.language.clone();

        let (text, confidence) =
            recognize_blocking(move || read_text(&tessdata_path, &language, &bmp_data)).await?;

        Ok(Recognition {
            text,
            confidence: Some(confidence),
            engine: NAME,
        })
    }

    async fn terminate(&mut self) {
        self.state = None;
    }
}

/// Convert to BMP in memory (BMP is always supported by leptonica)
fn encode_bmp(image: &DynamicImage) -> Result<Vec<u8>, OcrError> {
    let rgb_img = image.to_rgb8();
    let mut bmp_data = Vec::new();
    rgb_img
        .write_to(&mut std::io::Cursor::new(&mut bmp_data), image::ImageFormat::Bmp)
        .map_err(|e| OcrError::Recognition(format!("Failed to convert to BMP: {}", e)))?;

    tracing::debug!(
        "Encoded {}x{} image as {} byte BMP",
        rgb_img.width(),
        rgb_img.height(),
        bmp_data.len()
    );

    Ok(bmp_data)
}

fn read_text(
    tessdata_path: &str,
    language: &str,
    bmp_data: &[u8],
) -> Result<(String, f32), OcrError> {
    let tess = Tesseract::new(Some(tessdata_path), Some(language))
        .map_err(|e| OcrError::Recognition(format!("Failed to create Tesseract: {}", e)))?;

    let mut tess = tess
        .set_image_from_mem(bmp_data)
        .map_err(|e| OcrError::Recognition(format!("Failed to set image: {}", e)))?
        .recognize()
        .map_err(|e| OcrError::Recognition(format!("Failed to recognize text: {}", e)))?;

    let text = tess
        .get_text()
        .map_err(|e| OcrError::Recognition(format!("Failed to get text: {}", e)))?;

    // 0-100 scale
    let confidence = tess.mean_text_conf() as f32 / 100.0;

    Ok((text, confidence))
}

/// Ensure `<language>.traineddata` is cached and return the tessdata directory
fn ensure_tessdata(cache_dir: &Path, language: &str) -> Result<PathBuf, OcrError> {
    ensure_cached(
        &tessdata_url(language),
        cache_dir,
        &format!("{}.traineddata", language),
    )?;

    // Tesseract expects the directory, not the file
    Ok(cache_dir.to_path_buf())
}

/// tessdata_fast keeps downloads small
fn tessdata_url(language: &str) -> String {
    format!(
        "https://github.com/tesseract-ocr/tessdata_fast/raw/main/{}.traineddata",
        language
    )
}

fn path_str(path: &Path) -> Result<String, OcrError> {
    path.to_str()
        .map(|s| s.to_string())
        .ok_or_else(|| OcrError::EngineInitialization(format!("Invalid tessdata path {:?}", path)))
}
