//! Image resources handed to the extractor
//!
//! An image is a path, a URL, or an encoded buffer. Decoding happens before
//! any engine is created, so a bad image never costs a model load.

use crate::error::OcrError;
use image::DynamicImage;
use std::io::Read;
use std::path::PathBuf;
use std::sync::{Arc, LazyLock};

/// Sample image used when the caller passes no image
static SAMPLE_IMAGE: LazyLock<Arc<[u8]>> =
    LazyLock::new(|| Arc::from(&include_bytes!("../assets/sample.png")[..]));

/// Largest image body accepted from a URL (50MB)
const MAX_REMOTE_IMAGE_BYTES: u64 = 52_428_800;

/// A reference to encoded image data
///
/// Buffers are shared, so cloning a source never copies image bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Path(PathBuf),
    Url(String),
    Bytes(Arc<[u8]>),
}

impl ImageSource {
    /// The bundled sample image
    pub fn sample() -> Self {
        ImageSource::Bytes(SAMPLE_IMAGE.clone())
    }

    pub fn path(path: impl Into<PathBuf>) -> Self {
        ImageSource::Path(path.into())
    }

    pub fn url(url: impl Into<String>) -> Self {
        ImageSource::Url(url.into())
    }

    pub fn bytes(data: impl Into<Arc<[u8]>>) -> Self {
        ImageSource::Bytes(data.into())
    }

    /// Short description for log lines
    pub fn describe(&self) -> String {
        match self {
            ImageSource::Path(path) => format!("file {:?}", path),
            ImageSource::Url(url) => format!("url {}", url),
            ImageSource::Bytes(data) => format!("{} byte buffer", data.len()),
        }
    }

    /// Read and decode the image on the blocking pool
    pub async fn load(&self) -> Result<DynamicImage, OcrError> {
        let source = self.clone();
        tokio::task::spawn_blocking(move || source.load_blocking()).await?
    }

    fn load_blocking(&self) -> Result<DynamicImage, OcrError> {
        let img = match self {
            ImageSource::Path(path) => image::open(path)
                .map_err(|e| OcrError::ImageLoad(format!("{:?}: {}", path, e)))?,
            ImageSource::Url(url) => decode(&fetch(url)?)?,
            ImageSource::Bytes(data) => decode(data)?,
        };

        tracing::debug!(
            "Loaded {}: {}x{}",
            self.describe(),
            img.width(),
            img.height()
        );

        Ok(img)
    }
}

impl Default for ImageSource {
    fn default() -> Self {
        Self::sample()
    }
}

impl From<PathBuf> for ImageSource {
    fn from(path: PathBuf) -> Self {
        ImageSource::Path(path)
    }
}

impl From<&std::path::Path> for ImageSource {
    fn from(path: &std::path::Path) -> Self {
        ImageSource::Path(path.to_path_buf())
    }
}

impl From<Vec<u8>> for ImageSource {
    fn from(data: Vec<u8>) -> Self {
        ImageSource::Bytes(data.into())
    }
}

fn decode(data: &[u8]) -> Result<DynamicImage, OcrError> {
    image::load_from_memory(data).map_err(|e| OcrError::ImageLoad(e.to_string()))
}

fn fetch(url: &str) -> Result<Vec<u8>, OcrError> {
    let response = ureq::get(url)
        .call()
        .map_err(|e| OcrError::ImageLoad(format!("Failed to fetch {}: {}", url, e)))?;

    let mut data = Vec::new();
    response
        .into_body()
        .into_reader()
        .take(MAX_REMOTE_IMAGE_BYTES + 1)
        .read_to_end(&mut data)
        .map_err(|e| OcrError::ImageLoad(format!("Failed to read {}: {}", url, e)))?;

    if data.len() as u64 > MAX_REMOTE_IMAGE_BYTES {
        return Err(OcrError::ImageLoad(format!(
            "Image at {} exceeds {} bytes",
            url, MAX_REMOTE_IMAGE_BYTES
        )));
    }

    Ok(data)
}
