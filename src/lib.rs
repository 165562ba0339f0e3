//! Extract the text in an image with an OCR engine that lives for one call.
//!
//! ```no_run
//! use image_text_reader::{extract_text, ImageSource};
//!
//! # async fn run() -> Result<(), image_text_reader::OcrError> {
//! let text = extract_text(Some(&ImageSource::path("receipt.png"))).await?;
//! println!("{}", text);
//! # Ok(())
//! # }
//! ```

pub mod config;
mod download;
pub mod engine;
pub mod engines;
pub mod error;
pub mod extractor;
pub mod image_source;

pub use config::Config;
pub use engine::{EngineSession, OcrProvider, Recognition, RecognitionEngine};
pub use error::OcrError;
pub use extractor::{extract_text, TextExtractor};
pub use image_source::ImageSource;
