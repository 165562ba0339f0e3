use thiserror::Error;

#[derive(Error, Debug)]
pub enum OcrError {
    #[error("Failed to initialize OCR engine: {0}")]
    EngineInitialization(String),

    #[error("Failed to recognize text: {0}")]
    Recognition(String),

    #[error("Failed to load image: {0}")]
    ImageLoad(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<tokio::task::JoinError> for OcrError {
    fn from(err: tokio::task::JoinError) -> Self {
        OcrError::Internal(format!("Blocking task failed: {}", err))
    }
}
