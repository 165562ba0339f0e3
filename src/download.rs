//! Model file cache
//!
//! Engines need model data on disk before they can be created. Files are
//! fetched once with ureq and reused from the cache directory afterwards.
//! These functions block and must run on the blocking pool.

use crate::error::OcrError;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Return the cached path of `filename`, downloading it from `url` if missing
///
/// Safe to call from several threads at once: a file at the final path is
/// always complete.
pub fn ensure_cached(url: &str, cache_dir: &Path, filename: &str) -> Result<PathBuf, OcrError> {
    fs::create_dir_all(cache_dir).map_err(|e| {
        OcrError::EngineInitialization(format!(
            "Failed to create cache directory {:?}: {}",
            cache_dir, e
        ))
    })?;

    let path = cache_dir.join(filename);

    if path.exists() {
        tracing::info!("Using cached {} from {:?}", filename, path);
        return Ok(path);
    }

    tracing::info!("Downloading {} (this may take a moment)...", filename);
    download_file(url, cache_dir, &path)?;
    tracing::info!("Downloaded {} to {:?}", filename, path);

    Ok(path)
}

/// Download a file from URL to path using ureq
///
/// Each download streams into its own temp file in `cache_dir`, which is
/// atomically renamed onto `path` when complete. Concurrent downloads of the
/// same file each rename identical bytes; the last rename wins.
fn download_file(url: &str, cache_dir: &Path, path: &Path) -> Result<(), OcrError> {
    let response = ureq::get(url)
        .call()
        .map_err(|e| OcrError::EngineInitialization(format!("Failed to download {}: {}", url, e)))?;

    let mut file = NamedTempFile::new_in(cache_dir).map_err(|e| {
        OcrError::EngineInitialization(format!(
            "Failed to create temp file in {:?}: {}",
            cache_dir, e
        ))
    })?;

    // The temp file is removed on drop if anything below fails
    let mut body = response.into_body().into_reader();
    io::copy(&mut body, &mut file).map_err(|e| {
        OcrError::EngineInitialization(format!("Failed to write {:?}: {}", path, e))
    })?;

    file.persist(path).map_err(|e| {
        OcrError::EngineInitialization(format!("Failed to move {:?} into place: {}", path, e))
    })?;

    Ok(())
}
