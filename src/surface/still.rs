//! Single-frame still capture.
//!
//! Encodes the current (already transformed) surface as PNG. Reading the
//! surface has no effect on a running pump.

use super::PresentationSurface;
use image::{ImageFormat, RgbaImage};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while capturing a still.
#[derive(Debug, Error)]
pub enum StillError {
    /// No frame has been presented.
    #[error("nothing has been drawn yet")]
    Empty,
    /// PNG encoding failed.
    #[error("failed to encode still: {0}")]
    EncodeFailure(String),
    /// Writing the file failed.
    #[error("failed to save still: {0}")]
    Io(#[from] std::io::Error),
}

/// Snapshots the surface into PNG bytes.
pub fn capture_still(surface: &PresentationSurface) -> Result<Vec<u8>, StillError> {
    let frame = surface.frame();
    if frame.is_empty() || !surface.has_frame() {
        return Err(StillError::Empty);
    }

    let image = RgbaImage::from_raw(frame.width(), frame.height(), frame.pixels().to_vec())
        .ok_or_else(|| StillError::EncodeFailure("pixel buffer does not match dimensions".into()))?;

    let mut buffer = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .map_err(|e| StillError::EncodeFailure(e.to_string()))?;

    tracing::info!(
        width = frame.width(),
        height = frame.height(),
        bytes = buffer.len(),
        "Still captured"
    );
    Ok(buffer)
}

/// Writes encoded still bytes into `dir` under a timestamped name.
pub fn save_still(png: &[u8], dir: impl AsRef<Path>) -> Result<PathBuf, StillError> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;

    let name = format!(
        "negative-{}.png",
        chrono::Local::now().format("%Y%m%d-%H%M%S%.3f")
    );
    let path = dir.join(name);
    std::fs::write(&path, png)?;

    tracing::info!(path = %path.display(), "Still saved");
    Ok(path)
}
