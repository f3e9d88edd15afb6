//! Raster surface the transformed frames are drawn onto.

use super::{FrameBuffer, FrameError};
use crate::capture::VideoTrack;

/// Presentation surface sized to the source frame.
///
/// Mirrors a 2D canvas: `draw_from` copies the current decoded frame in
/// (`drawImage`), following the track's size, and `frame_mut` hands out the
/// pixels for in-place transformation (`getImageData`/`putImageData`).
///
/// Frames are read into a back buffer and only swapped in once the read
/// succeeds, so a failed read never disturbs the presented frame.
#[derive(Debug)]
pub struct PresentationSurface {
    buffer: FrameBuffer,
    back: FrameBuffer,
    presented: bool,
    resizes: u64,
    writes: u64,
}

impl PresentationSurface {
    /// Creates an empty 0×0 surface.
    pub fn new() -> Self {
        Self {
            buffer: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            presented: false,
            resizes: 0,
            writes: 0,
        }
    }

    /// Size of the presented frame.
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        self.buffer.dimensions()
    }

    /// Resizes and clears the surface. Returns false when already that size.
    ///
    /// A cleared surface holds no frame until the next successful draw.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if self.buffer.dimensions() == (width, height) {
            return false;
        }
        self.buffer.resize(width, height);
        self.presented = false;
        self.resizes += 1;
        tracing::debug!(width, height, "Presentation surface resized");
        true
    }

    /// Reads the track's current frame and presents it.
    ///
    /// The surface takes the track's dimensions when the read succeeds. On
    /// failure it keeps the last presented frame and size.
    pub fn draw_from(&mut self, track: &mut dyn VideoTrack) -> Result<(), FrameError> {
        let (width, height) = track.dimensions();
        if self.back.dimensions() != (width, height) {
            self.back.resize(width, height);
        }
        track.read_frame(&mut self.back)?;

        std::mem::swap(&mut self.buffer, &mut self.back);
        if self.buffer.dimensions() != self.back.dimensions() {
            self.resizes += 1;
            tracing::debug!(width, height, "Presentation surface resized");
        }
        self.presented = true;
        self.writes += 1;
        Ok(())
    }

    /// True once a frame has been drawn since creation or the last resize.
    pub fn has_frame(&self) -> bool {
        self.presented
    }

    /// Current surface contents.
    #[inline]
    pub fn frame(&self) -> &FrameBuffer {
        &self.buffer
    }

    /// Surface contents for in-place transformation.
    #[inline]
    pub fn frame_mut(&mut self) -> &mut FrameBuffer {
        &mut self.buffer
    }

    /// Number of times the backing buffer was reallocated.
    pub fn resize_count(&self) -> u64 {
        self.resizes
    }

    /// Number of frames successfully drawn.
    pub fn write_count(&self) -> u64 {
        self.writes
    }
}

impl Default for PresentationSurface {
    fn default() -> Self {
        Self::new()
    }
}
