//! RGBA frame buffer backing the presentation surface.

use std::time::Instant;
use thiserror::Error;

/// Bytes per pixel (R, G, B, A).
pub const CHANNELS: usize = 4;

/// Errors raised while moving pixels into or out of a frame buffer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// The source could not produce a frame.
    #[error("failed to read frame from source: {0}")]
    ReadFailure(String),
    /// The frame does not fit the buffer.
    #[error("frame is {got:?} but buffer is {expected:?}")]
    SizeMismatch {
        /// Buffer dimensions.
        expected: (u32, u32),
        /// Frame dimensions.
        got: (u32, u32),
    },
    /// A raw pixel vector has the wrong length.
    #[error("expected {expected} RGBA bytes, got {got}")]
    InvalidLength {
        /// Bytes needed for the dimensions.
        expected: usize,
        /// Bytes supplied.
        got: usize,
    },
}

/// A rectangular grid of RGBA pixels.
///
/// The buffer is overwritten in place every tick and only reallocated
/// when the source resolution changes.
#[derive(Clone)]
pub struct FrameBuffer {
    /// Interleaved RGBA bytes, row-major.
    pixels: Vec<u8>,
    width: u32,
    height: u32,
    /// When the current contents were copied in.
    timestamp: Instant,
    /// Source frame sequence of the current contents.
    sequence: u64,
}

impl FrameBuffer {
    /// Creates a zeroed (fully transparent black) buffer.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: vec![0u8; byte_len(width, height)],
            width,
            height,
            timestamp: Instant::now(),
            sequence: 0,
        }
    }

    /// Wraps existing RGBA bytes, checking the length against the dimensions.
    pub fn from_rgba(pixels: Vec<u8>, width: u32, height: u32) -> Result<Self, FrameError> {
        if pixels.len() != byte_len(width, height) {
            return Err(FrameError::InvalidLength {
                expected: byte_len(width, height),
                got: pixels.len(),
            });
        }
        Ok(Self {
            pixels,
            width,
            height,
            timestamp: Instant::now(),
            sequence: 0,
        })
    }

    /// Returns the raw RGBA bytes.
    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Returns the raw RGBA bytes for in-place edits.
    #[inline]
    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    /// Returns the frame width.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the frame height.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns `(width, height)`.
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Returns when the current contents were written.
    #[inline]
    pub fn timestamp(&self) -> Instant {
        self.timestamp
    }

    /// Returns the source frame number of the contents.
    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Returns the total number of pixels (width * height).
    #[inline]
    pub fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// True for a 0×0 (or degenerate) buffer.
    pub fn is_empty(&self) -> bool {
        self.pixel_count() == 0
    }

    /// Returns the RGBA value at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let at = (y as usize * self.width as usize + x as usize) * CHANNELS;
        let p = &self.pixels[at..at + CHANNELS];
        Some([p[0], p[1], p[2], p[3]])
    }

    /// Overwrites the RGBA value at `(x, y)`. Out-of-range writes are ignored.
    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let at = (y as usize * self.width as usize + x as usize) * CHANNELS;
        self.pixels[at..at + CHANNELS].copy_from_slice(&rgba);
    }

    /// Validates that the pixel buffer size matches dimensions.
    pub fn is_valid(&self) -> bool {
        self.pixels.len() == self.pixel_count() * CHANNELS
    }

    /// Reallocates to new dimensions. Contents are cleared.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.pixels.clear();
        self.pixels.resize(byte_len(width, height), 0);
    }

    /// Copies a full RGBA frame into the buffer.
    pub fn copy_from(&mut self, rgba: &[u8], width: u32, height: u32) -> Result<(), FrameError> {
        if (width, height) != self.dimensions() || rgba.len() != self.pixels.len() {
            return Err(FrameError::SizeMismatch {
                expected: self.dimensions(),
                got: (width, height),
            });
        }
        self.pixels.copy_from_slice(rgba);
        Ok(())
    }

    /// Records which source frame the contents came from.
    pub fn stamp(&mut self, sequence: u64) {
        self.sequence = sequence;
        self.timestamp = Instant::now();
    }

    /// Consumes the buffer, returning the raw RGBA bytes.
    pub fn into_raw(self) -> Vec<u8> {
        self.pixels
    }
}

impl std::fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("sequence", &self.sequence)
            .field("pixel_bytes", &self.pixels.len())
            .finish()
    }
}

impl PartialEq for FrameBuffer {
    fn eq(&self, other: &Self) -> bool {
        self.dimensions() == other.dimensions() && self.pixels == other.pixels
    }
}

fn byte_len(width: u32, height: u32) -> usize {
    (width as usize) * (height as usize) * CHANNELS
}
