//! Frame buffers and the presentation surface.
//!
//! The surface is sized to the source frame and rewritten every tick;
//! still capture reads whatever it currently holds.

mod frame;
mod still;
#[allow(clippy::module_inception)]
mod surface;

pub use frame::{FrameBuffer, FrameError, CHANNELS};
pub use still::{capture_still, save_still, StillError};
pub use surface::PresentationSurface;
