//! Camera acquisition and capture sessions.
//!
//! The acquirer negotiates a stream from a [`MediaSource`], walking a ladder
//! of progressively looser constraints. The resulting [`CaptureSession`]
//! owns the tracks until it is stopped or dropped.

mod acquirer;
mod config;
mod constraints;
mod mock;
#[cfg(feature = "camera")]
mod native;
mod session;
mod track;

pub use acquirer::{AcquireFailure, CaptureAcquirer};
pub use config::{CaptureConfig, ConfigError, FileConfig, StillConfig, TransformConfig};
pub use constraints::{
    fallback_ladder, ConstraintSet, ControlMode, ControlRange, FacingMode, ManualControls,
    TrackCapabilities, TrackSettings,
};
pub use mock::{MockMediaSource, MockResponse, MockTrack, MockTrackProbe, MockTrackStatus};
#[cfg(feature = "camera")]
pub use native::NativeMediaSource;
pub use session::CaptureSession;
pub use track::{CaptureError, MediaSource, MediaStream, VideoTrack};
