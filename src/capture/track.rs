//! Media input boundary: sources, streams and video tracks.
//!
//! These traits are the seam between the viewer and the host's camera
//! subsystem, so the rest of the crate runs the same against real
//! hardware and the mock backend.

use super::{ConstraintSet, TrackCapabilities, TrackSettings};
use crate::surface::{FrameBuffer, FrameError};
use thiserror::Error;

/// Errors reported by a media source or track.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    /// The user or platform refused camera access.
    #[error("camera permission denied")]
    PermissionDenied,
    /// No camera matches.
    #[error("no matching camera device")]
    NoDevice,
    /// Camera access is not allowed from this context.
    #[error("camera access requires a secure context")]
    InsecureContext,
    /// No camera satisfies the requested constraints.
    #[error("constraints cannot be satisfied: {0}")]
    ConstraintUnsatisfiable(String),
    /// The stream carries no live video track.
    #[error("stream has no live video track")]
    NoVideoTrack,
    /// Any other backend failure.
    #[error("camera backend error: {0}")]
    Backend(String),
}

/// A live video track.
pub trait VideoTrack {
    /// Stable identifier of the track.
    fn id(&self) -> &str;

    /// Human-readable device label.
    fn label(&self) -> &str;

    /// Current decoded frame size; `(0, 0)` until the stream's metadata
    /// has been negotiated.
    fn dimensions(&self) -> (u32, u32);

    /// Whether a frame newer than the last one read is available.
    fn has_new_frame(&mut self) -> bool;

    /// Copies the newest decoded frame into `dst`, which must already be
    /// sized to [`dimensions`](Self::dimensions).
    fn read_frame(&mut self, dst: &mut FrameBuffer) -> Result<(), FrameError>;

    /// Optional device controls.
    fn capabilities(&self) -> TrackCapabilities {
        TrackCapabilities::default()
    }

    /// Applies negotiated control settings.
    fn apply_settings(&mut self, settings: &TrackSettings) -> Result<(), CaptureError>;

    /// False once the track has been stopped or the device went away.
    fn is_live(&self) -> bool;

    /// Stops the track and releases the device.
    fn stop(&mut self);
}

/// Tracks returned by one successful media request.
#[derive(Default)]
pub struct MediaStream {
    tracks: Vec<Box<dyn VideoTrack>>,
}

impl MediaStream {
    /// Wraps the tracks of one request.
    pub fn new(tracks: Vec<Box<dyn VideoTrack>>) -> Self {
        Self { tracks }
    }

    /// All tracks, live or not.
    pub fn tracks(&self) -> &[Box<dyn VideoTrack>] {
        &self.tracks
    }

    /// Mutable access to all tracks.
    pub fn tracks_mut(&mut self) -> &mut [Box<dyn VideoTrack>] {
        &mut self.tracks
    }

    /// Number of tracks still live.
    pub fn live_track_count(&self) -> usize {
        self.tracks.iter().filter(|t| t.is_live()).count()
    }

    /// Stops every live track exactly once. Returns how many were stopped.
    pub fn stop_all(&mut self) -> usize {
        let mut stopped = 0;
        for track in self.tracks.iter_mut().filter(|t| t.is_live()) {
            track.stop();
            stopped += 1;
        }
        stopped
    }
}

impl std::fmt::Debug for MediaStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaStream")
            .field("tracks", &self.tracks.len())
            .field("live", &self.live_track_count())
            .finish()
    }
}

/// The host's camera subsystem.
pub trait MediaSource {
    /// Camera access is only granted to secure contexts.
    fn is_secure_context(&self) -> bool {
        true
    }

    /// Requests a live stream satisfying `constraints`.
    fn request_stream(&mut self, constraints: &ConstraintSet) -> Result<MediaStream, CaptureError>;
}

impl<M: MediaSource + ?Sized> MediaSource for Box<M> {
    fn is_secure_context(&self) -> bool {
        (**self).is_secure_context()
    }

    fn request_stream(&mut self, constraints: &ConstraintSet) -> Result<MediaStream, CaptureError> {
        (**self).request_stream(constraints)
    }
}
