//! A live capture session.

use super::{
    CaptureError, ConstraintSet, FacingMode, ManualControls, MediaStream, TrackCapabilities,
    TrackSettings, VideoTrack,
};

/// One active camera stream, from acquisition to teardown.
///
/// The first live video track at acquisition is the canonical frame source
/// for the whole session; when it ends the session has no source, even if
/// other tracks are still live. Dropping the session stops every track that
/// is still live.
#[derive(Debug)]
pub struct CaptureSession {
    stream: MediaStream,
    constraints: ConstraintSet,
    primary: Option<usize>,
    stopped: bool,
}

impl CaptureSession {
    pub(crate) fn new(stream: MediaStream, constraints: ConstraintSet) -> Self {
        let primary = stream.tracks().iter().position(|t| t.is_live());
        Self {
            stream,
            constraints,
            primary,
            stopped: false,
        }
    }

    /// Facing preference the session was acquired with.
    pub fn facing(&self) -> FacingMode {
        self.constraints.facing
    }

    /// The constraint set that succeeded.
    pub fn constraints(&self) -> &ConstraintSet {
        &self.constraints
    }

    /// Resolution currently reported by the primary track.
    ///
    /// `(0, 0)` until the stream metadata has been negotiated.
    pub fn resolution(&self) -> (u32, u32) {
        self.primary_track()
            .map(|t| t.dimensions())
            .unwrap_or((0, 0))
    }

    /// The canonical track, whether or not it is still live.
    pub fn primary_track(&self) -> Option<&dyn VideoTrack> {
        let index = self.primary?;
        self.stream.tracks().get(index).map(|t| t.as_ref())
    }

    /// Mutable access to the canonical track.
    pub fn primary_track_mut(&mut self) -> Option<&mut (dyn VideoTrack + 'static)> {
        let index = self.primary?;
        self.stream.tracks_mut().get_mut(index).map(|t| t.as_mut())
    }

    /// Number of tracks in the stream that are still live.
    pub fn live_track_count(&self) -> usize {
        self.stream.live_track_count()
    }

    /// True until [`stop`](Self::stop) has run or every track has ended.
    pub fn is_active(&self) -> bool {
        !self.stopped && self.live_track_count() > 0
    }

    /// Capabilities of the primary track.
    pub fn capabilities(&self) -> TrackCapabilities {
        self.primary_track()
            .map(|t| t.capabilities())
            .unwrap_or_default()
    }

    /// Negotiates `requested` against the primary track and applies the result.
    pub fn apply_controls(
        &mut self,
        requested: &ManualControls,
    ) -> Result<TrackSettings, CaptureError> {
        let track = self.primary_track_mut().ok_or(CaptureError::NoVideoTrack)?;
        let settings = TrackSettings::negotiate(&track.capabilities(), requested);
        if settings.is_empty() {
            return Ok(settings);
        }
        track.apply_settings(&settings)?;
        tracing::debug!(track = %track.id(), ?settings, "Applied track controls");
        Ok(settings)
    }

    /// Stops every live track once. Safe to call repeatedly.
    pub fn stop(&mut self) -> usize {
        let stopped = self.stream.stop_all();
        if !self.stopped {
            tracing::info!(tracks = stopped, "Capture session stopped");
        }
        self.stopped = true;
        stopped
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{ControlMode, ControlRange, MockTrack};
    use crate::surface::FrameBuffer;

    fn session_with(tracks: Vec<MockTrack>) -> CaptureSession {
        let boxed = tracks
            .into_iter()
            .map(|t| Box::new(t) as Box<dyn VideoTrack>)
            .collect();
        CaptureSession::new(MediaStream::new(boxed), ConstraintSet::any())
    }

    #[test]
    fn test_stop_is_idempotent() {
        let a = MockTrack::new(2, 2);
        let b = MockTrack::new(2, 2);
        let (pa, pb) = (a.probe(), b.probe());
        let mut session = session_with(vec![a, b]);

        assert_eq!(session.stop(), 2);
        assert_eq!(session.stop(), 0);
        assert_eq!(pa.stop_calls(), 1);
        assert_eq!(pb.stop_calls(), 1);
        assert!(!session.is_active());
    }

    #[test]
    fn test_drop_releases_tracks() {
        let track = MockTrack::new(2, 2);
        let probe = track.probe();
        drop(session_with(vec![track]));

        assert!(!probe.is_live());
        assert_eq!(probe.stop_calls(), 1);
    }

    #[test]
    fn test_resolution_follows_primary_track() {
        let session = session_with(vec![MockTrack::new(1280, 720)]);
        assert_eq!(session.resolution(), (1280, 720));
    }

    #[test]
    fn test_apply_controls() {
        let track = MockTrack::new(2, 2).with_capabilities(TrackCapabilities {
            exposure_time: Some(ControlRange::new(1.0, 100.0, 1.0)),
            exposure_modes: vec![ControlMode::Manual],
            ..Default::default()
        });
        let probe = track.probe();
        let mut session = session_with(vec![track]);

        let settings = session
            .apply_controls(&ManualControls {
                exposure_time: Some(250.0),
                focus_distance: Some(1.0),
            })
            .unwrap();

        assert_eq!(settings.exposure_time, Some(100.0));
        assert_eq!(settings.focus_distance, None);
        assert_eq!(probe.status().applied, vec![settings]);
    }

    #[test]
    fn test_primary_track_is_pinned() {
        let mut dead = MockTrack::new(2, 2).with_label("dead");
        dead.stop();
        let first = MockTrack::new(4, 4).with_label("first").with_end_after(1);
        let second = MockTrack::new(8, 8).with_label("second");
        let mut session = session_with(vec![dead, first, second]);
        assert_eq!(session.primary_track().unwrap().label(), "first");

        let mut frame = FrameBuffer::new(4, 4);
        let track = session.primary_track_mut().unwrap();
        track.read_frame(&mut frame).unwrap();

        let primary = session.primary_track().unwrap();
        assert_eq!(primary.label(), "first");
        assert!(!primary.is_live());
        assert_eq!(session.live_track_count(), 1);
    }

    #[test]
    fn test_apply_controls_without_track() {
        let mut session = session_with(vec![]);
        assert_eq!(
            session.apply_controls(&ManualControls::default()),
            Err(CaptureError::NoVideoTrack)
        );
    }
}
