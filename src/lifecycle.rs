//! Lifecycle management for the capture → transform → present chain.
//!
//! [`Viewer`] is the only owner of the capture session and the frame pump,
//! and the only component allowed to tear them down. Teardown cancels the
//! pump before stopping tracks, so no tick runs against a released source.

use crate::capture::{
    AcquireFailure, CaptureAcquirer, CaptureError, CaptureSession, FacingMode, ManualControls,
    MediaSource, TrackSettings,
};
use crate::pump::{FramePump, PumpConfig, PumpError, PumpHandle, PumpState, PumpStats, Scheduler, TickOutcome};
use crate::surface::{capture_still, PresentationSurface, StillError};
use crate::transform::{transform, TransformPolicy};
use thiserror::Error;

/// Errors from starting the viewer.
#[derive(Debug, Error)]
pub enum ViewerError {
    /// The camera could not be acquired.
    #[error(transparent)]
    Acquire(#[from] AcquireFailure),
    /// The frame pump refused to start.
    #[error("failed to start frame pump: {0}")]
    Pump(#[from] PumpError),
    /// No session is live.
    #[error("camera is not running")]
    NotRunning,
    /// The live track rejected a request.
    #[error(transparent)]
    Capture(#[from] CaptureError),
}

/// Owns the capture session and frame pump for one viewer.
pub struct Viewer<M: MediaSource, S: Scheduler> {
    acquirer: CaptureAcquirer<M>,
    scheduler: S,
    policy: TransformPolicy,
    pump_config: PumpConfig,
    session: Option<CaptureSession>,
    pump: Option<FramePump>,
    stills: u64,
}

impl<M: MediaSource, S: Scheduler> Viewer<M, S> {
    /// Creates an idle viewer.
    pub fn new(
        acquirer: CaptureAcquirer<M>,
        scheduler: S,
        policy: TransformPolicy,
        pump_config: PumpConfig,
    ) -> Self {
        Self {
            acquirer,
            scheduler,
            policy,
            pump_config,
            session: None,
            pump: None,
            stills: 0,
        }
    }

    /// Acquires the camera and arms a fresh pump.
    ///
    /// A session that is still live is torn down first; two streams are
    /// never held at once.
    pub fn start(&mut self, facing: FacingMode) -> Result<PumpHandle, ViewerError> {
        if self.session.is_some() {
            tracing::warn!("Camera already running; tearing down previous session");
            self.teardown();
        }

        let mut session = self.acquirer.acquire(facing)?;

        let policy = self.policy;
        let mut pump = FramePump::new(self.pump_config.clone(), move |frame| {
            transform(frame, policy);
            Ok(())
        });
        let handle = match pump.start(&mut self.scheduler) {
            Ok(handle) => handle,
            Err(error) => {
                session.stop();
                return Err(error.into());
            }
        };

        tracing::info!(
            facing = %session.facing(),
            constraints = %session.constraints(),
            %policy,
            "Viewer started"
        );
        self.session = Some(session);
        self.pump = Some(pump);
        Ok(handle)
    }

    /// Waits for and handles one scheduler tick.
    ///
    /// Returns `None` when no tick is outstanding (nothing started, or the
    /// pump has stopped).
    pub fn tick(&mut self) -> Option<TickOutcome> {
        let tick = self.scheduler.next_tick()?;
        let pump = self.pump.as_mut()?;

        let outcome = match self.session.as_mut().and_then(|s| s.primary_track_mut()) {
            Some(track) => pump.on_tick(tick, track, &mut self.scheduler),
            None => {
                tracing::info!("Session has no video track; stopping frame pump");
                pump.cancel(&mut self.scheduler);
                TickOutcome::Ended
            }
        };
        Some(outcome)
    }

    /// Drives ticks until the pump stops, or until `max_frames` frames
    /// have been presented.
    pub fn run(&mut self, max_frames: Option<u64>) -> PumpStats {
        while self.state() != PumpState::Stopped {
            if let Some(max) = max_frames {
                if self.stats().presented_frames >= max {
                    break;
                }
            }
            if self.tick().is_none() {
                break;
            }
        }
        self.stats()
    }

    /// Cancels the pump, then stops every live track.
    ///
    /// Safe to call any number of times. Returns how many tracks this call
    /// stopped.
    pub fn teardown(&mut self) -> usize {
        if let Some(pump) = self.pump.as_mut() {
            pump.cancel(&mut self.scheduler);
        }
        match self.session.take() {
            Some(mut session) => session.stop(),
            None => 0,
        }
    }

    /// Encodes the current surface as PNG.
    pub fn capture_still(&mut self) -> Result<Vec<u8>, StillError> {
        let surface = self
            .pump
            .as_ref()
            .map(|p| p.surface())
            .ok_or(StillError::Empty)?;
        let png = capture_still(surface)?;
        self.stills += 1;
        Ok(png)
    }

    /// Applies manual exposure/focus to the live primary track.
    pub fn apply_controls(&mut self, controls: &ManualControls) -> Result<TrackSettings, ViewerError> {
        let session = self.session.as_mut().ok_or(ViewerError::NotRunning)?;
        Ok(session.apply_controls(controls)?)
    }

    /// Pump state; `Idle` before the first start.
    pub fn state(&self) -> PumpState {
        self.pump
            .as_ref()
            .map(|p| p.state())
            .unwrap_or(PumpState::Idle)
    }

    /// Counters of the current pump.
    pub fn stats(&self) -> PumpStats {
        self.pump.as_ref().map(|p| p.stats()).unwrap_or_default()
    }

    /// The presentation surface, once started.
    pub fn surface(&self) -> Option<&PresentationSurface> {
        self.pump.as_ref().map(|p| p.surface())
    }

    /// The live capture session, if any.
    pub fn session(&self) -> Option<&CaptureSession> {
        self.session.as_ref()
    }

    /// Transform applied to every frame.
    pub fn policy(&self) -> TransformPolicy {
        self.policy
    }

    /// Stills captured over the viewer's lifetime.
    pub fn still_count(&self) -> u64 {
        self.stills
    }

    /// The camera acquirer.
    pub fn acquirer(&self) -> &CaptureAcquirer<M> {
        &self.acquirer
    }

    /// The tick scheduler.
    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }
}

impl<M: MediaSource, S: Scheduler> Drop for Viewer<M, S> {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{CaptureConfig, MockMediaSource, MockTrack};
    use crate::pump::ManualScheduler;

    fn viewer(media: MockMediaSource) -> Viewer<MockMediaSource, ManualScheduler> {
        Viewer::new(
            CaptureAcquirer::new(media, CaptureConfig::with_dimensions(4, 4)),
            ManualScheduler::new(),
            TransformPolicy::Invert,
            PumpConfig::default(),
        )
    }

    #[test]
    fn test_presented_frames_are_inverted() {
        let mut viewer = viewer(MockMediaSource::new());
        viewer.start(FacingMode::Environment).unwrap();

        assert_eq!(viewer.tick(), Some(TickOutcome::Presented));

        // mock pattern at (0, 0) of frame 1 is (1, 0, 0, 255)
        let surface = viewer.surface().unwrap();
        assert_eq!(surface.frame().pixel(0, 0), Some([254, 255, 255, 255]));
    }

    #[test]
    fn test_run_stops_at_frame_limit() {
        let mut viewer = viewer(MockMediaSource::new());
        viewer.start(FacingMode::Any).unwrap();

        let stats = viewer.run(Some(5));
        assert_eq!(stats.presented_frames, 5);
        assert_eq!(viewer.state(), PumpState::Running);
    }

    #[test]
    fn test_run_ends_with_source() {
        let track = MockTrack::new(4, 4).with_end_after(3);
        let mut viewer = viewer(MockMediaSource::new().then_stream(vec![track]));
        viewer.start(FacingMode::Any).unwrap();

        let stats = viewer.run(None);
        assert_eq!(stats.presented_frames, 3);
        assert_eq!(viewer.state(), PumpState::Stopped);
    }

    #[test]
    fn test_still_before_start_fails() {
        let mut viewer = viewer(MockMediaSource::new());
        assert!(matches!(viewer.capture_still(), Err(StillError::Empty)));
    }

    #[test]
    fn test_apply_controls_requires_session() {
        let mut viewer = viewer(MockMediaSource::new());
        assert!(matches!(
            viewer.apply_controls(&ManualControls::default()),
            Err(ViewerError::NotRunning)
        ));
    }
}
