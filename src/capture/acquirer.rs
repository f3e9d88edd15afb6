//! Camera acquisition with constraint fallback.

use super::{
    fallback_ladder, CaptureConfig, CaptureError, CaptureSession, ConstraintSet, FacingMode,
    MediaSource,
};
use thiserror::Error;

/// Every fallback attempt failed.
///
/// `Display` gives a message suitable for showing the user; the underlying
/// reason (taken from the last attempt) is kept for callers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", user_message(.reason))]
pub struct AcquireFailure {
    /// Reason derived from the last attempt.
    pub reason: CaptureError,
    /// Stream requests made before giving up.
    pub attempts: usize,
}

fn user_message(reason: &CaptureError) -> &'static str {
    match reason {
        CaptureError::PermissionDenied => {
            "Camera access was denied. Allow camera permission and try again."
        }
        CaptureError::NoDevice => "No camera was found on this device.",
        CaptureError::InsecureContext => {
            "Camera access requires a secure (HTTPS or localhost) context."
        }
        CaptureError::ConstraintUnsatisfiable(_)
        | CaptureError::NoVideoTrack
        | CaptureError::Backend(_) => "The camera could not be started with any supported settings.",
    }
}

/// Requests a camera stream, walking a fallback ladder of constraints.
pub struct CaptureAcquirer<M> {
    media: M,
    config: CaptureConfig,
}

impl<M: MediaSource> CaptureAcquirer<M> {
    /// Creates an acquirer over `media`.
    pub fn new(media: M, config: CaptureConfig) -> Self {
        Self { media, config }
    }

    /// The fallback ladder for a facing preference under this configuration.
    pub fn ladder(&self, preferred: FacingMode) -> Vec<ConstraintSet> {
        fallback_ladder(
            preferred,
            Some((self.config.ideal_width, self.config.ideal_height)),
            Some(self.config.ideal_fps),
        )
    }

    /// Acquires a session, preferring a camera facing `preferred`.
    pub fn acquire(&mut self, preferred: FacingMode) -> Result<CaptureSession, AcquireFailure> {
        let ladder = self.ladder(preferred);
        self.acquire_with(&ladder)
    }

    /// Tries each constraint set in order and returns the first usable session.
    pub fn acquire_with(
        &mut self,
        ladder: &[ConstraintSet],
    ) -> Result<CaptureSession, AcquireFailure> {
        if !self.media.is_secure_context() {
            tracing::warn!("Camera requested from an insecure context");
            return Err(AcquireFailure {
                reason: CaptureError::InsecureContext,
                attempts: 0,
            });
        }

        let mut last_error = CaptureError::ConstraintUnsatisfiable("no constraint sets".into());
        let mut attempts = 0;

        for constraints in ladder {
            attempts += 1;
            tracing::debug!(attempt = attempts, %constraints, "Requesting camera stream");

            match self.media.request_stream(constraints) {
                Ok(stream) if stream.live_track_count() > 0 => {
                    tracing::info!(
                        attempt = attempts,
                        %constraints,
                        tracks = stream.live_track_count(),
                        "Camera stream acquired"
                    );
                    return Ok(CaptureSession::new(stream, constraints.clone()));
                }
                Ok(mut stream) => {
                    stream.stop_all();
                    tracing::debug!(attempt = attempts, "Stream had no live video track");
                    last_error = CaptureError::NoVideoTrack;
                }
                Err(error) => {
                    tracing::debug!(attempt = attempts, %error, "Camera request failed");
                    last_error = error;
                }
            }

            if last_error == CaptureError::InsecureContext {
                break;
            }
        }

        tracing::warn!(attempts, reason = %last_error, "Camera acquisition exhausted all fallbacks");
        Err(AcquireFailure {
            reason: last_error,
            attempts,
        })
    }

    /// The underlying media source.
    pub fn media(&self) -> &M {
        &self.media
    }

    /// Mutable access to the media source.
    pub fn media_mut(&mut self) -> &mut M {
        &mut self.media
    }

    /// Capture preferences the ladder is built from.
    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }
}
