//! The frame pump: one video frame per refresh tick.
//!
//! The pump is an explicit state machine driven by a [`Scheduler`]. Each
//! tick either waits for the source's metadata, skips (no new frame), or
//! draws the newest frame onto the presentation surface and hands it to the
//! frame callback. Exactly one tick is outstanding at any time.

mod scheduler;
mod state;

pub use scheduler::{ManualScheduler, RefreshScheduler, Scheduler, TickId};
pub use state::{PumpHandle, PumpState};

use crate::capture::{ConfigError, VideoTrack};
use crate::surface::{FrameBuffer, FrameError, PresentationSurface};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from starting a pump.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PumpError {
    /// `start` was called twice.
    #[error("pump has already been started")]
    AlreadyStarted,
    /// The pump was cancelled before it started.
    #[error("pump is stopped")]
    Stopped,
}

/// Pump and scheduler settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PumpConfig {
    /// Refresh cadence ticks are scheduled at.
    pub refresh_hz: u32,
    /// Ticks to wait for non-zero source dimensions before giving up.
    /// `None` or `Some(0)` waits forever; the config file uses `0`.
    pub max_wait_ticks: Option<u64>,
}

impl Default for PumpConfig {
    fn default() -> Self {
        Self {
            refresh_hz: 60,
            max_wait_ticks: Some(600),
        }
    }
}

impl PumpConfig {
    /// Checks the refresh rate is within 1-240 Hz.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.refresh_hz == 0 || self.refresh_hz > 240 {
            return Err(ConfigError::InvalidRefreshRate);
        }
        Ok(())
    }
}

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Stale or post-cancellation tick; nothing happened.
    Ignored,
    /// Source dimensions not known yet.
    Waiting,
    /// No new decoded frame since the last tick.
    Skipped,
    /// A frame was drawn and passed to the callback.
    Presented,
    /// Reading the frame failed; the pump carries on.
    FrameFailed,
    /// The source ended; the pump stopped.
    Ended,
    /// Dimensions never arrived; the pump stopped.
    TimedOut,
}

/// Running counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PumpStats {
    /// Ticks handled, excluding stale ones.
    pub ticks: u64,
    /// Ticks spent waiting for dimensions.
    pub waiting_ticks: u64,
    /// Ticks with no new frame.
    pub skipped_ticks: u64,
    /// Frames drawn and handed to the callback.
    pub presented_frames: u64,
    /// Frame reads that failed.
    pub frame_errors: u64,
    /// Callback invocations that failed.
    pub callback_errors: u64,
}

/// Callback invoked with each freshly drawn frame.
pub type FrameCallback = Box<dyn FnMut(&mut FrameBuffer) -> Result<(), FrameError>>;

/// Advances one video frame per scheduling tick onto a presentation surface.
pub struct FramePump {
    handle: PumpHandle,
    config: PumpConfig,
    on_frame: FrameCallback,
    surface: PresentationSurface,
    pending: Option<TickId>,
    started: bool,
    stats: PumpStats,
}

impl FramePump {
    /// Creates an idle pump that hands each drawn frame to `on_frame`.
    pub fn new<F>(config: PumpConfig, on_frame: F) -> Self
    where
        F: FnMut(&mut FrameBuffer) -> Result<(), FrameError> + 'static,
    {
        Self {
            handle: PumpHandle::new(),
            config,
            on_frame: Box::new(on_frame),
            surface: PresentationSurface::new(),
            pending: None,
            started: false,
            stats: PumpStats::default(),
        }
    }

    /// Arms the pump by requesting its first tick.
    pub fn start<S: Scheduler + ?Sized>(&mut self, scheduler: &mut S) -> Result<PumpHandle, PumpError> {
        if self.handle.is_stopped() {
            return Err(PumpError::Stopped);
        }
        if self.started {
            return Err(PumpError::AlreadyStarted);
        }
        self.started = true;
        self.pending = Some(scheduler.request_tick());
        tracing::info!("Frame pump armed; waiting for source dimensions");
        Ok(self.handle.clone())
    }

    /// Stops the pump and withdraws its outstanding tick.
    pub fn cancel<S: Scheduler + ?Sized>(&mut self, scheduler: &mut S) {
        if self.handle.cancel() {
            tracing::info!(presented = self.stats.presented_frames, "Frame pump cancelled");
        }
        if let Some(tick) = self.pending.take() {
            scheduler.cancel_tick(tick);
        }
    }

    /// Handles a fired tick.
    ///
    /// Ticks other than the outstanding one, and any tick after
    /// cancellation, are no-ops.
    pub fn on_tick<S: Scheduler + ?Sized>(
        &mut self,
        tick: TickId,
        source: &mut dyn VideoTrack,
        scheduler: &mut S,
    ) -> TickOutcome {
        if self.pending != Some(tick) {
            tracing::trace!(tick = tick.get(), "Ignoring stale tick");
            return TickOutcome::Ignored;
        }
        self.pending = None;
        if self.handle.is_stopped() {
            return TickOutcome::Ignored;
        }
        self.stats.ticks += 1;

        if !source.is_live() {
            self.handle.cancel();
            tracing::info!(track = %source.id(), "Source ended; frame pump stopped");
            return TickOutcome::Ended;
        }

        let outcome = match self.handle.state() {
            PumpState::Idle => match self.await_dimensions(source) {
                Some(outcome) => outcome,
                None => self.pull_frame(source),
            },
            PumpState::Running => self.pull_frame(source),
            PumpState::Stopped => return TickOutcome::Ignored,
        };
        if outcome == TickOutcome::TimedOut {
            return outcome;
        }

        // the callback may have cancelled through a handle clone
        if !self.handle.is_stopped() {
            self.pending = Some(scheduler.request_tick());
        }
        outcome
    }

    /// Idle-phase poll. Returns `None` once the source is ready and the
    /// pump has switched to running.
    fn await_dimensions(&mut self, source: &dyn VideoTrack) -> Option<TickOutcome> {
        let (width, height) = source.dimensions();
        if width > 0 && height > 0 {
            if !self.handle.begin_running() {
                return Some(TickOutcome::Ignored);
            }
            tracing::info!(
                width,
                height,
                waited_ticks = self.stats.waiting_ticks,
                "Source ready; frame pump running"
            );
            return None;
        }

        self.stats.waiting_ticks += 1;
        if let Some(max) = self.config.max_wait_ticks.filter(|&max| max > 0) {
            if self.stats.waiting_ticks >= max {
                self.handle.cancel();
                tracing::warn!(
                    waited_ticks = self.stats.waiting_ticks,
                    "Source never reported its dimensions; frame pump stopped"
                );
                return Some(TickOutcome::TimedOut);
            }
        }
        Some(TickOutcome::Waiting)
    }

    fn pull_frame(&mut self, source: &mut dyn VideoTrack) -> TickOutcome {
        if !source.has_new_frame() {
            self.stats.skipped_ticks += 1;
            return TickOutcome::Skipped;
        }

        let (width, height) = source.dimensions();
        if width == 0 || height == 0 {
            self.stats.skipped_ticks += 1;
            return TickOutcome::Skipped;
        }

        if let Err(error) = self.surface.draw_from(source) {
            self.stats.frame_errors += 1;
            tracing::warn!(%error, "Frame read failed; continuing");
            return TickOutcome::FrameFailed;
        }

        self.stats.presented_frames += 1;
        if let Err(error) = (self.on_frame)(self.surface.frame_mut()) {
            self.stats.callback_errors += 1;
            tracing::warn!(%error, "Frame callback failed");
        }
        tracing::trace!(sequence = self.surface.frame().sequence(), "Frame presented");
        TickOutcome::Presented
    }

    /// A cancellation handle for this pump.
    pub fn handle(&self) -> PumpHandle {
        self.handle.clone()
    }

    /// Current state.
    pub fn state(&self) -> PumpState {
        self.handle.state()
    }

    /// The outstanding tick, if any.
    pub fn pending_tick(&self) -> Option<TickId> {
        self.pending
    }

    /// Running counters.
    pub fn stats(&self) -> PumpStats {
        self.stats
    }

    /// The surface frames are drawn onto.
    pub fn surface(&self) -> &PresentationSurface {
        &self.surface
    }
}

impl std::fmt::Debug for FramePump {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FramePump")
            .field("state", &self.state())
            .field("pending", &self.pending)
            .field("surface", &self.surface.dimensions())
            .field("stats", &self.stats)
            .finish()
    }
}
