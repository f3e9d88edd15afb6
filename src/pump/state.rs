//! Pump state and the shared cancellation handle.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// Lifecycle of a frame pump.
///
/// `Idle → Running → Stopped`. There is no way back to `Idle`; a new
/// session gets a new pump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PumpState {
    /// Armed, waiting for the source to report its dimensions.
    Idle = 0,
    /// Producing frames.
    Running = 1,
    /// Cancelled, timed out, or the source ended.
    Stopped = 2,
}

impl PumpState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => PumpState::Idle,
            1 => PumpState::Running,
            _ => PumpState::Stopped,
        }
    }
}

impl std::fmt::Display for PumpState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PumpState::Idle => write!(f, "idle"),
            PumpState::Running => write!(f, "running"),
            PumpState::Stopped => write!(f, "stopped"),
        }
    }
}

/// Cloneable handle to a pump's state.
///
/// Cancellation is cooperative: [`cancel`](Self::cancel) only flips the
/// state; the pump observes it on its next tick and stops scheduling.
#[derive(Debug, Clone)]
pub struct PumpHandle {
    state: Arc<AtomicU8>,
}

impl PumpHandle {
    pub(crate) fn new() -> Self {
        Self {
            state: Arc::new(AtomicU8::new(PumpState::Idle as u8)),
        }
    }

    /// Current state.
    pub fn state(&self) -> PumpState {
        PumpState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// True once cancelled, timed out, or ended.
    pub fn is_stopped(&self) -> bool {
        self.state() == PumpState::Stopped
    }

    /// Requests the pump to stop. Returns false if it was already stopped.
    pub fn cancel(&self) -> bool {
        self.state.swap(PumpState::Stopped as u8, Ordering::AcqRel) != PumpState::Stopped as u8
    }

    /// `Idle → Running`; fails if a cancel got there first.
    pub(crate) fn begin_running(&self) -> bool {
        self.state
            .compare_exchange(
                PumpState::Idle as u8,
                PumpState::Running as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }
}
