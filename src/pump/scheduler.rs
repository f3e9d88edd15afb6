//! Display-refresh scheduling.
//!
//! A [`Scheduler`] is the "run on next refresh" primitive: the pump
//! requests one tick at a time and the driver waits for it to fire.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Identifies one requested tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TickId(u64);

impl TickId {
    /// Raw tick number.
    pub fn get(self) -> u64 {
        self.0
    }
}

/// A source of refresh ticks.
pub trait Scheduler {
    /// Requests a tick on the next refresh.
    fn request_tick(&mut self) -> TickId;

    /// Withdraws a requested tick. Unknown or already fired ids are ignored.
    fn cancel_tick(&mut self, tick: TickId);

    /// Waits for the next requested tick to come due.
    ///
    /// Returns `None` when nothing is pending.
    fn next_tick(&mut self) -> Option<TickId>;
}

/// Fixed-cadence scheduler standing in for the display's vertical sync.
///
/// Consecutive ticks are never closer together than one refresh interval;
/// a late tick is not followed by a burst of catch-up ticks.
#[derive(Debug)]
pub struct RefreshScheduler {
    interval: Duration,
    pending: VecDeque<TickId>,
    last_fired: Option<Instant>,
    next_id: u64,
}

impl RefreshScheduler {
    /// Creates a scheduler firing at most `refresh_hz` times a second.
    pub fn new(refresh_hz: u32) -> Self {
        let hz = refresh_hz.max(1);
        Self {
            interval: Duration::from_secs(1) / hz,
            pending: VecDeque::new(),
            last_fired: None,
            next_id: 0,
        }
    }

    /// Minimum spacing between ticks.
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Scheduler for RefreshScheduler {
    fn request_tick(&mut self) -> TickId {
        self.next_id += 1;
        let tick = TickId(self.next_id);
        self.pending.push_back(tick);
        tick
    }

    fn cancel_tick(&mut self, tick: TickId) {
        self.pending.retain(|t| *t != tick);
    }

    fn next_tick(&mut self) -> Option<TickId> {
        let tick = self.pending.pop_front()?;

        let now = Instant::now();
        if let Some(deadline) = self.last_fired.map(|t| t + self.interval) {
            if deadline > now {
                std::thread::sleep(deadline - now);
            }
        }
        self.last_fired = Some(Instant::now());
        Some(tick)
    }
}

/// Scheduler that fires ticks immediately, in request order.
///
/// For tests: no real time passes, and the counters show how many ticks
/// were requested and withdrawn.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    pending: VecDeque<TickId>,
    next_id: u64,
    requested: u64,
    cancelled: u64,
}

impl ManualScheduler {
    /// Creates a scheduler with nothing pending.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ticks requested and not yet fired or withdrawn.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Ticks requested over the scheduler's lifetime.
    pub fn requested_count(&self) -> u64 {
        self.requested
    }

    /// Ticks withdrawn before firing.
    pub fn cancelled_count(&self) -> u64 {
        self.cancelled
    }
}

impl Scheduler for ManualScheduler {
    fn request_tick(&mut self) -> TickId {
        self.next_id += 1;
        self.requested += 1;
        let tick = TickId(self.next_id);
        self.pending.push_back(tick);
        tick
    }

    fn cancel_tick(&mut self, tick: TickId) {
        let before = self.pending.len();
        self.pending.retain(|t| *t != tick);
        if self.pending.len() < before {
            self.cancelled += 1;
        }
    }

    fn next_tick(&mut self) -> Option<TickId> {
        self.pending.pop_front()
    }
}
