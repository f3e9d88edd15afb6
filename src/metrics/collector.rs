//! Metrics collection and registry.

use crate::pump::{PumpState, PumpStats};
use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// Registering or encoding a metric failed.
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// A snapshot of viewer state for metrics update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Current pump state.
    pub pump_state: PumpState,
    /// Pump counters.
    pub stats: PumpStats,
    /// Presentation surface size.
    pub surface_width: u32,
    /// Presentation surface height.
    pub surface_height: u32,
    /// Times the surface was reallocated.
    pub surface_resizes: u64,
    /// Stills captured.
    pub stills: u64,
}

impl Default for MetricsSnapshot {
    fn default() -> Self {
        Self {
            pump_state: PumpState::Idle,
            stats: PumpStats::default(),
            surface_width: 0,
            surface_height: 0,
            surface_resizes: 0,
            stills: 0,
        }
    }
}

/// Prometheus metrics registry for the viewer.
pub struct MetricsRegistry {
    registry: Registry,

    // Pump metrics
    pump_state: IntGauge,
    ticks_total: IntCounter,
    waiting_ticks_total: IntCounter,
    skipped_ticks_total: IntCounter,
    frames_presented_total: IntCounter,
    frame_errors_total: IntCounter,

    // Surface metrics
    surface_width: IntGauge,
    surface_height: IntGauge,
    surface_resizes_total: IntCounter,
    stills_total: IntCounter,
}

impl MetricsRegistry {
    /// Creates a new metrics registry with all viewer metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let pump_state = IntGauge::new(
            "negative_viewer_pump_state",
            "Frame pump state (0=idle, 1=running, 2=stopped)",
        )?;
        let ticks_total = IntCounter::new(
            "negative_viewer_ticks_total",
            "Refresh ticks handled by the frame pump",
        )?;
        let waiting_ticks_total = IntCounter::new(
            "negative_viewer_waiting_ticks_total",
            "Ticks spent waiting for source dimensions",
        )?;
        let skipped_ticks_total = IntCounter::new(
            "negative_viewer_skipped_ticks_total",
            "Ticks with no new decoded frame",
        )?;
        let frames_presented_total = IntCounter::new(
            "negative_viewer_frames_presented_total",
            "Frames drawn and transformed",
        )?;
        let frame_errors_total = IntCounter::new(
            "negative_viewer_frame_errors_total",
            "Frame reads that failed and were skipped",
        )?;

        let surface_width = IntGauge::new(
            "negative_viewer_surface_width",
            "Presentation surface width in pixels",
        )?;
        let surface_height = IntGauge::new(
            "negative_viewer_surface_height",
            "Presentation surface height in pixels",
        )?;
        let surface_resizes_total = IntCounter::new(
            "negative_viewer_surface_resizes_total",
            "Presentation surface reallocations",
        )?;
        let stills_total = IntCounter::new(
            "negative_viewer_stills_total",
            "Still images captured",
        )?;

        registry.register(Box::new(pump_state.clone()))?;
        registry.register(Box::new(ticks_total.clone()))?;
        registry.register(Box::new(waiting_ticks_total.clone()))?;
        registry.register(Box::new(skipped_ticks_total.clone()))?;
        registry.register(Box::new(frames_presented_total.clone()))?;
        registry.register(Box::new(frame_errors_total.clone()))?;
        registry.register(Box::new(surface_width.clone()))?;
        registry.register(Box::new(surface_height.clone()))?;
        registry.register(Box::new(surface_resizes_total.clone()))?;
        registry.register(Box::new(stills_total.clone()))?;

        Ok(Self {
            registry,
            pump_state,
            ticks_total,
            waiting_ticks_total,
            skipped_ticks_total,
            frames_presented_total,
            frame_errors_total,
            surface_width,
            surface_height,
            surface_resizes_total,
            stills_total,
        })
    }

    /// Updates all metrics from a snapshot of viewer state.
    pub fn update(&self, snapshot: &MetricsSnapshot) {
        self.pump_state.set(snapshot.pump_state as i64);
        self.surface_width.set(snapshot.surface_width as i64);
        self.surface_height.set(snapshot.surface_height as i64);

        let stats = &snapshot.stats;
        advance(&self.ticks_total, stats.ticks);
        advance(&self.waiting_ticks_total, stats.waiting_ticks);
        advance(&self.skipped_ticks_total, stats.skipped_ticks);
        advance(&self.frames_presented_total, stats.presented_frames);
        advance(&self.frame_errors_total, stats.frame_errors);
        advance(&self.surface_resizes_total, snapshot.surface_resizes);
        advance(&self.stills_total, snapshot.stills);
    }

    /// Returns the underlying Prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

/// Counters only move forward; increment by the difference.
fn advance(counter: &IntCounter, total: u64) {
    let current = counter.get();
    if total > current {
        counter.inc_by(total - current);
    }
}

impl MetricsSnapshot {
    /// Creates a snapshot from the current state of a viewer.
    pub fn from_viewer<M, S>(viewer: &crate::lifecycle::Viewer<M, S>) -> Self
    where
        M: crate::capture::MediaSource,
        S: crate::pump::Scheduler,
    {
        let (surface_width, surface_height, surface_resizes) = viewer
            .surface()
            .map(|s| (s.dimensions().0, s.dimensions().1, s.resize_count()))
            .unwrap_or((0, 0, 0));

        Self {
            pump_state: viewer.state(),
            stats: viewer.stats(),
            surface_width,
            surface_height,
            surface_resizes,
            stills: viewer.still_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_creation() {
        let registry = MetricsRegistry::new();
        assert!(registry.is_ok());
    }

    #[test]
    fn test_metrics_update() {
        let registry = MetricsRegistry::new().unwrap();

        let snapshot = MetricsSnapshot {
            pump_state: PumpState::Running,
            stats: PumpStats {
                ticks: 12,
                waiting_ticks: 2,
                skipped_ticks: 1,
                presented_frames: 9,
                frame_errors: 0,
                callback_errors: 0,
            },
            surface_width: 640,
            surface_height: 480,
            surface_resizes: 1,
            stills: 0,
        };

        registry.update(&snapshot);
        registry.update(&snapshot);

        let output = registry.encode().unwrap();
        assert!(output.contains("negative_viewer_pump_state 1"));
        assert!(output.contains("negative_viewer_frames_presented_total 9"));
        assert!(output.contains("negative_viewer_surface_width 640"));
    }

    #[test]
    fn test_snapshot_after_teardown_reports_stopped() {
        use crate::capture::{CaptureAcquirer, CaptureConfig, FacingMode, MockMediaSource};
        use crate::lifecycle::Viewer;
        use crate::pump::{ManualScheduler, PumpConfig};
        use crate::transform::TransformPolicy;

        let mut viewer = Viewer::new(
            CaptureAcquirer::new(MockMediaSource::new(), CaptureConfig::with_dimensions(4, 4)),
            ManualScheduler::new(),
            TransformPolicy::Invert,
            PumpConfig::default(),
        );
        viewer.start(FacingMode::Any).unwrap();
        viewer.run(Some(3));

        let registry = MetricsRegistry::new().unwrap();
        registry.update(&MetricsSnapshot::from_viewer(&viewer));
        assert!(registry.encode().unwrap().contains("negative_viewer_pump_state 1"));

        viewer.teardown();
        let snapshot = MetricsSnapshot::from_viewer(&viewer);
        registry.update(&snapshot);

        assert_eq!(snapshot.pump_state, PumpState::Stopped);
        assert_eq!(snapshot.stats.presented_frames, 3);
        let output = registry.encode().unwrap();
        assert!(output.contains("negative_viewer_pump_state 2"));
        assert!(output.contains("negative_viewer_frames_presented_total 3"));
    }

    #[test]
    fn test_metrics_encode() {
        let registry = MetricsRegistry::new().unwrap();
        let output = registry.encode().unwrap();

        assert!(output.contains("negative_viewer_pump_state"));
        assert!(output.contains("negative_viewer_ticks_total"));
        assert!(output.contains("negative_viewer_stills_total"));
    }
}
