//! Prometheus metrics for the viewer.
//!
//! # Metrics Exposed
//!
//! ## Pump
//! - `negative_viewer_pump_state` - 0=idle, 1=running, 2=stopped
//! - `negative_viewer_ticks_total` - Refresh ticks handled
//! - `negative_viewer_waiting_ticks_total` - Ticks spent waiting for dimensions
//! - `negative_viewer_skipped_ticks_total` - Ticks without a new frame
//! - `negative_viewer_frames_presented_total` - Frames drawn and transformed
//! - `negative_viewer_frame_errors_total` - Failed frame reads
//!
//! ## Surface
//! - `negative_viewer_surface_width` / `negative_viewer_surface_height`
//! - `negative_viewer_surface_resizes_total`
//! - `negative_viewer_stills_total`
//!
//! The HTTP exporter (`/metrics`, `/health`) needs the `metrics` feature.

mod collector;
#[cfg(feature = "metrics")]
mod server;

pub use collector::{MetricsError, MetricsRegistry, MetricsSnapshot};
#[cfg(feature = "metrics")]
pub use server::{MetricsServer, MetricsServerConfig, MetricsState, ServerError};
