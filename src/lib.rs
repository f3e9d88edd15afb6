//! Negative Viewer Library
//!
//! Live camera preview with a real-time film-negative (or channel swap)
//! filter.
//!
//! # Architecture
//!
//! ```text
//! capture ──stream──▶ pump ──raw frame──▶ transform ──▶ surface
//!    ▲                 ▲                                  │
//!    └──── lifecycle (owns session + pump, tears down) ───┘
//! ```
//!
//! # Design Principles
//!
//! - **Single-threaded ticks**: the pump runs one tick at a time; a tick
//!   finishes before the next one is requested
//! - **Cooperative cancellation**: a cancelled pump no-ops any tick still in
//!   flight
//! - **Degrade, never crash**: frame read failures are logged and skipped;
//!   acquisition failures surface as one readable message
//!
//! # Example
//!
//! ```no_run
//! use negative_viewer::{
//!     capture::{CaptureAcquirer, CaptureConfig, FacingMode, MockMediaSource},
//!     lifecycle::Viewer,
//!     pump::{PumpConfig, RefreshScheduler},
//!     transform::TransformPolicy,
//! };
//!
//! let acquirer = CaptureAcquirer::new(MockMediaSource::new(), CaptureConfig::default());
//! let mut viewer = Viewer::new(
//!     acquirer,
//!     RefreshScheduler::new(60),
//!     TransformPolicy::Invert,
//!     PumpConfig::default(),
//! );
//!
//! viewer.start(FacingMode::Environment).unwrap();
//! viewer.run(Some(30));
//!
//! let png = viewer.capture_still().unwrap();
//! viewer.teardown();
//! # let _ = png;
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod capture;
pub mod collaborators;
pub mod lifecycle;
pub mod metrics;
pub mod pump;
pub mod surface;
pub mod transform;

// Re-export commonly used types at crate root
pub use capture::{
    AcquireFailure, CaptureAcquirer, CaptureConfig, CaptureError, CaptureSession, FacingMode,
    MockMediaSource,
};
pub use lifecycle::{Viewer, ViewerError};
pub use pump::{FramePump, PumpHandle, PumpState, RefreshScheduler, Scheduler};
pub use surface::{FrameBuffer, PresentationSurface};
pub use transform::{transform, TransformPolicy};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
