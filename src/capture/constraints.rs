//! Capture constraints and device capability negotiation.

use serde::{Deserialize, Serialize};

/// Which way the requested camera should face.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// Rear camera.
    #[default]
    Environment,
    /// Front (selfie) camera.
    User,
    /// Whatever the host picks.
    Any,
}

impl std::fmt::Display for FacingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FacingMode::Environment => write!(f, "environment"),
            FacingMode::User => write!(f, "user"),
            FacingMode::Any => write!(f, "any"),
        }
    }
}

/// One attempt's worth of constraints passed to the media source.
///
/// Resolution and frame rate are ideals: the host may pick the closest
/// mode it has.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConstraintSet {
    /// Preferred camera facing.
    pub facing: FacingMode,
    /// Ideal (width, height); `None` means the device default.
    pub ideal_resolution: Option<(u32, u32)>,
    /// Ideal frame rate, if any.
    pub ideal_fps: Option<u32>,
}

impl ConstraintSet {
    /// Any camera at its default mode.
    pub fn any() -> Self {
        Self {
            facing: FacingMode::Any,
            ideal_resolution: None,
            ideal_fps: None,
        }
    }

    /// Constraints for one facing with no resolution preference.
    pub fn with_facing(facing: FacingMode) -> Self {
        Self {
            facing,
            ..Self::any()
        }
    }

    /// Adds an ideal resolution.
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.ideal_resolution = Some((width, height));
        self
    }

    /// Adds an ideal frame rate.
    pub fn with_fps(mut self, fps: u32) -> Self {
        self.ideal_fps = Some(fps);
        self
    }
}

impl std::fmt::Display for ConstraintSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "facing={}", self.facing)?;
        match self.ideal_resolution {
            Some((w, h)) => write!(f, " {}x{}", w, h)?,
            None => write!(f, " default-resolution")?,
        }
        if let Some(fps) = self.ideal_fps {
            write!(f, " @{}fps", fps)?;
        }
        Ok(())
    }
}

/// Builds the ordered fallback list, most specific first.
///
/// `{facing, resolution, fps}` → `{facing}` → `{any, resolution}` → `{any}`.
/// Rungs that collapse into an earlier one are dropped.
pub fn fallback_ladder(
    facing: FacingMode,
    ideal_resolution: Option<(u32, u32)>,
    ideal_fps: Option<u32>,
) -> Vec<ConstraintSet> {
    let candidates = [
        ConstraintSet {
            facing,
            ideal_resolution,
            ideal_fps,
        },
        ConstraintSet::with_facing(facing),
        ConstraintSet {
            facing: FacingMode::Any,
            ideal_resolution,
            ideal_fps: None,
        },
        ConstraintSet::any(),
    ];

    let mut ladder: Vec<ConstraintSet> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if !ladder.contains(&candidate) {
            ladder.push(candidate);
        }
    }
    ladder
}

/// An advertised numeric control range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlRange {
    /// Smallest accepted value.
    pub min: f64,
    /// Largest accepted value.
    pub max: f64,
    /// Granularity; zero or negative means continuous.
    pub step: f64,
}

impl ControlRange {
    /// Creates a range.
    pub fn new(min: f64, max: f64, step: f64) -> Self {
        Self { min, max, step }
    }

    /// False for inverted or non-finite ranges, which devices occasionally
    /// report.
    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min <= self.max
    }

    /// Clamps into range and snaps to the nearest step above `min`.
    ///
    /// An invalid range leaves `value` untouched.
    pub fn normalize(&self, value: f64) -> f64 {
        if !self.is_valid() {
            return value;
        }
        let clamped = value.clamp(self.min, self.max);
        if self.step <= 0.0 {
            return clamped;
        }
        let steps = ((clamped - self.min) / self.step).round();
        (self.min + steps * self.step).min(self.max)
    }
}

/// How a control is driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMode {
    /// Device drives the control itself.
    Continuous,
    /// Value is set explicitly.
    Manual,
}

/// What a video track says it can do.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackCapabilities {
    /// Exposure time range, if adjustable.
    pub exposure_time: Option<ControlRange>,
    /// Supported exposure modes.
    pub exposure_modes: Vec<ControlMode>,
    /// Focus distance range, if adjustable.
    pub focus_distance: Option<ControlRange>,
    /// Supported focus modes.
    pub focus_modes: Vec<ControlMode>,
}

impl TrackCapabilities {
    /// Manual exposure needs a usable range and a manual mode.
    pub fn supports_manual_exposure(&self) -> bool {
        self.exposure_time.is_some_and(|r| r.is_valid()) && allows_manual(&self.exposure_modes)
    }

    /// Manual focus needs a usable range and a manual mode.
    pub fn supports_manual_focus(&self) -> bool {
        self.focus_distance.is_some_and(|r| r.is_valid()) && allows_manual(&self.focus_modes)
    }
}

/// Empty mode lists mean the device did not enumerate modes; assume manual works.
fn allows_manual(modes: &[ControlMode]) -> bool {
    modes.is_empty() || modes.contains(&ControlMode::Manual)
}

/// Manual control values requested by the user.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ManualControls {
    /// Requested exposure time.
    pub exposure_time: Option<f64>,
    /// Requested focus distance.
    pub focus_distance: Option<f64>,
}

/// Normalized constraints to apply to a live track.
///
/// Only contains keys the device advertised; values lie inside the
/// advertised range.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackSettings {
    /// Exposure mode to switch to.
    pub exposure_mode: Option<ControlMode>,
    /// Exposure time inside the advertised range.
    pub exposure_time: Option<f64>,
    /// Focus mode to switch to.
    pub focus_mode: Option<ControlMode>,
    /// Focus distance inside the advertised range.
    pub focus_distance: Option<f64>,
}

impl TrackSettings {
    /// Negotiates requested controls against device capabilities.
    pub fn negotiate(capabilities: &TrackCapabilities, requested: &ManualControls) -> Self {
        let mut settings = Self::default();

        match (requested.exposure_time, capabilities.exposure_time) {
            (Some(value), Some(range)) if capabilities.supports_manual_exposure() => {
                settings.exposure_mode = Some(ControlMode::Manual);
                settings.exposure_time = Some(range.normalize(value));
            }
            (Some(value), _) => {
                tracing::debug!(value, "Exposure control not supported; dropped");
            }
            _ => {}
        }

        match (requested.focus_distance, capabilities.focus_distance) {
            (Some(value), Some(range)) if capabilities.supports_manual_focus() => {
                settings.focus_mode = Some(ControlMode::Manual);
                settings.focus_distance = Some(range.normalize(value));
            }
            (Some(value), _) => {
                tracing::debug!(value, "Focus control not supported; dropped");
            }
            _ => {}
        }

        settings
    }

    /// True when nothing survived negotiation.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ladder_order() {
        let ladder = fallback_ladder(FacingMode::Environment, Some((1920, 1080)), Some(30));

        assert_eq!(ladder.len(), 4);
        assert_eq!(ladder[0].facing, FacingMode::Environment);
        assert_eq!(ladder[0].ideal_resolution, Some((1920, 1080)));
        assert_eq!(ladder[1], ConstraintSet::with_facing(FacingMode::Environment));
        assert_eq!(ladder[2].facing, FacingMode::Any);
        assert_eq!(ladder[2].ideal_resolution, Some((1920, 1080)));
        assert_eq!(ladder[3], ConstraintSet::any());
    }

    #[test]
    fn test_ladder_dedups_any_facing() {
        let ladder = fallback_ladder(FacingMode::Any, None, None);
        assert_eq!(ladder, vec![ConstraintSet::any()]);
    }

    #[test]
    fn test_range_normalize() {
        let range = ControlRange::new(10.0, 100.0, 5.0);

        assert_eq!(range.normalize(3.0), 10.0);
        assert_eq!(range.normalize(500.0), 100.0);
        assert_eq!(range.normalize(22.0), 20.0);
        assert_eq!(ControlRange::new(0.0, 1.0, 0.0).normalize(0.37), 0.37);
    }

    #[test]
    fn test_negotiate_only_supported_keys() {
        let caps = TrackCapabilities {
            exposure_time: Some(ControlRange::new(1.0, 1000.0, 1.0)),
            exposure_modes: vec![ControlMode::Continuous, ControlMode::Manual],
            focus_distance: None,
            focus_modes: vec![],
        };
        let requested = ManualControls {
            exposure_time: Some(5000.0),
            focus_distance: Some(0.5),
        };

        let settings = TrackSettings::negotiate(&caps, &requested);

        assert_eq!(settings.exposure_mode, Some(ControlMode::Manual));
        assert_eq!(settings.exposure_time, Some(1000.0));
        assert_eq!(settings.focus_mode, None);
        assert_eq!(settings.focus_distance, None);
    }

    #[test]
    fn test_inverted_range_is_unsupported() {
        let inverted = ControlRange::new(100.0, 1.0, 1.0);
        assert!(!inverted.is_valid());
        assert_eq!(inverted.normalize(50.0), 50.0);
        assert!(!ControlRange::new(0.0, f64::NAN, 1.0).is_valid());

        let caps = TrackCapabilities {
            exposure_time: Some(inverted),
            exposure_modes: vec![ControlMode::Manual],
            ..Default::default()
        };
        let requested = ManualControls {
            exposure_time: Some(50.0),
            ..Default::default()
        };

        assert!(!caps.supports_manual_exposure());
        assert!(TrackSettings::negotiate(&caps, &requested).is_empty());
    }

    #[test]
    fn test_negotiate_continuous_only_device() {
        let caps = TrackCapabilities {
            focus_distance: Some(ControlRange::new(0.0, 10.0, 0.1)),
            focus_modes: vec![ControlMode::Continuous],
            ..Default::default()
        };
        let requested = ManualControls {
            focus_distance: Some(1.0),
            ..Default::default()
        };

        assert!(TrackSettings::negotiate(&caps, &requested).is_empty());
    }
}
