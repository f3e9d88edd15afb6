//! Native camera backend built on `nokhwa`.

use super::{
    CaptureError, ConstraintSet, ControlMode, ControlRange, FacingMode, MediaSource, MediaStream,
    TrackCapabilities, TrackSettings, VideoTrack,
};
use crate::surface::{FrameBuffer, FrameError};
use nokhwa::pixel_format::RgbAFormat;
use nokhwa::utils::{
    ApiBackend, CameraFormat, CameraIndex, CameraInfo, ControlValueDescription,
    ControlValueSetter, FrameFormat, KnownCameraControl, RequestedFormat, RequestedFormatType,
    Resolution,
};
use nokhwa::Camera;

const REAR_HINTS: &[&str] = &["back", "rear", "environment", "world"];
const FRONT_HINTS: &[&str] = &["front", "user", "facetime", "integrated", "selfie"];

/// Media source backed by the platform's native camera API.
#[derive(Debug, Default)]
pub struct NativeMediaSource {
    device_index: Option<u32>,
}

impl NativeMediaSource {
    /// Uses the device at `device_index`, or picks one by facing when `None`.
    pub fn new(device_index: Option<u32>) -> Self {
        Self { device_index }
    }
}

impl MediaSource for NativeMediaSource {
    fn request_stream(&mut self, constraints: &ConstraintSet) -> Result<MediaStream, CaptureError> {
        let devices = nokhwa::query(ApiBackend::Auto).map_err(classify)?;
        if devices.is_empty() {
            return Err(CaptureError::NoDevice);
        }

        let info = select_device(&devices, constraints.facing, self.device_index).ok_or_else(
            || CaptureError::ConstraintUnsatisfiable(format!("no {} camera", constraints.facing)),
        )?;

        let requested = match constraints.ideal_resolution {
            Some((w, h)) => RequestedFormat::new::<RgbAFormat>(RequestedFormatType::Closest(
                CameraFormat::new(
                    Resolution::new(w, h),
                    FrameFormat::MJPEG,
                    constraints.ideal_fps.unwrap_or(30),
                ),
            )),
            None => RequestedFormat::new::<RgbAFormat>(RequestedFormatType::AbsoluteHighestFrameRate),
        };

        let mut camera = Camera::new(info.index().clone(), requested).map_err(classify)?;
        camera.open_stream().map_err(classify)?;

        let track = NativeTrack {
            id: info.index().to_string(),
            label: info.human_name(),
            camera,
            sequence: 0,
            live: true,
        };
        tracing::info!(device = %track.label, "Native camera opened");
        Ok(MediaStream::new(vec![Box::new(track)]))
    }
}

fn select_device(
    devices: &[CameraInfo],
    facing: FacingMode,
    index: Option<u32>,
) -> Option<&CameraInfo> {
    if let Some(index) = index {
        return devices
            .iter()
            .find(|d| matches!(d.index(), CameraIndex::Index(i) if *i == index));
    }

    let hints = match facing {
        FacingMode::Any => return devices.first(),
        FacingMode::Environment => REAR_HINTS,
        FacingMode::User => FRONT_HINTS,
    };
    devices.iter().find(|d| {
        let name = format!("{} {}", d.human_name(), d.description()).to_lowercase();
        hints.iter().any(|hint| name.contains(hint))
    })
}

fn classify(error: nokhwa::NokhwaError) -> CaptureError {
    let text = error.to_string();
    let lower = text.to_lowercase();
    if lower.contains("permission") || lower.contains("denied") {
        CaptureError::PermissionDenied
    } else if lower.contains("no device") || lower.contains("not found") {
        CaptureError::NoDevice
    } else {
        CaptureError::Backend(text)
    }
}

struct NativeTrack {
    id: String,
    label: String,
    camera: Camera,
    sequence: u64,
    live: bool,
}

impl NativeTrack {
    fn control_range(&self, control: KnownCameraControl) -> Option<ControlRange> {
        let control = self.camera.camera_control(control).ok()?;
        let range = match control.description() {
            ControlValueDescription::IntegerRange { min, max, step, .. } => {
                Some(ControlRange::new(*min as f64, *max as f64, *step as f64))
            }
            ControlValueDescription::FloatRange { min, max, step, .. } => {
                Some(ControlRange::new(*min, *max, *step))
            }
            _ => None,
        };
        range.filter(ControlRange::is_valid)
    }

    fn set_control(&mut self, control: KnownCameraControl, value: f64) -> Result<(), CaptureError> {
        self.camera
            .set_camera_control(control, ControlValueSetter::Integer(value.round() as i64))
            .map_err(classify)
    }
}

impl VideoTrack for NativeTrack {
    fn id(&self) -> &str {
        &self.id
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn dimensions(&self) -> (u32, u32) {
        let resolution = self.camera.resolution();
        (resolution.width(), resolution.height())
    }

    // `frame()` blocks until the driver hands over the next buffer.
    fn has_new_frame(&mut self) -> bool {
        self.live
    }

    fn read_frame(&mut self, dst: &mut FrameBuffer) -> Result<(), FrameError> {
        let buffer = self
            .camera
            .frame()
            .map_err(|e| FrameError::ReadFailure(e.to_string()))?;
        let decoded = buffer
            .decode_image::<RgbAFormat>()
            .map_err(|e| FrameError::ReadFailure(e.to_string()))?;

        dst.copy_from(decoded.as_raw(), decoded.width(), decoded.height())?;
        self.sequence += 1;
        dst.stamp(self.sequence);
        Ok(())
    }

    fn capabilities(&self) -> TrackCapabilities {
        TrackCapabilities {
            exposure_time: self.control_range(KnownCameraControl::Exposure),
            exposure_modes: vec![ControlMode::Manual],
            focus_distance: self.control_range(KnownCameraControl::Focus),
            focus_modes: vec![ControlMode::Manual],
        }
    }

    fn apply_settings(&mut self, settings: &TrackSettings) -> Result<(), CaptureError> {
        if let Some(exposure) = settings.exposure_time {
            self.set_control(KnownCameraControl::Exposure, exposure)?;
        }
        if let Some(focus) = settings.focus_distance {
            self.set_control(KnownCameraControl::Focus, focus)?;
        }
        Ok(())
    }

    fn is_live(&self) -> bool {
        self.live
    }

    fn stop(&mut self) {
        if let Err(e) = self.camera.stop_stream() {
            tracing::warn!(device = %self.label, error = %e, "Failed to stop camera stream");
        }
        self.live = false;
        tracing::info!(device = %self.label, "Native camera closed");
    }
}
