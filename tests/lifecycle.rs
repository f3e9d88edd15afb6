//! Viewer lifecycle: start, teardown, overlapping starts, still capture.

use negative_viewer::capture::{
    CaptureAcquirer, CaptureConfig, CaptureError, ControlMode, ControlRange, FacingMode,
    ManualControls, MockMediaSource, MockTrack, TrackCapabilities,
};
use negative_viewer::lifecycle::{Viewer, ViewerError};
use negative_viewer::pump::{ManualScheduler, PumpConfig, PumpState, TickOutcome};
use negative_viewer::surface::save_still;
use negative_viewer::transform::TransformPolicy;

fn viewer_with(media: MockMediaSource) -> Viewer<MockMediaSource, ManualScheduler> {
    Viewer::new(
        CaptureAcquirer::new(media, CaptureConfig::with_dimensions(8, 8)),
        ManualScheduler::new(),
        TransformPolicy::Invert,
        PumpConfig::default(),
    )
}

#[test]
fn teardown_twice_is_safe_and_releases_everything() {
    let track = MockTrack::new(8, 8);
    let probe = track.probe();
    let mut viewer = viewer_with(MockMediaSource::new().then_stream(vec![track]));
    viewer.start(FacingMode::Environment).unwrap();
    viewer.run(Some(3));

    assert_eq!(viewer.teardown(), 1);
    assert_eq!(viewer.teardown(), 0);

    assert_eq!(viewer.state(), PumpState::Stopped);
    assert!(viewer.session().is_none());
    assert!(!probe.is_live());
    assert_eq!(probe.stop_calls(), 1);
    assert_eq!(viewer.scheduler().pending_count(), 0);
}

#[test]
fn teardown_before_start_is_noop() {
    let mut viewer = viewer_with(MockMediaSource::new());
    assert_eq!(viewer.teardown(), 0);
    assert_eq!(viewer.state(), PumpState::Idle);
}

#[test]
fn tick_after_teardown_does_nothing() {
    let mut viewer = viewer_with(MockMediaSource::new());
    viewer.start(FacingMode::Any).unwrap();
    viewer.tick();
    let presented = viewer.stats().presented_frames;

    viewer.teardown();

    assert_eq!(viewer.tick(), None);
    assert_eq!(viewer.stats().presented_frames, presented);
}

#[test]
fn dropping_viewer_releases_camera() {
    let track = MockTrack::new(8, 8);
    let probe = track.probe();
    {
        let mut viewer = viewer_with(MockMediaSource::new().then_stream(vec![track]));
        viewer.start(FacingMode::Any).unwrap();
        viewer.tick();
    }
    assert!(!probe.is_live());
    assert_eq!(probe.stop_calls(), 1);
}

#[test]
fn second_start_tears_down_first_session() {
    let first = MockTrack::new(8, 8);
    let second = MockTrack::new(8, 8);
    let (p1, p2) = (first.probe(), second.probe());
    let media = MockMediaSource::new()
        .then_stream(vec![first])
        .then_stream(vec![second]);
    let mut viewer = viewer_with(media);

    let old_handle = viewer.start(FacingMode::Any).unwrap();
    viewer.run(Some(2));
    let new_handle = viewer.start(FacingMode::Any).unwrap();

    assert!(old_handle.is_stopped());
    assert!(!p1.is_live());
    assert_eq!(p1.stop_calls(), 1);
    assert!(p2.is_live());
    assert_eq!(new_handle.state(), PumpState::Idle);

    assert_eq!(viewer.tick(), Some(TickOutcome::Presented));
    assert_eq!(p2.frames_read(), 1);
    assert_eq!(p1.frames_read(), 2);
}

#[test]
fn pump_stops_when_first_track_ends_despite_other_live_tracks() {
    let first = MockTrack::new(4, 4).with_end_after(1);
    let second = MockTrack::new(8, 8);
    let (p1, p2) = (first.probe(), second.probe());
    let media = MockMediaSource::new().then_stream(vec![first, second]);
    let mut viewer = viewer_with(media);
    viewer.start(FacingMode::Any).unwrap();

    assert_eq!(viewer.tick(), Some(TickOutcome::Presented));
    assert_eq!(viewer.tick(), Some(TickOutcome::Ended));

    assert_eq!(viewer.state(), PumpState::Stopped);
    assert_eq!(viewer.surface().unwrap().dimensions(), (4, 4));
    assert_eq!(viewer.tick(), None);
    assert!(!p1.is_live());
    assert!(p2.is_live());
    assert_eq!(p2.frames_read(), 0);

    assert_eq!(viewer.teardown(), 1);
    assert!(!p2.is_live());
}

#[test]
fn failed_acquisition_leaves_viewer_idle() {
    let media = MockMediaSource::new()
        .then_fail(CaptureError::PermissionDenied)
        .then_fail(CaptureError::PermissionDenied)
        .then_fail(CaptureError::PermissionDenied)
        .then_fail(CaptureError::PermissionDenied);
    let mut viewer = viewer_with(media);

    let err = viewer.start(FacingMode::Environment).unwrap_err();

    match err {
        ViewerError::Acquire(failure) => {
            assert_eq!(failure.reason, CaptureError::PermissionDenied);
            assert!(failure.to_string().contains("denied"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(viewer.state(), PumpState::Idle);
    assert_eq!(viewer.tick(), None);
}

#[test]
fn still_capture_does_not_disturb_pump() {
    let mut viewer = viewer_with(MockMediaSource::new());
    viewer.start(FacingMode::Any).unwrap();
    viewer.run(Some(2));
    let before = viewer.stats();

    let png = viewer.capture_still().unwrap();
    let decoded = image::load_from_memory(&png).unwrap().to_rgba8();

    assert_eq!(decoded.dimensions(), (8, 8));
    assert_eq!(
        decoded.as_raw().as_slice(),
        viewer.surface().unwrap().frame().pixels()
    );
    assert_eq!(viewer.stats(), before);
    assert_eq!(viewer.state(), PumpState::Running);
    assert_eq!(viewer.still_count(), 1);

    let dir = tempfile::tempdir().unwrap();
    let path = save_still(&png, dir.path()).unwrap();
    assert!(path.exists());
}

#[test]
fn still_after_failed_read_shows_last_presented_frame() {
    let track = MockTrack::new(8, 8)
        .with_renegotiation(1, 8, 2)
        .with_failing_reads([2]);
    let mut viewer = viewer_with(MockMediaSource::new().then_stream(vec![track]));
    viewer.start(FacingMode::Any).unwrap();

    assert_eq!(viewer.tick(), Some(TickOutcome::Presented));
    let presented = viewer.surface().unwrap().frame().pixels().to_vec();
    assert_eq!(viewer.tick(), Some(TickOutcome::FrameFailed));

    let png = viewer.capture_still().unwrap();
    let decoded = image::load_from_memory(&png).unwrap().to_rgba8();

    assert_eq!(decoded.dimensions(), (8, 8));
    assert_eq!(decoded.as_raw(), &presented);
    assert!(decoded.as_raw().iter().any(|&b| b != 0));
}

#[test]
fn manual_controls_reach_the_track() {
    let track = MockTrack::new(8, 8).with_capabilities(TrackCapabilities {
        focus_distance: Some(ControlRange::new(0.0, 2.0, 0.5)),
        focus_modes: vec![ControlMode::Continuous, ControlMode::Manual],
        ..Default::default()
    });
    let probe = track.probe();
    let mut viewer = viewer_with(MockMediaSource::new().then_stream(vec![track]));
    viewer.start(FacingMode::Any).unwrap();

    let settings = viewer
        .apply_controls(&ManualControls {
            exposure_time: Some(10.0),
            focus_distance: Some(1.2),
        })
        .unwrap();

    assert_eq!(settings.exposure_time, None);
    assert_eq!(settings.focus_distance, Some(1.0));
    assert_eq!(probe.status().applied.len(), 1);
}
