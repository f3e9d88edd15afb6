//! Constraint fallback order and failure reporting.

use negative_viewer::capture::{
    CaptureAcquirer, CaptureConfig, CaptureError, ConstraintSet, FacingMode, MockMediaSource,
    MockTrack,
};

fn ladder() -> Vec<ConstraintSet> {
    vec![
        ConstraintSet::with_facing(FacingMode::Environment).with_resolution(1920, 1080),
        ConstraintSet::with_facing(FacingMode::Environment),
        ConstraintSet::any(),
    ]
}

#[test]
fn falls_back_in_order_and_returns_last_stream() {
    let c_track = MockTrack::new(320, 240).with_label("C");
    let media = MockMediaSource::new()
        .then_fail(CaptureError::ConstraintUnsatisfiable("no rear camera".into()))
        .then_fail(CaptureError::NoDevice)
        .then_stream(vec![c_track]);
    let mut acquirer = CaptureAcquirer::new(media, CaptureConfig::default());

    let session = acquirer.acquire_with(&ladder()).unwrap();

    assert_eq!(acquirer.media().attempts(), ladder().as_slice());
    assert_eq!(session.constraints(), &ConstraintSet::any());
    assert_eq!(session.primary_track().unwrap().label(), "C");
    assert_eq!(session.resolution(), (320, 240));
}

#[test]
fn exhausted_ladder_reports_last_reason() {
    let media = MockMediaSource::new()
        .then_fail(CaptureError::PermissionDenied)
        .then_fail(CaptureError::ConstraintUnsatisfiable("1080p".into()))
        .then_fail(CaptureError::NoDevice);
    let mut acquirer = CaptureAcquirer::new(media, CaptureConfig::default());

    let failure = acquirer.acquire_with(&ladder()).unwrap_err();

    assert_eq!(acquirer.media().attempts().len(), 3);
    assert_eq!(failure.attempts, 3);
    assert_eq!(failure.reason, CaptureError::NoDevice);
    assert_eq!(failure.to_string(), "No camera was found on this device.");
}

#[test]
fn empty_ladder_fails_without_requests() {
    let mut acquirer = CaptureAcquirer::new(MockMediaSource::new(), CaptureConfig::default());

    let failure = acquirer.acquire_with(&[]).unwrap_err();

    assert_eq!(failure.attempts, 0);
    assert!(matches!(failure.reason, CaptureError::ConstraintUnsatisfiable(_)));
    assert!(acquirer.media().attempts().is_empty());
}

#[test]
fn configured_ladder_prefers_facing_then_resolution() {
    let media = MockMediaSource::new()
        .then_fail(CaptureError::ConstraintUnsatisfiable("front".into()))
        .then_fail(CaptureError::ConstraintUnsatisfiable("front".into()));
    let config = CaptureConfig::with_dimensions(1280, 720);
    let mut acquirer = CaptureAcquirer::new(media, config);

    let session = acquirer.acquire(FacingMode::User).unwrap();

    let attempts = acquirer.media().attempts();
    assert_eq!(attempts[0].facing, FacingMode::User);
    assert_eq!(attempts[0].ideal_resolution, Some((1280, 720)));
    assert_eq!(attempts[1].facing, FacingMode::User);
    assert_eq!(attempts[1].ideal_resolution, None);
    assert_eq!(attempts[2].facing, FacingMode::Any);
    assert_eq!(session.resolution(), (1280, 720));
}
