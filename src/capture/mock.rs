//! Mock camera backend generating synthetic frames.
//!
//! Used by tests and by the CLI when no camera backend is compiled in.
//! Behaviour can be scripted: late metadata, stalled frames, failing reads,
//! mid-stream renegotiation, and per-request failures.

use super::{
    CaptureError, ConstraintSet, MediaSource, MediaStream, TrackCapabilities, TrackSettings,
    VideoTrack,
};
use crate::surface::{FrameBuffer, FrameError};
use std::cell::Cell;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

static NEXT_TRACK_ID: AtomicU64 = AtomicU64::new(0);

/// Observable state of a [`MockTrack`], shared with its probes.
#[derive(Debug, Clone, Default)]
pub struct MockTrackStatus {
    /// Whether the track is still live.
    pub live: bool,
    /// Times `stop` was called.
    pub stop_calls: u32,
    /// Frames successfully read.
    pub frames_read: u64,
    /// Settings applied, in order.
    pub applied: Vec<TrackSettings>,
}

/// Handle for inspecting a track after it has been moved into a session.
#[derive(Debug, Clone)]
pub struct MockTrackProbe(Arc<Mutex<MockTrackStatus>>);

impl MockTrackProbe {
    /// Snapshot of the whole status.
    pub fn status(&self) -> MockTrackStatus {
        lock(&self.0).clone()
    }

    /// Whether the track is still live.
    pub fn is_live(&self) -> bool {
        lock(&self.0).live
    }

    /// Times `stop` was called.
    pub fn stop_calls(&self) -> u32 {
        lock(&self.0).stop_calls
    }

    /// Frames successfully read.
    pub fn frames_read(&self) -> u64 {
        lock(&self.0).frames_read
    }
}

fn lock(status: &Mutex<MockTrackStatus>) -> MutexGuard<'_, MockTrackStatus> {
    status.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Synthetic video track.
pub struct MockTrack {
    id: String,
    label: String,
    width: u32,
    height: u32,
    /// Remaining `dimensions()` calls that report 0×0.
    metadata_delay: Cell<u64>,
    /// A new frame is decoded every `frame_every` polls.
    frame_every: u64,
    polls: u64,
    read_attempts: u64,
    sequence: u64,
    failing_reads: Vec<u64>,
    renegotiate: Option<(u64, (u32, u32))>,
    end_after: Option<u64>,
    capabilities: TrackCapabilities,
    status: Arc<Mutex<MockTrackStatus>>,
}

impl MockTrack {
    /// Creates a live track producing `width`×`height` frames.
    pub fn new(width: u32, height: u32) -> Self {
        let n = NEXT_TRACK_ID.fetch_add(1, Ordering::Relaxed);
        Self {
            id: format!("mock-video-{}", n),
            label: "Mock Camera".to_string(),
            width,
            height,
            metadata_delay: Cell::new(0),
            frame_every: 1,
            polls: 0,
            read_attempts: 0,
            sequence: 0,
            failing_reads: Vec::new(),
            renegotiate: None,
            end_after: None,
            capabilities: TrackCapabilities::default(),
            status: Arc::new(Mutex::new(MockTrackStatus {
                live: true,
                ..Default::default()
            })),
        }
    }

    /// Sets the device label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Reports 0×0 for the first `calls` dimension queries.
    pub fn with_metadata_delay(self, calls: u64) -> Self {
        self.metadata_delay.set(calls);
        self
    }

    /// Only every `n`th poll sees a new frame.
    pub fn with_frame_every(mut self, n: u64) -> Self {
        self.frame_every = n.max(1);
        self
    }

    /// Makes the given read attempts (1-based) fail.
    pub fn with_failing_reads(mut self, attempts: impl IntoIterator<Item = u64>) -> Self {
        self.failing_reads = attempts.into_iter().collect();
        self
    }

    /// Switches resolution once `frames` frames have been read.
    pub fn with_renegotiation(mut self, frames: u64, width: u32, height: u32) -> Self {
        self.renegotiate = Some((frames, (width, height)));
        self
    }

    /// Ends the track after `frames` frames, as if the device was unplugged.
    pub fn with_end_after(mut self, frames: u64) -> Self {
        self.end_after = Some(frames);
        self
    }

    /// Sets the advertised control capabilities.
    pub fn with_capabilities(mut self, capabilities: TrackCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Returns a handle that outlives moving the track into a stream.
    pub fn probe(&self) -> MockTrackProbe {
        MockTrackProbe(Arc::clone(&self.status))
    }

    /// Deterministic test pattern; NOT image content, only for exercising
    /// the pipeline.
    fn render(&self, dst: &mut FrameBuffer) {
        let width = self.width as usize;
        let seq = self.sequence;
        for (i, px) in dst.pixels_mut().chunks_exact_mut(4).enumerate() {
            let x = (i % width) as u64;
            let y = (i / width) as u64;
            px[0] = ((x ^ seq) % 256) as u8;
            px[1] = (y % 256) as u8;
            px[2] = ((x + y) % 256) as u8;
            px[3] = 255;
        }
    }
}

impl VideoTrack for MockTrack {
    fn id(&self) -> &str {
        &self.id
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn dimensions(&self) -> (u32, u32) {
        let remaining = self.metadata_delay.get();
        if remaining > 0 {
            self.metadata_delay.set(remaining - 1);
            return (0, 0);
        }
        (self.width, self.height)
    }

    fn has_new_frame(&mut self) -> bool {
        self.polls += 1;
        self.polls % self.frame_every == 0
    }

    fn read_frame(&mut self, dst: &mut FrameBuffer) -> Result<(), FrameError> {
        self.read_attempts += 1;
        if !self.is_live() {
            return Err(FrameError::ReadFailure("track is not live".into()));
        }
        if self.failing_reads.contains(&self.read_attempts) {
            return Err(FrameError::ReadFailure(
                "frame data is not readable".into(),
            ));
        }
        if dst.dimensions() != (self.width, self.height) {
            return Err(FrameError::SizeMismatch {
                expected: dst.dimensions(),
                got: (self.width, self.height),
            });
        }

        self.sequence += 1;
        self.render(dst);
        dst.stamp(self.sequence);

        let mut status = lock(&self.status);
        status.frames_read += 1;
        if let Some((after, (w, h))) = self.renegotiate {
            if self.sequence == after {
                self.width = w;
                self.height = h;
            }
        }
        if self.end_after == Some(self.sequence) {
            status.live = false;
        }
        Ok(())
    }

    fn capabilities(&self) -> TrackCapabilities {
        self.capabilities.clone()
    }

    fn apply_settings(&mut self, settings: &TrackSettings) -> Result<(), CaptureError> {
        if !self.is_live() {
            return Err(CaptureError::NoVideoTrack);
        }
        lock(&self.status).applied.push(settings.clone());
        Ok(())
    }

    fn is_live(&self) -> bool {
        lock(&self.status).live
    }

    fn stop(&mut self) {
        let mut status = lock(&self.status);
        status.stop_calls += 1;
        status.live = false;
        tracing::info!(track = %self.id, "MockTrack stopped");
    }
}

/// Scripted reply to one stream request.
pub enum MockResponse {
    /// Reply with a stream of these tracks.
    Stream(Vec<MockTrack>),
    /// Fail the request.
    Fail(CaptureError),
}

/// Mock media source.
///
/// Replies from its script in order; once the script is exhausted every
/// request succeeds with one track at the requested ideal resolution.
pub struct MockMediaSource {
    script: VecDeque<MockResponse>,
    secure: bool,
    default_size: (u32, u32),
    attempts: Vec<ConstraintSet>,
}

impl MockMediaSource {
    /// Creates a secure source with an empty script.
    pub fn new() -> Self {
        Self {
            script: VecDeque::new(),
            secure: true,
            default_size: (640, 480),
            attempts: Vec::new(),
        }
    }

    /// Simulates a page served over plain HTTP.
    pub fn insecure(mut self) -> Self {
        self.secure = false;
        self
    }

    /// Size of tracks returned once the script is exhausted and no resolution is requested.
    pub fn with_default_size(mut self, width: u32, height: u32) -> Self {
        self.default_size = (width, height);
        self
    }

    /// Queues a failed request.
    pub fn then_fail(mut self, error: CaptureError) -> Self {
        self.script.push_back(MockResponse::Fail(error));
        self
    }

    /// Queues a successful request returning `tracks`.
    pub fn then_stream(mut self, tracks: Vec<MockTrack>) -> Self {
        self.script.push_back(MockResponse::Stream(tracks));
        self
    }

    /// Queues a stream with no video tracks.
    pub fn then_empty(self) -> Self {
        self.then_stream(Vec::new())
    }

    /// Constraint sets requested so far, in order.
    pub fn attempts(&self) -> &[ConstraintSet] {
        &self.attempts
    }
}

impl Default for MockMediaSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaSource for MockMediaSource {
    fn is_secure_context(&self) -> bool {
        self.secure
    }

    fn request_stream(&mut self, constraints: &ConstraintSet) -> Result<MediaStream, CaptureError> {
        self.attempts.push(constraints.clone());

        let tracks = match self.script.pop_front() {
            Some(MockResponse::Fail(error)) => return Err(error),
            Some(MockResponse::Stream(tracks)) => tracks,
            None => {
                let (w, h) = constraints.ideal_resolution.unwrap_or(self.default_size);
                vec![MockTrack::new(w, h)]
            }
        };

        Ok(MediaStream::new(
            tracks
                .into_iter()
                .map(|t| Box::new(t) as Box<dyn VideoTrack>)
                .collect(),
        ))
    }
}
