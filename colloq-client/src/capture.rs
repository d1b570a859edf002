//! Chunked audio capture loop.
//!
//! [`AudioCapture`] drives an `Idle -> Recording -> Idle` state machine over an
//! injected [`CaptureSource`]. While recording, a fixed wall-clock timer
//! finalizes the active segment recorder, hands the segment to the
//! [`UploadSink`] on a detached task, and immediately starts the next recorder
//! against the same stream. Upload failures are logged and dropped; recording
//! continues uninterrupted.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use colloq_core::error::{ColloqError, Result};
use colloq_core::model::AudioSegment;

/// A device or platform capability that can produce a continuous audio
/// stream.
///
/// Implementations fail with
/// [`ColloqError::CaptureUnsupported`] when recording
/// is unavailable (no device, no permission); that failure is terminal for
/// the session.
#[async_trait]
pub trait CaptureSource: Send + Sync {
    /// Acquire a continuous audio stream.
    async fn open_stream(&self) -> Result<Box<dyn AudioStream>>;
}

/// A continuous audio stream that segment recorders attach to.
///
/// The stream outlives individual recorders: finalizing one recorder and
/// starting the next against the same stream loses no audio in between.
#[async_trait]
pub trait AudioStream: Send + Sync {
    /// Start a new segment recorder bound to this stream.
    async fn start_segment(&mut self) -> Result<Box<dyn SegmentRecorder>>;
}

/// An in-progress recording segment.
#[async_trait]
pub trait SegmentRecorder: Send + Sync {
    /// Close the segment and yield its encoded audio.
    async fn finalize(self: Box<Self>) -> Result<AudioSegment>;
}

/// Destination for finalized segments.
///
/// Server-side this is transcription + embedding + chunk insert; the capture
/// loop only sees an opaque upload returning the created chunk id.
#[async_trait]
pub trait UploadSink: Send + Sync {
    /// Upload one finalized segment to a room.
    async fn upload(&self, room_id: Uuid, segment: AudioSegment) -> Result<Uuid>;
}

/// Capture timing parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureConfig {
    /// Wall-clock length of each recorded segment.
    pub segment_interval: Duration,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self { segment_interval: Duration::from_secs(5) }
    }
}

impl CaptureConfig {
    /// Create a validated config with the given segment interval.
    ///
    /// # Errors
    ///
    /// Returns [`ColloqError::Config`] if the interval is zero.
    pub fn new(segment_interval: Duration) -> Result<Self> {
        if segment_interval.is_zero() {
            return Err(ColloqError::Config("segment_interval must be non-zero".to_string()));
        }
        Ok(Self { segment_interval })
    }
}

/// The chunked audio capture loop.
///
/// `Idle` until [`start`](AudioCapture::start) succeeds, then `Recording`
/// until [`stop`](AudioCapture::stop). At most one segment recorder is active
/// at any time; segment boundaries are wall-clock-periodic, not
/// content-aware.
pub struct AudioCapture {
    source: Arc<dyn CaptureSource>,
    uploads: Arc<dyn UploadSink>,
    config: CaptureConfig,
    active: Option<ActiveRecording>,
}

struct ActiveRecording {
    stop: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl AudioCapture {
    /// Create a capture loop with the default 5-second segment interval.
    pub fn new(source: Arc<dyn CaptureSource>, uploads: Arc<dyn UploadSink>) -> Self {
        Self::with_config(source, uploads, CaptureConfig::default())
    }

    /// Create a capture loop with an explicit [`CaptureConfig`].
    pub fn with_config(
        source: Arc<dyn CaptureSource>,
        uploads: Arc<dyn UploadSink>,
        config: CaptureConfig,
    ) -> Self {
        Self { source, uploads, config, active: None }
    }

    /// Whether the loop is currently recording.
    pub fn is_recording(&self) -> bool {
        self.active.is_some()
    }

    /// Start recording into the given room.
    ///
    /// Acquires the audio stream, starts the first segment recorder, and
    /// spawns the segment loop. Calling `start` while already recording is a
    /// no-op. If stream acquisition or the first recorder fails, the state
    /// stays `Idle`.
    ///
    /// # Errors
    ///
    /// Returns [`ColloqError::CaptureUnsupported`] when the capture
    /// capability is unavailable.
    pub async fn start(&mut self, room_id: Uuid) -> Result<()> {
        if self.active.is_some() {
            debug!(room_id = %room_id, "capture already running; ignoring start");
            return Ok(());
        }

        let mut stream = self.source.open_stream().await?;
        let recorder = stream.start_segment().await?;

        let (stop_tx, stop_rx) = oneshot::channel();
        let task = tokio::spawn(run_segment_loop(
            stream,
            recorder,
            room_id,
            self.config.segment_interval,
            self.uploads.clone(),
            stop_rx,
        ));

        self.active = Some(ActiveRecording { stop: stop_tx, task });
        debug!(room_id = %room_id, interval = ?self.config.segment_interval, "capture started");
        Ok(())
    }

    /// Stop recording.
    ///
    /// Disarms the timer and finalizes the current segment recorder; its
    /// segment is still uploaded (detached). Waits for the loop task to
    /// finish, not for in-flight uploads. Calling `stop` while idle is a
    /// no-op.
    pub async fn stop(&mut self) {
        if let Some(active) = self.active.take() {
            let _ = active.stop.send(());
            let _ = active.task.await;
            debug!("capture stopped");
        }
    }
}

async fn run_segment_loop(
    mut stream: Box<dyn AudioStream>,
    recorder: Box<dyn SegmentRecorder>,
    room_id: Uuid,
    interval: Duration,
    uploads: Arc<dyn UploadSink>,
    mut stop: oneshot::Receiver<()>,
) {
    let mut timer = tokio::time::interval(interval);
    // The first tick completes immediately; consume it so the first rotation
    // happens one full interval after start.
    timer.tick().await;

    let mut recorder = Some(recorder);
    loop {
        tokio::select! {
            _ = timer.tick() => {
                if let Some(current) = recorder.take() {
                    finalize_and_upload(current, room_id, &uploads).await;
                }
                match stream.start_segment().await {
                    Ok(next) => recorder = Some(next),
                    // Keep the loop alive; the next tick retries.
                    Err(e) => {
                        warn!(room_id = %room_id, error = %e, "could not start next segment");
                    }
                }
            }
            _ = &mut stop => break,
        }
    }

    if let Some(current) = recorder.take() {
        finalize_and_upload(current, room_id, &uploads).await;
    }
}

/// Finalize a recorder and hand its segment to the sink on a detached task.
///
/// The loop never waits on an upload; a failed upload loses that segment and
/// nothing else.
async fn finalize_and_upload(
    recorder: Box<dyn SegmentRecorder>,
    room_id: Uuid,
    uploads: &Arc<dyn UploadSink>,
) {
    match recorder.finalize().await {
        Ok(segment) => {
            let uploads = uploads.clone();
            tokio::spawn(async move {
                match uploads.upload(room_id, segment).await {
                    Ok(chunk_id) => {
                        debug!(room_id = %room_id, chunk_id = %chunk_id, "segment uploaded");
                    }
                    Err(e) => {
                        warn!(room_id = %room_id, error = %e, "segment upload failed; segment dropped");
                    }
                }
            });
        }
        Err(e) => {
            warn!(room_id = %room_id, error = %e, "segment finalize failed; segment dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_interval_is_five_seconds() {
        assert_eq!(CaptureConfig::default().segment_interval, Duration::from_secs(5));
    }

    #[test]
    fn zero_interval_is_rejected() {
        let err = CaptureConfig::new(Duration::ZERO).unwrap_err();
        assert!(matches!(err, ColloqError::Config(_)));
    }

    #[test]
    fn non_zero_interval_is_accepted() {
        let config = CaptureConfig::new(Duration::from_secs(30)).unwrap();
        assert_eq!(config.segment_interval, Duration::from_secs(30));
    }
}
