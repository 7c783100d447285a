//! Background capture + hand detection.
//!
//! The worker thread owns the camera and the landmark source; the render loop
//! only ever sees immutable [`TrackedFrame`] messages. The channel is small
//! and the sender never blocks: if the render loop falls behind, new frames
//! are dropped and the consumer keeps only the newest one it finds.
//!
//! Failures never take the app down. A dead camera or detector is reported
//! once as [`TrackerMessage::Unavailable`] and drawing continues with the
//! pointer.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError, bounded};

use crate::camera::FrameGrabber;
use crate::error::Error;
use crate::landmarks::{HandLandmarks, LandmarkSource};
use crate::types::FrameBuffer;

const CHANNEL_CAPACITY: usize = 2;

/// One camera frame and the hand found in it.
#[derive(Clone, Debug)]
pub struct TrackedFrame {
    pub sequence: u64,
    /// `None` when running from a replay without a camera.
    pub frame: Option<FrameBuffer>,
    pub hand: Option<HandLandmarks>,
}

#[derive(Clone, Debug)]
pub enum TrackerMessage {
    Frame(TrackedFrame),
    Unavailable(String),
}

/// What the worker runs with. Built inside the worker thread because camera
/// handles can't cross threads.
pub struct TrackingInputs {
    pub camera: Option<Box<dyn FrameGrabber>>,
    pub source: Option<Box<dyn LandmarkSource>>,
    /// Pacing used when there is no camera to set the rate.
    pub idle_interval: Duration,
}

/// Open the worker's camera and landmark source.
///
/// With `camera_required` false (a replay carries its own landmarks) a camera
/// that fails to open only costs the video background.
pub fn open_inputs<C, S>(
    open_camera: Option<C>,
    open_source: S,
    camera_required: bool,
    idle_interval: Duration,
) -> Result<TrackingInputs, Error>
where
    C: FnOnce() -> Result<Box<dyn FrameGrabber>, Error>,
    S: FnOnce() -> Result<Box<dyn LandmarkSource>, Error>,
{
    let camera = match open_camera.map(|open| open()) {
        None => None,
        Some(Ok(camera)) => Some(camera),
        Some(Err(e)) if !camera_required => {
            log::warn!("no camera, continuing without video: {e}");
            None
        }
        Some(Err(e)) => return Err(e),
    };
    let source = open_source()?;
    Ok(TrackingInputs { camera, source: Some(source), idle_interval })
}

/// Newest state pulled off the channel in one go.
#[derive(Default)]
pub struct Drained {
    pub frame: Option<TrackedFrame>,
    pub unavailable: Vec<String>,
}

pub struct TrackingWorker {
    rx: Receiver<TrackerMessage>,
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl TrackingWorker {
    pub fn spawn<F>(open: F) -> Self
    where
        F: FnOnce() -> Result<TrackingInputs, Error> + Send + 'static,
    {
        let (tx, rx) = bounded(CHANNEL_CAPACITY);
        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&shutdown);

        let handle = thread::Builder::new()
            .name("hand-tracking".into())
            .spawn(move || match open() {
                Ok(inputs) => run_worker_loop(inputs, &tx, &flag),
                Err(e) => {
                    log::warn!("hand tracking unavailable: {e}");
                    let _ = tx.send(TrackerMessage::Unavailable(e.to_string()));
                }
            });

        let handle = match handle {
            Ok(handle) => Some(handle),
            Err(e) => {
                log::error!("failed to start tracking thread: {e}");
                None
            }
        };

        Self { rx, shutdown, handle }
    }

    /// Everything queued right now, collapsed to the newest frame.
    pub fn drain(&self) -> Drained {
        let mut drained = Drained::default();
        while let Ok(msg) = self.rx.try_recv() {
            match msg {
                TrackerMessage::Frame(frame) => drained.frame = Some(frame),
                TrackerMessage::Unavailable(reason) => drained.unavailable.push(reason),
            }
        }
        drained
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<TrackerMessage> {
        match self.rx.recv_timeout(timeout) {
            Ok(msg) => Some(msg),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// True once the worker has exited (or never started).
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(|h| h.is_finished())
    }

    pub fn stop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        // unblock a worker stuck on a full channel
        while self.rx.try_recv().is_ok() {}
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("tracking thread panicked");
            }
        }
    }
}

impl Drop for TrackingWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_worker_loop(mut inputs: TrackingInputs, tx: &Sender<TrackerMessage>, shutdown: &AtomicBool) {
    log::info!(
        "tracking started (camera: {}, landmarks: {})",
        if inputs.camera.is_some() { "yes" } else { "no" },
        inputs.source.as_ref().map_or("none", |s| s.label()),
    );
    let blank = FrameBuffer::new(0, 0);
    let mut sequence = 0u64;

    while !shutdown.load(Ordering::Relaxed) {
        let frame = match inputs.camera.as_mut() {
            Some(camera) => match camera.grab() {
                Ok(frame) => Some(frame),
                Err(e) => {
                    log::warn!("camera lost: {e}");
                    let _ = tx.send_timeout(TrackerMessage::Unavailable(e.to_string()), Duration::from_millis(100));
                    return;
                }
            },
            None => {
                thread::sleep(inputs.idle_interval);
                None
            }
        };

        let hand = match inputs.source.as_mut() {
            Some(source) => match source.detect(frame.as_ref().unwrap_or(&blank)) {
                Ok(hand) => hand,
                Err(e) => {
                    log::warn!("landmark source failed, continuing without hand tracking: {e}");
                    inputs.source = None;
                    if !send(tx, TrackerMessage::Unavailable(e.to_string())) {
                        return;
                    }
                    None
                }
            },
            None => None,
        };

        if inputs.camera.is_none() && inputs.source.is_none() {
            log::info!("nothing left to track");
            return;
        }

        sequence += 1;
        if !send(tx, TrackerMessage::Frame(TrackedFrame { sequence, frame, hand })) {
            return;
        }
    }
    log::info!("tracking stopped after {sequence} frames");
}

/// Non-blocking send. Returns false once the receiver is gone.
fn send(tx: &Sender<TrackerMessage>, msg: TrackerMessage) -> bool {
    match tx.try_send(msg) {
        Ok(()) => true,
        Err(TrySendError::Full(TrackerMessage::Unavailable(reason))) => {
            // status must not be dropped; wait briefly for room
            tx.send_timeout(TrackerMessage::Unavailable(reason), Duration::from_millis(100)).is_ok()
        }
        Err(TrySendError::Full(_)) => {
            log::trace!("render loop behind, frame dropped");
            true
        }
        Err(TrySendError::Disconnected(_)) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::{Landmark, ReplaySource};

    const WAIT: Duration = Duration::from_secs(5);

    struct FailingSource;

    impl LandmarkSource for FailingSource {
        fn detect(&mut self, _frame: &FrameBuffer) -> Result<Option<HandLandmarks>, Error> {
            Err(Error::Detector("boom".into()))
        }

        fn label(&self) -> &'static str {
            "failing"
        }
    }

    struct StaticCamera;

    impl FrameGrabber for StaticCamera {
        fn grab(&mut self) -> Result<FrameBuffer, Error> {
            thread::sleep(Duration::from_millis(2));
            Ok(FrameBuffer::filled(4, 3, 0xFF10_2030))
        }
    }

    #[test]
    fn replay_frames_arrive_in_order() {
        let hand = HandLandmarks::new([Landmark::new(0.5, 0.5); 21]);
        let worker = TrackingWorker::spawn(move || {
            Ok(TrackingInputs {
                camera: None,
                source: Some(Box::new(ReplaySource::from_frames(vec![Some(hand), None], true))),
                idle_interval: Duration::from_millis(1),
            })
        });

        let Some(TrackerMessage::Frame(first)) = worker.recv_timeout(WAIT) else {
            panic!("no frame from worker");
        };
        assert!(first.frame.is_none());
        let Some(TrackerMessage::Frame(second)) = worker.recv_timeout(WAIT) else {
            panic!("no second frame");
        };
        assert!(second.sequence > first.sequence);
    }

    fn no_camera() -> Result<Box<dyn FrameGrabber>, Error> {
        Err(Error::CameraInit("no device".into()))
    }

    fn one_hand_replay() -> Result<Box<dyn LandmarkSource>, Error> {
        let hand = HandLandmarks::new([Landmark::new(0.25, 0.5); 21]);
        Ok(Box::new(ReplaySource::from_frames(vec![Some(hand)], true)))
    }

    #[test]
    fn replay_does_not_need_a_camera() {
        let inputs = open_inputs(Some(no_camera), one_hand_replay, false, Duration::from_millis(1)).unwrap();
        assert!(inputs.camera.is_none());
        assert!(inputs.source.is_some());

        let err = open_inputs(Some(no_camera), one_hand_replay, true, Duration::from_millis(1));
        assert!(matches!(err, Err(Error::CameraInit(_))));
    }

    #[test]
    fn replay_plays_when_the_camera_fails_to_open() {
        let worker = TrackingWorker::spawn(|| {
            open_inputs(Some(no_camera), one_hand_replay, false, Duration::from_millis(1))
        });
        match worker.recv_timeout(WAIT) {
            Some(TrackerMessage::Frame(tracked)) => {
                assert!(tracked.frame.is_none());
                assert!(tracked.hand.is_some());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn open_failure_is_reported() {
        let worker = TrackingWorker::spawn(|| Err(Error::CameraInit("no device".into())));
        match worker.recv_timeout(WAIT) {
            Some(TrackerMessage::Unavailable(reason)) => assert!(reason.contains("no device")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn detector_failure_keeps_the_video() {
        let worker = TrackingWorker::spawn(|| {
            Ok(TrackingInputs {
                camera: Some(Box::new(StaticCamera)),
                source: Some(Box::new(FailingSource)),
                idle_interval: Duration::from_millis(1),
            })
        });

        let mut saw_unavailable = false;
        let mut saw_video = false;
        for _ in 0..20 {
            match worker.recv_timeout(WAIT) {
                Some(TrackerMessage::Unavailable(reason)) => {
                    assert!(reason.contains("boom"));
                    saw_unavailable = true;
                }
                Some(TrackerMessage::Frame(frame)) => {
                    assert!(frame.hand.is_none());
                    saw_video |= frame.frame.is_some();
                }
                None => break,
            }
            if saw_unavailable && saw_video {
                break;
            }
        }
        assert!(saw_unavailable && saw_video);
    }

    #[test]
    fn stop_joins_the_thread() {
        let mut worker = TrackingWorker::spawn(|| {
            Ok(TrackingInputs {
                camera: Some(Box::new(StaticCamera)),
                source: None,
                idle_interval: Duration::from_millis(1),
            })
        });
        worker.recv_timeout(WAIT);
        worker.stop();
        assert!(worker.is_finished());
    }
}
