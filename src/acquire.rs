//! The frame-acquisition loop and its delivery channel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};

use crate::error::{Result, RsError};
use crate::frame::ImageFrame;

/// Bound on one native wait; expiring is a transient retry.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(1);

/// Bound on how long the caller is willing to wait for the first frame.
pub const DEFAULT_FIRST_FRAME_TIMEOUT: Duration = Duration::from_secs(15);

/// Default capacity of the delivery channel.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1;

pub type FrameSender = flume::Sender<ImageFrame>;
pub type FrameReceiver = flume::Receiver<ImageFrame>;

/// Bounded delivery channel between the acquisition loop and its consumer.
pub fn frame_channel(capacity: usize) -> (FrameSender, FrameReceiver) {
    flume::bounded(capacity)
}

/// A blocking producer of synchronized frame sets.
///
/// [`crate::Pipeline`] implements this over the native wait call; tests drive
/// the loop with scripted sources.
pub trait FrameSource {
    /// Block up to `timeout` for the next set of frames.
    ///
    /// `Ok(None)` means the wait timed out with no data.
    fn next_frames(&mut self, timeout: Duration) -> Result<Option<Vec<ImageFrame>>>;
}

/// What to do when the delivery channel is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueuePolicy {
    /// Block until the consumer drains the channel. A disconnected consumer
    /// ends the loop cleanly.
    Block,
    /// Never block: drop the incoming frame and keep acquiring.
    DropNewest,
}

#[derive(Debug, Clone)]
pub struct AcquireOptions {
    pub poll_timeout: Duration,
    pub first_frame_timeout: Duration,
    pub queue_policy: QueuePolicy,
}

impl Default for AcquireOptions {
    fn default() -> Self {
        Self {
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            first_frame_timeout: DEFAULT_FIRST_FRAME_TIMEOUT,
            queue_policy: QueuePolicy::Block,
        }
    }
}

impl AcquireOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    pub fn with_first_frame_timeout(mut self, timeout: Duration) -> Self {
        self.first_frame_timeout = timeout;
        self
    }

    pub fn with_queue_policy(mut self, policy: QueuePolicy) -> Self {
        self.queue_policy = policy;
        self
    }
}

/// Cooperative stop signal for the acquisition loop.
///
/// Clones share the flag; cancelling any of them stops the loop at its next
/// cycle with `Ok(())`.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

enum Delivery {
    Sent,
    Dropped,
    Disconnected,
}

fn deliver(sender: &FrameSender, frame: ImageFrame, policy: QueuePolicy) -> Delivery {
    match policy {
        QueuePolicy::Block => match sender.send(frame) {
            Ok(()) => Delivery::Sent,
            Err(flume::SendError(_)) => Delivery::Disconnected,
        },
        QueuePolicy::DropNewest => match sender.try_send(frame) {
            Ok(()) => Delivery::Sent,
            Err(flume::TrySendError::Full(frame)) => {
                warn!(format = ?frame.format(), "delivery channel full, dropping frame");
                Delivery::Dropped
            }
            Err(flume::TrySendError::Disconnected(_)) => Delivery::Disconnected,
        },
    }
}

/// Drive `source` until cancellation, consumer disconnect, or a fatal error.
///
/// Before the first frame set arrives, poll timeouts count against
/// `first_frame_timeout` and a wait error is surfaced once; after that both
/// are transient and the loop retries on the next cycle. Frames within one
/// set are delivered in extraction order.
pub fn run<S: FrameSource>(
    source: &mut S,
    sender: &FrameSender,
    options: &AcquireOptions,
    cancel: &CancelToken,
) -> Result<()> {
    let started = Instant::now();
    let mut streaming = false;
    loop {
        if cancel.is_cancelled() {
            debug!("acquisition cancelled");
            return Ok(());
        }
        match source.next_frames(options.poll_timeout) {
            Ok(Some(frames)) if !frames.is_empty() => {
                streaming = true;
                for frame in frames {
                    trace!(
                        format = ?frame.format(),
                        width = frame.width(),
                        height = frame.height(),
                        "frame ready"
                    );
                    match deliver(sender, frame, options.queue_policy) {
                        Delivery::Sent | Delivery::Dropped => {}
                        Delivery::Disconnected => {
                            debug!("consumer disconnected, stopping acquisition");
                            return Ok(());
                        }
                    }
                }
            }
            Ok(_) => {
                if !streaming && started.elapsed() >= options.first_frame_timeout {
                    return Err(RsError::WaitTimeout(options.first_frame_timeout));
                }
            }
            Err(err) => {
                if !streaming {
                    return Err(err);
                }
                warn!(error = %err, "transient acquisition error, retrying");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;
    use crate::stream::ImageFormat;

    enum Step {
        Bundle(Vec<ImageFrame>),
        Timeout,
        Error(RsError),
    }

    /// Replays a fixed script, then reports timeouts (optionally cancelling
    /// the loop once the script is exhausted).
    struct ScriptedSource {
        steps: VecDeque<Step>,
        calls: usize,
        cancel_when_done: Option<CancelToken>,
    }

    impl ScriptedSource {
        fn new(steps: Vec<Step>) -> Self {
            Self {
                steps: steps.into(),
                calls: 0,
                cancel_when_done: None,
            }
        }

        fn cancelling(mut self, token: &CancelToken) -> Self {
            self.cancel_when_done = Some(token.clone());
            self
        }
    }

    impl FrameSource for ScriptedSource {
        fn next_frames(&mut self, _timeout: Duration) -> Result<Option<Vec<ImageFrame>>> {
            self.calls += 1;
            match self.steps.pop_front() {
                Some(Step::Bundle(frames)) => Ok(Some(frames)),
                Some(Step::Timeout) => Ok(None),
                Some(Step::Error(err)) => Err(err),
                None => {
                    if let Some(token) = &self.cancel_when_done {
                        token.cancel();
                    }
                    Ok(None)
                }
            }
        }
    }

    fn depth_frame() -> ImageFrame {
        ImageFrame::from_parts(ImageFormat::Gray16, 640, 480, vec![0; 614_400]).unwrap()
    }

    fn color_frame() -> ImageFrame {
        ImageFrame::from_parts(ImageFormat::Rgb8, 640, 480, vec![0; 921_600]).unwrap()
    }

    fn native(message: &str) -> RsError {
        RsError::Native {
            context: "wait for frames",
            message: message.to_string(),
        }
    }

    #[test]
    fn bundle_frames_are_delivered_in_extraction_order() {
        let cancel = CancelToken::new();
        let mut source =
            ScriptedSource::new(vec![Step::Bundle(vec![depth_frame(), color_frame()])])
                .cancelling(&cancel);
        let (tx, rx) = frame_channel(2);

        run(&mut source, &tx, &AcquireOptions::default(), &cancel).unwrap();

        let first = rx.try_recv().unwrap();
        assert_eq!(first.format(), ImageFormat::Gray16);
        assert_eq!((first.width(), first.height()), (640, 480));
        assert_eq!(first.data().len(), 614_400);

        let second = rx.try_recv().unwrap();
        assert_eq!(second.format(), ImageFormat::Rgb8);
        assert_eq!((second.width(), second.height()), (640, 480));
        assert_eq!(second.data().len(), 921_600);

        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn outer_timeout_is_fatal_before_first_frame() {
        let cancel = CancelToken::new();
        let mut source = ScriptedSource::new(vec![Step::Timeout]);
        let (tx, rx) = frame_channel(1);
        let options = AcquireOptions::new()
            .with_poll_timeout(Duration::from_millis(1))
            .with_first_frame_timeout(Duration::ZERO);

        let err = run(&mut source, &tx, &options, &cancel).unwrap_err();
        assert_eq!(err, RsError::WaitTimeout(Duration::ZERO));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn wait_error_is_fatal_before_first_frame() {
        let cancel = CancelToken::new();
        let mut source = ScriptedSource::new(vec![Step::Error(native("usb transfer failed"))]);
        let (tx, rx) = frame_channel(1);

        let err = run(&mut source, &tx, &AcquireOptions::default(), &cancel).unwrap_err();
        assert_eq!(err, native("usb transfer failed"));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn wait_errors_and_timeouts_are_transient_once_streaming() {
        let cancel = CancelToken::new();
        let mut source = ScriptedSource::new(vec![
            Step::Bundle(vec![depth_frame()]),
            Step::Error(native("usb transfer failed")),
            Step::Timeout,
            Step::Bundle(vec![depth_frame()]),
        ])
        .cancelling(&cancel);
        let (tx, rx) = frame_channel(4);

        run(&mut source, &tx, &AcquireOptions::default(), &cancel).unwrap();
        assert_eq!(rx.drain().count(), 2);
    }

    #[test]
    fn drop_newest_keeps_the_loop_running_when_full() {
        let cancel = CancelToken::new();
        let mut source = ScriptedSource::new(vec![
            Step::Bundle(vec![depth_frame()]),
            Step::Bundle(vec![color_frame()]),
        ])
        .cancelling(&cancel);
        let (tx, rx) = frame_channel(1);
        let options = AcquireOptions::new().with_queue_policy(QueuePolicy::DropNewest);

        run(&mut source, &tx, &options, &cancel).unwrap();

        let delivered: Vec<_> = rx.drain().collect();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].format(), ImageFormat::Gray16);
    }

    #[test]
    fn disconnected_consumer_stops_the_loop() {
        let cancel = CancelToken::new();
        let mut source = ScriptedSource::new(vec![
            Step::Bundle(vec![depth_frame()]),
            Step::Bundle(vec![depth_frame()]),
        ]);
        let (tx, rx) = frame_channel(1);
        drop(rx);

        run(&mut source, &tx, &AcquireOptions::default(), &cancel).unwrap();
        // The loop stopped on the first send; the second bundle was never pulled.
        assert!(!source.steps.is_empty());
    }

    #[test]
    fn cancelled_token_stops_before_touching_the_source() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let mut source = ScriptedSource::new(vec![Step::Bundle(vec![depth_frame()])]);
        let (tx, _rx) = frame_channel(1);

        run(&mut source, &tx, &AcquireOptions::default(), &cancel).unwrap();
        assert_eq!(source.calls, 0);
    }
}
