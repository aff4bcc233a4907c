//! Safe Rust wrapper for the librealsense2 depth-camera pipeline API.
//!
//! Wraps device enumeration, stream configuration, and the blocking
//! frame-acquisition loop behind owning handle types, so native resources
//! are released deterministically and in dependency order. Frames are copied
//! into host-owned [`ImageFrame`] values and delivered over a bounded
//! channel.
//!
//! ```no_run
//! use realsense::{frame_channel, AcquireOptions, CancelToken, Pipeline, PipelineConfig};
//!
//! fn main() -> realsense::Result<()> {
//!     let mut pipeline = Pipeline::create(PipelineConfig::new().with_depth().with_color())?;
//!     pipeline.start()?;
//!
//!     let (tx, rx) = frame_channel(1);
//!     let cancel = CancelToken::new();
//!     let worker = {
//!         let cancel = cancel.clone();
//!         std::thread::spawn(move || {
//!             let result = pipeline.wait_frames(&tx, &AcquireOptions::default(), &cancel);
//!             (pipeline, result)
//!         })
//!     };
//!
//!     let frame = rx.recv().expect("first frame");
//!     println!("{}x{} {:?}", frame.width(), frame.height(), frame.format());
//!
//!     cancel.cancel();
//!     let (pipeline, result) = worker.join().expect("acquisition thread");
//!     result?;
//!     pipeline.close()
//! }
//! ```

pub mod acquire;
pub mod context;
pub mod error;
pub mod frame;
pub mod pipeline;
pub mod stream;

pub use realsense_sys as sys;

// Re-export main types for convenience
pub use crate::acquire::{
    frame_channel, AcquireOptions, CancelToken, FrameReceiver, FrameSender, FrameSource,
    QueuePolicy, DEFAULT_CHANNEL_CAPACITY, DEFAULT_FIRST_FRAME_TIMEOUT, DEFAULT_POLL_TIMEOUT,
};
pub use crate::context::{Context, Device, DeviceInfo, DeviceList};
pub use crate::error::{Result, RsError};
pub use crate::frame::{Frame, FrameSet, ImageFrame};
pub use crate::pipeline::{Pipeline, Profile};
pub use crate::stream::{
    ImageFormat, PipelineConfig, StreamKind, StreamRequest, DEFAULT_FPS, DEFAULT_HEIGHT,
    DEFAULT_WIDTH,
};
