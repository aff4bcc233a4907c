//! Pipeline lifecycle: create, enable streams, start, acquire, close.

use std::ffi::CString;
use std::ptr;
use std::time::Duration;

use realsense_sys as sys;
use tracing::{debug, info, warn};

use crate::acquire::{self, AcquireOptions, CancelToken, FrameSender, FrameSource};
use crate::context::Context;
use crate::error::{check, Result, RsError};
use crate::frame::{FrameSet, ImageFrame};
use crate::stream::{PendingStreams, PipelineConfig, StreamKind, StreamRequest};

/// Owned native stream configuration, consumed by pipeline start.
struct NativeConfig {
    handle: *mut sys::rs2_config,
}

unsafe impl Send for NativeConfig {}

impl NativeConfig {
    fn new() -> Result<Self> {
        let mut err = ptr::null_mut();
        let handle = unsafe { sys::rs2_create_config(&mut err) };
        check(err, "create config")?;
        if handle.is_null() {
            return Err(RsError::Native {
                context: "create config",
                message: "returned a null handle".to_string(),
            });
        }
        Ok(Self { handle })
    }

    fn enable_device(&self, serial: &str) -> Result<()> {
        let serial = CString::new(serial)?;
        let mut err = ptr::null_mut();
        unsafe { sys::rs2_config_enable_device(self.handle, serial.as_ptr(), &mut err) };
        check(err, "bind config to device")
    }

    fn enable_stream(&self, request: &StreamRequest) -> Result<()> {
        let mut err = ptr::null_mut();
        unsafe {
            sys::rs2_config_enable_stream(
                self.handle,
                request.kind.as_raw(),
                0,
                request.width as i32,
                request.height as i32,
                request.format.as_raw(),
                request.fps as i32,
                &mut err,
            )
        };
        check(err, "enable stream")
    }
}

impl Drop for NativeConfig {
    fn drop(&mut self) {
        if !self.handle.is_null() {
            unsafe { sys::rs2_delete_config(self.handle) };
        }
    }
}

/// Owned native pipeline handle.
struct PipelineHandle {
    handle: *mut sys::rs2_pipeline,
}

unsafe impl Send for PipelineHandle {}

impl PipelineHandle {
    fn new(context: &Context) -> Result<Self> {
        let mut err = ptr::null_mut();
        let handle = unsafe { sys::rs2_create_pipeline(context.handle(), &mut err) };
        check(err, "create pipeline")?;
        if handle.is_null() {
            return Err(RsError::Native {
                context: "create pipeline",
                message: "returned a null handle".to_string(),
            });
        }
        Ok(Self { handle })
    }
}

impl Drop for PipelineHandle {
    fn drop(&mut self) {
        if !self.handle.is_null() {
            unsafe { sys::rs2_delete_pipeline(self.handle) };
        }
    }
}

/// The negotiated stream configuration of a started pipeline.
///
/// Owned by [`Pipeline`] and released before the pipeline itself.
pub struct Profile {
    handle: *mut sys::rs2_pipeline_profile,
}

unsafe impl Send for Profile {}

impl Drop for Profile {
    fn drop(&mut self) {
        if !self.handle.is_null() {
            unsafe { sys::rs2_delete_pipeline_profile(self.handle) };
        }
    }
}

/// A streaming session bound to one device.
///
/// All native handles are owned by this value and released in dependency
/// order when it is dropped or [`Pipeline::close`]d.
pub struct Pipeline {
    // Field order is release order: profile, config, pipeline, context.
    profile: Option<Profile>,
    config: NativeConfig,
    pipe: PipelineHandle,
    context: Context,
    requests: PendingStreams,
    stopped: bool,
}

impl Pipeline {
    /// Open the vendor runtime, enumerate devices, and prepare an unstarted
    /// pipeline.
    ///
    /// Fails with [`RsError::NoDeviceFound`] before allocating any pipeline
    /// or config resources when zero devices are connected, and with
    /// [`RsError::DeviceNotFound`] when `config.serial` matches none of them.
    pub fn create(config: PipelineConfig) -> Result<Self> {
        config.validate()?;

        let context = Context::new()?;
        let devices = context.query_devices()?;
        let count = devices.len()?;
        if count == 0 {
            return Err(RsError::NoDeviceFound);
        }
        debug!(count, "devices enumerated");

        let native = NativeConfig::new()?;
        if let Some(serial) = &config.serial {
            let mut matched = false;
            for index in 0..count {
                let device = match devices.get(index) {
                    Ok(device) => device,
                    Err(err) => {
                        warn!(index, error = %err, "skipping unreadable device");
                        continue;
                    }
                };
                match device.serial() {
                    Ok(Some(found)) if found == *serial => {
                        native.enable_device(serial)?;
                        matched = true;
                        break;
                    }
                    Ok(_) => {}
                    Err(err) => warn!(index, error = %err, "skipping unreadable device"),
                }
            }
            if !matched {
                return Err(RsError::DeviceNotFound(serial.clone()));
            }
            debug!(%serial, "pipeline bound to device");
        }

        let pipe = PipelineHandle::new(&context)?;
        drop(devices);

        let mut pipeline = Self {
            profile: None,
            config: native,
            pipe,
            context,
            requests: PendingStreams::default(),
            stopped: false,
        };
        if config.enable_depth {
            pipeline.enable_stream(StreamKind::Depth, config.width, config.height, config.fps)?;
        }
        if config.enable_color {
            pipeline.enable_stream(StreamKind::Color, config.width, config.height, config.fps)?;
        }
        Ok(pipeline)
    }

    /// Register a stream request on the pending configuration.
    ///
    /// Only [`StreamKind::Depth`] and [`StreamKind::Color`] are supported;
    /// a rejected request leaves the pending configuration untouched.
    /// Requesting the same kind again overwrites the earlier request.
    pub fn enable_stream(
        &mut self,
        kind: StreamKind,
        width: u32,
        height: u32,
        fps: u32,
    ) -> Result<()> {
        if self.profile.is_some() {
            return Err(RsError::InvalidConfiguration(
                "streams cannot be enabled after start".to_string(),
            ));
        }
        let request = StreamRequest::new(kind, width, height, fps)?;
        self.config.enable_stream(&request)?;
        self.requests.insert(request);
        debug!(%kind, width, height, fps, "stream enabled");
        Ok(())
    }

    /// Commit the configuration and begin streaming.
    ///
    /// On success the negotiated [`Profile`] is stored until [`close`]
    /// releases it; a negotiation failure surfaces as
    /// [`RsError::StartFailed`] wrapping the vendor message.
    ///
    /// [`close`]: Pipeline::close
    pub fn start(&mut self) -> Result<()> {
        if self.profile.is_some() {
            return Err(RsError::InvalidConfiguration(
                "pipeline already started".to_string(),
            ));
        }
        if self.requests.is_empty() {
            return Err(RsError::InvalidConfiguration(
                "no streams enabled".to_string(),
            ));
        }
        let mut err = ptr::null_mut();
        let handle = unsafe {
            sys::rs2_pipeline_start_with_config(self.pipe.handle, self.config.handle, &mut err)
        };
        check(err, "start pipeline").map_err(|e| match e {
            RsError::Native { message, .. } => RsError::StartFailed(message),
            other => other,
        })?;
        if handle.is_null() {
            return Err(RsError::StartFailed(
                "no pipeline profile returned".to_string(),
            ));
        }
        self.profile = Some(Profile { handle });
        self.stopped = false;
        info!(streams = self.requests.as_slice().len(), "pipeline started");
        Ok(())
    }

    pub fn is_started(&self) -> bool {
        self.profile.is_some() && !self.stopped
    }

    /// The requests registered so far, in registration order.
    pub fn stream_requests(&self) -> &[StreamRequest] {
        self.requests.as_slice()
    }

    /// The pending request for one stream kind, if registered.
    pub fn stream_request(&self, kind: StreamKind) -> Option<&StreamRequest> {
        self.requests.get(kind)
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    fn try_wait(&mut self, timeout: Duration) -> Result<Option<FrameSet>> {
        let mut err = ptr::null_mut();
        let mut frames = ptr::null_mut();
        let timeout_ms = timeout.as_millis().min(u32::MAX as u128) as u32;
        let got = unsafe {
            sys::rs2_pipeline_try_wait_for_frames(self.pipe.handle, &mut frames, timeout_ms, &mut err)
        };
        check(err, "wait for frames")?;
        if got == 0 || frames.is_null() {
            return Ok(None);
        }
        Ok(Some(FrameSet::from_handle(frames)))
    }

    /// Run the blocking acquisition loop, delivering frames on `sender`.
    ///
    /// Must be called after [`start`] and is not started automatically;
    /// callers typically spawn it on a dedicated thread. The mutable borrow
    /// keeps setup and teardown calls off the pipeline while the loop runs.
    ///
    /// [`start`]: Pipeline::start
    pub fn wait_frames(
        &mut self,
        sender: &FrameSender,
        options: &AcquireOptions,
        cancel: &CancelToken,
    ) -> Result<()> {
        if self.profile.is_none() {
            return Err(RsError::InvalidConfiguration(
                "pipeline is not started".to_string(),
            ));
        }
        acquire::run(self, sender, options, cancel)
    }

    fn stop(&mut self) -> Result<()> {
        if self.profile.is_none() || self.stopped {
            return Ok(());
        }
        // Not retried on failure; teardown proceeds either way.
        self.stopped = true;
        let mut err = ptr::null_mut();
        unsafe { sys::rs2_pipeline_stop(self.pipe.handle, &mut err) };
        check(err, "stop pipeline").map_err(|e| match e {
            RsError::Native { message, .. } => RsError::StopFailed(message),
            other => other,
        })?;
        info!("pipeline stopped");
        Ok(())
    }

    /// Stop streaming and release every native handle.
    ///
    /// Handles are released in order profile, config, pipeline, context even
    /// when the stop itself fails; the [`RsError::StopFailed`] error is
    /// reported after the release has run.
    pub fn close(mut self) -> Result<()> {
        let result = self.stop();
        drop(self);
        result
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        if let Err(err) = self.stop() {
            warn!(error = %err, "pipeline stop failed during teardown");
        }
        // Remaining handles are released by the fields' drops, in
        // declaration order: profile, config, pipeline, context.
    }
}

impl FrameSource for Pipeline {
    fn next_frames(&mut self, timeout: Duration) -> Result<Option<Vec<ImageFrame>>> {
        let Some(set) = self.try_wait(timeout)? else {
            return Ok(None);
        };
        let count = set.len()?;
        let mut frames = Vec::with_capacity(count);
        for index in 0..count {
            // The native handle is released by the frame's drop even when
            // the payload copy fails; the set itself is released at the end
            // of this scope.
            match set.extract(index).and_then(|frame| frame.to_image()) {
                Ok(image) => frames.push(image),
                Err(err) => warn!(index, error = %err, "skipping frame"),
            }
        }
        Ok(Some(frames))
    }
}
