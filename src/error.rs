//! Error handling for the librealsense2 bindings.

use std::ffi::CStr;
use std::fmt;
use std::time::Duration;

use realsense_sys as sys;

/// Result type for librealsense2 operations.
pub type Result<T> = std::result::Result<T, RsError>;

/// Errors that can occur when working with a RealSense device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RsError {
    /// Zero devices were enumerated during setup
    NoDeviceFound,
    /// The requested device serial matched no enumerated device
    DeviceNotFound(String),
    /// The stream kind is not supported by this binding
    UnsupportedStream(String),
    /// Pipeline negotiation failed for the requested stream configuration
    StartFailed(String),
    /// Pipeline stop failed; teardown still released the remaining handles
    StopFailed(String),
    /// No frames arrived within the caller-supplied first-frame bound
    WaitTimeout(Duration),
    /// A native call failed
    Native {
        context: &'static str,
        message: String,
    },
    /// A frame payload did not match its declared dimensions
    InvalidFrame(String),
    /// Rejected configuration value
    InvalidConfiguration(String),
}

impl fmt::Display for RsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RsError::NoDeviceFound => write!(f, "no realsense devices found"),
            RsError::DeviceNotFound(serial) => {
                write!(f, "no device with serial {serial} found")
            }
            RsError::UnsupportedStream(kind) => write!(f, "unsupported stream kind: {kind}"),
            RsError::StartFailed(msg) => write!(f, "pipeline start failed: {msg}"),
            RsError::StopFailed(msg) => write!(f, "pipeline stop failed: {msg}"),
            RsError::WaitTimeout(bound) => {
                write!(f, "no frames received within {}ms", bound.as_millis())
            }
            RsError::Native { context, message } => write!(f, "failed to {context}: {message}"),
            RsError::InvalidFrame(msg) => write!(f, "invalid frame: {msg}"),
            RsError::InvalidConfiguration(msg) => write!(f, "invalid configuration: {msg}"),
        }
    }
}

impl std::error::Error for RsError {}

impl From<std::ffi::NulError> for RsError {
    fn from(err: std::ffi::NulError) -> Self {
        RsError::InvalidConfiguration(format!("null character in string: {err}"))
    }
}

/// Check the error out-parameter of a native call.
///
/// librealsense2 reports failures through an opaque `rs2_error` handle that
/// the caller owns once set; the message is extracted and the handle freed
/// before this returns.
pub(crate) fn check(err: *mut sys::rs2_error, context: &'static str) -> Result<()> {
    if err.is_null() {
        return Ok(());
    }
    let message = unsafe {
        let msg = sys::rs2_get_error_message(err);
        let function = sys::rs2_get_failed_function(err);
        let mut text = if msg.is_null() {
            String::from("unknown error")
        } else {
            CStr::from_ptr(msg).to_string_lossy().into_owned()
        };
        if !function.is_null() {
            let function = CStr::from_ptr(function).to_string_lossy();
            if !function.is_empty() {
                text = format!("{function}: {text}");
            }
        }
        sys::rs2_free_error(err);
        text
    };
    Err(RsError::Native { context, message })
}
