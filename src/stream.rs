//! Stream kinds, pixel formats, and pipeline configuration.

use std::fmt;
use std::str::FromStr;

use realsense_sys as sys;
use serde::{Deserialize, Serialize};

use crate::error::{Result, RsError};

/// Logical category of data requested from the device.
///
/// Mirrors `rs2_stream`. Only [`StreamKind::Depth`] and [`StreamKind::Color`]
/// can be enabled through this binding; requesting any other kind fails with
/// [`RsError::UnsupportedStream`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    Depth,
    Color,
    Infrared,
    Fisheye,
    Gyro,
    Accel,
    Pose,
}

impl StreamKind {
    pub(crate) fn as_raw(self) -> sys::rs2_stream {
        match self {
            StreamKind::Depth => sys::RS2_STREAM_DEPTH,
            StreamKind::Color => sys::RS2_STREAM_COLOR,
            StreamKind::Infrared => sys::RS2_STREAM_INFRARED,
            StreamKind::Fisheye => sys::RS2_STREAM_FISHEYE,
            StreamKind::Gyro => sys::RS2_STREAM_GYRO,
            StreamKind::Accel => sys::RS2_STREAM_ACCEL,
            StreamKind::Pose => sys::RS2_STREAM_POSE,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            StreamKind::Depth => "depth",
            StreamKind::Color => "color",
            StreamKind::Infrared => "infrared",
            StreamKind::Fisheye => "fisheye",
            StreamKind::Gyro => "gyro",
            StreamKind::Accel => "accel",
            StreamKind::Pose => "pose",
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StreamKind {
    type Err = RsError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "depth" => Ok(StreamKind::Depth),
            "color" => Ok(StreamKind::Color),
            "infrared" => Ok(StreamKind::Infrared),
            "fisheye" => Ok(StreamKind::Fisheye),
            "gyro" => Ok(StreamKind::Gyro),
            "accel" => Ok(StreamKind::Accel),
            "pose" => Ok(StreamKind::Pose),
            other => Err(RsError::UnsupportedStream(other.to_string())),
        }
    }
}

/// Pixel layout of a host-owned image buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    /// 16-bit single-channel depth, native `Z16`
    Gray16,
    /// 8-bit three-channel color, native `RGB8`
    Rgb8,
}

impl ImageFormat {
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            ImageFormat::Gray16 => 2,
            ImageFormat::Rgb8 => 3,
        }
    }

    pub(crate) fn as_raw(self) -> sys::rs2_format {
        match self {
            ImageFormat::Gray16 => sys::RS2_FORMAT_Z16,
            ImageFormat::Rgb8 => sys::RS2_FORMAT_RGB8,
        }
    }
}

/// One validated stream request, as registered on the pending configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamRequest {
    pub kind: StreamKind,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub format: ImageFormat,
}

impl StreamRequest {
    /// Map a stream kind to its fixed pixel format and validate the mode.
    ///
    /// Fails before any native call so a rejected request leaves the pending
    /// configuration untouched.
    pub fn new(kind: StreamKind, width: u32, height: u32, fps: u32) -> Result<Self> {
        let format = match kind {
            StreamKind::Depth => ImageFormat::Gray16,
            StreamKind::Color => ImageFormat::Rgb8,
            other => return Err(RsError::UnsupportedStream(other.to_string())),
        };
        if width == 0 || height == 0 || fps == 0 {
            return Err(RsError::InvalidConfiguration(format!(
                "{kind} stream mode {width}x{height}@{fps} has a zero dimension"
            )));
        }
        Ok(Self {
            kind,
            width,
            height,
            fps,
            format,
        })
    }
}

/// Host-side mirror of the requests registered on the native configuration.
///
/// Keyed by stream kind; registering a kind twice overwrites the earlier
/// request in place, preserving registration order.
#[derive(Debug, Clone, Default)]
pub(crate) struct PendingStreams {
    requests: Vec<StreamRequest>,
}

impl PendingStreams {
    pub(crate) fn insert(&mut self, request: StreamRequest) {
        match self.requests.iter_mut().find(|r| r.kind == request.kind) {
            Some(existing) => *existing = request,
            None => self.requests.push(request),
        }
    }

    pub(crate) fn get(&self, kind: StreamKind) -> Option<&StreamRequest> {
        self.requests.iter().find(|r| r.kind == kind)
    }

    pub(crate) fn as_slice(&self) -> &[StreamRequest] {
        &self.requests
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

pub const DEFAULT_WIDTH: u32 = 640;
pub const DEFAULT_HEIGHT: u32 = 480;
pub const DEFAULT_FPS: u32 = 30;

/// Setup-time configuration consumed by [`crate::Pipeline::create`].
///
/// `width`/`height`/`fps` describe the mode applied to streams enabled
/// through the `enable_*` flags; streams enabled later through
/// [`crate::Pipeline::enable_stream`] carry their own mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Restrict the pipeline to the device with this serial number.
    pub serial: Option<String>,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub enable_depth: bool,
    pub enable_color: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            serial: None,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            fps: DEFAULT_FPS,
            enable_depth: false,
            enable_color: false,
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_serial(mut self, serial: impl Into<String>) -> Self {
        self.serial = Some(serial.into());
        self
    }

    pub fn with_mode(mut self, width: u32, height: u32, fps: u32) -> Self {
        self.width = width;
        self.height = height;
        self.fps = fps;
        self
    }

    pub fn with_depth(mut self) -> Self {
        self.enable_depth = true;
        self
    }

    pub fn with_color(mut self) -> Self {
        self.enable_color = true;
        self
    }

    /// Parse a configuration from its JSON representation.
    pub fn from_json_str(s: &str) -> Result<Self> {
        serde_json::from_str(s)
            .map_err(|e| RsError::InvalidConfiguration(format!("invalid pipeline config: {e}")))
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 || self.fps == 0 {
            return Err(RsError::InvalidConfiguration(format!(
                "stream mode {}x{}@{} has a zero dimension",
                self.width, self.height, self.fps
            )));
        }
        if let Some(serial) = &self.serial {
            if serial.is_empty() {
                return Err(RsError::InvalidConfiguration(
                    "device serial is empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_and_color_map_to_fixed_formats() {
        let depth = StreamRequest::new(StreamKind::Depth, 640, 480, 30).unwrap();
        assert_eq!(depth.format, ImageFormat::Gray16);
        assert_eq!(depth.format.bytes_per_pixel(), 2);

        let color = StreamRequest::new(StreamKind::Color, 640, 480, 30).unwrap();
        assert_eq!(color.format, ImageFormat::Rgb8);
        assert_eq!(color.format.bytes_per_pixel(), 3);
    }

    #[test]
    fn unsupported_kinds_are_rejected() {
        for kind in [
            StreamKind::Infrared,
            StreamKind::Fisheye,
            StreamKind::Gyro,
            StreamKind::Accel,
            StreamKind::Pose,
        ] {
            let err = StreamRequest::new(kind, 640, 480, 30).unwrap_err();
            assert_eq!(err, RsError::UnsupportedStream(kind.to_string()));
        }
    }

    #[test]
    fn zero_dimensions_are_rejected() {
        assert!(matches!(
            StreamRequest::new(StreamKind::Depth, 0, 480, 30),
            Err(RsError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            StreamRequest::new(StreamKind::Color, 640, 480, 0),
            Err(RsError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn repeated_kind_overwrites_in_place() {
        let mut pending = PendingStreams::default();
        pending.insert(StreamRequest::new(StreamKind::Depth, 640, 480, 30).unwrap());
        pending.insert(StreamRequest::new(StreamKind::Color, 640, 480, 30).unwrap());
        pending.insert(StreamRequest::new(StreamKind::Depth, 1280, 720, 15).unwrap());

        assert_eq!(pending.as_slice().len(), 2);
        let depth = pending.get(StreamKind::Depth).unwrap();
        assert_eq!((depth.width, depth.height, depth.fps), (1280, 720, 15));
        // Registration order is preserved across the overwrite.
        assert_eq!(pending.as_slice()[0].kind, StreamKind::Depth);
        assert_eq!(pending.as_slice()[1].kind, StreamKind::Color);
    }

    #[test]
    fn config_defaults() {
        let config = PipelineConfig::new();
        assert_eq!(
            (config.width, config.height, config.fps),
            (DEFAULT_WIDTH, DEFAULT_HEIGHT, DEFAULT_FPS)
        );
        assert!(config.serial.is_none());
        assert!(!config.enable_depth);
        assert!(!config.enable_color);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_from_json() {
        let config =
            PipelineConfig::from_json_str(r#"{"serial": "841512070395", "enable_depth": true}"#)
                .unwrap();
        assert_eq!(config.serial.as_deref(), Some("841512070395"));
        assert!(config.enable_depth);
        assert!(!config.enable_color);
        assert_eq!(config.width, DEFAULT_WIDTH);

        assert!(PipelineConfig::from_json_str("{not json").is_err());
    }

    #[test]
    fn empty_serial_is_rejected() {
        let config = PipelineConfig::new().with_serial("");
        assert!(matches!(
            config.validate(),
            Err(RsError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn kind_round_trips_through_str() {
        for kind in [StreamKind::Depth, StreamKind::Color, StreamKind::Pose] {
            assert_eq!(kind.to_string().parse::<StreamKind>().unwrap(), kind);
        }
        assert_eq!(
            "thermal".parse::<StreamKind>().unwrap_err(),
            RsError::UnsupportedStream("thermal".to_string())
        );
    }
}
