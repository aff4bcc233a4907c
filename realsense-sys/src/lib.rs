//! Raw FFI declarations for the subset of the librealsense2 C API used by the
//! `realsense` crate: context/device enumeration, pipeline configuration and
//! streaming, composite frame access, and the error-object protocol.
//!
//! Every fallible call takes a trailing `*mut *mut rs2_error` out-parameter.
//! A non-null result must be freed with [`rs2_free_error`] after its message
//! has been extracted.

#![allow(non_camel_case_types)]

use core::ffi::{c_char, c_int, c_uint, c_void};

// Opaque handle types. These only ever cross the boundary behind a pointer.

#[repr(C)]
pub struct rs2_context {
    _unused: [u8; 0],
}

#[repr(C)]
pub struct rs2_device_list {
    _unused: [u8; 0],
}

#[repr(C)]
pub struct rs2_device {
    _unused: [u8; 0],
}

#[repr(C)]
pub struct rs2_pipeline {
    _unused: [u8; 0],
}

#[repr(C)]
pub struct rs2_config {
    _unused: [u8; 0],
}

#[repr(C)]
pub struct rs2_pipeline_profile {
    _unused: [u8; 0],
}

#[repr(C)]
pub struct rs2_frame {
    _unused: [u8; 0],
}

#[repr(C)]
pub struct rs2_error {
    _unused: [u8; 0],
}

/// `rs2_stream`: category of data provided by the device.
pub type rs2_stream = c_int;

pub const RS2_STREAM_ANY: rs2_stream = 0;
pub const RS2_STREAM_DEPTH: rs2_stream = 1;
pub const RS2_STREAM_COLOR: rs2_stream = 2;
pub const RS2_STREAM_INFRARED: rs2_stream = 3;
pub const RS2_STREAM_FISHEYE: rs2_stream = 4;
pub const RS2_STREAM_GYRO: rs2_stream = 5;
pub const RS2_STREAM_ACCEL: rs2_stream = 6;
pub const RS2_STREAM_POSE: rs2_stream = 7;

/// `rs2_format`: how binary data is encoded within a frame.
pub type rs2_format = c_int;

pub const RS2_FORMAT_ANY: rs2_format = 0;
pub const RS2_FORMAT_Z16: rs2_format = 1;
pub const RS2_FORMAT_DISPARITY16: rs2_format = 2;
pub const RS2_FORMAT_XYZ32F: rs2_format = 3;
pub const RS2_FORMAT_YUYV: rs2_format = 4;
pub const RS2_FORMAT_RGB8: rs2_format = 5;
pub const RS2_FORMAT_BGR8: rs2_format = 6;
pub const RS2_FORMAT_RGBA8: rs2_format = 7;
pub const RS2_FORMAT_BGRA8: rs2_format = 8;
pub const RS2_FORMAT_Y8: rs2_format = 9;
pub const RS2_FORMAT_Y16: rs2_format = 10;

/// `rs2_camera_info`: static device info fields.
pub type rs2_camera_info = c_int;

pub const RS2_CAMERA_INFO_NAME: rs2_camera_info = 0;
pub const RS2_CAMERA_INFO_SERIAL_NUMBER: rs2_camera_info = 1;
pub const RS2_CAMERA_INFO_FIRMWARE_VERSION: rs2_camera_info = 2;
pub const RS2_CAMERA_INFO_RECOMMENDED_FIRMWARE_VERSION: rs2_camera_info = 3;
pub const RS2_CAMERA_INFO_PHYSICAL_PORT: rs2_camera_info = 4;
pub const RS2_CAMERA_INFO_PRODUCT_ID: rs2_camera_info = 7;

/// `rs2_extension`: capability interfaces a frame may be extendable to.
pub type rs2_extension = c_int;

pub const RS2_EXTENSION_UNKNOWN: rs2_extension = 0;
pub const RS2_EXTENSION_VIDEO_FRAME: rs2_extension = 8;
pub const RS2_EXTENSION_MOTION_FRAME: rs2_extension = 9;
pub const RS2_EXTENSION_COMPOSITE_FRAME: rs2_extension = 10;
pub const RS2_EXTENSION_POINTS: rs2_extension = 11;
pub const RS2_EXTENSION_DEPTH_FRAME: rs2_extension = 12;

pub const RS2_API_MAJOR_VERSION: c_int = 2;
pub const RS2_API_MINOR_VERSION: c_int = 54;
pub const RS2_API_PATCH_VERSION: c_int = 2;

/// Encoded API version, as computed by the `RS2_API_VERSION` header macro.
pub const RS2_API_VERSION: c_int =
    RS2_API_MAJOR_VERSION * 10000 + RS2_API_MINOR_VERSION * 100 + RS2_API_PATCH_VERSION;

/// Default wait timeout used by the vendor examples, in milliseconds.
pub const RS2_DEFAULT_TIMEOUT: c_uint = 15000;

unsafe extern "C" {
    // Context
    pub fn rs2_create_context(api_version: c_int, error: *mut *mut rs2_error) -> *mut rs2_context;
    pub fn rs2_delete_context(context: *mut rs2_context);

    // Device enumeration
    pub fn rs2_query_devices(
        context: *const rs2_context,
        error: *mut *mut rs2_error,
    ) -> *mut rs2_device_list;
    pub fn rs2_get_device_count(
        info_list: *const rs2_device_list,
        error: *mut *mut rs2_error,
    ) -> c_int;
    pub fn rs2_delete_device_list(info_list: *mut rs2_device_list);
    pub fn rs2_create_device(
        info_list: *const rs2_device_list,
        index: c_int,
        error: *mut *mut rs2_error,
    ) -> *mut rs2_device;
    pub fn rs2_delete_device(device: *mut rs2_device);
    pub fn rs2_get_device_info(
        device: *const rs2_device,
        info: rs2_camera_info,
        error: *mut *mut rs2_error,
    ) -> *const c_char;
    pub fn rs2_supports_device_info(
        device: *const rs2_device,
        info: rs2_camera_info,
        error: *mut *mut rs2_error,
    ) -> c_int;

    // Configuration
    pub fn rs2_create_config(error: *mut *mut rs2_error) -> *mut rs2_config;
    pub fn rs2_delete_config(config: *mut rs2_config);
    pub fn rs2_config_enable_stream(
        config: *mut rs2_config,
        stream: rs2_stream,
        index: c_int,
        width: c_int,
        height: c_int,
        format: rs2_format,
        framerate: c_int,
        error: *mut *mut rs2_error,
    );
    pub fn rs2_config_enable_device(
        config: *mut rs2_config,
        serial: *const c_char,
        error: *mut *mut rs2_error,
    );

    // Pipeline
    pub fn rs2_create_pipeline(
        ctx: *mut rs2_context,
        error: *mut *mut rs2_error,
    ) -> *mut rs2_pipeline;
    pub fn rs2_delete_pipeline(pipe: *mut rs2_pipeline);
    pub fn rs2_pipeline_start_with_config(
        pipe: *mut rs2_pipeline,
        config: *mut rs2_config,
        error: *mut *mut rs2_error,
    ) -> *mut rs2_pipeline_profile;
    pub fn rs2_pipeline_stop(pipe: *mut rs2_pipeline, error: *mut *mut rs2_error);
    pub fn rs2_delete_pipeline_profile(profile: *mut rs2_pipeline_profile);
    pub fn rs2_pipeline_wait_for_frames(
        pipe: *mut rs2_pipeline,
        timeout_ms: c_uint,
        error: *mut *mut rs2_error,
    ) -> *mut rs2_frame;
    pub fn rs2_pipeline_try_wait_for_frames(
        pipe: *mut rs2_pipeline,
        output_frame: *mut *mut rs2_frame,
        timeout_ms: c_uint,
        error: *mut *mut rs2_error,
    ) -> c_int;

    // Frames
    pub fn rs2_embedded_frames_count(
        composite: *mut rs2_frame,
        error: *mut *mut rs2_error,
    ) -> c_int;
    pub fn rs2_extract_frame(
        composite: *mut rs2_frame,
        index: c_int,
        error: *mut *mut rs2_error,
    ) -> *mut rs2_frame;
    pub fn rs2_is_frame_extendable_to(
        frame: *const rs2_frame,
        extension_type: rs2_extension,
        error: *mut *mut rs2_error,
    ) -> c_int;
    pub fn rs2_get_frame_data(
        frame: *const rs2_frame,
        error: *mut *mut rs2_error,
    ) -> *const c_void;
    pub fn rs2_get_frame_data_size(
        frame: *const rs2_frame,
        error: *mut *mut rs2_error,
    ) -> c_int;
    pub fn rs2_get_frame_width(frame: *const rs2_frame, error: *mut *mut rs2_error) -> c_int;
    pub fn rs2_get_frame_height(frame: *const rs2_frame, error: *mut *mut rs2_error) -> c_int;
    pub fn rs2_get_frame_stride_in_bytes(
        frame: *const rs2_frame,
        error: *mut *mut rs2_error,
    ) -> c_int;
    pub fn rs2_release_frame(frame: *mut rs2_frame);

    // Error protocol
    pub fn rs2_get_error_message(error: *const rs2_error) -> *const c_char;
    pub fn rs2_get_failed_function(error: *const rs2_error) -> *const c_char;
    pub fn rs2_free_error(error: *mut rs2_error);
}
