//! Context and device enumeration.

use std::ffi::CStr;
use std::ptr;

use realsense_sys as sys;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{check, Result, RsError};

/// Owned handle to the vendor runtime.
///
/// Created once at setup; releasing it invalidates every handle derived from
/// it, so the pipeline keeps it alive until the end of teardown.
pub struct Context {
    handle: *mut sys::rs2_context,
}

unsafe impl Send for Context {}

impl Context {
    pub fn new() -> Result<Self> {
        let mut err = ptr::null_mut();
        let handle = unsafe { sys::rs2_create_context(sys::RS2_API_VERSION, &mut err) };
        check(err, "create context")?;
        if handle.is_null() {
            return Err(RsError::Native {
                context: "create context",
                message: "returned a null handle".to_string(),
            });
        }
        Ok(Self { handle })
    }

    pub(crate) fn handle(&self) -> *mut sys::rs2_context {
        self.handle
    }

    /// Take a snapshot of the currently connected devices.
    pub fn query_devices(&self) -> Result<DeviceList> {
        let mut err = ptr::null_mut();
        let handle = unsafe { sys::rs2_query_devices(self.handle, &mut err) };
        check(err, "query devices")?;
        if handle.is_null() {
            return Err(RsError::Native {
                context: "query devices",
                message: "returned a null handle".to_string(),
            });
        }
        Ok(DeviceList { handle })
    }

    /// Static info for every enumerated device.
    ///
    /// Devices whose serial cannot be read are skipped with a warning rather
    /// than failing the whole listing.
    pub fn device_infos(&self) -> Result<Vec<DeviceInfo>> {
        let devices = self.query_devices()?;
        let count = devices.len()?;
        let mut infos = Vec::with_capacity(count);
        for index in 0..count {
            let device = match devices.get(index) {
                Ok(device) => device,
                Err(err) => {
                    warn!(index, error = %err, "skipping unreadable device");
                    continue;
                }
            };
            match device.describe() {
                Ok(Some(info)) => infos.push(info),
                Ok(None) => warn!(index, "skipping device without a serial number"),
                Err(err) => warn!(index, error = %err, "skipping unreadable device"),
            }
        }
        Ok(infos)
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        if !self.handle.is_null() {
            unsafe { sys::rs2_delete_context(self.handle) };
        }
    }
}

/// Transient enumeration snapshot, released as soon as setup is done with it.
pub struct DeviceList {
    handle: *mut sys::rs2_device_list,
}

unsafe impl Send for DeviceList {}

impl DeviceList {
    pub fn len(&self) -> Result<usize> {
        let mut err = ptr::null_mut();
        let count = unsafe { sys::rs2_get_device_count(self.handle, &mut err) };
        check(err, "count devices")?;
        Ok(count.max(0) as usize)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    pub fn get(&self, index: usize) -> Result<Device> {
        let mut err = ptr::null_mut();
        let handle = unsafe { sys::rs2_create_device(self.handle, index as i32, &mut err) };
        check(err, "open device")?;
        if handle.is_null() {
            return Err(RsError::Native {
                context: "open device",
                message: format!("returned a null handle for index {index}"),
            });
        }
        Ok(Device { handle })
    }
}

impl Drop for DeviceList {
    fn drop(&mut self) {
        if !self.handle.is_null() {
            unsafe { sys::rs2_delete_device_list(self.handle) };
        }
    }
}

/// One enumerated device.
pub struct Device {
    handle: *mut sys::rs2_device,
}

unsafe impl Send for Device {}

impl Device {
    fn info(&self, field: sys::rs2_camera_info, what: &'static str) -> Result<Option<String>> {
        let mut err = ptr::null_mut();
        let supported = unsafe { sys::rs2_supports_device_info(self.handle, field, &mut err) };
        check(err, what)?;
        if supported == 0 {
            return Ok(None);
        }
        let ptr = unsafe { sys::rs2_get_device_info(self.handle, field, &mut err) };
        check(err, what)?;
        if ptr.is_null() {
            return Ok(None);
        }
        Ok(Some(
            unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned(),
        ))
    }

    pub fn serial(&self) -> Result<Option<String>> {
        self.info(sys::RS2_CAMERA_INFO_SERIAL_NUMBER, "read device serial")
    }

    pub fn name(&self) -> Result<Option<String>> {
        self.info(sys::RS2_CAMERA_INFO_NAME, "read device name")
    }

    pub fn firmware_version(&self) -> Result<Option<String>> {
        self.info(sys::RS2_CAMERA_INFO_FIRMWARE_VERSION, "read device firmware")
    }

    /// Collect the static info fields into a [`DeviceInfo`].
    ///
    /// Returns `Ok(None)` when the device exposes no serial number.
    pub fn describe(&self) -> Result<Option<DeviceInfo>> {
        let Some(serial) = self.serial()? else {
            return Ok(None);
        };
        Ok(Some(DeviceInfo {
            serial,
            name: self.name()?.unwrap_or_default(),
            firmware_version: self.firmware_version()?,
        }))
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        if !self.handle.is_null() {
            unsafe { sys::rs2_delete_device(self.handle) };
        }
    }
}

/// Static info fields of an enumerated device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub serial: String,
    pub name: String,
    pub firmware_version: Option<String>,
}
