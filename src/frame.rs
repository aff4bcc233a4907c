//! Native frame handles and the host-owned image values extracted from them.

use std::ptr;
use std::slice;

use image::{ImageBuffer, Luma, RgbImage};
use realsense_sys as sys;

use crate::error::{check, Result, RsError};
use crate::stream::{ImageFormat, StreamKind};

/// One synchronized capture cycle's set of frames.
///
/// Owns the composite `rs2_frame`; the handle is released on drop regardless
/// of how many embedded frames were extracted or whether any of them failed.
pub struct FrameSet {
    handle: *mut sys::rs2_frame,
}

unsafe impl Send for FrameSet {}

impl FrameSet {
    pub(crate) fn from_handle(handle: *mut sys::rs2_frame) -> Self {
        Self { handle }
    }

    pub fn len(&self) -> Result<usize> {
        let mut err = ptr::null_mut();
        let count = unsafe { sys::rs2_embedded_frames_count(self.handle, &mut err) };
        check(err, "count embedded frames")?;
        Ok(count.max(0) as usize)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    pub fn extract(&self, index: usize) -> Result<Frame> {
        let mut err = ptr::null_mut();
        let handle = unsafe { sys::rs2_extract_frame(self.handle, index as i32, &mut err) };
        check(err, "extract frame")?;
        if handle.is_null() {
            return Err(RsError::Native {
                context: "extract frame",
                message: format!("returned a null handle for index {index}"),
            });
        }
        Ok(Frame { handle })
    }
}

impl Drop for FrameSet {
    fn drop(&mut self) {
        if !self.handle.is_null() {
            unsafe { sys::rs2_release_frame(self.handle) };
        }
    }
}

/// One extracted frame, released on drop even when its payload copy failed.
pub struct Frame {
    handle: *mut sys::rs2_frame,
}

unsafe impl Send for Frame {}

impl Frame {
    /// The stream kind, decided once from the depth-frame capability check.
    pub fn kind(&self) -> Result<StreamKind> {
        let mut err = ptr::null_mut();
        let depth = unsafe {
            sys::rs2_is_frame_extendable_to(self.handle, sys::RS2_EXTENSION_DEPTH_FRAME, &mut err)
        };
        check(err, "check frame capability")?;
        Ok(if depth != 0 {
            StreamKind::Depth
        } else {
            StreamKind::Color
        })
    }

    pub fn width(&self) -> Result<u32> {
        let mut err = ptr::null_mut();
        let width = unsafe { sys::rs2_get_frame_width(self.handle, &mut err) };
        check(err, "read frame width")?;
        Ok(width.max(0) as u32)
    }

    pub fn height(&self) -> Result<u32> {
        let mut err = ptr::null_mut();
        let height = unsafe { sys::rs2_get_frame_height(self.handle, &mut err) };
        check(err, "read frame height")?;
        Ok(height.max(0) as u32)
    }

    pub fn data_size(&self) -> Result<usize> {
        let mut err = ptr::null_mut();
        let size = unsafe { sys::rs2_get_frame_data_size(self.handle, &mut err) };
        check(err, "read frame size")?;
        Ok(size.max(0) as usize)
    }

    /// Borrow the raw payload. Valid only while this frame is alive.
    pub fn data(&self) -> Result<&[u8]> {
        let len = self.data_size()?;
        if len == 0 {
            return Ok(&[]);
        }
        let mut err = ptr::null_mut();
        let ptr = unsafe { sys::rs2_get_frame_data(self.handle, &mut err) };
        check(err, "read frame data")?;
        if ptr.is_null() {
            return Err(RsError::Native {
                context: "read frame data",
                message: "returned a null payload".to_string(),
            });
        }
        Ok(unsafe { slice::from_raw_parts(ptr as *const u8, len) })
    }

    /// Copy the payload into a host-owned [`ImageFrame`].
    pub fn to_image(&self) -> Result<ImageFrame> {
        let format = match self.kind()? {
            StreamKind::Depth => ImageFormat::Gray16,
            _ => ImageFormat::Rgb8,
        };
        ImageFrame::from_parts(format, self.width()?, self.height()?, self.data()?.to_vec())
    }
}

impl Drop for Frame {
    fn drop(&mut self) {
        if !self.handle.is_null() {
            unsafe { sys::rs2_release_frame(self.handle) };
        }
    }
}

/// Host-owned image-matrix value, tagged with its pixel format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFrame {
    format: ImageFormat,
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl ImageFrame {
    /// Wrap a payload, validating its length against the declared dimensions.
    pub fn from_parts(format: ImageFormat, width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * format.bytes_per_pixel();
        if data.len() != expected {
            return Err(RsError::InvalidFrame(format!(
                "{format:?} {width}x{height} expects {expected} bytes, got {}",
                data.len()
            )));
        }
        Ok(Self {
            format,
            width,
            height,
            data,
        })
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// View a depth frame as a 16-bit grayscale image buffer.
    ///
    /// Returns `None` for color frames.
    pub fn to_luma16(&self) -> Option<ImageBuffer<Luma<u16>, Vec<u16>>> {
        if self.format != ImageFormat::Gray16 {
            return None;
        }
        let pixels = self
            .data
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .collect();
        ImageBuffer::from_raw(self.width, self.height, pixels)
    }

    /// View a color frame as an RGB image buffer.
    ///
    /// Returns `None` for depth frames.
    pub fn to_rgb8(&self) -> Option<RgbImage> {
        if self.format != ImageFormat::Rgb8 {
            return None;
        }
        RgbImage::from_raw(self.width, self.height, self.data.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_length_is_validated() {
        let depth = ImageFrame::from_parts(ImageFormat::Gray16, 640, 480, vec![0; 640 * 480 * 2]);
        assert!(depth.is_ok());

        let color = ImageFrame::from_parts(ImageFormat::Rgb8, 640, 480, vec![0; 640 * 480 * 3]);
        assert!(color.is_ok());

        let short = ImageFrame::from_parts(ImageFormat::Gray16, 640, 480, vec![0; 640 * 480]);
        assert!(matches!(short, Err(RsError::InvalidFrame(_))));
    }

    #[test]
    fn expected_payload_sizes() {
        let depth =
            ImageFrame::from_parts(ImageFormat::Gray16, 640, 480, vec![0; 614_400]).unwrap();
        assert_eq!(depth.data().len(), 614_400);

        let color = ImageFrame::from_parts(ImageFormat::Rgb8, 640, 480, vec![0; 921_600]).unwrap();
        assert_eq!(color.data().len(), 921_600);
    }

    #[test]
    fn depth_pixels_decode_little_endian() {
        let frame =
            ImageFrame::from_parts(ImageFormat::Gray16, 2, 1, vec![0x34, 0x12, 0xff, 0x00])
                .unwrap();
        let image = frame.to_luma16().unwrap();
        assert_eq!(image.get_pixel(0, 0).0[0], 0x1234);
        assert_eq!(image.get_pixel(1, 0).0[0], 0x00ff);
        assert!(frame.to_rgb8().is_none());
    }

    #[test]
    fn color_pixels_round_trip() {
        let frame =
            ImageFrame::from_parts(ImageFormat::Rgb8, 1, 2, vec![1, 2, 3, 4, 5, 6]).unwrap();
        let image = frame.to_rgb8().unwrap();
        assert_eq!(image.get_pixel(0, 0).0, [1, 2, 3]);
        assert_eq!(image.get_pixel(0, 1).0, [4, 5, 6]);
        assert!(frame.to_luma16().is_none());
    }
}
