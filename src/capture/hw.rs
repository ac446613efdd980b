//! Hardware decoding device contexts

use crate::codecs::HwAccel;
use crate::error::{Error, Result};

use ffmpeg_next as ffmpeg;
use ffmpeg_next::ffi;
use std::ffi::CString;
use std::ptr;

/// Owned FFmpeg hardware device context (`AVBufferRef`)
pub struct HwDevice {
    accel: HwAccel,
    ctx: *mut ffi::AVBufferRef,
}

impl HwDevice {
    /// Open a device for the accelerator.
    ///
    /// Returns `None` when FFmpeg has no device type for it or the device
    /// cannot be opened on this machine.
    pub fn try_create(accel: HwAccel) -> Option<Self> {
        let Some(type_name) = accel.device_type_name() else {
            tracing::warn!("{} has no FFmpeg device type, decoding in software", accel);
            return None;
        };

        let c_name = CString::new(type_name).ok()?;

        // SAFETY: c_name is a valid NUL-terminated string that outlives the call.
        let device_type = unsafe { ffi::av_hwdevice_find_type_by_name(c_name.as_ptr()) };
        if device_type == ffi::AVHWDeviceType::AV_HWDEVICE_TYPE_NONE {
            tracing::warn!(
                "FFmpeg was built without {} support, decoding in software",
                type_name
            );
            return None;
        }

        let mut ctx: *mut ffi::AVBufferRef = ptr::null_mut();
        // SAFETY: ctx is a valid out-pointer; it is only kept when ret >= 0.
        let ret = unsafe {
            ffi::av_hwdevice_ctx_create(&mut ctx, device_type, ptr::null(), ptr::null_mut(), 0)
        };

        if ret < 0 || ctx.is_null() {
            tracing::warn!(
                "Failed to open {} device: {}, decoding in software",
                type_name,
                ffmpeg::Error::from(ret)
            );
            return None;
        }

        tracing::info!("Opened {} hardware device", type_name);
        Some(Self { accel, ctx })
    }

    pub fn accel(&self) -> HwAccel {
        self.accel
    }

    /// Attach a new reference of this device to an unopened codec context
    pub fn attach(&self, context: &mut ffmpeg::codec::context::Context) -> Result<()> {
        // SAFETY: ctx is a live device reference owned by self; the codec
        // context takes its own reference.
        unsafe {
            let device_ref = ffi::av_buffer_ref(self.ctx);
            if device_ref.is_null() {
                return Err(Error::Decoding("Failed to reference hardware device".into()));
            }
            (*context.as_mut_ptr()).hw_device_ctx = device_ref;
        }
        Ok(())
    }
}

impl Drop for HwDevice {
    fn drop(&mut self) {
        // SAFETY: ctx was created by av_hwdevice_ctx_create and is unreferenced once.
        unsafe {
            ffi::av_buffer_unref(&mut self.ctx);
        }
    }
}

/// Whether the frame lives in device memory
pub fn is_hw_frame(frame: &ffmpeg::frame::Video) -> bool {
    // SAFETY: the wrapper always holds an allocated AVFrame.
    unsafe { !(*frame.as_ptr()).hw_frames_ctx.is_null() }
}

/// Download a device frame into system memory
pub fn transfer_hw_frame(
    src: &ffmpeg::frame::Video,
    dst: &mut ffmpeg::frame::Video,
) -> Result<()> {
    // SAFETY: both frames are valid AVFrames; dst is reset so FFmpeg picks
    // the download format and allocates it.
    unsafe {
        ffi::av_frame_unref(dst.as_mut_ptr());

        let ret = ffi::av_hwframe_transfer_data(dst.as_mut_ptr(), src.as_ptr(), 0);
        if ret < 0 {
            return Err(Error::Decoding(format!(
                "Hardware frame transfer failed: {}",
                ffmpeg::Error::from(ret)
            )));
        }

        let ret = ffi::av_frame_copy_props(dst.as_mut_ptr(), src.as_ptr());
        if ret < 0 {
            return Err(Error::Decoding(format!(
                "Hardware frame props copy failed: {}",
                ffmpeg::Error::from(ret)
            )));
        }
    }

    Ok(())
}
