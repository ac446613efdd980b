//! Frame processing module
//!
//! Moves decoded pixels into a plain image buffer and back:
//! - Pixel format conversion (swscale)
//! - Frame → image copy (stride aware)
//! - Image processing hook
//! - Image → frame copy

mod convert;
mod scale;

pub use convert::{frame_to_image, image_to_frame, Image};
pub use scale::FrameScaler;

/// Image processing hook, applied to every frame between grab and record.
///
/// Frames pass through untouched.
pub fn process_image(_image: &mut Image) {}
