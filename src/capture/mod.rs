//! Video input module
//!
//! Opens a media file, decodes its video stream (optionally on a hardware
//! device) and hands out frames in the BGR24 grab format.

mod grabber;
pub mod hw;

pub use grabber::Grabber;
pub use hw::HwDevice;
