//! ghostcode — FFmpeg video transcoder
//!
//! Decodes a video file, copies every frame through a plain BGR24 image
//! buffer and re-encodes it, optionally with hardware decoding and a chosen
//! decoder/encoder pair. Also inspects FFmpeg's codec registry.
//!
//! # Features
//!
//! - **Capture**: demux + decode with optional VAAPI/QSV/CUDA/VDPAU/DXVA2/VideoToolbox devices
//! - **Processing**: stride-aware frame ↔ image copies with reusable buffers
//! - **Output**: any FFmpeg encoder and container guessed from the path
//! - **Inspection**: software/hardware encoder and decoder listings
//!
//! # Example
//!
//! ```rust,no_run
//! use ghostcode::{TranscodeConfig, Transcoder};
//!
//! fn main() -> ghostcode::Result<()> {
//!     let config = TranscodeConfig::new("input.mp4").with_encoder("libx264");
//!
//!     let stats = Transcoder::new(config).run()?;
//!     println!("{}", stats.summary());
//!     Ok(())
//! }
//! ```

pub mod capture;
pub mod codecs;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod processing;
pub mod types;

// Re-exports for convenience
pub use capture::Grabber;
pub use codecs::{CodecInfo, CodecKind, HwAccel};
pub use config::TranscodeConfig;
pub use error::{Error, Result};
pub use output::{Recorder, RecorderSettings};
pub use pipeline::Transcoder;
pub use processing::Image;
pub use types::{Framerate, Resolution, TranscodeStats, PIXEL_FORMAT};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Names of registered codecs of one kind, split by hardware acceleration
pub fn codec_names(kind: CodecKind, hardware: bool) -> Result<Vec<String>> {
    let codecs = codecs::list_codecs()?;
    Ok(codecs::filter_codecs(&codecs, kind, hardware)
        .into_iter()
        .map(str::to_string)
        .collect())
}

/// Hardware accelerators that FFmpeg has decoders for
pub fn available_hwaccels() -> Result<Vec<HwAccel>> {
    let codecs = codecs::list_codecs()?;
    Ok(codecs::detect_hwaccels(&codecs))
}
