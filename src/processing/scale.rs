//! Pixel format conversion and scaling via FFmpeg swscale

use crate::error::{Error, Result};

use ffmpeg_next as ffmpeg;
use ffmpeg_next::format::Pixel;
use ffmpeg_next::software::scaling::{Context as SwsContext, Flags as SwsFlags};

/// Converts frames to a fixed destination format and size.
///
/// The swscale context is built on the first frame and rebuilt only when the
/// source format or dimensions change.
pub struct FrameScaler {
    context: Option<SwsContext>,
    source: Option<(Pixel, u32, u32)>,
    dst_format: Pixel,
    dst_width: u32,
    dst_height: u32,
}

impl FrameScaler {
    pub fn new(dst_format: Pixel, dst_width: u32, dst_height: u32) -> Self {
        Self {
            context: None,
            source: None,
            dst_format,
            dst_width,
            dst_height,
        }
    }

    pub fn dst_format(&self) -> Pixel {
        self.dst_format
    }

    /// Convert `input` into `output`.
    ///
    /// `output` must be empty or already hold a frame in the destination
    /// format and size; it is allocated on first use.
    pub fn run(&mut self, input: &ffmpeg::frame::Video, output: &mut ffmpeg::frame::Video) -> Result<()> {
        let source = (input.format(), input.width(), input.height());

        let context = match self.context.take() {
            Some(ctx) if self.source == Some(source) => ctx,
            _ => {
                tracing::debug!(
                    "Creating scaler {:?} {}x{} -> {:?} {}x{}",
                    source.0,
                    source.1,
                    source.2,
                    self.dst_format,
                    self.dst_width,
                    self.dst_height
                );
                self.source = Some(source);
                SwsContext::get(
                    source.0,
                    source.1,
                    source.2,
                    self.dst_format,
                    self.dst_width,
                    self.dst_height,
                    SwsFlags::BILINEAR,
                )
                .map_err(|e| Error::Conversion(format!("Failed to create scaler: {}", e)))?
            }
        };

        let context = self.context.insert(context);
        context
            .run(input, output)
            .map_err(|e| Error::Conversion(format!("Conversion failed: {}", e)))
    }
}
