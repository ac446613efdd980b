//! Common types used throughout ghostcode

use ffmpeg_next::format::Pixel;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Pixel format used at the grab/record boundary.
///
/// 24-bit packed BGR, three bytes per pixel.
pub const PIXEL_FORMAT: Pixel = Pixel::BGR24;

/// Bytes per pixel of [`PIXEL_FORMAT`]
pub const PIXEL_CHANNELS: usize = 3;

/// Video resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Size in bytes of one tightly packed BGR24 image
    pub fn packed_bgr_size(&self) -> usize {
        self.width as usize * self.height as usize * PIXEL_CHANNELS
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Framerate representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Framerate {
    pub num: u32,
    pub den: u32,
}

impl Framerate {
    pub const fn new(num: u32, den: u32) -> Self {
        Self { num, den }
    }

    /// Used when the input does not report a usable rate
    pub const FALLBACK: Self = Self::new(30, 1);

    /// Build from an FFmpeg rational, `None` if it is not a positive rate
    pub fn from_rational(rate: ffmpeg_next::Rational) -> Option<Self> {
        let (num, den) = (rate.numerator(), rate.denominator());
        if num <= 0 || den <= 0 {
            return None;
        }
        Some(Self::new(num as u32, den as u32))
    }

    /// Get framerate as f64
    pub fn as_f64(&self) -> f64 {
        if self.den == 0 {
            return 0.0;
        }
        self.num as f64 / self.den as f64
    }

    /// As an FFmpeg rational (frames per second)
    pub fn to_rational(&self) -> ffmpeg_next::Rational {
        ffmpeg_next::Rational::new(self.num as i32, self.den as i32)
    }

    /// Encoder time base, one tick per frame
    pub fn time_base(&self) -> ffmpeg_next::Rational {
        ffmpeg_next::Rational::new(self.den as i32, self.num as i32)
    }
}

impl Default for Framerate {
    fn default() -> Self {
        Self::FALLBACK
    }
}

impl std::fmt::Display for Framerate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.den == 1 {
            write!(f, "{} fps", self.num)
        } else {
            write!(f, "{:.2} fps", self.as_f64())
        }
    }
}

/// Throughput of a finished transcode
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TranscodeStats {
    /// Frames pulled through the copy loop
    pub frames: u64,
    /// Wall time spent in the loop
    pub elapsed: Duration,
}

impl TranscodeStats {
    pub fn new(frames: u64, elapsed: Duration) -> Self {
        Self { frames, elapsed }
    }

    /// Elapsed seconds rounded to milliseconds
    pub fn seconds(&self) -> f64 {
        round3(self.elapsed.as_secs_f64())
    }

    /// Frames per second rounded to 3 decimals, 0 when no time elapsed
    pub fn fps(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs <= 0.0 {
            return 0.0;
        }
        round3(self.frames as f64 / secs)
    }

    /// The completion line printed after a transcode
    pub fn summary(&self) -> String {
        format!(
            "Done. Processing time: {} ({} fps)",
            format_decimal(self.seconds()),
            format_decimal(self.fps())
        )
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Print a float with at least one fractional digit ("2.0", "1.25")
pub fn format_decimal(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}
