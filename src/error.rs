//! Error types for ghostcode

use thiserror::Error;

/// Result type alias for ghostcode operations
pub type Result<T> = std::result::Result<T, Error>;

/// ghostcode error type
#[derive(Error, Debug)]
pub enum Error {
    // Input errors
    #[error("Failed to open input '{path}': {reason}")]
    InputOpen { path: String, reason: String },

    #[error("No video stream found in '{0}'")]
    NoVideoStream(String),

    #[error("Decoder not found: {0}")]
    DecoderNotFound(String),

    #[error("Decoding failed: {0}")]
    Decoding(String),

    // Output errors
    #[error("Encoder not found: {0}")]
    EncoderNotFound(String),

    #[error("Encoding failed: {0}")]
    Encoding(String),

    #[error("Muxer error: {0}")]
    Muxer(String),

    // Processing errors
    #[error("Pixel conversion error: {0}")]
    Conversion(String),

    // Hardware acceleration
    #[error("Unknown hardware accelerator: {0} (expected one of: vdpau, dxva2, vda, videotoolbox, qsv, vaapi, cuvid)")]
    UnknownHwAccel(String),

    // FFmpeg errors
    #[error("FFmpeg error: {0}")]
    Ffmpeg(String),

    // General errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Check if this error came from reading the input side
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Error::InputOpen { .. }
                | Error::NoVideoStream(_)
                | Error::DecoderNotFound(_)
                | Error::Decoding(_)
        )
    }

    /// Check if this error came from the output side
    pub fn is_output_error(&self) -> bool {
        matches!(
            self,
            Error::EncoderNotFound(_) | Error::Encoding(_) | Error::Muxer(_)
        )
    }
}

impl From<ffmpeg_next::Error> for Error {
    fn from(e: ffmpeg_next::Error) -> Self {
        Error::Ffmpeg(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_sides() {
        assert!(Error::NoVideoStream("a.mp4".into()).is_input_error());
        assert!(Error::EncoderNotFound("h264_foo".into()).is_output_error());
        assert!(!Error::Config("bad".into()).is_input_error());
        assert!(!Error::Config("bad".into()).is_output_error());
    }

    #[test]
    fn test_unknown_hwaccel_message_lists_names() {
        let msg = Error::UnknownHwAccel("nvdec".into()).to_string();
        assert!(msg.contains("nvdec"));
        assert!(msg.contains("videotoolbox"));
    }
}
