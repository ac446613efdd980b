//! Output side: convert BGR24, encode, mux
//!
//! Writes a single video stream into any container FFmpeg can guess from the
//! output path.

use crate::error::{Error, Result};
use crate::processing::FrameScaler;
use crate::types::{Framerate, Resolution, PIXEL_FORMAT};

use ffmpeg_next as ffmpeg;
use ffmpeg_next::format::Pixel;
use ffmpeg_next::{ffi, media, Dictionary};
use std::path::{Path, PathBuf};

/// Encoder and muxer settings for a [`Recorder`]
#[derive(Debug, Clone)]
pub struct RecorderSettings {
    /// Output frame rate
    pub framerate: Framerate,
    /// Target video bitrate in bits/sec (0 = encoder default)
    pub bitrate: usize,
    /// Encoder name (None = container default)
    pub encoder: Option<String>,
    /// FFmpeg "threads" option
    pub threads: String,
    /// Container format to use when none can be guessed from the path
    pub fallback_format: Option<String>,
}

impl Default for RecorderSettings {
    fn default() -> Self {
        Self {
            framerate: Framerate::default(),
            bitrate: 0,
            encoder: None,
            threads: crate::config::DEFAULT_THREADS.to_string(),
            fallback_format: None,
        }
    }
}

/// Encodes BGR24 frames into a media file
pub struct Recorder {
    path: PathBuf,
    output: ffmpeg::format::context::Output,
    encoder: ffmpeg::encoder::Video,
    stream_index: usize,
    encoder_time_base: ffmpeg::Rational,
    stream_time_base: ffmpeg::Rational,
    scaler: FrameScaler,
    frame_index: i64,
    packets_written: u64,
    bytes_written: u64,
    finished: bool,
}

impl Recorder {
    /// Create the output file, open the encoder and write the header
    pub fn new(path: impl AsRef<Path>, resolution: Resolution, settings: RecorderSettings) -> Result<Self> {
        ffmpeg::init().map_err(|e| Error::Ffmpeg(e.to_string()))?;

        let path = path.as_ref().to_path_buf();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut output = open_output(&path, settings.fallback_format.as_deref())?;
        let global_header = output
            .format()
            .flags()
            .contains(ffmpeg::format::Flags::GLOBAL_HEADER);

        let codec = match settings.encoder.as_deref() {
            Some(name) => ffmpeg::encoder::find_by_name(name)
                .ok_or_else(|| Error::EncoderNotFound(name.to_string()))?,
            None => {
                let id = output.format().codec(&path, media::Type::Video);
                ffmpeg::encoder::find(id)
                    .ok_or_else(|| Error::EncoderNotFound(format!("{:?}", id)))?
            }
        };

        let supported = codec
            .video()
            .map_err(|_| Error::EncoderNotFound(format!("{} is not a video encoder", codec.name())))?
            .formats()
            .map(|formats| formats.collect::<Vec<_>>())
            .unwrap_or_default();
        let pixel = choose_pixel_format(&supported, settings.encoder.is_some());

        let encoder_time_base = settings.framerate.time_base();

        let mut stream = output
            .add_stream(codec)
            .map_err(|e| Error::Muxer(format!("Failed to add stream: {}", e)))?;
        let stream_index = stream.index();

        let mut encoder = ffmpeg::codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()
            .map_err(|e| Error::Encoding(e.to_string()))?;

        encoder.set_width(resolution.width);
        encoder.set_height(resolution.height);
        encoder.set_format(pixel);
        encoder.set_time_base(encoder_time_base);
        encoder.set_frame_rate(Some(settings.framerate.to_rational()));
        if settings.bitrate > 0 {
            encoder.set_bit_rate(settings.bitrate);
        }
        if global_header {
            encoder.set_flags(ffmpeg::codec::Flags::GLOBAL_HEADER);
        }

        let mut opts = Dictionary::new();
        opts.set("threads", &settings.threads);

        let encoder = encoder.open_with(opts).map_err(|e| {
            Error::Encoding(format!("Failed to open encoder {}: {}", codec.name(), e))
        })?;

        stream.set_parameters(&encoder);
        stream.set_time_base(encoder_time_base);
        stream.set_rate(settings.framerate.to_rational());

        output
            .write_header()
            .map_err(|e| Error::Muxer(format!("Failed to write header: {}", e)))?;

        // The muxer may replace the time base while writing the header
        let stream_time_base = output
            .stream(stream_index)
            .map(|s| s.time_base())
            .ok_or_else(|| Error::Muxer("Stream not found".into()))?;

        tracing::info!(
            "Output opened: {} ({}, {} {:?} {}x{} @ {})",
            path.display(),
            output.format().name(),
            codec.name(),
            pixel,
            resolution.width,
            resolution.height,
            settings.framerate,
        );

        Ok(Self {
            path,
            output,
            encoder,
            stream_index,
            encoder_time_base,
            stream_time_base,
            scaler: FrameScaler::new(pixel, resolution.width, resolution.height),
            frame_index: 0,
            packets_written: 0,
            bytes_written: 0,
            finished: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Pixel format the encoder was opened with
    pub fn pixel_format(&self) -> Pixel {
        self.scaler.dst_format()
    }

    /// Frames handed to the encoder so far
    pub fn frames_recorded(&self) -> u64 {
        self.frame_index as u64
    }

    /// Encoded payload bytes handed to the muxer
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Encode one BGR24 frame
    pub fn record(&mut self, frame: &ffmpeg::frame::Video) -> Result<()> {
        if self.finished {
            return Err(Error::Encoding("Recorder already stopped".into()));
        }
        if frame.format() != PIXEL_FORMAT {
            return Err(Error::Encoding(format!(
                "Expected {:?} frame, got {:?}",
                PIXEL_FORMAT,
                frame.format()
            )));
        }

        // The encoder may keep a reference to what it is sent, so every frame
        // gets its own buffer
        let mut converted = ffmpeg::frame::Video::empty();
        self.scaler.run(frame, &mut converted)?;
        converted.set_pts(Some(self.frame_index));
        self.frame_index += 1;

        self.encoder
            .send_frame(&converted)
            .map_err(|e| Error::Encoding(format!("Failed to send frame: {}", e)))?;

        self.write_packets()
    }

    /// Flush the encoder and write the trailer
    pub fn stop(mut self) -> Result<()> {
        self.finish()
    }

    fn finish(&mut self) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;

        self.encoder
            .send_eof()
            .map_err(|e| Error::Encoding(format!("Failed to send EOF: {}", e)))?;
        self.write_packets()?;

        self.output
            .write_trailer()
            .map_err(|e| Error::Muxer(format!("Failed to write trailer: {}", e)))?;

        tracing::info!(
            "Output finished: {} ({} frames, {} packets, {:.2} MB)",
            self.path.display(),
            self.frame_index,
            self.packets_written,
            self.bytes_written as f64 / 1_000_000.0
        );

        Ok(())
    }

    /// Move every ready packet from the encoder into the muxer
    fn write_packets(&mut self) -> Result<()> {
        let mut packet = ffmpeg::Packet::empty();
        loop {
            match self.encoder.receive_packet(&mut packet) {
                Ok(()) => {}
                Err(ffmpeg::Error::Other { errno }) if errno == ffmpeg::error::EAGAIN => break,
                Err(ffmpeg::Error::Eof) => break,
                Err(e) => {
                    return Err(Error::Encoding(format!("Failed to receive packet: {}", e)));
                }
            }

            self.bytes_written += packet.size() as u64;
            packet.set_stream(self.stream_index);
            packet.rescale_ts(self.encoder_time_base, self.stream_time_base);
            packet
                .write_interleaved(&mut self.output)
                .map_err(|e| Error::Muxer(format!("Failed to write packet: {}", e)))?;
            self.packets_written += 1;
        }

        Ok(())
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        // Finalize the file if stop() was never reached
        if !self.finished {
            if let Err(e) = self.finish() {
                tracing::warn!("Failed to finalize {}: {}", self.path.display(), e);
            }
        }
    }
}

/// Open a muxer by guessing from the path, then by the fallback name
fn open_output(path: &Path, fallback_format: Option<&str>) -> Result<ffmpeg::format::context::Output> {
    match ffmpeg::format::output(&path) {
        Ok(output) => Ok(output),
        Err(guess_err) => {
            let Some(name) = fallback_format.and_then(first_format_name) else {
                return Err(Error::Muxer(format!(
                    "Cannot guess container for {}: {}",
                    path.display(),
                    guess_err
                )));
            };

            tracing::debug!(
                "No container guessed for {}, using {}",
                path.display(),
                name
            );
            ffmpeg::format::output_as(&path, name)
                .map_err(|e| Error::Muxer(format!("Failed to create {} output: {}", name, e)))
        }
    }
}

/// Demuxers report comma-separated aliases ("mov,mp4,m4a,...")
fn first_format_name(names: &str) -> Option<&str> {
    names.split(',').map(str::trim).find(|n| !n.is_empty())
}

/// Pick the encoder pixel format.
///
/// A user-selected encoder gets the format FFmpeg rates closest to BGR24.
/// The container default encoder gets YUV420P when it takes it, else its
/// first listed format.
pub fn choose_pixel_format(supported: &[Pixel], encoder_selected: bool) -> Pixel {
    if supported.is_empty() {
        return Pixel::YUV420P;
    }

    if encoder_selected {
        return best_pixel_format_of(supported, PIXEL_FORMAT);
    }

    if supported.contains(&Pixel::YUV420P) {
        Pixel::YUV420P
    } else {
        supported[0]
    }
}

/// `avcodec_find_best_pix_fmt_of_list` over a slice
fn best_pixel_format_of(supported: &[Pixel], source: Pixel) -> Pixel {
    let mut list: Vec<ffi::AVPixelFormat> = supported.iter().map(|&p| p.into()).collect();
    list.push(ffi::AVPixelFormat::AV_PIX_FMT_NONE);

    // SAFETY: list is terminated by AV_PIX_FMT_NONE and outlives the call.
    let best = unsafe {
        ffi::avcodec_find_best_pix_fmt_of_list(list.as_ptr(), source.into(), 0, std::ptr::null_mut())
    };

    match Pixel::from(best) {
        Pixel::None => supported[0],
        pixel => pixel,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selected_encoder_prefers_bgr() {
        let supported = [Pixel::YUV420P, Pixel::NV12, Pixel::BGR24];
        assert_eq!(choose_pixel_format(&supported, true), Pixel::BGR24);
    }

    #[test]
    fn test_selected_encoder_single_format() {
        assert_eq!(choose_pixel_format(&[Pixel::YUV420P], true), Pixel::YUV420P);
    }

    #[test]
    fn test_default_encoder_prefers_yuv420p() {
        let supported = [Pixel::NV12, Pixel::YUV420P, Pixel::BGR24];
        assert_eq!(choose_pixel_format(&supported, false), Pixel::YUV420P);
        assert_eq!(
            choose_pixel_format(&[Pixel::RGB24, Pixel::BGR24], false),
            Pixel::RGB24
        );
        assert_eq!(choose_pixel_format(&[], false), Pixel::YUV420P);
    }

    #[test]
    fn test_first_format_name() {
        assert_eq!(first_format_name("mov,mp4,m4a,3gp,3g2,mj2"), Some("mov"));
        assert_eq!(first_format_name("matroska,webm"), Some("matroska"));
        assert_eq!(first_format_name(""), None);
    }

    #[test]
    fn test_unknown_encoder() {
        let dir = tempfile::tempdir().unwrap();
        let settings = RecorderSettings {
            encoder: Some("no_such_encoder".into()),
            ..Default::default()
        };

        let result = Recorder::new(dir.path().join("out.mkv"), Resolution::new(64, 48), settings);
        assert!(matches!(result, Err(Error::EncoderNotFound(_))));
    }

    #[test]
    fn test_unguessable_container() {
        let dir = tempfile::tempdir().unwrap();
        let result = Recorder::new(
            dir.path().join("out.nosuchext"),
            Resolution::new(64, 48),
            RecorderSettings::default(),
        );
        assert!(matches!(result, Err(Error::Muxer(_))));
    }
}
