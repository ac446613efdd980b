//! Input side: demux, decode, convert to BGR24

use crate::config::TranscodeConfig;
use crate::error::{Error, Result};
use crate::processing::FrameScaler;
use crate::types::{Framerate, Resolution, PIXEL_FORMAT};

use super::hw::{self, HwDevice};

use ffmpeg_next as ffmpeg;
use ffmpeg_next::{media, Dictionary};
use std::path::{Path, PathBuf};

/// Decodes the best video stream of a file into BGR24 frames
pub struct Grabber {
    path: PathBuf,
    input: ffmpeg::format::context::Input,
    stream_index: usize,
    decoder: ffmpeg::decoder::Video,
    /// Kept alive for as long as the decoder references it
    hw_device: Option<HwDevice>,
    scaler: FrameScaler,
    decoded: ffmpeg::frame::Video,
    downloaded: ffmpeg::frame::Video,
    converted: ffmpeg::frame::Video,
    framerate: Framerate,
    format_name: String,
    eof_sent: bool,
    frames_grabbed: u64,
}

impl Grabber {
    /// Open the input named by the config and start its video decoder
    pub fn open(config: &TranscodeConfig) -> Result<Self> {
        ffmpeg::init().map_err(|e| Error::Ffmpeg(e.to_string()))?;

        let path = config.input.clone();
        let input = ffmpeg::format::input(&path).map_err(|e| Error::InputOpen {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let (stream_index, framerate, parameters) = {
            let stream = input
                .streams()
                .best(media::Type::Video)
                .ok_or_else(|| Error::NoVideoStream(path.display().to_string()))?;

            let framerate = Framerate::from_rational(stream.avg_frame_rate())
                .or_else(|| Framerate::from_rational(stream.rate()))
                .unwrap_or_else(|| {
                    tracing::warn!("Input has no frame rate, assuming {}", Framerate::FALLBACK);
                    Framerate::FALLBACK
                });

            (stream.index(), framerate, stream.parameters())
        };

        let mut context = ffmpeg::codec::context::Context::from_parameters(parameters)
            .map_err(|e| Error::Decoding(format!("Invalid stream parameters: {}", e)))?;

        let hw_device = config.hwaccel.and_then(HwDevice::try_create);
        if let Some(device) = &hw_device {
            device.attach(&mut context)?;
        }

        let codec = match config.decoder.as_deref() {
            Some(name) => ffmpeg::decoder::find_by_name(name)
                .ok_or_else(|| Error::DecoderNotFound(name.to_string()))?,
            None => {
                let id = context.id();
                ffmpeg::decoder::find(id)
                    .ok_or_else(|| Error::DecoderNotFound(format!("{:?}", id)))?
            }
        };

        let mut opts = Dictionary::new();
        opts.set("threads", &config.threads);

        let decoder = context
            .decoder()
            .open_as_with(codec, opts)
            .and_then(|opened| opened.video())
            .map_err(|e| {
                Error::Decoding(format!("Failed to open decoder {}: {}", codec.name(), e))
            })?;

        let format_name = input.format().name().to_string();
        let scaler = FrameScaler::new(PIXEL_FORMAT, decoder.width(), decoder.height());

        tracing::info!(
            "Input opened: {} ({}, {} {}x{} @ {}, hwaccel: {})",
            path.display(),
            format_name,
            codec.name(),
            decoder.width(),
            decoder.height(),
            framerate,
            hw_device
                .as_ref()
                .map(|d| d.accel().name())
                .unwrap_or("none"),
        );

        Ok(Self {
            path,
            input,
            stream_index,
            decoder,
            hw_device,
            scaler,
            decoded: ffmpeg::frame::Video::empty(),
            downloaded: ffmpeg::frame::Video::empty(),
            converted: ffmpeg::frame::Video::empty(),
            framerate,
            format_name,
            eof_sent: false,
            frames_grabbed: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Decoded picture size
    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.decoder.width(), self.decoder.height())
    }

    pub fn framerate(&self) -> Framerate {
        self.framerate
    }

    /// Video bitrate reported by the decoder (0 if unknown)
    pub fn video_bitrate(&self) -> usize {
        self.decoder.bit_rate()
    }

    /// Container format name(s), e.g. "mov,mp4,m4a,3gp,3g2,mj2"
    pub fn format_name(&self) -> &str {
        &self.format_name
    }

    pub fn is_hw_accelerated(&self) -> bool {
        self.hw_device.is_some()
    }

    pub fn frames_grabbed(&self) -> u64 {
        self.frames_grabbed
    }

    /// Next decoded frame as BGR24, `None` once the stream is drained.
    ///
    /// The returned frame is reused by the following call.
    pub fn grab(&mut self) -> Result<Option<&ffmpeg::frame::Video>> {
        loop {
            if self.receive()? {
                self.frames_grabbed += 1;
                return Ok(Some(&self.converted));
            }

            if self.eof_sent {
                return Ok(None);
            }

            match self.next_packet()? {
                Some(packet) => self
                    .decoder
                    .send_packet(&packet)
                    .map_err(|e| Error::Decoding(format!("Failed to send packet: {}", e)))?,
                None => {
                    self.decoder
                        .send_eof()
                        .map_err(|e| Error::Decoding(format!("Failed to send EOF: {}", e)))?;
                    self.eof_sent = true;
                }
            }
        }
    }

    /// Close the input
    pub fn stop(self) {
        tracing::info!(
            "Input closed: {} ({} frames)",
            self.path.display(),
            self.frames_grabbed
        );
    }

    /// Read packets until one belongs to the video stream
    fn next_packet(&mut self) -> Result<Option<ffmpeg::Packet>> {
        loop {
            let mut packet = ffmpeg::Packet::empty();
            match packet.read(&mut self.input) {
                Ok(()) if packet.stream() == self.stream_index => return Ok(Some(packet)),
                Ok(()) => continue,
                Err(ffmpeg::Error::Eof) => return Ok(None),
                Err(ffmpeg::Error::Other { errno }) if errno == ffmpeg::error::EAGAIN => continue,
                Err(e) => {
                    return Err(Error::Decoding(format!("Failed to read packet: {}", e)));
                }
            }
        }
    }

    /// Pull one frame out of the decoder and convert it; false if none is ready
    fn receive(&mut self) -> Result<bool> {
        match self.decoder.receive_frame(&mut self.decoded) {
            Ok(()) => {}
            Err(ffmpeg::Error::Other { errno }) if errno == ffmpeg::error::EAGAIN => {
                return Ok(false)
            }
            Err(ffmpeg::Error::Eof) => return Ok(false),
            Err(e) => return Err(Error::Decoding(format!("Decode error: {}", e))),
        }

        let source = if hw::is_hw_frame(&self.decoded) {
            hw::transfer_hw_frame(&self.decoded, &mut self.downloaded)?;
            &self.downloaded
        } else {
            &self.decoded
        };

        self.scaler.run(source, &mut self.converted)?;
        self.converted.set_pts(source.timestamp());

        Ok(true)
    }
}
