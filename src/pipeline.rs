//! Transcoding pipeline
//!
//! grab → image → process → frame → record, one frame at a time on the
//! calling thread.

use crate::capture::Grabber;
use crate::config::TranscodeConfig;
use crate::error::Result;
use crate::output::{Recorder, RecorderSettings};
use crate::processing::{self, Image};
use crate::types::TranscodeStats;

use ffmpeg_next as ffmpeg;
use std::path::PathBuf;
use std::time::Instant;

/// Runs one input file through decode, pixel copy and encode
pub struct Transcoder {
    config: TranscodeConfig,
}

impl Transcoder {
    pub fn new(config: TranscodeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TranscodeConfig {
        &self.config
    }

    /// Where the result will be written
    pub fn output_path(&self) -> PathBuf {
        self.config.output_path()
    }

    /// Transcode the whole input.
    ///
    /// Both files are closed on every path out of this function; on error
    /// the output trailer is still written for whatever was encoded.
    pub fn run(&self) -> Result<TranscodeStats> {
        let output_path = self.output_path();

        let mut grabber = Grabber::open(&self.config)?;

        let settings = RecorderSettings {
            framerate: grabber.framerate(),
            bitrate: grabber.video_bitrate(),
            encoder: self.config.encoder.clone(),
            threads: self.config.threads.clone(),
            fallback_format: Some(grabber.format_name().to_string()),
        };
        let mut recorder = Recorder::new(&output_path, grabber.resolution(), settings)?;

        let mut image = Image::default();
        let mut out_frame = ffmpeg::frame::Video::empty();
        let mut frames: u64 = 0;
        let start = Instant::now();

        while let Some(frame) = grabber.grab()? {
            processing::frame_to_image(frame, &mut image)?;

            processing::process_image(&mut image);

            processing::image_to_frame(&image, &mut out_frame)?;
            recorder.record(&out_frame)?;

            frames += 1;
            if frames % 500 == 0 {
                tracing::debug!("{} frames transcoded", frames);
            }
        }

        let stats = TranscodeStats::new(frames, start.elapsed());

        recorder.stop()?;
        grabber.stop();

        tracing::info!(
            "Transcoded {} frames in {:.3}s ({:.3} fps)",
            stats.frames,
            stats.seconds(),
            stats.fps()
        );

        Ok(stats)
    }
}
