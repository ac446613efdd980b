//! End-to-end transcode through FFmpeg's built-in mpeg4 encoder

use ghostcode::{
    Grabber, Recorder, RecorderSettings, Resolution, TranscodeConfig, Transcoder, PIXEL_FORMAT,
};
use ffmpeg_next::format::Pixel;
use std::path::Path;

const FRAMES: u64 = 24;
const SIZE: Resolution = Resolution::new(64, 48);

fn has_encoder(name: &str) -> bool {
    ffmpeg_next::init().is_ok() && ffmpeg_next::encoder::find_by_name(name).is_some()
}

fn has_mpeg4() -> bool {
    has_encoder("mpeg4")
}

/// Distinct solid colour for frame `i`, in BGR order
fn solid_colour(i: usize) -> [u8; 3] {
    [(i * 10) as u8, (250 - i * 10) as u8, (40 + i * 7) as u8]
}

fn fill(frame: &mut ffmpeg_next::frame::Video, bgr: [u8; 3]) {
    let stride = frame.stride(0);
    let (width, height) = (frame.width() as usize, frame.height() as usize);
    let plane = frame.data_mut(0);
    for y in 0..height {
        for x in 0..width {
            let idx = y * stride + x * 3;
            plane[idx..idx + 3].copy_from_slice(&bgr);
        }
    }
}

/// Write a short moving-gradient clip
fn write_clip(path: &Path) {
    let settings = RecorderSettings {
        encoder: Some("mpeg4".into()),
        ..Default::default()
    };
    let mut recorder = Recorder::new(path, SIZE, settings).unwrap();

    let mut frame = ffmpeg_next::frame::Video::new(PIXEL_FORMAT, SIZE.width, SIZE.height);
    for i in 0..FRAMES as usize {
        let stride = frame.stride(0);
        let plane = frame.data_mut(0);
        for y in 0..SIZE.height as usize {
            for x in 0..SIZE.width as usize {
                let idx = y * stride + x * 3;
                plane[idx] = (x * 4) as u8;
                plane[idx + 1] = (y * 5) as u8;
                plane[idx + 2] = (i * 10) as u8;
            }
        }
        recorder.record(&frame).unwrap();
    }

    assert_eq!(recorder.frames_recorded(), FRAMES);
    assert!(recorder.bytes_written() > 0);
    recorder.stop().unwrap();
}

fn count_frames(path: &Path) -> u64 {
    let mut grabber = Grabber::open(&TranscodeConfig::new(path)).unwrap();
    let mut frames = 0;
    while let Some(frame) = grabber.grab().unwrap() {
        assert_eq!(frame.format(), PIXEL_FORMAT);
        frames += 1;
    }
    assert_eq!(grabber.frames_grabbed(), frames);
    frames
}

#[test]
fn test_transcode_counts_every_frame() {
    if !has_mpeg4() {
        println!("mpeg4 encoder not available, skipping test");
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("clip.mkv");
    let output = dir.path().join("converted.mkv");
    write_clip(&input);

    let config = TranscodeConfig::new(&input)
        .with_output(&output)
        .with_encoder("mpeg4");
    let stats = Transcoder::new(config).run().unwrap();

    assert_eq!(stats.frames, FRAMES);
    assert!(stats.summary().starts_with("Done. Processing time: "));
    assert_eq!(count_frames(&output), FRAMES);
}

#[test]
fn test_transcode_default_output_path() {
    if !has_mpeg4() {
        println!("mpeg4 encoder not available, skipping test");
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("clip.mkv");
    write_clip(&input);

    let config = TranscodeConfig::new(&input).with_encoder("mpeg4");
    let transcoder = Transcoder::new(config);
    let expected = dir.path().join("clip_out.mkv");
    assert_eq!(transcoder.output_path(), expected);

    transcoder.run().unwrap();
    assert!(expected.exists());
}

#[test]
fn test_grabber_reports_input_properties() {
    if !has_mpeg4() {
        println!("mpeg4 encoder not available, skipping test");
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("clip.mkv");
    write_clip(&input);

    let grabber = Grabber::open(&TranscodeConfig::new(&input)).unwrap();
    assert_eq!(grabber.resolution(), SIZE);
    assert!(grabber.format_name().contains("matroska"));
    assert!(!grabber.is_hw_accelerated());
    assert!(grabber.framerate().as_f64() > 0.0);
}

#[test]
fn test_unknown_decoder_is_reported() {
    if !has_mpeg4() {
        println!("mpeg4 encoder not available, skipping test");
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("clip.mkv");
    write_clip(&input);

    let config = TranscodeConfig::new(&input).with_decoder("no_such_decoder");
    let err = Transcoder::new(config).run().err().unwrap();
    assert!(matches!(err, ghostcode::Error::DecoderNotFound(_)));
}

#[test]
fn test_default_encoder_transcode() {
    if !has_mpeg4() {
        println!("mpeg4 encoder not available, skipping test");
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("clip.mkv");
    let output = dir.path().join("converted.avi");
    write_clip(&input);

    // avi defaults to mpeg4
    let stats = Transcoder::new(TranscodeConfig::new(&input).with_output(&output))
        .run()
        .unwrap();

    assert_eq!(stats.frames, FRAMES);
    assert_eq!(count_frames(&output), FRAMES);
}

#[test]
fn test_default_encoder_uses_yuv420p() {
    if !has_mpeg4() {
        println!("mpeg4 encoder not available, skipping test");
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let recorder = Recorder::new(dir.path().join("out.avi"), SIZE, RecorderSettings::default()).unwrap();
    assert_eq!(recorder.pixel_format(), Pixel::YUV420P);
    recorder.stop().unwrap();
}

#[test]
fn test_unknown_extension_falls_back_to_input_container() {
    if !has_mpeg4() {
        println!("mpeg4 encoder not available, skipping test");
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("clip.mkv");
    let output = dir.path().join("converted.nosuchext");
    write_clip(&input);

    let config = TranscodeConfig::new(&input)
        .with_output(&output)
        .with_encoder("mpeg4");
    let stats = Transcoder::new(config).run().unwrap();
    assert_eq!(stats.frames, FRAMES);

    let grabber = Grabber::open(&TranscodeConfig::new(&output)).unwrap();
    assert!(grabber.format_name().contains("matroska"));
    grabber.stop();
    assert_eq!(count_frames(&output), FRAMES);
}

#[test]
fn test_frame_threaded_encoder_keeps_each_frame() {
    if !has_encoder("huffyuv") {
        println!("huffyuv encoder not available, skipping test");
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("solid.avi");
    let settings = RecorderSettings {
        encoder: Some("huffyuv".into()),
        ..Default::default()
    };

    let mut recorder = Recorder::new(&path, SIZE, settings).unwrap();
    assert_ne!(recorder.pixel_format(), Pixel::YUV422P);

    let mut frame = ffmpeg_next::frame::Video::new(PIXEL_FORMAT, SIZE.width, SIZE.height);
    for i in 0..FRAMES as usize {
        fill(&mut frame, solid_colour(i));
        recorder.record(&frame).unwrap();
    }
    recorder.stop().unwrap();

    let mut grabber = Grabber::open(&TranscodeConfig::new(&path)).unwrap();
    let mut index = 0;
    while let Some(decoded) = grabber.grab().unwrap() {
        let stride = decoded.stride(0);
        let idx = (SIZE.height as usize / 2) * stride + (SIZE.width as usize / 2) * 3;
        assert_eq!(
            &decoded.data(0)[idx..idx + 3],
            &solid_colour(index),
            "frame {} was overwritten",
            index
        );
        index += 1;
    }
    assert_eq!(index as u64, FRAMES);
}
