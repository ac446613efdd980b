//! Frame ↔ image pixel copies
//!
//! Decoded frames carry FFmpeg's padded row stride. The image side is a
//! tightly packed BGR24 buffer that can be handed to processing code. Both
//! directions reuse their destination allocation across frames.

use crate::error::{Error, Result};
use crate::types::{Resolution, PIXEL_CHANNELS, PIXEL_FORMAT};

use ffmpeg_next as ffmpeg;

/// Packed 24-bit BGR image
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Image {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Image {
    /// Allocate a black image
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0u8; Resolution::new(width, height).packed_bgr_size()],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row stride in bytes (rows are never padded)
    pub fn stride(&self) -> usize {
        self.width as usize * PIXEL_CHANNELS
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// `[b, g, r]` at (x, y)
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = y as usize * self.stride() + x as usize * PIXEL_CHANNELS;
        Some([self.data[idx], self.data[idx + 1], self.data[idx + 2]])
    }

    /// Resize in place; keeps the allocation when dimensions are unchanged
    fn ensure_size(&mut self, width: u32, height: u32) {
        if self.width == width && self.height == height && !self.data.is_empty() {
            return;
        }

        tracing::debug!("Allocating {}x{} image buffer", width, height);
        self.width = width;
        self.height = height;
        self.data
            .resize(Resolution::new(width, height).packed_bgr_size(), 0);
    }
}

/// Copy a BGR24 frame into the image buffer
pub fn frame_to_image(frame: &ffmpeg::frame::Video, image: &mut Image) -> Result<()> {
    if frame.format() != PIXEL_FORMAT {
        return Err(Error::Conversion(format!(
            "Expected {:?} frame, got {:?}",
            PIXEL_FORMAT,
            frame.format()
        )));
    }

    let (width, height) = (frame.width(), frame.height());
    image.ensure_size(width, height);

    let row_len = image.stride();
    let frame_stride = frame.stride(0);
    let plane = frame.data(0);

    for y in 0..height as usize {
        let src_start = y * frame_stride;
        let dst_start = y * row_len;

        if src_start + row_len > plane.len() {
            return Err(Error::Conversion(format!(
                "Frame plane too small for {}x{}",
                width, height
            )));
        }

        image.data[dst_start..dst_start + row_len]
            .copy_from_slice(&plane[src_start..src_start + row_len]);
    }

    Ok(())
}

/// Copy the image buffer into a BGR24 frame, reallocating the frame only
/// when its format or dimensions do not match
pub fn image_to_frame(image: &Image, frame: &mut ffmpeg::frame::Video) -> Result<()> {
    if frame.format() != PIXEL_FORMAT
        || frame.width() != image.width
        || frame.height() != image.height
    {
        tracing::debug!(
            "Allocating {}x{} output frame",
            image.width,
            image.height
        );
        *frame = ffmpeg::frame::Video::new(PIXEL_FORMAT, image.width, image.height);
    }

    let row_len = image.stride();
    let frame_stride = frame.stride(0);
    let plane = frame.data_mut(0);

    for y in 0..image.height as usize {
        let src_start = y * row_len;
        let dst_start = y * frame_stride;

        if dst_start + row_len > plane.len() {
            return Err(Error::Conversion(format!(
                "Output frame plane too small for {}x{}",
                image.width, image.height
            )));
        }

        plane[dst_start..dst_start + row_len]
            .copy_from_slice(&image.data[src_start..src_start + row_len]);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_frame(width: u32, height: u32) -> ffmpeg::frame::Video {
        let mut frame = ffmpeg::frame::Video::new(PIXEL_FORMAT, width, height);
        let stride = frame.stride(0);
        let plane = frame.data_mut(0);
        for y in 0..height as usize {
            for x in 0..width as usize {
                let idx = y * stride + x * 3;
                plane[idx] = x as u8;
                plane[idx + 1] = y as u8;
                plane[idx + 2] = (x + y) as u8;
            }
        }
        frame
    }

    #[test]
    fn test_frame_to_image_drops_stride_padding() {
        // odd width so FFmpeg pads each row
        let frame = gradient_frame(7, 5);
        let mut image = Image::default();

        frame_to_image(&frame, &mut image).unwrap();

        assert_eq!(image.width(), 7);
        assert_eq!(image.height(), 5);
        assert_eq!(image.data().len(), 7 * 5 * 3);
        assert_eq!(image.pixel(0, 0), Some([0, 0, 0]));
        assert_eq!(image.pixel(6, 4), Some([6, 4, 10]));
        assert_eq!(image.pixel(7, 0), None);
    }

    #[test]
    fn test_copy_back_preserves_pixels() {
        let src = gradient_frame(7, 5);
        let mut image = Image::default();
        let mut out = ffmpeg::frame::Video::empty();

        frame_to_image(&src, &mut image).unwrap();
        image_to_frame(&image, &mut out).unwrap();

        assert_eq!(out.format(), PIXEL_FORMAT);
        assert_eq!((out.width(), out.height()), (7, 5));
        for y in 0..5usize {
            let a = &src.data(0)[y * src.stride(0)..y * src.stride(0) + 21];
            let b = &out.data(0)[y * out.stride(0)..y * out.stride(0) + 21];
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_buffers_are_reused() {
        let mut image = Image::default();
        let mut out = ffmpeg::frame::Video::empty();

        frame_to_image(&gradient_frame(8, 4), &mut image).unwrap();
        image_to_frame(&image, &mut out).unwrap();
        let image_ptr = image.data().as_ptr();
        let frame_ptr = out.data(0).as_ptr();

        frame_to_image(&gradient_frame(8, 4), &mut image).unwrap();
        image_to_frame(&image, &mut out).unwrap();

        assert_eq!(image.data().as_ptr(), image_ptr);
        assert_eq!(out.data(0).as_ptr(), frame_ptr);
    }

    #[test]
    fn test_rejects_non_bgr_frames() {
        let frame = ffmpeg::frame::Video::new(ffmpeg::format::Pixel::YUV420P, 4, 4);
        let mut image = Image::default();
        assert!(matches!(
            frame_to_image(&frame, &mut image),
            Err(Error::Conversion(_))
        ));
    }

    #[test]
    fn test_process_image_is_passthrough() {
        let mut image = Image::new(2, 2);
        image.data_mut()[0] = 42;
        let before = image.clone();
        crate::processing::process_image(&mut image);
        assert_eq!(image, before);
    }
}
