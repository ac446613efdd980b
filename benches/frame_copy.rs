use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ghostcode::processing::{frame_to_image, image_to_frame, Image};
use ghostcode::PIXEL_FORMAT;

fn bench_frame_copy(c: &mut Criterion) {
    let frame = ffmpeg_next::frame::Video::new(PIXEL_FORMAT, 1920, 1080);
    let mut image = Image::default();
    let mut out = ffmpeg_next::frame::Video::empty();

    c.bench_function("frame_image_roundtrip_1080p", |b| {
        b.iter(|| {
            frame_to_image(black_box(&frame), &mut image).unwrap();
            image_to_frame(black_box(&image), &mut out).unwrap();
        })
    });
}

criterion_group!(benches, bench_frame_copy);
criterion_main!(benches);
