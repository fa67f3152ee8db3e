use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{DynamicImage, RgbImage};

use sightline::landmark::prepare::{encode_base64, encode_jpeg, scale_down};
use sightline::landmark::request::AnnotateRequest;

fn sample_image(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, ((x * y) % 256) as u8])
    }))
}

fn bench_scale_down(c: &mut Criterion) {
    let image = sample_image(1920, 1080);
    c.bench_function("scale_down 1920x1080 to 640", |b| {
        b.iter(|| scale_down(black_box(&image), 640))
    });
}

fn bench_request_encoding(c: &mut Criterion) {
    let image = sample_image(1920, 1080);
    let scaled = scale_down(&image, 640);

    c.bench_function("jpeg + base64 + request document", |b| {
        b.iter(|| {
            let jpeg = encode_jpeg(black_box(&scaled)).unwrap();
            let request = AnnotateRequest::new(encode_base64(&jpeg));
            serde_json::to_string(&request).unwrap()
        })
    });
}

criterion_group!(benches, bench_scale_down, bench_request_encoding);
criterion_main!(benches);
