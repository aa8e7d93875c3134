//! Rendering driven by decoded crop paths.

use cropline_core::{PathCodec, SourceRef};
use cropline_processing::{CropRenderer, ImageRenderer, RenderDefaults};
use image::{DynamicImage, GenericImageView, ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

fn encode_png(img: RgbaImage) -> Vec<u8> {
    let mut buffer = Vec::new();
    DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .unwrap();
    buffer
}

fn gradient(width: u32, height: u32) -> Vec<u8> {
    encode_png(RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x * 7 % 256) as u8, (y * 13 % 256) as u8, 64, 255])
    }))
}

fn render(path: &str, source: &[u8]) -> DynamicImage {
    let bytes = render_bytes(path, source);
    image::load_from_memory(&bytes).unwrap()
}

fn render_bytes(path: &str, source: &[u8]) -> Vec<u8> {
    let (src, spec): (SourceRef, _) = PathCodec::default().decode(path).unwrap();
    ImageRenderer::new(RenderDefaults::default())
        .render(source, &spec, src.extension())
        .unwrap()
        .to_vec()
}

#[test]
fn test_pad_letterboxes_with_colour() {
    let img = render("photos/a-100x100-pad(255,0,0).png", &gradient(200, 100));

    assert_eq!(img.dimensions(), (100, 100));
    let corner = img.get_pixel(0, 0);
    assert_eq!(&corner.0[..3], &[255, 0, 0]);
    let centre = img.get_pixel(50, 50);
    assert_ne!(&centre.0[..3], &[255, 0, 0]);
}

#[test]
fn test_single_dimension_with_negative_filter() {
    let img = render("photos/a-50x-resize-filters(negative).png", &gradient(200, 100));

    assert_eq!(img.dimensions(), (50, 25));
    let blue = img.get_pixel(10, 10).0[2];
    assert!((189..=193).contains(&blue), "blue channel {}", blue);
}

#[test]
fn test_trim_drops_transparent_border_before_cropping() {
    let source = encode_png(RgbaImage::from_fn(100, 100, |x, y| {
        if (25..75).contains(&x) && (25..75).contains(&y) {
            Rgba([10, 200, 10, 255])
        } else {
            Rgba([0, 0, 0, 0])
        }
    }));

    let img = render("photos/a-40x40-trim.png", &source);

    assert_eq!(img.dimensions(), (40, 40));
    assert_eq!(img.get_pixel(0, 0).0[3], 255);
    assert_eq!(img.get_pixel(39, 39).0[3], 255);
}

#[test]
fn test_quality_option_changes_jpeg_size() {
    let source = gradient(300, 150);

    let low = render_bytes("photos/a-150x75-quality(10).jpg", &source);
    let high = render_bytes("photos/a-150x75-quality(95).jpg", &source);

    assert_eq!(image::guess_format(&low).unwrap(), ImageFormat::Jpeg);
    assert!(low.len() < high.len());
}

#[test]
fn test_same_path_renders_identical_bytes() {
    let source = gradient(120, 80);
    for path in [
        "photos/a-60x60.jpg",
        "photos/a-60x-format(webp).jpg",
        "photos/a-30x30-crop-quadrant(T).png",
    ] {
        assert_eq!(render_bytes(path, &source), render_bytes(path, &source), "{}", path);
    }
}
