use cropline_core::Filter;
use image::DynamicImage;

const BLUR_SIGMA: f32 = 2.0;

/// Apply filters in the order they were requested.
pub fn apply_filters(mut img: DynamicImage, filters: &[Filter]) -> DynamicImage {
    for filter in filters {
        tracing::debug!(filter = ?filter, "Applying filter");
        img = match filter {
            Filter::Gray => img.grayscale(),
            Filter::Negative => {
                img.invert();
                img
            }
            Filter::Blur => img.blur(BLUR_SIGMA),
        };
    }
    img
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_negative_then_gray() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 2, Rgb([255, 0, 0])));

        let negative = apply_filters(img.clone(), &[Filter::Negative]).to_rgb8();
        assert_eq!(negative.get_pixel(0, 0), &Rgb([0, 255, 255]));

        let gray = apply_filters(img, &[Filter::Gray]).to_rgb8();
        let pixel = gray.get_pixel(0, 0);
        assert_eq!(pixel[0], pixel[1]);
        assert_eq!(pixel[1], pixel[2]);
    }

    #[test]
    fn test_no_filters_is_identity() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(3, 1, Rgb([7, 8, 9])));
        assert_eq!(apply_filters(img.clone(), &[]), img);
    }
}
