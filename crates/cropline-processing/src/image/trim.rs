use image::{DynamicImage, GenericImageView};

/// Crop away fully transparent rows and columns around the image.
///
/// Opaque images, and images with no visible pixel at all, come back unchanged.
pub fn trim_transparent(img: DynamicImage) -> DynamicImage {
    if !img.color().has_alpha() {
        return img;
    }

    let (width, height) = img.dimensions();
    let rgba = img.to_rgba8();

    let mut min_x = width;
    let mut min_y = height;
    let mut max_x = 0;
    let mut max_y = 0;
    for (x, y, pixel) in rgba.enumerate_pixels() {
        if pixel[3] != 0 {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
    }

    if min_x > max_x || min_y > max_y {
        return img;
    }

    let (trim_w, trim_h) = (max_x - min_x + 1, max_y - min_y + 1);
    if (trim_w, trim_h) == (width, height) {
        return img;
    }

    tracing::debug!(
        from_width = width,
        from_height = height,
        to_width = trim_w,
        to_height = trim_h,
        "Trimming transparent edges"
    );

    img.crop_imm(min_x, min_y, trim_w, trim_h)
}
