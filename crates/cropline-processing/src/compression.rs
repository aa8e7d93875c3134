use crate::error::RenderError;
use bytes::Bytes;
use cropline_core::OutputFormat;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GenericImageView, ImageFormat};
use std::io::Cursor;

/// How a rendered image is written out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeSettings {
    /// 0-100, used by JPEG and WebP
    pub quality: u8,
    /// Progressive JPEG; other formats ignore it
    pub interlace: bool,
}

impl Default for EncodeSettings {
    fn default() -> Self {
        EncodeSettings {
            quality: 95,
            interlace: true,
        }
    }
}

/// Main compression service
pub struct ImageCompressor;

impl ImageCompressor {
    /// Encode an image in the given format.
    pub fn compress(
        img: &DynamicImage,
        format: OutputFormat,
        settings: EncodeSettings,
    ) -> Result<Bytes, RenderError> {
        let quality = settings.quality.min(100);
        match format {
            OutputFormat::Jpeg if settings.interlace => Self::compress_progressive_jpeg(img, quality),
            OutputFormat::Jpeg => Self::compress_baseline_jpeg(img, quality),
            OutputFormat::WebP => Self::compress_webp(img, quality),
            OutputFormat::Png => Self::write_with(img, ImageFormat::Png),
            OutputFormat::Gif => {
                Self::write_with(&DynamicImage::ImageRgba8(img.to_rgba8()), ImageFormat::Gif)
            }
        }
    }

    /// Progressive JPEG using mozjpeg
    fn compress_progressive_jpeg(img: &DynamicImage, quality: u8) -> Result<Bytes, RenderError> {
        let rgb_img = img.to_rgb8();
        let (width, height) = rgb_img.dimensions();

        let encode_error = |e: std::io::Error| RenderError::Encode(e.to_string());

        let mut comp = mozjpeg::Compress::new(mozjpeg::ColorSpace::JCS_RGB);
        comp.set_size(width as usize, height as usize);
        comp.set_quality(quality as f32);
        comp.set_progressive_mode();
        comp.set_optimize_coding(true);

        let mut comp = comp.start_compress(Vec::new()).map_err(encode_error)?;
        comp.write_scanlines(&rgb_img).map_err(encode_error)?;
        let encoded = comp.finish().map_err(encode_error)?;

        Ok(Bytes::from(encoded))
    }

    /// Baseline (sequential) JPEG
    fn compress_baseline_jpeg(img: &DynamicImage, quality: u8) -> Result<Bytes, RenderError> {
        let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
        let mut buffer = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut buffer, quality.max(1));
        rgb.write_with_encoder(encoder)
            .map_err(|e| RenderError::Encode(e.to_string()))?;
        Ok(Bytes::from(buffer))
    }

    fn compress_webp(img: &DynamicImage, quality: u8) -> Result<Bytes, RenderError> {
        let (width, height) = img.dimensions();
        let rgba_img = img.to_rgba8();

        let encoder = webp::Encoder::from_rgba(&rgba_img, width, height);
        let webp_data = encoder.encode(quality as f32);

        Ok(Bytes::copy_from_slice(&webp_data))
    }

    fn write_with(img: &DynamicImage, format: ImageFormat) -> Result<Bytes, RenderError> {
        let mut buffer = Vec::new();
        let mut cursor = Cursor::new(&mut buffer);

        img.write_to(&mut cursor, format)
            .map_err(|e| RenderError::Encode(e.to_string()))?;

        Ok(Bytes::from(buffer))
    }
}
