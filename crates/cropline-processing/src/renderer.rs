//! Crop rendering
//!
//! `ImageRenderer` runs decode, trim, resize, filters and encode, in that
//! order. It is synchronous and CPU bound; async callers run it on the
//! blocking pool.

use crate::compression::{EncodeSettings, ImageCompressor};
use crate::error::RenderError;
use crate::image::{apply_filters, apply_plan, plan_resize, trim_transparent};
use bytes::Bytes;
use cropline_core::{CropOption, CropSpec, CroplineConfig};
use image::GenericImageView;
use std::io::Cursor;

/// Produces crop bytes from source bytes. Implementations must be deterministic.
pub trait CropRenderer: Send + Sync {
    fn render(
        &self,
        source: &[u8],
        spec: &CropSpec,
        source_extension: &str,
    ) -> Result<Bytes, RenderError>;
}

/// Values used when the crop spec does not say otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderDefaults {
    pub quality: u8,
    pub interlace: bool,
    pub upscale: bool,
}

impl Default for RenderDefaults {
    fn default() -> Self {
        RenderDefaults {
            quality: 95,
            interlace: true,
            upscale: false,
        }
    }
}

impl From<&CroplineConfig> for RenderDefaults {
    fn from(config: &CroplineConfig) -> Self {
        RenderDefaults {
            quality: config.jpeg_quality,
            interlace: config.interlace,
            upscale: config.upscale,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ImageRenderer {
    defaults: RenderDefaults,
}

impl ImageRenderer {
    pub fn new(defaults: RenderDefaults) -> Self {
        ImageRenderer { defaults }
    }
}

impl CropRenderer for ImageRenderer {
    fn render(
        &self,
        source: &[u8],
        spec: &CropSpec,
        source_extension: &str,
    ) -> Result<Bytes, RenderError> {
        if spec.is_passthrough() {
            return Ok(Bytes::copy_from_slice(source));
        }

        let mode = spec.resize_mode()?;
        let format = spec.output_format(source_extension);
        let settings = EncodeSettings {
            quality: spec.quality().unwrap_or(self.defaults.quality),
            interlace: self.defaults.interlace || spec.has(CropOption::Interlace.name()),
        };
        let upscale = self.defaults.upscale || spec.has(CropOption::Upscale.name());

        let start = std::time::Instant::now();
        let mut img = image::ImageReader::new(Cursor::new(source))
            .with_guessed_format()
            .map_err(|e| RenderError::Decode(e.to_string()))?
            .decode()?;

        if spec.has(CropOption::Trim.name()) {
            img = trim_transparent(img);
        }

        let plan = plan_resize(img.dimensions(), spec.width, spec.height, mode, upscale)?;
        img = apply_plan(img, &plan);
        img = apply_filters(img, spec.filters());

        let data = ImageCompressor::compress(&img, format, settings)?;

        tracing::debug!(
            width = plan.output_size().0,
            height = plan.output_size().1,
            format = ?format,
            quality = settings.quality,
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Rendered crop"
        );

        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cropline_core::{Filter, OutputFormat, Quadrant};
    use image::{ImageFormat, Rgba, RgbaImage};

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, 64, 255])
        });
        let mut buffer = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .unwrap();
        buffer
    }

    fn decoded(data: &[u8]) -> image::DynamicImage {
        image::load_from_memory(data).unwrap()
    }

    #[test]
    fn test_crop_to_exact_box() {
        let source = png(400, 200);
        let spec = CropSpec::new(Some(100), Some(50)).with_option(CropOption::Crop);
        let out = ImageRenderer::default().render(&source, &spec, "png").unwrap();
        assert_eq!(decoded(&out).dimensions(), (100, 50));
        assert_eq!(image::guess_format(&out).unwrap(), ImageFormat::Png);
    }

    #[test]
    fn test_resize_keeps_aspect() {
        let source = png(400, 200);
        let spec = CropSpec::new(Some(100), Some(100)).with_option(CropOption::Resize);
        let out = ImageRenderer::default().render(&source, &spec, "png").unwrap();
        assert_eq!(decoded(&out).dimensions(), (100, 50));
    }

    #[test]
    fn test_original_returns_source_unchanged() {
        let source = png(10, 10);
        let spec = CropSpec::new(Some(5), None).with_option(CropOption::Original);
        let out = ImageRenderer::default().render(&source, &spec, "png").unwrap();
        assert_eq!(out.as_ref(), source.as_slice());

        let out = ImageRenderer::default()
            .render(&source, &CropSpec::default(), "png")
            .unwrap();
        assert_eq!(out.as_ref(), source.as_slice());
    }

    #[test]
    fn test_format_override() {
        let source = png(40, 20);
        let spec = CropSpec::new(Some(20), None)
            .with_option(CropOption::Format(OutputFormat::WebP))
            .with_option(CropOption::Quality(70));
        let out = ImageRenderer::default().render(&source, &spec, "png").unwrap();
        assert_eq!(image::guess_format(&out).unwrap(), ImageFormat::WebP);
    }

    #[test]
    fn test_render_is_deterministic() {
        let source = png(64, 48);
        let spec = CropSpec::new(Some(32), Some(32))
            .with_option(CropOption::Crop)
            .with_option(CropOption::Quadrant(Quadrant::Top))
            .with_option(CropOption::Filters(vec![Filter::Gray]));
        let renderer = ImageRenderer::default();
        assert_eq!(
            renderer.render(&source, &spec, "jpg").unwrap(),
            renderer.render(&source, &spec, "jpg").unwrap()
        );
    }

    #[test]
    fn test_undecodable_source() {
        let spec = CropSpec::new(Some(10), Some(10));
        let err = ImageRenderer::default()
            .render(b"definitely not an image", &spec, "jpg")
            .unwrap_err();
        assert!(matches!(err, RenderError::Decode(_)));
    }

    #[test]
    fn test_conflicting_modes_are_invalid() {
        let spec = CropSpec::new(Some(10), Some(10))
            .with_option(CropOption::Crop)
            .with_option(CropOption::Resize);
        let err = ImageRenderer::default()
            .render(&png(20, 20), &spec, "png")
            .unwrap_err();
        assert!(matches!(err, RenderError::InvalidSpec(_)));
    }
}
