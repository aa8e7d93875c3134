//! Resize planning
//!
//! The plan is computed from dimensions alone so it can be tested without
//! touching pixels; `apply_plan` then executes it on a decoded image.

use crate::error::RenderError;
use cropline_core::{Quadrant, ResizeMode};
use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};

/// Upper bound on output pixels, whatever the requested box.
const MAX_OUTPUT_PIXELS: u64 = 100_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizePlan {
    /// Size the source is scaled to
    pub scaled: (u32, u32),
    /// Region of the scaled image that is kept: (x, y, width, height)
    pub crop: Option<(u32, u32, u32, u32)>,
    /// Canvas the scaled image is centred on: (width, height, rgb)
    pub canvas: Option<(u32, u32, [u8; 3])>,
}

impl ResizePlan {
    pub fn identity(source: (u32, u32)) -> Self {
        ResizePlan {
            scaled: source,
            crop: None,
            canvas: None,
        }
    }

    /// Dimensions of the image the plan produces.
    pub fn output_size(&self) -> (u32, u32) {
        if let Some((w, h, _)) = self.canvas {
            return (w, h);
        }
        match self.crop {
            Some((_, _, w, h)) => (w, h),
            None => self.scaled,
        }
    }
}

fn scaled_dim(value: u32, scale: f64) -> u32 {
    ((value as f64) * scale).round().max(1.0) as u32
}

fn check_size(width: u32, height: u32) -> Result<(), RenderError> {
    if (width as u64) * (height as u64) > MAX_OUTPUT_PIXELS {
        return Err(RenderError::InvalidSpec(format!(
            "output of {}x{} exceeds the pixel limit",
            width, height
        )));
    }
    Ok(())
}

fn gravity_offset(quadrant: Quadrant, scaled: (u32, u32), kept: (u32, u32)) -> (u32, u32) {
    let dx = scaled.0 - kept.0;
    let dy = scaled.1 - kept.1;
    match quadrant {
        Quadrant::Top => (dx / 2, 0),
        Quadrant::Bottom => (dx / 2, dy),
        Quadrant::Left => (0, dy / 2),
        Quadrant::Right => (dx, dy / 2),
        Quadrant::Center => (dx / 2, dy / 2),
    }
}

/// Work out how a `source`-sized image becomes the requested box.
///
/// A missing side follows the aspect ratio. `Fill` and `Pad` need both sides
/// and fall back to `Fit` otherwise. Unless `upscale` is set the source is
/// never enlarged: a `Fill` larger than the source keeps what it has, a `Pad`
/// still produces the full canvas.
pub fn plan_resize(
    source: (u32, u32),
    width: Option<u32>,
    height: Option<u32>,
    mode: ResizeMode,
    upscale: bool,
) -> Result<ResizePlan, RenderError> {
    let (sw, sh) = source;
    if sw == 0 || sh == 0 {
        return Err(RenderError::Decode("source image has no pixels".to_string()));
    }

    let fit_scale = match (width, height) {
        (None, None) => return Ok(ResizePlan::identity(source)),
        (Some(w), None) => w as f64 / sw as f64,
        (None, Some(h)) => h as f64 / sh as f64,
        (Some(w), Some(h)) => (w as f64 / sw as f64).min(h as f64 / sh as f64),
    };
    let clamp = |scale: f64| if upscale { scale } else { scale.min(1.0) };

    let plan = match (mode, width, height) {
        (ResizeMode::Fill(quadrant), Some(w), Some(h)) => {
            let scale = clamp((w as f64 / sw as f64).max(h as f64 / sh as f64));
            let scaled = (scaled_dim(sw, scale), scaled_dim(sh, scale));
            let kept = (w.min(scaled.0), h.min(scaled.1));
            let crop = (kept != scaled).then(|| {
                let (x, y) = gravity_offset(quadrant, scaled, kept);
                (x, y, kept.0, kept.1)
            });
            ResizePlan {
                scaled,
                crop,
                canvas: None,
            }
        }
        (ResizeMode::Pad(rgb), Some(w), Some(h)) => {
            let scale = clamp(fit_scale);
            let scaled = (
                scaled_dim(sw, scale).min(w.max(1)),
                scaled_dim(sh, scale).min(h.max(1)),
            );
            ResizePlan {
                scaled,
                crop: None,
                canvas: Some((w, h, rgb)),
            }
        }
        _ => {
            let scale = clamp(fit_scale);
            ResizePlan::identity((scaled_dim(sw, scale), scaled_dim(sh, scale)))
        }
    };

    check_size(plan.scaled.0, plan.scaled.1)?;
    let (ow, oh) = plan.output_size();
    check_size(ow, oh)?;
    Ok(plan)
}

/// Execute a plan on a decoded image.
pub fn apply_plan(img: DynamicImage, plan: &ResizePlan) -> DynamicImage {
    let mut img = if img.dimensions() == plan.scaled {
        img
    } else {
        img.resize_exact(plan.scaled.0, plan.scaled.1, FilterType::Lanczos3)
    };

    if let Some((x, y, w, h)) = plan.crop {
        img = img.crop_imm(x, y, w, h);
    }

    if let Some((w, h, [r, g, b])) = plan.canvas {
        let mut canvas = RgbaImage::from_pixel(w, h, Rgba([r, g, b, 255]));
        let x = (w - plan.scaled.0) / 2;
        let y = (h - plan.scaled.1) / 2;
        imageops::overlay(&mut canvas, &img.to_rgba8(), x as i64, y as i64);
        img = DynamicImage::ImageRgba8(canvas);
    }

    img
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_keeps_aspect_ratio() {
        let plan = plan_resize((400, 200), Some(100), Some(100), ResizeMode::Fit, false).unwrap();
        assert_eq!(plan.output_size(), (100, 50));
        assert_eq!(plan.crop, None);
    }

    #[test]
    fn test_single_dimension_follows_aspect_ratio() {
        let plan = plan_resize((400, 200), Some(100), None, ResizeMode::Fit, false).unwrap();
        assert_eq!(plan.output_size(), (100, 50));

        let plan = plan_resize((400, 200), None, Some(20), ResizeMode::Fit, false).unwrap();
        assert_eq!(plan.output_size(), (40, 20));

        // Fill without both sides degrades to fit
        let plan = plan_resize(
            (400, 200),
            Some(100),
            None,
            ResizeMode::Fill(Quadrant::Center),
            false,
        )
        .unwrap();
        assert_eq!(plan.output_size(), (100, 50));
    }

    #[test]
    fn test_fill_crops_excess_at_gravity() {
        let plan = plan_resize(
            (400, 200),
            Some(100),
            Some(100),
            ResizeMode::Fill(Quadrant::Center),
            false,
        )
        .unwrap();
        assert_eq!(plan.scaled, (200, 100));
        assert_eq!(plan.crop, Some((50, 0, 100, 100)));

        let left = plan_resize(
            (400, 200),
            Some(100),
            Some(100),
            ResizeMode::Fill(Quadrant::Left),
            false,
        )
        .unwrap();
        assert_eq!(left.crop, Some((0, 0, 100, 100)));

        let right = plan_resize(
            (400, 200),
            Some(100),
            Some(100),
            ResizeMode::Fill(Quadrant::Right),
            false,
        )
        .unwrap();
        assert_eq!(right.crop, Some((100, 0, 100, 100)));
    }

    #[test]
    fn test_no_upscale_by_default() {
        let plan = plan_resize((50, 40), Some(100), Some(80), ResizeMode::Fit, false).unwrap();
        assert_eq!(plan.output_size(), (50, 40));

        let plan = plan_resize((50, 40), Some(100), Some(80), ResizeMode::Fit, true).unwrap();
        assert_eq!(plan.output_size(), (100, 80));

        let fill = plan_resize(
            (50, 40),
            Some(100),
            Some(20),
            ResizeMode::Fill(Quadrant::Center),
            false,
        )
        .unwrap();
        assert_eq!(fill.scaled, (50, 40));
        assert_eq!(fill.output_size(), (50, 20));
    }

    #[test]
    fn test_pad_produces_exact_canvas() {
        let plan = plan_resize(
            (400, 200),
            Some(100),
            Some(100),
            ResizeMode::Pad([255, 255, 255]),
            false,
        )
        .unwrap();
        assert_eq!(plan.scaled, (100, 50));
        assert_eq!(plan.output_size(), (100, 100));

        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(400, 200, Rgba([0, 0, 0, 255])));
        let out = apply_plan(img, &plan).to_rgba8();
        assert_eq!(out.dimensions(), (100, 100));
        assert_eq!(out.get_pixel(50, 5), &Rgba([255, 255, 255, 255]));
        assert_eq!(&out.get_pixel(50, 50).0[..3], &[0, 0, 0]);
    }

    #[test]
    fn test_pixel_limit() {
        assert!(matches!(
            plan_resize((10, 10), Some(50_000), Some(50_000), ResizeMode::Fit, true),
            Err(RenderError::InvalidSpec(_))
        ));
    }

    #[test]
    fn test_apply_fill_plan() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(400, 200, Rgba([9, 9, 9, 255])));
        let plan = plan_resize(
            (400, 200),
            Some(100),
            Some(50),
            ResizeMode::Fill(Quadrant::Center),
            false,
        )
        .unwrap();
        assert_eq!(apply_plan(img, &plan).dimensions(), (100, 50));
    }
}
