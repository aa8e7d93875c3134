//! Cropline Processing Library
//!
//! Turns source image bytes plus a `CropSpec` into the bytes of the crop.
//! Rendering is a pure function of its inputs and never touches storage.

pub mod compression;
pub mod error;
pub mod image;
pub mod renderer;

pub use compression::{EncodeSettings, ImageCompressor};
pub use error::RenderError;
pub use crate::image::geometry::{plan_resize, ResizePlan};
pub use renderer::{CropRenderer, ImageRenderer, RenderDefaults};
