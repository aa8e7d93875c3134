//! Image operations applied while rendering a crop
//!
//! - geometry: resize / crop / pad planning and application
//! - trim: strip transparent borders
//! - filters: grayscale, negative, blur

pub mod filters;
pub mod geometry;
pub mod trim;

pub use filters::apply_filters;
pub use geometry::{apply_plan, plan_resize, ResizePlan};
pub use trim::trim_transparent;
