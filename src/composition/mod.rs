//! # Composition
//!
//! Lays out one or three captured shots on a white-bordered canvas. Geometry is
//! computed once by [`BorderLayout::compute`]; [`FrameCompositor`] then draws it.

pub mod compositor;
pub mod layout;
pub mod photo;

// Re-exports for convenience
pub use compositor::FrameCompositor;
pub use layout::{capture_buffer_size, shot_region, BorderLayout, CaptureMode, Placement};
pub use photo::{photo_filename_stem, ComposedPhoto};
