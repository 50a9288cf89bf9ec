//! # Pixel Filters
//!
//! Real-time filters for the live preview and for captured shots. Exactly one
//! filter is active at a time.
//!
//! ## Built-in Filters
//!
//! - **Grayscale**: unweighted channel average
//! - **Sepia**: fixed 3x3 color matrix
//! - **Bright** / **Dark**: channel scaling by 1.2 / 0.8
//! - **Contrast**: stretch around mid-gray by 1.5
//! - **Blur**: 5x5 box blur
//!
//! ## Usage
//!
//! ```rust
//! use photobooth::filters::{FilterRegistry, FilterSelection};
//! use photobooth::frame::{FrameSize, PixelBuffer};
//!
//! let registry = FilterRegistry::new();
//! let mut frame = PixelBuffer::new_filled(FrameSize::new(4, 4), [200, 120, 40, 255]);
//! let region = frame.full_region();
//! registry.apply(FilterSelection::Sepia, &mut frame, region).unwrap();
//! ```

pub mod registry;
pub mod traits;

mod blur;
mod color;

pub use blur::BoxBlur;
pub use color::{Bright, Contrast, Dark, Grayscale, Sepia};
pub use registry::FilterRegistry;
pub use traits::{FilterSelection, Kernel};
