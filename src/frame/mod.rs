//! # Frame Module
//!
//! Pixel buffers, regions, and the frame sources that feed the preview loop
//! and the capture sequencer.

pub mod source;
pub mod types;

pub use source::{acquire_source, FrameSource, StillImageSource, TestPatternSource};
pub use types::{FrameSize, PixelBuffer, Region};
