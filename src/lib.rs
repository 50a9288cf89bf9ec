//! # Photobooth
//!
//! Live camera preview with real-time pixel filters, and bordered single or
//! triple-shot photo compositions ready for download.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use photobooth::{
//!     booth::{LogCountdown, Photobooth, ShutdownToken},
//!     composition::CaptureMode,
//!     config::Config,
//!     export::FileExporter,
//!     filters::FilterSelection,
//!     frame::{FrameSize, TestPatternSource},
//! };
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> anyhow::Result<()> {
//! let config = Config::default();
//! let mut exporter = FileExporter::from_config(&config.export);
//! let mut booth = Photobooth::new(config)?;
//! booth.settings().select_filter(FilterSelection::Sepia);
//!
//! let camera = TestPatternSource::new(FrameSize::DEFAULT);
//! let photo = booth
//!     .take_photo(CaptureMode::Triple, &camera, &mut LogCountdown, &mut exporter, &mut ShutdownToken::never())
//!     .await?;
//! println!("Saved {}", photo.filename);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`frame`] - Pixel buffers and frame sources
//! - [`filters`] - Per-pixel and box blur kernels
//! - [`transform`] - Mirrored drawing of frames into regions
//! - [`composition`] - Border layout and compositing
//! - [`booth`] - Preview render loop, capture sequencer, shared settings
//! - [`export`] - Photo encoding and export sinks
//! - [`config`] - Configuration management

pub mod booth;
pub mod composition;
pub mod config;
pub mod error;
pub mod export;
pub mod filters;
pub mod frame;
pub mod transform;

// Re-export commonly used types for convenience
pub use crate::{
    booth::Photobooth,
    config::Config,
    error::{PhotoboothError, Result},
    filters::{FilterRegistry, FilterSelection, Kernel},
};
