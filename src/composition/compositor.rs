use tracing::debug;

use crate::{
    composition::layout::{capture_buffer_size, BorderLayout, CaptureMode},
    config::LayoutConfig,
    error::{PixelError, Result},
    frame::{FrameSize, PixelBuffer},
};

/// Frames captured shots with a white border
pub struct FrameCompositor {
    layout: LayoutConfig,
}

impl FrameCompositor {
    pub fn new(layout: LayoutConfig) -> Self {
        Self { layout }
    }

    pub fn layout_config(&self) -> &LayoutConfig {
        &self.layout
    }

    /// Compute the output geometry for a capture
    pub fn layout(&self, mode: CaptureMode, single: FrameSize) -> Result<BorderLayout> {
        BorderLayout::compute(mode, single, &self.layout)
    }

    /// Compose the bordered photo from a filled capture buffer
    ///
    /// `capture` must hold the stacked shots exactly as laid out by
    /// [`capture_buffer_size`]; gaps in it are never copied.
    pub fn compose(&self, mode: CaptureMode, capture: &PixelBuffer, single: FrameSize) -> Result<PixelBuffer> {
        let expected = capture_buffer_size(mode, single, self.layout.gap)?;
        if capture.size() != expected {
            return Err(PixelError::InvalidDimensions {
                details: format!(
                    "{} capture buffer is {}, expected {}",
                    mode, capture.size(), expected
                ),
            }
            .into());
        }

        let layout = self.layout(mode, single)?;
        debug!("Compositing {} photo: {} -> {}", mode, capture.size(), layout.output);

        let mut output = PixelBuffer::new_filled(layout.output, PixelBuffer::WHITE);
        for placement in &layout.placements {
            output.blit(capture, placement.source, placement.dest_x, placement.dest_y)?;
        }
        Ok(output)
    }
}

impl Default for FrameCompositor {
    fn default() -> Self {
        Self::new(LayoutConfig::default())
    }
}
