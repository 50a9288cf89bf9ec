use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::{
    booth::{settings::BoothSettings, shutdown::ShutdownToken},
    config::PreviewConfig,
    error::{RenderError, Result},
    filters::FilterRegistry,
    frame::{FrameSource, PixelBuffer},
    transform,
};

/// Surface the live preview is presented on
pub trait DisplaySink {
    fn present(&mut self, frame: &PixelBuffer) -> Result<()>;
}

/// Display sink that keeps a copy of the last presented frame
#[derive(Debug, Default)]
pub struct LatestFrameSink {
    latest: Option<PixelBuffer>,
    presented: u64,
}

impl LatestFrameSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latest(&self) -> Option<&PixelBuffer> {
        self.latest.as_ref()
    }

    pub fn presented(&self) -> u64 {
        self.presented
    }
}

impl DisplaySink for LatestFrameSink {
    fn present(&mut self, frame: &PixelBuffer) -> Result<()> {
        self.latest = Some(frame.clone());
        self.presented += 1;
        Ok(())
    }
}

/// Counters reported when the loop stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub rendered: u64,
    pub failed: u64,
}

/// The real-time preview path
///
/// Every paced tick copies the current source frame into the preview buffer,
/// mirrors it if flip is on, runs the selected filter over it and presents it.
/// A failed iteration is logged and skipped; only the stop token ends the loop.
pub struct RenderLoop {
    preview: PixelBuffer,
    registry: FilterRegistry,
    config: PreviewConfig,
    stats: RenderStats,
}

impl RenderLoop {
    pub fn new(config: PreviewConfig) -> Self {
        Self {
            preview: PixelBuffer::new_transparent(Default::default()),
            registry: FilterRegistry::new(),
            config,
            stats: RenderStats::default(),
        }
    }

    pub fn preview(&self) -> &PixelBuffer {
        &self.preview
    }

    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    /// Render and present a single preview frame
    pub fn render_frame(
        &mut self,
        source: &dyn FrameSource,
        settings: BoothSettings,
        display: &mut dyn DisplaySink,
    ) -> Result<()> {
        let size = source.frame_size();
        if self.preview.size() != size {
            debug!("Preview buffer resized to {}", size);
            self.preview = PixelBuffer::new_transparent(size);
        }
        let region = self.preview.full_region();

        let frame = source.current_frame()?;
        transform::draw_frame(&mut self.preview, &frame, region, settings.flip)?;
        self.registry.apply(settings.filter, &mut self.preview, region)?;

        display.present(&self.preview).map_err(|e| {
            RenderError::DisplayFailed {
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Run until `stop` fires, re-reading `settings` every frame
    pub async fn run(
        &mut self,
        source: &dyn FrameSource,
        settings: &watch::Receiver<BoothSettings>,
        display: &mut dyn DisplaySink,
        mut stop: ShutdownToken,
    ) -> RenderStats {
        let mut ticker = interval(self.config.frame_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!("Starting preview at {} fps", self.config.fps);

        loop {
            tokio::select! {
                biased;
                _ = stop.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let frame = self.stats.rendered + self.stats.failed;
            let current = *settings.borrow();

            match self.render_frame(source, current, display) {
                Ok(()) => self.stats.rendered += 1,
                Err(e) => {
                    let failure = RenderError::IterationFailed {
                        frame,
                        reason: e.to_string(),
                    };
                    warn!("{}", failure);
                    self.stats.failed += 1;
                }
            }
        }

        info!("Preview stopped: {} frames rendered, {} skipped",
              self.stats.rendered, self.stats.failed);
        self.stats
    }
}
