//! # Booth
//!
//! The live parts of the photobooth: shared user settings, the preview render
//! loop, the capture sequencer, and the [`Photobooth`] engine tying a capture
//! to its export.

pub mod render_loop;
pub mod sequencer;
pub mod settings;
pub mod shutdown;

use tracing::{error, info};

use crate::{
    composition::CaptureMode,
    config::Config,
    error::Result,
    export::{self, ExportSink, ExportedPhoto},
    frame::FrameSource,
};

pub use render_loop::{DisplaySink, LatestFrameSink, RenderLoop, RenderStats};
pub use sequencer::{CaptureSequencer, CaptureState, CountdownDisplay, LogCountdown};
pub use settings::{BoothSettings, SettingsHandle};
pub use shutdown::{Shutdown, ShutdownToken};

/// Main photobooth engine
///
/// Owns the shared settings and the capture sequencer. A capture follows a
/// fixed pipeline:
/// 1. Sequencing - countdowns and shots drawn with the current flip/filter
/// 2. Compositing - bordered single photo or triple strip
/// 3. Export - the finished photo is handed to the export sink
pub struct Photobooth {
    config: Config,
    settings: SettingsHandle,
    sequencer: CaptureSequencer,
}

impl Photobooth {
    /// Create a new engine from a validated configuration
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let settings = SettingsHandle::from_config(&config.booth);
        let sequencer = CaptureSequencer::new(config.layout, config.countdown);

        Ok(Self {
            config,
            settings,
            sequencer,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Shared filter and flip selection
    pub fn settings(&self) -> &SettingsHandle {
        &self.settings
    }

    pub fn capture_state(&self) -> CaptureState {
        self.sequencer.state()
    }

    /// Re-enable the capture control after an abandoned capture
    pub fn reset_capture(&mut self) {
        self.sequencer.reset();
    }

    /// A preview loop configured for this booth
    pub fn preview_loop(&self) -> RenderLoop {
        RenderLoop::new(self.config.preview)
    }

    /// Capture a photo in `mode` and hand it to `exporter`
    ///
    /// Encoding runs on the blocking pool, so a preview loop sharing the
    /// runtime keeps rendering. Any failure is logged once and returned;
    /// nothing is exported for a failed capture.
    pub async fn take_photo(
        &mut self,
        mode: CaptureMode,
        source: &dyn FrameSource,
        countdown: &mut dyn CountdownDisplay,
        exporter: &mut dyn ExportSink,
        cancel: &mut ShutdownToken,
    ) -> Result<ExportedPhoto> {
        info!("Capture button clicked for {} mode", mode);
        let settings = self.settings.subscribe();

        let exported = match self.sequencer.capture(mode, source, &settings, countdown, cancel).await {
            Ok(photo) => export::export_async(exporter, photo).await,
            Err(e) => Err(e),
        };

        match exported {
            Ok(exported) => {
                info!("Photo ready for download: {}", exported.filename);
                Ok(exported)
            }
            Err(e) => {
                error!("Capture error: {}", e);
                Err(e)
            }
        }
    }
}
