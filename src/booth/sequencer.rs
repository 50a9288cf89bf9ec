use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{
    booth::{settings::BoothSettings, shutdown::ShutdownToken},
    composition::{capture_buffer_size, shot_region, CaptureMode, ComposedPhoto, FrameCompositor},
    config::{CountdownConfig, LayoutConfig},
    error::{CaptureError, Result, SourceError},
    filters::FilterRegistry,
    frame::{FrameSize, FrameSource, PixelBuffer, Region},
    transform,
};

/// Where a capture currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    CountingDown { shot: usize, remaining: u32 },
    Capturing(usize),
    Compositing,
    Done,
}

impl CaptureState {
    /// True while a sequence owns the capture control
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            CaptureState::CountingDown { .. } | CaptureState::Capturing(_) | CaptureState::Compositing
        )
    }
}

/// Visible countdown counter
pub trait CountdownDisplay {
    /// Show `remaining` seconds before the next shot
    fn show(&mut self, remaining: u32);

    /// Countdown finished or was abandoned
    fn hide(&mut self);
}

/// Countdown display that writes each step to the log
#[derive(Debug, Default)]
pub struct LogCountdown;

impl CountdownDisplay for LogCountdown {
    fn show(&mut self, remaining: u32) {
        info!("Countdown: {}", remaining);
    }

    fn hide(&mut self) {
        debug!("Countdown finished");
    }
}

/// Drives a single or triple-shot capture from the first countdown to the composed photo
///
/// A failed capture never yields a partial photo: the sequencer returns to
/// `Idle` and the caller gets the error.
pub struct CaptureSequencer {
    state: CaptureState,
    compositor: FrameCompositor,
    registry: FilterRegistry,
    countdown: CountdownConfig,
}

impl CaptureSequencer {
    pub fn new(layout: LayoutConfig, countdown: CountdownConfig) -> Self {
        Self {
            state: CaptureState::Idle,
            compositor: FrameCompositor::new(layout),
            registry: FilterRegistry::new(),
            countdown,
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    /// Re-enable capture after a sequence was abandoned mid-way
    ///
    /// A capture future dropped before completion leaves the sequencer in its
    /// last active state, and further captures fail with `InProgress`.
    pub fn reset(&mut self) {
        if self.state.is_active() {
            debug!("Abandoning capture in state {:?}", self.state);
        }
        self.state = CaptureState::Idle;
    }

    /// Take a photo in `mode` using the flip and filter current at each shot
    pub async fn capture(
        &mut self,
        mode: CaptureMode,
        source: &dyn FrameSource,
        settings: &watch::Receiver<BoothSettings>,
        display: &mut dyn CountdownDisplay,
        cancel: &mut ShutdownToken,
    ) -> Result<ComposedPhoto> {
        if self.state.is_active() {
            return Err(CaptureError::InProgress.into());
        }
        info!("Starting {} capture", mode);

        let result = match mode {
            CaptureMode::Single => self.capture_single(source, settings),
            CaptureMode::Triple => self.capture_triple(source, settings, display, cancel).await,
        };

        match result {
            Ok(photo) => {
                self.state = CaptureState::Done;
                info!("{} capture complete: {} ({})", mode, photo.filename_stem(), photo.buffer().size());
                Ok(photo)
            }
            Err(e) => {
                self.state = CaptureState::Idle;
                warn!("{} capture aborted: {}", mode, e);
                Err(e)
            }
        }
    }

    fn capture_single(
        &mut self,
        source: &dyn FrameSource,
        settings: &watch::Receiver<BoothSettings>,
    ) -> Result<ComposedPhoto> {
        let single = source.frame_size();
        self.compositor.layout(CaptureMode::Single, single)?;
        let mut capture = PixelBuffer::new_transparent(single);
        let region = capture.full_region();

        ensure_live(source, 0)?;
        self.state = CaptureState::Capturing(0);
        let current = *settings.borrow();
        self.draw_shot(&mut capture, region, source, current)?;

        self.finish(CaptureMode::Single, &capture, single)
    }

    async fn capture_triple(
        &mut self,
        source: &dyn FrameSource,
        settings: &watch::Receiver<BoothSettings>,
        display: &mut dyn CountdownDisplay,
        cancel: &mut ShutdownToken,
    ) -> Result<ComposedPhoto> {
        let mode = CaptureMode::Triple;
        let single = source.frame_size();
        let gap = self.compositor.layout_config().gap;
        self.compositor.layout(mode, single)?;
        let mut capture = PixelBuffer::new_transparent(capture_buffer_size(mode, single, gap)?);

        for shot in 0..mode.shot_count() {
            debug!("Preparing photo {} of {}", shot + 1, mode.shot_count());
            ensure_live(source, shot)?;

            let counted = self.run_countdown(shot, display, cancel).await;
            display.hide();
            counted?;

            self.state = CaptureState::Capturing(shot);
            let region = shot_region(shot, single, gap);
            let current = *settings.borrow();
            debug!("Drawing photo {} at offset {} (filter {}, flip {})",
                   shot + 1, region.y, current.filter, current.flip);
            self.draw_shot(&mut capture, region, source, current)?;
        }

        self.finish(mode, &capture, single)
    }

    async fn run_countdown(
        &mut self,
        shot: usize,
        display: &mut dyn CountdownDisplay,
        cancel: &mut ShutdownToken,
    ) -> Result<()> {
        let step = self.countdown.step_duration();

        for remaining in (1..=self.countdown.steps).rev() {
            if cancel.is_cancelled() {
                return Err(CaptureError::Cancelled { shot }.into());
            }
            self.state = CaptureState::CountingDown { shot, remaining };
            display.show(remaining);

            tokio::select! {
                _ = tokio::time::sleep(step) => {}
                _ = cancel.cancelled() => return Err(CaptureError::Cancelled { shot }.into()),
            }
        }
        Ok(())
    }

    /// Draw one shot into its own region and filter only that region
    fn draw_shot(
        &self,
        capture: &mut PixelBuffer,
        region: Region,
        source: &dyn FrameSource,
        settings: BoothSettings,
    ) -> Result<()> {
        let frame = source.current_frame()?;
        transform::draw_frame(capture, &frame, region, settings.flip)?;
        self.registry.apply(settings.filter, capture, region)
    }

    fn finish(&mut self, mode: CaptureMode, capture: &PixelBuffer, single: FrameSize) -> Result<ComposedPhoto> {
        self.state = CaptureState::Compositing;
        let bordered = self.compositor.compose(mode, capture, single)?;
        Ok(ComposedPhoto::new(bordered, mode, Utc::now()))
    }
}

impl Default for CaptureSequencer {
    fn default() -> Self {
        Self::new(LayoutConfig::default(), CountdownConfig::default())
    }
}

fn ensure_live(source: &dyn FrameSource, shot: usize) -> Result<()> {
    if !source.is_live() {
        return Err(SourceError::Unavailable {
            reason: format!("video stream is not active before photo {}", shot + 1),
        }
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booth::{settings::SettingsHandle, shutdown::Shutdown};
    use crate::error::PhotoboothError;
    use crate::filters::FilterSelection;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::time::Instant;

    /// Solid-color camera that goes dark after a number of liveness checks
    struct ScriptedSource {
        size: FrameSize,
        live_checks: usize,
        checks: AtomicUsize,
        reads: AtomicUsize,
    }

    impl ScriptedSource {
        fn new(size: FrameSize, live_checks: usize) -> Self {
            Self {
                size,
                live_checks,
                checks: AtomicUsize::new(0),
                reads: AtomicUsize::new(0),
            }
        }
    }

    impl FrameSource for ScriptedSource {
        fn current_frame(&self) -> Result<PixelBuffer> {
            let read = self.reads.fetch_add(1, Ordering::SeqCst);
            let mut frame = PixelBuffer::new_filled(self.size, [100, 100, 100, 255]);
            // mark the left column with the shot number so flips are visible
            for y in 0..self.size.height {
                frame.set_pixel(0, y, [200, read as u8 * 50, 0, 255]);
            }
            Ok(frame)
        }

        fn dimensions(&self) -> Option<(u32, u32)> {
            Some((self.size.width, self.size.height))
        }

        fn is_live(&self) -> bool {
            self.checks.fetch_add(1, Ordering::SeqCst) < self.live_checks
        }
    }

    #[derive(Default)]
    struct RecordingCountdown {
        shown: Vec<u32>,
        hidden: usize,
    }

    impl CountdownDisplay for RecordingCountdown {
        fn show(&mut self, remaining: u32) {
            self.shown.push(remaining);
        }

        fn hide(&mut self) {
            self.hidden += 1;
        }
    }

    #[tokio::test]
    async fn test_single_capture_has_no_countdown() {
        let source = ScriptedSource::new(FrameSize::new(64, 48), usize::MAX);
        let settings = SettingsHandle::default();
        let mut countdown = RecordingCountdown::default();
        let mut sequencer = CaptureSequencer::default();

        let photo = sequencer
            .capture(CaptureMode::Single, &source, &settings.subscribe(), &mut countdown, &mut ShutdownToken::never())
            .await
            .unwrap();

        assert_eq!(photo.buffer().size(), FrameSize::new(104, 128));
        assert_eq!(photo.mode(), CaptureMode::Single);
        assert!(photo.filename_stem().starts_with("photobooth-single-"));
        assert!(countdown.shown.is_empty());
        assert_eq!(sequencer.state(), CaptureState::Done);
    }

    #[tokio::test(start_paused = true)]
    async fn test_triple_capture_counts_down_each_shot() {
        let source = ScriptedSource::new(FrameSize::new(32, 24), usize::MAX);
        let settings = SettingsHandle::default();
        settings.set_flip(true);
        let mut countdown = RecordingCountdown::default();
        let mut sequencer = CaptureSequencer::default();

        let started = Instant::now();
        let photo = sequencer
            .capture(CaptureMode::Triple, &source, &settings.subscribe(), &mut countdown, &mut ShutdownToken::never())
            .await
            .unwrap();

        assert_eq!(started.elapsed(), Duration::from_secs(9));
        assert_eq!(countdown.shown, vec![3, 2, 1, 3, 2, 1, 3, 2, 1]);
        assert_eq!(countdown.hidden, 3);
        assert_eq!(photo.buffer().size(), FrameSize::new(72, 132));

        // each shot was mirrored: the marker column sits at the right edge
        for shot in 0..3u32 {
            let top = 20 + shot * 34;
            assert_eq!(photo.buffer().get_pixel(20 + 31, top), [200, shot as u8 * 50, 0, 255]);
            assert_eq!(photo.buffer().get_pixel(20, top), [100, 100, 100, 255]);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_source_lost_before_second_shot_aborts() {
        let source = ScriptedSource::new(FrameSize::new(32, 24), 1);
        let settings = SettingsHandle::default();
        let mut countdown = RecordingCountdown::default();
        let mut sequencer = CaptureSequencer::default();

        let err = sequencer
            .capture(CaptureMode::Triple, &source, &settings.subscribe(), &mut countdown, &mut ShutdownToken::never())
            .await
            .unwrap_err();

        assert!(err.is_source_unavailable());
        assert_eq!(sequencer.state(), CaptureState::Idle);
        // only the first shot was ever drawn
        assert_eq!(source.reads.load(Ordering::SeqCst), 1);
        assert_eq!(countdown.shown, vec![3, 2, 1]);
    }

    #[tokio::test]
    async fn test_single_capture_requires_live_source() {
        let source = ScriptedSource::new(FrameSize::new(8, 8), 0);
        let mut sequencer = CaptureSequencer::default();

        let err = sequencer
            .capture(
                CaptureMode::Single,
                &source,
                &SettingsHandle::default().subscribe(),
                &mut LogCountdown,
                &mut ShutdownToken::never(),
            )
            .await
            .unwrap_err();

        assert!(err.is_source_unavailable());
        assert_eq!(source.reads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_countdown() {
        let source = ScriptedSource::new(FrameSize::new(16, 12), usize::MAX);
        let settings = SettingsHandle::default();
        let rx = settings.subscribe();
        let mut countdown = RecordingCountdown::default();
        let mut sequencer = CaptureSequencer::default();
        let shutdown = Shutdown::new();
        let mut token = shutdown.token();

        let (result, _) = tokio::join!(
            sequencer.capture(CaptureMode::Triple, &source, &rx, &mut countdown, &mut token),
            async {
                tokio::time::sleep(Duration::from_millis(4500)).await;
                shutdown.trigger();
            }
        );

        let err = result.unwrap_err();
        assert!(matches!(err, PhotoboothError::Capture(CaptureError::Cancelled { shot: 1 })));
        assert_eq!(sequencer.state(), CaptureState::Idle);
        assert_eq!(countdown.shown, vec![3, 2, 1, 3, 2]);
        assert_eq!(countdown.hidden, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_capture_blocks_until_reset() {
        let source = ScriptedSource::new(FrameSize::new(16, 12), usize::MAX);
        let settings = SettingsHandle::default();
        let rx = settings.subscribe();
        let mut sequencer = CaptureSequencer::default();

        let abandoned = tokio::time::timeout(
            Duration::from_millis(1500),
            sequencer.capture(CaptureMode::Triple, &source, &rx, &mut LogCountdown, &mut ShutdownToken::never()),
        )
        .await;
        assert!(abandoned.is_err());
        assert!(sequencer.state().is_active());

        let err = sequencer
            .capture(CaptureMode::Single, &source, &rx, &mut LogCountdown, &mut ShutdownToken::never())
            .await
            .unwrap_err();
        assert!(matches!(err, PhotoboothError::Capture(CaptureError::InProgress)));
        assert!(sequencer.state().is_active());

        sequencer.reset();
        let photo = sequencer
            .capture(CaptureMode::Single, &source, &rx, &mut LogCountdown, &mut ShutdownToken::never())
            .await
            .unwrap();
        assert_eq!(photo.mode(), CaptureMode::Single);
    }

    #[tokio::test]
    async fn test_oversized_layout_fails_without_reading_source() {
        let source = ScriptedSource::new(FrameSize::new(4, 4), usize::MAX);
        let layout = LayoutConfig {
            border_width: u32::MAX / 2,
            ..LayoutConfig::default()
        };
        let mut sequencer = CaptureSequencer::new(layout, CountdownConfig::default());

        let err = sequencer
            .capture(
                CaptureMode::Single,
                &source,
                &SettingsHandle::default().subscribe(),
                &mut LogCountdown,
                &mut ShutdownToken::never(),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PhotoboothError::Pixel(crate::error::PixelError::InvalidDimensions { .. })
        ));
        assert_eq!(sequencer.state(), CaptureState::Idle);
        assert_eq!(source.reads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_filter_applies_per_shot_region_only() {
        let source = ScriptedSource::new(FrameSize::new(16, 12), usize::MAX);
        let settings = SettingsHandle::default();
        settings.select_filter(FilterSelection::Dark);
        let mut sequencer = CaptureSequencer::new(
            LayoutConfig::default(),
            CountdownConfig { steps: 1, step_ms: 10 },
        );

        let photo = sequencer
            .capture(CaptureMode::Triple, &source, &settings.subscribe(), &mut LogCountdown, &mut ShutdownToken::never())
            .await
            .unwrap();

        let buffer = photo.buffer();
        for shot in 0..3u32 {
            // darkened once, never twice
            assert_eq!(buffer.get_pixel(25, 20 + shot * 22 + 5), [80, 80, 80, 255]);
        }
        // gap between shots stays white
        assert_eq!(buffer.get_pixel(25, 20 + 12 + 3), PixelBuffer::WHITE);
    }
}
