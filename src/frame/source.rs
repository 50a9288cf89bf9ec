use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use image::ImageError;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::{
    config::{SourceConfig, SourceKind},
    error::{ConfigError, Result, SourceError},
    frame::types::{FrameSize, PixelBuffer},
};

/// Provider of the live camera image
///
/// Sources are shared read-only between the preview loop and the capture
/// sequencer; neither may mutate the source itself.
pub trait FrameSource: Send + Sync {
    /// Snapshot of the current image
    fn current_frame(&self) -> Result<PixelBuffer>;

    /// Native resolution, if the source knows it yet
    fn dimensions(&self) -> Option<(u32, u32)>;

    /// Whether the underlying track is still delivering frames
    fn is_live(&self) -> bool;

    /// Resolution used for preview and capture buffers
    fn frame_size(&self) -> FrameSize {
        FrameSize::from_dimensions(self.dimensions())
    }
}

/// A still image served as if it were a camera track
pub struct StillImageSource {
    path: PathBuf,
    frame: PixelBuffer,
    live: AtomicBool,
}

impl StillImageSource {
    /// Decode `path` and expose it as a live source
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let image = image::open(path).map_err(|e| acquisition_error(path, e))?;
        let frame = PixelBuffer::new(image.to_rgba8());

        info!("Opened still image source {:?} ({})", path, frame.size());
        Ok(Self::from_buffer(path, frame))
    }

    pub fn from_buffer<P: Into<PathBuf>>(path: P, frame: PixelBuffer) -> Self {
        Self {
            path: path.into(),
            frame,
            live: AtomicBool::new(true),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// End the track; later frame reads fail with `SourceError::Unavailable`
    pub fn stop(&self) {
        debug!("Stopping still image source {:?}", self.path);
        self.live.store(false, Ordering::SeqCst);
    }
}

impl FrameSource for StillImageSource {
    fn current_frame(&self) -> Result<PixelBuffer> {
        if !self.is_live() {
            return Err(SourceError::Unavailable {
                reason: format!("{} has been stopped", self.path.display()),
            }
            .into());
        }
        Ok(self.frame.clone())
    }

    fn dimensions(&self) -> Option<(u32, u32)> {
        Some((self.frame.width(), self.frame.height()))
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }
}

/// Synthetic camera producing a slowly cycling color gradient
///
/// Each call to `current_frame` advances the pattern by one frame. Optional
/// sensor noise is seeded from the frame index so output stays reproducible.
pub struct TestPatternSource {
    size: FrameSize,
    noise: f32,
    frame_index: AtomicU64,
    live: AtomicBool,
}

impl TestPatternSource {
    pub fn new(size: FrameSize) -> Self {
        Self {
            size,
            noise: 0.0,
            frame_index: AtomicU64::new(0),
            live: AtomicBool::new(true),
        }
    }

    /// Amount of per-pixel noise (0.0-1.0)
    pub fn with_noise(mut self, noise: f32) -> Self {
        self.noise = noise.clamp(0.0, 1.0);
        self
    }

    pub fn frames_served(&self) -> u64 {
        self.frame_index.load(Ordering::SeqCst)
    }

    pub fn stop(&self) {
        self.live.store(false, Ordering::SeqCst);
    }

    fn render(&self, index: u64) -> PixelBuffer {
        let FrameSize { width, height } = self.size;
        let base_hue = (index as f32 * 2.0) % 360.0;
        let mut rng = SmallRng::seed_from_u64(index);
        let amplitude = self.noise * 64.0;

        let mut frame = PixelBuffer::new_transparent(self.size);
        for y in 0..height {
            let value = 0.4 + 0.6 * (y as f32 / height.max(1) as f32);
            for x in 0..width {
                let hue = (base_hue + 180.0 * x as f32 / width.max(1) as f32) % 360.0;
                let [r, g, b] = hsv_to_rgb(hue, 0.7, value);
                let pixel = if amplitude > 0.0 {
                    let n = rng.gen_range(-amplitude..=amplitude);
                    [add_noise(r, n), add_noise(g, n), add_noise(b, n), 255]
                } else {
                    [r, g, b, 255]
                };
                frame.set_pixel(x, y, pixel);
            }
        }
        frame
    }
}

impl FrameSource for TestPatternSource {
    fn current_frame(&self) -> Result<PixelBuffer> {
        if !self.is_live() {
            return Err(SourceError::Unavailable {
                reason: "test pattern stopped".to_string(),
            }
            .into());
        }
        let index = self.frame_index.fetch_add(1, Ordering::SeqCst);
        Ok(self.render(index))
    }

    fn dimensions(&self) -> Option<(u32, u32)> {
        Some((self.size.width, self.size.height))
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }
}

/// Acquire the frame source described by the configuration
pub fn acquire_source(config: &SourceConfig) -> Result<Box<dyn FrameSource>> {
    match config.kind {
        SourceKind::TestPattern => {
            let size = FrameSize::new(config.width, config.height);
            info!("Using test pattern source at {}", size);
            Ok(Box::new(TestPatternSource::new(size).with_noise(config.noise)))
        }
        SourceKind::Image => {
            let path = config.path.as_ref().ok_or_else(|| ConfigError::InvalidValue {
                key: "source.path".to_string(),
                value: "<unset>".to_string(),
            })?;
            Ok(Box::new(StillImageSource::open(path)?))
        }
    }
}

/// Classify why a device could not be opened
fn acquisition_error(path: &Path, error: ImageError) -> SourceError {
    let device = path.display().to_string();
    match error {
        ImageError::IoError(io) => match io.kind() {
            ErrorKind::NotFound => SourceError::NoDevice { device },
            ErrorKind::PermissionDenied => SourceError::PermissionDenied { device },
            _ => SourceError::FrameReadFailed { reason: io.to_string() },
        },
        ImageError::Unsupported(e) => SourceError::Unsupported { reason: e.to_string() },
        other => SourceError::FrameReadFailed { reason: other.to_string() },
    }
}

fn add_noise(channel: u8, noise: f32) -> u8 {
    (channel as f32 + noise).round().clamp(0.0, 255.0) as u8
}

fn hsv_to_rgb(h: f32, s: f32, v: f32) -> [u8; 3] {
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = match h as u32 {
        0..=59 => (c, x, 0.0),
        60..=119 => (x, c, 0.0),
        120..=179 => (0.0, c, x),
        180..=239 => (0.0, x, c),
        240..=299 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    [
        ((r + m) * 255.0) as u8,
        ((g + m) * 255.0) as u8,
        ((b + m) * 255.0) as u8,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PhotoboothError;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_is_no_device() {
        let dir = tempdir().unwrap();
        let result = StillImageSource::open(dir.path().join("missing.png"));
        assert!(matches!(
            result,
            Err(PhotoboothError::Source(SourceError::NoDevice { .. }))
        ));
    }

    #[test]
    fn test_unknown_format_is_not_a_missing_device() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("camera.xyz");
        std::fs::write(&path, b"not an image").unwrap();

        let err = StillImageSource::open(&path).err().unwrap();
        assert!(!matches!(err, PhotoboothError::Source(SourceError::NoDevice { .. })));
    }

    #[test]
    fn test_still_image_roundtrip_and_stop() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("frame.png");
        PixelBuffer::new_filled(FrameSize::new(8, 6), [1, 2, 3, 255]).save(&path).unwrap();

        let source = StillImageSource::open(&path).unwrap();
        assert_eq!(source.frame_size(), FrameSize::new(8, 6));
        assert_eq!(source.current_frame().unwrap().get_pixel(7, 5), [1, 2, 3, 255]);

        source.stop();
        assert!(!source.is_live());
        assert!(source.current_frame().unwrap_err().is_source_unavailable());
    }

    #[test]
    fn test_pattern_advances_and_is_opaque() {
        let source = TestPatternSource::new(FrameSize::new(32, 16)).with_noise(0.3);
        let first = source.current_frame().unwrap();
        let second = source.current_frame().unwrap();

        assert_eq!(source.frames_served(), 2);
        assert_eq!(first.size(), FrameSize::new(32, 16));
        assert_ne!(first, second);
        assert!(first.as_raw().chunks_exact(4).all(|p| p[3] == 255));
    }

    #[test]
    fn test_acquire_image_without_path_fails() {
        let config = SourceConfig {
            kind: SourceKind::Image,
            path: None,
            ..SourceConfig::default()
        };
        assert!(acquire_source(&config).is_err());
    }
}
