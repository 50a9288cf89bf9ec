use chrono::{DateTime, Utc};

use crate::{composition::layout::CaptureMode, frame::PixelBuffer};

/// Filename stem for a photo taken at `at`: `photobooth-<mode>-<YYYYMMDDHHMMSS>`
///
/// The timestamp has second granularity, so two photos of the same mode taken
/// within one second share a name.
pub fn photo_filename_stem(mode: CaptureMode, at: DateTime<Utc>) -> String {
    format!("photobooth-{}-{}", mode, at.format("%Y%m%d%H%M%S"))
}

/// A finished, bordered photo ready for display and export
#[derive(Debug, Clone)]
pub struct ComposedPhoto {
    buffer: PixelBuffer,
    mode: CaptureMode,
    taken_at: DateTime<Utc>,
    filename_stem: String,
}

impl ComposedPhoto {
    pub fn new(buffer: PixelBuffer, mode: CaptureMode, taken_at: DateTime<Utc>) -> Self {
        Self {
            filename_stem: photo_filename_stem(mode, taken_at),
            buffer,
            mode,
            taken_at,
        }
    }

    pub fn buffer(&self) -> &PixelBuffer {
        &self.buffer
    }

    pub fn mode(&self) -> CaptureMode {
        self.mode
    }

    pub fn taken_at(&self) -> DateTime<Utc> {
        self.taken_at
    }

    pub fn filename_stem(&self) -> &str {
        &self.filename_stem
    }

    /// Full filename with the extension of the chosen encoding
    pub fn filename(&self, extension: &str) -> String {
        format!("{}.{}", self.filename_stem, extension)
    }
}
