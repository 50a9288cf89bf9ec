use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::{
    config::LayoutConfig,
    error::{ConfigError, PhotoboothError, PixelError, Result},
    frame::{FrameSize, Region},
};

/// How many shots a capture takes and how they are framed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureMode {
    #[default]
    Single,
    Triple,
}

impl CaptureMode {
    pub fn shot_count(&self) -> usize {
        match self {
            CaptureMode::Single => 1,
            CaptureMode::Triple => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CaptureMode::Single => "single",
            CaptureMode::Triple => "triple",
        }
    }
}

impl std::fmt::Display for CaptureMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CaptureMode {
    type Err = PhotoboothError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" => Ok(CaptureMode::Single),
            "triple" => Ok(CaptureMode::Triple),
            _ => Err(ConfigError::InvalidValue {
                key: "mode".to_string(),
                value: s.to_string(),
            }
            .into()),
        }
    }
}

/// Largest composed photo, in pixels, the compositor will allocate
pub const MAX_OUTPUT_PIXELS: u64 = 1 << 28;

fn too_large(mode: CaptureMode, single: FrameSize, what: &str) -> PhotoboothError {
    PixelError::InvalidDimensions {
        details: format!("{} {} for {} shots does not fit in a u32 canvas", mode, what, single),
    }
    .into()
}

/// Size of the unbordered capture buffer: shots stacked vertically with `gap` between them
pub fn capture_buffer_size(mode: CaptureMode, single: FrameSize, gap: u32) -> Result<FrameSize> {
    let shots = mode.shot_count() as u32;
    single
        .height
        .checked_mul(shots)
        .and_then(|shot_rows| gap.checked_mul(shots - 1)?.checked_add(shot_rows))
        .map(|height| FrameSize::new(single.width, height))
        .ok_or_else(|| too_large(mode, single, "capture buffer"))
}

/// Sub-region of the capture buffer owned by shot `index`
///
/// Regions of different shots never overlap, so drawing and filtering one
/// shot cannot disturb another.
pub fn shot_region(index: usize, single: FrameSize, gap: u32) -> Region {
    let y = index as u32 * (single.height + gap);
    Region::new(0, y, single.width, single.height)
}

/// Where one shot of the capture buffer lands in the bordered output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub source: Region,
    pub dest_x: u32,
    pub dest_y: u32,
}

/// Output geometry of a composed photo
///
/// Computed once from the single-shot resolution and the layout constants,
/// then handed to the compositor for drawing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BorderLayout {
    pub mode: CaptureMode,
    pub output: FrameSize,
    pub placements: Vec<Placement>,
}

impl BorderLayout {
    pub fn compute(mode: CaptureMode, single: FrameSize, layout: &LayoutConfig) -> Result<Self> {
        let border = layout.border_width;
        let capture = capture_buffer_size(mode, single, layout.gap)?;

        let bottom = match mode {
            CaptureMode::Single => layout.bottom_border_width,
            CaptureMode::Triple => border,
        };
        let width = border
            .checked_mul(2)
            .and_then(|sides| capture.width.checked_add(sides));
        let height = border
            .checked_add(bottom)
            .and_then(|edges| capture.height.checked_add(edges));

        let output = match (width, height) {
            (Some(width), Some(height)) => FrameSize::new(width, height),
            _ => return Err(too_large(mode, single, "bordered photo")),
        };
        if output.width as u64 * output.height as u64 > MAX_OUTPUT_PIXELS {
            return Err(PixelError::InvalidDimensions {
                details: format!("{} photo of {} exceeds {} pixels", mode, output, MAX_OUTPUT_PIXELS),
            }
            .into());
        }

        let placements = (0..mode.shot_count())
            .map(|index| {
                let source = shot_region(index, single, layout.gap);
                Placement {
                    source,
                    dest_x: border,
                    dest_y: border + source.y,
                }
            })
            .collect();

        Ok(Self { mode, output, placements })
    }
}
