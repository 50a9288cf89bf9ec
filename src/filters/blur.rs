use rayon::prelude::*;

use crate::{
    error::Result,
    filters::traits::{clamp_channel, Kernel},
    frame::{PixelBuffer, Region},
};

/// Box blur over a square neighbourhood
///
/// Reads from a snapshot of the region taken before any pixel is written,
/// so the result does not depend on traversal order. Neighbours outside the
/// region are skipped and the divisor shrinks at the edges.
pub struct BoxBlur {
    radius: u32,
}

impl BoxBlur {
    pub const DEFAULT_RADIUS: u32 = 2;

    pub fn new(radius: u32) -> Self {
        Self { radius }
    }

    pub fn radius(&self) -> u32 {
        self.radius
    }
}

impl Default for BoxBlur {
    fn default() -> Self {
        Self::new(Self::DEFAULT_RADIUS)
    }
}

impl Kernel for BoxBlur {
    fn name(&self) -> &str {
        "blur"
    }

    fn description(&self) -> &str {
        "Soft focus box blur over a 5x5 neighbourhood"
    }

    fn apply(&self, buffer: &mut PixelBuffer, region: Region) -> Result<()> {
        let snapshot = buffer.copy_region(region)?;
        if region.is_empty() {
            return Ok(());
        }

        let width = region.width as usize;
        let height = region.height as usize;
        let radius = self.radius as usize;

        buffer
            .par_region_rows_mut(region)?
            .enumerate()
            .for_each(|(y, row)| {
                let y0 = y.saturating_sub(radius);
                let y1 = (y + radius).min(height - 1);

                for x in 0..width {
                    let x0 = x.saturating_sub(radius);
                    let x1 = (x + radius).min(width - 1);

                    let mut sum = [0u32; 3];
                    for ny in y0..=y1 {
                        let line = &snapshot[ny * width * 4..(ny + 1) * width * 4];
                        for pixel in line[x0 * 4..(x1 + 1) * 4].chunks_exact(4) {
                            sum[0] += pixel[0] as u32;
                            sum[1] += pixel[1] as u32;
                            sum[2] += pixel[2] as u32;
                        }
                    }
                    let count = ((y1 - y0 + 1) * (x1 - x0 + 1)) as f64;

                    let out = &mut row[x * 4..x * 4 + 3];
                    for (channel, total) in out.iter_mut().zip(sum) {
                        *channel = clamp_channel(total as f64 / count);
                    }
                }
            });

        Ok(())
    }
}
