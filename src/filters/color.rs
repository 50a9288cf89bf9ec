//! Per-pixel color kernels

use rayon::prelude::*;

use crate::{
    error::Result,
    filters::traits::{clamp_channel, Kernel},
    frame::{PixelBuffer, Region},
};

const SEPIA_MATRIX: [[f64; 3]; 3] = [
    [0.393, 0.769, 0.189],
    [0.349, 0.686, 0.168],
    [0.272, 0.534, 0.131],
];

const BRIGHT_FACTOR: f64 = 1.2;
const DARK_FACTOR: f64 = 0.8;
const CONTRAST_FACTOR: f64 = 1.5;
const CONTRAST_PIVOT: f64 = 128.0;

/// Run `transform` over the RGB part of every pixel in `region`
fn map_region<F>(buffer: &mut PixelBuffer, region: Region, transform: F) -> Result<()>
where
    F: Fn(f64, f64, f64) -> [u8; 3] + Sync,
{
    buffer.par_region_rows_mut(region)?.for_each(|row| {
        for pixel in row.chunks_exact_mut(4) {
            let [r, g, b] = transform(pixel[0] as f64, pixel[1] as f64, pixel[2] as f64);
            pixel[0] = r;
            pixel[1] = g;
            pixel[2] = b;
        }
    });
    Ok(())
}

/// Unweighted average of the three color channels
pub struct Grayscale;

impl Kernel for Grayscale {
    fn name(&self) -> &str {
        "grayscale"
    }

    fn description(&self) -> &str {
        "Black and white from the plain average of red, green and blue"
    }

    fn apply(&self, buffer: &mut PixelBuffer, region: Region) -> Result<()> {
        map_region(buffer, region, |r, g, b| {
            let avg = clamp_channel((r + g + b) / 3.0);
            [avg, avg, avg]
        })
    }
}

/// Classic warm brown tone
pub struct Sepia;

impl Kernel for Sepia {
    fn name(&self) -> &str {
        "sepia"
    }

    fn description(&self) -> &str {
        "Warm brown vintage tone"
    }

    fn apply(&self, buffer: &mut PixelBuffer, region: Region) -> Result<()> {
        map_region(buffer, region, |r, g, b| {
            SEPIA_MATRIX.map(|[kr, kg, kb]| clamp_channel(r * kr + g * kg + b * kb))
        })
    }
}

pub struct Bright;

impl Kernel for Bright {
    fn name(&self) -> &str {
        "bright"
    }

    fn description(&self) -> &str {
        "Boosts every channel by 20%"
    }

    fn apply(&self, buffer: &mut PixelBuffer, region: Region) -> Result<()> {
        map_region(buffer, region, |r, g, b| {
            [r, g, b].map(|v| clamp_channel(v * BRIGHT_FACTOR))
        })
    }
}

pub struct Dark;

impl Kernel for Dark {
    fn name(&self) -> &str {
        "dark"
    }

    fn description(&self) -> &str {
        "Dims every channel by 20%"
    }

    fn apply(&self, buffer: &mut PixelBuffer, region: Region) -> Result<()> {
        map_region(buffer, region, |r, g, b| {
            [r, g, b].map(|v| clamp_channel(v * DARK_FACTOR))
        })
    }
}

/// Stretches channels away from mid-gray
pub struct Contrast;

impl Kernel for Contrast {
    fn name(&self) -> &str {
        "contrast"
    }

    fn description(&self) -> &str {
        "Pushes tones away from mid-gray by a factor of 1.5"
    }

    fn apply(&self, buffer: &mut PixelBuffer, region: Region) -> Result<()> {
        map_region(buffer, region, |r, g, b| {
            [r, g, b].map(|v| clamp_channel((v - CONTRAST_PIVOT) * CONTRAST_FACTOR + CONTRAST_PIVOT))
        })
    }
}
