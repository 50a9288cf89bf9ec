//! # Geometric Transform
//!
//! Draws a camera frame into a rectangle of a target buffer, optionally
//! mirrored left-right. Rows keep their vertical order; pixels outside the
//! destination rectangle are never written.

use std::borrow::Cow;

use image::imageops::{self, FilterType};

use crate::{
    error::{PixelError, Result},
    frame::{PixelBuffer, Region},
};

/// Draw `source` into `dest` of `target`, scaling to fit when sizes differ
pub fn draw_frame(target: &mut PixelBuffer, source: &PixelBuffer, dest: Region, mirror: bool) -> Result<()> {
    target.check_region(&dest)?;
    if dest.is_empty() {
        return Ok(());
    }
    if source.width() == 0 || source.height() == 0 {
        return Err(PixelError::InvalidDimensions {
            details: format!("cannot draw an empty {} frame", source.size()),
        }
        .into());
    }

    let scaled = if source.size() == dest.size() {
        Cow::Borrowed(source)
    } else {
        let resized = imageops::resize(source.as_image(), dest.width, dest.height, FilterType::Triangle);
        Cow::Owned(PixelBuffer::new(resized))
    };

    for row in 0..dest.height {
        let src = scaled.row_span(0, row, dest.width);
        let dst = target.row_span_mut(dest.x, dest.y + row, dest.width);
        if mirror {
            for (out, pixel) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4).rev()) {
                out.copy_from_slice(pixel);
            }
        } else {
            dst.copy_from_slice(src);
        }
    }
    Ok(())
}

/// Mirror `source` left-right into a new buffer of the same size
pub fn flip_horizontal(source: &PixelBuffer) -> Result<PixelBuffer> {
    let mut target = PixelBuffer::new_transparent(source.size());
    let region = target.full_region();
    draw_frame(&mut target, source, region, true)?;
    Ok(target)
}
