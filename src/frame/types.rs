use image::{ImageBuffer, Rgba, RgbaImage};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{PixelError, Result};

/// Width and height of a frame in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    /// Resolution assumed when a source cannot report its own
    pub const DEFAULT: FrameSize = FrameSize { width: 640, height: 480 };

    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Resolve reported dimensions, falling back to 640x480 for unknown or zero sizes
    pub fn from_dimensions(dimensions: Option<(u32, u32)>) -> Self {
        match dimensions {
            Some((width, height)) if width > 0 && height > 0 => Self { width, height },
            _ => Self::DEFAULT,
        }
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

impl Default for FrameSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl std::fmt::Display for FrameSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A rectangle inside a pixel buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Region covering a whole frame of the given size
    pub const fn full(size: FrameSize) -> Self {
        Self::new(0, 0, size.width, size.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Exclusive right edge
    pub fn right(&self) -> u64 {
        self.x as u64 + self.width as u64
    }

    /// Exclusive bottom edge
    pub fn bottom(&self) -> u64 {
        self.y as u64 + self.height as u64
    }

    pub fn size(&self) -> FrameSize {
        FrameSize::new(self.width, self.height)
    }

    /// True when the two regions share at least one pixel
    pub fn overlaps(&self, other: &Region) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        (self.x as u64) < other.right()
            && (other.x as u64) < self.right()
            && (self.y as u64) < other.bottom()
            && (other.y as u64) < self.bottom()
    }
}

/// An RGBA8 drawing surface
///
/// Thin wrapper around an `RgbaImage` with the region-aware helpers used by
/// the filter kernels, the flip transform and the compositor.
#[derive(Clone, Debug, PartialEq)]
pub struct PixelBuffer {
    buffer: RgbaImage,
}

impl PixelBuffer {
    pub const WHITE: [u8; 4] = [255, 255, 255, 255];

    pub fn new(buffer: RgbaImage) -> Self {
        Self { buffer }
    }

    /// Create a fully transparent buffer, like a freshly sized canvas
    pub fn new_transparent(size: FrameSize) -> Self {
        Self {
            buffer: ImageBuffer::new(size.width, size.height),
        }
    }

    /// Create a buffer filled with a solid color
    pub fn new_filled(size: FrameSize, color: [u8; 4]) -> Self {
        Self {
            buffer: ImageBuffer::from_pixel(size.width, size.height, Rgba(color)),
        }
    }

    /// Create a buffer from raw RGBA bytes
    pub fn from_rgba_bytes(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        let actual = data.len();
        ImageBuffer::from_raw(width, height, data)
            .map(|buffer| Self { buffer })
            .ok_or_else(|| {
                PixelError::InvalidDimensions {
                    details: format!("{}x{} needs {} bytes, got {}", width, height, expected, actual),
                }
                .into()
            })
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    pub fn size(&self) -> FrameSize {
        FrameSize::new(self.width(), self.height())
    }

    pub fn full_region(&self) -> Region {
        Region::full(self.size())
    }

    pub fn get_pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.buffer.get_pixel(x, y).0
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, color: [u8; 4]) {
        self.buffer.put_pixel(x, y, Rgba(color));
    }

    pub fn as_image(&self) -> &RgbaImage {
        &self.buffer
    }

    pub fn as_image_mut(&mut self) -> &mut RgbaImage {
        &mut self.buffer
    }

    pub fn into_image(self) -> RgbaImage {
        self.buffer
    }

    pub fn as_raw(&self) -> &[u8] {
        self.buffer.as_raw()
    }

    /// Fail unless `region` lies entirely inside this buffer
    pub fn check_region(&self, region: &Region) -> Result<()> {
        if region.right() > self.width() as u64 || region.bottom() > self.height() as u64 {
            return Err(PixelError::InvalidRegion {
                x: region.x,
                y: region.y,
                width: region.width,
                height: region.height,
                buffer_width: self.width(),
                buffer_height: self.height(),
            }
            .into());
        }
        Ok(())
    }

    fn stride(&self) -> usize {
        self.width() as usize * 4
    }

    /// Bytes of `width` pixels starting at (x, y). Caller has checked bounds.
    pub(crate) fn row_span(&self, x: u32, y: u32, width: u32) -> &[u8] {
        let start = y as usize * self.stride() + x as usize * 4;
        &self.buffer.as_raw()[start..start + width as usize * 4]
    }

    pub(crate) fn row_span_mut(&mut self, x: u32, y: u32, width: u32) -> &mut [u8] {
        let start = y as usize * self.stride() + x as usize * 4;
        let raw: &mut [u8] = &mut self.buffer;
        &mut raw[start..start + width as usize * 4]
    }

    /// Parallel iterator over the rows of `region`, each row cut to the region's columns
    pub fn par_region_rows_mut(
        &mut self,
        region: Region,
    ) -> Result<impl IndexedParallelIterator<Item = &mut [u8]> + '_> {
        self.check_region(&region)?;
        let stride = self.stride().max(1);
        let start = region.x as usize * 4;
        let end = start + region.width as usize * 4;
        let raw: &mut [u8] = &mut self.buffer;

        Ok(raw
            .par_chunks_exact_mut(stride)
            .skip(region.y as usize)
            .take(region.height as usize)
            .map(move |row| &mut row[start..end]))
    }

    /// Packed copy of the bytes inside `region`
    pub fn copy_region(&self, region: Region) -> Result<Vec<u8>> {
        self.check_region(&region)?;
        let mut out = Vec::with_capacity(region.size().pixel_count() * 4);
        for y in region.y..region.y + region.height {
            out.extend_from_slice(self.row_span(region.x, y, region.width));
        }
        Ok(out)
    }

    /// Extract `region` as a standalone buffer
    pub fn crop(&self, region: Region) -> Result<PixelBuffer> {
        let data = self.copy_region(region)?;
        Self::from_rgba_bytes(region.width, region.height, data)
    }

    /// Copy `src_region` of `source` into this buffer with its top-left corner at (dest_x, dest_y)
    pub fn blit(&mut self, source: &PixelBuffer, src_region: Region, dest_x: u32, dest_y: u32) -> Result<()> {
        source.check_region(&src_region)?;
        let dest = Region::new(dest_x, dest_y, src_region.width, src_region.height);
        self.check_region(&dest)?;

        for row in 0..src_region.height {
            let src = source.row_span(src_region.x, src_region.y + row, src_region.width);
            self.row_span_mut(dest_x, dest_y + row, src_region.width)
                .copy_from_slice(src);
        }
        Ok(())
    }

    /// Fill `region` with a solid color
    pub fn fill(&mut self, region: Region, color: [u8; 4]) -> Result<()> {
        self.par_region_rows_mut(region)?.for_each(|row| {
            for pixel in row.chunks_exact_mut(4) {
                pixel.copy_from_slice(&color);
            }
        });
        Ok(())
    }

    /// Save the buffer as an image file, format chosen from the extension
    pub fn save<P: AsRef<std::path::Path>>(&self, path: P) -> std::result::Result<(), image::ImageError> {
        self.buffer.save(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_dimensions_fall_back_to_default() {
        assert_eq!(FrameSize::from_dimensions(None), FrameSize::new(640, 480));
        assert_eq!(FrameSize::from_dimensions(Some((0, 720))), FrameSize::new(640, 480));
        assert_eq!(FrameSize::from_dimensions(Some((1280, 720))), FrameSize::new(1280, 720));
    }

    #[test]
    fn test_region_bounds_checked() {
        let buffer = PixelBuffer::new_transparent(FrameSize::new(10, 10));
        assert!(buffer.check_region(&Region::new(0, 0, 10, 10)).is_ok());
        assert!(buffer.check_region(&Region::new(5, 5, 5, 5)).is_ok());
        assert!(buffer.check_region(&Region::new(5, 5, 6, 5)).is_err());
        assert!(buffer.check_region(&Region::new(u32::MAX, 0, 2, 1)).is_err());
    }

    #[test]
    fn test_region_overlap() {
        let a = Region::new(0, 0, 10, 10);
        assert!(a.overlaps(&Region::new(9, 9, 5, 5)));
        assert!(!a.overlaps(&Region::new(0, 10, 10, 10)));
        assert!(!a.overlaps(&Region::new(3, 3, 0, 4)));
    }

    #[test]
    fn test_blit_only_touches_destination() {
        let source = PixelBuffer::new_filled(FrameSize::new(4, 4), [10, 20, 30, 255]);
        let mut target = PixelBuffer::new_filled(FrameSize::new(8, 8), PixelBuffer::WHITE);

        target.blit(&source, Region::new(0, 0, 2, 3), 5, 4).unwrap();

        assert_eq!(target.get_pixel(5, 4), [10, 20, 30, 255]);
        assert_eq!(target.get_pixel(6, 6), [10, 20, 30, 255]);
        assert_eq!(target.get_pixel(7, 4), PixelBuffer::WHITE);
        assert_eq!(target.get_pixel(5, 7), PixelBuffer::WHITE);
        assert_eq!(target.get_pixel(4, 4), PixelBuffer::WHITE);
    }

    #[test]
    fn test_blit_rejects_out_of_bounds() {
        let source = PixelBuffer::new_transparent(FrameSize::new(4, 4));
        let mut target = PixelBuffer::new_transparent(FrameSize::new(4, 4));
        assert!(target.blit(&source, Region::new(0, 0, 4, 4), 1, 0).is_err());
    }

    #[test]
    fn test_crop_and_raw_bytes() {
        let mut buffer = PixelBuffer::new_transparent(FrameSize::new(3, 2));
        buffer.set_pixel(2, 1, [1, 2, 3, 4]);

        let cropped = buffer.crop(Region::new(2, 1, 1, 1)).unwrap();
        assert_eq!(cropped.as_raw(), &[1, 2, 3, 4]);

        assert!(PixelBuffer::from_rgba_bytes(2, 2, vec![0; 15]).is_err());
    }
}
