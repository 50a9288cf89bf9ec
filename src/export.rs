//! # Export
//!
//! Encodes composed photos and hands them to the user. The file exporter
//! writes into an output directory; the memory exporter keeps the encoded
//! bytes for display.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageOutputFormat};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    composition::ComposedPhoto,
    config::ExportConfig,
    error::{ExportError, Result},
    frame::PixelBuffer,
};

/// Encoding used for exported photos
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Png,
    Jpeg,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg => "jpg",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = crate::error::PhotoboothError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(ExportFormat::Png),
            "jpeg" | "jpg" => Ok(ExportFormat::Jpeg),
            _ => Err(crate::error::ConfigError::InvalidValue {
                key: "export.format".to_string(),
                value: s.to_string(),
            }
            .into()),
        }
    }
}

/// Encode a buffer in memory
///
/// JPEG has no alpha channel, so the buffer is flattened to RGB first.
pub fn encode_buffer(buffer: &PixelBuffer, format: ExportFormat, jpeg_quality: u8) -> Result<Vec<u8>> {
    let image = DynamicImage::ImageRgba8(buffer.as_image().clone());
    let mut cursor = Cursor::new(Vec::new());

    let encoded = match format {
        ExportFormat::Png => image.write_to(&mut cursor, ImageOutputFormat::Png),
        ExportFormat::Jpeg => DynamicImage::ImageRgb8(image.to_rgb8())
            .write_to(&mut cursor, ImageOutputFormat::Jpeg(jpeg_quality)),
    };
    encoded.map_err(|e| ExportError::EncodingFailed { reason: e.to_string() })?;

    Ok(cursor.into_inner())
}

/// A composed photo encoded and named, ready for a sink to deliver
#[derive(Debug, Clone)]
pub struct EncodedPhoto {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Encode `photo` and name it after its stem and the format's extension
pub fn encode_photo(photo: &ComposedPhoto, format: ExportFormat, jpeg_quality: u8) -> Result<EncodedPhoto> {
    let filename = photo.filename(format.extension());
    let bytes = encode_buffer(photo.buffer(), format, jpeg_quality)?;
    debug!("Encoded {} ({} bytes)", filename, bytes.len());
    Ok(EncodedPhoto { filename, bytes })
}

/// Result of a successful export
#[derive(Debug, Clone)]
pub struct ExportedPhoto {
    pub filename: String,
    /// Where the photo was written, if the sink writes files
    pub path: Option<PathBuf>,
    pub byte_len: usize,
}

/// Collaborator that receives finished photos
pub trait ExportSink {
    /// Format and JPEG quality this sink wants photos encoded with
    fn encoding(&self) -> (ExportFormat, u8);

    /// Hand over an already encoded photo
    fn deliver(&mut self, photo: EncodedPhoto) -> Result<ExportedPhoto>;

    /// Encode on the calling thread, then deliver
    fn export(&mut self, photo: &ComposedPhoto) -> Result<ExportedPhoto> {
        let (format, quality) = self.encoding();
        let encoded = encode_photo(photo, format, quality)?;
        self.deliver(encoded)
    }
}

/// Encode on the blocking pool so a running preview loop is never stalled, then deliver
pub async fn export_async(sink: &mut dyn ExportSink, photo: ComposedPhoto) -> Result<ExportedPhoto> {
    let (format, quality) = sink.encoding();
    let encoded = tokio::task::spawn_blocking(move || encode_photo(&photo, format, quality))
        .await
        .map_err(|e| ExportError::EncodingFailed {
            reason: format!("export task failed: {}", e),
        })??;
    sink.deliver(encoded)
}

/// Writes encoded photos into a directory
#[derive(Debug, Clone)]
pub struct FileExporter {
    output_dir: PathBuf,
    format: ExportFormat,
    jpeg_quality: u8,
}

impl FileExporter {
    pub fn new<P: Into<PathBuf>>(output_dir: P, format: ExportFormat) -> Self {
        Self {
            output_dir: output_dir.into(),
            format,
            jpeg_quality: 90,
        }
    }

    pub fn from_config(config: &ExportConfig) -> Self {
        Self {
            output_dir: config.output_dir.clone(),
            format: config.format,
            jpeg_quality: config.jpeg_quality,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

impl ExportSink for FileExporter {
    fn encoding(&self) -> (ExportFormat, u8) {
        (self.format, self.jpeg_quality)
    }

    fn deliver(&mut self, photo: EncodedPhoto) -> Result<ExportedPhoto> {
        let path = self.output_dir.join(&photo.filename);
        let write_failed = |e: std::io::Error| ExportError::WriteFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        };
        std::fs::create_dir_all(&self.output_dir).map_err(write_failed)?;
        std::fs::write(&path, &photo.bytes).map_err(write_failed)?;

        info!("Photo saved to {:?}", path);
        Ok(ExportedPhoto {
            filename: photo.filename,
            path: Some(path),
            byte_len: photo.bytes.len(),
        })
    }
}

/// Keeps the most recent encoded photo in memory
#[derive(Debug)]
pub struct MemoryExporter {
    format: ExportFormat,
    jpeg_quality: u8,
    latest: Option<EncodedPhoto>,
}

impl MemoryExporter {
    pub fn new(format: ExportFormat, jpeg_quality: u8) -> Self {
        Self {
            format,
            jpeg_quality,
            latest: None,
        }
    }

    pub fn from_config(config: &ExportConfig) -> Self {
        Self::new(config.format, config.jpeg_quality)
    }

    /// Filename and encoded bytes of the last exported photo
    pub fn latest(&self) -> Option<(&str, &[u8])> {
        self.latest
            .as_ref()
            .map(|photo| (photo.filename.as_str(), photo.bytes.as_slice()))
    }
}

impl ExportSink for MemoryExporter {
    fn encoding(&self) -> (ExportFormat, u8) {
        (self.format, self.jpeg_quality)
    }

    fn deliver(&mut self, photo: EncodedPhoto) -> Result<ExportedPhoto> {
        let exported = ExportedPhoto {
            filename: photo.filename.clone(),
            path: None,
            byte_len: photo.bytes.len(),
        };
        self.latest = Some(photo);
        Ok(exported)
    }
}
