use thiserror::Error;

/// Main error type for the Photobooth library
#[derive(Error, Debug)]
pub enum PhotoboothError {
    #[error("Frame source error: {0}")]
    Source(#[from] SourceError),

    #[error("Pixel buffer error: {0}")]
    Pixel(#[from] PixelError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Generic error: {0}")]
    Generic(String),
}

/// Frame source and camera acquisition errors
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Frame source is not live: {reason}")]
    Unavailable { reason: String },

    #[error("Access to {device} was denied")]
    PermissionDenied { device: String },

    #[error("No capture device found at {device}")]
    NoDevice { device: String },

    #[error("Frame source not supported: {reason}")]
    Unsupported { reason: String },

    #[error("Failed to read frame: {reason}")]
    FrameReadFailed { reason: String },
}

/// Pixel buffer geometry errors
#[derive(Error, Debug)]
pub enum PixelError {
    #[error("Region {width}x{height}+{x}+{y} exceeds {buffer_width}x{buffer_height} buffer")]
    InvalidRegion {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        buffer_width: u32,
        buffer_height: u32,
    },

    #[error("Invalid buffer dimensions: {details}")]
    InvalidDimensions { details: String },
}

/// Preview render errors
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Render iteration {frame} failed: {reason}")]
    IterationFailed { frame: u64, reason: String },

    #[error("Display sink rejected frame: {reason}")]
    DisplayFailed { reason: String },
}

/// Capture sequence errors
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("A capture is already in progress")]
    InProgress,

    #[error("Capture cancelled during shot {shot}")]
    Cancelled { shot: usize },
}

/// Export errors
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Image encoding failed: {reason}")]
    EncodingFailed { reason: String },

    #[error("Failed to write {path}: {reason}")]
    WriteFailed { path: String, reason: String },
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file: {path}")]
    ParseFailed { path: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

/// Convenience type alias for Results using PhotoboothError
pub type Result<T> = std::result::Result<T, PhotoboothError>;

impl PhotoboothError {
    /// Create a generic error with a custom message
    pub fn generic<S: Into<String>>(message: S) -> Self {
        Self::Generic(message.into())
    }

    /// True when the frame source stopped being live
    pub fn is_source_unavailable(&self) -> bool {
        matches!(self, Self::Source(SourceError::Unavailable { .. }))
    }

    /// Check if a user-initiated retry can succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            // The camera may come back before the next capture attempt
            Self::Source(SourceError::Unavailable { .. }) => true,
            Self::Source(SourceError::FrameReadFailed { .. }) => true,
            Self::Render(_) => true,
            Self::Capture(_) => true,
            Self::Io(_) => true,
            _ => false,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Source(SourceError::PermissionDenied { .. }) => {
                "Camera access was denied. Please allow camera access in your settings.".to_string()
            }
            Self::Source(SourceError::NoDevice { .. }) => {
                "No webcam found. Please connect a webcam and try again.".to_string()
            }
            Self::Source(SourceError::Unsupported { .. }) => {
                "This environment does not support webcam access.".to_string()
            }
            Self::Capture(CaptureError::InProgress) => {
                "A capture is already running. Please wait for it to finish.".to_string()
            }
            Self::Source(_) | Self::Capture(_) | Self::Pixel(_) => {
                "Failed to capture photo. Please check webcam and try again.".to_string()
            }
            Self::Export(_) => "Failed to display photo. Please try again.".to_string(),
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquisition_messages_are_distinct() {
        let denied = PhotoboothError::from(SourceError::PermissionDenied { device: "cam".into() });
        let missing = PhotoboothError::from(SourceError::NoDevice { device: "cam".into() });
        let unsupported = PhotoboothError::from(SourceError::Unsupported { reason: "x".into() });

        assert!(denied.user_message().contains("denied"));
        assert!(missing.user_message().contains("No webcam"));
        assert!(unsupported.user_message().contains("does not support"));
        assert_ne!(denied.user_message(), missing.user_message());
    }

    #[test]
    fn test_source_unavailable_is_recoverable() {
        let err = PhotoboothError::from(SourceError::Unavailable { reason: "track ended".into() });
        assert!(err.is_source_unavailable());
        assert!(err.is_recoverable());

        let export = PhotoboothError::from(ExportError::EncodingFailed { reason: "x".into() });
        assert!(!export.is_recoverable());
        assert_eq!(export.user_message(), "Failed to display photo. Please try again.");
    }
}
