use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::{
    error::{ConfigError, PhotoboothError, Result},
    frame::{PixelBuffer, Region},
};

/// Core trait that all pixel filters implement
pub trait Kernel: Send + Sync {
    /// Returns the unique name of this filter
    fn name(&self) -> &str;

    /// Returns a human-readable description of this filter
    fn description(&self) -> &str;

    /// Transform every pixel of `region` in place
    ///
    /// The alpha channel is left untouched and every written channel is
    /// clamped to 0-255.
    fn apply(&self, buffer: &mut PixelBuffer, region: Region) -> Result<()>;
}

/// The single filter currently selected by the user
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterSelection {
    #[default]
    None,
    Grayscale,
    Sepia,
    Bright,
    Dark,
    Contrast,
    Blur,
}

impl FilterSelection {
    pub const ALL: [FilterSelection; 7] = [
        FilterSelection::None,
        FilterSelection::Grayscale,
        FilterSelection::Sepia,
        FilterSelection::Bright,
        FilterSelection::Dark,
        FilterSelection::Contrast,
        FilterSelection::Blur,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterSelection::None => "none",
            FilterSelection::Grayscale => "grayscale",
            FilterSelection::Sepia => "sepia",
            FilterSelection::Bright => "bright",
            FilterSelection::Dark => "dark",
            FilterSelection::Contrast => "contrast",
            FilterSelection::Blur => "blur",
        }
    }

    pub fn is_none(&self) -> bool {
        *self == FilterSelection::None
    }
}

impl std::fmt::Display for FilterSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterSelection {
    type Err = PhotoboothError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|filter| filter.as_str() == wanted)
            .ok_or_else(|| {
                ConfigError::InvalidValue {
                    key: "filter".to_string(),
                    value: s.to_string(),
                }
                .into()
            })
    }
}

/// Store a float channel the way an 8-bit canvas does: round half to even, then clamp
#[inline]
pub(crate) fn clamp_channel(value: f64) -> u8 {
    value.round_ties_even().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_names_roundtrip() {
        for filter in FilterSelection::ALL {
            assert_eq!(filter.as_str().parse::<FilterSelection>().unwrap(), filter);
        }
        assert_eq!(" Sepia ".parse::<FilterSelection>().unwrap(), FilterSelection::Sepia);
        assert!("vhs".parse::<FilterSelection>().is_err());
    }

    #[test]
    fn test_clamp_channel() {
        assert_eq!(clamp_channel(-12.0), 0);
        assert_eq!(clamp_channel(300.0), 255);
        assert_eq!(clamp_channel(128.5), 128);
        assert_eq!(clamp_channel(129.5), 130);
        assert_eq!(clamp_channel(63.6), 64);
    }
}
