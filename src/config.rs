//! Overlay configuration parsed from environment variables.

use std::path::PathBuf;

use crate::consts::{COMMENT_ICON_OVERLAP_PX, ICON_SIZE_PX, MIN_MARKER_EXTENT_PX, PADDING_COMPENSATION_PX};
use crate::error::ConfigError;

pub const ICON_SIZE_VAR: &str = "OVERLAY_ICON_SIZE";
pub const PADDING_COMPENSATION_VAR: &str = "OVERLAY_PADDING_COMPENSATION";
pub const ICON_OVERLAP_VAR: &str = "OVERLAY_ICON_OVERLAP";
pub const MIN_EXTENT_VAR: &str = "OVERLAY_MIN_EXTENT";
pub const FIXTURE_VAR: &str = "OVERLAY_FIXTURE";

/// Marker sizing used by the position resolver. All values are CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerGeometry {
    pub icon_size: f64,
    pub padding_compensation: f64,
    pub icon_overlap: f64,
    pub min_extent: f64,
}

impl Default for MarkerGeometry {
    fn default() -> Self {
        Self {
            icon_size: ICON_SIZE_PX,
            padding_compensation: PADDING_COMPENSATION_PX,
            icon_overlap: COMMENT_ICON_OVERLAP_PX,
            min_extent: MIN_MARKER_EXTENT_PX,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct OverlayConfig {
    pub geometry: MarkerGeometry,
    /// JSON file of comment records for the demo binary.
    pub fixture: Option<PathBuf>,
}

impl OverlayConfig {
    /// Build typed config from environment variables.
    ///
    /// Optional:
    /// - `OVERLAY_ICON_SIZE`: default 24
    /// - `OVERLAY_PADDING_COMPENSATION`: default 3
    /// - `OVERLAY_ICON_OVERLAP`: default 4
    /// - `OVERLAY_MIN_EXTENT`: default 1
    /// - `OVERLAY_FIXTURE`: path to a JSON array of comment records
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if a numeric variable is set but malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if a numeric value is malformed or out of range.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = MarkerGeometry::default();
        let geometry = MarkerGeometry {
            icon_size: parse_extent(&lookup, ICON_SIZE_VAR, defaults.icon_size)?,
            padding_compensation: parse_extent(&lookup, PADDING_COMPENSATION_VAR, defaults.padding_compensation)?,
            icon_overlap: parse_extent(&lookup, ICON_OVERLAP_VAR, defaults.icon_overlap)?,
            min_extent: parse_extent(&lookup, MIN_EXTENT_VAR, defaults.min_extent)?,
        };
        let fixture = lookup(FIXTURE_VAR)
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self { geometry, fixture })
    }
}

fn parse_extent(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: f64) -> Result<f64, ConfigError> {
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };
    let value = raw
        .trim()
        .parse::<f64>()
        .map_err(|_| ConfigError::InvalidNumber { var: key.to_owned(), value: raw.clone() })?;
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::OutOfRange { var: key.to_owned(), value: raw });
    }
    Ok(value)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
