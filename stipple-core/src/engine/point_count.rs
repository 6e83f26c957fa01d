use crate::{error::ConfigurationError, Scalar};
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    num::{ParseFloatError, ParseIntError},
    str::FromStr,
};
use thiserror::Error;

/// Suffix marking area per stipple in textual form, e.g. `40px`.
pub const TARGET_AREA_SUFFIX: &str = "px";

/// Number of stipples to place.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PointCount {
    /// Exact number of stipples.
    Fixed(usize),
    /// Image area (in square pixels) covered by one stipple; count is `round(width * height / area)`.
    TargetArea(Scalar),
}

impl Default for PointCount {
    fn default() -> Self {
        Self::TargetArea(40.0)
    }
}

impl PointCount {
    /// Resolve number of stipples for given image size.
    ///
    /// # Arguments
    /// * `width` - Image width.
    /// * `height` - Image height.
    ///
    /// # Returns
    /// Stipples count (at least 1) or configuration error.
    ///
    /// # Examples
    /// ```
    /// use stipple_core::prelude::*;
    ///
    /// assert_eq!(PointCount::TargetArea(40.0).resolve(200, 100), Ok(500));
    /// assert_eq!(PointCount::Fixed(7).resolve(200, 100), Ok(7));
    /// assert!(PointCount::Fixed(0).resolve(200, 100).is_err());
    /// ```
    pub fn resolve(&self, width: usize, height: usize) -> Result<usize, ConfigurationError> {
        match *self {
            Self::Fixed(0) => Err(ConfigurationError::ZeroPointCount),
            Self::Fixed(count) => Ok(count),
            Self::TargetArea(area) if !area.is_finite() || area <= 0.0 => {
                Err(ConfigurationError::InvalidTargetArea(area))
            }
            Self::TargetArea(area) => {
                let count = ((width * height) as Scalar / area).round();
                if count < 1.0 {
                    Err(ConfigurationError::ZeroPointCount)
                } else {
                    Ok(count as usize)
                }
            }
        }
    }
}

impl From<usize> for PointCount {
    fn from(value: usize) -> Self {
        Self::Fixed(value)
    }
}

impl From<Scalar> for PointCount {
    fn from(value: Scalar) -> Self {
        Self::TargetArea(value)
    }
}

/// Error of parsing [`PointCount`] from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PointCountParseError {
    #[error("invalid stipple count: {0}")]
    Count(#[from] ParseIntError),
    #[error("invalid area per stipple: {0}")]
    Area(#[from] ParseFloatError),
}

impl FromStr for PointCount {
    type Err = PointCountParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(area) = s.strip_suffix(TARGET_AREA_SUFFIX) {
            Ok(Self::TargetArea(area.trim().parse::<Scalar>()?))
        } else {
            Ok(Self::Fixed(s.parse::<usize>()?))
        }
    }
}

impl fmt::Display for PointCount {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Fixed(count) => write!(f, "{}", count),
            Self::TargetArea(area) => write!(f, "{}{}", area, TARGET_AREA_SUFFIX),
        }
    }
}
