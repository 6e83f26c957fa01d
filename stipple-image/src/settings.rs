use serde::{Deserialize, Serialize};
use stipple_core::Scalar;

/// Source image channel that becomes stipple density (dark or opaque means dense).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageDensitySource {
    /// Darkness of Rec.601 luma, composited over white.
    #[default]
    Luma,
    /// Darkness of luma weighted by opacity, so transparent pixels stay empty even when dark.
    LumaAlpha,
    /// Darkness of the red channel.
    Red,
    /// Darkness of the green channel.
    Green,
    /// Darkness of the blue channel.
    Blue,
    /// Opacity.
    Alpha,
}

/// Settings of density field extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateDensityImageSettings {
    /// Image density source.
    #[serde(default)]
    pub density_source: ImageDensitySource,
    /// Scale of the image (image is rescaled to: original size / scale).
    #[serde(default = "GenerateDensityImageSettings::default_scale")]
    pub scale: usize,
    /// Swap dense and empty regions.
    #[serde(default)]
    pub invert: bool,
}

impl Default for GenerateDensityImageSettings {
    fn default() -> Self {
        Self {
            density_source: ImageDensitySource::default(),
            scale: Self::default_scale(),
            invert: false,
        }
    }
}

impl GenerateDensityImageSettings {
    fn default_scale() -> usize {
        1
    }
}

/// Settings of stipples rasterization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderSettings {
    /// Stipple radius in output pixels.
    #[serde(default = "RenderSettings::default_radius")]
    pub radius: Scalar,
    /// Output pixels per density field pixel.
    #[serde(default = "RenderSettings::default_scale")]
    pub scale: Scalar,
    /// Draw Voronoi cell outlines below stipples.
    #[serde(default)]
    pub cells: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            radius: Self::default_radius(),
            scale: Self::default_scale(),
            cells: false,
        }
    }
}

impl RenderSettings {
    fn default_radius() -> Scalar {
        1.5
    }

    fn default_scale() -> Scalar {
        1.0
    }
}
