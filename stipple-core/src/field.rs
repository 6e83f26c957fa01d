use crate::{coord::Coord, Scalar};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rec.601 luma weight of the red channel.
pub const LUMA_RED: Scalar = 0.299;
/// Rec.601 luma weight of the green channel.
pub const LUMA_GREEN: Scalar = 0.587;
/// Rec.601 luma weight of the blue channel.
pub const LUMA_BLUE: Scalar = 0.114;

/// Error thrown during density field creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DensityFieldError {
    /// Wrong data length.
    /// (provided, expected)
    #[error("wrong data length: got {0} samples, expected {1}")]
    WrongDataLength(usize, usize),
    /// Width or height is zero.
    /// (width, height)
    #[error("density field dimensions must be non-zero, got {0}x{1}")]
    ZeroDimensions(usize, usize),
}

/// Memory layout of raw source pixels.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PixelLayout {
    /// One luminance byte per pixel.
    Luma,
    /// Luminance and alpha bytes.
    LumaAlpha,
    /// Red, green and blue bytes.
    Rgb,
    /// Red, green, blue and alpha bytes.
    #[default]
    Rgba,
}

impl PixelLayout {
    /// Number of bytes per pixel.
    pub fn channels(self) -> usize {
        match self {
            Self::Luma => 1,
            Self::LumaAlpha => 2,
            Self::Rgb => 3,
            Self::Rgba => 4,
        }
    }

    /// Luminance in `[0, 255]` of single pixel, composited over white when alpha is present.
    ///
    /// # Arguments
    /// * `pixel` - Pixel bytes, exactly `channels()` long.
    pub fn luminance(self, pixel: &[u8]) -> Scalar {
        let (luma, alpha) = match self {
            Self::Luma => (pixel[0] as Scalar, 255.0),
            Self::LumaAlpha => (pixel[0] as Scalar, pixel[1] as Scalar),
            Self::Rgb => (Self::luma(pixel[0], pixel[1], pixel[2]), 255.0),
            Self::Rgba => (Self::luma(pixel[0], pixel[1], pixel[2]), pixel[3] as Scalar),
        };
        let alpha = alpha / 255.0;
        luma * alpha + 255.0 * (1.0 - alpha)
    }

    #[inline]
    fn luma(r: u8, g: u8, b: u8) -> Scalar {
        LUMA_RED * r as Scalar + LUMA_GREEN * g as Scalar + LUMA_BLUE * b as Scalar
    }
}

/// Density field: one weight in `[0, 1]` per source pixel, where 0 is white (no weight)
/// and 1 is black (full weight).
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct DensityField {
    width: usize,
    height: usize,
    data: Vec<Scalar>,
}

impl DensityField {
    /// Create new density field from density values. Values are clamped into `[0, 1]` and
    /// non-finite values become 0.
    ///
    /// # Arguments
    /// * `width` - Columns.
    /// * `height` - Rows.
    /// * `data` - Row-major densities.
    ///
    /// # Returns
    /// Density field or error.
    ///
    /// # Examples
    /// ```
    /// use stipple_core::prelude::*;
    ///
    /// assert!(DensityField::new(2, 2, vec![0.0, 0.25, 0.5, 1.0]).is_ok());
    /// assert_eq!(
    ///     DensityField::new(1, 2, vec![0.0, 0.25, 0.5, 1.0]),
    ///     Err(DensityFieldError::WrongDataLength(4, 2)),
    /// );
    /// ```
    pub fn new(width: usize, height: usize, data: Vec<Scalar>) -> Result<Self, DensityFieldError> {
        if width == 0 || height == 0 {
            return Err(DensityFieldError::ZeroDimensions(width, height));
        }
        if data.len() != width * height {
            return Err(DensityFieldError::WrongDataLength(data.len(), width * height));
        }
        let data = data
            .into_iter()
            .map(|v| if v.is_finite() { v.max(0.0).min(1.0) } else { 0.0 })
            .collect::<Vec<_>>();
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Create new density field from raw image pixels using `max(0, 1 - luminance / 255)`.
    ///
    /// # Arguments
    /// * `pixels` - Raw pixel bytes, `width * height * layout.channels()` long.
    /// * `width` - Columns.
    /// * `height` - Rows.
    /// * `layout` - Pixel memory layout.
    ///
    /// # Returns
    /// Density field or error.
    ///
    /// # Examples
    /// ```
    /// use stipple_core::prelude::*;
    ///
    /// let field = DensityField::from_pixels(&[0, 255, 255, 0], 2, 2, PixelLayout::Luma).unwrap();
    /// assert_eq!(field.values(), &[1.0, 0.0, 0.0, 1.0]);
    /// ```
    pub fn from_pixels(
        pixels: &[u8],
        width: usize,
        height: usize,
        layout: PixelLayout,
    ) -> Result<Self, DensityFieldError> {
        if width == 0 || height == 0 {
            return Err(DensityFieldError::ZeroDimensions(width, height));
        }
        let channels = layout.channels();
        let expected = width * height * channels;
        if pixels.len() != expected {
            return Err(DensityFieldError::WrongDataLength(pixels.len(), expected));
        }
        let data = pixels
            .chunks_exact(channels)
            .map(|pixel| (1.0 - layout.luminance(pixel) / 255.0).max(0.0))
            .collect::<Vec<_>>();
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Create density field filled with one value.
    ///
    /// # Arguments
    /// * `width` - Columns.
    /// * `height` - Rows.
    /// * `value` - Density of every pixel.
    pub fn uniform(width: usize, height: usize, value: Scalar) -> Result<Self, DensityFieldError> {
        Self::new(width, height, vec![value; width * height])
    }

    /// Returns width.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns height.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns values buffer.
    pub fn values(&self) -> &[Scalar] {
        &self.data
    }

    /// Returns sum of all densities.
    pub fn total(&self) -> Scalar {
        self.data.iter().sum()
    }

    /// Tells if every pixel has zero density.
    pub fn is_blank(&self) -> bool {
        self.data.iter().all(|v| *v <= 0.0)
    }

    /// Returns value at given pixel or 0 if out of bounds.
    ///
    /// # Arguments
    /// * `col` - Column.
    /// * `row` - Row.
    #[inline]
    pub fn value(&self, col: isize, row: isize) -> Scalar {
        if col >= 0 && col < self.width as isize && row >= 0 && row < self.height as isize {
            self.data[row as usize * self.width + col as usize]
        } else {
            0.0
        }
    }

    /// Returns value of the pixel that contains given point or 0 if out of bounds.
    ///
    /// # Arguments
    /// * `point` - Point in pixel space.
    #[inline]
    pub fn value_at_point(&self, point: Coord) -> Scalar {
        self.value(point.x.floor() as isize, point.y.floor() as isize)
    }

    /// Iterator over `(col, row, value)` of every pixel.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, Scalar)> + '_ {
        self.data
            .iter()
            .enumerate()
            .map(move |(i, v)| (i % self.width, i / self.width, *v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn rgba_uses_rec601_luma() {
        let field = DensityField::from_pixels(&[255, 0, 0, 255], 1, 1, PixelLayout::Rgba).unwrap();
        assert_relative_eq!(field.values()[0], 1.0 - LUMA_RED, epsilon = 1e-12);
    }

    #[test]
    fn transparent_pixels_are_white() {
        let field =
            DensityField::from_pixels(&[0, 0, 0, 0, 0, 0, 0, 255], 2, 1, PixelLayout::Rgba)
                .unwrap();
        assert_eq!(field.values(), &[0.0, 1.0]);
        let field = DensityField::from_pixels(&[0, 51], 1, 1, PixelLayout::LumaAlpha).unwrap();
        assert_relative_eq!(field.values()[0], 0.2, epsilon = 1e-12);
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(
            DensityField::from_pixels(&[0; 5], 1, 2, PixelLayout::Rgb),
            Err(DensityFieldError::WrongDataLength(5, 6))
        );
        assert_eq!(
            DensityField::new(0, 3, vec![]),
            Err(DensityFieldError::ZeroDimensions(0, 3))
        );
    }

    #[test]
    fn values_are_clamped() {
        let field = DensityField::new(3, 1, vec![-1.0, 2.0, Scalar::NAN]).unwrap();
        assert_eq!(field.values(), &[0.0, 1.0, 0.0]);
    }

    #[test]
    fn point_queries() {
        let field = DensityField::new(2, 2, vec![0.1, 0.2, 0.3, 0.4]).unwrap();
        assert_eq!(field.value(1, 1), 0.4);
        assert_eq!(field.value(2, 0), 0.0);
        assert_eq!(field.value(-1, 0), 0.0);
        assert_eq!(field.value_at_point(Coord::new(1.9, 0.2)), 0.2);
        assert_relative_eq!(field.total(), 1.0, epsilon = 1e-12);
        assert!(!field.is_blank());
        assert!(DensityField::uniform(4, 4, 0.0).unwrap().is_blank());
    }
}
