pub mod render;
pub mod settings;

use crate::settings::{GenerateDensityImageSettings, ImageDensitySource};
use image::{imageops::FilterType, DynamicImage, GenericImageView, GrayImage};
use tracing::debug;
use stipple_core::prelude::{DensityField, DensityFieldError, PixelLayout, Scalar};

/// Generate density field preview: dense pixels are dark.
///
/// # Arguments
/// * `image` - Input image to process.
/// * `settings` - Image processing settings.
///
/// # Returns
/// Grayscale image or error.
pub fn generate_density_image(
    image: DynamicImage,
    settings: &GenerateDensityImageSettings,
) -> Result<DynamicImage, DensityFieldError> {
    let field = generate_density_field_from_image(image, settings)?;
    Ok(DynamicImage::ImageLuma8(density_field_to_image(&field)))
}

/// Convert density field to grayscale image, density 1 becomes black.
pub fn density_field_to_image(field: &DensityField) -> GrayImage {
    GrayImage::from_fn(field.width() as u32, field.height() as u32, |x, y| {
        let density = field.value(x as isize, y as isize);
        [((1.0 - density) * 255.0).round() as u8].into()
    })
}

/// Generate density field from image.
///
/// # Arguments
/// * `image` - Input image to process.
/// * `settings` - Image processing settings.
///
/// # Returns
/// Density field or error.
///
/// # Examples
/// ```
/// use image::{DynamicImage, GrayImage};
/// use stipple_image::{generate_density_field_from_image, settings::GenerateDensityImageSettings};
///
/// let image = DynamicImage::ImageLuma8(GrayImage::from_raw(2, 1, vec![0, 255]).unwrap());
/// let field = generate_density_field_from_image(image, &Default::default()).unwrap();
/// assert_eq!(field.values(), &[1.0, 0.0]);
/// ```
pub fn generate_density_field_from_image(
    image: DynamicImage,
    settings: &GenerateDensityImageSettings,
) -> Result<DensityField, DensityFieldError> {
    let scale = settings.scale.max(1);
    let image = if scale > 1 {
        image.resize_exact(
            (image.width() / scale as u32).max(1),
            (image.height() / scale as u32).max(1),
            FilterType::Lanczos3,
        )
    } else {
        image
    };
    let width = image.width() as usize;
    let height = image.height() as usize;
    debug!(
        "extracting {:?} density from {}x{} image",
        settings.density_source, width, height
    );
    let field = match settings.density_source {
        ImageDensitySource::Luma => {
            DensityField::from_pixels(image.to_rgba8().as_raw(), width, height, PixelLayout::Rgba)?
        }
        ImageDensitySource::LumaAlpha => {
            let data = image
                .to_luma_alpha8()
                .into_raw()
                .chunks(2)
                .map(|c| (1.0 - c[0] as Scalar / 255.0) * (c[1] as Scalar / 255.0))
                .collect::<Vec<_>>();
            DensityField::new(width, height, data)?
        }
        ImageDensitySource::Red => channel_darkness(&image, 0, width, height)?,
        ImageDensitySource::Green => channel_darkness(&image, 1, width, height)?,
        ImageDensitySource::Blue => channel_darkness(&image, 2, width, height)?,
        ImageDensitySource::Alpha => {
            let data = image
                .to_rgba8()
                .into_raw()
                .chunks(4)
                .map(|c| c[3] as Scalar / 255.0)
                .collect::<Vec<_>>();
            DensityField::new(width, height, data)?
        }
    };
    if settings.invert {
        let data = field.values().iter().map(|v| 1.0 - v).collect::<Vec<_>>();
        DensityField::new(width, height, data)
    } else {
        Ok(field)
    }
}

fn channel_darkness(
    image: &DynamicImage,
    channel: usize,
    width: usize,
    height: usize,
) -> Result<DensityField, DensityFieldError> {
    let data = image
        .to_rgba8()
        .into_raw()
        .chunks(4)
        .map(|c| 1.0 - c[channel] as Scalar / 255.0)
        .collect::<Vec<_>>();
    DensityField::new(width, height, data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn sample() -> DynamicImage {
        let mut image = RgbaImage::new(2, 2);
        image.put_pixel(0, 0, Rgba([0, 0, 0, 255]));
        image.put_pixel(1, 0, Rgba([255, 0, 0, 255]));
        image.put_pixel(0, 1, Rgba([0, 0, 0, 0]));
        image.put_pixel(1, 1, Rgba([255, 255, 255, 255]));
        DynamicImage::ImageRgba8(image)
    }

    fn extract(source: ImageDensitySource, invert: bool) -> Vec<Scalar> {
        let settings = GenerateDensityImageSettings {
            density_source: source,
            invert,
            ..Default::default()
        };
        generate_density_field_from_image(sample(), &settings)
            .unwrap()
            .values()
            .to_vec()
    }

    #[test]
    fn luma_composites_over_white() {
        let values = extract(ImageDensitySource::Luma, false);
        assert_eq!(values[0], 1.0);
        assert!((values[1] - (1.0 - 0.299)).abs() < 1e-9);
        assert_eq!(values[2], 0.0);
        assert_eq!(values[3], 0.0);
    }

    #[test]
    fn channels() {
        assert_eq!(extract(ImageDensitySource::Red, false), vec![1.0, 0.0, 1.0, 0.0]);
        assert_eq!(extract(ImageDensitySource::Alpha, false), vec![1.0, 1.0, 0.0, 1.0]);
        assert_eq!(extract(ImageDensitySource::Alpha, true), vec![0.0, 0.0, 1.0, 0.0]);
        assert_eq!(extract(ImageDensitySource::LumaAlpha, false)[2], 0.0);
    }

    #[test]
    fn scale_shrinks_field() {
        let image = DynamicImage::new_rgba8(20, 10);
        let settings = GenerateDensityImageSettings {
            scale: 4,
            ..Default::default()
        };
        let field = generate_density_field_from_image(image, &settings).unwrap();
        assert_eq!((field.width(), field.height()), (5, 2));
    }

    #[test]
    fn preview_is_dark_where_dense() {
        let field = DensityField::new(2, 1, vec![1.0, 0.0]).unwrap();
        let image = density_field_to_image(&field);
        assert_eq!(image.as_raw(), &vec![0, 255]);
    }
}
