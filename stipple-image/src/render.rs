use crate::settings::RenderSettings;
use image::{GrayImage, Luma};
use stipple_core::prelude::{Coord, Scalar, Voronoi};

const PAPER: Luma<u8> = Luma([255]);
const INK: Luma<u8> = Luma([0]);
const OUTLINE: Luma<u8> = Luma([200]);

/// Rasterize stipples as filled black circles on white paper.
///
/// # Arguments
/// * `width` - Density field width.
/// * `height` - Density field height.
/// * `points` - Stipples in density field space.
/// * `voronoi` - Cells drawn as outlines when `settings.cells` is set.
/// * `settings` - Render settings.
///
/// # Returns
/// Image of size `width * scale` by `height * scale`.
pub fn render_stipples(
    width: usize,
    height: usize,
    points: &[Coord],
    voronoi: Option<&Voronoi>,
    settings: &RenderSettings,
) -> GrayImage {
    let scale = if settings.scale > 0.0 { settings.scale } else { 1.0 };
    let image_width = ((width as Scalar * scale).ceil() as u32).max(1);
    let image_height = ((height as Scalar * scale).ceil() as u32).max(1);
    let mut image = GrayImage::from_pixel(image_width, image_height, PAPER);
    if settings.cells {
        if let Some(voronoi) = voronoi {
            for cell in voronoi.cells() {
                for (from, to) in cell.edges() {
                    draw_line(&mut image, from * scale, to * scale, OUTLINE);
                }
            }
        }
    }
    for point in points {
        draw_disc(&mut image, *point * scale, settings.radius, INK);
    }
    image
}

fn put_pixel(image: &mut GrayImage, x: isize, y: isize, color: Luma<u8>) {
    if x >= 0 && x < image.width() as isize && y >= 0 && y < image.height() as isize {
        image.put_pixel(x as u32, y as u32, color);
    }
}

fn draw_disc(image: &mut GrayImage, centre: Coord, radius: Scalar, color: Luma<u8>) {
    put_pixel(image, centre.x.floor() as isize, centre.y.floor() as isize, color);
    if radius <= 0.0 {
        return;
    }
    let radius_sqr = radius * radius;
    let fx = (centre.x - radius).floor() as isize;
    let tx = (centre.x + radius).ceil() as isize;
    let fy = (centre.y - radius).floor() as isize;
    let ty = (centre.y + radius).ceil() as isize;
    for y in fy..=ty {
        for x in fx..=tx {
            let pixel = Coord::new(x as Scalar + 0.5, y as Scalar + 0.5);
            if pixel.sqr_distance(centre) <= radius_sqr {
                put_pixel(image, x, y, color);
            }
        }
    }
}

fn draw_line(image: &mut GrayImage, from: Coord, to: Coord, color: Luma<u8>) {
    let fx = from.x as isize;
    let fy = from.y as isize;
    let tx = to.x as isize;
    let ty = to.y as isize;
    let dx = tx - fx;
    let dy = ty - fy;
    if dx == 0 && dy == 0 {
        put_pixel(image, fx, fy, color);
        return;
    }
    let steps = dx.abs().max(dy.abs());
    for step in 0..=steps {
        let f = step as Scalar / steps as Scalar;
        let x = fx + (dx as Scalar * f).round() as isize;
        let y = fy + (dy as Scalar * f).round() as isize;
        put_pixel(image, x, y, color);
    }
}
