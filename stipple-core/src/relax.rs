use crate::{
    coord::Coord,
    field::DensityField,
    polygon::ConvexPolygon,
    triangulation::Triangulation,
    voronoi::Voronoi,
    Scalar,
};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Way of integrating density over Voronoi cells.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CentroidIntegration {
    /// Scan-convert every clipped cell and sum pixels whose centres it covers.
    #[default]
    Raster,
    /// Assign every pixel to its nearest site by walking the triangulation.
    NearestSite,
}

/// Relaxation target of a single site.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CellCentroid {
    /// Density-weighted centroid of the cell.
    Weighted(Coord),
    /// Cell covers no density, geometric centroid of the cell polygon is used.
    Geometric(Coord),
    /// Cell is empty or degenerate, site stays in place.
    Unchanged(Coord),
}

impl CellCentroid {
    /// Returns target point.
    pub fn point(&self) -> Coord {
        match self {
            Self::Weighted(p) | Self::Geometric(p) | Self::Unchanged(p) => *p,
        }
    }

    /// Tells if target came from a fallback branch.
    pub fn is_fallback(&self) -> bool {
        !matches!(self, Self::Weighted(_))
    }
}

/// Number of sites that took each fallback branch during one relaxation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackCounts {
    /// Sites moved to unweighted cell centroid.
    pub geometric: usize,
    /// Sites left in place.
    pub unchanged: usize,
}

impl FallbackCounts {
    pub fn total(&self) -> usize {
        self.geometric + self.unchanged
    }
}

/// Result of single relaxation pass, one centroid per site in site order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relaxation {
    pub centroids: Vec<CellCentroid>,
}

impl Relaxation {
    /// Returns target points.
    pub fn points(&self) -> Vec<Coord> {
        self.centroids.iter().map(|c| c.point()).collect()
    }

    /// Counts fallback branches taken.
    pub fn fallbacks(&self) -> FallbackCounts {
        self.centroids
            .iter()
            .fold(FallbackCounts::default(), |mut counts, c| {
                match c {
                    CellCentroid::Weighted(_) => {}
                    CellCentroid::Geometric(_) => counts.geometric += 1,
                    CellCentroid::Unchanged(_) => counts.unchanged += 1,
                }
                counts
            })
    }
}

/// Computes density-weighted Voronoi centroids.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Relaxer {
    #[serde(default)]
    pub integration: CentroidIntegration,
}

impl Relaxer {
    pub fn new(integration: CentroidIntegration) -> Self {
        Self { integration }
    }

    /// Compute relaxation targets of all sites.
    ///
    /// # Arguments
    /// * `points` - Current sites, the same set `triangulation` was built from.
    /// * `field` - Density field; its dimensions are the bounds of every cell.
    /// * `triangulation` - Delaunay triangulation of `points`.
    ///
    /// # Returns
    /// One centroid per site, inside `[0, width] x [0, height]`.
    ///
    /// # Examples
    /// ```
    /// use stipple_core::prelude::*;
    ///
    /// let field = DensityField::uniform(4, 4, 1.0).unwrap();
    /// let points = vec![Coord::new(0.5, 3.0)];
    /// let triangulation = Triangulation::new(&points);
    /// let relaxation = Relaxer::default().relax(&points, &field, &triangulation);
    /// assert_eq!(relaxation.centroids, vec![CellCentroid::Weighted(Coord::new(2.0, 2.0))]);
    /// ```
    pub fn relax(
        &self,
        points: &[Coord],
        field: &DensityField,
        triangulation: &Triangulation,
    ) -> Relaxation {
        let width = field.width() as Scalar;
        let height = field.height() as Scalar;
        let voronoi = Voronoi::new(triangulation, width, height);
        let centroids = match self.integration {
            CentroidIntegration::Raster => into_iter!(0..points.len())
                .map(|index| match voronoi.cell(index) {
                    Some(cell) => {
                        let (mass, moment) = Self::integrate_cell(cell, field);
                        Self::resolve(points[index], cell, mass, moment, width, height)
                    }
                    None => CellCentroid::Unchanged(points[index].clamped(width, height)),
                })
                .collect::<Vec<_>>(),
            CentroidIntegration::NearestSite => {
                let sums = Self::integrate_nearest_site(field, triangulation);
                points
                    .iter()
                    .enumerate()
                    .map(|(index, point)| match (voronoi.cell(index), sums.get(index)) {
                        (Some(cell), Some((mass, moment))) => {
                            Self::resolve(*point, cell, *mass, *moment, width, height)
                        }
                        _ => CellCentroid::Unchanged(point.clamped(width, height)),
                    })
                    .collect::<Vec<_>>()
            }
        };
        Relaxation { centroids }
    }

    fn resolve(
        site: Coord,
        cell: &ConvexPolygon,
        mass: Scalar,
        moment: Coord,
        width: Scalar,
        height: Scalar,
    ) -> CellCentroid {
        if mass > 0.0 {
            CellCentroid::Weighted((moment / mass).clamped(width, height))
        } else if let Some(centroid) = cell.centroid().filter(|c| c.is_finite()) {
            CellCentroid::Geometric(centroid.clamped(width, height))
        } else {
            CellCentroid::Unchanged(site.clamped(width, height))
        }
    }

    /// Sums density and density moment of pixels whose centres lie in the cell. Cell borders
    /// are half-open so that a pixel centre on a shared border is counted once.
    fn integrate_cell(cell: &ConvexPolygon, field: &DensityField) -> (Scalar, Coord) {
        let (min, max) = match cell.bounds() {
            Some(bounds) => bounds,
            None => return (0.0, Coord::default()),
        };
        let cols = field.width() as Scalar;
        let rows = field.height() as Scalar;
        let row_from = (min.y - 0.5).floor().max(0.0) as usize;
        let row_to = (max.y - 0.5).ceil().max(0.0).min(rows - 1.0) as usize;
        let mut mass = 0.0;
        let mut moment_x = 0.0;
        let mut moment_y = 0.0;
        for row in row_from..=row_to {
            let y = row as Scalar + 0.5;
            let (left, right) = match cell.row_span(y) {
                Some(span) => span,
                None => continue,
            };
            let col_from = (left - 0.5).ceil().max(0.0) as usize;
            let col_to = (right - 0.5).ceil().max(0.0).min(cols) as usize;
            for col in col_from..col_to {
                let density = field.value(col as isize, row as isize);
                if density > 0.0 {
                    mass += density;
                    moment_x += (col as Scalar + 0.5) * density;
                    moment_y += y * density;
                }
            }
        }
        (mass, Coord::new(moment_x, moment_y))
    }

    fn integrate_nearest_site(
        field: &DensityField,
        triangulation: &Triangulation,
    ) -> Vec<(Scalar, Coord)> {
        let mut sums = vec![(0.0, Coord::default()); triangulation.len()];
        let mut hint = 0;
        for (col, row, density) in field.iter() {
            if density <= 0.0 {
                continue;
            }
            let centre = Coord::new(col as Scalar + 0.5, row as Scalar + 0.5);
            if let Some(index) = triangulation.find(centre, hint) {
                hint = index;
                let (mass, moment) = &mut sums[index];
                *mass += density;
                *moment = *moment + centre * density;
            }
        }
        sums
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn single_dark_pixel() -> DensityField {
        let mut data = vec![0.0; 16];
        data[2 * 4 + 2] = 1.0;
        DensityField::new(4, 4, data).unwrap()
    }

    fn relax_with(integration: CentroidIntegration, points: &[Coord], field: &DensityField) -> Relaxation {
        Relaxer::new(integration).relax(points, field, &Triangulation::new(points))
    }

    #[test]
    fn dark_pixel_attracts_its_owner() {
        let field = single_dark_pixel();
        let points = vec![Coord::new(0.5, 0.5), Coord::new(3.5, 3.5)];
        for integration in [CentroidIntegration::Raster, CentroidIntegration::NearestSite] {
            let relaxation = relax_with(integration, &points, &field);
            assert_eq!(
                relaxation.centroids[1],
                CellCentroid::Weighted(Coord::new(2.5, 2.5))
            );
            match relaxation.centroids[0] {
                CellCentroid::Geometric(p) => {
                    assert_relative_eq!(p.x, 4.0 / 3.0, epsilon = 1e-9);
                    assert_relative_eq!(p.y, 4.0 / 3.0, epsilon = 1e-9);
                }
                other => panic!("unexpected centroid: {:?}", other),
            }
            assert_eq!(
                relaxation.fallbacks(),
                FallbackCounts {
                    geometric: 1,
                    unchanged: 0
                }
            );
        }
    }

    #[test]
    fn empty_cell_keeps_site() {
        let centroid = Relaxer::resolve(
            Coord::new(5.0, -1.0),
            &ConvexPolygon::default(),
            0.0,
            Coord::default(),
            4.0,
            4.0,
        );
        assert_eq!(centroid, CellCentroid::Unchanged(Coord::new(4.0, 0.0)));
        assert!(centroid.is_fallback());
    }

    #[test]
    fn pixel_on_shared_border_is_counted_once() {
        let field = DensityField::uniform(4, 1, 1.0).unwrap();
        let points = vec![Coord::new(1.5, 0.5), Coord::new(3.5, 0.5)];
        let relaxation = relax_with(CentroidIntegration::Raster, &points, &field);
        assert_eq!(
            relaxation.points(),
            vec![Coord::new(1.0, 0.5), Coord::new(3.0, 0.5)]
        );
    }

    #[test]
    fn integration_modes_agree() {
        let width = 40;
        let height = 30;
        let data = (0..width * height)
            .map(|i| ((i % width) as Scalar / width as Scalar).powi(2))
            .collect::<Vec<_>>();
        let field = DensityField::new(width, height, data).unwrap();
        let points = (0..25)
            .map(|i| {
                let i = i as Scalar;
                Coord::new(
                    ((i * 0.618_034 + 0.1).fract()) * 40.0,
                    ((i * 0.414_214 + 0.3).fract()) * 30.0,
                )
            })
            .collect::<Vec<_>>();
        let raster = relax_with(CentroidIntegration::Raster, &points, &field);
        let nearest = relax_with(CentroidIntegration::NearestSite, &points, &field);
        assert_eq!(raster.centroids.len(), points.len());
        for (a, b) in raster.points().iter().zip(nearest.points().iter()) {
            assert_relative_eq!(a.x, b.x, epsilon = 1e-6);
            assert_relative_eq!(a.y, b.y, epsilon = 1e-6);
            assert!(a.x >= 0.0 && a.x <= 40.0 && a.y >= 0.0 && a.y <= 30.0);
        }
    }
}
