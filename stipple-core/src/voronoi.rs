use crate::{
    coord::Coord,
    polygon::ConvexPolygon,
    triangulation::Triangulation,
    Scalar,
};
#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Voronoi diagram dual to a triangulation, every cell clipped to `[0, width] x [0, height]`.
///
/// Cells are built by clipping the bounding rectangle with the perpendicular bisector of each
/// Delaunay edge leaving the site, so together they partition the rectangle.
#[derive(Debug, Clone, PartialEq)]
pub struct Voronoi {
    width: Scalar,
    height: Scalar,
    cells: Vec<ConvexPolygon>,
}

impl Voronoi {
    /// Create Voronoi diagram.
    ///
    /// # Arguments
    /// * `triangulation` - Delaunay triangulation of the sites.
    /// * `width` - Bounds width.
    /// * `height` - Bounds height.
    ///
    /// # Examples
    /// ```
    /// use stipple_core::prelude::*;
    ///
    /// let triangulation = Triangulation::new(&[Coord::new(1.0, 1.0), Coord::new(3.0, 1.0)]);
    /// let voronoi = Voronoi::new(&triangulation, 4.0, 2.0);
    /// assert_eq!(voronoi.cell(0).unwrap().signed_area(), 4.0);
    /// assert!(voronoi.contains(1, Coord::new(2.5, 0.5)));
    /// ```
    pub fn new(triangulation: &Triangulation, width: Scalar, height: Scalar) -> Self {
        let cells = into_iter!(0..triangulation.len())
            .map(|index| Self::build_cell(triangulation, index, width, height))
            .collect::<Vec<_>>();
        Self {
            width,
            height,
            cells,
        }
    }

    pub fn width(&self) -> Scalar {
        self.width
    }

    pub fn height(&self) -> Scalar {
        self.height
    }

    /// Returns number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Returns clipped cell of given site. Sites left out of the triangulation get an empty
    /// polygon.
    pub fn cell(&self, index: usize) -> Option<&ConvexPolygon> {
        self.cells.get(index)
    }

    /// Returns all cells in site order.
    pub fn cells(&self) -> &[ConvexPolygon] {
        &self.cells
    }

    /// Tells if point lies inside (or on the border of) given site's cell.
    ///
    /// # Arguments
    /// * `index` - Site index.
    /// * `point` - Tested point.
    pub fn contains(&self, index: usize, point: Coord) -> bool {
        self.cells
            .get(index)
            .map(|cell| cell.contains(point))
            .unwrap_or(false)
    }

    fn build_cell(
        triangulation: &Triangulation,
        index: usize,
        width: Scalar,
        height: Scalar,
    ) -> ConvexPolygon {
        if triangulation.is_isolated(index) {
            return ConvexPolygon::default();
        }
        let points = triangulation.points();
        let site = points[index];
        let mut cell = ConvexPolygon::rectangle(width, height);
        for neighbor in triangulation.neighbors(index) {
            if cell.is_empty() {
                break;
            }
            let other = points[neighbor];
            let normal = other - site;
            let offset = (other.sqr_magnitude() - site.sqr_magnitude()) * 0.5;
            cell = cell.clip(normal, offset);
        }
        cell
    }
}
