use crate::{coord::Coord, Scalar};
use serde::{Deserialize, Serialize};

/// Convex polygon with counter-clockwise vertices (in a Y-up frame).
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvexPolygon(pub Vec<Coord>);

impl ConvexPolygon {
    /// Create axis-aligned rectangle `[0, width] x [0, height]`.
    ///
    /// # Arguments
    /// * `width` - Rectangle width.
    /// * `height` - Rectangle height.
    pub fn rectangle(width: Scalar, height: Scalar) -> Self {
        Self(vec![
            Coord::new(0.0, 0.0),
            Coord::new(width, 0.0),
            Coord::new(width, height),
            Coord::new(0.0, height),
        ])
    }

    /// Returns vertices.
    pub fn vertices(&self) -> &[Coord] {
        &self.0
    }

    /// Tells if polygon has no vertices left.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterator over edges as `(from, to)` pairs, closing edge included.
    pub fn edges(&self) -> impl Iterator<Item = (Coord, Coord)> + '_ {
        let count = self.0.len();
        (0..count).map(move |i| (self.0[i], self.0[(i + 1) % count]))
    }

    /// Signed area (positive for counter-clockwise winding).
    pub fn signed_area(&self) -> Scalar {
        let origin = match self.0.first() {
            Some(origin) => *origin,
            None => return 0.0,
        };
        self.edges()
            .map(|(a, b)| (a - origin).cross(b - origin))
            .sum::<Scalar>()
            * 0.5
    }

    /// Unweighted geometric centroid. Polygons without area yield the average of their
    /// vertices, empty polygons yield `None`.
    ///
    /// # Examples
    /// ```
    /// use stipple_core::prelude::*;
    ///
    /// let square = ConvexPolygon::rectangle(2.0, 4.0);
    /// assert_eq!(square.centroid(), Some(Coord::new(1.0, 2.0)));
    /// assert_eq!(ConvexPolygon::default().centroid(), None);
    /// ```
    pub fn centroid(&self) -> Option<Coord> {
        let origin = *self.0.first()?;
        let mut area = 0.0;
        let mut sum = Coord::default();
        for (a, b) in self.edges() {
            let a = a - origin;
            let b = b - origin;
            let cross = a.cross(b);
            area += cross;
            sum = sum + (a + b) * cross;
        }
        if area.abs() > Scalar::EPSILON {
            Some(origin + sum / (3.0 * area))
        } else {
            let count = self.0.len() as Scalar;
            let sum = self.0.iter().fold(Coord::default(), |acc, v| acc + *v);
            Some(sum / count)
        }
    }

    /// Clip polygon by half-plane `normal . p <= offset` (single Sutherland-Hodgman pass).
    ///
    /// # Arguments
    /// * `normal` - Half-plane normal pointing outside of the kept region.
    /// * `offset` - Half-plane offset.
    ///
    /// # Returns
    /// Clipped polygon, possibly empty.
    pub fn clip(&self, normal: Coord, offset: Scalar) -> Self {
        let mut result = Vec::with_capacity(self.0.len() + 1);
        for (a, b) in self.edges() {
            let da = normal.dot(a) - offset;
            let db = normal.dot(b) - offset;
            if da <= 0.0 {
                Self::push_unique(&mut result, a);
            }
            if (da < 0.0 && db > 0.0) || (da > 0.0 && db < 0.0) {
                let factor = da / (da - db);
                Self::push_unique(&mut result, a + (b - a) * factor);
            }
        }
        if result.len() > 1 && result.first() == result.last() {
            result.pop();
        }
        if result.len() < 3 {
            result.clear();
        }
        Self(result)
    }

    /// Tells if point lies inside or on the border of the polygon.
    ///
    /// # Arguments
    /// * `point` - Tested point.
    pub fn contains(&self, point: Coord) -> bool {
        if self.0.len() < 3 {
            return false;
        }
        let winding = self.signed_area().signum();
        self.edges()
            .all(|(a, b)| (b - a).cross(point - a) * winding >= 0.0)
    }

    /// Returns `(min, max)` corners of the bounding box.
    pub fn bounds(&self) -> Option<(Coord, Coord)> {
        let first = *self.0.first()?;
        Some(self.0.iter().fold((first, first), |(min, max), v| {
            (
                Coord::new(min.x.min(v.x), min.y.min(v.y)),
                Coord::new(max.x.max(v.x), max.y.max(v.y)),
            )
        }))
    }

    /// Horizontal span `(left, right)` of the polygon at given height. Edges are treated as
    /// half-open in Y so that a line passing exactly through a vertex is counted once.
    ///
    /// # Arguments
    /// * `y` - Scanline height.
    pub fn row_span(&self, y: Scalar) -> Option<(Scalar, Scalar)> {
        let mut span: Option<(Scalar, Scalar)> = None;
        for (a, b) in self.edges() {
            if (a.y <= y) != (b.y <= y) {
                let x = a.x + (y - a.y) * (b.x - a.x) / (b.y - a.y);
                span = Some(match span {
                    Some((left, right)) => (left.min(x), right.max(x)),
                    None => (x, x),
                });
            }
        }
        span
    }

    fn push_unique(result: &mut Vec<Coord>, point: Coord) {
        if result.last() != Some(&point) {
            result.push(point);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn clip_keeps_inner_half() {
        let square = ConvexPolygon::rectangle(2.0, 2.0);
        let half = square.clip(Coord::new(1.0, 0.0), 1.0);
        assert_relative_eq!(half.signed_area(), 2.0, epsilon = 1e-12);
        let centroid = half.centroid().unwrap();
        assert_relative_eq!(centroid.x, 0.5, epsilon = 1e-12);
        assert_relative_eq!(centroid.y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn clip_outside_empties() {
        let square = ConvexPolygon::rectangle(2.0, 2.0);
        assert!(square.clip(Coord::new(1.0, 0.0), -1.0).is_empty());
        assert_eq!(square.clip(Coord::new(1.0, 0.0), 5.0), square);
    }

    #[test]
    fn diagonal_clip_makes_triangle() {
        let square = ConvexPolygon::rectangle(1.0, 1.0);
        let triangle = square.clip(Coord::new(1.0, 1.0), 1.0);
        assert_eq!(triangle.vertices().len(), 3);
        assert_relative_eq!(triangle.signed_area(), 0.5, epsilon = 1e-12);
        let centroid = triangle.centroid().unwrap();
        assert_relative_eq!(centroid.x, 1.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(centroid.y, 1.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn containment_and_spans() {
        let square = ConvexPolygon::rectangle(4.0, 2.0);
        assert!(square.contains(Coord::new(1.0, 1.0)));
        assert!(square.contains(Coord::new(4.0, 2.0)));
        assert!(!square.contains(Coord::new(4.5, 1.0)));
        assert_eq!(square.row_span(1.0), Some((0.0, 4.0)));
        assert_eq!(square.row_span(3.0), None);
        assert_eq!(
            square.bounds(),
            Some((Coord::new(0.0, 0.0), Coord::new(4.0, 2.0)))
        );
    }
}
