use crate::{coord::Coord, Scalar};

/// Points closer than this (relative to coordinate magnitude) count as coincident.
pub const COINCIDENT_EPSILON: Scalar = 1e-9;
/// Base radius of the offset applied to coincident points.
pub const PERTURBATION_RADIUS: Scalar = 1e-6;
const GOLDEN_ANGLE: Scalar = 2.399_963_229_728_653;

/// Moves every point that coincides with an earlier one (in lexicographic order) onto a tiny
/// deterministic spiral around it.
///
/// # Returns
/// Number of perturbed points.
pub(crate) fn perturb_coincident(coords: &mut [Coord]) -> usize {
    if coords.len() < 2 {
        return 0;
    }
    let mut order = (0..coords.len()).collect::<Vec<_>>();
    order.sort_by(|a, b| coords[*a].lexicographic_cmp(&coords[*b]).then(a.cmp(b)));
    let mut perturbed = 0;
    let mut anchor = coords[order[0]];
    let mut run = 0;
    for &index in &order[1..] {
        let point = coords[index];
        let scale = anchor.x.abs().max(anchor.y.abs()).max(1.0);
        let tolerance = COINCIDENT_EPSILON * scale;
        if (point.x - anchor.x).abs() <= tolerance && (point.y - anchor.y).abs() <= tolerance {
            run += 1;
            coords[index] = spiral(anchor, run, PERTURBATION_RADIUS * scale);
            perturbed += 1;
        } else {
            anchor = point;
            run = 0;
        }
    }
    perturbed
}

#[inline]
fn spiral(anchor: Coord, step: usize, radius: Scalar) -> Coord {
    let angle = step as Scalar * GOLDEN_ANGLE;
    let distance = radius * (step as Scalar).sqrt();
    Coord::new(
        anchor.x + angle.cos() * distance,
        anchor.y + angle.sin() * distance,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicates_become_distinct() {
        let mut coords = vec![
            Coord::new(1.0, 1.0),
            Coord::new(5.0, 5.0),
            Coord::new(1.0, 1.0),
            Coord::new(1.0, 1.0),
        ];
        assert_eq!(perturb_coincident(&mut coords), 2);
        assert_eq!(coords[0], Coord::new(1.0, 1.0));
        assert_eq!(coords[1], Coord::new(5.0, 5.0));
        assert_ne!(coords[2], coords[0]);
        assert_ne!(coords[3], coords[0]);
        assert_ne!(coords[2], coords[3]);
        assert!(coords[2].sqr_distance(coords[0]).sqrt() < 1e-5);
    }

    #[test]
    fn distinct_points_are_untouched() {
        let original = vec![Coord::new(0.0, 0.0), Coord::new(0.0, 1.0)];
        let mut coords = original.clone();
        assert_eq!(perturb_coincident(&mut coords), 0);
        assert_eq!(coords, original);
    }
}
