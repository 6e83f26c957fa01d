use crate::{coord::Coord, Scalar};

/// Twice the signed area of triangle `abc`; positive when counter-clockwise.
#[inline]
pub fn orient2d(a: Coord, b: Coord, c: Coord) -> Scalar {
    (b - a).cross(c - a)
}

/// Positive when `d` lies inside circumcircle of counter-clockwise triangle `abc`.
#[inline]
pub fn in_circle(a: Coord, b: Coord, c: Coord, d: Coord) -> Scalar {
    let ad = a - d;
    let bd = b - d;
    let cd = c - d;
    let ap = ad.sqr_magnitude();
    let bp = bd.sqr_magnitude();
    let cp = cd.sqr_magnitude();
    ap * bd.cross(cd) - bp * ad.cross(cd) + cp * ad.cross(bd)
}

/// Squared circumradius of triangle `abc`, infinite for collinear points.
#[inline]
pub fn circumradius_sqr(a: Coord, b: Coord, c: Coord) -> Scalar {
    match circumcenter(a, b, c) {
        Some(center) => center.sqr_distance(a),
        None => Scalar::INFINITY,
    }
}

/// Circumcenter of triangle `abc` or `None` for collinear points.
#[inline]
pub fn circumcenter(a: Coord, b: Coord, c: Coord) -> Option<Coord> {
    let ab = b - a;
    let ac = c - a;
    let denominator = ab.cross(ac);
    if denominator == 0.0 {
        return None;
    }
    let d = 0.5 / denominator;
    let bl = ab.sqr_magnitude();
    let cl = ac.sqr_magnitude();
    let center = Coord::new(
        a.x + (ac.y * bl - ab.y * cl) * d,
        a.y + (ab.x * cl - ac.x * bl) * d,
    );
    if center.is_finite() {
        Some(center)
    } else {
        None
    }
}

/// Monotonic replacement of `atan2` in `[0, 1]`, used for hull hashing.
#[inline]
pub fn pseudo_angle(delta: Coord) -> Scalar {
    let p = delta.x / (delta.x.abs() + delta.y.abs());
    if delta.y > 0.0 {
        (3.0 - p) / 4.0
    } else {
        (1.0 + p) / 4.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn orientation_sign() {
        let a = Coord::new(0.0, 0.0);
        let b = Coord::new(1.0, 0.0);
        let c = Coord::new(0.0, 1.0);
        assert!(orient2d(a, b, c) > 0.0);
        assert!(orient2d(a, c, b) < 0.0);
        assert_eq!(orient2d(a, b, Coord::new(2.0, 0.0)), 0.0);
    }

    #[test]
    fn circle_test() {
        let a = Coord::new(0.0, 0.0);
        let b = Coord::new(2.0, 0.0);
        let c = Coord::new(0.0, 2.0);
        assert!(in_circle(a, b, c, Coord::new(1.0, 1.0)) > 0.0);
        assert!(in_circle(a, b, c, Coord::new(3.0, 3.0)) < 0.0);
        let center = circumcenter(a, b, c).unwrap();
        assert_relative_eq!(center.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(center.y, 1.0, epsilon = 1e-12);
        assert_relative_eq!(circumradius_sqr(a, b, c), 2.0, epsilon = 1e-12);
        assert_eq!(circumradius_sqr(a, b, Coord::new(4.0, 0.0)), Scalar::INFINITY);
    }
}
