use crate::{
    coord::Coord,
    triangulation::{
        predicates::{circumcenter, circumradius_sqr, in_circle, orient2d, pseudo_angle},
        EMPTY,
    },
    Scalar,
};

/// Output of the sweep: counter-clockwise triangles, their half-edge twins and the convex hull
/// in counter-clockwise order.
#[derive(Debug, Clone)]
pub(crate) struct SweepOutput {
    pub triangles: Vec<usize>,
    pub halfedges: Vec<usize>,
    pub hull: Vec<usize>,
}

/// Radial sweep-hull Delaunay triangulation. Points are inserted in order of distance from the
/// circumcenter of a seed triangle; each insertion connects to the visible part of the hull and
/// restores the Delaunay condition by recursive edge flips.
///
/// Returns `None` when no seed triangle exists (fewer than 3 points or all points collinear).
pub(crate) fn sweep(coords: &[Coord]) -> Option<SweepOutput> {
    let count = coords.len();
    if count < 3 {
        return None;
    }
    let (min, max) = coords.iter().skip(1).fold((coords[0], coords[0]), |(min, max), p| {
        (
            Coord::new(min.x.min(p.x), min.y.min(p.y)),
            Coord::new(max.x.max(p.x), max.y.max(p.y)),
        )
    });
    let middle = (min + max) * 0.5;

    let i0 = closest(coords, middle, |_| true)?;
    let p0 = coords[i0];
    let i1 = closest(coords, p0, |i| i != i0 && coords[i] != p0)?;
    let p1 = coords[i1];
    let mut i2 = EMPTY;
    let mut min_radius = Scalar::INFINITY;
    for (i, p) in coords.iter().enumerate() {
        if i == i0 || i == i1 {
            continue;
        }
        let radius = circumradius_sqr(p0, p1, *p);
        if radius < min_radius {
            min_radius = radius;
            i2 = i;
        }
    }
    if i2 == EMPTY || !min_radius.is_finite() {
        return None;
    }
    let (i1, i2) = if orient2d(p0, coords[i1], coords[i2]) < 0.0 {
        (i2, i1)
    } else {
        (i1, i2)
    };
    let center = circumcenter(p0, coords[i1], coords[i2])?;

    let mut ids = (0..count).collect::<Vec<_>>();
    let distances = coords
        .iter()
        .map(|p| p.sqr_distance(center))
        .collect::<Vec<_>>();
    ids.sort_by(|a, b| {
        distances[*a]
            .total_cmp(&distances[*b])
            .then_with(|| coords[*a].lexicographic_cmp(&coords[*b]))
            .then(a.cmp(b))
    });

    let mut state = Sweep::new(coords, center);
    state.seed(i0, i1, i2);
    let mut previous: Option<Coord> = None;
    for i in ids {
        let p = coords[i];
        if let Some(previous) = previous {
            if (p.x - previous.x).abs() <= Scalar::EPSILON
                && (p.y - previous.y).abs() <= Scalar::EPSILON
            {
                continue;
            }
        }
        previous = Some(p);
        if i == i0 || i == i1 || i == i2 {
            continue;
        }
        state.insert(i);
    }
    Some(state.finish())
}

fn closest<F>(coords: &[Coord], target: Coord, filter: F) -> Option<usize>
where
    F: Fn(usize) -> bool,
{
    let mut result = None;
    let mut min_distance = Scalar::INFINITY;
    for (i, p) in coords.iter().enumerate() {
        if !filter(i) {
            continue;
        }
        let distance = p.sqr_distance(target);
        if distance < min_distance {
            min_distance = distance;
            result = Some(i);
        }
    }
    result
}

struct Sweep<'a> {
    coords: &'a [Coord],
    center: Coord,
    triangles: Vec<usize>,
    halfedges: Vec<usize>,
    hull_prev: Vec<usize>,
    hull_next: Vec<usize>,
    /// Half-edge index of the hull edge leaving given vertex.
    hull_tri: Vec<usize>,
    hull_hash: Vec<usize>,
    hull_start: usize,
    edge_stack: Vec<usize>,
}

impl<'a> Sweep<'a> {
    fn new(coords: &'a [Coord], center: Coord) -> Self {
        let count = coords.len();
        let max_triangles = (2 * count).saturating_sub(5).max(1);
        let hash_size = (count as Scalar).sqrt().ceil().max(1.0) as usize;
        Self {
            coords,
            center,
            triangles: Vec::with_capacity(max_triangles * 3),
            halfedges: Vec::with_capacity(max_triangles * 3),
            hull_prev: vec![EMPTY; count],
            hull_next: vec![EMPTY; count],
            hull_tri: vec![EMPTY; count],
            hull_hash: vec![EMPTY; hash_size],
            hull_start: EMPTY,
            edge_stack: Vec::with_capacity(512),
        }
    }

    fn seed(&mut self, i0: usize, i1: usize, i2: usize) {
        self.hull_start = i0;
        self.hull_next[i0] = i1;
        self.hull_prev[i2] = i1;
        self.hull_next[i1] = i2;
        self.hull_prev[i0] = i2;
        self.hull_next[i2] = i0;
        self.hull_prev[i1] = i0;
        self.hull_tri[i0] = 0;
        self.hull_tri[i1] = 1;
        self.hull_tri[i2] = 2;
        for i in [i0, i1, i2] {
            let key = self.hash_key(self.coords[i]);
            self.hull_hash[key] = i;
        }
        self.add_triangle(i0, i1, i2, EMPTY, EMPTY, EMPTY);
    }

    fn insert(&mut self, i: usize) {
        let p = self.coords[i];
        let key = self.hash_key(p);
        let size = self.hull_hash.len();
        let start = (0..size)
            .map(|j| self.hull_hash[(key + j) % size])
            .find(|start| *start != EMPTY && self.hull_next[*start] != *start)
            .unwrap_or(self.hull_start);
        let start = self.hull_prev[start];

        // find an edge of the hull visible from the point
        let mut e = start;
        loop {
            let q = self.hull_next[e];
            if orient2d(self.coords[e], self.coords[q], p) < 0.0 {
                break;
            }
            e = q;
            if e == start {
                // near-duplicate or numerically on the hull, leave the point out
                return;
            }
        }

        let t = self.add_triangle(e, i, self.hull_next[e], EMPTY, EMPTY, self.hull_tri[e]);
        self.hull_tri[i] = self.legalize(t + 2);
        self.hull_tri[e] = t;

        let mut n = self.hull_next[e];
        loop {
            let q = self.hull_next[n];
            if orient2d(self.coords[n], self.coords[q], p) >= 0.0 {
                break;
            }
            let t = self.add_triangle(n, i, q, self.hull_tri[i], EMPTY, self.hull_tri[n]);
            self.hull_tri[i] = self.legalize(t + 2);
            self.hull_next[n] = n;
            n = q;
        }

        if e == start {
            loop {
                let q = self.hull_prev[e];
                if orient2d(self.coords[q], self.coords[e], p) >= 0.0 {
                    break;
                }
                let t = self.add_triangle(q, i, e, EMPTY, self.hull_tri[e], self.hull_tri[q]);
                self.legalize(t + 2);
                self.hull_tri[q] = t;
                self.hull_next[e] = e;
                e = q;
            }
        }

        self.hull_start = e;
        self.hull_prev[i] = e;
        self.hull_next[e] = i;
        self.hull_prev[n] = i;
        self.hull_next[i] = n;

        let key = self.hash_key(p);
        self.hull_hash[key] = i;
        let key = self.hash_key(self.coords[e]);
        self.hull_hash[key] = e;
    }

    fn finish(self) -> SweepOutput {
        let mut hull = Vec::new();
        let mut e = self.hull_start;
        loop {
            hull.push(e);
            e = self.hull_next[e];
            if e == self.hull_start || hull.len() > self.coords.len() {
                break;
            }
        }
        SweepOutput {
            triangles: self.triangles,
            halfedges: self.halfedges,
            hull,
        }
    }

    fn hash_key(&self, p: Coord) -> usize {
        let size = self.hull_hash.len();
        let angle = pseudo_angle(p - self.center);
        ((angle * size as Scalar).floor() as usize) % size
    }

    fn add_triangle(&mut self, i0: usize, i1: usize, i2: usize, a: usize, b: usize, c: usize) -> usize {
        let t = self.triangles.len();
        self.triangles.extend_from_slice(&[i0, i1, i2]);
        self.halfedges.extend_from_slice(&[EMPTY; 3]);
        self.link(t, a);
        self.link(t + 1, b);
        self.link(t + 2, c);
        t
    }

    #[inline]
    fn link(&mut self, a: usize, b: usize) {
        self.halfedges[a] = b;
        if b != EMPTY {
            self.halfedges[b] = a;
        }
    }

    /// Flips edges until the triangles around half-edge `a` satisfy the Delaunay condition.
    ///
    /// ```plain
    ///           p0                p0
    ///          / \               /|\
    ///       al/ a \ar         al/ | \ar
    ///        /     \           /  |  \
    ///       pl-----pr   =>   pl  a|b  pr
    ///        \     /           \  |  /
    ///       bl\ b /br         bl\ | /br
    ///          \ /               \|/
    ///           p1                p1
    /// ```
    ///
    /// # Returns
    /// Index of the half-edge that leaves the point opposite of `a` along the hull.
    fn legalize(&mut self, mut a: usize) -> usize {
        let mut ar;
        loop {
            let b = self.halfedges[a];
            let a0 = a - a % 3;
            ar = a0 + (a + 2) % 3;
            if b == EMPTY {
                match self.edge_stack.pop() {
                    Some(next) => {
                        a = next;
                        continue;
                    }
                    None => break,
                }
            }
            let b0 = b - b % 3;
            let al = a0 + (a + 1) % 3;
            let bl = b0 + (b + 2) % 3;
            let p0 = self.triangles[ar];
            let pr = self.triangles[a];
            let pl = self.triangles[al];
            let p1 = self.triangles[bl];
            let illegal = in_circle(
                self.coords[p0],
                self.coords[pr],
                self.coords[pl],
                self.coords[p1],
            ) > 0.0;
            if illegal {
                self.triangles[a] = p1;
                self.triangles[b] = p0;
                let hbl = self.halfedges[bl];
                if hbl == EMPTY {
                    // flipped edge lies on the hull, so its half-edge index moved
                    let mut e = self.hull_start;
                    loop {
                        if self.hull_tri[e] == bl {
                            self.hull_tri[e] = a;
                            break;
                        }
                        e = self.hull_prev[e];
                        if e == self.hull_start {
                            break;
                        }
                    }
                }
                self.link(a, hbl);
                let har = self.halfedges[ar];
                self.link(b, har);
                self.link(ar, bl);
                self.edge_stack.push(b0 + (b + 1) % 3);
            } else {
                match self.edge_stack.pop() {
                    Some(next) => a = next,
                    None => break,
                }
            }
        }
        ar
    }
}
