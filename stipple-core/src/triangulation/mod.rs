//! Delaunay triangulation of a point set.
//!
//! The triangulation is rebuilt from scratch for every relaxation step and never mutated
//! afterwards. Degenerate inputs are reported through [`Topology`] instead of errors:
//! no points give [`Topology::Empty`], one or two points and point sets without any proper
//! triangle give [`Topology::Collinear`] where points are chained in lexicographic order.
//! Coincident points are perturbed onto a tiny spiral before triangulating, so every input
//! point stays a vertex.

mod coincident;
pub mod predicates;
mod sweep;
mod triangle;

pub use self::{
    coincident::{COINCIDENT_EPSILON, PERTURBATION_RADIUS},
    triangle::Triangle,
};

use crate::{coord::Coord, Scalar};
use coincident::perturb_coincident;
use predicates::orient2d;
use sweep::{sweep, SweepOutput};

/// Marker of a missing half-edge.
pub const EMPTY: usize = usize::MAX;

/// Triangles with doubled area below this are considered flat.
const FLAT_EPSILON: Scalar = 1e-10;

/// Shape of the triangulated point set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Topology {
    /// There are no points.
    Empty,
    /// Points do not span any triangle. `order` lists point indices lexicographically and
    /// `rank` maps point index to its position in `order`.
    Collinear { order: Vec<usize>, rank: Vec<usize> },
    /// Proper triangulation.
    Planar,
}

/// Delaunay triangulation stored as half-edges: half-edge `e` goes from `triangles[e]` to
/// `triangles[next_halfedge(e)]` and `halfedges[e]` is its twin in the neighbour triangle.
#[derive(Debug, Clone, PartialEq)]
pub struct Triangulation {
    points: Vec<Coord>,
    triangles: Vec<usize>,
    halfedges: Vec<usize>,
    hull: Vec<usize>,
    /// For each point, one incoming half-edge; hull points get their incoming hull edge.
    inedges: Vec<usize>,
    hull_index: Vec<usize>,
    topology: Topology,
    perturbed: usize,
}

impl Triangulation {
    /// Triangulate points.
    ///
    /// # Arguments
    /// * `points` - Points to triangulate. Index `i` of every query refers to `points[i]`.
    ///
    /// # Examples
    /// ```
    /// use stipple_core::prelude::*;
    ///
    /// let triangulation = Triangulation::new(&[
    ///     Coord::new(0.0, 0.0),
    ///     Coord::new(1.0, 0.0),
    ///     Coord::new(1.0, 1.0),
    ///     Coord::new(0.0, 1.0),
    /// ]);
    /// assert_eq!(triangulation.topology(), &Topology::Planar);
    /// assert_eq!(triangulation.triangles().count(), 2);
    /// assert_eq!(triangulation.hull().len(), 4);
    /// ```
    pub fn new(points: &[Coord]) -> Self {
        let mut points = points.to_vec();
        let perturbed = perturb_coincident(&mut points);
        let count = points.len();
        let planar = sweep(&points).filter(|output| !Self::is_flat(&points, &output.triangles));
        match planar {
            Some(SweepOutput {
                triangles,
                halfedges,
                hull,
            }) => {
                let mut inedges = vec![EMPTY; count];
                let mut hull_index = vec![EMPTY; count];
                for (e, twin) in halfedges.iter().enumerate() {
                    let p = triangles[next_halfedge(e)];
                    if *twin == EMPTY || inedges[p] == EMPTY {
                        inedges[p] = e;
                    }
                }
                for (i, h) in hull.iter().enumerate() {
                    hull_index[*h] = i;
                }
                Self {
                    points,
                    triangles,
                    halfedges,
                    hull,
                    inedges,
                    hull_index,
                    topology: Topology::Planar,
                    perturbed,
                }
            }
            None => {
                let topology = if count == 0 {
                    Topology::Empty
                } else {
                    let mut order = (0..count).collect::<Vec<_>>();
                    order.sort_by(|a, b| points[*a].lexicographic_cmp(&points[*b]).then(a.cmp(b)));
                    let mut rank = vec![0; count];
                    for (position, index) in order.iter().enumerate() {
                        rank[*index] = position;
                    }
                    Topology::Collinear { order, rank }
                };
                let hull = match &topology {
                    Topology::Collinear { order, .. } => order.clone(),
                    _ => vec![],
                };
                let hull_index = match &topology {
                    Topology::Collinear { rank, .. } => rank.clone(),
                    _ => vec![],
                };
                Self {
                    points,
                    triangles: vec![],
                    halfedges: vec![],
                    hull,
                    inedges: vec![EMPTY; count],
                    hull_index,
                    topology,
                    perturbed,
                }
            }
        }
    }

    /// Returns triangulated vertices (coincident input points appear perturbed).
    pub fn points(&self) -> &[Coord] {
        &self.points
    }

    /// Returns number of vertices.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Tells if there are no vertices.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Returns shape of the point set.
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Returns number of input points moved because they coincided with another one.
    pub fn perturbed_count(&self) -> usize {
        self.perturbed
    }

    /// Returns convex hull as point indices in counter-clockwise order. For collinear point
    /// sets every point is on the hull, in lexicographic order.
    pub fn hull(&self) -> &[usize] {
        &self.hull
    }

    /// Returns raw half-edge twins buffer.
    pub fn halfedges(&self) -> &[usize] {
        &self.halfedges
    }

    /// Iterator over triangles.
    pub fn triangles(&self) -> impl Iterator<Item = Triangle> + '_ {
        self.triangles
            .chunks_exact(3)
            .map(|t| [t[0], t[1], t[2]].into())
    }

    /// Tells if point has no incident edges (only possible when the sweep had to leave a
    /// numerically coincident point out).
    pub fn is_isolated(&self, index: usize) -> bool {
        self.topology == Topology::Planar && self.inedges[index] == EMPTY
    }

    /// Returns indices of Delaunay neighbours of given point.
    ///
    /// # Arguments
    /// * `index` - Point index.
    pub fn neighbors(&self, index: usize) -> Vec<usize> {
        match &self.topology {
            Topology::Empty => vec![],
            Topology::Collinear { order, rank } => {
                let position = rank[index];
                let mut result = Vec::with_capacity(2);
                if position > 0 {
                    result.push(order[position - 1]);
                }
                if position + 1 < order.len() {
                    result.push(order[position + 1]);
                }
                result
            }
            Topology::Planar => {
                let e0 = self.inedges[index];
                if e0 == EMPTY {
                    return vec![];
                }
                let mut result = Vec::with_capacity(8);
                let mut e = e0;
                loop {
                    let p0 = self.triangles[e];
                    result.push(p0);
                    e = next_halfedge(e);
                    if self.triangles[e] != index {
                        break;
                    }
                    e = self.halfedges[e];
                    if e == EMPTY {
                        let p = self.hull[(self.hull_index[index] + 1) % self.hull.len()];
                        if p != p0 {
                            result.push(p);
                        }
                        break;
                    }
                    if e == e0 {
                        break;
                    }
                }
                result
            }
        }
    }

    /// Returns index of the vertex closest to given point, walking the triangulation from
    /// `start`.
    ///
    /// # Arguments
    /// * `point` - Query point.
    /// * `start` - Index of the vertex where the walk begins; a previous answer is a good hint.
    ///
    /// # Examples
    /// ```
    /// use stipple_core::prelude::*;
    ///
    /// let triangulation = Triangulation::new(&[
    ///     Coord::new(0.0, 0.0),
    ///     Coord::new(10.0, 0.0),
    ///     Coord::new(0.0, 10.0),
    ///     Coord::new(10.0, 10.0),
    /// ]);
    /// assert_eq!(triangulation.find(Coord::new(9.0, 8.0), 0), Some(3));
    /// ```
    pub fn find(&self, point: Coord, start: usize) -> Option<usize> {
        if self.points.is_empty() {
            return None;
        }
        let mut current = start.min(self.points.len() - 1);
        if self.is_isolated(current) {
            current = self.hull.first().copied().unwrap_or(current);
        }
        let mut distance = self.points[current].sqr_distance(point);
        loop {
            let mut best = current;
            for neighbor in self.neighbors(current) {
                let d = self.points[neighbor].sqr_distance(point);
                if d < distance {
                    distance = d;
                    best = neighbor;
                }
            }
            if best == current {
                return Some(current);
            }
            current = best;
        }
    }

    fn is_flat(points: &[Coord], triangles: &[usize]) -> bool {
        triangles
            .chunks_exact(3)
            .all(|t| orient2d(points[t[0]], points[t[1]], points[t[2]]).abs() <= FLAT_EPSILON)
    }
}

/// Next half-edge within the same triangle.
#[inline]
pub fn next_halfedge(e: usize) -> usize {
    if e % 3 == 2 {
        e - 2
    } else {
        e + 1
    }
}
