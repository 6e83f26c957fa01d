use serde::{Deserialize, Serialize};

/// Triangle as indices of its counter-clockwise vertices.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Triangle {
    /// First point.
    pub a: usize,
    /// Second point.
    pub b: usize,
    /// Third point.
    pub c: usize,
}

impl From<[usize; 3]> for Triangle {
    fn from([a, b, c]: [usize; 3]) -> Self {
        Self { a, b, c }
    }
}

impl Triangle {
    /// Tells if given point index is one of the corners.
    pub fn has_vertex(&self, index: usize) -> bool {
        self.a == index || self.b == index || self.c == index
    }
}
