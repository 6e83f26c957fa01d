#[cfg(feature = "parallel")]
macro_rules! into_iter {
    ($v:expr) => {
        $v.into_par_iter()
    };
}

#[cfg(not(feature = "parallel"))]
macro_rules! into_iter {
    ($v:expr) => {
        $v.into_iter()
    };
}

pub mod coord;
pub mod engine;
pub mod error;
pub mod field;
pub mod polygon;
pub mod relax;
pub mod settings;
pub mod triangulation;
pub mod voronoi;

/// Scalar type.
pub type Scalar = f64;

pub mod prelude {
    pub use crate::{
        coord::*, engine::point_count::*, engine::seed_strategy::*, engine::*, error::*,
        field::*, polygon::*, relax::*, settings::*, triangulation::*, voronoi::*, Scalar,
    };
}
