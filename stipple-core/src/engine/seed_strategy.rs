use crate::{coord::Coord, field::DensityField, Scalar};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Number of candidates tried per stipple by density-biased seeding.
pub const DENSITY_BIASED_TRIES: usize = 30;

/// Initial placement of stipples.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeedStrategy {
    /// Uniformly random over the image rectangle.
    Uniform,
    /// Rejection sampling against density: a candidate is accepted with probability equal to
    /// its density, after [`DENSITY_BIASED_TRIES`] candidates the last one is kept.
    #[default]
    DensityBiased,
}

impl SeedStrategy {
    /// Place stipples.
    ///
    /// # Arguments
    /// * `field` - Density field; its dimensions bound the placement.
    /// * `count` - Number of stipples.
    /// * `rng` - Random numbers source.
    ///
    /// # Returns
    /// `count` points inside `[0, width) x [0, height)`.
    pub fn seed<R>(self, field: &DensityField, count: usize, rng: &mut R) -> Vec<Coord>
    where
        R: Rng + ?Sized,
    {
        match self {
            Self::Uniform => (0..count).map(|_| Self::sample(field, rng)).collect(),
            Self::DensityBiased => (0..count)
                .map(|_| {
                    let mut candidate = Self::sample(field, rng);
                    for _ in 1..DENSITY_BIASED_TRIES {
                        if rng.gen::<Scalar>() < field.value_at_point(candidate) {
                            break;
                        }
                        candidate = Self::sample(field, rng);
                    }
                    candidate
                })
                .collect(),
        }
    }

    fn sample<R>(field: &DensityField, rng: &mut R) -> Coord
    where
        R: Rng + ?Sized,
    {
        Coord::new(
            rng.gen::<Scalar>() * field.width() as Scalar,
            rng.gen::<Scalar>() * field.height() as Scalar,
        )
    }
}

impl FromStr for SeedStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uniform" => Ok(Self::Uniform),
            "density-biased" => Ok(Self::DensityBiased),
            _ => Err(format!("unknown seed strategy: {}", s)),
        }
    }
}

impl fmt::Display for SeedStrategy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Uniform => write!(f, "uniform"),
            Self::DensityBiased => write!(f, "density-biased"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg64;

    #[test]
    fn density_biased_prefers_dark_half() {
        let data = (0..100 * 100)
            .map(|i| if i % 100 < 50 { 1.0 } else { 0.0 })
            .collect::<Vec<_>>();
        let field = DensityField::new(100, 100, data).unwrap();
        let mut rng = Pcg64::seed_from_u64(7);
        let points = SeedStrategy::DensityBiased.seed(&field, 500, &mut rng);
        assert_eq!(points.len(), 500);
        let dark = points.iter().filter(|p| p.x < 50.0).count();
        assert!(dark > 450, "only {} of 500 in dark half", dark);
    }

    #[test]
    fn uniform_stays_in_bounds() {
        let field = DensityField::uniform(30, 20, 0.0).unwrap();
        let mut rng = Pcg64::seed_from_u64(1);
        for p in SeedStrategy::Uniform.seed(&field, 200, &mut rng) {
            assert!(p.x >= 0.0 && p.x < 30.0 && p.y >= 0.0 && p.y < 20.0);
        }
    }

    #[test]
    fn parse() {
        assert_eq!("uniform".parse(), Ok(SeedStrategy::Uniform));
        assert_eq!("density-biased".parse(), Ok(SeedStrategy::DensityBiased));
        assert!("random".parse::<SeedStrategy>().is_err());
        assert_eq!(SeedStrategy::DensityBiased.to_string(), "density-biased");
    }
}
