use crate::{
    engine::{point_count::PointCount, seed_strategy::SeedStrategy},
    error::ConfigurationError,
    relax::CentroidIntegration,
    Scalar,
};
use serde::{Deserialize, Serialize};

/// Settings of the relaxation loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Seed of the engine random numbers generator.
    #[serde(default)]
    pub seed: u64,
    /// Fraction of the way to the cell centroid travelled per step. 1 is plain Lloyd relaxation,
    /// values above 1 over-relax. Must lie in `(0, 2)`.
    #[serde(default = "EngineSettings::default_step_scale")]
    pub step_scale: Scalar,
    /// Initial amplitude of random displacement added to every step, decaying as
    /// `jitter * (iteration + 1) ^ -0.8`.
    #[serde(default)]
    pub jitter: Scalar,
    /// Cell density integration.
    #[serde(default)]
    pub integration: CentroidIntegration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            seed: 0,
            step_scale: Self::default_step_scale(),
            jitter: 0.0,
            integration: CentroidIntegration::default(),
        }
    }
}

impl EngineSettings {
    fn default_step_scale() -> Scalar {
        1.0
    }

    /// Check relaxation parameters.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !self.step_scale.is_finite() || self.step_scale <= 0.0 || self.step_scale >= 2.0 {
            return Err(ConfigurationError::InvalidStepScale(self.step_scale));
        }
        if !self.jitter.is_finite() || self.jitter < 0.0 {
            return Err(ConfigurationError::InvalidJitter(self.jitter));
        }
        Ok(())
    }

    /// Jitter amplitude applied while computing given iteration (counted from 0).
    pub fn jitter_amplitude(&self, iteration: usize) -> Scalar {
        if self.jitter > 0.0 {
            self.jitter * ((iteration + 1) as Scalar).powf(-0.8)
        } else {
            0.0
        }
    }
}

/// Settings of a whole stippling run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StippleSettings {
    /// Number of stipples.
    #[serde(default)]
    pub point_count: PointCount,
    /// Initial placement.
    #[serde(default)]
    pub seed_strategy: SeedStrategy,
    /// Number of relaxation iterations.
    #[serde(default = "StippleSettings::default_iterations")]
    pub iterations: usize,
    /// Stop early once no stipple moved by this distance or more in the last iteration.
    #[serde(default)]
    pub convergence_epsilon: Option<Scalar>,
    #[serde(flatten)]
    pub engine: EngineSettings,
}

impl Default for StippleSettings {
    fn default() -> Self {
        Self {
            point_count: PointCount::default(),
            seed_strategy: SeedStrategy::default(),
            iterations: Self::default_iterations(),
            convergence_epsilon: None,
            engine: EngineSettings::default(),
        }
    }
}

impl StippleSettings {
    fn default_iterations() -> usize {
        80
    }
}
