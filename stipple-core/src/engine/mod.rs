pub mod point_count;
pub mod seed_strategy;

use crate::{
    coord::Coord,
    engine::{point_count::PointCount, seed_strategy::SeedStrategy},
    error::{ConfigurationError, StippleError},
    field::{DensityField, DensityFieldError, PixelLayout},
    relax::{FallbackCounts, Relaxer},
    settings::{EngineSettings, StippleSettings},
    triangulation::Triangulation,
    voronoi::Voronoi,
    Scalar,
};
use tracing::{debug, trace, warn};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};
use std::{
    sync::Arc,
    time::{Duration, Instant},
};

/// Lifecycle of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineStatus {
    /// `initialize` was not called yet.
    Uninitialized,
    /// Stipples are seeded, no relaxation step was taken.
    Ready,
    /// At least one relaxation step was taken.
    Stepping,
}

/// Outcome of advancing the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdvanceStatus {
    /// Iteration counter already reached the target.
    Idle,
    /// Target reached after given number of steps.
    Advanced { steps: usize },
    /// Time budget ran out after given number of steps, before the target was reached.
    Interrupted { steps: usize },
}

/// Summary of single relaxation step.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepReport {
    /// Iteration counter after the step.
    pub iteration: usize,
    /// Largest distance travelled by a stipple.
    pub max_displacement: Scalar,
    /// Sum of squared distances travelled by all stipples.
    pub displacement_sqr_sum: Scalar,
    /// Cells that needed a centroid fallback.
    pub fallbacks: FallbackCounts,
    /// Stipples that coincided with another one and were nudged for triangulation.
    pub perturbed: usize,
}

#[derive(Debug, Clone)]
struct EngineState {
    field: Arc<DensityField>,
    points: Vec<Coord>,
    iteration: usize,
    last_report: Option<StepReport>,
    rng: Pcg64,
}

impl EngineState {
    fn step(&mut self, settings: &EngineSettings) -> StepReport {
        let width = self.field.width() as Scalar;
        let height = self.field.height() as Scalar;
        let triangulation = Triangulation::new(&self.points);
        let relaxation =
            Relaxer::new(settings.integration).relax(&self.points, &self.field, &triangulation);
        let amplitude = settings.jitter_amplitude(self.iteration);
        let mut max_displacement_sqr: Scalar = 0.0;
        let mut displacement_sqr_sum = 0.0;
        for (point, centroid) in self.points.iter_mut().zip(relaxation.centroids.iter()) {
            let target = centroid.point();
            let mut next = target + (*point - target) * (1.0 - settings.step_scale);
            if amplitude > 0.0 {
                let offset = Coord::new(
                    self.rng.gen::<Scalar>() - 0.5,
                    self.rng.gen::<Scalar>() - 0.5,
                );
                next = next + offset * amplitude;
            }
            let next = next.clamped(width, height);
            let displacement = next.sqr_distance(*point);
            max_displacement_sqr = max_displacement_sqr.max(displacement);
            displacement_sqr_sum += displacement;
            *point = next;
        }
        self.iteration += 1;
        let report = StepReport {
            iteration: self.iteration,
            max_displacement: max_displacement_sqr.sqrt(),
            displacement_sqr_sum,
            fallbacks: relaxation.fallbacks(),
            perturbed: triangulation.perturbed_count(),
        };
        trace!(
            "iteration {}: max displacement {}, displacement sum {}",
            report.iteration,
            report.max_displacement,
            report.displacement_sqr_sum
        );
        if report.fallbacks.unchanged > 0 || report.perturbed > 0 {
            warn!(
                "iteration {}: {} stipples kept in place, {} coincident stipples perturbed",
                report.iteration, report.fallbacks.unchanged, report.perturbed
            );
        }
        if report.fallbacks.geometric > 0 {
            debug!(
                "iteration {}: {} cells without density moved to geometric centroid",
                report.iteration, report.fallbacks.geometric
            );
        }
        self.last_report = Some(report);
        report
    }
}

/// Weighted Voronoi stippling engine.
///
/// Seeds stipples over a density field and moves them toward the density-weighted centroids
/// of their Voronoi cells, one iteration at a time. Callers drive it frame by frame with
/// [`StipplingEngine::advance`] and read results with [`StipplingEngine::current_points`].
///
/// # Examples
/// ```
/// use stipple_core::prelude::*;
///
/// let field = DensityField::uniform(32, 32, 0.5).unwrap();
/// let mut engine = StipplingEngine::default();
/// engine.initialize(field, PointCount::Fixed(16), SeedStrategy::Uniform).unwrap();
/// assert_eq!(engine.advance(10), Ok(AdvanceStatus::Advanced { steps: 10 }));
/// assert_eq!(engine.advance(10), Ok(AdvanceStatus::Idle));
/// assert_eq!(engine.current_points().unwrap().len(), 16);
/// ```
#[derive(Debug, Default, Clone)]
pub struct StipplingEngine {
    settings: EngineSettings,
    state: Option<EngineState>,
}

impl StipplingEngine {
    /// Create uninitialized engine.
    ///
    /// # Arguments
    /// * `settings` - Relaxation settings, validated by `initialize`.
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            settings,
            state: None,
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Seed stipples over the density field. Calling it again restarts the engine with the new
    /// field and a freshly seeded random numbers generator.
    ///
    /// # Arguments
    /// * `field` - Density field, shared read-only for the lifetime of this run.
    /// * `point_count` - Number of stipples.
    /// * `seed_strategy` - Initial placement.
    ///
    /// # Returns
    /// Ok or `InvalidConfiguration` error; on error previous state is kept.
    pub fn initialize<F, C>(
        &mut self,
        field: F,
        point_count: C,
        seed_strategy: SeedStrategy,
    ) -> Result<(), StippleError>
    where
        F: Into<Arc<DensityField>>,
        C: Into<PointCount>,
    {
        self.settings.validate()?;
        let field = field.into();
        if field.width() == 0 || field.height() == 0 {
            return Err(ConfigurationError::from(DensityFieldError::ZeroDimensions(
                field.width(),
                field.height(),
            ))
            .into());
        }
        let count = point_count.into().resolve(field.width(), field.height())?;
        let mut rng = Pcg64::seed_from_u64(self.settings.seed);
        let points = seed_strategy.seed(&field, count, &mut rng);
        debug!(
            "initialized {} stipples ({}) over {}x{} density field, seed {}",
            count,
            seed_strategy,
            field.width(),
            field.height(),
            self.settings.seed
        );
        self.state = Some(EngineState {
            field,
            points,
            iteration: 0,
            last_report: None,
            rng,
        });
        Ok(())
    }

    /// Build density field from raw image pixels and seed stipples over it.
    ///
    /// # Arguments
    /// * `pixels` - Raw pixel bytes.
    /// * `width` - Image width.
    /// * `height` - Image height.
    /// * `layout` - Pixel memory layout.
    /// * `point_count` - Number of stipples.
    /// * `seed_strategy` - Initial placement.
    pub fn initialize_from_pixels<C>(
        &mut self,
        pixels: &[u8],
        width: usize,
        height: usize,
        layout: PixelLayout,
        point_count: C,
        seed_strategy: SeedStrategy,
    ) -> Result<(), StippleError>
    where
        C: Into<PointCount>,
    {
        let field = DensityField::from_pixels(pixels, width, height, layout)?;
        self.initialize(field, point_count, seed_strategy)
    }

    /// Run single relaxation step.
    pub fn step(&mut self) -> Result<StepReport, StippleError> {
        let state = self
            .state
            .as_mut()
            .ok_or(StippleError::InvalidState { operation: "step" })?;
        Ok(state.step(&self.settings))
    }

    /// Run relaxation steps until iteration counter reaches target. Does nothing when it is
    /// already there or past it.
    ///
    /// # Arguments
    /// * `target` - Iteration to reach.
    pub fn advance(&mut self, target: usize) -> Result<AdvanceStatus, StippleError> {
        self.advance_tracked(target, |_| {})
    }

    /// Same as `advance`, reporting every completed step.
    ///
    /// # Arguments
    /// * `target` - Iteration to reach.
    /// * `f` - Callback triggered after every step.
    pub fn advance_tracked<F>(&mut self, target: usize, mut f: F) -> Result<AdvanceStatus, StippleError>
    where
        F: FnMut(&StepReport),
    {
        let state = self
            .state
            .as_mut()
            .ok_or(StippleError::InvalidState {
                operation: "advance",
            })?;
        if state.iteration >= target {
            return Ok(AdvanceStatus::Idle);
        }
        let mut steps = 0;
        while state.iteration < target {
            let report = state.step(&self.settings);
            f(&report);
            steps += 1;
        }
        Ok(AdvanceStatus::Advanced { steps })
    }

    /// Same as `advance`, stopping early once the time budget is used up. At least one step is
    /// taken when the target is ahead.
    ///
    /// # Arguments
    /// * `target` - Iteration to reach.
    /// * `timeout` - Duration of time that advancing can take.
    pub fn advance_timeout(
        &mut self,
        target: usize,
        timeout: Duration,
    ) -> Result<AdvanceStatus, StippleError> {
        let state = self
            .state
            .as_mut()
            .ok_or(StippleError::InvalidState {
                operation: "advance_timeout",
            })?;
        if state.iteration >= target {
            return Ok(AdvanceStatus::Idle);
        }
        let timer = Instant::now();
        let mut steps = 0;
        while state.iteration < target {
            state.step(&self.settings);
            steps += 1;
            if state.iteration < target && timer.elapsed() > timeout {
                return Ok(AdvanceStatus::Interrupted { steps });
            }
        }
        Ok(AdvanceStatus::Advanced { steps })
    }

    /// Returns copy of current stipples.
    pub fn current_points(&self) -> Result<Vec<Coord>, StippleError> {
        self.state
            .as_ref()
            .map(|state| state.points.clone())
            .ok_or(StippleError::InvalidState {
                operation: "current_points",
            })
    }

    /// Returns number of stipples, 0 before initialization.
    pub fn point_count(&self) -> usize {
        self.state.as_ref().map(|s| s.points.len()).unwrap_or(0)
    }

    /// Returns number of completed relaxation steps, 0 before initialization.
    pub fn iteration(&self) -> usize {
        self.state.as_ref().map(|s| s.iteration).unwrap_or(0)
    }

    pub fn status(&self) -> EngineStatus {
        match &self.state {
            None => EngineStatus::Uninitialized,
            Some(state) if state.iteration == 0 => EngineStatus::Ready,
            Some(_) => EngineStatus::Stepping,
        }
    }

    /// Returns report of the last relaxation step.
    pub fn last_report(&self) -> Option<&StepReport> {
        self.state.as_ref()?.last_report.as_ref()
    }

    /// Tells if no stipple moved by `epsilon` or more during the last step.
    ///
    /// # Arguments
    /// * `epsilon` - Displacement threshold.
    pub fn is_converged(&self, epsilon: Scalar) -> bool {
        self.last_report()
            .map(|report| report.max_displacement < epsilon)
            .unwrap_or(false)
    }

    pub fn field(&self) -> Option<&Arc<DensityField>> {
        self.state.as_ref().map(|s| &s.field)
    }

    /// Voronoi cells of current stipples.
    pub fn voronoi(&self) -> Option<Voronoi> {
        let state = self.state.as_ref()?;
        let triangulation = Triangulation::new(&state.points);
        Some(Voronoi::new(
            &triangulation,
            state.field.width() as Scalar,
            state.field.height() as Scalar,
        ))
    }
}

/// Run whole stippling over density field.
///
/// # Arguments
/// * `field` - Density field.
/// * `settings` - Stippling settings.
///
/// # Returns
/// Final stipples or error.
pub fn generate_stipples<F>(field: F, settings: &StippleSettings) -> Result<Vec<Coord>, StippleError>
where
    F: Into<Arc<DensityField>>,
{
    generate_stipples_tracked(field, settings, |_| {})
}

/// Run whole stippling over density field, reporting every step.
///
/// # Arguments
/// * `field` - Density field.
/// * `settings` - Stippling settings.
/// * `f` - Callback triggered after every step.
///
/// # Returns
/// Final stipples or error.
pub fn generate_stipples_tracked<F, T>(
    field: F,
    settings: &StippleSettings,
    mut f: T,
) -> Result<Vec<Coord>, StippleError>
where
    F: Into<Arc<DensityField>>,
    T: FnMut(&StepReport),
{
    let mut engine = StipplingEngine::new(settings.engine.clone());
    engine.initialize(field, settings.point_count, settings.seed_strategy)?;
    while engine.iteration() < settings.iterations {
        let report = engine.step()?;
        f(&report);
        if let Some(epsilon) = settings.convergence_epsilon {
            if engine.is_converged(epsilon) {
                debug!("converged after {} iterations", report.iteration);
                break;
            }
        }
    }
    engine.current_points()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_dark_pixel_pixels() -> Vec<u8> {
        let mut pixels = vec![255u8; 16];
        pixels[2 * 4 + 2] = 0;
        pixels
    }

    #[test]
    fn operations_before_initialize_fail() {
        let mut engine = StipplingEngine::default();
        assert_eq!(engine.status(), EngineStatus::Uninitialized);
        assert_eq!(engine.point_count(), 0);
        assert_eq!(
            engine.advance(5),
            Err(StippleError::InvalidState {
                operation: "advance"
            })
        );
        assert_eq!(
            engine.current_points(),
            Err(StippleError::InvalidState {
                operation: "current_points"
            })
        );
        assert!(engine.step().is_err());
        assert!(engine.voronoi().is_none());
        assert!(!engine.is_converged(1.0));
    }

    #[test]
    fn invalid_configuration() {
        let mut engine = StipplingEngine::default();
        let field = DensityField::uniform(4, 4, 1.0).unwrap();
        assert_eq!(
            engine.initialize(field, PointCount::Fixed(0), SeedStrategy::Uniform),
            Err(StippleError::InvalidConfiguration(
                ConfigurationError::ZeroPointCount
            ))
        );
        assert_eq!(
            engine.initialize(DensityField::default(), 5usize, SeedStrategy::Uniform),
            Err(StippleError::InvalidConfiguration(
                ConfigurationError::DensityField(DensityFieldError::ZeroDimensions(0, 0))
            ))
        );
        assert!(engine
            .initialize_from_pixels(&[], 0, 4, PixelLayout::Luma, 5usize, SeedStrategy::Uniform)
            .is_err());
        assert_eq!(engine.status(), EngineStatus::Uninitialized);

        let mut engine = StipplingEngine::new(EngineSettings {
            step_scale: 0.0,
            ..Default::default()
        });
        let field = DensityField::uniform(4, 4, 1.0).unwrap();
        assert_eq!(
            engine.initialize(field, 5usize, SeedStrategy::Uniform),
            Err(StippleError::InvalidConfiguration(
                ConfigurationError::InvalidStepScale(0.0)
            ))
        );
    }

    #[test]
    fn advance_is_idempotent() {
        let mut engine = StipplingEngine::default();
        engine
            .initialize(
                DensityField::uniform(20, 20, 0.3).unwrap(),
                PointCount::Fixed(12),
                SeedStrategy::Uniform,
            )
            .unwrap();
        assert_eq!(engine.status(), EngineStatus::Ready);
        assert_eq!(engine.advance(5), Ok(AdvanceStatus::Advanced { steps: 5 }));
        let points = engine.current_points().unwrap();
        assert_eq!(engine.advance(5), Ok(AdvanceStatus::Idle));
        assert_eq!(engine.advance(2), Ok(AdvanceStatus::Idle));
        assert_eq!(engine.current_points().unwrap(), points);
        assert_eq!(engine.iteration(), 5);
        assert_eq!(engine.status(), EngineStatus::Stepping);
    }

    #[test]
    fn single_dark_pixel_captures_a_stipple() {
        for strategy in [SeedStrategy::Uniform, SeedStrategy::DensityBiased] {
            let mut engine = StipplingEngine::default();
            engine
                .initialize_from_pixels(
                    &single_dark_pixel_pixels(),
                    4,
                    4,
                    PixelLayout::Luma,
                    PointCount::Fixed(5),
                    strategy,
                )
                .unwrap();
            engine.advance(20).unwrap();
            let target = Coord::new(2.5, 2.5);
            let closest = engine
                .current_points()
                .unwrap()
                .iter()
                .map(|p| p.sqr_distance(target).sqrt())
                .fold(Scalar::INFINITY, Scalar::min);
            assert!(closest < 1.0, "closest stipple is {} away", closest);
        }
    }

    #[test]
    fn tracked_advance_reports_each_step() {
        let mut engine = StipplingEngine::default();
        engine
            .initialize(
                DensityField::uniform(16, 16, 1.0).unwrap(),
                PointCount::Fixed(8),
                SeedStrategy::DensityBiased,
            )
            .unwrap();
        let mut iterations = vec![];
        engine
            .advance_tracked(4, |report| iterations.push(report.iteration))
            .unwrap();
        assert_eq!(iterations, vec![1, 2, 3, 4]);
        assert_eq!(engine.last_report().map(|r| r.iteration), Some(4));
    }

    #[test]
    fn timeout_takes_at_least_one_step() {
        let mut engine = StipplingEngine::default();
        engine
            .initialize(
                DensityField::uniform(16, 16, 1.0).unwrap(),
                PointCount::Fixed(8),
                SeedStrategy::Uniform,
            )
            .unwrap();
        match engine.advance_timeout(50, Duration::ZERO).unwrap() {
            AdvanceStatus::Interrupted { steps } | AdvanceStatus::Advanced { steps } => {
                assert!(steps >= 1);
                assert_eq!(engine.iteration(), steps);
            }
            AdvanceStatus::Idle => panic!("engine did not advance"),
        }
        let done = engine.iteration();
        assert_eq!(
            engine.advance_timeout(60, Duration::from_secs(600)),
            Ok(AdvanceStatus::Advanced { steps: 60 - done })
        );
    }

    #[test]
    fn single_stipple_converges_to_weighted_centre() {
        let mut engine = StipplingEngine::default();
        engine
            .initialize(
                DensityField::uniform(8, 6, 1.0).unwrap(),
                PointCount::Fixed(1),
                SeedStrategy::Uniform,
            )
            .unwrap();
        engine.advance(1).unwrap();
        assert_eq!(engine.current_points().unwrap(), vec![Coord::new(4.0, 3.0)]);
        engine.advance(2).unwrap();
        assert!(engine.is_converged(1e-9));
    }

    #[test]
    fn reinitialize_restarts() {
        let mut engine = StipplingEngine::default();
        let field = Arc::new(DensityField::uniform(10, 10, 1.0).unwrap());
        engine
            .initialize(field.clone(), 4usize, SeedStrategy::Uniform)
            .unwrap();
        let seeded = engine.current_points().unwrap();
        engine.advance(3).unwrap();
        engine
            .initialize(field.clone(), 4usize, SeedStrategy::Uniform)
            .unwrap();
        assert_eq!(engine.iteration(), 0);
        assert_eq!(engine.current_points().unwrap(), seeded);
        assert!(Arc::ptr_eq(engine.field().unwrap(), &field));
    }

    #[test]
    fn generate_with_early_stop() {
        let settings = StippleSettings {
            point_count: PointCount::Fixed(1),
            iterations: 50,
            convergence_epsilon: Some(1e-9),
            ..Default::default()
        };
        let mut steps = 0;
        let points = generate_stipples_tracked(
            DensityField::uniform(8, 6, 1.0).unwrap(),
            &settings,
            |_| steps += 1,
        )
        .unwrap();
        assert_eq!(points, vec![Coord::new(4.0, 3.0)]);
        assert_eq!(steps, 2);
    }
}
