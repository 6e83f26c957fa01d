use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum, ValueHint};
use stipple_core::{
    prelude::{CentroidIntegration, PointCount, SeedStrategy, StippleSettings},
    Scalar,
};
use stipple_image::settings::{GenerateDensityImageSettings, ImageDensitySource, RenderSettings};

#[derive(Clone, Debug, Parser)]
#[command(name = "stipple", version, author, about)]
#[command(help_template = "\
{name} {version}
{about}
{author}

{usage-heading}
{tab}{usage}

{all-args}
")]
pub struct CliArgs {
    #[command(subcommand)]
    pub action: Action,
}

#[derive(Clone, Debug, Args)]
pub struct CommonArgs {
    /// Input file path
    #[arg(short, long, value_name = "PATH", value_hint(ValueHint::FilePath))]
    pub input: PathBuf,

    /// Output file path
    #[arg(short, long, value_name = "PATH", value_hint(ValueHint::FilePath))]
    pub output: PathBuf,

    /// Use an alternate channel as density source
    #[arg(long, value_name = "CHANNEL", default_value_t)]
    pub density_source: DensitySourceSelection,

    /// Image scale (density is computed on an image shrunk by this factor)
    #[arg(long, value_name = "INTEGER", default_value_t = 1)]
    pub scale: usize,

    /// Swap dense and empty regions
    #[arg(long)]
    pub invert: bool,

    /// Display settings used and debug logs
    #[arg(long)]
    pub verbose: bool,
}

impl CommonArgs {
    pub fn image_settings(&self) -> GenerateDensityImageSettings {
        GenerateDensityImageSettings {
            density_source: self.density_source.into(),
            scale: self.scale,
            invert: self.invert,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, strum::Display, ValueEnum)]
#[strum(serialize_all = "kebab-case")]
pub enum DensitySourceSelection {
    #[default]
    Luma,
    LumaAlpha,
    Red,
    Green,
    Blue,
    Alpha,
}
impl From<DensitySourceSelection> for ImageDensitySource {
    fn from(value: DensitySourceSelection) -> Self {
        use DensitySourceSelection as S; // source
        use ImageDensitySource as T; // target
        match value {
            S::Luma => T::Luma,
            S::LumaAlpha => T::LumaAlpha,
            S::Red => T::Red,
            S::Green => T::Green,
            S::Blue => T::Blue,
            S::Alpha => T::Alpha,
        }
    }
}

#[derive(Clone, Copy, Debug, strum::Display, ValueEnum)]
#[strum(serialize_all = "kebab-case")]
pub enum SeedStrategySelection {
    Uniform,
    DensityBiased,
}
impl From<SeedStrategySelection> for SeedStrategy {
    fn from(value: SeedStrategySelection) -> Self {
        match value {
            SeedStrategySelection::Uniform => Self::Uniform,
            SeedStrategySelection::DensityBiased => Self::DensityBiased,
        }
    }
}

#[derive(Clone, Copy, Debug, strum::Display, ValueEnum)]
#[strum(serialize_all = "kebab-case")]
pub enum IntegrationSelection {
    Raster,
    NearestSite,
}
impl From<IntegrationSelection> for CentroidIntegration {
    fn from(value: IntegrationSelection) -> Self {
        match value {
            IntegrationSelection::Raster => Self::Raster,
            IntegrationSelection::NearestSite => Self::NearestSite,
        }
    }
}

#[derive(Clone, Debug, Subcommand)]
pub enum Action {
    /// Produce density field preview image
    #[command(help_template = "\
{name}
{about}

{usage-heading}
{tab}{usage}

{all-args}
")]
    Density {
        #[command(flatten)]
        common: CommonArgs,
    },

    /// Produce stippled image
    #[command(help_template = "\
{name}
{about}

{usage-heading}
{tab}{usage}

{all-args}
")]
    Render {
        #[command(flatten)]
        common: CommonArgs,

        #[command(flatten)]
        stippling: StipplingArgs,

        #[command(flatten)]
        render: RenderArgs,
    },
}

/// Stippling options; every option given here overrides the settings file.
#[derive(Clone, Debug, Args)]
pub struct StipplingArgs {
    /// JSON or YAML stippling settings file
    #[arg(long, value_name = "PATH", value_hint(ValueHint::FilePath))]
    pub settings: Option<PathBuf>,

    /// Number of stipples
    ///
    /// Accepts either an integer count (`5000`), or an image area per stipple (`40px`)
    #[arg(long, value_name = "COUNT_OR_AREA")]
    pub points: Option<PointCount>,

    /// Initial stipples placement
    #[arg(long, value_name = "STRATEGY")]
    pub seed_strategy: Option<SeedStrategySelection>,

    /// Random numbers generator seed
    #[arg(long, value_name = "INTEGER")]
    pub seed: Option<u64>,

    /// Number of relaxation iterations
    #[arg(long, value_name = "INTEGER")]
    pub iterations: Option<usize>,

    /// Stop once no stipple moves by this distance
    #[arg(long, value_name = "NUMBER")]
    pub epsilon: Option<Scalar>,

    /// Relaxation step scale, from 0 to 2 (1 is plain Lloyd relaxation)
    #[arg(long, value_name = "NUMBER")]
    pub step_scale: Option<Scalar>,

    /// Initial amplitude of random stipple wiggle
    #[arg(long, value_name = "NUMBER")]
    pub jitter: Option<Scalar>,

    /// Cell density integration
    #[arg(long, value_name = "MODE")]
    pub integration: Option<IntegrationSelection>,
}

impl StipplingArgs {
    /// Override settings with options given on the command line.
    pub fn apply(&self, settings: &mut StippleSettings) {
        if let Some(points) = self.points {
            settings.point_count = points;
        }
        if let Some(strategy) = self.seed_strategy {
            settings.seed_strategy = strategy.into();
        }
        if let Some(seed) = self.seed {
            settings.engine.seed = seed;
        }
        if let Some(iterations) = self.iterations {
            settings.iterations = iterations;
        }
        if let Some(epsilon) = self.epsilon {
            settings.convergence_epsilon = Some(epsilon);
        }
        if let Some(step_scale) = self.step_scale {
            settings.engine.step_scale = step_scale;
        }
        if let Some(jitter) = self.jitter {
            settings.engine.jitter = jitter;
        }
        if let Some(integration) = self.integration {
            settings.engine.integration = integration.into();
        }
    }
}

#[derive(Clone, Debug, Args)]
pub struct RenderArgs {
    /// Stipple radius in output pixels
    #[arg(long, value_name = "NUMBER", default_value_t = 1.5)]
    pub radius: Scalar,

    /// Draw Voronoi cell outlines
    #[arg(long)]
    pub cells: bool,

    /// Directory where intermediate frames are written
    #[arg(long, value_name = "PATH", value_hint(ValueHint::DirPath))]
    pub frames: Option<PathBuf>,

    /// Write a frame every this many iterations
    #[arg(long, value_name = "INTEGER", default_value_t = 10)]
    pub frame_every: usize,
}

impl RenderArgs {
    pub fn render_settings(&self, scale: usize) -> RenderSettings {
        RenderSettings {
            radius: self.radius,
            scale: scale.max(1) as Scalar,
            cells: self.cells,
        }
    }
}
