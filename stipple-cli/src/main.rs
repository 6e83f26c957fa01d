mod cli;

use anyhow::{bail, Context, Result};
use clap::Parser;
use cli::{Action, CliArgs, CommonArgs, RenderArgs, StipplingArgs};
use std::{
    fs::{create_dir_all, read_to_string},
    path::Path,
};
use stipple_core::prelude::{StippleSettings, StipplingEngine};
use stipple_image::{
    generate_density_field_from_image, generate_density_image, render::render_stipples,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_tracing(match &args.action {
        Action::Density { common } | Action::Render { common, .. } => common.verbose,
    });
    run_app(args)
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run_app(args: CliArgs) -> Result<()> {
    match args.action {
        Action::Density { common } => density(&common),
        Action::Render {
            common,
            stippling,
            render,
        } => stipple(&common, &stippling, &render),
    }
}

fn density(common: &CommonArgs) -> Result<()> {
    let settings = common.image_settings();
    if common.verbose {
        println!("{:#?}", settings);
    }
    let image = image::open(&common.input)
        .with_context(|| format!("Cannot open input image: {:?}", common.input))?;
    let image = generate_density_image(image, &settings).context("Cannot produce density image")?;
    image
        .save(&common.output)
        .with_context(|| format!("Cannot save output image: {:?}", common.output))?;
    Ok(())
}

fn load_settings(path: &Path) -> Result<StippleSettings> {
    let contents =
        read_to_string(path).with_context(|| format!("Cannot read settings file: {:?}", path))?;
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&contents)
            .with_context(|| format!("Cannot parse JSON settings: {:?}", path)),
        Some("yaml") | Some("yml") => serde_yaml::from_str(&contents)
            .with_context(|| format!("Cannot parse YAML settings: {:?}", path)),
        _ => bail!("Unsupported settings file format: {:?}", path),
    }
}

fn resolve_settings(stippling: &StipplingArgs) -> Result<StippleSettings> {
    let mut settings = match &stippling.settings {
        Some(path) => load_settings(path)?,
        None => StippleSettings::default(),
    };
    stippling.apply(&mut settings);
    Ok(settings)
}

fn stipple(common: &CommonArgs, stippling: &StipplingArgs, render: &RenderArgs) -> Result<()> {
    let image_settings = common.image_settings();
    let settings = resolve_settings(stippling)?;
    let render_settings = render.render_settings(common.scale);
    if common.verbose {
        println!("{:#?}", image_settings);
        println!("{:#?}", settings);
        println!("{:#?}", render_settings);
    }
    let image = image::open(&common.input)
        .with_context(|| format!("Cannot open input image: {:?}", common.input))?;
    let field = generate_density_field_from_image(image, &image_settings)
        .context("Cannot produce density field")?;
    let (width, height) = (field.width(), field.height());
    let mut engine = StipplingEngine::new(settings.engine.clone());
    engine
        .initialize(field, settings.point_count, settings.seed_strategy)
        .context("Cannot initialize stippling")?;
    info!(
        "stippling {}x{} density field with {} stipples",
        width,
        height,
        engine.point_count()
    );

    let save = |engine: &StipplingEngine, path: &Path| -> Result<()> {
        let points = engine.current_points()?;
        let voronoi = if render_settings.cells {
            engine.voronoi()
        } else {
            None
        };
        render_stipples(width, height, &points, voronoi.as_ref(), &render_settings)
            .save(path)
            .with_context(|| format!("Cannot save image: {:?}", path))
    };
    let frame_every = render.frame_every.max(1);
    if let Some(frames) = &render.frames {
        create_dir_all(frames)
            .with_context(|| format!("Cannot create frames directory: {:?}", frames))?;
        save(&engine, &frames.join("frame-0000.png"))?;
    }
    while engine.iteration() < settings.iterations {
        let report = engine.step()?;
        if common.verbose {
            println!(
                "Iteration: {} / {} (max displacement: {})",
                report.iteration, settings.iterations, report.max_displacement
            );
        }
        if let Some(frames) = &render.frames {
            if report.iteration % frame_every == 0 {
                save(
                    &engine,
                    &frames.join(format!("frame-{:04}.png", report.iteration)),
                )?;
            }
        }
        if let Some(epsilon) = settings.convergence_epsilon {
            if engine.is_converged(epsilon) {
                info!("converged after {} iterations", report.iteration);
                break;
            }
        }
    }
    save(&engine, &common.output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, GrayImage, Luma};
    use std::{env::temp_dir, fs::write, path::PathBuf};
    use stipple_core::prelude::{CentroidIntegration, PointCount, SeedStrategy};

    fn workspace(name: &str) -> PathBuf {
        let dir = temp_dir().join(format!("stipple-cli-{}-{}", name, std::process::id()));
        create_dir_all(&dir).unwrap();
        dir
    }

    fn write_gradient(path: &Path) {
        GrayImage::from_fn(32, 16, |x, _| Luma([(x * 8) as u8]))
            .save(path)
            .unwrap();
    }

    #[test]
    fn parse_render_args() {
        let args = CliArgs::try_parse_from([
            "stipple",
            "render",
            "-i",
            "in.png",
            "-o",
            "out.png",
            "--points",
            "40px",
            "--seed-strategy",
            "uniform",
            "--integration",
            "nearest-site",
            "--seed",
            "9",
            "--cells",
        ])
        .unwrap();
        match args.action {
            Action::Render {
                stippling, render, ..
            } => {
                let settings = resolve_settings(&stippling).unwrap();
                assert_eq!(settings.point_count, PointCount::TargetArea(40.0));
                assert_eq!(settings.seed_strategy, SeedStrategy::Uniform);
                assert_eq!(settings.engine.integration, CentroidIntegration::NearestSite);
                assert_eq!(settings.engine.seed, 9);
                assert_eq!(settings.iterations, StippleSettings::default().iterations);
                assert!(render.cells);
                assert_eq!(render.frame_every, 10);
            }
            action => panic!("unexpected action: {:?}", action),
        }
    }

    #[test]
    fn reject_bad_point_count() {
        assert!(CliArgs::try_parse_from([
            "stipple", "render", "-i", "in.png", "-o", "out.png", "--points", "lots",
        ])
        .is_err());
    }

    #[test]
    fn settings_file_is_overridden_by_flags() {
        let dir = workspace("settings");
        let path = dir.join("settings.json");
        write(
            &path,
            r#"{ "point_count": { "Fixed": 12 }, "iterations": 3, "jitter": 0.5 }"#,
        )
        .unwrap();
        let args = CliArgs::try_parse_from([
            "stipple",
            "render",
            "-i",
            "in.png",
            "-o",
            "out.png",
            "--settings",
            path.to_str().unwrap(),
            "--iterations",
            "7",
        ])
        .unwrap();
        let Action::Render { stippling, .. } = args.action else {
            panic!("expected render action");
        };
        let settings = resolve_settings(&stippling).unwrap();
        assert_eq!(settings.point_count, PointCount::Fixed(12));
        assert_eq!(settings.iterations, 7);
        assert_eq!(settings.engine.jitter, 0.5);
        let yaml = dir.join("settings.yml");
        write(&yaml, "iterations: 5\nseed: 3\nstep_scale: 1.5\n").unwrap();
        let settings = load_settings(&yaml).unwrap();
        assert_eq!(settings.iterations, 5);
        assert_eq!(settings.engine.seed, 3);
        assert_eq!(settings.engine.step_scale, 1.5);
        assert_eq!(settings.point_count, PointCount::default());
        write(dir.join("settings.toml"), "iterations = 5").unwrap();
        assert!(load_settings(&dir.join("settings.toml")).is_err());
    }

    #[test]
    fn render_and_density_end_to_end() {
        let dir = workspace("render");
        let input = dir.join("gradient.png");
        write_gradient(&input);
        let output = dir.join("stippled.png");
        let frames = dir.join("frames");
        run_app(
            CliArgs::try_parse_from([
                "stipple",
                "render",
                "-i",
                input.to_str().unwrap(),
                "-o",
                output.to_str().unwrap(),
                "--points",
                "20",
                "--iterations",
                "4",
                "--frames",
                frames.to_str().unwrap(),
                "--frame-every",
                "2",
            ])
            .unwrap(),
        )
        .unwrap();
        let stippled = image::open(&output).unwrap();
        assert_eq!((stippled.width(), stippled.height()), (32, 16));
        assert!(frames.join("frame-0000.png").exists());
        assert!(frames.join("frame-0004.png").exists());

        let preview = dir.join("density.png");
        run_app(
            CliArgs::try_parse_from([
                "stipple",
                "density",
                "-i",
                input.to_str().unwrap(),
                "-o",
                preview.to_str().unwrap(),
            ])
            .unwrap(),
        )
        .unwrap();
        assert!(preview.exists());
    }
}
