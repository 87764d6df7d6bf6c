use std::time::Duration;

use anyhow::{Context, Result};
use backdrop::headless::{HeadlessFactory, HeadlessReport, RecordedFrame};
use backdrop::{Backdrop, EffectFile, SurfaceSize, TickOutcome, VirtualContainer};
use tracing_subscriber::EnvFilter;

use crate::cli::RunArgs;
use crate::window::{self, WindowOptions};

/// Simulated refresh interval for headless runs.
const HEADLESS_STEP: Duration = Duration::from_micros(16_667);

pub fn run(args: RunArgs) -> Result<()> {
    let file = resolve_config(&args)?;
    tracing::debug!(
        effect = %file.effect,
        config = ?args.config,
        size = ?args.size,
        "resolved backdrop configuration"
    );

    if args.headless {
        let summary = run_headless(&file, args.size, args.frames, args.seed)?;
        println!("{summary}");
        return Ok(());
    }

    window::run(WindowOptions {
        file,
        config_path: args.config,
        size: args.size,
    })
}

pub fn print_config(args: &RunArgs) -> Result<()> {
    let file = resolve_config(args)?;
    let rendered = file
        .to_toml_string()
        .context("failed to serialise configuration")?;
    print!("{rendered}");
    Ok(())
}

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Loads the config file (or defaults) and applies the `--effect` override.
pub fn resolve_config(args: &RunArgs) -> Result<EffectFile> {
    let mut file = match args.config.as_deref() {
        Some(path) => EffectFile::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => EffectFile::default(),
    };
    if let Some(effect) = args.effect {
        file.effect = effect;
    }
    Ok(file)
}

#[derive(Debug, Clone)]
pub struct HeadlessSummary {
    pub effect: backdrop::EffectKind,
    pub ticks: u64,
    pub report: HeadlessReport,
}

impl std::fmt::Display for HeadlessSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: presented {} frames over {} ticks at {}x{}",
            self.effect,
            self.report.frames_presented,
            self.ticks,
            self.report.size.width,
            self.report.size.height
        )?;
        match &self.report.last_frame {
            Some(RecordedFrame::Blinds { panels, pointer }) => {
                let brightest = panels
                    .iter()
                    .max_by(|a, b| a.opacity.total_cmp(&b.opacity))
                    .map(|panel| panel.index);
                if let Some(index) = brightest {
                    write!(f, "; brightest panel {index}")?;
                }
                write!(f, "; pointer x {:.3}", pointer.current.x)
            }
            Some(RecordedFrame::Prism {
                rotation, front_color, ..
            }) => write!(
                f,
                "; rotation ({:.3}, {:.3}, {:.3}); front rgb ({:.3}, {:.3}, {:.3})",
                rotation.x, rotation.y, rotation.z, front_color.x, front_color.y, front_color.z
            ),
            None => Ok(()),
        }
    }
}

/// Runs `frames` ticks against an in-memory container and surface.
///
/// The pointer sweeps once across the container so the blinds spotlight
/// moves the way it would under a real cursor.
pub fn run_headless(
    file: &EffectFile,
    size: SurfaceSize,
    frames: u64,
    seed: Option<u64>,
) -> Result<HeadlessSummary> {
    let container = VirtualContainer::new(size);
    let factory = HeadlessFactory::new();
    let report = factory.report();
    let config = file.render_config();

    let mut backdrop = match seed {
        Some(seed) => Backdrop::mount_seeded(factory, &container, config, seed),
        None => Backdrop::mount(factory, &container, config),
    }
    .context("failed to mount backdrop")?;

    let mut ticks = 0;
    for tick in 0..frames {
        let progress = if frames > 1 {
            tick as f32 / (frames - 1) as f32
        } else {
            0.5
        };
        container.move_pointer_relative(progress, 0.5);

        ticks += 1;
        match backdrop.frame(HEADLESS_STEP) {
            TickOutcome::Continue => {}
            outcome => {
                tracing::warn!(?outcome, tick, "headless animation loop stopped early");
                break;
            }
        }
    }

    backdrop.unmount();
    let report = report.borrow().clone();
    tracing::info!(
        frames = report.frames_presented,
        created = report.surfaces_created,
        destroyed = report.surfaces_destroyed,
        "headless run finished"
    );
    Ok(HeadlessSummary {
        effect: file.effect,
        ticks,
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use backdrop::EffectKind;

    #[test]
    fn headless_blinds_run_presents_every_tick() {
        let file = EffectFile::default();
        let summary = run_headless(&file, SurfaceSize::new(400, 300), 24, Some(3)).unwrap();
        assert_eq!(summary.ticks, 24);
        assert_eq!(summary.report.frames_presented, 24);
        assert_eq!(summary.report.surfaces_created, 1);
        assert_eq!(summary.report.surfaces_destroyed, 1);
        assert!(summary.to_string().contains("presented 24 frames"));
    }

    #[test]
    fn headless_prism_run_records_rotation() {
        let file = EffectFile {
            effect: EffectKind::Prism,
            ..EffectFile::default()
        };
        let summary = run_headless(&file, SurfaceSize::new(640, 480), 10, None).unwrap();
        match summary.report.last_frame {
            Some(RecordedFrame::Prism { rotation, .. }) => assert!(rotation.length() > 0.0),
            other => panic!("expected prism frame, got {other:?}"),
        }
    }

    #[test]
    fn effect_flag_overrides_file_selection() {
        let args = RunArgs {
            effect: Some(EffectKind::Prism),
            config: None,
            size: SurfaceSize::new(10, 10),
            headless: true,
            frames: 1,
            seed: None,
        };
        let file = resolve_config(&args).unwrap();
        assert_eq!(file.effect, EffectKind::Prism);
    }
}
