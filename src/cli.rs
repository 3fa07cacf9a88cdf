use crate::config::load_config;
use crate::layout_dump::write_layout_dump;
use crate::scene::Scene;
use crate::text_metrics::{FixedAdvance, FontMeasurer};
use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "labelfit", version, about = "Place labels next to boxes without occluding them")]
pub struct Args {
    /// Scene file (.json) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file for the layout JSON. Defaults to stdout.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Config JSON file (gridSize, paddingX, paddingY, maxIterations, ...)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Override maxIterations
    #[arg(short = 'n', long = "iterations")]
    pub iterations: Option<u32>,

    /// Record the layout after every pass
    #[arg(long = "frames")]
    pub frames: bool,

    /// How labels without a pre-measured size are measured
    #[arg(short = 'm', long = "measure", value_enum, default_value = "heuristic")]
    pub measure: MeasureKind,

    /// Font family list for --measure font
    #[arg(long = "fontFamily", default_value = "sans-serif")]
    pub font_family: String,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasureKind {
    Heuristic,
    Font,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut base_config = load_config(args.config.as_deref())?;
    if let Some(iterations) = args.iterations {
        base_config.max_iterations = iterations;
    }

    let scene = read_scene(args.input.as_deref())?;
    let config = scene.resolve_config(base_config)?;
    tracing::info!(
        objects = scene.objects.len(),
        max_iterations = config.max_iterations,
        grid_size = config.grid_size,
        "solving scene"
    );

    let dump = match args.measure {
        MeasureKind::Heuristic => scene.solve(config, FixedAdvance::default(), args.frames)?,
        MeasureKind::Font => {
            let measurer = FontMeasurer::new(args.font_family.clone());
            if !measurer.is_available() {
                tracing::warn!(
                    family = measurer.family(),
                    "no matching font found, using fixed-advance estimates"
                );
            }
            scene.solve(config, measurer, args.frames)?
        }
    };
    tracing::info!(
        passes = dump.passes,
        state = ?dump.state,
        overlap_score = dump.overlap_score,
        "scene solved"
    );

    write_layout_dump(&dump, args.output.as_deref())
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn read_scene(path: Option<&Path>) -> Result<Scene> {
    if let Some(path) = path {
        if path != Path::new("-") {
            return Scene::load(path);
        }
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Scene::parse(&buf)
}
