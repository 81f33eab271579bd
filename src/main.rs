// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Huang Rui <vowstar@gmail.com>

//! PCB EMS Geometry
//!
//! Command line front end: reads fabrication outputs and a simulation
//! description, compiles the FDTD geometry and writes it to the output
//! directory.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{error, info, LevelFilter};
use pcb_ems_geometry::{
    apply_placements, format_file_size, get_file_size, load_artwork_set, load_config,
    load_placements, load_vias, save_scene, BoundaryCondition, CompileOptions, CompileReport,
    FeedKind, GeometryCompiler, OutputDirs,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
        }
    }
}

/// Compile a PCB stackup into FDTD geometry.
#[derive(Parser, Debug)]
#[command(name = "pcb-ems-geometry")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Simulation description (JSON)
    #[arg(short, long, value_name = "FILE", default_value = "simulation.json")]
    config: PathBuf,

    /// Directory with fabrication outputs (drill and pick-and-place files)
    #[arg(short, long, value_name = "DIR", default_value = "fab")]
    input: PathBuf,

    /// Output directory; artwork contours are read from its images/ folder
    #[arg(short, long, value_name = "DIR", default_value = "ems")]
    output: PathBuf,

    /// Add e-field dump planes for layers that request them
    #[arg(long)]
    export_field: bool,

    /// Use 8-cell PML instead of Mur absorbing boundaries
    #[arg(long)]
    pml: bool,

    /// Use lumped feeds instead of microstrip feeds
    #[arg(long)]
    lumped: bool,

    /// Shorthand for --log debug
    #[arg(short, long, conflicts_with = "log")]
    debug: bool,

    /// Log level
    #[arg(short, long, value_enum, default_value_t = LogLevel::Info)]
    log: LogLevel,
}

fn init_logging(args: &Args) {
    let level = if args.debug {
        LevelFilter::Debug
    } else {
        args.log.into()
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    info!("{}", pcb_ems_geometry::get_library_info());

    let mut config = load_config(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;

    let dirs = OutputDirs::new(&args.output);
    dirs.create_all().context("creating output directories")?;

    let placements = load_placements(&args.input, config.offset)
        .context("reading pick-and-place files")?;
    apply_placements(&mut config.ports, &placements);

    let vias = load_vias(&args.input, config.offset).context("reading drill file")?;
    let (artwork, extents) =
        load_artwork_set(&dirs, &config).context("loading layer artwork")?;

    let options = CompileOptions {
        feed: if args.lumped {
            FeedKind::Lumped
        } else {
            FeedKind::Microstrip
        },
        export_field: args.export_field,
        boundary: if args.pml {
            BoundaryCondition::Pml8
        } else {
            BoundaryCondition::Mur
        },
    };
    let report = GeometryCompiler::new(&config)
        .with_options(options)
        .compile(extents, &artwork, &vias)
        .context("compiling geometry")?;

    let path = save_scene(&dirs, &report.scene).context("saving geometry")?;
    print_summary(&report, &path);
    Ok(())
}

fn print_summary(report: &CompileReport, path: &Path) {
    let summary = report.stack.get_stack_summary();
    let scene = &report.scene;

    println!("Geometry written to {}", path.display());
    if let Ok(size) = get_file_size(path) {
        println!("  File size: {}", format_file_size(size));
    }
    println!(
        "  Layers: {} ({} metal, {} substrate), {} um thick",
        summary.total_layers, summary.metal_layers, summary.substrate_layers, summary.total_height
    );
    println!(
        "  Solids: {}, feeds: {}, field dumps: {}",
        scene.solids.len(),
        scene.ports.len(),
        scene.dumps.len()
    );
    println!(
        "  Mesh: {} x {} x {} lines ({} cells)",
        scene.grid.x.len(),
        scene.grid.y.len(),
        scene.grid.z.len(),
        scene.grid.cell_count()
    );
    if !report.is_complete() {
        println!(
            "  Skipped: {} ports, {} vias",
            report.skipped_ports.len(),
            report.skipped_vias.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_arguments() {
        let args = Args::try_parse_from([
            "pcb-ems-geometry",
            "-c",
            "sim.json",
            "-i",
            "fab",
            "-o",
            "out",
            "--export-field",
            "--pml",
            "-l",
            "warn",
        ])
        .unwrap();

        assert_eq!(args.config, PathBuf::from("sim.json"));
        assert!(args.export_field);
        assert!(args.pml);
        assert!(!args.lumped);
        assert_eq!(args.log, LogLevel::Warn);
    }

    #[test]
    fn test_debug_conflicts_with_log() {
        let result = Args::try_parse_from(["pcb-ems-geometry", "-d", "-l", "info"]);
        assert!(result.is_err());
    }
}
