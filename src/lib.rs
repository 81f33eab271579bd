// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Huang Rui <vowstar@gmail.com>

//! PCB EMS Geometry Library
//!
//! Turns a PCB layer stackup, board artwork, drill holes and port
//! placements into a solver-ready FDTD scene: solids with materials and
//! priorities, port feeds, field dump planes and a rectilinear mesh.
//!
//! # Features
//!
//! - Resolve stackup z-positions with metals embedded in their dielectrics
//! - Synthesize x/y/z mesh lines with geometric smoothing into the margins
//! - Extrude layer artwork into prisms, approximate via barrels as octagons
//! - Place axis-aligned port boxes on exact mesh lines
//! - Import Excellon drill and KiCad pick-and-place files
//! - Save and reload the compiled scene as JSON
//!
//! # Usage
//!
//! ```rust,no_run
//! use pcb_ems_geometry::{load_config, BoardExtents, ArtworkSet, GeometryCompiler};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("simulation.json")?;
//! let report = GeometryCompiler::new(&config).compile(
//!     Some(BoardExtents::new(10000, 8000)),
//!     &ArtworkSet::new(),
//!     &[],
//! )?;
//!
//! println!("Solids: {}", report.scene.solids.len());
//! println!("Mesh cells: {}", report.scene.grid.cell_count());
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - `data`: layers, resolved stack, vias, ports, materials, board artwork
//! - `config`: the simulation description and its JSON format
//! - `parser`: Excellon drill and pick-and-place import
//! - `geometry`: embedder, via and port geometry, mesh synthesis, scene
//! - `utils`: file I/O and the output directory layout

pub mod config;
pub mod data;
pub mod geometry;
pub mod parser;
pub mod utils;


// Re-export commonly used types
pub use config::{ConfigError, FrequencyRange, Margins, MeshSettings, SimulationConfig};

pub use data::{
    ArtworkSet, BoardExtents, FeedKind, Layer, LayerKind, MetalLayer, Port, ResolvedStack,
    StackError, SubstrateLayer, Via, ViaSettings,
};

pub use geometry::{
    Axis, BoundaryCondition, CompileError, CompileOptions, CompileReport, GeometryCompiler, Grid,
    Scene, SceneBuilder, Shape,
};

pub use parser::{apply_placements, parse_drill_file, parse_placements, PortPlacement};

pub use utils::{
    format_file_size, get_file_size, load_artwork_set, load_config, load_placements, load_scene,
    load_vias, save_scene, FileError, OutputDirs,
};

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Library description
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Get library information as a formatted string
pub fn get_library_info() -> String {
    format!("{NAME} v{VERSION} - {DESCRIPTION}")
}

/// Compile a scene from a configuration file and pre-loaded inputs.
///
/// Convenience wrapper over [`load_config`] and [`GeometryCompiler`] for
/// callers that have no drill or artwork files and know the board size.
///
/// # Example
///
/// ```rust,no_run
/// use pcb_ems_geometry::{compile_from_file, BoardExtents};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let scene = compile_from_file("simulation.json", BoardExtents::new(10000, 8000))?;
/// println!("{} feeds", scene.ports.len());
/// # Ok(())
/// # }
/// ```
pub fn compile_from_file<P: AsRef<std::path::Path>>(
    file_path: P,
    extents: BoardExtents,
) -> Result<Scene, Box<dyn std::error::Error>> {
    let config = load_config(file_path)?;
    let report = GeometryCompiler::new(&config).compile(Some(extents), &ArtworkSet::new(), &[])?;
    Ok(report.scene)
}
