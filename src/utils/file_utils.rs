// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Huang Rui <vowstar@gmail.com>

use crate::config::{ConfigError, SimulationConfig};
use crate::data::{Artwork, ArtworkSet, BoardExtents, Via};
use crate::geometry::Scene;
use crate::parser::{
    parse_drill_file, parse_placements, DrillParseError, PlacementError, PortPlacement,
};
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

/// Suffix of the plated through-hole drill file in the fab directory.
pub const DRILL_FILE_SUFFIX: &str = "-PTH.drl";
/// Suffix of pick-and-place files in the fab directory.
pub const PLACEMENT_FILE_SUFFIX: &str = "-pos.csv";
pub const GEOMETRY_FILE_NAME: &str = "geometry.json";

/// Layout of the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDirs {
    pub root: PathBuf,
    pub images: PathBuf,
    pub geometry: PathBuf,
    pub simulation: PathBuf,
    pub results: PathBuf,
}

impl OutputDirs {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref().to_path_buf();
        Self {
            images: root.join("images"),
            geometry: root.join("geometry"),
            simulation: root.join("simulation"),
            results: root.join("results"),
            root,
        }
    }

    pub fn create_all(&self) -> Result<(), FileError> {
        for dir in [&self.images, &self.geometry, &self.simulation, &self.results] {
            fs::create_dir_all(dir).map_err(|e| FileError::WriteError(dir.clone(), e))?;
        }
        Ok(())
    }

    pub fn geometry_file(&self) -> PathBuf {
        self.geometry.join(GEOMETRY_FILE_NAME)
    }

    /// Contour file written by the mesher for artwork `reference`.
    pub fn artwork_file(&self, reference: &str) -> PathBuf {
        self.images.join(format!("{reference}.json"))
    }
}

fn check_file(path: &Path) -> Result<(), FileError> {
    if !path.exists() {
        return Err(FileError::FileNotFound(path.to_path_buf()));
    }
    if !path.is_file() {
        return Err(FileError::NotAFile(path.to_path_buf()));
    }
    Ok(())
}

fn read_file(path: &Path) -> Result<String, FileError> {
    check_file(path)?;
    fs::read_to_string(path).map_err(|e| FileError::ReadError(path.to_path_buf(), e))
}

/// Files directly inside `dir` whose name ends with `suffix`, sorted.
pub fn find_files_with_suffix<P: AsRef<Path>>(
    dir: P,
    suffix: &str,
) -> Result<Vec<PathBuf>, FileError> {
    let dir = dir.as_ref();
    let entries = fs::read_dir(dir).map_err(|e| FileError::ReadError(dir.to_path_buf(), e))?;

    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.ends_with(suffix))
        })
        .collect();

    files.sort();
    Ok(files)
}

pub fn find_drill_file<P: AsRef<Path>>(dir: P) -> Result<PathBuf, FileError> {
    let dir = dir.as_ref();
    find_files_with_suffix(dir, DRILL_FILE_SUFFIX)?
        .into_iter()
        .next()
        .ok_or_else(|| FileError::DrillFileMissing(dir.to_path_buf()))
}

pub fn find_placement_files<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>, FileError> {
    find_files_with_suffix(dir, PLACEMENT_FILE_SUFFIX)
}

pub fn load_config<P: AsRef<Path>>(file_path: P) -> Result<SimulationConfig, FileError> {
    let path = file_path.as_ref();
    let content = read_file(path)?;
    SimulationConfig::from_json_str(&content).map_err(|e| FileError::Config(path.to_path_buf(), e))
}

/// Vias from the first `*-PTH.drl` file in `input_dir`.
pub fn load_vias<P: AsRef<Path>>(input_dir: P, offset: (f64, f64)) -> Result<Vec<Via>, FileError> {
    let path = find_drill_file(input_dir)?;
    let content = read_file(&path)?;
    let vias = parse_drill_file(&content, offset).map_err(|e| FileError::Drill(path.clone(), e))?;
    info!("Loaded {} vias from {}", vias.len(), path.display());
    Ok(vias)
}

/// Port placements from every `*-pos.csv` file in `input_dir`.
pub fn load_placements<P: AsRef<Path>>(
    input_dir: P,
    offset: (f64, f64),
) -> Result<Vec<PortPlacement>, FileError> {
    let mut placements = Vec::new();
    for path in find_placement_files(input_dir)? {
        let file = fs::File::open(&path).map_err(|e| FileError::ReadError(path.clone(), e))?;
        let found =
            parse_placements(file, offset).map_err(|e| FileError::Placement(path.clone(), e))?;
        debug!("{} port placements in {}", found.len(), path.display());
        placements.extend(found);
    }
    Ok(placements)
}

pub fn load_artwork<P: AsRef<Path>>(file_path: P) -> Result<Artwork, FileError> {
    let path = file_path.as_ref();
    let content = read_file(path)?;
    serde_json::from_str(&content).map_err(|e| FileError::Json(path.to_path_buf(), e))
}

/// Contours of every artwork the stack references, and the board extents
/// taken from the first metal layer's artwork image.
pub fn load_artwork_set(
    dirs: &OutputDirs,
    config: &SimulationConfig,
) -> Result<(ArtworkSet, Option<BoardExtents>), FileError> {
    let mut set = ArtworkSet::new();
    let mut extents = None;

    for layer in &config.layers {
        let Some(reference) = layer.artwork() else {
            continue;
        };
        if set.get(reference).is_some() {
            continue;
        }

        let artwork = load_artwork(dirs.artwork_file(reference))?;
        if extents.is_none() && layer.is_metal() {
            let board = artwork.extents();
            debug!(
                "Board extents from '{reference}': {} x {} um",
                board.width, board.height
            );
            extents = Some(board);
        }
        set.insert(reference, artwork.board_contours());
    }

    Ok((set, extents))
}

pub fn save_scene(dirs: &OutputDirs, scene: &Scene) -> Result<PathBuf, FileError> {
    fs::create_dir_all(&dirs.geometry)
        .map_err(|e| FileError::WriteError(dirs.geometry.clone(), e))?;

    let path = dirs.geometry_file();
    let content =
        serde_json::to_string_pretty(scene).map_err(|e| FileError::Json(path.clone(), e))?;
    fs::write(&path, content).map_err(|e| FileError::WriteError(path.clone(), e))?;
    Ok(path)
}

pub fn load_scene(dirs: &OutputDirs) -> Result<Scene, FileError> {
    let path = dirs.geometry_file();
    if !path.exists() {
        return Err(FileError::GeometryMissing(path));
    }
    let content = read_file(&path)?;
    serde_json::from_str(&content).map_err(|e| FileError::Json(path, e))
}

/// Get file size in bytes
pub fn get_file_size<P: AsRef<Path>>(file_path: P) -> Result<u64, std::io::Error> {
    let metadata = fs::metadata(file_path)?;
    Ok(metadata.len())
}

/// Get human-readable file size string
pub fn format_file_size(size_bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    const THRESHOLD: u64 = 1024;

    if size_bytes < THRESHOLD {
        return format!("{size_bytes} B");
    }

    let mut size = size_bytes as f64;
    let mut unit_index = 0;

    while size >= THRESHOLD as f64 && unit_index < UNITS.len() - 1 {
        size /= THRESHOLD as f64;
        unit_index += 1;
    }

    format!("{:.1} {}", size, UNITS[unit_index])
}

/// File operation errors
#[derive(Debug, thiserror::Error)]
pub enum FileError {
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Path is not a file: {0}")]
    NotAFile(PathBuf),

    #[error("Failed to read {0}: {1}")]
    ReadError(PathBuf, std::io::Error),

    #[error("Failed to write {0}: {1}")]
    WriteError(PathBuf, std::io::Error),

    #[error("Invalid configuration in {0}: {1}")]
    Config(PathBuf, ConfigError),

    #[error("Invalid JSON in {0}: {1}")]
    Json(PathBuf, serde_json::Error),

    #[error("Failed to parse drill file {0}: {1}")]
    Drill(PathBuf, DrillParseError),

    #[error("Failed to parse placement file {0}: {1}")]
    Placement(PathBuf, PlacementError),

    #[error("No *-PTH.drl drill file in {0}")]
    DrillFileMissing(PathBuf),

    #[error("Geometry file {0} does not exist. Did you run the geometry step?")]
    GeometryMissing(PathBuf),
}
