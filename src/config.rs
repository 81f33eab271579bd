// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Huang Rui <vowstar@gmail.com>

//! Simulation configuration.
//!
//! The JSON document is read into loosely typed `Raw*` structures first so
//! that missing required fields and bad values can be reported precisely,
//! then converted into [`SimulationConfig`], which every component takes by
//! reference.

use crate::data::{Layer, MaterialPriorities, MetalLayer, Port, SubstrateLayer, ViaSettings};
use log::{debug, error, info};
use serde::Deserialize;

/// Highest config format understood by this crate, as `MAJOR.MINOR`.
pub const CONFIG_FORMAT_VERSION: (u32, u32) = (1, 1);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencyRange {
    pub start: f64,
    pub stop: f64,
}

impl FrequencyRange {
    pub fn center(&self) -> f64 {
        (self.start + self.stop) / 2.0
    }

    pub fn half_bandwidth(&self) -> f64 {
        (self.stop - self.start) / 2.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshSettings {
    /// Uniform line pitch over the board in x and y.
    pub xy_step: f64,
    /// Default number of z lines per layer.
    pub inter_layers: usize,
    /// Largest line pitch allowed in the xy margin.
    pub margin_step_xy: f64,
    /// Largest line pitch allowed in the z margin.
    pub margin_step_z: f64,
    pub smoothing_ratio: f64,
}

impl Default for MeshSettings {
    fn default() -> Self {
        Self {
            xy_step: 50.0,
            inter_layers: 5,
            margin_step_xy: 200.0,
            margin_step_z: 200.0,
            smoothing_ratio: 2.0,
        }
    }
}

/// Free space kept around the board.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    pub xy: f64,
    pub z: f64,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            xy: 3000.0,
            z: 3000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub frequency: FrequencyRange,
    pub max_steps: u64,
    pub mesh: MeshSettings,
    pub margin: Margins,
    pub via: ViaSettings,
    /// Placement origin in mm, subtracted from drill and pick-and-place data.
    pub offset: (f64, f64),
    pub ports: Vec<Port>,
    pub layers: Vec<Layer>,
    pub priorities: MaterialPriorities,
}

impl SimulationConfig {
    pub fn new(layers: Vec<Layer>, ports: Vec<Port>) -> Self {
        Self {
            frequency: FrequencyRange {
                start: 500e3,
                stop: 10e6,
            },
            max_steps: 1_000_000,
            mesh: MeshSettings::default(),
            margin: Margins::default(),
            via: ViaSettings::default(),
            offset: (0.0, 0.0),
            ports,
            layers,
            priorities: MaterialPriorities::default(),
        }
    }

    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_json::from_str(content)?;
        raw.into_config()
    }

    pub fn metal_layers(&self) -> impl Iterator<Item = &MetalLayer> {
        self.layers.iter().filter_map(|layer| match layer {
            Layer::Metal(metal) => Some(metal),
            Layer::Substrate(_) => None,
        })
    }

    /// Indices of ports that get their own excited solver run.
    pub fn excited_ports(&self) -> Vec<usize> {
        self.ports
            .iter()
            .enumerate()
            .filter(|(_, port)| port.excite)
            .map(|(index, _)| index)
            .collect()
    }
}

pub fn check_format_version(version: &str) -> Result<(), ConfigError> {
    let unsupported = || ConfigError::UnsupportedVersion {
        found: version.to_string(),
        supported: format!("{}.{}", CONFIG_FORMAT_VERSION.0, CONFIG_FORMAT_VERSION.1),
    };

    let (major, minor) = version.split_once('.').ok_or_else(unsupported)?;
    let major: u32 = major.trim().parse().map_err(|_| unsupported())?;
    let minor: u32 = minor.trim().parse().map_err(|_| unsupported())?;

    if major != CONFIG_FORMAT_VERSION.0 || minor < CONFIG_FORMAT_VERSION.1 {
        return Err(unsupported());
    }
    Ok(())
}

fn millimetres_to_units(name: &str, thickness_mm: f64) -> Result<u32, ConfigError> {
    if !thickness_mm.is_finite() || thickness_mm < 0.0 {
        return Err(ConfigError::InvalidValue {
            field: format!("layers.{name}.thickness"),
            message: format!("{thickness_mm} is not a non-negative length"),
        });
    }
    Ok((thickness_mm * 1000.0).round() as u32)
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    format_version: Option<String>,
    #[serde(default)]
    frequency: RawFrequency,
    max_steps: Option<f64>,
    #[serde(default)]
    mesh: RawMesh,
    #[serde(default)]
    margin: RawMargin,
    #[serde(default)]
    via: RawVia,
    #[serde(default)]
    offset: RawOffset,
    ports: Option<Vec<RawPort>>,
    #[serde(default)]
    layers: Vec<RawLayer>,
}

#[derive(Debug, Deserialize)]
struct RawFrequency {
    #[serde(default = "default_start_frequency")]
    start: f64,
    #[serde(default = "default_stop_frequency")]
    stop: f64,
}

impl Default for RawFrequency {
    fn default() -> Self {
        Self {
            start: default_start_frequency(),
            stop: default_stop_frequency(),
        }
    }
}

fn default_start_frequency() -> f64 {
    500e3
}

fn default_stop_frequency() -> f64 {
    10e6
}

#[derive(Debug, Deserialize)]
struct RawMesh {
    #[serde(default = "default_mesh_xy")]
    xy: f64,
    #[serde(default = "default_inter_layers")]
    inter_layers: usize,
    #[serde(default)]
    margin: RawMeshMargin,
    #[serde(default = "default_smoothing_ratio")]
    smoothing_ratio: f64,
}

impl Default for RawMesh {
    fn default() -> Self {
        Self {
            xy: default_mesh_xy(),
            inter_layers: default_inter_layers(),
            margin: RawMeshMargin::default(),
            smoothing_ratio: default_smoothing_ratio(),
        }
    }
}

fn default_mesh_xy() -> f64 {
    50.0
}

fn default_inter_layers() -> usize {
    5
}

fn default_smoothing_ratio() -> f64 {
    2.0
}

#[derive(Debug, Deserialize)]
struct RawMeshMargin {
    #[serde(default = "default_margin_mesh")]
    xy: f64,
    #[serde(default = "default_margin_mesh")]
    z: f64,
}

impl Default for RawMeshMargin {
    fn default() -> Self {
        Self {
            xy: default_margin_mesh(),
            z: default_margin_mesh(),
        }
    }
}

fn default_margin_mesh() -> f64 {
    200.0
}

#[derive(Debug, Deserialize)]
struct RawMargin {
    #[serde(default = "default_margin")]
    xy: f64,
    #[serde(default = "default_margin")]
    z: f64,
}

impl Default for RawMargin {
    fn default() -> Self {
        Self {
            xy: default_margin(),
            z: default_margin(),
        }
    }
}

fn default_margin() -> f64 {
    3000.0
}

#[derive(Debug, Deserialize)]
struct RawVia {
    #[serde(default = "default_plating_thickness")]
    plating_thickness: f64,
    #[serde(default = "default_filling_epsilon")]
    filling_epsilon: f64,
}

impl Default for RawVia {
    fn default() -> Self {
        Self {
            plating_thickness: default_plating_thickness(),
            filling_epsilon: default_filling_epsilon(),
        }
    }
}

fn default_plating_thickness() -> f64 {
    50.0
}

fn default_filling_epsilon() -> f64 {
    1.0
}

#[derive(Debug, Default, Deserialize)]
struct RawOffset {
    #[serde(default)]
    x: f64,
    #[serde(default)]
    y: f64,
}

#[derive(Debug, Deserialize)]
struct RawPort {
    #[serde(default = "default_name")]
    name: String,
    width: Option<f64>,
    #[serde(default = "default_port_length")]
    length: f64,
    #[serde(default = "default_impedance")]
    impedance: f64,
    layer: Option<usize>,
    plane: Option<usize>,
    #[serde(default)]
    excite: bool,
    position: Option<[f64; 2]>,
    direction: Option<f64>,
}

fn default_name() -> String {
    "Unnamed".to_string()
}

fn default_port_length() -> f64 {
    Port::DEFAULT_LENGTH
}

fn default_impedance() -> f64 {
    Port::DEFAULT_IMPEDANCE
}

#[derive(Debug, Deserialize)]
struct RawLayer {
    #[serde(default = "default_name")]
    name: String,
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    file: Option<String>,
    #[serde(default)]
    thickness: f64,
    #[serde(default)]
    export_field: bool,
    z_mesh_count: Option<usize>,
    epsilon: Option<f64>,
    priority: Option<i32>,
    #[serde(default)]
    priority_offset: i32,
    #[serde(default)]
    duplicate_z: Vec<i64>,
}

impl RawConfig {
    fn into_config(self) -> Result<SimulationConfig, ConfigError> {
        info!("Parsing config");

        let version = self
            .format_version
            .ok_or(ConfigError::MissingField("format_version".to_string()))?;
        check_format_version(&version)?;

        let max_steps = self
            .max_steps
            .ok_or(ConfigError::MissingField("max_steps".to_string()))?;
        if max_steps < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "max_steps".to_string(),
                message: format!("{max_steps} is negative"),
            });
        }

        if self.mesh.smoothing_ratio <= 1.0 {
            return Err(ConfigError::InvalidValue {
                field: "mesh.smoothing_ratio".to_string(),
                message: format!("{} must be greater than 1", self.mesh.smoothing_ratio),
            });
        }
        if self.mesh.xy <= 0.0 || self.mesh.margin.xy <= 0.0 || self.mesh.margin.z <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "mesh".to_string(),
                message: "mesh steps must be positive".to_string(),
            });
        }

        let ports = self
            .ports
            .ok_or(ConfigError::MissingField("ports".to_string()))?
            .into_iter()
            .enumerate()
            .map(|(index, port)| port.into_port(index))
            .collect::<Result<Vec<_>, _>>()?;
        debug!("Found {} ports", ports.len());

        let layers = self
            .layers
            .into_iter()
            .map(RawLayer::into_layer)
            .collect::<Result<Vec<_>, _>>()?;
        debug!("Found {} layers", layers.len());

        Ok(SimulationConfig {
            frequency: FrequencyRange {
                start: self.frequency.start,
                stop: self.frequency.stop,
            },
            max_steps: max_steps as u64,
            mesh: MeshSettings {
                xy_step: self.mesh.xy,
                inter_layers: self.mesh.inter_layers,
                margin_step_xy: self.mesh.margin.xy,
                margin_step_z: self.mesh.margin.z,
                smoothing_ratio: self.mesh.smoothing_ratio,
            },
            margin: Margins {
                xy: self.margin.xy,
                z: self.margin.z,
            },
            via: ViaSettings {
                plating_thickness: self.via.plating_thickness,
                filling_epsilon: self.via.filling_epsilon,
                ..ViaSettings::default()
            },
            offset: (self.offset.x, self.offset.y),
            ports,
            layers,
            priorities: MaterialPriorities::default(),
        })
    }
}

impl RawPort {
    fn into_port(self, index: usize) -> Result<Port, ConfigError> {
        let missing = |field: &str| ConfigError::MissingField(format!("ports.{index}.{field}"));

        let width = self.width.ok_or_else(|| missing("width"))?;
        let layer = self.layer.ok_or_else(|| missing("layer"))?;
        let plane = self.plane.ok_or_else(|| missing("plane"))?;

        let mut port = Port::new(self.name, width, layer, plane)
            .with_length(self.length)
            .with_impedance(self.impedance)
            .with_excite(self.excite);
        port.position = self.position.map(|[x, y]| (x, y));
        port.direction = self.direction;
        Ok(port)
    }
}

impl RawLayer {
    fn into_layer(self) -> Result<Layer, ConfigError> {
        let kind = self
            .kind
            .ok_or_else(|| ConfigError::MissingField(format!("layers.{}.type", self.name)))?;
        let thickness = millimetres_to_units(&self.name, self.thickness)?;
        let artwork = self.file.filter(|file| !file.is_empty());

        match kind.as_str() {
            "core" | "prepreg" => {
                let epsilon = self.epsilon.ok_or_else(|| {
                    ConfigError::MissingField(format!("layers.{}.epsilon", self.name))
                })?;
                if epsilon <= 0.0 {
                    return Err(ConfigError::InvalidValue {
                        field: format!("layers.{}.epsilon", self.name),
                        message: format!("{epsilon} must be positive"),
                    });
                }

                let mut layer = SubstrateLayer::new(self.name, thickness, epsilon)
                    .with_duplicate_z(self.duplicate_z)
                    .with_export_field(self.export_field)
                    .with_priority(
                        self.priority.unwrap_or(SubstrateLayer::DEFAULT_PRIORITY),
                        self.priority_offset,
                    );
                layer.artwork = artwork;
                layer.z_mesh_count = self.z_mesh_count;
                Ok(Layer::Substrate(layer))
            }
            "copper" => {
                let mut layer = MetalLayer::new(self.name, thickness)
                    .with_export_field(self.export_field)
                    .with_priority(self.priority.unwrap_or(MetalLayer::DEFAULT_PRIORITY));
                if artwork.is_none() {
                    error!("Metal layer '{}' has no artwork file", layer.name);
                }
                layer.artwork = artwork;
                layer.z_mesh_count = self.z_mesh_count;
                Ok(Layer::Metal(layer))
            }
            other => Err(ConfigError::UnknownLayerKind(other.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config format {found} is not supported (supported: {supported})")]
    UnsupportedVersion { found: String, supported: String },

    #[error("Missing required field '{0}'")]
    MissingField(String),

    #[error("Unknown layer kind: {0}")]
    UnknownLayerKind(String),

    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    #[error("Failed to decode config: {0}")]
    Json(#[from] serde_json::Error),
}
