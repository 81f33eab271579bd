// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Huang Rui <vowstar@gmail.com>

use crate::data::{FeedKind, Material};
use crate::geometry::mesh::FeatureLines;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn name(&self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        }
    }
}

/// Solid primitives in integer grid units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Shape {
    Box {
        start: [i64; 3],
        stop: [i64; 3],
    },
    /// Polygon in the xy plane at `z`, extruded by `height` along z
    /// (negative heights extrude downwards).
    ExtrudedPolygon {
        points: Vec<[i64; 2]>,
        z: i64,
        height: i64,
    },
    FlatPolygon {
        points: Vec<[i64; 2]>,
        z: i64,
    },
}

impl Shape {
    /// Lowest and highest z the shape touches.
    pub fn z_span(&self) -> (i64, i64) {
        match self {
            Shape::Box { start, stop } => (start[2].min(stop[2]), start[2].max(stop[2])),
            Shape::ExtrudedPolygon { z, height, .. } => ((*z).min(z + height), (*z).max(z + height)),
            Shape::FlatPolygon { z, .. } => (*z, *z),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Solid {
    pub material: String,
    pub priority: i32,
    pub shape: Shape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortBox {
    pub start: [i64; 3],
    pub stop: [i64; 3],
}

impl PortBox {
    pub fn min_corner(&self) -> [i64; 3] {
        [
            self.start[0].min(self.stop[0]),
            self.start[1].min(self.stop[1]),
            self.start[2].min(self.stop[2]),
        ]
    }

    pub fn max_corner(&self) -> [i64; 3] {
        [
            self.start[0].max(self.stop[0]),
            self.start[1].max(self.stop[1]),
            self.start[2].max(self.stop[2]),
        ]
    }

    pub fn size(&self) -> [i64; 3] {
        let (min, max) = (self.min_corner(), self.max_corner());
        [max[0] - min[0], max[1] - min[1], max[2] - min[2]]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortFeed {
    pub number: usize,
    pub name: String,
    pub kind: FeedKind,
    pub bounds: PortBox,
    pub propagation: Axis,
    pub impedance: f64,
    pub excite: bool,
    pub priority: i32,
}

/// Plane on which the solver records the electric field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDump {
    pub name: String,
    pub start: [f64; 3],
    pub stop: [f64; 3],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoundaryCondition {
    Mur,
    Pml8,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Excitation {
    Gaussian { center: f64, half_bandwidth: f64 },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<f64>,
}

impl Grid {
    pub fn lines(&self, axis: Axis) -> &[f64] {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
            Axis::Z => &self.z,
        }
    }

    pub fn cell_count(&self) -> usize {
        self.x.len() * self.y.len() * self.z.len()
    }

    pub fn contains_line(&self, axis: Axis, value: f64) -> bool {
        self.lines(axis).iter().any(|&line| line == value)
    }
}

/// Everything the field solver needs for one geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub materials: Vec<Material>,
    pub solids: Vec<Solid>,
    pub ports: Vec<PortFeed>,
    pub dumps: Vec<FieldDump>,
    pub grid: Grid,
    pub boundary: [BoundaryCondition; 6],
    pub excitation: Excitation,
    pub max_steps: u64,
}

impl Scene {
    pub fn get_material(&self, name: &str) -> Option<&Material> {
        self.materials.iter().find(|material| material.name == name)
    }

    pub fn solids_of<'a>(&'a self, material: &'a str) -> impl Iterator<Item = &'a Solid> + 'a {
        self.solids
            .iter()
            .filter(move |solid| solid.material == material)
    }

    pub fn get_port(&self, number: usize) -> Option<&PortFeed> {
        self.ports.iter().find(|port| port.number == number)
    }

    /// Copy of the scene in which only port `number` is excited.
    pub fn with_excitation(&self, number: usize) -> Option<Scene> {
        self.get_port(number)?;

        let mut scene = self.clone();
        for port in &mut scene.ports {
            port.excite = port.number == number && port.kind != FeedKind::Virtual;
        }
        Some(scene)
    }
}

/// Collects materials, solids, feeds and requested mesh lines while the
/// geometry is compiled. Nothing is sorted until [`SceneBuilder::build`].
#[derive(Debug, Clone, Default)]
pub struct SceneBuilder {
    materials: Vec<Material>,
    solids: Vec<Solid>,
    ports: Vec<PortFeed>,
    dumps: Vec<FieldDump>,
    features: FeatureLines,
}

impl SceneBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a material once; later registrations with the same name are
    /// ignored.
    pub fn add_material(&mut self, material: Material) {
        if !self.materials.iter().any(|m| m.name == material.name) {
            self.materials.push(material);
        }
    }

    pub fn add_solid(&mut self, material: &str, priority: i32, shape: Shape) {
        self.solids.push(Solid {
            material: material.to_string(),
            priority,
            shape,
        });
    }

    pub fn add_port(&mut self, port: PortFeed) {
        self.ports.push(port);
    }

    pub fn add_dump(&mut self, dump: FieldDump) {
        self.dumps.push(dump);
    }

    pub fn add_mesh_line(&mut self, axis: Axis, value: f64) {
        self.features.add(axis, value);
    }

    pub fn features(&self) -> &FeatureLines {
        &self.features
    }

    pub fn solid_count(&self) -> usize {
        self.solids.len()
    }

    pub fn build(
        self,
        grid: Grid,
        boundary: BoundaryCondition,
        excitation: Excitation,
        max_steps: u64,
    ) -> Scene {
        Scene {
            materials: self.materials,
            solids: self.solids,
            ports: self.ports,
            dumps: self.dumps,
            grid,
            boundary: [boundary; 6],
            excitation,
            max_steps,
        }
    }
}
