// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Huang Rui <vowstar@gmail.com>

use log::warn;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayerKind {
    Metal,
    Substrate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetalLayer {
    pub name: String,
    pub thickness: u32,
    pub artwork: Option<String>,
    pub z_mesh_count: Option<usize>,
    pub export_field: bool,
    pub priority: i32,
}

impl MetalLayer {
    pub const DEFAULT_PRIORITY: i32 = 51;

    /// Metal thickness is split symmetrically into the neighbouring
    /// dielectrics, so an odd value is bumped to the next even one.
    pub fn new(name: String, thickness: u32) -> Self {
        let thickness = if thickness % 2 != 0 {
            warn!(
                "Metal layer '{name}' has odd thickness {thickness} um, using {} um",
                thickness + 1
            );
            thickness + 1
        } else {
            thickness
        };

        Self {
            name,
            thickness,
            artwork: None,
            z_mesh_count: None,
            export_field: false,
            priority: Self::DEFAULT_PRIORITY,
        }
    }

    pub fn with_artwork(mut self, artwork: String) -> Self {
        self.artwork = Some(artwork);
        self
    }

    pub fn with_z_mesh_count(mut self, count: usize) -> Self {
        self.z_mesh_count = Some(count);
        self
    }

    pub fn with_export_field(mut self, export_field: bool) -> Self {
        self.export_field = export_field;
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubstrateLayer {
    pub name: String,
    pub thickness: u32,
    pub epsilon: f64,
    pub artwork: Option<String>,
    pub duplicate_z: Vec<i64>,
    pub z_mesh_count: Option<usize>,
    pub export_field: bool,
    pub priority: i32,
    pub priority_offset: i32,
}

impl SubstrateLayer {
    pub const DEFAULT_PRIORITY: i32 = 50;

    pub fn new(name: String, thickness: u32, epsilon: f64) -> Self {
        Self {
            name,
            thickness,
            epsilon,
            artwork: None,
            duplicate_z: Vec::new(),
            z_mesh_count: None,
            export_field: false,
            priority: Self::DEFAULT_PRIORITY,
            priority_offset: 0,
        }
    }

    pub fn with_artwork(mut self, artwork: String) -> Self {
        self.artwork = Some(artwork);
        self
    }

    pub fn with_duplicate_z(mut self, offsets: Vec<i64>) -> Self {
        self.duplicate_z = offsets;
        self
    }

    pub fn with_z_mesh_count(mut self, count: usize) -> Self {
        self.z_mesh_count = Some(count);
        self
    }

    pub fn with_export_field(mut self, export_field: bool) -> Self {
        self.export_field = export_field;
        self
    }

    pub fn with_priority(mut self, priority: i32, priority_offset: i32) -> Self {
        self.priority = priority;
        self.priority_offset = priority_offset;
        self
    }

    pub fn effective_priority(&self) -> i32 {
        self.priority + self.priority_offset
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Layer {
    Metal(MetalLayer),
    Substrate(SubstrateLayer),
}

impl Layer {
    pub fn name(&self) -> &str {
        match self {
            Layer::Metal(layer) => &layer.name,
            Layer::Substrate(layer) => &layer.name,
        }
    }

    pub fn thickness(&self) -> u32 {
        match self {
            Layer::Metal(layer) => layer.thickness,
            Layer::Substrate(layer) => layer.thickness,
        }
    }

    pub fn kind(&self) -> LayerKind {
        match self {
            Layer::Metal(_) => LayerKind::Metal,
            Layer::Substrate(_) => LayerKind::Substrate,
        }
    }

    pub fn is_metal(&self) -> bool {
        matches!(self, Layer::Metal(_))
    }

    pub fn is_substrate(&self) -> bool {
        matches!(self, Layer::Substrate(_))
    }

    pub fn artwork(&self) -> Option<&str> {
        match self {
            Layer::Metal(layer) => layer.artwork.as_deref(),
            Layer::Substrate(layer) => layer.artwork.as_deref(),
        }
    }

    pub fn z_mesh_count(&self) -> Option<usize> {
        match self {
            Layer::Metal(layer) => layer.z_mesh_count,
            Layer::Substrate(layer) => layer.z_mesh_count,
        }
    }

    pub fn export_field(&self) -> bool {
        match self {
            Layer::Metal(layer) => layer.export_field,
            Layer::Substrate(layer) => layer.export_field,
        }
    }

    /// Priority every solid emitted for this layer carries.
    pub fn priority(&self) -> i32 {
        match self {
            Layer::Metal(layer) => layer.priority,
            Layer::Substrate(layer) => layer.effective_priority(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metal_layer_creation() {
        let layer = MetalLayer::new("F.Cu".to_string(), 36)
            .with_artwork("F_Cu".to_string())
            .with_z_mesh_count(3);

        assert_eq!(layer.name, "F.Cu");
        assert_eq!(layer.thickness, 36);
        assert_eq!(layer.artwork.as_deref(), Some("F_Cu"));
        assert_eq!(layer.z_mesh_count, Some(3));
        assert_eq!(layer.priority, MetalLayer::DEFAULT_PRIORITY);
    }

    #[test]
    fn test_odd_metal_thickness_becomes_even() {
        assert_eq!(MetalLayer::new("m".to_string(), 35).thickness, 36);
        assert_eq!(MetalLayer::new("m".to_string(), 0).thickness, 0);
        assert_eq!(MetalLayer::new("m".to_string(), 18).thickness, 18);
    }

    #[test]
    fn test_substrate_priority_offset() {
        let layer = SubstrateLayer::new("core".to_string(), 200, 4.3).with_priority(50, -3);
        assert_eq!(layer.effective_priority(), 47);
        assert_eq!(Layer::Substrate(layer).priority(), 47);
    }

    #[test]
    fn test_layer_enum() {
        let substrate = Layer::Substrate(SubstrateLayer::new("core".to_string(), 200, 4.3));
        let metal = Layer::Metal(MetalLayer::new("F.Cu".to_string(), 36));

        assert!(substrate.is_substrate());
        assert!(!substrate.is_metal());
        assert!(metal.is_metal());
        assert_eq!(metal.kind(), LayerKind::Metal);
        assert_eq!(substrate.kind(), LayerKind::Substrate);
        assert_eq!(substrate.name(), "core");
        assert_eq!(metal.thickness(), 36);
        assert_eq!(metal.artwork(), None);
        assert!(!metal.export_field());
    }
}
