// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Huang Rui <vowstar@gmail.com>

use serde::{Deserialize, Serialize};

pub const PORT_MATERIAL: &str = "Port";
pub const VIA_MATERIAL: &str = "Via";
pub const VIA_FILLING_MATERIAL: &str = "ViaFilling";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MaterialKind {
    Metal,
    Dielectric { epsilon: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    pub kind: MaterialKind,
}

impl Material {
    pub fn metal(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: MaterialKind::Metal,
        }
    }

    pub fn dielectric(name: &str, epsilon: f64) -> Self {
        Self {
            name: name.to_string(),
            kind: MaterialKind::Dielectric { epsilon },
        }
    }

    pub fn is_metal(&self) -> bool {
        matches!(self.kind, MaterialKind::Metal)
    }

    pub fn epsilon(&self) -> Option<f64> {
        match self.kind {
            MaterialKind::Dielectric { epsilon } => Some(epsilon),
            MaterialKind::Metal => None,
        }
    }
}

/// Material name of the `index`-th metal layer's copper.
pub fn metal_material_name(index: usize) -> String {
    format!("Gerber_{index}")
}

/// Material name of the `index`-th substrate layer.
pub fn substrate_material_name(index: usize) -> String {
    format!("Substrate_{index}")
}

/// Reserved priorities. All of them sit above any layer priority so ports
/// and vias win over the copper and dielectric they pass through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialPriorities {
    pub port: i32,
    pub via_plating: i32,
    pub via_filling: i32,
}

impl Default for MaterialPriorities {
    fn default() -> Self {
        Self {
            port: 200,
            via_plating: 101,
            via_filling: 100,
        }
    }
}
