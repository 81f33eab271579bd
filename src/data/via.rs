// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Huang Rui <vowstar@gmail.com>

use serde::{Deserialize, Serialize};

/// Number of sides of the prism used to approximate a round via barrel.
pub const VIA_POLYGON_SIDES: usize = 8;

/// A plated through-hole in board coordinates (um).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Via {
    pub x: f64,
    pub y: f64,
    pub diameter: f64,
}

impl Via {
    pub fn new(x: f64, y: f64, diameter: f64) -> Self {
        Self { x, y, diameter }
    }

    pub fn radius(&self) -> f64 {
        self.diameter / 2.0
    }

    pub fn plated_radius(&self, plating_thickness: f64) -> f64 {
        self.radius() + plating_thickness
    }

    pub fn is_on_board(&self) -> bool {
        self.x >= 0.0 && self.y >= 0.0
    }
}

/// Settings shared by every via of a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViaSettings {
    pub plating_thickness: f64,
    pub filling_epsilon: f64,
    pub polygon_sides: usize,
}

impl Default for ViaSettings {
    fn default() -> Self {
        Self {
            plating_thickness: 50.0,
            filling_epsilon: 1.0,
            polygon_sides: VIA_POLYGON_SIDES,
        }
    }
}
