// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Huang Rui <vowstar@gmail.com>

use serde::{Deserialize, Serialize};

/// Feed model the solver attaches to a port box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeedKind {
    /// Distributed microstrip-line feed.
    Microstrip,
    /// Lumped resistive feed.
    Lumped,
    /// Never excited; only lets post-run analysis enumerate one feed per port.
    Virtual,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Port {
    pub name: String,
    pub position: Option<(f64, f64)>,
    pub direction: Option<f64>,
    pub width: f64,
    pub length: f64,
    pub impedance: f64,
    pub signal_layer: usize,
    pub reference_layer: usize,
    pub excite: bool,
}

impl Port {
    pub const DEFAULT_LENGTH: f64 = 1000.0;
    pub const DEFAULT_IMPEDANCE: f64 = 50.0;

    pub fn new(name: String, width: f64, signal_layer: usize, reference_layer: usize) -> Self {
        Self {
            name,
            position: None,
            direction: None,
            width,
            length: Self::DEFAULT_LENGTH,
            impedance: Self::DEFAULT_IMPEDANCE,
            signal_layer,
            reference_layer,
            excite: false,
        }
    }

    pub fn with_placement(mut self, x: f64, y: f64, direction: f64) -> Self {
        self.position = Some((x, y));
        self.direction = Some(direction);
        self
    }

    pub fn with_length(mut self, length: f64) -> Self {
        self.length = length;
        self
    }

    pub fn with_impedance(mut self, impedance: f64) -> Self {
        self.impedance = impedance;
        self
    }

    pub fn with_excite(mut self, excite: bool) -> Self {
        self.excite = excite;
        self
    }

    pub fn is_placed(&self) -> bool {
        self.position.is_some() && self.direction.is_some()
    }
}
