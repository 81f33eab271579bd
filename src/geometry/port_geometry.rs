// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Huang Rui <vowstar@gmail.com>

use crate::data::{FeedKind, Material, Port, ResolvedStack, StackError, PORT_MATERIAL};
use crate::geometry::scene::{Axis, PortBox, PortFeed, SceneBuilder, Shape};
use log::debug;

/// Port geometry in board coordinates, ready to become a feed.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPort {
    pub number: usize,
    pub name: String,
    pub bounds: PortBox,
    pub propagation: Axis,
    pub impedance: f64,
    pub excite: bool,
}

impl ResolvedPort {
    pub fn to_feed(&self, kind: FeedKind, priority: i32) -> PortFeed {
        PortFeed {
            number: self.number,
            name: self.name.clone(),
            kind,
            bounds: self.bounds,
            propagation: self.propagation,
            impedance: self.impedance,
            excite: self.excite && kind != FeedKind::Virtual,
            priority,
        }
    }
}

/// Direction folded into `[0, 360)`.
pub fn normalize_direction(direction: f64) -> f64 {
    direction.rem_euclid(360.0)
}

/// Quarter turns (0..=3) for an axis-aligned direction.
fn quarter_turns(direction: f64) -> Option<u8> {
    let normalized = normalize_direction(direction);
    let quarters = normalized / 90.0;
    if !quarters.is_finite() || quarters.fract() != 0.0 {
        return None;
    }
    Some(quarters as u8 % 4)
}

/// Axis the wave travels along for an axis-aligned direction.
pub fn propagation_axis(direction: f64) -> Option<Axis> {
    quarter_turns(direction).map(|quarters| if quarters % 2 == 0 { Axis::Y } else { Axis::X })
}

/// Exact `(cos, sin)` of a quarter turn.
fn unit_rotation(quarters: u8) -> (f64, f64) {
    match quarters {
        0 => (1.0, 0.0),
        1 => (0.0, 1.0),
        2 => (-1.0, 0.0),
        _ => (0.0, -1.0),
    }
}

/// Resolve port `number` against the stack.
///
/// Direction 0 points along +y with the width across x; every further 90
/// degrees rotates the box counter-clockwise about the port position. z
/// spans from the signal metal's centreline to the reference metal's.
pub fn resolve_port(
    number: usize,
    port: &Port,
    stack: &ResolvedStack,
) -> Result<ResolvedPort, PortError> {
    let (x, y) = port.position.ok_or_else(|| PortError::Unplaced {
        name: port.name.clone(),
    })?;
    let direction = port.direction.ok_or_else(|| PortError::Unplaced {
        name: port.name.clone(),
    })?;
    let quarters = quarter_turns(direction).ok_or_else(|| PortError::NotAxisAligned {
        name: port.name.clone(),
        direction,
    })?;

    let signal_z = stack
        .metal_offset(port.signal_layer)
        .map_err(|source| PortError::Layer {
            name: port.name.clone(),
            source,
        })?;
    let reference_z = stack
        .metal_offset(port.reference_layer)
        .map_err(|source| PortError::Layer {
            name: port.name.clone(),
            source,
        })?;

    let (cos, sin) = unit_rotation(quarters);
    let half_width = port.width / 2.0;
    let length = port.length;

    let start_x = x - half_width * cos;
    let start_y = y - half_width * sin;
    let stop_x = x + half_width * cos - length * sin;
    let stop_y = y + half_width * sin + length * cos;

    let bounds = PortBox {
        start: [start_x.round() as i64, start_y.round() as i64, signal_z],
        stop: [stop_x.round() as i64, stop_y.round() as i64, reference_z],
    };
    let propagation = if quarters % 2 == 0 { Axis::Y } else { Axis::X };

    debug!(
        "Port #{number} '{}' at ({x}, {y}) dir {direction}: {:?} -> {:?} along {}",
        port.name,
        bounds.start,
        bounds.stop,
        propagation.name()
    );

    Ok(ResolvedPort {
        number,
        name: port.name.clone(),
        bounds,
        propagation,
        impedance: port.impedance,
        excite: port.excite,
    })
}

/// Register the port box and its corner lines with the scene.
pub fn emit_port(builder: &mut SceneBuilder, port: &ResolvedPort, kind: FeedKind, priority: i32) {
    for value in [port.bounds.start[0], port.bounds.stop[0]] {
        builder.add_mesh_line(Axis::X, value as f64);
    }
    for value in [port.bounds.start[1], port.bounds.stop[1]] {
        builder.add_mesh_line(Axis::Y, value as f64);
    }

    builder.add_material(Material::metal(PORT_MATERIAL));
    builder.add_solid(
        PORT_MATERIAL,
        priority,
        Shape::Box {
            start: port.bounds.start,
            stop: port.bounds.stop,
        },
    );
    builder.add_port(port.to_feed(kind, priority));
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PortError {
    #[error("Port '{name}' has no position or direction")]
    Unplaced { name: String },

    #[error("Port '{name}' direction {direction} is not a multiple of 90 degrees")]
    NotAxisAligned { name: String, direction: f64 },

    #[error("Port '{name}' references a missing metal layer: {source}")]
    Layer {
        name: String,
        #[source]
        source: StackError,
    },
}
