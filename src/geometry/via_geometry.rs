// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Huang Rui <vowstar@gmail.com>

use crate::data::{
    Material, MaterialPriorities, ResolvedStack, Via, ViaSettings, VIA_FILLING_MATERIAL,
    VIA_MATERIAL,
};
use crate::geometry::scene::{Axis, SceneBuilder, Shape};
use std::f64::consts::PI;

/// Vertices of a regular polygon. Vertex `i` sits at angle `2*PI*i/sides`
/// measured from +y, so the first vertex is straight above the centre.
pub fn regular_polygon(center: (f64, f64), radius: f64, sides: usize) -> Vec<[f64; 2]> {
    (0..sides)
        .map(|i| {
            let angle = i as f64 / sides as f64 * 2.0 * PI;
            [center.0 + angle.sin() * radius, center.1 + angle.cos() * radius]
        })
        .collect()
}

fn round_points(points: &[[f64; 2]]) -> Vec<[i64; 2]> {
    points
        .iter()
        .map(|&[x, y]| [x.round() as i64, y.round() as i64])
        .collect()
}

/// The two prisms making up one via, both spanning the full stack height.
#[derive(Debug, Clone, PartialEq)]
pub struct ViaPrisms {
    pub filling: Vec<[f64; 2]>,
    /// Outer barrel, wound opposite to the filling.
    pub plating: Vec<[f64; 2]>,
    pub z_bottom: i64,
    pub height: i64,
}

pub fn via_prisms(
    via: &Via,
    settings: &ViaSettings,
    stack: &ResolvedStack,
) -> Result<ViaPrisms, ViaError> {
    if !(via.diameter.is_finite() && via.diameter > 0.0) {
        return Err(ViaError::InvalidDiameter {
            x: via.x,
            y: via.y,
            diameter: via.diameter,
        });
    }
    if settings.polygon_sides < 3 {
        return Err(ViaError::TooFewSides(settings.polygon_sides));
    }

    let center = (via.x, via.y);
    let filling = regular_polygon(center, via.radius(), settings.polygon_sides);
    let mut plating = regular_polygon(
        center,
        via.plated_radius(settings.plating_thickness),
        settings.polygon_sides,
    );
    plating.reverse();

    Ok(ViaPrisms {
        filling,
        plating,
        z_bottom: stack.bottom_z(),
        height: stack.get_total_height(),
    })
}

/// Emit the filling and plating prisms of one via and register every
/// rounded vertex coordinate as a mesh line, so the grid holds the exact
/// edges of both solids.
pub fn emit_via(
    builder: &mut SceneBuilder,
    via: &Via,
    settings: &ViaSettings,
    priorities: &MaterialPriorities,
    stack: &ResolvedStack,
) -> Result<(), ViaError> {
    let prisms = via_prisms(via, settings, stack)?;

    builder.add_material(Material::dielectric(
        VIA_FILLING_MATERIAL,
        settings.filling_epsilon,
    ));
    builder.add_material(Material::metal(VIA_MATERIAL));

    let filling = round_points(&prisms.filling);
    let plating = round_points(&prisms.plating);
    for [x, y] in filling.iter().chain(&plating) {
        builder.add_mesh_line(Axis::X, *x as f64);
        builder.add_mesh_line(Axis::Y, *y as f64);
    }

    builder.add_solid(
        VIA_FILLING_MATERIAL,
        priorities.via_filling,
        Shape::ExtrudedPolygon {
            points: filling,
            z: prisms.z_bottom,
            height: prisms.height,
        },
    );
    builder.add_solid(
        VIA_MATERIAL,
        priorities.via_plating,
        Shape::ExtrudedPolygon {
            points: plating,
            z: prisms.z_bottom,
            height: prisms.height,
        },
    );
    Ok(())
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ViaError {
    #[error("Via at ({x}, {y}) has invalid diameter {diameter}")]
    InvalidDiameter { x: f64, y: f64, diameter: f64 },

    #[error("Via polygon needs at least 3 sides, got {0}")]
    TooFewSides(usize),
}
