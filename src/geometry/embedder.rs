// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Huang Rui <vowstar@gmail.com>

use crate::data::{
    metal_material_name, substrate_material_name, ArtworkSet, BoardExtents, Layer, Material,
    ResolvedLayer, ResolvedStack,
};
use crate::geometry::scene::{SceneBuilder, Shape};
use log::{debug, warn};

/// Emit the solids of every layer in the stack.
///
/// Layers without artwork fill the board with a box between their resolved
/// surfaces. Layers with artwork get one solid per contour: thick metals
/// and substrates are extruded down from their top surface, zero-thickness
/// metals become flat polygons on their centreline.
pub fn embed_layers(
    builder: &mut SceneBuilder,
    stack: &ResolvedStack,
    extents: BoardExtents,
    artwork: &ArtworkSet,
) -> Result<(), EmbedError> {
    let mut metal_index = 0;
    let mut substrate_index = 0;

    for entry in stack.layers() {
        let material = match &entry.layer {
            Layer::Metal(_) => {
                let material = Material::metal(&metal_material_name(metal_index));
                metal_index += 1;
                material
            }
            Layer::Substrate(substrate) => {
                let material = Material::dielectric(
                    &substrate_material_name(substrate_index),
                    substrate.epsilon,
                );
                substrate_index += 1;
                material
            }
        };

        let before = builder.solid_count();
        match entry.layer.artwork() {
            None => embed_full_board(builder, entry, extents, &material.name),
            Some(reference) => {
                let contours = artwork
                    .get(reference)
                    .ok_or_else(|| EmbedError::MissingArtwork {
                        layer: entry.layer.name().to_string(),
                        reference: reference.to_string(),
                    })?;
                if contours.is_empty() {
                    warn!(
                        "Artwork '{reference}' of layer '{}' has no contours",
                        entry.layer.name()
                    );
                }
                let outlines: Vec<Vec<[i64; 2]>> = contours
                    .iter()
                    .map(|contour| contour.to_board(extents.height))
                    .collect();
                embed_outlines(builder, entry, &outlines, &material.name);
            }
        }
        debug!(
            "Layer '{}' -> {} ({} solids)",
            entry.layer.name(),
            material.name,
            builder.solid_count() - before
        );

        builder.add_material(material);
    }

    Ok(())
}

fn embed_full_board(
    builder: &mut SceneBuilder,
    entry: &ResolvedLayer,
    extents: BoardExtents,
    material: &str,
) {
    builder.add_solid(
        material,
        entry.layer.priority(),
        Shape::Box {
            start: [0, 0, entry.z_start],
            stop: [extents.width, extents.height, entry.z_end],
        },
    );
}

fn embed_outlines(
    builder: &mut SceneBuilder,
    entry: &ResolvedLayer,
    outlines: &[Vec<[i64; 2]>],
    material: &str,
) {
    let priority = entry.layer.priority();
    let thickness = entry.thickness();

    match &entry.layer {
        Layer::Metal(_) if thickness == 0 => {
            for points in outlines {
                builder.add_solid(
                    material,
                    priority,
                    Shape::FlatPolygon {
                        points: points.clone(),
                        z: entry.offset,
                    },
                );
            }
        }
        Layer::Metal(_) => {
            for points in outlines {
                builder.add_solid(
                    material,
                    priority,
                    Shape::ExtrudedPolygon {
                        points: points.clone(),
                        z: entry.z_start,
                        height: -thickness,
                    },
                );
            }
        }
        Layer::Substrate(substrate) => {
            let duplicates = substrate.duplicate_z.iter().map(|dz| entry.z_start - dz);
            for top in std::iter::once(entry.z_start).chain(duplicates) {
                for points in outlines {
                    builder.add_solid(
                        material,
                        priority,
                        Shape::ExtrudedPolygon {
                            points: points.clone(),
                            z: top,
                            height: -thickness,
                        },
                    );
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EmbedError {
    #[error("Layer '{layer}' references artwork '{reference}' which was not loaded")]
    MissingArtwork { layer: String, reference: String },
}
