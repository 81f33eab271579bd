// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Huang Rui <vowstar@gmail.com>

use crate::data::layer::{Layer, LayerKind};
use log::debug;
use serde::{Deserialize, Serialize};

/// A layer placed in the stack. `z_start` is the top surface and `z_end` the
/// bottom; z decreases going down from the top copper at 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedLayer {
    pub layer: Layer,
    pub z_start: i64,
    pub z_end: i64,
    /// Running offset when the layer was reached. For metals this is the
    /// centreline, for substrates it equals `z_start`.
    pub offset: i64,
}

impl ResolvedLayer {
    pub fn thickness(&self) -> i64 {
        self.z_start - self.z_end
    }

    /// Whole-unit plane through the middle of the layer, rounded up for odd
    /// spans. On a metal this is its centreline.
    pub fn mid_plane(&self) -> i64 {
        self.z_end + (self.thickness() + 1).div_euclid(2)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedStack {
    layers: Vec<ResolvedLayer>,
    metal_indices: Vec<usize>,
    total_height: i64,
}

impl ResolvedStack {
    /// Embed metals into their neighbouring substrates and place every layer.
    pub fn resolve(mut layers: Vec<Layer>) -> Result<Self, StackError> {
        if layers.is_empty() {
            return Err(StackError::EmptyStack);
        }

        embed_metal_layers(&mut layers);

        let mut offset: i64 = 0;
        let mut resolved = Vec::with_capacity(layers.len());
        let mut metal_indices = Vec::new();

        for (index, layer) in layers.into_iter().enumerate() {
            let thickness = i64::from(layer.thickness());
            let (z_start, z_end) = match layer.kind() {
                LayerKind::Substrate => (offset, offset - thickness),
                LayerKind::Metal => {
                    metal_indices.push(index);
                    (offset + thickness / 2, offset - thickness / 2)
                }
            };

            debug!(
                "Layer #{index} '{}' ({:?}) z=[{z_start}, {z_end}]",
                layer.name(),
                layer.kind()
            );

            // Metals sit inside the substrates around them and do not move
            // the running offset.
            let next_offset = if layer.is_substrate() { z_end } else { offset };

            resolved.push(ResolvedLayer {
                layer,
                z_start,
                z_end,
                offset,
            });
            offset = next_offset;
        }

        Ok(Self {
            layers: resolved,
            metal_indices,
            total_height: -offset,
        })
    }

    pub fn layers(&self) -> &[ResolvedLayer] {
        &self.layers
    }

    pub fn get_layer(&self, index: usize) -> Option<&ResolvedLayer> {
        self.layers.get(index)
    }

    pub fn get_layer_by_name(&self, name: &str) -> Option<&ResolvedLayer> {
        self.layers.iter().find(|entry| entry.layer.name() == name)
    }

    /// z of the top surface of the layer at absolute `index`.
    pub fn layer_top(&self, index: usize) -> Result<i64, StackError> {
        self.layers
            .get(index)
            .map(|entry| entry.z_start)
            .ok_or(StackError::LayerIndexOutOfRange {
                index,
                count: self.layers.len(),
            })
    }

    /// Centreline z of the `metal_index`-th metal layer.
    pub fn metal_offset(&self, metal_index: usize) -> Result<i64, StackError> {
        self.metal_indices
            .get(metal_index)
            .and_then(|&index| self.layers.get(index))
            .map(|entry| entry.offset)
            .ok_or(StackError::MetalIndexOutOfRange {
                index: metal_index,
                count: self.metal_indices.len(),
            })
    }

    pub fn metals(&self) -> impl Iterator<Item = &ResolvedLayer> {
        self.layers.iter().filter(|entry| entry.layer.is_metal())
    }

    pub fn substrates(&self) -> impl Iterator<Item = &ResolvedLayer> {
        self.layers.iter().filter(|entry| entry.layer.is_substrate())
    }

    pub fn get_layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn get_metal_count(&self) -> usize {
        self.metal_indices.len()
    }

    pub fn get_substrate_count(&self) -> usize {
        self.layers.len() - self.metal_indices.len()
    }

    /// Sum of the (embedded) substrate thicknesses. Vias span this height.
    pub fn get_total_height(&self) -> i64 {
        self.total_height
    }

    pub fn bottom_z(&self) -> i64 {
        -self.total_height
    }

    /// Check that substrates tile the stack without gaps and that z never
    /// increases going down.
    pub fn validate_stack(&self) -> Result<(), StackError> {
        let mut expected_top = 0;
        for entry in self.substrates() {
            if entry.z_start != expected_top {
                return Err(StackError::LayerPositionMismatch {
                    layer_name: entry.layer.name().to_string(),
                    expected_z: expected_top,
                    actual_z: entry.z_start,
                });
            }
            expected_top = entry.z_end;
        }

        for pair in self.layers.windows(2) {
            if pair[1].offset > pair[0].offset {
                return Err(StackError::LayerPositionMismatch {
                    layer_name: pair[1].layer.name().to_string(),
                    expected_z: pair[0].offset,
                    actual_z: pair[1].offset,
                });
            }
        }

        Ok(())
    }

    pub fn get_stack_summary(&self) -> StackSummary {
        StackSummary {
            total_layers: self.layers.len(),
            metal_layers: self.get_metal_count(),
            substrate_layers: self.get_substrate_count(),
            exported_layers: self
                .layers
                .iter()
                .filter(|entry| entry.layer.export_field())
                .count(),
            total_height: self.total_height,
        }
    }
}

/// Grow every substrate adjacent to a thick metal by half the metal
/// thickness. Must run before offsets are accumulated.
pub fn embed_metal_layers(layers: &mut [Layer]) {
    let count = layers.len();
    for index in 0..count {
        let delta = match &layers[index] {
            Layer::Metal(metal) if metal.thickness > 0 => metal.thickness / 2,
            _ => continue,
        };

        if index > 0 {
            if let Layer::Substrate(prev) = &mut layers[index - 1] {
                prev.thickness += delta;
            }
        }
        if index + 1 < count {
            if let Layer::Substrate(next) = &mut layers[index + 1] {
                next.thickness += delta;
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackSummary {
    pub total_layers: usize,
    pub metal_layers: usize,
    pub substrate_layers: usize,
    pub exported_layers: usize,
    pub total_height: i64,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StackError {
    #[error("Stack is empty")]
    EmptyStack,

    #[error("Metal layer #{index} does not exist (stack has {count} metal layers)")]
    MetalIndexOutOfRange { index: usize, count: usize },

    #[error("Layer #{index} does not exist (stack has {count} layers)")]
    LayerIndexOutOfRange { index: usize, count: usize },

    #[error("Layer '{layer_name}' position mismatch: expected {expected_z}, got {actual_z}")]
    LayerPositionMismatch {
        layer_name: String,
        expected_z: i64,
        actual_z: i64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::layer::{MetalLayer, SubstrateLayer};

    fn metal(name: &str, thickness: u32) -> Layer {
        Layer::Metal(MetalLayer::new(name.to_string(), thickness))
    }

    fn substrate(name: &str, thickness: u32) -> Layer {
        Layer::Substrate(SubstrateLayer::new(name.to_string(), thickness, 4.3))
    }

    #[test]
    fn test_empty_stack_is_rejected() {
        assert_eq!(ResolvedStack::resolve(Vec::new()), Err(StackError::EmptyStack));
    }

    #[test]
    fn test_substrate_only_height() {
        let stack = ResolvedStack::resolve(vec![
            substrate("a", 100),
            substrate("b", 250),
            substrate("c", 13),
        ])
        .unwrap();

        assert_eq!(stack.get_total_height(), 363);
        assert_eq!(stack.layer_top(1).unwrap(), -100);
        assert_eq!(stack.layer_top(2).unwrap(), -350);
        assert!(stack.validate_stack().is_ok());
    }

    #[test]
    fn test_mid_plane_is_whole_units() {
        let stack = ResolvedStack::resolve(vec![
            metal("F.Cu", 36),
            substrate("a", 100),
            substrate("odd", 13),
        ])
        .unwrap();

        let layers = stack.layers();
        assert_eq!(layers[0].mid_plane(), 0);
        assert_eq!(layers[1].mid_plane(), -59);
        // -118 .. -131: the centre is -124.5, the plane rounds up.
        assert_eq!(layers[2].mid_plane(), -124);
    }

    #[test]
    fn test_metal_embedding_splits_thickness() {
        let stack = ResolvedStack::resolve(vec![
            substrate("prepreg", 100),
            metal("In1.Cu", 36),
            substrate("core", 200),
        ])
        .unwrap();

        let layers = stack.layers();
        assert_eq!(layers[0].thickness(), 118);
        assert_eq!(layers[2].thickness(), 218);
        // Height equals the nominal sum of all three layers.
        assert_eq!(stack.get_total_height(), 100 + 36 + 200);
    }

    #[test]
    fn test_first_metal_grows_only_next_substrate() {
        let stack = ResolvedStack::resolve(vec![
            metal("F.Cu", 36),
            substrate("core", 200),
            metal("B.Cu", 36),
        ])
        .unwrap();

        assert_eq!(stack.layers()[1].thickness(), 236);
        assert_eq!(stack.metal_offset(0).unwrap(), 0);
        assert_eq!(stack.metal_offset(1).unwrap(), -236);
        assert_eq!(stack.layers()[0].z_start, 18);
        assert_eq!(stack.layers()[0].z_end, -18);
        assert_eq!(stack.bottom_z(), -236);
    }

    #[test]
    fn test_zero_thickness_metal_does_not_embed() {
        let stack = ResolvedStack::resolve(vec![
            metal("F.Cu", 0),
            substrate("core", 200),
            metal("B.Cu", 0),
        ])
        .unwrap();

        assert_eq!(stack.get_total_height(), 200);
        assert_eq!(stack.layers()[0].z_start, stack.layers()[0].z_end);
    }

    #[test]
    fn test_metal_index_out_of_range() {
        let stack = ResolvedStack::resolve(vec![metal("F.Cu", 36), substrate("core", 200)])
            .unwrap();

        assert_eq!(
            stack.metal_offset(1),
            Err(StackError::MetalIndexOutOfRange { index: 1, count: 1 })
        );
        assert!(matches!(
            stack.layer_top(5),
            Err(StackError::LayerIndexOutOfRange { .. })
        ));
    }

    #[test]
    fn test_stack_summary() {
        let stack = ResolvedStack::resolve(vec![
            metal("F.Cu", 36),
            substrate("prepreg", 100),
            metal("In1.Cu", 18),
            substrate("core", 1000),
            metal("B.Cu", 36),
        ])
        .unwrap();

        let summary = stack.get_stack_summary();
        assert_eq!(summary.total_layers, 5);
        assert_eq!(summary.metal_layers, 3);
        assert_eq!(summary.substrate_layers, 2);
        assert_eq!(summary.total_height, 100 + 18 + 9 + 1000 + 9 + 18);
        assert!(stack.validate_stack().is_ok());
    }
}
