// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Huang Rui <vowstar@gmail.com>

use crate::config::SimulationConfig;
use crate::data::{ArtworkSet, BoardExtents, FeedKind, ResolvedStack, StackError, Via};
use crate::geometry::embedder::{embed_layers, EmbedError};
use crate::geometry::mesh::{synthesize_grid, MeshError};
use crate::geometry::port_geometry::{emit_port, resolve_port, PortError};
use crate::geometry::scene::{
    BoundaryCondition, Excitation, FieldDump, PortFeed, Scene, SceneBuilder,
};
use crate::geometry::via_geometry::{emit_via, ViaError};
use log::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompileOptions {
    pub feed: FeedKind,
    pub export_field: bool,
    pub boundary: BoundaryCondition,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            feed: FeedKind::Microstrip,
            export_field: false,
            boundary: BoundaryCondition::Mur,
        }
    }
}

/// Result of one compilation. Skipped entities are listed with the reason
/// they were dropped; they are absent from the scene.
#[derive(Debug, Clone)]
pub struct CompileReport {
    pub scene: Scene,
    pub stack: ResolvedStack,
    pub skipped_ports: Vec<(usize, PortError)>,
    pub skipped_vias: Vec<(usize, ViaError)>,
}

impl CompileReport {
    pub fn is_complete(&self) -> bool {
        self.skipped_ports.is_empty() && self.skipped_vias.is_empty()
    }
}

/// Runs the stages in order: stack, layers, vias, ports, dumps, mesh.
pub struct GeometryCompiler<'a> {
    config: &'a SimulationConfig,
    options: CompileOptions,
}

impl<'a> GeometryCompiler<'a> {
    pub fn new(config: &'a SimulationConfig) -> Self {
        Self {
            config,
            options: CompileOptions::default(),
        }
    }

    pub fn with_options(mut self, options: CompileOptions) -> Self {
        self.options = options;
        self
    }

    pub fn compile(
        &self,
        extents: Option<BoardExtents>,
        artwork: &ArtworkSet,
        vias: &[Via],
    ) -> Result<CompileReport, CompileError> {
        let stack = ResolvedStack::resolve(self.config.layers.clone())?;
        stack.validate_stack()?;
        let extents = extents.ok_or(CompileError::BoardExtentsUnknown)?;
        info!(
            "Stack: {} layers, {} um thick; board {} x {} um",
            stack.get_layer_count(),
            stack.get_total_height(),
            extents.width,
            extents.height
        );

        let mut builder = SceneBuilder::new();
        embed_layers(&mut builder, &stack, extents, artwork)?;

        let skipped_vias = self.add_vias(&mut builder, &stack, vias);
        let skipped_ports = self.add_ports(&mut builder, &stack);

        if self.options.export_field {
            add_field_dumps(&mut builder, &stack, extents, self.config.margin.xy);
        }

        let grid = synthesize_grid(
            Some(extents),
            &stack,
            &self.config.mesh,
            &self.config.margin,
            self.options.export_field,
            builder.features(),
        )?;

        let frequency = &self.config.frequency;
        let scene = builder.build(
            grid,
            self.options.boundary,
            Excitation::Gaussian {
                center: frequency.center(),
                half_bandwidth: frequency.half_bandwidth(),
            },
            self.config.max_steps,
        );
        info!(
            "Scene: {} solids, {} feeds, {} dumps",
            scene.solids.len(),
            scene.ports.len(),
            scene.dumps.len()
        );

        Ok(CompileReport {
            scene,
            stack,
            skipped_ports,
            skipped_vias,
        })
    }

    fn add_vias(
        &self,
        builder: &mut SceneBuilder,
        stack: &ResolvedStack,
        vias: &[Via],
    ) -> Vec<(usize, ViaError)> {
        let mut skipped = Vec::new();
        for (index, via) in vias.iter().enumerate() {
            let result = emit_via(
                builder,
                via,
                &self.config.via,
                &self.config.priorities,
                stack,
            );
            if let Err(err) = result {
                error!("Skipping via #{index}: {err}");
                skipped.push((index, err));
            }
        }
        skipped
    }

    fn add_ports(
        &self,
        builder: &mut SceneBuilder,
        stack: &ResolvedStack,
    ) -> Vec<(usize, PortError)> {
        let mut skipped = Vec::new();
        for (index, port) in self.config.ports.iter().enumerate() {
            match resolve_port(index, port, stack) {
                Ok(resolved) => emit_port(
                    builder,
                    &resolved,
                    self.options.feed,
                    self.config.priorities.port,
                ),
                Err(err) => {
                    error!("Skipping port #{index}: {err}");
                    skipped.push((index, err));
                }
            }
        }
        skipped
    }
}

/// One e-field plane per exported layer, through the layer's mid-plane and
/// reaching into the xy margin.
fn add_field_dumps(
    builder: &mut SceneBuilder,
    stack: &ResolvedStack,
    extents: BoardExtents,
    margin: f64,
) {
    for (index, entry) in stack.layers().iter().enumerate() {
        if !entry.layer.export_field() {
            continue;
        }
        let z = entry.mid_plane() as f64;
        builder.add_dump(FieldDump {
            name: format!("e_field_{index}"),
            start: [-margin, -margin, z],
            stop: [
                extents.width as f64 + margin,
                extents.height as f64 + margin,
                z,
            ],
        });
    }
}

impl Scene {
    /// Feeds for post-run analysis. A scene reloaded without feeds gets one
    /// virtual feed per configured port that still resolves.
    pub fn virtual_feeds(&self, config: &SimulationConfig) -> Result<Vec<PortFeed>, StackError> {
        if !self.ports.is_empty() {
            return Ok(self.ports.clone());
        }

        let stack = ResolvedStack::resolve(config.layers.clone())?;
        let mut feeds = Vec::with_capacity(config.ports.len());
        for (index, port) in config.ports.iter().enumerate() {
            match resolve_port(index, port, &stack) {
                Ok(resolved) => {
                    feeds.push(resolved.to_feed(FeedKind::Virtual, config.priorities.port))
                }
                Err(err) => warn!("No virtual feed for port #{index}: {err}"),
            }
        }
        Ok(feeds)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("Board extents are unknown; the first metal layer's artwork must be loaded first")]
    BoardExtentsUnknown,

    #[error("Stack error: {0}")]
    Stack(#[from] StackError),

    #[error("Embedding error: {0}")]
    Embed(#[from] EmbedError),

    #[error("Mesh error: {0}")]
    Mesh(#[from] MeshError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Layer, MetalLayer, Port, SubstrateLayer};
    use crate::geometry::scene::Axis;

    fn config() -> SimulationConfig {
        let layers = vec![
            Layer::Metal(MetalLayer::new("F.Cu".to_string(), 35).with_export_field(true)),
            Layer::Substrate(SubstrateLayer::new("core".to_string(), 200, 4.5)),
            Layer::Metal(MetalLayer::new("B.Cu".to_string(), 35)),
        ];
        let ports = vec![
            Port::new("SP1".to_string(), 300.0, 0, 1)
                .with_placement(1000.0, 1000.0, 0.0)
                .with_excite(true),
            Port::new("SP2".to_string(), 300.0, 0, 1).with_placement(3000.0, 1000.0, 45.0),
        ];
        SimulationConfig::new(layers, ports)
    }

    #[test]
    fn test_compile_requires_extents() {
        let config = config();
        let result = GeometryCompiler::new(&config).compile(None, &ArtworkSet::new(), &[]);
        assert!(matches!(result, Err(CompileError::BoardExtentsUnknown)));
    }

    #[test]
    fn test_compile_skips_bad_port() {
        let config = config();
        let report = GeometryCompiler::new(&config)
            .compile(
                Some(BoardExtents::new(4000, 3000)),
                &ArtworkSet::new(),
                &[Via::new(2000.0, 2000.0, 300.0)],
            )
            .unwrap();

        assert_eq!(report.skipped_ports.len(), 1);
        assert_eq!(report.skipped_ports[0].0, 1);
        assert!(!report.is_complete());

        let scene = &report.scene;
        assert_eq!(scene.ports.len(), 1);
        assert!(scene.ports[0].excite);
        assert!(scene.grid.contains_line(Axis::X, 850.0));
        assert!(scene.grid.contains_line(Axis::X, 1150.0));
        assert_eq!(scene.solids_of("Via").count(), 1);
        assert!(scene.dumps.is_empty());
    }

    #[test]
    fn test_export_field_adds_dumps() {
        let config = config();
        let options = CompileOptions {
            export_field: true,
            ..CompileOptions::default()
        };
        let report = GeometryCompiler::new(&config)
            .with_options(options)
            .compile(Some(BoardExtents::new(4000, 3000)), &ArtworkSet::new(), &[])
            .unwrap();

        let dumps = &report.scene.dumps;
        assert_eq!(dumps.len(), 1);
        assert_eq!(dumps[0].name, "e_field_0");
        assert_eq!(dumps[0].start, [-3000.0, -3000.0, 0.0]);
        assert_eq!(dumps[0].stop, [7000.0, 6000.0, 0.0]);
        assert!(report.scene.grid.contains_line(Axis::Z, 0.0));
    }

    #[test]
    fn test_virtual_feeds_for_reloaded_scene() {
        let config = config();
        let mut scene = GeometryCompiler::new(&config)
            .compile(Some(BoardExtents::new(4000, 3000)), &ArtworkSet::new(), &[])
            .unwrap()
            .scene;

        assert_eq!(scene.virtual_feeds(&config).unwrap().len(), 1);

        scene.ports.clear();
        let feeds = scene.virtual_feeds(&config).unwrap();
        assert_eq!(feeds.len(), 1);
        assert_eq!(feeds[0].kind, FeedKind::Virtual);
        assert!(!feeds[0].excite);
    }
}
