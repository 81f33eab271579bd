// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Huang Rui <vowstar@gmail.com>

use approx::assert_relative_eq;
use pcb_ems_geometry::config::ConfigError;
use pcb_ems_geometry::data::*;
use pcb_ems_geometry::load_config;

fn metal(name: &str, thickness: u32) -> Layer {
    Layer::Metal(MetalLayer::new(name.to_string(), thickness))
}

fn substrate(name: &str, thickness: u32, epsilon: f64) -> Layer {
    Layer::Substrate(SubstrateLayer::new(name.to_string(), thickness, epsilon))
}

#[test]
fn test_four_layer_fixture() {
    let config = load_config("tests/data/simulation.json").unwrap();
    let stack = ResolvedStack::resolve(config.layers.clone()).unwrap();

    assert_eq!(stack.get_layer_count(), 5);
    assert_eq!(stack.get_metal_count(), 3);
    assert_eq!(stack.get_substrate_count(), 2);

    // 35 -> 36 and 15 -> 16 um copper, half of each goes into its neighbours.
    let layers = stack.layers();
    assert_eq!(layers[0].thickness(), 36);
    assert_eq!(layers[1].thickness(), 210 + 18 + 8);
    assert_eq!(layers[2].thickness(), 16);
    assert_eq!(layers[3].thickness(), 1065 + 8 + 18);
    assert_eq!(stack.get_total_height(), 1327);

    assert_eq!(stack.metal_offset(0).unwrap(), 0);
    assert_eq!(stack.metal_offset(1).unwrap(), -236);
    assert_eq!(stack.metal_offset(2).unwrap(), -1327);
    assert_eq!(stack.layer_top(3).unwrap(), -236);
    assert!(stack.validate_stack().is_ok());

    assert_eq!(layers[3].mid_plane(), -781);
    assert_eq!(layers[2].mid_plane(), -236);
    assert_eq!(layers[2].z_start, -228);
    assert_eq!(layers[2].z_end, -244);
}

#[test]
fn test_substrates_tile_without_gaps() {
    let stack = ResolvedStack::resolve(vec![
        metal("F.Cu", 36),
        substrate("prepreg", 100, 4.2),
        metal("In1.Cu", 18),
        substrate("core", 800, 4.6),
        metal("In2.Cu", 18),
        substrate("prepreg2", 100, 4.2),
        metal("B.Cu", 36),
    ])
    .unwrap();

    let mut expected_top = 0;
    for entry in stack.substrates() {
        assert_eq!(entry.z_start, expected_top);
        expected_top = entry.z_end;
    }
    assert_eq!(expected_top, stack.bottom_z());

    // Metal centrelines sit exactly on substrate interfaces.
    for entry in stack.metals() {
        assert_eq!(entry.z_start - entry.offset, entry.layer.thickness() as i64 / 2);
    }
}

#[test]
fn test_metal_offsets_are_monotonic() {
    let stack = ResolvedStack::resolve(vec![
        metal("F.Cu", 36),
        substrate("a", 100, 4.2),
        metal("In1.Cu", 0),
        substrate("b", 300, 4.2),
        metal("B.Cu", 36),
    ])
    .unwrap();

    let offsets: Vec<i64> = (0..stack.get_metal_count())
        .map(|index| stack.metal_offset(index).unwrap())
        .collect();
    assert_eq!(offsets, vec![0, -118, -436]);
    assert!(offsets.windows(2).all(|pair| pair[1] < pair[0]));
}

#[test]
fn test_missing_metal_layer_reference() {
    let stack = ResolvedStack::resolve(vec![metal("F.Cu", 36), substrate("core", 200, 4.5)])
        .unwrap();

    assert_eq!(
        stack.metal_offset(3),
        Err(StackError::MetalIndexOutOfRange { index: 3, count: 1 })
    );
}

#[test]
fn test_fixture_config_values() {
    let config = load_config("tests/data/simulation.json").unwrap();

    assert_eq!(config.ports.len(), 2);
    assert_eq!(config.ports[0].name, "Input");
    assert_eq!(config.ports[0].reference_layer, 2);
    assert_eq!(config.excited_ports(), vec![0]);
    assert_relative_eq!(config.offset.0, 100.0);
    assert_relative_eq!(config.offset.1, 50.0);
    assert_eq!(config.layers[2].z_mesh_count(), Some(3));
    assert!(config.layers[3].export_field());
}

#[test]
fn test_unsupported_format_version() {
    let result = pcb_ems_geometry::SimulationConfig::from_json_str(
        r#"{"format_version": "2.0", "max_steps": 10, "ports": []}"#,
    );
    assert!(matches!(
        result,
        Err(ConfigError::UnsupportedVersion { .. })
    ));
}
