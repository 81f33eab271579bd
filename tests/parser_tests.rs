// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Huang Rui <vowstar@gmail.com>

use approx::assert_relative_eq;
use pcb_ems_geometry::parser::{parse_drill_line, DrillLine, DrillParseError};
use pcb_ems_geometry::*;
use std::fs;

const FIXTURE_OFFSET: (f64, f64) = (100.0, 50.0);

#[test]
fn test_drill_fixture() {
    let vias = load_vias("tests/data", FIXTURE_OFFSET).unwrap();
    assert_eq!(vias.len(), 5);

    let positions: Vec<(f64, f64)> = vias.iter().map(|via| (via.x, via.y)).collect();
    assert_eq!(
        positions,
        vec![
            (2000.0, 2000.0),
            (4000.0, 2000.0),
            (6000.0, 2000.0),
            (3000.0, 5000.0),
            (-1000.0, 5000.0),
        ]
    );

    assert!(vias[..3].iter().all(|via| via.diameter == 300.0));
    assert!(vias[3..].iter().all(|via| via.diameter == 400.0));

    // Off-board holes are kept, only reported.
    assert!(!vias[4].is_on_board());
    assert_relative_eq!(vias[3].radius(), 200.0);
}

#[test]
fn test_drill_line_classification() {
    assert_eq!(
        parse_drill_line("T3C0.800"),
        Some(DrillLine::ToolDefinition {
            tool: 3,
            diameter: 0.8
        })
    );
    assert_eq!(parse_drill_line("T12"), Some(DrillLine::ToolSelect(12)));
    assert_eq!(
        parse_drill_line("X-1.5Y2.25"),
        Some(DrillLine::Hole { x: -1.5, y: 2.25 })
    );
    assert_eq!(parse_drill_line("M48"), None);
    assert_eq!(parse_drill_line("; T1C0.3 in a comment"), None);
}

#[test]
fn test_drill_errors_report_line_numbers() {
    let error = parse_drill_file("M48\nINCH\n", (0.0, 0.0)).unwrap_err();
    assert_eq!(error, DrillParseError::UnsupportedUnits { line: 2 });

    let error = parse_drill_file("M48\nT1C0.3\nT1\nX1.0\n", (0.0, 0.0)).unwrap_err();
    assert!(matches!(error, DrillParseError::MalformedLine { line: 4, .. }));
}

#[test]
fn test_placement_fixture() {
    let placements = load_placements("tests/data", FIXTURE_OFFSET).unwrap();
    assert_eq!(placements.len(), 2);

    assert_eq!(placements[0].number, 0);
    assert_relative_eq!(placements[0].position.0, 1000.0);
    assert_relative_eq!(placements[0].position.1, 3000.0);
    assert_relative_eq!(placements[0].direction, 0.0);

    assert_eq!(placements[1].number, 1);
    assert_relative_eq!(placements[1].position.0, 7000.0);
    assert_relative_eq!(placements[1].direction, 90.0);
}

#[test]
fn test_fixture_places_every_configured_port() {
    let mut config = load_config("tests/data/simulation.json").unwrap();
    assert!(config.ports.iter().all(|port| !port.is_placed()));

    let placements = load_placements("tests/data", config.offset).unwrap();
    let unplaced = apply_placements(&mut config.ports, &placements);

    assert!(unplaced.is_empty());
    assert_eq!(config.ports[1].position, Some((7000.0, 3000.0)));
    assert_eq!(config.ports[1].direction, Some(90.0));
}

#[test]
fn test_placements_across_both_sides() {
    let temp = tempfile::TempDir::new().unwrap();
    fs::write(
        temp.path().join("board-top-pos.csv"),
        "Ref,Val,Package,PosX,PosY,Rot,Side\nSP0,Simulation_Port,Port,1.0,2.0,0.0,top\n",
    )
    .unwrap();
    fs::write(
        temp.path().join("board-bottom-pos.csv"),
        "Ref,Val,Package,PosX,PosY,Rot,Side\nSP2,Simulation_Port,Port,3.0,4.0,180.0,bottom\n",
    )
    .unwrap();

    let mut placements = load_placements(temp.path(), (0.0, 0.0)).unwrap();
    placements.sort_by_key(|placement| placement.number);
    let numbers: Vec<usize> = placements.iter().map(|p| p.number).collect();
    assert_eq!(numbers, vec![0, 2]);

    let mut ports = vec![
        Port::new("a".to_string(), 300.0, 0, 1),
        Port::new("b".to_string(), 300.0, 0, 1),
        Port::new("c".to_string(), 300.0, 0, 1),
    ];
    let unplaced = apply_placements(&mut ports, &placements);
    assert_eq!(unplaced, vec![1]);
    assert_eq!(ports[2].position, Some((3000.0, 4000.0)));
}

#[test]
fn test_missing_drill_file() {
    let temp = tempfile::TempDir::new().unwrap();
    let result = load_vias(temp.path(), (0.0, 0.0));
    assert!(matches!(result, Err(FileError::DrillFileMissing(_))));
}
