// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Huang Rui <vowstar@gmail.com>

use crate::data::Port;
use log::{debug, error, warn};
use regex::Regex;
use std::collections::HashSet;
use std::io::Read;
use std::sync::OnceLock;

/// Value of footprints that mark a simulation port on the board.
pub const PORT_FOOTPRINT_VALUE: &str = "Simulation_Port";

const MM_TO_UM: f64 = 1000.0;

/// A port footprint found in a pick-and-place file, in um.
#[derive(Debug, Clone, PartialEq)]
pub struct PortPlacement {
    pub number: usize,
    pub position: (f64, f64),
    pub direction: f64,
}

fn designator_number(designator: &str) -> Option<usize> {
    static TRAILING_DIGITS: OnceLock<Option<Regex>> = OnceLock::new();
    let regex = TRAILING_DIGITS
        .get_or_init(|| Regex::new(r"(\d+)$").ok())
        .as_ref()?;
    regex
        .captures(designator.trim())
        .and_then(|captures| captures.get(1))
        .and_then(|digits| digits.as_str().parse().ok())
}

fn parse_field(
    record: &csv::StringRecord,
    column: usize,
    row: usize,
) -> Result<f64, PlacementError> {
    let value = record.get(column).unwrap_or_default().trim();
    value.parse().map_err(|_| PlacementError::InvalidField {
        row,
        column,
        value: value.to_string(),
    })
}

/// Port placements from a KiCad `*-pos.csv` file.
///
/// Columns are `Ref, Val, Package, PosX, PosY, Rot, Side`; the header row
/// is skipped. `offset` (mm) is subtracted from every position.
pub fn parse_placements<R: Read>(
    reader: R,
    offset: (f64, f64),
) -> Result<Vec<PortPlacement>, PlacementError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut placements = Vec::new();
    for (index, record) in csv_reader.records().enumerate() {
        let record = record?;
        let row = index + 2;

        let value = record.get(1).unwrap_or_default();
        if !value.contains(PORT_FOOTPRINT_VALUE) {
            continue;
        }

        let designator = record.get(0).unwrap_or_default();
        let number = designator_number(designator).ok_or_else(|| {
            PlacementError::InvalidDesignator {
                row,
                designator: designator.to_string(),
            }
        })?;

        let x = parse_field(&record, 3, row)?;
        let y = parse_field(&record, 4, row)?;
        let direction = parse_field(&record, 5, row)?;

        debug!("Found port #{number} ({designator}) in placement file");
        placements.push(PortPlacement {
            number,
            position: ((x - offset.0) * MM_TO_UM, (y - offset.1) * MM_TO_UM),
            direction,
        });
    }

    Ok(placements)
}

/// Fill in position and direction of configured ports that have none yet.
/// Returns the indices of ports that are still unplaced afterwards.
pub fn apply_placements(ports: &mut [Port], placements: &[PortPlacement]) -> Vec<usize> {
    let mut placed_here = HashSet::new();

    for placement in placements {
        let Some(port) = ports.get_mut(placement.number) else {
            warn!(
                "Port #{} is on the board but not in the configuration",
                placement.number
            );
            continue;
        };

        if port.is_placed() {
            if placed_here.contains(&placement.number) {
                warn!(
                    "Port #{} is defined twice on the board. Ignoring the second instance",
                    placement.number
                );
            }
            continue;
        }

        port.position = Some(placement.position);
        port.direction = Some(placement.direction);
        placed_here.insert(placement.number);
    }

    let unplaced: Vec<usize> = ports
        .iter()
        .enumerate()
        .filter(|(_, port)| !port.is_placed())
        .map(|(index, _)| index)
        .collect();
    for index in &unplaced {
        error!("Port #{index} is not defined on board. It will be skipped");
    }
    unplaced
}

#[derive(Debug, thiserror::Error)]
pub enum PlacementError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Row {row}: designator '{designator}' has no port number")]
    InvalidDesignator { row: usize, designator: String },

    #[error("Row {row}, column {column}: '{value}' is not a number")]
    InvalidField {
        row: usize,
        column: usize,
        value: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const POS_FILE: &str = "Ref,Val,Package,PosX,PosY,Rot,Side
\"R1\",\"10k\",\"R_0402\",5.0000,5.0000,0.0000,top
\"SP0\",\"Simulation_Port\",\"Port\",1.0000,1.0000,0.0000,top
\"SP1\",\"Simulation_Port\",\"Port\",3.0000,1.0000,90.0000,top
";

    #[test]
    fn test_designator_number() {
        assert_eq!(designator_number("SP12"), Some(12));
        assert_eq!(designator_number("SP0"), Some(0));
        assert_eq!(designator_number("SP"), None);
    }

    #[test]
    fn test_parse_placements() {
        let placements = parse_placements(POS_FILE.as_bytes(), (0.0, 0.0)).unwrap();
        assert_eq!(placements.len(), 2);

        assert_eq!(placements[0].number, 0);
        assert_relative_eq!(placements[0].position.0, 1000.0);
        assert_eq!(placements[1].number, 1);
        assert_relative_eq!(placements[1].position.0, 3000.0);
        assert_relative_eq!(placements[1].direction, 90.0);
    }

    #[test]
    fn test_parse_placements_with_offset() {
        let placements = parse_placements(POS_FILE.as_bytes(), (1.0, 0.5)).unwrap();
        assert_relative_eq!(placements[0].position.0, 0.0);
        assert_relative_eq!(placements[0].position.1, 500.0);
    }

    #[test]
    fn test_invalid_coordinate() {
        let data = "Ref,Val,Package,PosX,PosY,Rot,Side\nSP1,Simulation_Port,Port,abc,1,0,top\n";
        let result = parse_placements(data.as_bytes(), (0.0, 0.0));
        assert!(matches!(
            result,
            Err(PlacementError::InvalidField { row: 2, column: 3, .. })
        ));
    }

    #[test]
    fn test_apply_placements() {
        let mut ports = vec![
            Port::new("SP0".to_string(), 300.0, 0, 1),
            Port::new("SP1".to_string(), 300.0, 0, 1),
            Port::new("SP2".to_string(), 300.0, 0, 1),
        ];
        let placements = vec![
            PortPlacement {
                number: 0,
                position: (1000.0, 1000.0),
                direction: 0.0,
            },
            PortPlacement {
                number: 0,
                position: (5000.0, 5000.0),
                direction: 180.0,
            },
            PortPlacement {
                number: 1,
                position: (3000.0, 1000.0),
                direction: 90.0,
            },
            PortPlacement {
                number: 9,
                position: (0.0, 0.0),
                direction: 0.0,
            },
        ];

        let unplaced = apply_placements(&mut ports, &placements);

        assert_eq!(unplaced, vec![2]);
        assert_eq!(ports[0].position, Some((1000.0, 1000.0)));
        assert_eq!(ports[0].direction, Some(0.0));
        assert_eq!(ports[1].direction, Some(90.0));
    }

    #[test]
    fn test_configured_position_wins() {
        let mut ports =
            vec![Port::new("SP0".to_string(), 300.0, 0, 1).with_placement(10.0, 20.0, 270.0)];
        let placements = vec![PortPlacement {
            number: 0,
            position: (1000.0, 1000.0),
            direction: 0.0,
        }];

        assert!(apply_placements(&mut ports, &placements).is_empty());
        assert_eq!(ports[0].position, Some((10.0, 20.0)));
    }
}
