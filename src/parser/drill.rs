// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Huang Rui <vowstar@gmail.com>

use crate::data::Via;
use log::{debug, warn};
use nom::{
    branch::alt,
    character::complete::{char, u32},
    combinator::{all_consuming, map},
    number::complete::double,
    sequence::preceded,
    IResult, Parser,
};
use std::collections::HashMap;

/// Millimetres to micrometres.
const MM_TO_UM: f64 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrillLine {
    /// `T<n>C<diameter>`
    ToolDefinition { tool: u32, diameter: f64 },
    /// `T<n>`
    ToolSelect(u32),
    /// `X<x>Y<y>`
    Hole { x: f64, y: f64 },
}

fn tool_definition(input: &str) -> IResult<&str, DrillLine> {
    map(
        (preceded(char('T'), u32), preceded(char('C'), double)),
        |(tool, diameter)| DrillLine::ToolDefinition { tool, diameter },
    )
    .parse(input)
}

fn tool_select(input: &str) -> IResult<&str, DrillLine> {
    map(preceded(char('T'), u32), DrillLine::ToolSelect).parse(input)
}

fn hole(input: &str) -> IResult<&str, DrillLine> {
    map(
        (preceded(char('X'), double), preceded(char('Y'), double)),
        |(x, y)| DrillLine::Hole { x, y },
    )
    .parse(input)
}

/// Parse one Excellon line. Headers, G/M codes and anything else this
/// importer does not use yield `None`.
pub fn parse_drill_line(line: &str) -> Option<DrillLine> {
    all_consuming(alt((tool_definition, tool_select, hole)))
        .parse(line.trim())
        .ok()
        .map(|(_, parsed)| parsed)
}

/// Plated through-holes from an Excellon file in metric units.
///
/// `offset` (mm) is subtracted from every hole before conversion to um.
/// Tool 0 is the implicit empty tool with diameter 0.
pub fn parse_drill_file(content: &str, offset: (f64, f64)) -> Result<Vec<Via>, DrillParseError> {
    let mut tools: HashMap<u32, f64> = HashMap::from([(0, 0.0)]);
    let mut current_tool = 0;
    let mut vias = Vec::new();

    for (index, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.starts_with("INCH") {
            return Err(DrillParseError::UnsupportedUnits {
                line: index + 1,
            });
        }

        match parse_drill_line(line) {
            Some(DrillLine::ToolDefinition { tool, diameter }) => {
                if !(diameter.is_finite() && diameter >= 0.0) {
                    return Err(DrillParseError::InvalidDiameter {
                        line: index + 1,
                        tool,
                        diameter,
                    });
                }
                debug!("Drill tool T{tool}: {diameter} mm");
                tools.insert(tool, diameter * MM_TO_UM);
            }
            Some(DrillLine::ToolSelect(tool)) => {
                current_tool = tool;
            }
            Some(DrillLine::Hole { x, y }) => {
                let Some(&diameter) = tools.get(&current_tool) else {
                    warn!(
                        "Drill line {}: tool T{current_tool} is not defined, hole skipped",
                        index + 1
                    );
                    continue;
                };
                let x = (x - offset.0) * MM_TO_UM;
                let y = (y - offset.1) * MM_TO_UM;
                let via = Via::new(x, y, diameter);
                if !via.is_on_board() {
                    warn!("Drill position is possibly outside of the board: x={x}, y={y}");
                }
                vias.push(via);
            }
            None if line.starts_with('X') => {
                return Err(DrillParseError::MalformedLine {
                    line: index + 1,
                    content: line.to_string(),
                });
            }
            None => {}
        }
    }

    debug!("Found {} vias", vias.len());
    Ok(vias)
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DrillParseError {
    #[error("Line {line}: malformed hole '{content}'")]
    MalformedLine { line: usize, content: String },

    #[error("Line {line}: tool T{tool} has invalid diameter {diameter}")]
    InvalidDiameter {
        line: usize,
        tool: u32,
        diameter: f64,
    },

    #[error("Line {line}: inch drill files are not supported, export in millimetres")]
    UnsupportedUnits { line: usize },
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const DRILL_FILE: &str = "M48
; DRILL file {KiCad 7.0.0} date 2024-01-01
; FORMAT={-:-/ absolute / metric / decimal}
FMAT,2
METRIC
T1C0.300
T2C0.800
%
G90
G05
T1
X1.0Y1.0
X2.5Y-0.5
T2
X10.0Y5.0
T0
M30
";

    #[test]
    fn test_parse_drill_lines() {
        assert_eq!(
            parse_drill_line("T1C0.300"),
            Some(DrillLine::ToolDefinition {
                tool: 1,
                diameter: 0.3
            })
        );
        assert_eq!(parse_drill_line("T12"), Some(DrillLine::ToolSelect(12)));
        assert_eq!(
            parse_drill_line("X-1.5Y2.25"),
            Some(DrillLine::Hole { x: -1.5, y: 2.25 })
        );
        assert_eq!(parse_drill_line("M48"), None);
        assert_eq!(parse_drill_line("T1C"), None);
    }

    #[test]
    fn test_parse_drill_file() {
        let vias = parse_drill_file(DRILL_FILE, (0.0, 0.0)).unwrap();
        assert_eq!(vias.len(), 3);

        assert_relative_eq!(vias[0].x, 1000.0);
        assert_relative_eq!(vias[0].y, 1000.0);
        assert_relative_eq!(vias[0].diameter, 300.0);
        assert_relative_eq!(vias[1].y, -500.0);
        assert!(!vias[1].is_on_board());
        assert_relative_eq!(vias[2].diameter, 800.0);
    }

    #[test]
    fn test_offset_is_subtracted() {
        let vias = parse_drill_file(DRILL_FILE, (1.0, 1.0)).unwrap();
        assert_relative_eq!(vias[0].x, 0.0);
        assert_relative_eq!(vias[2].x, 9000.0);
        assert_relative_eq!(vias[2].y, 4000.0);
    }

    #[test]
    fn test_undefined_tool_is_skipped() {
        let vias = parse_drill_file("T5\nX1.0Y1.0\nT0\nX2.0Y2.0\n", (0.0, 0.0)).unwrap();
        assert_eq!(vias.len(), 1);
        assert_relative_eq!(vias[0].diameter, 0.0);
    }

    #[test]
    fn test_malformed_hole() {
        let result = parse_drill_file("T1C0.3\nT1\nXabc\n", (0.0, 0.0));
        assert_eq!(
            result,
            Err(DrillParseError::MalformedLine {
                line: 3,
                content: "Xabc".to_string()
            })
        );
    }

    #[test]
    fn test_inch_files_are_rejected() {
        let result = parse_drill_file("M48\nINCH,LZ\nT1C0.012\n", (0.0, 0.0));
        assert_eq!(result, Err(DrillParseError::UnsupportedUnits { line: 2 }));
    }
}
