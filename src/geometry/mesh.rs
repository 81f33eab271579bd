// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Huang Rui <vowstar@gmail.com>

//! Rectilinear grid synthesis.
//!
//! x and y get a uniform fill over the board plus margin extremes, z gets a
//! per-layer subdivision of the resolved stack. Every coordinate another
//! stage asked for is merged in before sorting, and the gaps towards the
//! margins are filled with geometrically growing steps.

use crate::config::{Margins, MeshSettings};
use crate::data::{BoardExtents, ResolvedStack};
use crate::geometry::scene::{Axis, Grid};
use log::{debug, info};

/// Coordinates requested by the embedder, vias and ports, kept per axis in
/// insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureLines {
    x: Vec<f64>,
    y: Vec<f64>,
    z: Vec<f64>,
}

impl FeatureLines {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, axis: Axis, value: f64) {
        match axis {
            Axis::X => self.x.push(value),
            Axis::Y => self.y.push(value),
            Axis::Z => self.z.push(value),
        }
    }

    pub fn get(&self, axis: Axis) -> &[f64] {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
            Axis::Z => &self.z,
        }
    }

    pub fn len(&self) -> usize {
        self.x.len() + self.y.len() + self.z.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Sort ascending and drop exact duplicates and non-finite values.
pub fn finalize_lines(mut lines: Vec<f64>) -> Vec<f64> {
    lines.retain(|value| value.is_finite());
    lines.sort_by(f64::total_cmp);
    lines.dedup();
    lines
}

/// `count` integral points from `bottom` up across `thickness`. Without
/// `endpoint` the last point stops one pitch short of the top. Points are
/// rounded half up, so the midpoint of an odd span lands on
/// [`ResolvedLayer::mid_plane`](crate::data::ResolvedLayer::mid_plane).
pub fn layer_lines(bottom: i64, thickness: i64, count: usize, endpoint: bool) -> Vec<f64> {
    let divisions = match (count, endpoint) {
        (0, _) => return Vec::new(),
        (1, _) => return vec![bottom as f64],
        (n, true) => n as i64 - 1,
        (n, false) => n as i64,
    };
    (0..count as i64)
        .map(|i| (bottom + (2 * i * thickness + divisions).div_euclid(2 * divisions)) as f64)
        .collect()
}

/// Half-open range `[start, stop)` with a fixed pitch.
pub fn arange(start: f64, stop: f64, step: f64) -> Vec<f64> {
    if step <= 0.0 || stop <= start {
        return Vec::new();
    }
    let count = ((stop - start) / step).ceil() as usize;
    (0..count).map(|i| start + step * i as f64).collect()
}

/// Uniform lines covering one board axis. The fill is offset by half a
/// step so cells straddle the board edges.
pub fn uniform_lines(extent: f64, step: f64) -> Vec<f64> {
    arange(-step / 2.0, extent + step / 2.0, step)
}

/// Fill every gap wider than `max_step`.
///
/// New lines grow away from the side whose existing spacing is finer, each
/// step `ratio` times the previous one and capped at `max_step`. Whatever
/// is left once growth stops is split evenly. Existing lines never move.
pub fn smooth_lines(lines: &[f64], max_step: f64, ratio: f64) -> Vec<f64> {
    let mut smoothed: Vec<f64> = Vec::with_capacity(lines.len());

    for (index, &line) in lines.iter().enumerate() {
        if let Some(&previous) = smoothed.last() {
            let gap = line - previous;
            if gap > max_step {
                let left_step = match smoothed.len() {
                    0 | 1 => max_step,
                    n => (smoothed[n - 1] - smoothed[n - 2]).min(max_step),
                };
                let right_step = lines
                    .get(index + 1)
                    .map_or(max_step, |next| (next - line).min(max_step));

                let filler = fill_gap(previous, line, left_step, right_step, max_step, ratio);
                smoothed.extend(filler);
            }
        }
        smoothed.push(line);
    }

    smoothed
}

fn fill_gap(
    low: f64,
    high: f64,
    left_step: f64,
    right_step: f64,
    max_step: f64,
    ratio: f64,
) -> Vec<f64> {
    let mut left = Vec::new();
    let mut right = Vec::new();
    let (mut low, mut high) = (low, high);
    let (mut left_step, mut right_step) = (left_step, right_step);

    while high - low > max_step && (left_step < max_step || right_step < max_step) {
        let grow_left = left_step <= right_step;
        let current = if grow_left { left_step } else { right_step };
        let step = (current * ratio).min(max_step);

        // Stop growing when the next line would leave a smaller cell behind.
        if high - low - step < step {
            break;
        }

        if grow_left {
            low += step;
            left_step = step;
            left.push(low);
        } else {
            high -= step;
            right_step = step;
            right.push(high);
        }
    }

    let remaining = high - low;
    if remaining > max_step {
        let cells = (remaining / max_step).ceil() as usize;
        let pitch = remaining / cells as f64;
        left.extend((1..cells).map(|i| low + pitch * i as f64));
    }

    right.reverse();
    left.extend(right);
    left
}

/// Raw x or y lines: margin extremes, the uniform board fill and every
/// registered feature line, sorted and unique.
pub fn xy_lines(extent: f64, step: f64, margin: f64, features: &[f64]) -> Vec<f64> {
    let mut lines = vec![-margin, extent + margin];
    lines.extend(uniform_lines(extent, step));
    lines.extend_from_slice(features);
    finalize_lines(lines)
}

/// Raw z lines: a subdivision of every layer of non-zero thickness plus
/// the margin planes above and below the stack.
pub fn z_lines(
    stack: &ResolvedStack,
    settings: &MeshSettings,
    margin: f64,
    export_field: bool,
    features: &[f64],
) -> Vec<f64> {
    let mut lines = Vec::new();

    for entry in stack.layers() {
        if entry.thickness() == 0 {
            continue;
        }

        let is_metal = entry.layer.is_metal();
        let mut count = entry.layer.z_mesh_count().unwrap_or(settings.inter_layers);
        // A dumped layer needs a line through its mid-plane: odd counts with
        // endpoints on metals, even counts without on substrates.
        if export_field && entry.layer.export_field() && (count % 2 == 0) == is_metal {
            count += 1;
        }

        lines.extend(layer_lines(entry.z_end, entry.thickness(), count, is_metal));
    }

    let bottom = stack.bottom_z() as f64;
    lines.extend([margin, 0.0, bottom, bottom - margin]);
    lines.extend_from_slice(features);
    finalize_lines(lines)
}

pub fn synthesize_grid(
    extents: Option<BoardExtents>,
    stack: &ResolvedStack,
    settings: &MeshSettings,
    margins: &Margins,
    export_field: bool,
    features: &FeatureLines,
) -> Result<Grid, MeshError> {
    let extents = extents.ok_or(MeshError::BoardExtentsUnknown)?;
    validate_settings(settings)?;

    let ratio = settings.smoothing_ratio;
    let x = xy_lines(
        extents.width as f64,
        settings.xy_step,
        margins.xy,
        features.get(Axis::X),
    );
    let y = xy_lines(
        extents.height as f64,
        settings.xy_step,
        margins.xy,
        features.get(Axis::Y),
    );
    let z = z_lines(stack, settings, margins.z, export_field, features.get(Axis::Z));
    debug!(
        "Raw mesh lines: x={} y={} z={} ({} feature lines)",
        x.len(),
        y.len(),
        z.len(),
        features.len()
    );

    let grid = Grid {
        x: smooth_lines(&x, settings.margin_step_xy, ratio),
        y: smooth_lines(&y, settings.margin_step_xy, ratio),
        z: smooth_lines(&z, settings.margin_step_z, ratio),
    };

    info!(
        "Mesh: x={} y={} z={} lines, {} cells",
        grid.x.len(),
        grid.y.len(),
        grid.z.len(),
        grid.cell_count()
    );
    Ok(grid)
}

fn validate_settings(settings: &MeshSettings) -> Result<(), MeshError> {
    for (name, step) in [
        ("xy", settings.xy_step),
        ("margin xy", settings.margin_step_xy),
        ("margin z", settings.margin_step_z),
    ] {
        if !(step.is_finite() && step > 0.0) {
            return Err(MeshError::InvalidStep {
                name: name.to_string(),
                step,
            });
        }
    }
    if settings.smoothing_ratio.is_nan() || settings.smoothing_ratio <= 1.0 {
        return Err(MeshError::InvalidSmoothingRatio(settings.smoothing_ratio));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MeshError {
    #[error("Board extents are unknown; load the layer artwork before meshing")]
    BoardExtentsUnknown,

    #[error("Mesh step '{name}' must be positive, got {step}")]
    InvalidStep { name: String, step: f64 },

    #[error("Smoothing ratio must be greater than 1, got {0}")]
    InvalidSmoothingRatio(f64),
}
