// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Huang Rui <vowstar@gmail.com>

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Size of one artwork pixel in um.
pub const PIXEL_SIZE: f64 = 10.0;
/// Width of the edge-cut frame around rasterized artwork, in um.
pub const BORDER_THICKNESS: f64 = 50.0;

/// Board size in um, with the origin at the lower-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardExtents {
    pub width: i64,
    pub height: i64,
}

impl BoardExtents {
    pub fn new(width: i64, height: i64) -> Self {
        Self { width, height }
    }

    /// Board size covered by a cropped raster of `width_px` x `height_px`.
    pub fn from_image_size(width_px: u32, height_px: u32) -> Self {
        let width = f64::from(width_px) * PIXEL_SIZE - BORDER_THICKNESS;
        let height = f64::from(height_px) * PIXEL_SIZE - BORDER_THICKNESS;
        Self {
            width: width.round() as i64,
            height: height.round() as i64,
        }
    }
}

/// Scale a mesher point from pixels to um, dropping half the frame.
pub fn image_to_board(point: [f64; 2]) -> [f64; 2] {
    [
        point[0] * PIXEL_SIZE - BORDER_THICKNESS / 2.0,
        point[1] * PIXEL_SIZE - BORDER_THICKNESS / 2.0,
    ]
}

/// Closed outline in image space, points stored as `[row, col]` in um.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contour {
    pub points: Vec<[f64; 2]>,
}

impl Contour {
    pub fn new(points: Vec<[f64; 2]>) -> Self {
        Self { points }
    }

    /// Map into board space. Rasters are stored top-down, the board is
    /// bottom-up, so `(row, col)` becomes `(col, board_height - row)`.
    pub fn to_board(&self, board_height: i64) -> Vec<[i64; 2]> {
        let height = board_height as f64;
        self.points
            .iter()
            .map(|&[row, col]| [col.round() as i64, (height - row).round() as i64])
            .collect()
    }
}

/// Triangulated artwork for one layer as written by the external mesher.
/// Points are in pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artwork {
    pub width_px: u32,
    pub height_px: u32,
    pub contours: Vec<Vec<[f64; 2]>>,
}

impl Artwork {
    pub fn extents(&self) -> BoardExtents {
        BoardExtents::from_image_size(self.width_px, self.height_px)
    }

    pub fn board_contours(&self) -> Vec<Contour> {
        self.contours
            .iter()
            .map(|points| Contour::new(points.iter().map(|&p| image_to_board(p)).collect()))
            .collect()
    }
}

/// Contours of every artwork reference used by the stack.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArtworkSet {
    contours: HashMap<String, Vec<Contour>>,
}

impl ArtworkSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, reference: &str, contours: Vec<Contour>) {
        self.contours.insert(reference.to_string(), contours);
    }

    pub fn get(&self, reference: &str) -> Option<&[Contour]> {
        self.contours.get(reference).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.contours.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contours.is_empty()
    }
}
