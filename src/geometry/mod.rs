// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Huang Rui <vowstar@gmail.com>

pub mod compiler;
pub mod embedder;
pub mod mesh;
pub mod port_geometry;
pub mod scene;
pub mod via_geometry;

pub use compiler::*;
pub use embedder::*;
pub use mesh::*;
pub use port_geometry::*;
pub use scene::*;
pub use via_geometry::*;
