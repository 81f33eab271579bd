// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Huang Rui <vowstar@gmail.com>

pub mod drill;
pub mod placement;

pub use drill::*;
pub use placement::*;
