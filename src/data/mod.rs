// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Huang Rui <vowstar@gmail.com>

pub mod board;
pub mod layer;
pub mod materials;
pub mod port;
pub mod stack;
pub mod via;

pub use board::*;
pub use layer::*;
pub use materials::*;
pub use port::*;
pub use stack::*;
pub use via::*;
