// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/lumamark

//! Locates the watermark tile grid inside a luminance plane.
//!
//! The search runs in two passes over 256-sample strides: first down the
//! rows, accepting the first offset whose tile shows the first-column
//! verification pattern, then along the columns of that row, accepting on
//! the first-row pattern. The same search doubles as the idempotence
//! check before embedding.

use crate::transform::ycbcr::LumaMatrix;

use super::tile::{TileCodec, TILE_SIZE};

/// Tile-grid offset, in whole tiles from the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Alignment {
    /// Index of the first tile row carrying the grid.
    pub row_index: usize,
    /// Index of the first tile column carrying the grid.
    pub col_index: usize,
}

/// Scan for the watermark grid. Returns `None` when no candidate offset
/// verifies, which callers interpret as "not watermarked".
pub fn locate_grid(luma: &LumaMatrix, codec: &mut TileCodec) -> Option<Alignment> {
    let height = luma.height();
    let width = luma.width();

    let mut row_index = None;
    let mut offset = 0;
    while offset + TILE_SIZE <= height {
        if codec.verify_tile(luma, offset, 0, false) {
            row_index = Some(offset / TILE_SIZE);
            break;
        }
        offset += TILE_SIZE;
    }
    let row_index = row_index?;

    let mut offset = 0;
    while offset + TILE_SIZE <= width {
        if codec.verify_tile(luma, row_index * TILE_SIZE, offset, true) {
            return Some(Alignment { row_index, col_index: offset / TILE_SIZE });
        }
        offset += TILE_SIZE;
    }
    None
}
