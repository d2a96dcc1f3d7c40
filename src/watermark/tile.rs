// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/lumamark

//! Tile layout: one 256×256 luminance region as a 16×16 grid of blocks.
//!
//! The first row and first column of blocks (31 unique blocks) form the
//! verification frame and always carry `(1, 1)`. The remaining 15×15 data
//! blocks carry two payload bits each in row-major order, 450 bits of
//! capacity; blocks past the end of the payload are left untouched and
//! read back as noise that the majority vote absorbs.

use crate::transform::dct::{watermark_bases, DctBasis};
use crate::transform::dwt::{Subbands, BLOCK_AREA, BLOCK_SIZE};
use crate::transform::ycbcr::LumaMatrix;

use super::block::{embed_block, extract_block};

/// Side length of one watermark tile in luminance samples.
pub const TILE_SIZE: usize = 256;

/// Data blocks per tile: the 15×15 grid outside the verification frame.
pub const DATA_BLOCKS_PER_TILE: usize = 225;

/// Bits recovered from one tile (two per data block).
pub const DATA_BITS_PER_TILE: usize = 2 * DATA_BLOCKS_PER_TILE;

/// Fraction of verification bits that must read `1` for a tile to count
/// as aligned. Protocol constant.
pub const VERIFY_THRESHOLD: f64 = 0.7;

/// Stateful tile codec holding the shared bases plus one block and one
/// subband scratch buffer, reused across every block it visits.
pub struct TileCodec {
    bases: &'static [DctBasis<8>; 2],
    block: [f64; BLOCK_AREA],
    scratch: Subbands,
}

impl TileCodec {
    pub fn new() -> Self {
        Self {
            bases: watermark_bases(),
            block: [0.0; BLOCK_AREA],
            scratch: Subbands::default(),
        }
    }

    fn embed_at(&mut self, luma: &mut LumaMatrix, row: usize, col: usize, bits: (u8, u8)) {
        luma.copy_block(row, col, BLOCK_SIZE, &mut self.block);
        embed_block(&mut self.block, bits, self.bases, &mut self.scratch);
        luma.write_block(row, col, BLOCK_SIZE, &self.block);
    }

    fn extract_at(&mut self, luma: &LumaMatrix, row: usize, col: usize) -> (u8, u8) {
        luma.copy_block(row, col, BLOCK_SIZE, &mut self.block);
        extract_block(&self.block, self.bases, &mut self.scratch)
    }

    /// Write the verification frame and the payload into the tile whose
    /// top-left sample is `(row0, col0)`.
    pub fn embed_tile(
        &mut self,
        luma: &mut LumaMatrix,
        row0: usize,
        col0: usize,
        payload: &[u8],
    ) {
        // Verification frame: the whole first block-row...
        for bx in (0..TILE_SIZE).step_by(BLOCK_SIZE) {
            self.embed_at(luma, row0, col0 + bx, (1, 1));
        }
        // ...and the first block-column below the shared corner.
        for by in (BLOCK_SIZE..TILE_SIZE).step_by(BLOCK_SIZE) {
            self.embed_at(luma, row0 + by, col0, (1, 1));
        }

        // Data region, row-major. Blocks past the payload stay untouched.
        let mut bit_index = 0;
        for by in (BLOCK_SIZE..TILE_SIZE).step_by(BLOCK_SIZE) {
            for bx in (BLOCK_SIZE..TILE_SIZE).step_by(BLOCK_SIZE) {
                if bit_index + 2 > payload.len() {
                    return;
                }
                let bits = (payload[bit_index], payload[bit_index + 1]);
                self.embed_at(luma, row0 + by, col0 + bx, bits);
                bit_index += 2;
            }
        }
    }

    /// Read all 450 data bits of the tile at `(row0, col0)`.
    pub fn extract_tile(&mut self, luma: &LumaMatrix, row0: usize, col0: usize) -> Vec<u8> {
        let mut bits = Vec::with_capacity(DATA_BITS_PER_TILE);
        for by in (BLOCK_SIZE..TILE_SIZE).step_by(BLOCK_SIZE) {
            for bx in (BLOCK_SIZE..TILE_SIZE).step_by(BLOCK_SIZE) {
                let (b0, b1) = self.extract_at(luma, row0 + by, col0 + bx);
                bits.push(b0);
                bits.push(b1);
            }
        }
        bits
    }

    /// Verification predicate for the aligner.
    ///
    /// Checks the first block-row when `check_first_row`, otherwise the
    /// first block-column below the corner (15 blocks; the corner already
    /// belongs to the row check). Accepts when at least
    /// [`VERIFY_THRESHOLD`] of the bits read `1`.
    pub fn verify_tile(
        &mut self,
        luma: &LumaMatrix,
        row0: usize,
        col0: usize,
        check_first_row: bool,
    ) -> bool {
        let mut correct = 0usize;
        let mut total = 0usize;

        if check_first_row {
            for bx in (0..TILE_SIZE).step_by(BLOCK_SIZE) {
                let (b0, b1) = self.extract_at(luma, row0, col0 + bx);
                correct += (b0 == 1) as usize + (b1 == 1) as usize;
                total += 2;
            }
        } else {
            for by in (BLOCK_SIZE..TILE_SIZE).step_by(BLOCK_SIZE) {
                let (b0, b1) = self.extract_at(luma, row0 + by, col0);
                correct += (b0 == 1) as usize + (b1 == 1) as usize;
                total += 2;
            }
        }

        correct as f64 / total as f64 >= VERIFY_THRESHOLD
    }
}

impl Default for TileCodec {
    fn default() -> Self {
        Self::new()
    }
}
