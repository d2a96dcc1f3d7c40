// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/lumamark

//! Single-level 2-D Haar wavelet on 16×16 blocks.
//!
//! Separable and unnormalised: the analysis pair is `(a + b, a − b)`,
//! applied along rows and then columns, yielding four 8×8 subbands
//! LL / LH / HL / HH. Synthesis is `((l + h) / 2, (l − h) / 2)`, which
//! reconstructs the input exactly up to f64 rounding. The embedder only
//! ever writes the HL (horizontal-high / vertical-low) subband.

/// Side length of the spatial block fed to the transform.
pub const BLOCK_SIZE: usize = 16;

/// Side length of each subband.
pub const SUBBAND_SIZE: usize = 8;

/// Samples per subband.
pub const SUB_AREA: usize = SUBBAND_SIZE * SUBBAND_SIZE;

/// Samples per spatial block.
pub const BLOCK_AREA: usize = BLOCK_SIZE * BLOCK_SIZE;

/// The four 8×8 subbands of one 16×16 block, row-major.
#[derive(Debug, Clone)]
pub struct Subbands {
    pub ll: [f64; SUB_AREA],
    pub lh: [f64; SUB_AREA],
    pub hl: [f64; SUB_AREA],
    pub hh: [f64; SUB_AREA],
}

impl Default for Subbands {
    fn default() -> Self {
        Self {
            ll: [0.0; SUB_AREA],
            lh: [0.0; SUB_AREA],
            hl: [0.0; SUB_AREA],
            hh: [0.0; SUB_AREA],
        }
    }
}

/// Forward transform: rows first, then columns of the intermediate.
pub fn forward_into(block: &[f64; BLOCK_AREA], out: &mut Subbands) {
    // Row pass: left half carries sums, right half differences.
    let mut temp = [0.0f64; BLOCK_AREA];
    for r in 0..BLOCK_SIZE {
        for k in 0..SUBBAND_SIZE {
            let a = block[r * BLOCK_SIZE + 2 * k];
            let b = block[r * BLOCK_SIZE + 2 * k + 1];
            temp[r * BLOCK_SIZE + k] = a + b;
            temp[r * BLOCK_SIZE + SUBBAND_SIZE + k] = a - b;
        }
    }

    // Column pass straight into the quadrants. Vertical sums land in
    // LL/HL, vertical differences in LH/HH; the column half decides
    // horizontal-low (LL/LH) vs horizontal-high (HL/HH).
    for c in 0..BLOCK_SIZE {
        for k in 0..SUBBAND_SIZE {
            let a = temp[(2 * k) * BLOCK_SIZE + c];
            let b = temp[(2 * k + 1) * BLOCK_SIZE + c];
            let low = a + b;
            let high = a - b;
            if c < SUBBAND_SIZE {
                out.ll[k * SUBBAND_SIZE + c] = low;
                out.lh[k * SUBBAND_SIZE + c] = high;
            } else {
                out.hl[k * SUBBAND_SIZE + c - SUBBAND_SIZE] = low;
                out.hh[k * SUBBAND_SIZE + c - SUBBAND_SIZE] = high;
            }
        }
    }
}

/// Inverse transform: undo the column pass, then the row pass.
pub fn inverse_into(sub: &Subbands, out: &mut [f64; BLOCK_AREA]) {
    let mut temp = [0.0f64; BLOCK_AREA];
    for c in 0..BLOCK_SIZE {
        for k in 0..SUBBAND_SIZE {
            let (low, high) = if c < SUBBAND_SIZE {
                (sub.ll[k * SUBBAND_SIZE + c], sub.lh[k * SUBBAND_SIZE + c])
            } else {
                (
                    sub.hl[k * SUBBAND_SIZE + c - SUBBAND_SIZE],
                    sub.hh[k * SUBBAND_SIZE + c - SUBBAND_SIZE],
                )
            };
            temp[(2 * k) * BLOCK_SIZE + c] = (low + high) / 2.0;
            temp[(2 * k + 1) * BLOCK_SIZE + c] = (low - high) / 2.0;
        }
    }

    for r in 0..BLOCK_SIZE {
        for k in 0..SUBBAND_SIZE {
            let l = temp[r * BLOCK_SIZE + k];
            let h = temp[r * BLOCK_SIZE + SUBBAND_SIZE + k];
            out[r * BLOCK_SIZE + 2 * k] = (l + h) / 2.0;
            out[r * BLOCK_SIZE + 2 * k + 1] = (l - h) / 2.0;
        }
    }
}
