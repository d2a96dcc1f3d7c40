// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/lumamark

//! Two watermark bits per 16×16 luminance block.
//!
//! The block is wavelet-decomposed, its HL subband is projected onto the
//! two fixed 8×8 DCT bases, both projections are QIM-quantised, and the
//! coefficient deltas are distributed back into HL along the (transposed)
//! basis directions before synthesis. Re-projection after the update
//! recovers the quantised values exactly, so extraction is symmetric.

use crate::transform::dct::DctBasis;
use crate::transform::dwt::{self, Subbands, BLOCK_AREA, SUBBAND_SIZE};

use super::qim::{qim_embed, qim_extract, DELTA};

/// Embed `(b0, b1)` into `block` in place. `scratch` is caller-owned so
/// tile loops can reuse one subband buffer across thousands of blocks.
pub fn embed_block(
    block: &mut [f64; BLOCK_AREA],
    bits: (u8, u8),
    bases: &[DctBasis<8>; 2],
    scratch: &mut Subbands,
) {
    dwt::forward_into(block, scratch);

    let c0 = bases[0].project(&scratch.hl);
    let c1 = bases[1].project(&scratch.hl);
    let m0 = (qim_embed(c0, bits.0, DELTA) - c0) * bases[0].nc();
    let m1 = (qim_embed(c1, bits.1, DELTA) - c1) * bases[1].nc();

    for y in 0..SUBBAND_SIZE {
        for x in 0..SUBBAND_SIZE {
            scratch.hl[x * SUBBAND_SIZE + y] +=
                m0 * bases[0].at(y, x) + m1 * bases[1].at(y, x);
        }
    }

    dwt::inverse_into(scratch, block);
}

/// Read `(b0, b1)` back from a block.
pub fn extract_block(
    block: &[f64; BLOCK_AREA],
    bases: &[DctBasis<8>; 2],
    scratch: &mut Subbands,
) -> (u8, u8) {
    dwt::forward_into(block, scratch);
    let b0 = qim_extract(bases[0].project(&scratch.hl), DELTA);
    let b1 = qim_extract(bases[1].project(&scratch.hl), DELTA);
    (b0, b1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::dct::watermark_bases;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn random_block(rng: &mut ChaCha8Rng) -> [f64; BLOCK_AREA] {
        let mut block = [0.0f64; BLOCK_AREA];
        for v in block.iter_mut() {
            *v = rng.gen_range(0.0..255.0);
        }
        block
    }

    #[test]
    fn roundtrip_all_bit_pairs() {
        let bases = watermark_bases();
        let mut scratch = Subbands::default();
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        for bits in [(0, 0), (0, 1), (1, 0), (1, 1)] {
            for _ in 0..10 {
                let mut block = random_block(&mut rng);
                embed_block(&mut block, bits, bases, &mut scratch);
                assert_eq!(extract_block(&block, bases, &mut scratch), bits);
            }
        }
    }

    #[test]
    fn flat_block_carries_bits() {
        // A constant block projects to exactly zero on both bases; the
        // verification frame depends on (1,1) still being recoverable.
        let bases = watermark_bases();
        let mut scratch = Subbands::default();
        let mut block = [128.0f64; BLOCK_AREA];
        embed_block(&mut block, (1, 1), bases, &mut scratch);
        assert_eq!(extract_block(&block, bases, &mut scratch), (1, 1));
    }

    #[test]
    fn embedding_distortion_is_bounded() {
        let bases = watermark_bases();
        let mut scratch = Subbands::default();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let original = random_block(&mut rng);
        let mut block = original;
        embed_block(&mut block, (1, 0), bases, &mut scratch);
        // Worst case both coefficients move by < Δ; spread over 256
        // samples through Nc and the synthesis halving that stays small.
        for (a, b) in original.iter().zip(block.iter()) {
            assert!((a - b).abs() < 15.0, "{a} -> {b}");
        }
    }

    #[test]
    fn survives_rounding_to_u8() {
        let bases = watermark_bases();
        let mut scratch = Subbands::default();
        let mut rng = ChaCha8Rng::seed_from_u64(13);
        for bits in [(0, 1), (1, 1)] {
            // Stay clear of the clamp range so the only noise is rounding.
            let mut block = [0.0f64; BLOCK_AREA];
            for v in block.iter_mut() {
                *v = rng.gen_range(20.0..235.0);
            }
            embed_block(&mut block, bits, bases, &mut scratch);
            let mut rounded = [0.0f64; BLOCK_AREA];
            for (r, v) in rounded.iter_mut().zip(block.iter()) {
                *r = v.round().clamp(0.0, 255.0);
            }
            assert_eq!(extract_block(&rounded, bases, &mut scratch), bits);
        }
    }
}
