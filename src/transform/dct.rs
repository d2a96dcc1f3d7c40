// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/lumamark

//! Pre-computed DCT basis kernels.
//!
//! A [`DctBasis`] is one `(u, v)` cosine basis matrix with its
//! normalisation, used as a projection target rather than as part of a
//! full spectral decomposition. Two sizes exist: `N = 8` for watermark
//! embedding into HL subbands and `N = 32` for fingerprint projections.
//! Both sets are built once per process and shared read-only.
//!
//! The projection is `Nc · Σ block[x][y] · basis[y][x]` (note the
//! transposed basis indexing). The embedder distributes coefficient deltas
//! back with the same transpose, which makes re-projection after an update
//! recover the target value exactly: the basis is self-inverse under this
//! pairing, and distinct mid-frequency pairs are orthogonal.

use std::f64::consts::PI;
use std::sync::OnceLock;

/// One pre-computed `N×N` cosine basis for a fixed `(u, v)` pair.
#[derive(Debug, Clone)]
pub struct DctBasis<const N: usize> {
    u: usize,
    v: usize,
    uk: f64,
    vk: f64,
    nc: f64,
    basis: [[f64; N]; N],
}

impl<const N: usize> DctBasis<N> {
    pub fn new(u: usize, v: usize) -> Self {
        let n = N as f64;
        let uk = if u == 0 { (1.0 / n).sqrt() } else { (2.0 / n).sqrt() };
        let vk = if v == 0 { (1.0 / n).sqrt() } else { (2.0 / n).sqrt() };

        let mut basis = [[0.0f64; N]; N];
        for (i, row) in basis.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = (PI * (2 * j + 1) as f64 * u as f64 / (2.0 * n)).cos()
                    * (PI * (2 * i + 1) as f64 * v as f64 / (2.0 * n)).cos();
            }
        }

        Self { u, v, uk, vk, nc: uk * vk, basis }
    }

    pub fn uv(&self) -> (usize, usize) {
        (self.u, self.v)
    }

    /// The combined normalisation `Nc = Uk · Vk`.
    pub fn nc(&self) -> f64 {
        self.nc
    }

    #[inline]
    pub fn at(&self, i: usize, j: usize) -> f64 {
        self.basis[i][j]
    }

    /// Project a row-major `N×N` block onto this basis.
    pub fn project(&self, block: &[f64]) -> f64 {
        debug_assert_eq!(block.len(), N * N);
        let mut total = 0.0;
        for y in 0..N {
            for x in 0..N {
                total += block[x * N + y] * self.basis[y][x];
            }
        }
        self.nc * total
    }

    #[cfg(test)]
    fn normalisers(&self) -> (f64, f64) {
        (self.uk, self.vk)
    }
}

static WATERMARK_BASES: OnceLock<[DctBasis<8>; 2]> = OnceLock::new();

/// The two 8×8 mid-frequency bases carrying the watermark bits.
///
/// Pinned to `(u, v) = (1, 2)` and `(2, 1)`. Both sides of the protocol
/// must use the same pairs; changing them breaks every embedded image.
pub fn watermark_bases() -> &'static [DctBasis<8>; 2] {
    WATERMARK_BASES.get_or_init(|| [DctBasis::new(1, 2), DctBasis::new(2, 1)])
}

static FINGERPRINT_BASES: OnceLock<[DctBasis<32>; 16]> = OnceLock::new();

/// The sixteen 32×32 low-frequency bases used for fingerprinting.
///
/// `(u, v)` ranges over `{0..3}²` with `v` in the outer position, so the
/// stored order is `(0,0), (1,0), (2,0), (3,0), (0,1), …`. Fingerprints
/// are only comparable when projected in this exact order.
pub fn fingerprint_bases() -> &'static [DctBasis<32>; 16] {
    FINGERPRINT_BASES.get_or_init(|| std::array::from_fn(|k| DctBasis::new(k % 4, k / 4)))
}
