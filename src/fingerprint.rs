// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/lumamark

//! Perceptual fingerprint: 1024 low-frequency DCT projections.
//!
//! The image is resampled to exactly 256×256 (Catmull-Rom, over an RGBA
//! intermediate with alpha composited onto opaque black), converted to
//! luminance, and cut into 64 non-overlapping 32×32 blocks. Each block is
//! projected onto the sixteen stored `DctBasis<32>` kernels; the
//! concatenation is the fingerprint. The vector is deliberately not
//! normalised; the vector store applies cosine distance.

use image::{imageops::FilterType, DynamicImage};

use crate::transform::dct::fingerprint_bases;
use crate::transform::ycbcr::LumaMatrix;
use crate::watermark::error::WatermarkError;

/// Fingerprint dimensionality: 64 blocks × 16 projections.
pub const FINGERPRINT_DIM: usize = 1024;

const RESIZE_SIDE: usize = 256;
const FP_BLOCK: usize = 32;
const FP_GRID: usize = RESIZE_SIDE / FP_BLOCK;

/// A 1024-dimensional perceptual fingerprint.
#[derive(Debug, Clone, PartialEq)]
pub struct Fingerprint(Vec<f64>);

impl Fingerprint {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }

    /// Cosine similarity in `[-1, 1]`; zero when either vector is null.
    pub fn cosine_similarity(&self, other: &Fingerprint) -> f64 {
        let dot: f64 = self.0.iter().zip(&other.0).map(|(a, b)| a * b).sum();
        let norm_a: f64 = self.0.iter().map(|a| a * a).sum::<f64>().sqrt();
        let norm_b: f64 = other.0.iter().map(|b| b * b).sum::<f64>().sqrt();
        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }
        dot / (norm_a * norm_b)
    }
}

/// Compute the fingerprint of a decoded image.
///
/// Deterministic: the same raster always yields the same vector, exactly.
///
/// # Errors
/// [`WatermarkError::Internal`] if a projection comes out non-finite,
/// which only happens on corrupt pixel data.
pub fn generate(image: &DynamicImage) -> Result<Fingerprint, WatermarkError> {
    let resized = image
        .resize_exact(RESIZE_SIDE as u32, RESIZE_SIDE as u32, FilterType::CatmullRom)
        .to_rgba8();

    // Alpha over opaque black, then BT.601 luma.
    let mut luma = LumaMatrix::new(RESIZE_SIDE, RESIZE_SIDE);
    for (idx, pixel) in resized.pixels().enumerate() {
        let [r, g, b, a] = pixel.0;
        let alpha = a as f64 / 255.0;
        let y = 0.299 * (r as f64) * alpha
            + 0.587 * (g as f64) * alpha
            + 0.114 * (b as f64) * alpha;
        luma.set(idx / RESIZE_SIDE, idx % RESIZE_SIDE, y);
    }

    let bases = fingerprint_bases();
    let mut block = vec![0.0f64; FP_BLOCK * FP_BLOCK];
    let mut vector = Vec::with_capacity(FINGERPRINT_DIM);
    for i in 0..FP_GRID {
        for j in 0..FP_GRID {
            // (i·32, j·32) is (x, y): i walks columns in the outer loop.
            luma.copy_block(j * FP_BLOCK, i * FP_BLOCK, FP_BLOCK, &mut block);
            for basis in bases {
                vector.push(basis.project(&block));
            }
        }
    }
    debug_assert_eq!(vector.len(), FINGERPRINT_DIM);

    if vector.iter().any(|v| !v.is_finite()) {
        return Err(WatermarkError::Internal(
            "non-finite fingerprint component".to_string(),
        ));
    }
    Ok(Fingerprint(vector))
}
