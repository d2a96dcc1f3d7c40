// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/lumamark

//! Watermark embed and extract orchestration.
//!
//! The write path refuses images that already carry a verification grid,
//! then replicates one encoded payload frame into every full 256×256 tile
//! of the luminance plane, row-major. The read path re-locates the grid,
//! pulls 450 bits out of every visited tile and recovers the payload by
//! majority vote. Both paths finish by fingerprinting the image.
//!
//! Embedding is strictly sequential so the output is bit-for-bit
//! reproducible; extraction never writes, and with the `parallel` feature
//! its tile visits are spread over a rayon pool.

pub mod align;
pub mod block;
pub mod cancel;
pub mod error;
pub mod payload;
pub mod qim;
pub mod tile;

use image::{DynamicImage, GenericImageView, RgbImage};
use tracing::{debug, info, warn};

use crate::fingerprint::{self, Fingerprint};
use crate::transform::ycbcr::{LumaMatrix, YcbcrImage};

use self::align::{locate_grid, Alignment};
use self::cancel::CancelToken;
use self::error::WatermarkError;
use self::payload::PayloadFields;
use self::tile::{TileCodec, TILE_SIZE};

/// Smallest accepted image side: one full tile.
pub const MIN_DIMENSION: u32 = TILE_SIZE as u32;

/// Result of a successful embed.
pub struct EmbedOutcome {
    /// The watermarked raster, same dimensions as the input.
    pub image: RgbImage,
    /// Fingerprint of the watermarked raster.
    pub fingerprint: Fingerprint,
}

/// Result of a successful extract.
pub struct ExtractOutcome {
    /// The recovered payload.
    pub fields: PayloadFields,
    /// Where the tile grid was found.
    pub alignment: Alignment,
    /// Fingerprint of the submitted raster, i.e. the similarity query vector.
    pub fingerprint: Fingerprint,
}

fn validate_dimensions(width: u32, height: u32) -> Result<(), WatermarkError> {
    if width < MIN_DIMENSION || height < MIN_DIMENSION {
        return Err(WatermarkError::InvalidImage);
    }
    Ok(())
}

/// Embed `fields` into every full tile of `image`.
///
/// # Errors
/// - [`WatermarkError::InvalidImage`] if either dimension is below 256.
/// - [`WatermarkError::PayloadInvalid`] if a field exceeds its bit width.
/// - [`WatermarkError::AlreadyWatermarked`] if the grid check matches.
/// - [`WatermarkError::Cancelled`] between tiles when the token fires.
pub fn embed(
    image: &DynamicImage,
    fields: &PayloadFields,
    cancel: &CancelToken,
) -> Result<EmbedOutcome, WatermarkError> {
    validate_dimensions(image.width(), image.height())?;
    cancel.check()?;

    let frame = payload::encode(fields)?;

    let rgb = image.to_rgb8();
    let mut ycbcr = YcbcrImage::from_rgb(&rgb);
    let mut codec = TileCodec::new();

    // Idempotence gate: never stack a second grid onto a marked image.
    if locate_grid(ycbcr.luma(), &mut codec).is_some() {
        warn!("image already carries a watermark grid; refusing embed");
        return Err(WatermarkError::AlreadyWatermarked);
    }

    let tiles_y = ycbcr.height() / TILE_SIZE;
    let tiles_x = ycbcr.width() / TILE_SIZE;
    debug!(tiles_y, tiles_x, "embedding payload frame across tiles");

    for i in 0..tiles_y {
        for j in 0..tiles_x {
            cancel.check()?;
            codec.embed_tile(ycbcr.luma_mut(), i * TILE_SIZE, j * TILE_SIZE, &frame);
        }
    }

    let marked = DynamicImage::ImageRgb8(ycbcr.into_rgb());
    let fingerprint = fingerprint::generate(&marked)?;
    info!(
        metadata_id = fields.metadata_id,
        tiles = tiles_y * tiles_x,
        "watermark embedded"
    );
    Ok(EmbedOutcome { image: marked.into_rgb8(), fingerprint })
}

/// Locate the grid in `image` and recover the payload.
///
/// # Errors
/// - [`WatermarkError::InvalidImage`] if either dimension is below 256.
/// - [`WatermarkError::NoWatermark`] if no tile offset verifies.
/// - [`WatermarkError::NoValidPayload`] if every tile frame fails.
/// - [`WatermarkError::Cancelled`] between tiles when the token fires.
pub fn extract(
    image: &DynamicImage,
    cancel: &CancelToken,
) -> Result<ExtractOutcome, WatermarkError> {
    validate_dimensions(image.width(), image.height())?;
    cancel.check()?;

    let rgb = image.to_rgb8();
    let ycbcr = YcbcrImage::from_rgb(&rgb);
    let mut codec = TileCodec::new();

    let Some(alignment) = locate_grid(ycbcr.luma(), &mut codec) else {
        warn!("no tile offset produced a valid verification pattern");
        return Err(WatermarkError::NoWatermark);
    };
    debug!(
        row_index = alignment.row_index,
        col_index = alignment.col_index,
        "watermark grid located"
    );

    let tiles_y = ycbcr.height() / TILE_SIZE;
    let tiles_x = ycbcr.width() / TILE_SIZE;
    let rows = collect_tile_rows(ycbcr.luma(), alignment, tiles_y, tiles_x, cancel)?;

    let Some(fields) = payload::majority_vote(&rows) else {
        warn!(tiles = rows.len(), "every extracted frame failed validation");
        return Err(WatermarkError::NoValidPayload);
    };
    let fingerprint = fingerprint::generate(image)?;
    info!(metadata_id = fields.metadata_id, "watermark extracted");
    Ok(ExtractOutcome { fields, alignment, fingerprint })
}

/// One 450-bit row per visited tile, visiting
/// `(row_index..tiles_y) × (col_index..tiles_x)` in row-major order.
#[cfg(not(feature = "parallel"))]
fn collect_tile_rows(
    luma: &LumaMatrix,
    alignment: Alignment,
    tiles_y: usize,
    tiles_x: usize,
    cancel: &CancelToken,
) -> Result<Vec<Vec<u8>>, WatermarkError> {
    let mut codec = TileCodec::new();
    let mut rows = Vec::new();
    for i in alignment.row_index..tiles_y {
        for j in alignment.col_index..tiles_x {
            cancel.check()?;
            rows.push(codec.extract_tile(luma, i * TILE_SIZE, j * TILE_SIZE));
        }
    }
    Ok(rows)
}

/// Parallel variant: tiles are read-only and disjoint, and the indexed
/// collect keeps the row order identical to the sequential path.
#[cfg(feature = "parallel")]
fn collect_tile_rows(
    luma: &LumaMatrix,
    alignment: Alignment,
    tiles_y: usize,
    tiles_x: usize,
    cancel: &CancelToken,
) -> Result<Vec<Vec<u8>>, WatermarkError> {
    use rayon::prelude::*;

    let origins: Vec<(usize, usize)> = (alignment.row_index..tiles_y)
        .flat_map(|i| (alignment.col_index..tiles_x).map(move |j| (i, j)))
        .collect();

    origins
        .par_iter()
        .map_init(TileCodec::new, |codec, &(i, j)| {
            cancel.check()?;
            Ok(codec.extract_tile(luma, i * TILE_SIZE, j * TILE_SIZE))
        })
        .collect()
}

#[cfg(test)]
mod dimension_tests {
    use super::*;

    #[test]
    fn minimum_is_one_tile() {
        assert!(validate_dimensions(256, 256).is_ok());
        assert!(validate_dimensions(4096, 256).is_ok());
        assert!(matches!(validate_dimensions(255, 512), Err(WatermarkError::InvalidImage)));
        assert!(matches!(validate_dimensions(512, 255), Err(WatermarkError::InvalidImage)));
    }
}
