// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/lumamark

//! # lumamark
//!
//! Embeds an invisible, tamper-evident payload into the luminance plane of
//! an image and recovers it later, even from grid-shifted or locally
//! damaged copies. Alongside the watermark, a 1024-dimensional DCT
//! fingerprint is produced for approximate nearest-neighbour lookup in a
//! vector store.
//!
//! The watermark protocol, per 256×256 luminance tile:
//!
//! - each 16×16 block is wavelet-decomposed and two bits are written into
//!   its HL subband via dither-quantised (QIM) DCT projections;
//! - the first row and column of blocks carry a known `(1,1)` verification
//!   pattern used for grid alignment and idempotence detection;
//! - the remaining 225 blocks carry a 136-bit CRC-protected payload frame,
//!   replicated across every tile and recovered by majority vote.
//!
//! # Quick start
//!
//! ```rust,ignore
//! use lumamark::{embed, extract, CancelToken, PayloadFields};
//!
//! let fields = PayloadFields { version: 1, is_ai: false, reserved: 0, metadata_id: 42 };
//! let outcome = embed(&cover, &fields, &CancelToken::new()).unwrap();
//! let marked = image::DynamicImage::ImageRgb8(outcome.image);
//! let recovered = extract(&marked, &CancelToken::new()).unwrap();
//! assert_eq!(recovered.fields.metadata_id, 42);
//! ```

pub mod transform;
pub mod watermark;
pub mod fingerprint;
pub mod store;

pub use transform::dct::{fingerprint_bases, watermark_bases, DctBasis};
pub use transform::ycbcr::{LumaMatrix, YcbcrImage};
pub use watermark::cancel::CancelToken;
pub use watermark::error::{PayloadInvalid, WatermarkError};
pub use watermark::payload::PayloadFields;
pub use watermark::{embed, extract, EmbedOutcome, ExtractOutcome, MIN_DIMENSION};
pub use fingerprint::{Fingerprint, FINGERPRINT_DIM};
pub use store::{
    ImageRecord, InMemoryMetadataStore, InMemoryVectorStore, MetadataStore, NewImageRecord,
    VectorStore,
};
