// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/lumamark

//! The 136-bit payload frame and its majority-vote recovery.
//!
//! Frame layout, MSB-first within every field:
//!
//! ```text
//! [ 16 bits] START  = 0xF0F0
//! [  4 bits] version
//! [  1 bit ] is_ai
//! [  3 bits] reserved
//! [ 64 bits] metadata_id (big-endian)
//! [ 32 bits] CRC-32/IEEE over 9 protected bytes
//! [ 16 bits] END    = 0x0F0F
//! ```
//!
//! The protected bytes are `(version << 4) | (is_ai ? 8 : 0) | reserved`
//! followed by the big-endian metadata id. Every tile carries a copy of
//! the same frame; extraction parses the first 136 bits of each tile's
//! 450-bit row and the most frequent valid `(metadata_id, flags)` pair
//! wins.

use std::collections::HashMap;

use tracing::debug;

use super::error::PayloadInvalid;

/// Total frame length in bits.
pub const PAYLOAD_BITS: usize = 136;

const START_FLAG: u16 = 0xF0F0;
const END_FLAG: u16 = 0x0F0F;

/// The structured data carried by the watermark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadFields {
    /// Protocol version, 4 bits.
    pub version: u8,
    /// Set when the image is declared AI-generated.
    pub is_ai: bool,
    /// Future flags, 3 bits, currently zero.
    pub reserved: u8,
    /// Row identifier in the relational metadata store.
    pub metadata_id: u64,
}

impl PayloadFields {
    /// Version, AI flag and reserved bits packed into one byte: the
    /// first protected byte and the vote grouping key.
    pub fn packed_flags(&self) -> u8 {
        let mut byte = (self.version & 0x0F) << 4;
        if self.is_ai {
            byte |= 0x08;
        }
        byte | (self.reserved & 0x07)
    }
}

fn protected_bytes(fields: &PayloadFields) -> [u8; 9] {
    let mut buf = [0u8; 9];
    buf[0] = fields.packed_flags();
    buf[1..].copy_from_slice(&fields.metadata_id.to_be_bytes());
    buf
}

/// Append `width` bits of `value`, most significant first.
fn push_bits(bits: &mut Vec<u8>, value: u64, width: usize) {
    for shift in (0..width).rev() {
        bits.push(((value >> shift) & 1) as u8);
    }
}

/// Read `width` bits starting at `offset`, most significant first.
fn read_bits(bits: &[u8], offset: usize, width: usize) -> u64 {
    bits[offset..offset + width]
        .iter()
        .fold(0u64, |acc, &b| (acc << 1) | (b & 1) as u64)
}

/// Build the 136-bit frame. Validates field widths first.
pub fn encode(fields: &PayloadFields) -> Result<Vec<u8>, PayloadInvalid> {
    if fields.version > 0x0F {
        return Err(PayloadInvalid::FieldRange("version"));
    }
    if fields.reserved > 0x07 {
        return Err(PayloadInvalid::FieldRange("reserved"));
    }

    let crc = crc32fast::hash(&protected_bytes(fields));

    let mut bits = Vec::with_capacity(PAYLOAD_BITS);
    push_bits(&mut bits, START_FLAG as u64, 16);
    push_bits(&mut bits, fields.version as u64, 4);
    bits.push(fields.is_ai as u8);
    push_bits(&mut bits, fields.reserved as u64, 3);
    push_bits(&mut bits, fields.metadata_id, 64);
    push_bits(&mut bits, crc as u64, 32);
    push_bits(&mut bits, END_FLAG as u64, 16);
    debug_assert_eq!(bits.len(), PAYLOAD_BITS);
    Ok(bits)
}

/// Parse the first 136 bits of `bits`, verifying sentinels and CRC.
pub fn decode(bits: &[u8]) -> Result<PayloadFields, PayloadInvalid> {
    if bits.len() < PAYLOAD_BITS {
        return Err(PayloadInvalid::Length);
    }
    if read_bits(bits, 0, 16) != START_FLAG as u64 {
        return Err(PayloadInvalid::StartFlag);
    }
    if read_bits(bits, 120, 16) != END_FLAG as u64 {
        return Err(PayloadInvalid::EndFlag);
    }

    let fields = PayloadFields {
        version: read_bits(bits, 16, 4) as u8,
        is_ai: bits[20] == 1,
        reserved: read_bits(bits, 21, 3) as u8,
        metadata_id: read_bits(bits, 24, 64),
    };

    let embedded_crc = read_bits(bits, 88, 32) as u32;
    if embedded_crc != crc32fast::hash(&protected_bytes(&fields)) {
        return Err(PayloadInvalid::Crc);
    }
    Ok(fields)
}

/// Majority vote across per-tile bit rows.
///
/// Each row is one tile's 450 extracted bits; only its leading frame is
/// meaningful. Valid frames are grouped by `(metadata_id, packed flags)`
/// and the largest group wins; ties break on the key so the result never
/// depends on map iteration order. `None` when no frame validates.
pub fn majority_vote(tile_rows: &[Vec<u8>]) -> Option<PayloadFields> {
    let mut tally: HashMap<(u64, u8), (PayloadFields, usize)> = HashMap::new();
    let mut valid = 0usize;

    for row in tile_rows {
        let Ok(fields) = decode(row) else { continue };
        valid += 1;
        tally
            .entry((fields.metadata_id, fields.packed_flags()))
            .and_modify(|(_, count)| *count += 1)
            .or_insert((fields, 1));
    }

    debug!(valid, tiles = tile_rows.len(), "payload vote over extracted tiles");

    tally
        .into_iter()
        .max_by_key(|&((id, flags), (_, count))| (count, id, flags))
        .map(|(_, (fields, _))| fields)
}
