// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/lumamark

//! Error types for the watermark pipeline.
//!
//! [`WatermarkError`] covers all failure modes from dimension validation
//! through grid alignment and payload recovery. None of these panic the
//! process; the service layer maps them onto HTTP status codes.

use core::fmt;

/// Why a single 136-bit payload frame failed to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadInvalid {
    /// Fewer than 136 bits were supplied.
    Length,
    /// The 16-bit start sentinel did not match `0xF0F0`.
    StartFlag,
    /// The 16-bit end sentinel did not match `0x0F0F`.
    EndFlag,
    /// The embedded CRC-32 disagrees with the protected fields.
    Crc,
    /// A field handed to the encoder exceeds its bit width.
    FieldRange(&'static str),
}

impl fmt::Display for PayloadInvalid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Length => write!(f, "wrong payload length"),
            Self::StartFlag => write!(f, "start flag mismatch"),
            Self::EndFlag => write!(f, "end flag mismatch"),
            Self::Crc => write!(f, "CRC mismatch, payload corrupted"),
            Self::FieldRange(field) => write!(f, "{field} exceeds its field width"),
        }
    }
}

impl std::error::Error for PayloadInvalid {}

/// Errors that can occur during watermark embedding or extraction.
#[derive(Debug)]
pub enum WatermarkError {
    /// The image is smaller than one 256×256 tile in either dimension.
    InvalidImage,
    /// The image already carries a verification grid; embedding refused.
    AlreadyWatermarked,
    /// No tile offset produced a valid verification pattern.
    NoWatermark,
    /// A payload frame failed structural validation.
    PayloadInvalid(PayloadInvalid),
    /// Alignment succeeded but every extracted frame failed validation.
    NoValidPayload,
    /// The operation was cancelled via its [`CancelToken`](super::cancel::CancelToken).
    Cancelled,
    /// Unexpected arithmetic failure; carries context for the log.
    Internal(String),
}

impl fmt::Display for WatermarkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidImage => write!(f, "image too small for a 256x256 watermark tile"),
            Self::AlreadyWatermarked => write!(f, "image already carries a watermark"),
            Self::NoWatermark => write!(f, "no watermark grid found"),
            Self::PayloadInvalid(reason) => write!(f, "invalid payload: {reason}"),
            Self::NoValidPayload => write!(f, "no tile yielded a valid payload frame"),
            Self::Cancelled => write!(f, "operation cancelled"),
            Self::Internal(context) => write!(f, "internal error: {context}"),
        }
    }
}

impl std::error::Error for WatermarkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::PayloadInvalid(reason) => Some(reason),
            _ => None,
        }
    }
}

impl From<PayloadInvalid> for WatermarkError {
    fn from(reason: PayloadInvalid) -> Self {
        Self::PayloadInvalid(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_reason() {
        let err = WatermarkError::from(PayloadInvalid::Crc);
        assert!(err.to_string().contains("CRC"));
        assert!(WatermarkError::NoWatermark.to_string().contains("no watermark"));
    }

    #[test]
    fn payload_reason_is_the_source() {
        use std::error::Error;
        let err = WatermarkError::from(PayloadInvalid::StartFlag);
        assert!(err.source().is_some());
        assert!(WatermarkError::Cancelled.source().is_none());
    }
}
