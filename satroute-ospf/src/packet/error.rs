//
// Copyright (c) The Satroute Core Contributors
//
// See LICENSE for license details.
//

use serde::{Deserialize, Serialize};

// Type aliases.
pub type DecodeResult<T> = Result<T, DecodeError>;

// Wire decode errors.
//
// Malformed input is never truncated silently: any mismatch between the bytes
// consumed and the declared (or inferred) size is reported.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum DecodeError {
    // Buffer too short, or not a multiple of the record size.
    InvalidLength(usize),
    // LSA length field doesn't match the encoded header and body.
    InvalidLsaLength(u16),
    // Bytes left over after a self-delimited structure.
    TrailingData(usize),
}

// ===== impl DecodeError =====

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::InvalidLength(len) => {
                write!(f, "invalid packet length: {}", len)
            }
            DecodeError::InvalidLsaLength(len) => {
                write!(f, "invalid LSA length: {}", len)
            }
            DecodeError::TrailingData(len) => {
                write!(f, "{} bytes of trailing data", len)
            }
        }
    }
}

impl std::error::Error for DecodeError {}
