// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! RTPS encapsulation identifiers and the 4-byte serialized-payload header.
//!
//! The header is identifier (2 bytes, big-endian on the wire) followed by
//! 2 options bytes (zero here). Generated serializers emit this header
//! themselves, then hand the writer a stream whose position 0 is the first
//! payload byte, so payload alignment is computed from the payload start.

use super::{CdrEncoding, CdrError, CdrResult};

pub const PLAIN_CDR_BE: u16 = 0x0000;
pub const PLAIN_CDR_LE: u16 = 0x0001;
pub const PL_CDR_BE: u16 = 0x0002;
pub const PL_CDR_LE: u16 = 0x0003;
pub const PLAIN_CDR2_BE: u16 = 0x0006;
pub const PLAIN_CDR2_LE: u16 = 0x0007;
pub const D_CDR2_BE: u16 = 0x0008;
pub const D_CDR2_LE: u16 = 0x0009;
pub const PL_CDR2_BE: u16 = 0x000a;
pub const PL_CDR2_LE: u16 = 0x000b;

/// Identifier (2 bytes) + options (2 bytes).
pub const ENCAPS_HEADER_SIZE: usize = 4;

/// Little-endian encapsulation identifier for a variant.
pub fn identifier_le(encoding: CdrEncoding) -> u16 {
    match encoding {
        CdrEncoding::Xcdr1 => PLAIN_CDR_LE,
        CdrEncoding::Xcdr2 => D_CDR2_LE,
    }
}

/// The 4-byte header announcing little-endian payload in `encoding`.
pub fn encapsulation_header(encoding: CdrEncoding) -> [u8; ENCAPS_HEADER_SIZE] {
    let id = identifier_le(encoding).to_be_bytes();
    [id[0], id[1], 0, 0]
}

/// Parse a serialized-payload header.
///
/// Returns the variant and whether the payload is little-endian. Unknown
/// identifiers are [`CdrError::InvalidData`], never coerced to a default.
pub fn parse_encapsulation_header(bytes: &[u8]) -> CdrResult<(CdrEncoding, bool)> {
    if bytes.len() < ENCAPS_HEADER_SIZE {
        return Err(CdrError::ReadFailed {
            position: 0,
            reason: "truncated encapsulation header".into(),
        });
    }
    let id = u16::from_be_bytes([bytes[0], bytes[1]]);
    match id {
        PLAIN_CDR_BE | PL_CDR_BE => Ok((CdrEncoding::Xcdr1, false)),
        PLAIN_CDR_LE | PL_CDR_LE => Ok((CdrEncoding::Xcdr1, true)),
        PLAIN_CDR2_BE | D_CDR2_BE | PL_CDR2_BE => Ok((CdrEncoding::Xcdr2, false)),
        PLAIN_CDR2_LE | D_CDR2_LE | PL_CDR2_LE => Ok((CdrEncoding::Xcdr2, true)),
        other => Err(CdrError::InvalidData {
            position: 0,
            reason: format!("unknown encapsulation identifier 0x{other:04x}"),
        }),
    }
}
