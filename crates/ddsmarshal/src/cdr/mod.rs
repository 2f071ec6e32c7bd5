// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! CDR wire-format codec.
//!
//! Two incompatible variants exist in the wild and both must be spoken
//! byte-exactly. [`CdrEncoding`] carries the per-type choice; the writer,
//! reader and sizer consult it for string lengths and DHEADER framing.
//! Decoding a payload with the wrong variant is undefined by contract:
//! the variant is fixed per type at schema-definition time and both ends
//! must agree.

pub mod encaps;
pub mod reader;
pub mod sink;
pub mod sizer;
pub mod writer;

pub use encaps::{encapsulation_header, parse_encapsulation_header, ENCAPS_HEADER_SIZE};
pub use reader::CdrReader;
pub use sink::{BufferSink, SliceSink, VecSink};
pub use sizer::CdrSizer;
pub use writer::{CdrWriter, DheaderMark};

use std::fmt;

/// CDR encoding variant selector.
///
/// `Xcdr1` (legacy CDR, DDS v1.2):
/// - string length includes the trailing NUL (`len = bytes + 1`),
/// - no DHEADERs; appendable degrades to final behavior,
/// - encapsulation identifier 0x0000 (BE) / 0x0001 (LE).
///
/// `Xcdr2` (DDS X-Types 1.3):
/// - string length excludes the NUL (`len = bytes`),
/// - appendable/mutable aggregates carry a 4-byte DHEADER,
/// - encapsulation identifier 0x0008 (D_CDR2 BE) / 0x0009 (D_CDR2 LE).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CdrEncoding {
    Xcdr1,
    #[default]
    Xcdr2,
}

impl CdrEncoding {
    /// Whether string length fields count the trailing NUL byte.
    pub fn string_length_includes_nul(self) -> bool {
        matches!(self, CdrEncoding::Xcdr1)
    }

    /// Whether appendable/mutable aggregates are DHEADER-framed.
    pub fn uses_dheader(self) -> bool {
        matches!(self, CdrEncoding::Xcdr2)
    }

    /// DDS `DataRepresentationQosPolicy` value announcing this variant.
    pub fn data_representation_id(self) -> u16 {
        match self {
            CdrEncoding::Xcdr1 => 0,
            CdrEncoding::Xcdr2 => 2,
        }
    }
}

/// Codec error used by the writer, reader and encapsulation helpers.
#[derive(Debug, Clone)]
pub enum CdrError {
    /// Writing would exceed the sink and the sink cannot grow.
    WriteFailed { position: usize, reason: String },
    /// Reading would pass the end of the source buffer.
    ReadFailed { position: usize, reason: String },
    /// Bytes are present but decode to no valid value.
    InvalidData { position: usize, reason: String },
}

impl fmt::Display for CdrError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CdrError::WriteFailed { position, reason } => {
                write!(f, "write failed at position {}: {}", position, reason)
            }
            CdrError::ReadFailed { position, reason } => {
                write!(f, "read failed at position {}: {}", position, reason)
            }
            CdrError::InvalidData { position, reason } => {
                write!(f, "invalid data at position {}: {}", position, reason)
            }
        }
    }
}

impl std::error::Error for CdrError {}

pub type CdrResult<T> = core::result::Result<T, CdrError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_rules() {
        assert!(CdrEncoding::Xcdr1.string_length_includes_nul());
        assert!(!CdrEncoding::Xcdr2.string_length_includes_nul());
        assert!(!CdrEncoding::Xcdr1.uses_dheader());
        assert!(CdrEncoding::Xcdr2.uses_dheader());
    }

    #[test]
    fn test_data_representation_ids() {
        assert_eq!(CdrEncoding::Xcdr1.data_representation_id(), 0);
        assert_eq!(CdrEncoding::Xcdr2.data_representation_id(), 2);
    }

    #[test]
    fn test_cdr_error_display() {
        let err = CdrError::WriteFailed {
            position: 12,
            reason: "buffer too small".into(),
        };
        assert_eq!(
            format!("{}", err),
            "write failed at position 12: buffer too small"
        );

        let err = CdrError::InvalidData {
            position: 4,
            reason: "invalid utf-8".into(),
        };
        assert_eq!(format!("{}", err), "invalid data at position 4: invalid utf-8");
    }
}
