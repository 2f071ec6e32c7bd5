// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Alignment arithmetic shared by the layout engine, the codec and the arena.

/// Round `offset` up to the next multiple of `alignment`.
///
/// `alignment` must be a nonzero power of two; 1 is a no-op. Zero or
/// non-power-of-two alignments are programming errors, not runtime
/// inputs, and panic in release builds too rather than misround.
#[inline]
pub fn align_up(offset: usize, alignment: usize) -> usize {
    assert!(alignment != 0, "alignment must be nonzero");
    assert!(alignment.is_power_of_two(), "alignment must be a power of two");
    if alignment <= 1 {
        return offset;
    }
    let mask = alignment - 1;
    (offset + mask) & !mask
}

/// Padding bytes needed to bring `offset` to `alignment`.
#[inline]
pub fn padding_for(offset: usize, alignment: usize) -> usize {
    align_up(offset, alignment) - offset
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align_up_basic() {
        assert_eq!(align_up(0, 4), 0);
        assert_eq!(align_up(1, 4), 4);
        assert_eq!(align_up(4, 4), 4);
        assert_eq!(align_up(5, 8), 8);
        assert_eq!(align_up(9, 8), 16);
    }

    #[test]
    fn test_align_up_one_is_identity() {
        for offset in 0..32 {
            assert_eq!(align_up(offset, 1), offset);
        }
    }

    #[test]
    #[should_panic(expected = "alignment must be nonzero")]
    fn test_zero_alignment_panics() {
        let _ = align_up(4, 0);
    }

    #[test]
    #[should_panic(expected = "power of two")]
    fn test_non_power_of_two_alignment_panics() {
        let _ = align_up(4, 6);
    }

    #[test]
    fn test_padding_stays_below_alignment() {
        for alignment in [1usize, 2, 4, 8] {
            for offset in 0..64 {
                let padding = padding_for(offset, alignment);
                assert!(padding < alignment, "padding {} at offset {}", padding, offset);
                assert_eq!((offset + padding) % alignment, 0);
            }
        }
    }
}
