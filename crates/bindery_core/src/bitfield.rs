//! Typed Bitfields
//!
//! A [`BitField`] names a contiguous run of bits inside a `u64` word. Offset
//! and width are const parameters, so every layout is validated when the
//! field is first used: a field that is empty or spills past bit 63 fails
//! const evaluation instead of silently truncating at runtime.
//!
//! ```rust
//! use bindery_core::bitfield::BitField;
//!
//! type Low = BitField<0, 12>;
//! type High = BitField<12, 4>;
//!
//! let word = High::set(Low::set(0, 0xABC), 0x7);
//! assert_eq!(Low::get(word), 0xABC);
//! assert_eq!(High::get(word), 0x7);
//! ```

/// A `BITS`-wide field starting at bit `OFFSET`.
///
/// The type carries no data; it is a namespace for the mask arithmetic of one
/// field. Use a type alias per field of a layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitField<const OFFSET: u32, const BITS: u32>;

impl<const OFFSET: u32, const BITS: u32> BitField<OFFSET, BITS> {
    const LAYOUT_OK: () = {
        assert!(BITS > 0, "bitfield width must be non-zero");
        assert!(BITS <= 64, "bitfield wider than its word");
        assert!(OFFSET < 64, "bitfield offset outside its word");
        assert!(OFFSET + BITS <= 64, "bitfield spills past bit 63");
    };

    /// First bit of the field.
    pub const SHIFT: u32 = {
        let () = Self::LAYOUT_OK;
        OFFSET
    };

    /// Number of bits in the field.
    pub const WIDTH: u32 = {
        let () = Self::LAYOUT_OK;
        BITS
    };

    /// One past the last bit of the field.
    pub const END: u32 = Self::SHIFT + Self::WIDTH;

    /// Right-aligned mask covering the field.
    pub const MASK: u64 = {
        let () = Self::LAYOUT_OK;
        if BITS == 64 {
            u64::MAX
        } else {
            (1u64 << BITS) - 1
        }
    };

    /// Largest value the field can hold.
    pub const MAX: u64 = Self::MASK;

    /// Extracts the field from `word`.
    #[inline]
    #[must_use]
    pub const fn get(word: u64) -> u64 {
        (word >> Self::SHIFT) & Self::MASK
    }

    /// Returns `word` with the field replaced by `value`.
    ///
    /// Bits of `value` above the field width are dropped; debug builds
    /// assert that none were set.
    #[inline]
    #[must_use]
    pub const fn set(word: u64, value: u64) -> u64 {
        debug_assert!(value <= Self::MASK, "value does not fit its bitfield");
        (word & !(Self::MASK << Self::SHIFT)) | ((value & Self::MASK) << Self::SHIFT)
    }

    /// Whether `value` fits in the field without truncation.
    #[inline]
    #[must_use]
    pub const fn fits(value: u64) -> bool {
        value <= Self::MASK
    }

    /// Single-bit convenience reader.
    #[inline]
    #[must_use]
    pub const fn flag(word: u64) -> bool {
        Self::get(word) != 0
    }

    /// Whether this field and `[other_shift, other_shift + other_width)`
    /// share no bits.
    #[must_use]
    pub const fn disjoint_from(other_shift: u32, other_width: u32) -> bool {
        Self::END <= other_shift || other_shift + other_width <= Self::SHIFT
    }
}

/// Number of bits needed to represent `n` distinct values.
///
/// `ceil_log2(0)` and `ceil_log2(1)` are both 0.
#[must_use]
pub const fn ceil_log2(n: u32) -> u32 {
    if n <= 1 {
        0
    } else {
        u32::BITS - (n - 1).leading_zeros()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Low = BitField<0, 8>;
    type Mid = BitField<8, 5>;
    type Top = BitField<40, 24>;
    type Whole = BitField<0, 64>;

    #[test]
    fn test_fields_do_not_disturb_neighbours() {
        let word = Top::set(Mid::set(Low::set(0, 0xFF), 0x1F), 0xAB_CDEF);
        assert_eq!(Low::get(word), 0xFF);
        assert_eq!(Mid::get(word), 0x1F);
        assert_eq!(Top::get(word), 0xAB_CDEF);

        let word = Mid::set(word, 3);
        assert_eq!(Low::get(word), 0xFF);
        assert_eq!(Mid::get(word), 3);
        assert_eq!(Top::get(word), 0xAB_CDEF);
    }

    #[test]
    fn test_full_width_field() {
        assert_eq!(Whole::MASK, u64::MAX);
        assert_eq!(Whole::get(Whole::set(0, u64::MAX - 1)), u64::MAX - 1);
    }

    #[test]
    fn test_fits_and_end() {
        assert!(Mid::fits(31));
        assert!(!Mid::fits(32));
        assert_eq!(Mid::END, 13);
        assert!(Low::disjoint_from(Mid::SHIFT, Mid::WIDTH));
        assert!(!Low::disjoint_from(4, 8));
    }

    #[test]
    fn test_ceil_log2() {
        assert_eq!(ceil_log2(0), 0);
        assert_eq!(ceil_log2(1), 0);
        assert_eq!(ceil_log2(2), 1);
        assert_eq!(ceil_log2(3), 2);
        assert_eq!(ceil_log2(30), 5);
        assert_eq!(ceil_log2(32), 5);
        assert_eq!(ceil_log2(33), 6);
    }
}
