//! MessagePack tag byte constants and the fixed-width tag algebra.

// Nil
pub const NIL: u8 = 0xC0;

// Boolean
pub const FALSE: u8 = 0xC2;
pub const TRUE: u8 = 0xC3;

// Binary
pub const BIN_8: u8 = 0xC4;
pub const BIN_16: u8 = 0xC5;
pub const BIN_32: u8 = 0xC6;

// Extension (explicit length)
pub const EXT_8: u8 = 0xC7;
pub const EXT_16: u8 = 0xC8;
pub const EXT_32: u8 = 0xC9;

// Float (IEEE 754)
pub const FLOAT_32: u8 = 0xCA;
pub const FLOAT_64: u8 = 0xCB;

// Unsigned integer
pub const UINT_8: u8 = 0xCC;
pub const UINT_16: u8 = 0xCD;
pub const UINT_32: u8 = 0xCE;
pub const UINT_64: u8 = 0xCF;

// Signed integer
pub const INT_8: u8 = 0xD0;
pub const INT_16: u8 = 0xD1;
pub const INT_32: u8 = 0xD2;
pub const INT_64: u8 = 0xD3;

// Extension (fixed payload of 1, 2, 4, 8 or 16 bytes)
pub const FIXEXT_1: u8 = 0xD4;
pub const FIXEXT_2: u8 = 0xD5;
pub const FIXEXT_4: u8 = 0xD6;
pub const FIXEXT_8: u8 = 0xD7;
pub const FIXEXT_16: u8 = 0xD8;

// String
// FIXSTR: 0xA0..=0xBF (top 3 bits 101, low 5 bits = byte length 0..31)
pub const STR_8: u8 = 0xD9;
pub const STR_16: u8 = 0xDA;
pub const STR_32: u8 = 0xDB;

// Array
// FIXARRAY: 0x90..=0x9F (high nibble 0x9, low = element count 0..15)
pub const ARRAY_16: u8 = 0xDC;
pub const ARRAY_32: u8 = 0xDD;

// Map
// FIXMAP: 0x80..=0x8F (high nibble 0x8, low = entry count 0..15)
pub const MAP_16: u8 = 0xDE;
pub const MAP_32: u8 = 0xDF;

// Prefixes of the inline families.
pub const FIXMAP_PREFIX: u8 = 0x80;
pub const FIXARRAY_PREFIX: u8 = 0x90;
pub const FIXSTR_PREFIX: u8 = 0xA0;
pub const NEG_FIXINT_PREFIX: u8 = 0xE0;

/// Largest length representable by a fixstr tag.
pub const FIXSTR_MAX: usize = 31;
/// Largest count representable by a fixarray or fixmap tag.
pub const FIXCOLLECTION_MAX: usize = 15;

// -- positive fixint: 0xxx xxxx --

#[inline]
pub const fn pos_fixint(value: u8) -> u8 {
    value & 0x7F
}

#[inline]
pub const fn is_pos_fixint(tag: u8) -> bool {
    tag & 0x80 == 0
}

#[inline]
pub const fn read_pos_fixint(tag: u8) -> u8 {
    tag & 0x7F
}

// -- negative fixint: 111x xxxx --

#[inline]
pub const fn neg_fixint(value: i8) -> u8 {
    NEG_FIXINT_PREFIX | (value as u8 & 0x1F)
}

#[inline]
pub const fn is_neg_fixint(tag: u8) -> bool {
    tag & 0xE0 == NEG_FIXINT_PREFIX
}

#[inline]
pub const fn read_neg_fixint(tag: u8) -> i8 {
    tag as i8
}

// -- fixmap: 1000 xxxx --

#[inline]
pub const fn fixmap(len: usize) -> u8 {
    FIXMAP_PREFIX | (len as u8 & 0x0F)
}

#[inline]
pub const fn is_fixmap(tag: u8) -> bool {
    tag & 0xF0 == FIXMAP_PREFIX
}

#[inline]
pub const fn read_fixmap(tag: u8) -> usize {
    (tag & 0x0F) as usize
}

// -- fixarray: 1001 xxxx --

#[inline]
pub const fn fixarray(len: usize) -> u8 {
    FIXARRAY_PREFIX | (len as u8 & 0x0F)
}

#[inline]
pub const fn is_fixarray(tag: u8) -> bool {
    tag & 0xF0 == FIXARRAY_PREFIX
}

#[inline]
pub const fn read_fixarray(tag: u8) -> usize {
    (tag & 0x0F) as usize
}

// -- fixstr: 101x xxxx --

#[inline]
pub const fn fixstr(len: usize) -> u8 {
    FIXSTR_PREFIX | (len as u8 & 0x1F)
}

#[inline]
pub const fn is_fixstr(tag: u8) -> bool {
    tag & 0xE0 == FIXSTR_PREFIX
}

#[inline]
pub const fn read_fixstr(tag: u8) -> usize {
    (tag & 0x1F) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pos_fixint_algebra() {
        for i in 0..=127u8 {
            let tag = pos_fixint(i);
            assert!(is_pos_fixint(tag));
            assert!(!is_neg_fixint(tag));
            assert_eq!(read_pos_fixint(tag), i);
        }
        assert!(!is_pos_fixint(0x80));
    }

    #[test]
    fn neg_fixint_algebra() {
        for i in -32..=-1i8 {
            let tag = neg_fixint(i);
            assert!(is_neg_fixint(tag), "tag {tag:#04x}");
            assert!(!is_pos_fixint(tag));
            assert_eq!(read_neg_fixint(tag), i);
        }
        assert_eq!(neg_fixint(-1), 0xFF);
        assert_eq!(neg_fixint(-32), 0xE0);
        assert_eq!(neg_fixint(-7), 0xF9);
    }

    #[test]
    fn fixstr_algebra() {
        for len in 0..=FIXSTR_MAX {
            let tag = fixstr(len);
            assert!(is_fixstr(tag));
            assert!(!is_fixarray(tag) && !is_fixmap(tag));
            assert_eq!(read_fixstr(tag), len);
        }
        assert_eq!(fixstr(0), 0xA0);
        assert_eq!(fixstr(31), 0xBF);
    }

    #[test]
    fn fixarray_algebra() {
        for len in 0..=FIXCOLLECTION_MAX {
            let tag = fixarray(len);
            assert!(is_fixarray(tag));
            assert!(!is_fixmap(tag) && !is_fixstr(tag));
            assert_eq!(read_fixarray(tag), len);
        }
    }

    #[test]
    fn fixmap_algebra() {
        for len in 0..=FIXCOLLECTION_MAX {
            let tag = fixmap(len);
            assert!(is_fixmap(tag));
            assert!(!is_fixarray(tag) && !is_fixstr(tag));
            assert_eq!(read_fixmap(tag), len);
        }
    }
}
