//! Classification of tag bytes into semantic value types.

use std::fmt;

use super::EXT_TIME;
use super::marker;

/// Semantic category of an encoded MessagePack value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    Nil,
    Bool,
    Int,
    Uint,
    Float,
    String,
    Bytes,
    Array,
    Map,
    Ext,
    /// Extension with the reserved timestamp id (-1).
    Time,
}

impl Type {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Nil => "nil",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Uint => "uint",
            Self::Float => "float",
            Self::String => "string",
            Self::Bytes => "bytes",
            Self::Array => "array",
            Self::Map => "map",
            Self::Ext => "ext",
            Self::Time => "time",
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps an extension type id to `Time` or `Ext`.
pub fn ext_type(id: i8) -> Type {
    if id == EXT_TIME { Type::Time } else { Type::Ext }
}

/// Classifies a tag byte.
///
/// Returns the type together with a flag telling whether the extension
/// type id must be looked at before the final type is known: for the
/// extension family the returned type is `Ext`, and callers resolve it
/// with [`ext_type`] once the id byte is available (see [`ext_header_len`]).
/// Returns `None` for the single byte value that is never used (0xC1).
pub fn classify(tag: u8) -> Option<(Type, bool)> {
    // Inline families first; their bit ranges are mutually exclusive.
    if marker::is_pos_fixint(tag) {
        return Some((Type::Uint, false));
    }
    if marker::is_neg_fixint(tag) {
        return Some((Type::Int, false));
    }
    if marker::is_fixmap(tag) {
        return Some((Type::Map, false));
    }
    if marker::is_fixarray(tag) {
        return Some((Type::Array, false));
    }
    if marker::is_fixstr(tag) {
        return Some((Type::String, false));
    }

    let ty = match tag {
        marker::NIL => Type::Nil,
        marker::FALSE | marker::TRUE => Type::Bool,
        marker::INT_8 | marker::INT_16 | marker::INT_32 | marker::INT_64 => Type::Int,
        marker::UINT_8 | marker::UINT_16 | marker::UINT_32 | marker::UINT_64 => Type::Uint,
        marker::FLOAT_32 | marker::FLOAT_64 => Type::Float,
        marker::BIN_8 | marker::BIN_16 | marker::BIN_32 => Type::Bytes,
        marker::STR_8 | marker::STR_16 | marker::STR_32 => Type::String,
        marker::ARRAY_16 | marker::ARRAY_32 => Type::Array,
        marker::MAP_16 | marker::MAP_32 => Type::Map,
        marker::FIXEXT_1
        | marker::FIXEXT_2
        | marker::FIXEXT_4
        | marker::FIXEXT_8
        | marker::FIXEXT_16
        | marker::EXT_8
        | marker::EXT_16
        | marker::EXT_32 => return Some((Type::Ext, true)),
        _ => return None,
    };
    Some((ty, false))
}

/// Length of the extension header (tag, optional length field, type id)
/// for an extension tag. The type id is always the last header byte.
pub fn ext_header_len(tag: u8) -> Option<usize> {
    match tag {
        marker::FIXEXT_1
        | marker::FIXEXT_2
        | marker::FIXEXT_4
        | marker::FIXEXT_8
        | marker::FIXEXT_16 => Some(2),
        marker::EXT_8 => Some(3),
        marker::EXT_16 => Some(4),
        marker::EXT_32 => Some(6),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_byte_has_one_category() {
        for tag in 0..=u8::MAX {
            match classify(tag) {
                Some(_) => assert_ne!(tag, 0xC1),
                None => assert_eq!(tag, 0xC1),
            }
        }
    }

    #[test]
    fn classify_inline_families() {
        assert_eq!(classify(0x00), Some((Type::Uint, false)));
        assert_eq!(classify(0x7F), Some((Type::Uint, false)));
        assert_eq!(classify(0xE0), Some((Type::Int, false)));
        assert_eq!(classify(0xFF), Some((Type::Int, false)));
        assert_eq!(classify(0x80), Some((Type::Map, false)));
        assert_eq!(classify(0x9F), Some((Type::Array, false)));
        assert_eq!(classify(0xA0), Some((Type::String, false)));
        assert_eq!(classify(0xBF), Some((Type::String, false)));
    }

    #[test]
    fn classify_explicit_tags() {
        assert_eq!(classify(marker::NIL), Some((Type::Nil, false)));
        assert_eq!(classify(marker::TRUE), Some((Type::Bool, false)));
        assert_eq!(classify(marker::INT_64), Some((Type::Int, false)));
        assert_eq!(classify(marker::UINT_16), Some((Type::Uint, false)));
        assert_eq!(classify(marker::FLOAT_32), Some((Type::Float, false)));
        assert_eq!(classify(marker::BIN_32), Some((Type::Bytes, false)));
        assert_eq!(classify(marker::STR_8), Some((Type::String, false)));
        assert_eq!(classify(marker::ARRAY_32), Some((Type::Array, false)));
        assert_eq!(classify(marker::MAP_16), Some((Type::Map, false)));
    }

    #[test]
    fn extension_tags_need_lookahead() {
        for tag in [
            marker::FIXEXT_1,
            marker::FIXEXT_2,
            marker::FIXEXT_4,
            marker::FIXEXT_8,
            marker::FIXEXT_16,
            marker::EXT_8,
            marker::EXT_16,
            marker::EXT_32,
        ] {
            assert_eq!(classify(tag), Some((Type::Ext, true)));
            assert!(ext_header_len(tag).is_some());
        }
        assert_eq!(ext_header_len(marker::NIL), None);
    }

    #[test]
    fn ext_type_ids() {
        assert_eq!(ext_type(-1), Type::Time);
        assert_eq!(ext_type(0), Type::Ext);
        assert_eq!(ext_type(-2), Type::Ext);
        assert_eq!(ext_type(127), Type::Ext);
    }
}
