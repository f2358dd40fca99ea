//! MessagePack wire format: tag bytes and their semantic categories.
//!
//! All multi-byte length and value fields are big-endian.

pub mod kind;
pub mod marker;

pub use kind::{Type, classify, ext_type};

/// Extension type id reserved for timestamps.
pub const EXT_TIME: i8 = -1;
