//! Extension values and the built-in timestamp payload codec.

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::read::be_uint;

const NANOS_PER_SECOND: u32 = 1_000_000_000;

/// Produces the payload of an application-defined extension.
pub trait ExtEncode {
    fn encode_ext(&self) -> Result<Vec<u8>>;
}

/// Consumes the payload of an application-defined extension, together
/// with the type id found in the stream.
pub trait ExtDecode {
    fn decode_ext(&mut self, type_id: i8, payload: &[u8]) -> Result<()>;
}

/// An extension value kept as its type id and opaque payload.
///
/// Negative ids are reserved for built-in extensions; only `-1`
/// (timestamp) is defined.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtRecord {
    pub type_id: i8,
    pub payload: Vec<u8>,
}

impl ExtRecord {
    pub fn new(type_id: i8, payload: Vec<u8>) -> Self {
        Self { type_id, payload }
    }
}

impl ExtEncode for ExtRecord {
    fn encode_ext(&self) -> Result<Vec<u8>> {
        Ok(self.payload.clone())
    }
}

impl ExtDecode for ExtRecord {
    fn decode_ext(&mut self, type_id: i8, payload: &[u8]) -> Result<()> {
        self.type_id = type_id;
        self.payload.clear();
        self.payload.extend_from_slice(payload);
        Ok(())
    }
}

/// Decodes a timestamp payload by its length:
///
/// - 4 bytes: unsigned 32-bit seconds
/// - 8 bytes: 30-bit nanoseconds and 34-bit seconds packed in a 64-bit word
/// - 12 bytes: unsigned 32-bit nanoseconds, then signed 64-bit seconds
pub(crate) fn decode_timestamp(payload: &[u8]) -> Result<DateTime<Utc>> {
    let (secs, nanos) = match payload.len() {
        4 => (be_uint(payload) as i64, 0),
        8 => {
            let word = be_uint(payload);
            ((word & 0x3_FFFF_FFFF) as i64, (word >> 34) as u32)
        }
        12 => (be_uint(&payload[4..]) as i64, be_uint(&payload[..4]) as u32),
        n => return Err(Error::format(format!("invalid timestamp length {n}"))),
    };
    if nanos >= NANOS_PER_SECOND {
        return Err(Error::format(format!("invalid timestamp nanoseconds {nanos}")));
    }
    DateTime::from_timestamp(secs, nanos)
        .ok_or_else(|| Error::format(format!("timestamp out of range: {secs}s")))
}

/// Encodes a timestamp in the 12-byte form.
///
/// The nanosecond field is always zero: sub-second precision of `time`
/// is dropped, and decoding yields the instant truncated to whole seconds.
pub(crate) fn encode_timestamp(time: &DateTime<Utc>) -> [u8; 12] {
    let mut payload = [0u8; 12];
    payload[4..].copy_from_slice(&time.timestamp().to_be_bytes());
    payload
}
