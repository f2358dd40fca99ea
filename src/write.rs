//! Push-style MessagePack encoding to any `std::io::Write` sink.

use std::io::Write;

use bytes::BufMut;
use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::ext::{self, ExtEncode, ExtRecord};
use crate::wire::{EXT_TIME, marker};

/// Writes MessagePack values to a byte sink.
///
/// Every write picks the shortest wire form able to hold the value, so a
/// logical value always encodes to the same bytes whichever typed call
/// produced it. The writer holds no state besides the sink.
pub struct Writer<W> {
    sink: W,
}

impl<W: Write> Writer<W> {
    pub fn new(sink: W) -> Self {
        Self { sink }
    }

    pub fn get_ref(&self) -> &W {
        &self.sink
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.sink
    }

    pub fn into_inner(self) -> W {
        self.sink
    }

    pub fn write_nil(&mut self) -> Result<()> {
        self.put(&[marker::NIL])
    }

    pub fn write_bool(&mut self, value: bool) -> Result<()> {
        self.put(&[if value { marker::TRUE } else { marker::FALSE }])
    }

    pub fn write_i8(&mut self, value: i8) -> Result<()> {
        self.write_i64(i64::from(value))
    }

    pub fn write_i16(&mut self, value: i16) -> Result<()> {
        self.write_i64(i64::from(value))
    }

    pub fn write_i32(&mut self, value: i32) -> Result<()> {
        self.write_i64(i64::from(value))
    }

    pub fn write_isize(&mut self, value: isize) -> Result<()> {
        self.write_i64(value as i64)
    }

    /// Writes a signed integer in its smallest form. Non-negative values
    /// share the unsigned encoding.
    pub fn write_i64(&mut self, value: i64) -> Result<()> {
        if let Ok(unsigned) = u64::try_from(value) {
            return self.write_u64(unsigned);
        }

        if value >= -32 {
            self.put(&[marker::neg_fixint(value as i8)])
        } else if let Ok(v) = i8::try_from(value) {
            self.emit(|b| {
                b.put_u8(marker::INT_8);
                b.put_i8(v);
            })
        } else if let Ok(v) = i16::try_from(value) {
            self.emit(|b| {
                b.put_u8(marker::INT_16);
                b.put_i16(v);
            })
        } else if let Ok(v) = i32::try_from(value) {
            self.emit(|b| {
                b.put_u8(marker::INT_32);
                b.put_i32(v);
            })
        } else {
            self.emit(|b| {
                b.put_u8(marker::INT_64);
                b.put_i64(value);
            })
        }
    }

    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.write_u64(u64::from(value))
    }

    pub fn write_u16(&mut self, value: u16) -> Result<()> {
        self.write_u64(u64::from(value))
    }

    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        self.write_u64(u64::from(value))
    }

    pub fn write_usize(&mut self, value: usize) -> Result<()> {
        self.write_u64(value as u64)
    }

    /// Writes an unsigned integer in its smallest form.
    pub fn write_u64(&mut self, value: u64) -> Result<()> {
        if value <= 0x7F {
            self.put(&[marker::pos_fixint(value as u8)])
        } else if let Ok(v) = u8::try_from(value) {
            self.put(&[marker::UINT_8, v])
        } else if let Ok(v) = u16::try_from(value) {
            self.emit(|b| {
                b.put_u8(marker::UINT_16);
                b.put_u16(v);
            })
        } else if let Ok(v) = u32::try_from(value) {
            self.emit(|b| {
                b.put_u8(marker::UINT_32);
                b.put_u32(v);
            })
        } else {
            self.emit(|b| {
                b.put_u8(marker::UINT_64);
                b.put_u64(value);
            })
        }
    }

    pub fn write_f32(&mut self, value: f32) -> Result<()> {
        self.emit(|b| {
            b.put_u8(marker::FLOAT_32);
            b.put_f32(value);
        })
    }

    pub fn write_f64(&mut self, value: f64) -> Result<()> {
        self.emit(|b| {
            b.put_u8(marker::FLOAT_64);
            b.put_f64(value);
        })
    }

    /// Writes a string; lengths up to 31 bytes use the fixstr form.
    pub fn write_str(&mut self, value: &str) -> Result<()> {
        let len = value.len();
        if len <= marker::FIXSTR_MAX {
            self.put(&[marker::fixstr(len)])?;
        } else {
            self.write_length_header([marker::STR_8, marker::STR_16, marker::STR_32], len)?;
        }
        self.put(value.as_bytes())
    }

    /// Writes a binary value. Blobs have no inline form.
    pub fn write_bytes(&mut self, value: &[u8]) -> Result<()> {
        self.write_length_header([marker::BIN_8, marker::BIN_16, marker::BIN_32], value.len())?;
        self.put(value)
    }

    pub fn write_array_header(&mut self, len: usize) -> Result<()> {
        if len <= marker::FIXCOLLECTION_MAX {
            return self.put(&[marker::fixarray(len)]);
        }
        self.write_count_header(marker::ARRAY_16, marker::ARRAY_32, len)
    }

    pub fn write_map_header(&mut self, len: usize) -> Result<()> {
        if len <= marker::FIXCOLLECTION_MAX {
            return self.put(&[marker::fixmap(len)]);
        }
        self.write_count_header(marker::MAP_16, marker::MAP_32, len)
    }

    /// Writes already encoded bytes verbatim.
    pub fn write_raw(&mut self, raw: &[u8]) -> Result<()> {
        self.put(raw)
    }

    /// Writes an application-defined extension. Negative ids are reserved
    /// and rejected with [`Error::InvalidExtension`].
    pub fn write_ext(&mut self, type_id: i8, value: &(impl ExtEncode + ?Sized)) -> Result<()> {
        if type_id < 0 {
            return Err(Error::InvalidExtension(type_id));
        }
        let payload = value.encode_ext()?;
        self.write_extension(type_id, &payload)
    }

    pub fn write_ext_record(&mut self, record: &ExtRecord) -> Result<()> {
        if record.type_id < 0 {
            return Err(Error::InvalidExtension(record.type_id));
        }
        self.write_extension(record.type_id, &record.payload)
    }

    /// Writes a timestamp in the 12-byte form with whole-second precision.
    pub fn write_time(&mut self, time: &DateTime<Utc>) -> Result<()> {
        self.write_extension(EXT_TIME, &ext::encode_timestamp(time))
    }

    fn write_extension(&mut self, type_id: i8, payload: &[u8]) -> Result<()> {
        let fixed = match payload.len() {
            1 => Some(marker::FIXEXT_1),
            2 => Some(marker::FIXEXT_2),
            4 => Some(marker::FIXEXT_4),
            8 => Some(marker::FIXEXT_8),
            16 => Some(marker::FIXEXT_16),
            _ => None,
        };
        match fixed {
            Some(tag) => self.put(&[tag, type_id as u8])?,
            None => {
                self.write_length_header([marker::EXT_8, marker::EXT_16, marker::EXT_32], payload.len())?;
                self.put(&[type_id as u8])?;
            }
        }
        self.put(payload)
    }

    /// Writes a tag plus an 8, 16 or 32-bit length, whichever fits.
    fn write_length_header(&mut self, [tag8, tag16, tag32]: [u8; 3], len: usize) -> Result<()> {
        if let Ok(n) = u8::try_from(len) {
            self.put(&[tag8, n])
        } else if let Ok(n) = u16::try_from(len) {
            self.emit(|b| {
                b.put_u8(tag16);
                b.put_u16(n);
            })
        } else if let Ok(n) = u32::try_from(len) {
            self.emit(|b| {
                b.put_u8(tag32);
                b.put_u32(n);
            })
        } else {
            Err(Error::LengthLimitExceeded)
        }
    }

    fn write_count_header(&mut self, tag16: u8, tag32: u8, len: usize) -> Result<()> {
        if let Ok(n) = u16::try_from(len) {
            self.emit(|b| {
                b.put_u8(tag16);
                b.put_u16(n);
            })
        } else if let Ok(n) = u32::try_from(len) {
            self.emit(|b| {
                b.put_u8(tag32);
                b.put_u32(n);
            })
        } else {
            Err(Error::LengthLimitExceeded)
        }
    }

    /// Builds a header of at most nine bytes on the stack and writes it.
    fn emit(&mut self, build: impl FnOnce(&mut &mut [u8])) -> Result<()> {
        let mut head = [0u8; 9];
        let len = {
            let mut cursor = &mut head[..];
            build(&mut cursor);
            9 - cursor.len()
        };
        self.put(&head[..len])
    }

    fn put(&mut self, data: &[u8]) -> Result<()> {
        self.sink.write_all(data)?;
        Ok(())
    }
}
