//! Value-level encode/decode capabilities and the convenience entrypoints
//! built on them.

use std::io::{Read, Write};

use bytes::{BufMut, Bytes, BytesMut};
use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::ext::ExtRecord;
use crate::raw::Raw;
use crate::read::{Reader, ReaderPool};
use crate::wire::Type;
use crate::write::Writer;

/// A value that knows how to write itself.
pub trait Encode {
    fn encode_to<W: Write>(&self, w: &mut Writer<W>) -> Result<()>;
}

/// A value that knows how to overwrite itself from the next encoded value.
pub trait Decode {
    fn decode_from<R: Read>(&mut self, r: &mut Reader<'_, R>) -> Result<()>;
}

/// Decodes one value from `source` into `target`.
///
/// The reader is drawn from the global pool and returned to it on success
/// and failure alike. Bytes buffered beyond the value are discarded.
pub fn decode<R: Read, T: Decode + ?Sized>(source: R, target: &mut T) -> Result<()> {
    let pool = ReaderPool::global();
    let mut reader = pool.checkout(source);
    let result = target.decode_from(&mut reader);
    pool.checkin(reader);
    result
}

/// Decodes one value from an in-memory encoding, reading straight from
/// `data` without a pooled buffer.
pub fn unmarshal<T: Decode + ?Sized>(data: &[u8], target: &mut T) -> Result<()> {
    target.decode_from(&mut Reader::from_slice(data))
}

pub fn encode<W: Write, T: Encode + ?Sized>(sink: W, value: &T) -> Result<()> {
    value.encode_to(&mut Writer::new(sink))
}

/// Encodes `value` into a fresh buffer.
pub fn marshal<T: Encode + ?Sized>(value: &T) -> Result<Bytes> {
    append_marshal(value, BytesMut::new()).map(BytesMut::freeze)
}

/// Appends the encoding of `value` to `buf` in place and returns it.
pub fn append_marshal<T: Encode + ?Sized>(value: &T, buf: BytesMut) -> Result<BytesMut> {
    let mut w = Writer::new(buf.writer());
    value.encode_to(&mut w)?;
    Ok(w.into_inner().into_inner())
}

macro_rules! scalar_codec {
    ($($ty:ty => $write:ident, $read:ident;)*) => {
        $(
            impl Encode for $ty {
                fn encode_to<W: Write>(&self, w: &mut Writer<W>) -> Result<()> {
                    w.$write(*self)
                }
            }

            impl Decode for $ty {
                fn decode_from<R: Read>(&mut self, r: &mut Reader<'_, R>) -> Result<()> {
                    *self = r.$read()?;
                    Ok(())
                }
            }
        )*
    };
}

scalar_codec! {
    bool => write_bool, read_bool;
    i8 => write_i8, read_i8;
    i16 => write_i16, read_i16;
    i32 => write_i32, read_i32;
    i64 => write_i64, read_i64;
    isize => write_isize, read_isize;
    u8 => write_u8, read_u8;
    u16 => write_u16, read_u16;
    u32 => write_u32, read_u32;
    u64 => write_u64, read_u64;
    usize => write_usize, read_usize;
    f32 => write_f32, read_f32;
    f64 => write_f64, read_f64;
}

impl Encode for str {
    fn encode_to<W: Write>(&self, w: &mut Writer<W>) -> Result<()> {
        w.write_str(self)
    }
}

impl Encode for String {
    fn encode_to<W: Write>(&self, w: &mut Writer<W>) -> Result<()> {
        w.write_str(self)
    }
}

impl Decode for String {
    fn decode_from<R: Read>(&mut self, r: &mut Reader<'_, R>) -> Result<()> {
        *self = r.read_string()?;
        Ok(())
    }
}

impl<T: Encode> Encode for [T] {
    fn encode_to<W: Write>(&self, w: &mut Writer<W>) -> Result<()> {
        w.write_array_header(self.len())?;
        self.iter().try_for_each(|item| item.encode_to(w))
    }
}

impl<T: Encode> Encode for Vec<T> {
    fn encode_to<W: Write>(&self, w: &mut Writer<W>) -> Result<()> {
        self.as_slice().encode_to(w)
    }
}

impl<T: Decode + Default> Decode for Vec<T> {
    fn decode_from<R: Read>(&mut self, r: &mut Reader<'_, R>) -> Result<()> {
        let len = r.read_array_header()?;
        self.clear();
        for _ in 0..len {
            let mut item = T::default();
            item.decode_from(r).map_err(Error::unexpected_eof)?;
            self.push(item);
        }
        Ok(())
    }
}

impl<T: Encode> Encode for Option<T> {
    fn encode_to<W: Write>(&self, w: &mut Writer<W>) -> Result<()> {
        match self {
            Some(value) => value.encode_to(w),
            None => w.write_nil(),
        }
    }
}

impl<T: Decode + Default> Decode for Option<T> {
    fn decode_from<R: Read>(&mut self, r: &mut Reader<'_, R>) -> Result<()> {
        if r.peek()? == Type::Nil {
            r.read_nil()?;
            *self = None;
            return Ok(());
        }
        self.get_or_insert_with(T::default).decode_from(r)
    }
}

impl<T: Encode + ?Sized> Encode for &T {
    fn encode_to<W: Write>(&self, w: &mut Writer<W>) -> Result<()> {
        (**self).encode_to(w)
    }
}

impl Encode for Raw {
    fn encode_to<W: Write>(&self, w: &mut Writer<W>) -> Result<()> {
        w.write_raw(self)
    }
}

impl Decode for Raw {
    fn decode_from<R: Read>(&mut self, r: &mut Reader<'_, R>) -> Result<()> {
        r.read_raw(self)
    }
}

impl Encode for ExtRecord {
    fn encode_to<W: Write>(&self, w: &mut Writer<W>) -> Result<()> {
        w.write_ext_record(self)
    }
}

impl Decode for ExtRecord {
    fn decode_from<R: Read>(&mut self, r: &mut Reader<'_, R>) -> Result<()> {
        *self = r.read_ext_record()?;
        Ok(())
    }
}

impl Encode for DateTime<Utc> {
    fn encode_to<W: Write>(&self, w: &mut Writer<W>) -> Result<()> {
        w.write_time(self)
    }
}

impl Decode for DateTime<Utc> {
    fn decode_from<R: Read>(&mut self, r: &mut Reader<'_, R>) -> Result<()> {
        *self = r.read_time()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::marker;
    use chrono::TimeZone;

    #[derive(Debug, Default, PartialEq)]
    struct Point {
        x: i32,
        y: i32,
        label: String,
    }

    impl Encode for Point {
        fn encode_to<W: Write>(&self, w: &mut Writer<W>) -> Result<()> {
            w.write_array_header(3)?;
            w.write_i32(self.x)?;
            w.write_i32(self.y)?;
            w.write_str(&self.label)
        }
    }

    impl Decode for Point {
        fn decode_from<R: Read>(&mut self, r: &mut Reader<'_, R>) -> Result<()> {
            r.read_array_header_with_size(3)?;
            self.x = r.read_i32()?;
            self.y = r.read_i32()?;
            self.label = r.read_string()?;
            Ok(())
        }
    }

    #[test]
    fn marshal_and_unmarshal_user_type() {
        let point = Point {
            x: -3,
            y: 400,
            label: "origin".into(),
        };
        let bytes = marshal(&point).unwrap();
        assert_eq!(&bytes[..4], &[marker::fixarray(3), 0xFD, marker::UINT_16, 0x01]);

        let mut decoded = Point::default();
        unmarshal(&bytes, &mut decoded).unwrap();
        assert_eq!(decoded, point);
    }

    #[test]
    fn append_marshal_keeps_prefix() {
        let mut buf = BytesMut::new();
        buf.extend_from_slice(b"head");
        let buf = append_marshal(&7u8, buf).unwrap();
        assert_eq!(&buf[..], b"head\x07");
    }

    #[test]
    fn encode_then_decode_through_io() {
        let mut out = Vec::new();
        encode(&mut out, &vec![1u16, 2, 300]).unwrap();

        let mut decoded: Vec<u16> = vec![9; 10];
        decode(&out[..], &mut decoded).unwrap();
        assert_eq!(decoded, [1, 2, 300]);
    }

    #[test]
    fn decode_error_is_returned() {
        let mut value = 0u8;
        let data = [marker::UINT_16, 0x01, 0x00];
        assert!(matches!(unmarshal(&data, &mut value), Err(Error::IntegerOverflow)));

        let truncated = [marker::fixarray(2), 0x01];
        let mut items: Vec<u8> = Vec::new();
        assert!(matches!(unmarshal(&truncated, &mut items), Err(Error::UnexpectedEof)));
    }

    #[test]
    fn option_maps_to_nil() {
        let none: Option<String> = None;
        assert_eq!(&marshal(&none).unwrap()[..], &[marker::NIL]);

        let mut decoded = Some("stale".to_string());
        unmarshal(&[marker::NIL], &mut decoded).unwrap();
        assert_eq!(decoded, None);

        let bytes = marshal(&Some("x")).unwrap();
        unmarshal(&bytes, &mut decoded).unwrap();
        assert_eq!(decoded.as_deref(), Some("x"));
    }

    #[test]
    fn raw_passthrough() {
        let bytes = marshal(&vec!["a", "b"]).unwrap();
        let mut raw = Raw::new();
        unmarshal(&bytes, &mut raw).unwrap();
        assert_eq!(raw.as_bytes(), &bytes[..]);
        assert_eq!(marshal(&raw).unwrap(), bytes);
    }

    #[test]
    fn ext_record_round_trip() {
        let record = ExtRecord::new(42, b"payload".to_vec());
        let bytes = marshal(&record).unwrap();
        let mut decoded = ExtRecord::default();
        unmarshal(&bytes, &mut decoded).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn timestamp_round_trip() {
        let time = Utc.with_ymd_and_hms(2017, 9, 26, 13, 14, 15).unwrap();
        let bytes = marshal(&time).unwrap();
        let mut decoded = DateTime::<Utc>::default();
        unmarshal(&bytes, &mut decoded).unwrap();
        assert_eq!(decoded, time);
    }

    #[test]
    fn timestamp_truncates_to_seconds() {
        let time = Utc.with_ymd_and_hms(2017, 9, 26, 13, 14, 15).unwrap();
        let precise = time + chrono::Duration::nanoseconds(999_999_999);
        let bytes = marshal(&precise).unwrap();
        let mut decoded = DateTime::<Utc>::default();
        unmarshal(&bytes, &mut decoded).unwrap();
        assert_eq!(decoded, time);
    }

    #[test]
    fn scalars_round_trip() {
        let bytes = marshal(&-1_000_000i64).unwrap();
        let mut value = 0i64;
        unmarshal(&bytes, &mut value).unwrap();
        assert_eq!(value, -1_000_000);

        let bytes = marshal(&2.5f64).unwrap();
        let mut value = 0f32;
        unmarshal(&bytes, &mut value).unwrap();
        assert_eq!(value, 2.5);

        let bytes = marshal(&true).unwrap();
        let mut value = false;
        unmarshal(&bytes, &mut value).unwrap();
        assert!(value);
    }
}
