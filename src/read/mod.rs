//! Buffered, pull-style MessagePack decoding over any `std::io::Read` source.

mod pool;
mod raw;

pub use pool::{MAX_POOLED_CAPACITY, POOL_LIMIT, ReaderPool};

use std::borrow::Cow;
use std::io::{self, Read};

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::ext::{self, ExtDecode, ExtRecord};
use crate::raw::Raw;
use crate::wire::kind::ext_header_len;
use crate::wire::{EXT_TIME, Type, classify, ext_type, marker};

/// Initial size of a reader's backing buffer.
pub const DEFAULT_CAPACITY: usize = 1024;

/// Reads MessagePack values from a byte source.
///
/// The reader keeps a reusable buffer and a `[first, last)` window of
/// bytes pulled from the source but not yet consumed. Every typed read
/// inspects the tag at the window start, validates it against the
/// requested category and consumes the whole encoded value.
///
/// Once the source fails, the error is cached: every later call returns
/// it again without touching the source.
///
/// A reader made with [`Reader::from_slice`] uses the caller's slice as its
/// window and never copies it.
pub struct Reader<'a, R> {
    source: R,
    buf: Cow<'a, [u8]>,
    first: usize,
    last: usize,
    err: Option<Error>,
}

impl<'a, R: Read> Reader<'a, R> {
    pub fn new(source: R) -> Self {
        Self::with_capacity(source, DEFAULT_CAPACITY)
    }

    /// Creates a reader whose backing buffer starts with `capacity` bytes.
    pub fn with_capacity(source: R, capacity: usize) -> Self {
        Self::from_buffer(source, vec![0; capacity.max(1)])
    }

    pub(crate) fn from_buffer(source: R, buf: Vec<u8>) -> Self {
        Self {
            source,
            buf: Cow::Owned(buf),
            first: 0,
            last: 0,
            err: None,
        }
    }

    /// Returns the type of the next value without consuming it.
    ///
    /// A clean end of the source before the next value yields
    /// [`Error::EndOfStream`].
    pub fn peek(&mut self) -> Result<Type> {
        let tag = self.peek_tag()?;
        self.peek_type(tag)
    }

    pub fn read_nil(&mut self) -> Result<()> {
        let tag = self.peek_tag()?;
        if tag != marker::NIL {
            return Err(self.type_err(tag, Type::Nil));
        }
        self.advance(1);
        Ok(())
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        let tag = self.peek_tag()?;
        let value = match tag {
            marker::NIL | marker::FALSE => false,
            marker::TRUE => true,
            _ => return Err(self.type_err(tag, Type::Bool)),
        };
        self.advance(1);
        Ok(value)
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        i8::try_from(self.read_i64()?).map_err(|_| Error::IntegerOverflow)
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        i16::try_from(self.read_i64()?).map_err(|_| Error::IntegerOverflow)
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        i32::try_from(self.read_i64()?).map_err(|_| Error::IntegerOverflow)
    }

    pub fn read_isize(&mut self) -> Result<isize> {
        isize::try_from(self.read_i64()?).map_err(|_| Error::IntegerOverflow)
    }

    /// Reads a signed integer. Accepts every integer tag; unsigned values
    /// above `i64::MAX` fail with [`Error::IntegerOverflow`].
    pub fn read_i64(&mut self) -> Result<i64> {
        let tag = self.peek_tag()?;
        if marker::is_pos_fixint(tag) {
            self.advance(1);
            return Ok(i64::from(marker::read_pos_fixint(tag)));
        }
        if marker::is_neg_fixint(tag) {
            self.advance(1);
            return Ok(i64::from(marker::read_neg_fixint(tag)));
        }

        match tag {
            marker::NIL => {
                self.advance(1);
                Ok(0)
            }
            marker::INT_8 => Ok(i64::from(i8::from_be_bytes(self.read_tagged()?))),
            marker::INT_16 => Ok(i64::from(i16::from_be_bytes(self.read_tagged()?))),
            marker::INT_32 => Ok(i64::from(i32::from_be_bytes(self.read_tagged()?))),
            marker::INT_64 => Ok(i64::from_be_bytes(self.read_tagged()?)),
            marker::UINT_8 => Ok(i64::from(u8::from_be_bytes(self.read_tagged()?))),
            marker::UINT_16 => Ok(i64::from(u16::from_be_bytes(self.read_tagged()?))),
            marker::UINT_32 => Ok(i64::from(u32::from_be_bytes(self.read_tagged()?))),
            marker::UINT_64 => {
                let value = u64::from_be_bytes(self.read_tagged()?);
                i64::try_from(value).map_err(|_| Error::IntegerOverflow)
            }
            _ => Err(self.type_err(tag, Type::Int)),
        }
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        u8::try_from(self.read_u64()?).map_err(|_| Error::IntegerOverflow)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        u16::try_from(self.read_u64()?).map_err(|_| Error::IntegerOverflow)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        u32::try_from(self.read_u64()?).map_err(|_| Error::IntegerOverflow)
    }

    pub fn read_usize(&mut self) -> Result<usize> {
        usize::try_from(self.read_u64()?).map_err(|_| Error::IntegerOverflow)
    }

    /// Reads an unsigned integer. Accepts every integer tag; negative
    /// values fail with [`Error::IntegerOverflow`].
    pub fn read_u64(&mut self) -> Result<u64> {
        let tag = self.peek_tag()?;
        if marker::is_pos_fixint(tag) {
            self.advance(1);
            return Ok(u64::from(marker::read_pos_fixint(tag)));
        }

        let signed = match tag {
            marker::NIL => {
                self.advance(1);
                return Ok(0);
            }
            marker::UINT_8 => return Ok(u64::from(u8::from_be_bytes(self.read_tagged()?))),
            marker::UINT_16 => return Ok(u64::from(u16::from_be_bytes(self.read_tagged()?))),
            marker::UINT_32 => return Ok(u64::from(u32::from_be_bytes(self.read_tagged()?))),
            marker::UINT_64 => return Ok(u64::from_be_bytes(self.read_tagged()?)),
            marker::INT_8 => i64::from(i8::from_be_bytes(self.read_tagged()?)),
            marker::INT_16 => i64::from(i16::from_be_bytes(self.read_tagged()?)),
            marker::INT_32 => i64::from(i32::from_be_bytes(self.read_tagged()?)),
            marker::INT_64 => i64::from_be_bytes(self.read_tagged()?),
            _ => return Err(self.type_err(tag, Type::Uint)),
        };
        u64::try_from(signed).map_err(|_| Error::IntegerOverflow)
    }

    /// Reads a float and narrows it; values outside the `f32` range fail
    /// with [`Error::FloatOverflow`].
    pub fn read_f32(&mut self) -> Result<f32> {
        let value = self.read_f64()?;
        if value < -f64::from(f32::MAX) || value > f64::from(f32::MAX) {
            return Err(Error::FloatOverflow);
        }
        Ok(value as f32)
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        let tag = self.peek_tag()?;
        match tag {
            marker::NIL => {
                self.advance(1);
                Ok(0.0)
            }
            marker::FLOAT_32 => Ok(f64::from(f32::from_be_bytes(self.read_tagged()?))),
            marker::FLOAT_64 => Ok(f64::from_be_bytes(self.read_tagged()?)),
            _ => Err(self.type_err(tag, Type::Float)),
        }
    }

    pub fn read_string(&mut self) -> Result<String> {
        let len = self.read_blob_header(Type::String)?;
        if len == 0 {
            return Ok(String::new());
        }
        let mut data = vec![0u8; len];
        self.read_full(&mut data)?;
        String::from_utf8(data).map_err(|e| Error::format(format!("invalid UTF-8 string: {e}")))
    }

    /// Reads a binary value into `dst`, reusing its capacity when it is
    /// large enough. Nil yields an empty `dst`.
    pub fn read_bytes(&mut self, dst: &mut Vec<u8>) -> Result<()> {
        let len = self.read_blob_header(Type::Bytes)?;
        dst.clear();
        if len == 0 {
            return Ok(());
        }
        dst.resize(len, 0);
        self.read_full(dst)
    }

    /// Reads a binary value and returns a view into the internal buffer.
    ///
    /// The view is only valid until the next call on this reader; the
    /// buffer grows if the payload does not fit.
    pub fn read_bytes_no_copy(&mut self) -> Result<&[u8]> {
        let len = self.read_blob_header(Type::Bytes)?;
        self.read_n(len)
    }

    /// Reads an array header and returns the element count.
    pub fn read_array_header(&mut self) -> Result<usize> {
        self.read_collection_header(Type::Array)
    }

    /// Reads an array header and checks it against the expected count.
    pub fn read_array_header_with_size(&mut self, size: usize) -> Result<()> {
        let len = self.read_array_header()?;
        if len != size {
            return Err(Error::format(format!("invalid array header size {len}")));
        }
        Ok(())
    }

    /// Reads a map header and returns the number of key/value pairs.
    pub fn read_map_header(&mut self) -> Result<usize> {
        self.read_collection_header(Type::Map)
    }

    /// Copies the complete encoding of the next value into `raw`,
    /// replacing its contents.
    pub fn read_raw(&mut self, raw: &mut Raw) -> Result<()> {
        raw.clear();
        self.walk(|span| raw.extend_from_slice(span))
    }

    /// Discards the next value, including every nested child.
    pub fn skip(&mut self) -> Result<()> {
        self.walk(|_| {})
    }

    /// Reads an extension whose type id must equal `type_id` and hands its
    /// payload to `target`.
    pub fn read_ext(&mut self, type_id: i8, target: &mut (impl ExtDecode + ?Sized)) -> Result<()> {
        let (found, payload) = self.read_ext_payload(Some(type_id), Type::Ext)?;
        target.decode_ext(found, payload)
    }

    /// Reads any extension value together with its type id.
    pub fn read_ext_record(&mut self) -> Result<ExtRecord> {
        let (type_id, payload) = self.read_ext_payload(None, Type::Ext)?;
        Ok(ExtRecord::new(type_id, payload.to_vec()))
    }

    /// Reads a timestamp extension in any of its three payload widths.
    pub fn read_time(&mut self) -> Result<DateTime<Utc>> {
        let payload = self.read_ext_payload(Some(EXT_TIME), Type::Time)?.1;
        ext::decode_timestamp(payload)
    }

    /// Returns the underlying source. Buffered but unconsumed bytes are lost.
    pub fn into_inner(self) -> R {
        self.source
    }

    /// Splits the reader into its source and, unless it borrows its
    /// window, its backing buffer.
    pub(crate) fn into_parts(self) -> (R, Option<Vec<u8>>) {
        let buf = match self.buf {
            Cow::Owned(buf) => Some(buf),
            Cow::Borrowed(_) => None,
        };
        (self.source, buf)
    }

    // -- header decoding --

    fn read_blob_header(&mut self, expected: Type) -> Result<usize> {
        let tag = self.peek_tag()?;
        if tag == marker::NIL {
            self.advance(1);
            return Ok(0);
        }
        if expected == Type::String && marker::is_fixstr(tag) {
            self.advance(1);
            return Ok(marker::read_fixstr(tag));
        }

        // str and bin share their length headers; only fixstr is string-only.
        let width = match tag {
            marker::STR_8 | marker::BIN_8 => 1,
            marker::STR_16 | marker::BIN_16 => 2,
            marker::STR_32 | marker::BIN_32 => 4,
            _ => return Err(self.type_err(tag, expected)),
        };
        let header = self.read_n(1 + width)?;
        to_usize(be_uint(&header[1..]))
    }

    fn read_collection_header(&mut self, expected: Type) -> Result<usize> {
        let tag = self.peek_tag()?;
        let fixed = match expected {
            Type::Array if marker::is_fixarray(tag) => Some(marker::read_fixarray(tag)),
            Type::Map if marker::is_fixmap(tag) => Some(marker::read_fixmap(tag)),
            _ => None,
        };
        if let Some(len) = fixed {
            self.advance(1);
            return Ok(len);
        }

        match (expected, tag) {
            (_, marker::NIL) => {
                self.advance(1);
                Ok(0)
            }
            (Type::Array, marker::ARRAY_16) | (Type::Map, marker::MAP_16) => {
                Ok(usize::from(u16::from_be_bytes(self.read_tagged()?)))
            }
            (Type::Array, marker::ARRAY_32) | (Type::Map, marker::MAP_32) => {
                let len = u32::from_be_bytes(self.read_tagged()?);
                if u64::from(len) > isize::MAX as u64 {
                    return Err(Error::IntegerOverflow);
                }
                to_usize(u64::from(len))
            }
            _ => Err(self.type_err(tag, expected)),
        }
    }

    /// Consumes one extension value and returns its id and payload.
    ///
    /// With `want = Some(id)` the id in the stream must match, otherwise
    /// [`Error::InvalidExtension`] reports the id actually found.
    fn read_ext_payload(&mut self, want: Option<i8>, expected: Type) -> Result<(i8, &[u8])> {
        let tag = self.peek_tag()?;
        let (header_len, fixed) = match tag {
            marker::FIXEXT_1 => (2, Some(1)),
            marker::FIXEXT_2 => (2, Some(2)),
            marker::FIXEXT_4 => (2, Some(4)),
            marker::FIXEXT_8 => (2, Some(8)),
            marker::FIXEXT_16 => (2, Some(16)),
            marker::EXT_8 => (3, None),
            marker::EXT_16 => (4, None),
            marker::EXT_32 => (6, None),
            _ => return Err(self.type_err(tag, expected)),
        };

        let header = self.peek_n(header_len)?;
        let type_id = header[header_len - 1] as i8;
        let len = match fixed {
            Some(len) => len,
            None => to_usize(be_uint(&header[1..header_len - 1]))?,
        };
        if let Some(want) = want {
            if want != type_id {
                return Err(Error::InvalidExtension(type_id));
            }
        }

        let total = header_len.checked_add(len).ok_or(Error::IntegerOverflow)?;
        let data = self.read_n(total)?;
        Ok((type_id, &data[header_len..]))
    }

    // -- classification --

    /// Precondition: `tag` is the unconsumed byte at the window start.
    fn peek_type(&mut self, tag: u8) -> Result<Type> {
        match classify(tag) {
            None => Err(unknown_tag(tag)),
            Some((ty, false)) => Ok(ty),
            Some((_, true)) => {
                let len = ext_header_len(tag).ok_or_else(|| unknown_tag(tag))?;
                let header = self.peek_n(len)?;
                Ok(ext_type(header[len - 1] as i8))
            }
        }
    }

    fn type_err(&mut self, tag: u8, expected: Type) -> Error {
        match self.peek_type(tag) {
            Ok(actual) => Error::TypeMismatch { actual, expected },
            Err(err @ Error::Format(_)) => err,
            Err(_) => Error::TypeMismatch {
                actual: Type::Ext,
                expected,
            },
        }
    }

    // -- buffering --

    /// Returns the next tag byte without consuming it.
    fn peek_tag(&mut self) -> Result<u8> {
        if let Some(err) = &self.err {
            return Err(err.clone());
        }
        if self.first == self.last {
            self.fill(1, true)?;
        }
        Ok(self.buf[self.first])
    }

    /// Returns the next `n` bytes without consuming them.
    fn peek_n(&mut self, n: usize) -> Result<&[u8]> {
        if let Some(err) = &self.err {
            return Err(err.clone());
        }
        if self.first + n > self.last {
            self.fill(n, false)?;
        }
        Ok(&self.buf[self.first..self.first + n])
    }

    /// Consumes and returns the next `n` bytes.
    fn read_n(&mut self, n: usize) -> Result<&[u8]> {
        self.peek_n(n)?;
        let start = self.first;
        self.first += n;
        Ok(&self.buf[start..start + n])
    }

    /// Consumes a tag byte followed by an `N`-byte big-endian field.
    fn read_tagged<const N: usize>(&mut self) -> Result<[u8; N]> {
        let data = self.read_n(1 + N)?;
        let mut field = [0u8; N];
        field.copy_from_slice(&data[1..]);
        Ok(field)
    }

    fn advance(&mut self, n: usize) {
        self.first += n;
    }

    /// Fills `dst` from buffered bytes first, then straight from the source.
    fn read_full(&mut self, dst: &mut [u8]) -> Result<()> {
        let buffered = (self.last - self.first).min(dst.len());
        dst[..buffered].copy_from_slice(&self.buf[self.first..self.first + buffered]);
        self.advance(buffered);
        if buffered == dst.len() {
            return Ok(());
        }
        if let Some(err) = &self.err {
            return Err(err.clone());
        }

        let mut filled = buffered;
        while filled < dst.len() {
            match self.source.read(&mut dst[filled..]) {
                Ok(0) => return Err(self.fail(Error::UnexpectedEof)),
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(self.fail(e.into())),
            }
        }
        Ok(())
    }

    /// Ensures at least `min` bytes are buffered from `first` on.
    ///
    /// Unread bytes are compacted to the buffer origin and the buffer grows
    /// when it is smaller than `min`. The source ending with nothing
    /// buffered at a value boundary is a clean [`Error::EndOfStream`];
    /// anywhere else it is [`Error::UnexpectedEof`].
    fn fill(&mut self, min: usize, at_boundary: bool) -> Result<()> {
        if let Cow::Borrowed(_) = self.buf {
            // A borrowed window already holds the whole input.
            let err = if at_boundary && self.first == self.last {
                Error::EndOfStream
            } else {
                Error::UnexpectedEof
            };
            return Err(self.fail(err));
        }

        let buf = self.buf.to_mut();
        if self.first != 0 {
            buf.copy_within(self.first..self.last, 0);
            self.last -= self.first;
            self.first = 0;
        }
        if buf.len() < min {
            buf.resize(min, 0);
        }

        while self.last < min {
            match self.source.read(&mut buf[self.last..]) {
                Ok(0) if at_boundary && self.last == 0 => return Err(self.fail(Error::EndOfStream)),
                Ok(0) => return Err(self.fail(Error::UnexpectedEof)),
                Ok(n) => self.last += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(self.fail(e.into())),
            }
        }
        Ok(())
    }

    /// Caches `err` as the sticky error and returns it.
    fn fail(&mut self, err: Error) -> Error {
        self.err = Some(err.clone());
        err
    }
}

impl<'a> Reader<'a, io::Empty> {
    /// Creates a reader over an in-memory encoding.
    ///
    /// The window is `data` itself, so views returned by
    /// [`Reader::read_bytes_no_copy`] point into `data`. Reaching the end of
    /// `data` ends the stream.
    pub fn from_slice(data: &'a [u8]) -> Self {
        Self {
            source: io::empty(),
            buf: Cow::Borrowed(data),
            first: 0,
            last: data.len(),
            err: None,
        }
    }
}

/// Decodes a big-endian unsigned field of up to eight bytes.
pub(crate) fn be_uint(field: &[u8]) -> u64 {
    field.iter().fold(0, |acc, &b| (acc << 8) | u64::from(b))
}

fn to_usize(n: u64) -> Result<usize> {
    usize::try_from(n).map_err(|_| Error::IntegerOverflow)
}

pub(crate) fn unknown_tag(tag: u8) -> Error {
    Error::format(format!("unknown tag {tag:#04x}"))
}
