//! Streaming MessagePack to newline-delimited JSON transcoding.

use std::io::{self, Read, Write};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::{Error, Result};
use crate::read::{Reader, ReaderPool};
use crate::wire::Type;

/// Default bound on container nesting.
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Transcodes a stream of MessagePack values into JSON texts, one per line.
///
/// ```
/// use msgpackr::{JsonTranscoder, Writer};
///
/// let mut encoded = Vec::new();
/// let mut w = Writer::new(&mut encoded);
/// w.write_array_header(2).unwrap();
/// w.write_bool(true).unwrap();
/// w.write_nil().unwrap();
///
/// let mut json = Vec::new();
/// JsonTranscoder::new().copy(&mut json, &encoded[..]).unwrap();
/// assert_eq!(json, b"[true,null]\n");
/// ```
#[derive(Debug, Clone)]
pub struct JsonTranscoder {
    max_depth: usize,
}

impl Default for JsonTranscoder {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl JsonTranscoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the deepest container nesting accepted before failing with a
    /// format error.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Transcodes every value in `source` until it ends cleanly and
    /// returns the number of bytes written to `sink`.
    pub fn copy<W: Write, R: Read>(&self, sink: W, source: R) -> Result<usize> {
        let pool = ReaderPool::global();
        let mut reader = pool.checkout(source);
        let mut out = Counted {
            inner: sink,
            written: 0,
        };
        let result = self.copy_values(&mut reader, &mut out);
        pool.checkin(reader);
        result
    }

    fn copy_values<W: Write, R: Read>(
        &self,
        reader: &mut Reader<'_, R>,
        out: &mut Counted<W>,
    ) -> Result<usize> {
        let mut values = 0usize;
        loop {
            match self.write_value(reader, out, 0) {
                Ok(()) => {}
                Err(e) if e.is_end_of_stream() => break,
                Err(e) => return Err(e),
            }
            out.write_all(b"\n")?;
            values += 1;
        }
        out.flush()?;
        tracing::debug!(values, bytes = out.written, "transcoded msgpack stream to json");
        Ok(out.written)
    }

    fn write_value<W: Write, R: Read>(
        &self,
        reader: &mut Reader<'_, R>,
        out: &mut W,
        depth: usize,
    ) -> Result<()> {
        match reader.peek()? {
            Type::Nil => {
                reader.read_nil()?;
                out.write_all(b"null")?;
            }
            Type::Bool => write!(out, "{}", reader.read_bool()?)?,
            Type::Int => write!(out, "{}", reader.read_i64()?)?,
            Type::Uint => write!(out, "{}", reader.read_u64()?)?,
            Type::Float => {
                let value = reader.read_f64()?;
                if value.is_finite() {
                    write!(out, "{value}")?;
                } else {
                    out.write_all(b"null")?;
                }
            }
            Type::String => {
                let value = reader.read_string()?;
                serde_json::to_writer(&mut *out, &value).map_err(io::Error::from)?;
            }
            Type::Bytes => {
                let encoded = STANDARD.encode(reader.read_bytes_no_copy()?);
                write!(out, "\"{encoded}\"")?;
            }
            Type::Array => {
                let len = reader.read_array_header()?;
                self.check_depth(depth)?;
                out.write_all(b"[")?;
                for i in 0..len {
                    if i > 0 {
                        out.write_all(b",")?;
                    }
                    self.write_value(reader, out, depth + 1)
                        .map_err(Error::unexpected_eof)?;
                }
                out.write_all(b"]")?;
            }
            Type::Map => {
                let len = reader.read_map_header()?;
                self.check_depth(depth)?;
                out.write_all(b"{")?;
                for i in 0..len {
                    if i > 0 {
                        out.write_all(b",")?;
                    }
                    self.write_key(reader, out).map_err(Error::unexpected_eof)?;
                    out.write_all(b":")?;
                    self.write_value(reader, out, depth + 1)
                        .map_err(Error::unexpected_eof)?;
                }
                out.write_all(b"}")?;
            }
            ty @ (Type::Ext | Type::Time) => {
                return Err(Error::format(format!("unsupported json type: {ty}")));
            }
        }
        Ok(())
    }

    /// Writes a map key, quoting scalars that are not already JSON strings.
    fn write_key<W: Write, R: Read>(&self, reader: &mut Reader<'_, R>, out: &mut W) -> Result<()> {
        match reader.peek()? {
            ty @ (Type::Array | Type::Map) => {
                Err(Error::format(format!("cannot use {ty} type as map key")))
            }
            Type::String | Type::Bytes => self.write_value(reader, out, 0),
            _ => {
                out.write_all(b"\"")?;
                self.write_value(reader, out, 0)?;
                out.write_all(b"\"")?;
                Ok(())
            }
        }
    }

    fn check_depth(&self, depth: usize) -> Result<()> {
        if depth >= self.max_depth {
            return Err(Error::format(format!(
                "maximum nesting depth {} exceeded",
                self.max_depth
            )));
        }
        Ok(())
    }
}

/// Transcodes `source` to `sink` with the default settings.
pub fn copy_to_json<W: Write, R: Read>(sink: W, source: R) -> Result<usize> {
    JsonTranscoder::new().copy(sink, source)
}

/// Sink wrapper tallying the bytes written through it.
struct Counted<W> {
    inner: W,
    written: usize,
}

impl<W: Write> Write for Counted<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.written += n;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ext::ExtRecord;
    use crate::wire::marker;
    use crate::write::Writer;

    fn transcode(write: impl FnOnce(&mut Writer<&mut Vec<u8>>) -> Result<()>) -> Result<String> {
        let mut encoded = Vec::new();
        write(&mut Writer::new(&mut encoded)).unwrap();
        let mut json = Vec::new();
        let n = copy_to_json(&mut json, &encoded[..])?;
        assert_eq!(n, json.len());
        Ok(String::from_utf8(json).unwrap())
    }

    #[test]
    fn array_of_ints() {
        let json = transcode(|w| {
            w.write_array_header(3)?;
            w.write_i64(1)?;
            w.write_i64(2)?;
            w.write_i64(3)
        })
        .unwrap();
        assert_eq!(json, "[1,2,3]\n");
    }

    #[test]
    fn integer_map_key_is_quoted() {
        let json = transcode(|w| {
            w.write_map_header(1)?;
            w.write_i64(3141592)?;
            w.write_str("pi")
        })
        .unwrap();
        assert_eq!(json, "{\"3141592\":\"pi\"}\n");
    }

    #[test]
    fn scalars() {
        let json = transcode(|w| {
            w.write_nil()?;
            w.write_bool(true)?;
            w.write_i64(-13)?;
            w.write_u64(13)?;
            w.write_f64(3.141592)?;
            w.write_bytes(b"blob")?;
            w.write_str("two\nlines")
        })
        .unwrap();
        assert_eq!(
            json,
            "null\ntrue\n-13\n13\n3.141592\n\"YmxvYg==\"\n\"two\\nlines\"\n"
        );
    }

    #[test]
    fn floats_never_use_exponent() {
        let json = transcode(|w| w.write_f64(1e21)).unwrap();
        assert_eq!(json, "1000000000000000000000\n");
    }

    #[test]
    fn nested_containers() {
        let json = transcode(|w| {
            w.write_map_header(2)?;
            w.write_str("list")?;
            w.write_array_header(2)?;
            w.write_bool(false)?;
            w.write_map_header(0)?;
            w.write_nil()?;
            w.write_array_header(0)
        })
        .unwrap();
        assert_eq!(json, "{\"list\":[false,{}],\"null\":[]}\n");
    }

    #[test]
    fn container_keys_are_rejected() {
        let err = transcode(|w| {
            w.write_map_header(1)?;
            w.write_array_header(0)?;
            w.write_nil()
        })
        .unwrap_err();
        assert_eq!(err.to_string(), "format error: cannot use array type as map key");

        let err = transcode(|w| {
            w.write_map_header(1)?;
            w.write_map_header(0)?;
            w.write_nil()
        })
        .unwrap_err();
        assert_eq!(err.to_string(), "format error: cannot use map type as map key");
    }

    #[test]
    fn truncated_container_is_unexpected_eof() {
        let data = [marker::fixarray(2), 0x01];
        let mut json = Vec::new();
        assert!(matches!(copy_to_json(&mut json, &data[..]), Err(Error::UnexpectedEof)));

        let data = [marker::fixmap(1), 0x01];
        assert!(matches!(copy_to_json(&mut json, &data[..]), Err(Error::UnexpectedEof)));
    }

    #[test]
    fn extensions_are_unsupported() {
        let err = transcode(|w| w.write_ext_record(&ExtRecord::new(3, vec![1]))).unwrap_err();
        assert_eq!(err.to_string(), "format error: unsupported json type: ext");
    }

    #[test]
    fn depth_limit() {
        let data = [marker::fixarray(1), marker::fixarray(1), marker::fixarray(0)];
        let mut json = Vec::new();
        let err = JsonTranscoder::new()
            .max_depth(2)
            .copy(&mut json, &data[..])
            .unwrap_err();
        assert!(matches!(err, Error::Format(_)));

        json.clear();
        JsonTranscoder::new()
            .max_depth(3)
            .copy(&mut json, &data[..])
            .unwrap();
        assert_eq!(json, b"[[[]]]\n");
    }

    #[test]
    fn empty_stream_writes_nothing() {
        let mut json = Vec::new();
        assert_eq!(copy_to_json(&mut json, &b""[..]).unwrap(), 0);
        assert!(json.is_empty());
    }
}
