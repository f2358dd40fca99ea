//! Structural walker behind `Reader::skip` and `Reader::read_raw`.
//!
//! The walker never decodes values semantically. It computes the byte span
//! of each tag's header and payload, and counts how many child values a
//! container still owes. Iteration uses a pending-value counter instead of
//! recursion, so nesting depth costs no stack.

use std::io::Read;

use super::{Reader, be_uint, unknown_tag};
use crate::error::{Error, Result};
use crate::wire::marker;

impl<R: Read> Reader<'_, R> {
    /// Consumes exactly one complete value, passing every consumed span to
    /// `emit` in stream order.
    pub(super) fn walk(&mut self, mut emit: impl FnMut(&[u8])) -> Result<()> {
        let mut pending: u64 = 1;
        let mut nested = false;
        while pending > 0 {
            pending -= 1;
            let tag = match self.peek_tag() {
                Ok(tag) => tag,
                Err(err) if nested => return Err(err.unexpected_eof()),
                Err(err) => return Err(err),
            };
            nested = true;

            let (span, children) = self.span(tag)?;
            emit(self.read_n(span)?);
            pending = pending.saturating_add(children);
        }
        Ok(())
    }

    /// Returns the byte span of the header and inline payload starting at
    /// `tag`, and the number of child values that follow it.
    fn span(&mut self, tag: u8) -> Result<(usize, u64)> {
        if marker::is_pos_fixint(tag) || marker::is_neg_fixint(tag) {
            return Ok((1, 0));
        }
        if marker::is_fixmap(tag) {
            return Ok((1, 2 * marker::read_fixmap(tag) as u64));
        }
        if marker::is_fixarray(tag) {
            return Ok((1, marker::read_fixarray(tag) as u64));
        }
        if marker::is_fixstr(tag) {
            return Ok((1 + marker::read_fixstr(tag), 0));
        }

        let span = match tag {
            marker::NIL | marker::FALSE | marker::TRUE => (1, 0),
            marker::INT_8 | marker::UINT_8 => (2, 0),
            marker::INT_16 | marker::UINT_16 => (3, 0),
            marker::INT_32 | marker::UINT_32 | marker::FLOAT_32 => (5, 0),
            marker::INT_64 | marker::UINT_64 | marker::FLOAT_64 => (9, 0),

            marker::STR_8 | marker::BIN_8 => (self.sized(1, 1)?, 0),
            marker::STR_16 | marker::BIN_16 => (self.sized(2, 1)?, 0),
            marker::STR_32 | marker::BIN_32 => (self.sized(4, 1)?, 0),

            marker::ARRAY_16 => (3, self.count(2)?),
            marker::ARRAY_32 => (5, self.count(4)?),
            marker::MAP_16 => (3, 2 * self.count(2)?),
            marker::MAP_32 => (5, 2 * self.count(4)?),

            marker::FIXEXT_1 => (3, 0),
            marker::FIXEXT_2 => (4, 0),
            marker::FIXEXT_4 => (6, 0),
            marker::FIXEXT_8 => (10, 0),
            marker::FIXEXT_16 => (18, 0),
            marker::EXT_8 => (self.sized(1, 2)?, 0),
            marker::EXT_16 => (self.sized(2, 2)?, 0),
            marker::EXT_32 => (self.sized(4, 2)?, 0),

            _ => return Err(unknown_tag(tag)),
        };
        Ok(span)
    }

    /// Span of a length-prefixed value: tag, `width`-byte length field,
    /// `extra` header bytes (the extension type id) and the payload.
    fn sized(&mut self, width: usize, extra: usize) -> Result<usize> {
        let len = self.count(width)?;
        usize::try_from(len)
            .ok()
            .and_then(|len| len.checked_add(width + extra))
            .ok_or(Error::IntegerOverflow)
    }

    /// Peeks the `width`-byte big-endian field following the tag.
    fn count(&mut self, width: usize) -> Result<u64> {
        let header = self.peek_n(1 + width)?;
        Ok(be_uint(&header[1..]))
    }
}
