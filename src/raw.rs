//! Opaque encoded values.

use std::ops::Deref;

/// The complete wire encoding of one value, kept without decoding it.
///
/// Useful for deferring decoding or forwarding values untouched. Reading
/// into a `Raw` replaces its contents but keeps the allocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Raw(Vec<u8>);

impl Raw {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }

    pub(crate) fn clear(&mut self) {
        self.0.clear();
    }

    pub(crate) fn extend_from_slice(&mut self, span: &[u8]) {
        self.0.extend_from_slice(span);
    }
}

impl Deref for Raw {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for Raw {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Raw {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}
