//! msgpackr: a streaming MessagePack codec.
//!
//! Values are read one at a time from any `std::io::Read` source through a
//! buffered [`Reader`], and written to any `std::io::Write` sink through a
//! [`Writer`] that always picks the shortest encoding.
//!
//! # Architecture
//!
//! - **`wire`**: Tag byte constants and the tag to value-type classifier
//! - **`read`**: Buffered reader, skip/raw engine and reader pool
//! - **`write`**: Canonical writer
//! - **`ext`**: Extension records and the timestamp extension
//! - **`raw`**: Undecoded value encodings
//! - **`json`**: MessagePack to newline-delimited JSON bridge
//!
//! ```
//! use msgpackr::{Reader, Type, Writer};
//!
//! let mut buf = Vec::new();
//! let mut w = Writer::new(&mut buf);
//! w.write_map_header(1).unwrap();
//! w.write_str("answer").unwrap();
//! w.write_i64(42).unwrap();
//!
//! let mut r = Reader::new(&buf[..]);
//! assert_eq!(r.peek().unwrap(), Type::Map);
//! assert_eq!(r.read_map_header().unwrap(), 1);
//! assert_eq!(r.read_string().unwrap(), "answer");
//! assert_eq!(r.read_u8().unwrap(), 42);
//! assert!(r.peek().unwrap_err().is_end_of_stream());
//! ```

mod codec;
pub mod error;
pub mod ext;
pub mod json;
pub mod raw;
pub mod read;
pub mod wire;
pub mod write;

pub use codec::{Decode, Encode, append_marshal, decode, encode, marshal, unmarshal};
pub use error::{Error, Result};
pub use ext::{ExtDecode, ExtEncode, ExtRecord};
pub use json::{JsonTranscoder, copy_to_json};
pub use raw::Raw;
pub use read::{Reader, ReaderPool};
pub use wire::Type;
pub use write::Writer;
