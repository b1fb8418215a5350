//! Streaming charset decoders and encoders over caller-owned buffers
//!
//! This crate converts between bytes in a named charset and UTF-16 code units through stateful
//! [`Decoder`] and [`Encoder`] engines. The caller owns both buffers, wrapped in [`Cursor`]s, and
//! drives the engines step by step, reacting to each [`CoderResult`]: more input, more output
//! space, or a malformed or unmappable sequence handled under the configured [`ErrorAction`].
//!
//! ```rust
//! use charset_coder::{ByteCursor, CharCursorMut, CoderResult, WINDOWS_1252};
//!
//! let mut decoder = WINDOWS_1252.new_decoder();
//! let mut storage = [0u16; 16];
//! let mut output = CharCursorMut::new(&mut storage[..]);
//! let mut input = ByteCursor::new(&b"caf\xe9 \x80"[..]);
//!
//! assert_eq!(decoder.decode(&mut input, &mut output, true)?, CoderResult::Success);
//! assert_eq!(decoder.flush(&mut output)?, CoderResult::Success);
//! assert_eq!(String::from_utf16_lossy(output.written()), "café €");
//! # Ok::<(), charset_coder::CodingError>(())
//! ```
//!
//! Charsets are looked up by name or alias, ignoring ASCII case, through [`resolve`], and the
//! bundled ones are also available as statics such as [`UTF_8`] and [`ISO_8859_1`].
//!
//! This crate also provides [`std::io::Read`] and [`std::io::Write`] adapters that decode a byte
//! stream into UTF-8 and encode UTF-8 into a byte stream, respectively, to support Rust's
//! standard streaming API.
//!
//! ```no_run
//! use std::{fs, io, io::prelude::*};
//!
//! use charset_coder::{resolve, DecodingReader, EncodingWriter, UTF_16LE};
//!
//! let file_r = io::BufReader::new(fs::File::open("foo.txt")?);
//! let charset = resolve("latin1").map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
//! let mut reader = DecodingReader::new(file_r, charset.new_decoder());
//! let mut utf8 = String::new();
//! reader.lossy().read_to_string(&mut utf8)?;
//!
//! let file_w = fs::File::create("bar.txt")?;
//! let mut writer = EncodingWriter::new(file_w, UTF_16LE.new_encoder());
//! write!(writer, "{}", utf8)?;
//! writer.flush()?;
//! # Ok::<(), std::io::Error>(())
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]

mod cursor;
mod decoder;
mod encoder;
mod error;
mod reader;
mod registry;
mod result;
mod writer;

mod buffer;
mod charsets;
mod util;

pub use cursor::{BoundsError, ByteCursor, ByteCursorMut, CharCursor, CharCursorMut, Cursor};
pub use decoder::Decoder;
pub use encoder::Encoder;
pub use error::{
    CharacterCodingError, CodingError, LookupError, MalformedError, UnmappableError,
};
pub use reader::DecodingReader;
pub use registry::{available_charsets, is_supported, resolve, Charset};
pub use registry::{
    IBM866, ISO_8859_1, ISO_8859_10, ISO_8859_13, ISO_8859_14, ISO_8859_15, ISO_8859_16,
    ISO_8859_2, ISO_8859_3, ISO_8859_4, ISO_8859_5, ISO_8859_6, ISO_8859_7, ISO_8859_8, KOI8_R,
    KOI8_U, MACINTOSH, US_ASCII, UTF_16, UTF_16BE, UTF_16LE, UTF_32BE, UTF_32LE, UTF_8,
    WINDOWS_1250, WINDOWS_1251, WINDOWS_1252, WINDOWS_1253, WINDOWS_1254, WINDOWS_1255,
    WINDOWS_1256, WINDOWS_1257, WINDOWS_1258, WINDOWS_874, X_MAC_CYRILLIC,
};
pub use result::{
    CoderPhase, CoderResult, CodingActions, DecoderActions, EncoderActions, ErrorAction,
    Substitute, MAX_SUBSTITUTE_LEN,
};
pub use writer::EncodingWriter;

/// Miscellaneous types not intended for direct access by name.
pub mod misc {
    pub use super::reader::LossyReader;
    pub use super::writer::PassthroughWriter;
}

#[cfg(test)]
mod tests;
