//! Charset families.
//!
//! Each family provides a decoder kernel and an encoder kernel: small state machines that handle
//! exactly one character per call and leave buffering, error actions and lifecycle to the
//! [`Decoder`](crate::Decoder) and [`Encoder`](crate::Encoder) engines. Kernels never mutate state
//! while inspecting input; the engine calls `commit` once the character has been accepted, so an
//! `Overflow` leaves the kernel exactly as it was.

mod ascii;
mod single_byte;
mod utf_16;
mod utf_32;
mod utf_8;
mod variant;

pub(crate) use single_byte::{build_table, Table};
pub(crate) use variant::{VariantDecoder, VariantEncoder};

/// The largest number of bytes an encoder kernel emits for one character, or as a pending
/// prefix.
pub(crate) const MAX_BYTES_PER_CHAR: usize = 8;

/// The outcome of decoding the character at the front of the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Decoded {
    /// A character decoded from the given number of bytes.
    Char(char, usize),
    /// The given number of bytes were consumed without producing a character.
    Skip(usize),
    /// The input ends in the middle of a character; every remaining byte is a legal prefix.
    Incomplete,
    /// An illegal sequence of the given length.
    Malformed(usize),
    /// A legal sequence of the given length without a mapping.
    Unmappable(usize),
}

/// The outcome of encoding one character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Encoded {
    /// The character was encoded into the given number of bytes at the front of the scratch
    /// buffer.
    Bytes(usize),
    Unmappable,
}

pub(crate) trait DecoderKernel {
    /// Decodes the character at the front of `src`, which is never empty.
    fn decode_char(&self, src: &[u8]) -> Decoded;

    /// Records that `consumed` has been accepted as a `Char` or `Skip`.
    fn commit(&mut self, _consumed: &[u8]) {}

    /// Records that the sequence at the front of the input was found malformed or unmappable,
    /// whatever the error action then does with it.
    fn reject(&mut self) {}

    fn reset(&mut self) {}

    fn average_chars_per_byte(&self) -> f32;

    fn max_chars_per_byte(&self) -> f32;
}

pub(crate) trait EncoderKernel {
    /// Encodes `c` into the front of `dst`.
    fn encode_char(&self, c: char, dst: &mut [u8; MAX_BYTES_PER_CHAR]) -> Encoded;

    /// Writes the bytes owed in front of the next output, character or substitute, into the front
    /// of `dst` and returns their length. They stay owed until `commit`.
    fn pending_prefix(&self, _dst: &mut [u8; MAX_BYTES_PER_CHAR]) -> usize {
        0
    }

    /// Records that the last output, with any pending prefix, has been written.
    fn commit(&mut self) {}

    fn reset(&mut self) {}

    fn average_bytes_per_char(&self) -> f32;

    fn max_bytes_per_char(&self) -> f32;
}

/// The byte order of a multi-byte code unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum ByteOrder {
    BigEndian,
    LittleEndian,
}

impl ByteOrder {
    pub(crate) fn read_u16(self, bytes: [u8; 2]) -> u16 {
        match self {
            Self::BigEndian => u16::from_be_bytes(bytes),
            Self::LittleEndian => u16::from_le_bytes(bytes),
        }
    }

    pub(crate) fn write_u16(self, unit: u16) -> [u8; 2] {
        match self {
            Self::BigEndian => unit.to_be_bytes(),
            Self::LittleEndian => unit.to_le_bytes(),
        }
    }

    pub(crate) fn read_u32(self, bytes: [u8; 4]) -> u32 {
        match self {
            Self::BigEndian => u32::from_be_bytes(bytes),
            Self::LittleEndian => u32::from_le_bytes(bytes),
        }
    }

    pub(crate) fn write_u32(self, value: u32) -> [u8; 4] {
        match self {
            Self::BigEndian => value.to_be_bytes(),
            Self::LittleEndian => value.to_le_bytes(),
        }
    }
}

/// Describes how the registry instantiates kernels for a charset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Family {
    Ascii,
    Latin1,
    /// An ASCII-compatible single-byte charset whose upper half comes from the `encoding_rs`
    /// encoding with the given label.
    SingleByte(&'static str),
    Utf8,
    Utf16 { order: ByteOrder, bom: bool },
    Utf32(ByteOrder),
}
