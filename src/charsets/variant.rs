//! Enums wrapping the per-family kernels so that `Decoder` and `Encoder` are `Sized` and need no
//! boxing. The dispatch is written out by a macro for the finite set of families.

use super::ascii::{AsciiDecoder, AsciiEncoder, Latin1Decoder, Latin1Encoder};
use super::single_byte::{SingleByteDecoder, SingleByteEncoder};
use super::utf_16::{Utf16Decoder, Utf16Encoder};
use super::utf_32::{Utf32Decoder, Utf32Encoder};
use super::utf_8::{Utf8Decoder, Utf8Encoder};
use super::{Decoded, DecoderKernel, Encoded, EncoderKernel, Family, MAX_BYTES_PER_CHAR};
use crate::Charset;

macro_rules! dispatch {
    ($variant:ident, $value:expr, $kernel:ident => $body:expr) => {
        match $value {
            $variant::Ascii($kernel) => $body,
            $variant::Latin1($kernel) => $body,
            $variant::SingleByte($kernel) => $body,
            $variant::Utf8($kernel) => $body,
            $variant::Utf16($kernel) => $body,
            $variant::Utf32($kernel) => $body,
        }
    };
}

#[derive(Debug, Clone)]
pub(crate) enum VariantDecoder {
    Ascii(AsciiDecoder),
    Latin1(Latin1Decoder),
    SingleByte(SingleByteDecoder),
    Utf8(Utf8Decoder),
    Utf16(Utf16Decoder),
    Utf32(Utf32Decoder),
}

impl VariantDecoder {
    pub fn new(charset: &'static Charset) -> Self {
        match charset.family() {
            Family::Ascii => Self::Ascii(AsciiDecoder),
            Family::Latin1 => Self::Latin1(Latin1Decoder),
            Family::SingleByte(_) => Self::SingleByte(SingleByteDecoder::new(charset.table())),
            Family::Utf8 => Self::Utf8(Utf8Decoder),
            Family::Utf16 { bom: true, .. } => Self::Utf16(Utf16Decoder::detecting()),
            Family::Utf16 { order, .. } => Self::Utf16(Utf16Decoder::new(order)),
            Family::Utf32(order) => Self::Utf32(Utf32Decoder::new(order)),
        }
    }
}

impl DecoderKernel for VariantDecoder {
    fn decode_char(&self, src: &[u8]) -> Decoded {
        dispatch!(VariantDecoder, self, k => k.decode_char(src))
    }

    fn commit(&mut self, consumed: &[u8]) {
        dispatch!(VariantDecoder, self, k => k.commit(consumed))
    }

    fn reject(&mut self) {
        dispatch!(VariantDecoder, self, k => k.reject())
    }

    fn reset(&mut self) {
        dispatch!(VariantDecoder, self, k => k.reset())
    }

    fn average_chars_per_byte(&self) -> f32 {
        dispatch!(VariantDecoder, self, k => k.average_chars_per_byte())
    }

    fn max_chars_per_byte(&self) -> f32 {
        dispatch!(VariantDecoder, self, k => k.max_chars_per_byte())
    }
}

#[derive(Debug, Clone)]
pub(crate) enum VariantEncoder {
    Ascii(AsciiEncoder),
    Latin1(Latin1Encoder),
    SingleByte(SingleByteEncoder),
    Utf8(Utf8Encoder),
    Utf16(Utf16Encoder),
    Utf32(Utf32Encoder),
}

impl VariantEncoder {
    pub fn new(charset: &'static Charset) -> Self {
        match charset.family() {
            Family::Ascii => Self::Ascii(AsciiEncoder),
            Family::Latin1 => Self::Latin1(Latin1Encoder),
            Family::SingleByte(_) => Self::SingleByte(SingleByteEncoder::new(charset.table())),
            Family::Utf8 => Self::Utf8(Utf8Encoder),
            Family::Utf16 { order, bom } => Self::Utf16(Utf16Encoder::new(order, bom)),
            Family::Utf32(order) => Self::Utf32(Utf32Encoder::new(order)),
        }
    }
}

impl EncoderKernel for VariantEncoder {
    fn encode_char(&self, c: char, dst: &mut [u8; MAX_BYTES_PER_CHAR]) -> Encoded {
        dispatch!(VariantEncoder, self, k => k.encode_char(c, dst))
    }

    fn pending_prefix(&self, dst: &mut [u8; MAX_BYTES_PER_CHAR]) -> usize {
        dispatch!(VariantEncoder, self, k => k.pending_prefix(dst))
    }

    fn commit(&mut self) {
        dispatch!(VariantEncoder, self, k => k.commit())
    }

    fn reset(&mut self) {
        dispatch!(VariantEncoder, self, k => k.reset())
    }

    fn average_bytes_per_char(&self) -> f32 {
        dispatch!(VariantEncoder, self, k => k.average_bytes_per_char())
    }

    fn max_bytes_per_char(&self) -> f32 {
        dispatch!(VariantEncoder, self, k => k.max_bytes_per_char())
    }
}
