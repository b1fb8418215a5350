use super::{Decoded, DecoderKernel, Encoded, EncoderKernel, MAX_BYTES_PER_CHAR};

#[derive(Debug, Clone, Default)]
pub(crate) struct Utf8Decoder;

impl DecoderKernel for Utf8Decoder {
    /// Reports malformed sequences by their maximal subpart: the longest prefix that could still
    /// have started a well-formed sequence, or one byte if even the lead byte is illegal.
    fn decode_char(&self, src: &[u8]) -> Decoded {
        let lead = src[0];
        if lead < 0x80 {
            return Decoded::Char(char::from(lead), 1);
        }
        // continuation count and the legal range of the first continuation byte
        let (needed, lower, upper, bits) = match lead {
            0xC2..=0xDF => (1, 0x80, 0xBF, lead & 0x1F),
            0xE0 => (2, 0xA0, 0xBF, lead & 0x0F),
            0xE1..=0xEC | 0xEE..=0xEF => (2, 0x80, 0xBF, lead & 0x0F),
            0xED => (2, 0x80, 0x9F, lead & 0x0F),
            0xF0 => (3, 0x90, 0xBF, lead & 0x07),
            0xF1..=0xF3 => (3, 0x80, 0xBF, lead & 0x07),
            0xF4 => (3, 0x80, 0x8F, lead & 0x07),
            _ => return Decoded::Malformed(1),
        };

        let mut code_point = u32::from(bits);
        for i in 1..=needed {
            let Some(&b) = src.get(i) else {
                return Decoded::Incomplete;
            };
            let (lo, hi) = if i == 1 { (lower, upper) } else { (0x80, 0xBF) };
            if !(lo..=hi).contains(&b) {
                return Decoded::Malformed(i);
            }
            code_point = (code_point << 6) | u32::from(b & 0x3F);
        }
        match char::from_u32(code_point) {
            Some(c) => Decoded::Char(c, needed + 1),
            None => Decoded::Malformed(needed + 1),
        }
    }

    fn average_chars_per_byte(&self) -> f32 {
        1.0
    }

    fn max_chars_per_byte(&self) -> f32 {
        1.0
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Utf8Encoder;

impl EncoderKernel for Utf8Encoder {
    fn encode_char(&self, c: char, dst: &mut [u8; MAX_BYTES_PER_CHAR]) -> Encoded {
        Encoded::Bytes(c.encode_utf8(dst).len())
    }

    fn average_bytes_per_char(&self) -> f32 {
        1.1
    }

    fn max_bytes_per_char(&self) -> f32 {
        3.0
    }
}

#[cfg(test)]
mod tests {
    use super::super::{Decoded, DecoderKernel, Encoded, EncoderKernel, MAX_BYTES_PER_CHAR};
    use super::{Utf8Decoder, Utf8Encoder};

    fn decode(src: &[u8]) -> Decoded {
        Utf8Decoder.decode_char(src)
    }

    #[test]
    fn well_formed() {
        assert_eq!(decode(b"a"), Decoded::Char('a', 1));
        assert_eq!(decode("é".as_bytes()), Decoded::Char('é', 2));
        assert_eq!(decode("€x".as_bytes()), Decoded::Char('€', 3));
        assert_eq!(decode("😀".as_bytes()), Decoded::Char('😀', 4));
        assert_eq!(decode(&[0xF4, 0x8F, 0xBF, 0xBF]), Decoded::Char('\u{10FFFF}', 4));
    }

    #[test]
    fn truncated_prefixes_are_incomplete() {
        assert_eq!(decode(&[0xC2]), Decoded::Incomplete);
        assert_eq!(decode(&[0xE2, 0x82]), Decoded::Incomplete);
        assert_eq!(decode(&[0xF0, 0x9F, 0x98]), Decoded::Incomplete);
    }

    #[test]
    fn maximal_subparts() {
        assert_eq!(decode(&[0xC2, 0x41]), Decoded::Malformed(1));
        assert_eq!(decode(&[0xE2, 0x82, 0x41]), Decoded::Malformed(2));
        assert_eq!(decode(&[0xF0, 0x9F, 0x98, 0x41]), Decoded::Malformed(3));
        // lead bytes that can never start a sequence
        assert_eq!(decode(&[0x80]), Decoded::Malformed(1));
        assert_eq!(decode(&[0xC0, 0xAF]), Decoded::Malformed(1));
        assert_eq!(decode(&[0xF5, 0x80]), Decoded::Malformed(1));
        // overlong, surrogate and out-of-range second bytes
        assert_eq!(decode(&[0xE0, 0x80, 0x80]), Decoded::Malformed(1));
        assert_eq!(decode(&[0xED, 0xA0, 0x80]), Decoded::Malformed(1));
        assert_eq!(decode(&[0xF4, 0x90, 0x80, 0x80]), Decoded::Malformed(1));
    }

    #[test]
    fn encodes_every_scalar() {
        let mut dst = [0; MAX_BYTES_PER_CHAR];
        for c in ['a', 'é', '€', '😀'] {
            let n = c.len_utf8();
            assert_eq!(Utf8Encoder.encode_char(c, &mut dst), Encoded::Bytes(n));
            assert_eq!(&dst[..n], c.to_string().as_bytes());
        }
    }
}
