use super::{Decoded, DecoderKernel, Encoded, EncoderKernel, MAX_BYTES_PER_CHAR};

#[derive(Debug, Clone, Default)]
pub(crate) struct AsciiDecoder;

impl DecoderKernel for AsciiDecoder {
    fn decode_char(&self, src: &[u8]) -> Decoded {
        match src[0] {
            b @ 0..=0x7F => Decoded::Char(char::from(b), 1),
            _ => Decoded::Malformed(1),
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
pub(crate) struct AsciiEncoder;

impl EncoderKernel for AsciiEncoder {
    fn encode_char(&self, c: char, dst: &mut [u8; MAX_BYTES_PER_CHAR]) -> Encoded {
        if c.is_ascii() {
            dst[0] = c as u8;
            Encoded::Bytes(1)
        } else {
            Encoded::Unmappable
        }
    }

    fn average_bytes_per_char(&self) -> f32 {
        1.0
    }

    fn max_bytes_per_char(&self) -> f32 {
        1.0
    }
}

/// ISO-8859-1, whose bytes are exactly U+0000 to U+00FF.
#[derive(Debug, Clone, Default)]
pub(crate) struct Latin1Decoder;

impl DecoderKernel for Latin1Decoder {
    fn decode_char(&self, src: &[u8]) -> Decoded {
        Decoded::Char(char::from(src[0]), 1)
    }

    fn average_chars_per_byte(&self) -> f32 {
        1.0
    }

    fn max_chars_per_byte(&self) -> f32 {
        1.0
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Latin1Encoder;

impl EncoderKernel for Latin1Encoder {
    fn encode_char(&self, c: char, dst: &mut [u8; MAX_BYTES_PER_CHAR]) -> Encoded {
        match u8::try_from(c) {
            Ok(b) => {
                dst[0] = b;
                Encoded::Bytes(1)
            }
            Err(_) => Encoded::Unmappable,
        }
    }

    fn average_bytes_per_char(&self) -> f32 {
        1.0
    }

    fn max_bytes_per_char(&self) -> f32 {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::super::{Decoded, DecoderKernel, Encoded, EncoderKernel, MAX_BYTES_PER_CHAR};
    use super::{AsciiDecoder, AsciiEncoder, Latin1Decoder, Latin1Encoder};

    #[test]
    fn ascii_rejects_high_bytes() {
        assert_eq!(AsciiDecoder.decode_char(b"A"), Decoded::Char('A', 1));
        assert_eq!(AsciiDecoder.decode_char(&[0x80, b'A']), Decoded::Malformed(1));

        let mut dst = [0; MAX_BYTES_PER_CHAR];
        assert_eq!(AsciiEncoder.encode_char('~', &mut dst), Encoded::Bytes(1));
        assert_eq!(dst[0], b'~');
        assert_eq!(AsciiEncoder.encode_char('é', &mut dst), Encoded::Unmappable);
    }

    #[test]
    fn latin1_maps_all_bytes() {
        assert_eq!(Latin1Decoder.decode_char(&[0xe9]), Decoded::Char('é', 1));
        assert_eq!(Latin1Decoder.decode_char(&[0x80]), Decoded::Char('\u{80}', 1));

        let mut dst = [0; MAX_BYTES_PER_CHAR];
        assert_eq!(Latin1Encoder.encode_char('ÿ', &mut dst), Encoded::Bytes(1));
        assert_eq!(dst[0], 0xff);
        assert_eq!(Latin1Encoder.encode_char('Ā', &mut dst), Encoded::Unmappable);
    }
}
