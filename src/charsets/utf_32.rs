use super::{ByteOrder, Decoded, DecoderKernel, Encoded, EncoderKernel, MAX_BYTES_PER_CHAR};

#[derive(Debug, Clone)]
pub(crate) struct Utf32Decoder {
    order: ByteOrder,
}

impl Utf32Decoder {
    pub fn new(order: ByteOrder) -> Self {
        Self { order }
    }
}

impl DecoderKernel for Utf32Decoder {
    fn decode_char(&self, src: &[u8]) -> Decoded {
        let &[b0, b1, b2, b3, ..] = src else {
            return Decoded::Incomplete;
        };
        match char::from_u32(self.order.read_u32([b0, b1, b2, b3])) {
            Some(c) => Decoded::Char(c, 4),
            None => Decoded::Malformed(4),
        }
    }

    fn average_chars_per_byte(&self) -> f32 {
        0.25
    }

    fn max_chars_per_byte(&self) -> f32 {
        1.0
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Utf32Encoder {
    order: ByteOrder,
}

impl Utf32Encoder {
    pub fn new(order: ByteOrder) -> Self {
        Self { order }
    }
}

impl EncoderKernel for Utf32Encoder {
    fn encode_char(&self, c: char, dst: &mut [u8; MAX_BYTES_PER_CHAR]) -> Encoded {
        dst[..4].copy_from_slice(&self.order.write_u32(u32::from(c)));
        Encoded::Bytes(4)
    }

    fn average_bytes_per_char(&self) -> f32 {
        4.0
    }

    fn max_bytes_per_char(&self) -> f32 {
        4.0
    }
}
