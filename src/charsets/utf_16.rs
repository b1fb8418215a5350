use super::{ByteOrder, Decoded, DecoderKernel, Encoded, EncoderKernel, MAX_BYTES_PER_CHAR};

const BOM: u16 = 0xFEFF;

fn is_high_surrogate(unit: u16) -> bool {
    (0xD800..=0xDBFF).contains(&unit)
}

fn is_low_surrogate(unit: u16) -> bool {
    (0xDC00..=0xDFFF).contains(&unit)
}

/// Decodes UTF-16 in a fixed byte order, or detects the order from a leading byte order mark.
#[derive(Debug, Clone)]
pub(crate) struct Utf16Decoder {
    /// `None` while a BOM-detecting decoder is still at the start of the stream.
    order: Option<ByteOrder>,
    detect_bom: bool,
}

impl Utf16Decoder {
    /// Creates a decoder fixed to `order`.
    pub fn new(order: ByteOrder) -> Self {
        Self {
            order: Some(order),
            detect_bom: false,
        }
    }

    /// Creates a decoder that consumes a leading byte order mark and defaults to big-endian.
    pub fn detecting() -> Self {
        Self {
            order: None,
            detect_bom: true,
        }
    }
}

impl DecoderKernel for Utf16Decoder {
    fn decode_char(&self, src: &[u8]) -> Decoded {
        let (Some(&b0), Some(&b1)) = (src.first(), src.get(1)) else {
            return Decoded::Incomplete;
        };
        if self.order.is_none() {
            match [b0, b1] {
                [0xFE, 0xFF] | [0xFF, 0xFE] => return Decoded::Skip(2),
                _ => {}
            }
        }
        let order = self.order.unwrap_or(ByteOrder::BigEndian);
        let unit = order.read_u16([b0, b1]);
        if is_low_surrogate(unit) {
            return Decoded::Malformed(2);
        }
        if !is_high_surrogate(unit) {
            return match char::from_u32(u32::from(unit)) {
                Some(c) => Decoded::Char(c, 2),
                None => Decoded::Malformed(2),
            };
        }
        let (Some(&b2), Some(&b3)) = (src.get(2), src.get(3)) else {
            return Decoded::Incomplete;
        };
        let low = order.read_u16([b2, b3]);
        if !is_low_surrogate(low) {
            return Decoded::Malformed(2);
        }
        match char::decode_utf16([unit, low]).next() {
            Some(Ok(c)) => Decoded::Char(c, 4),
            _ => Decoded::Malformed(4),
        }
    }

    fn commit(&mut self, consumed: &[u8]) {
        if self.order.is_none() {
            self.order = Some(match consumed {
                [0xFF, 0xFE] => ByteOrder::LittleEndian,
                _ => ByteOrder::BigEndian,
            });
        }
    }

    fn reject(&mut self) {
        // a byte order mark is only recognized at offset 0
        self.order.get_or_insert(ByteOrder::BigEndian);
    }

    fn reset(&mut self) {
        if self.detect_bom {
            self.order = None;
        }
    }

    fn average_chars_per_byte(&self) -> f32 {
        0.5
    }

    fn max_chars_per_byte(&self) -> f32 {
        1.0
    }
}

/// Encodes UTF-16 in a fixed byte order, optionally writing a byte order mark before the first
/// character.
#[derive(Debug, Clone)]
pub(crate) struct Utf16Encoder {
    order: ByteOrder,
    write_bom: bool,
    bom_pending: bool,
}

impl Utf16Encoder {
    pub fn new(order: ByteOrder, write_bom: bool) -> Self {
        Self {
            order,
            write_bom,
            bom_pending: write_bom,
        }
    }
}

impl EncoderKernel for Utf16Encoder {
    fn encode_char(&self, c: char, dst: &mut [u8; MAX_BYTES_PER_CHAR]) -> Encoded {
        let mut units = [0u16; 2];
        let units = c.encode_utf16(&mut units);
        for (chunk, &unit) in dst.chunks_exact_mut(2).zip(units.iter()) {
            chunk.copy_from_slice(&self.order.write_u16(unit));
        }
        Encoded::Bytes(units.len() * 2)
    }

    fn pending_prefix(&self, dst: &mut [u8; MAX_BYTES_PER_CHAR]) -> usize {
        if !self.bom_pending {
            return 0;
        }
        dst[..2].copy_from_slice(&self.order.write_u16(BOM));
        2
    }

    fn commit(&mut self) {
        self.bom_pending = false;
    }

    fn reset(&mut self) {
        self.bom_pending = self.write_bom;
    }

    fn average_bytes_per_char(&self) -> f32 {
        2.0
    }

    fn max_bytes_per_char(&self) -> f32 {
        if self.write_bom {
            4.0
        } else {
            2.0
        }
    }
}
