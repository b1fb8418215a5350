use super::{Decoded, DecoderKernel, Encoded, EncoderKernel, MAX_BYTES_PER_CHAR};

/// The upper half (bytes 0x80 to 0xFF) of an ASCII-compatible single-byte charset. Zero marks a
/// byte without a mapping.
pub(crate) type Table = [u16; 128];

/// Builds a table from the `encoding_rs` single-byte encoding registered under `label`.
///
/// Returns an all-holes table if `label` does not name a single-byte encoding, so every upper-half
/// byte decodes as unmappable rather than as garbage.
pub(crate) fn build_table(label: &str) -> Table {
    let mut table = [0u16; 128];
    let encoding = match encoding_rs::Encoding::for_label(label.as_bytes()) {
        Some(encoding) if encoding.is_single_byte() => encoding,
        _ => {
            tracing::warn!(label, "no single-byte index data for label");
            return table;
        }
    };
    for (slot, byte) in table.iter_mut().zip(0x80u8..=0xFF) {
        if let Some(decoded) = encoding.decode_without_bom_handling_and_without_replacement(&[byte])
        {
            let mut units = decoded.encode_utf16();
            if let (Some(unit), None) = (units.next(), units.next()) {
                *slot = unit;
            }
        }
    }
    table
}

#[derive(Debug, Clone)]
pub(crate) struct SingleByteDecoder {
    table: &'static Table,
}

impl SingleByteDecoder {
    pub fn new(table: &'static Table) -> Self {
        Self { table }
    }
}

impl DecoderKernel for SingleByteDecoder {
    fn decode_char(&self, src: &[u8]) -> Decoded {
        let b = src[0];
        if b < 0x80 {
            return Decoded::Char(char::from(b), 1);
        }
        match self.table[usize::from(b - 0x80)] {
            0 => Decoded::Unmappable(1),
            mapped => match char::from_u32(u32::from(mapped)) {
                Some(c) => Decoded::Char(c, 1),
                None => Decoded::Unmappable(1),
            },
        }
    }

    fn average_chars_per_byte(&self) -> f32 {
        1.0
    }

    fn max_chars_per_byte(&self) -> f32 {
        1.0
    }
}

#[derive(Debug, Clone)]
pub(crate) struct SingleByteEncoder {
    table: &'static Table,
}

impl SingleByteEncoder {
    pub fn new(table: &'static Table) -> Self {
        Self { table }
    }
}

impl EncoderKernel for SingleByteEncoder {
    fn encode_char(&self, c: char, dst: &mut [u8; MAX_BYTES_PER_CHAR]) -> Encoded {
        if c.is_ascii() {
            dst[0] = c as u8;
            return Encoded::Bytes(1);
        }
        let Ok(bmp) = u16::try_from(u32::from(c)) else {
            return Encoded::Unmappable;
        };
        // search backwards; the lowest quarter of the upper half is the least probable
        match self.table.iter().rposition(|&mapped| mapped == bmp) {
            Some(i) => {
                dst[0] = 0x80 | i as u8;
                Encoded::Bytes(1)
            }
            None => Encoded::Unmappable,
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
    use std::sync::OnceLock;

    use super::super::{Decoded, DecoderKernel, Encoded, EncoderKernel, MAX_BYTES_PER_CHAR};
    use super::{build_table, SingleByteDecoder, SingleByteEncoder, Table};

    fn table(cell: &'static OnceLock<Table>, label: &str) -> &'static Table {
        cell.get_or_init(|| build_table(label))
    }

    #[test]
    fn tables_come_from_index_data() {
        static WINDOWS_1252: OnceLock<Table> = OnceLock::new();
        static KOI8_R: OnceLock<Table> = OnceLock::new();
        static ISO_8859_7: OnceLock<Table> = OnceLock::new();

        assert_eq!(table(&WINDOWS_1252, "windows-1252")[0], 0x20AC);
        assert_eq!(table(&KOI8_R, "koi8-r")[0xC1 - 0x80], 0x0430);
        assert_eq!(table(&ISO_8859_7, "iso-8859-7")[0xD2 - 0x80], 0);
    }

    #[test]
    fn non_single_byte_labels_give_empty_tables() {
        assert!(build_table("utf-8").iter().all(|&u| u == 0));
        assert!(build_table("no-such-label").iter().all(|&u| u == 0));
    }

    #[test]
    fn holes_are_unmappable() {
        static ISO_8859_7: OnceLock<Table> = OnceLock::new();
        let table = table(&ISO_8859_7, "iso-8859-7");
        let decoder = SingleByteDecoder::new(table);
        assert_eq!(decoder.decode_char(&[0xD2]), Decoded::Unmappable(1));
        assert_eq!(decoder.decode_char(&[0xE1]), Decoded::Char('α', 1));
        assert_eq!(decoder.decode_char(b"z"), Decoded::Char('z', 1));

        let encoder = SingleByteEncoder::new(table);
        let mut dst = [0; MAX_BYTES_PER_CHAR];
        assert_eq!(encoder.encode_char('α', &mut dst), Encoded::Bytes(1));
        assert_eq!(dst[0], 0xE1);
        assert_eq!(encoder.encode_char('\u{1F600}', &mut dst), Encoded::Unmappable);
        assert_eq!(encoder.encode_char('я', &mut dst), Encoded::Unmappable);
    }
}
