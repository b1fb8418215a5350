use std::{fmt, hash, sync::OnceLock};

use super::charsets::{build_table, ByteOrder, Family, Table};
use super::result::Substitute;
use super::{
    CodingError, Decoder, DecoderActions, Encoder, EncoderActions, ErrorAction, LookupError,
};

/// A named charset: a bidirectional mapping between bytes and Unicode characters.
///
/// Charsets are immutable statics. Obtain one through the constants of this crate, such as
/// [`UTF_8`], or by name through [`Charset::for_name`], and create engines from it.
///
/// ```rust
/// use charset_coder::{Charset, WINDOWS_1251};
///
/// let charset = Charset::for_name("CP1251")?;
/// assert_eq!(charset, WINDOWS_1251);
/// assert_eq!(charset.decode(&[0xCF, 0xF0, 0xE8, 0xE2, 0xE5, 0xF2]), "Привет");
/// # Ok::<(), charset_coder::LookupError>(())
/// ```
pub struct Charset {
    name: &'static str,
    aliases: &'static [&'static str],
    family: Family,
    /// Upper half of a single-byte charset, built on first use.
    table: OnceLock<Table>,
}

impl Charset {
    const fn new(name: &'static str, aliases: &'static [&'static str], family: Family) -> Self {
        Self {
            name,
            aliases,
            family,
            table: OnceLock::new(),
        }
    }

    /// Looks up a charset by its canonical name or one of its aliases, ignoring ASCII case.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::IllegalName`] if `name` is not a legal charset name and
    /// [`LookupError::Unsupported`] if no charset is registered under it.
    pub fn for_name(name: &str) -> Result<&'static Self, LookupError> {
        resolve(name)
    }

    /// Returns the canonical name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the other names this charset is registered under.
    pub fn aliases(&self) -> &'static [&'static str] {
        self.aliases
    }

    /// Creates a decoder that reports malformed and unmappable input.
    pub fn new_decoder(&'static self) -> Decoder {
        Decoder::new(self)
    }

    /// Creates an encoder that reports malformed and unmappable input.
    pub fn new_encoder(&'static self) -> Encoder {
        Encoder::new(self)
    }

    /// Creates a decoder with the given error actions.
    ///
    /// # Errors
    ///
    /// Returns [`CodingError::IllegalReplacement`] if a substitute is not well-formed UTF-16.
    pub fn new_decoder_with(
        &'static self,
        actions: DecoderActions,
    ) -> Result<Decoder, CodingError> {
        let mut decoder = Decoder::new(self);
        decoder.set_actions(actions)?;
        Ok(decoder)
    }

    /// Creates an encoder with the given error actions.
    ///
    /// # Errors
    ///
    /// Returns [`CodingError::IllegalReplacement`] if a substitute does not decode cleanly in
    /// this charset.
    pub fn new_encoder_with(
        &'static self,
        actions: EncoderActions,
    ) -> Result<Encoder, CodingError> {
        let mut encoder = Encoder::new(self);
        encoder.set_actions(actions)?;
        Ok(encoder)
    }

    /// Returns the bytes this charset uses in place of input it cannot encode: `?` for the
    /// ASCII-compatible charsets and U+FFFD for the UTF-16 and UTF-32 families.
    pub fn default_replacement(&self) -> &'static [u8] {
        match self.family {
            Family::Utf16 {
                order: ByteOrder::LittleEndian,
                ..
            } => &[0xFD, 0xFF],
            Family::Utf16 { .. } => &[0xFF, 0xFD],
            Family::Utf32(ByteOrder::BigEndian) => &[0x00, 0x00, 0xFF, 0xFD],
            Family::Utf32(ByteOrder::LittleEndian) => &[0xFD, 0xFF, 0x00, 0x00],
            _ => b"?",
        }
    }

    /// Decodes `bytes`, replacing malformed and unmappable input with U+FFFD.
    pub fn decode(&'static self, bytes: &[u8]) -> String {
        let mut decoder = Decoder::new(self);
        let action = ErrorAction::Replace(Substitute::from_prefix(&[0xFFFDu16]));
        decoder.set_actions_unchecked(DecoderActions::both(action));
        match decoder.decode_all(bytes) {
            Ok(units) => String::from_utf16_lossy(&units),
            Err(e) => {
                debug_assert!(false, "replacing decoder reported {}", e);
                String::new()
            }
        }
    }

    /// Encodes `s`, replacing characters this charset cannot represent with the
    /// [default replacement](Self::default_replacement).
    pub fn encode(&'static self, s: &str) -> Vec<u8> {
        let mut encoder = Encoder::new(self);
        let action = ErrorAction::Replace(Substitute::from_prefix(self.default_replacement()));
        encoder.set_actions_unchecked(EncoderActions::both(action));
        match encoder.encode_str(s) {
            Ok(bytes) => bytes,
            Err(e) => {
                debug_assert!(false, "replacing encoder reported {}", e);
                Vec::new()
            }
        }
    }

    pub(crate) fn family(&self) -> Family {
        self.family
    }

    /// Returns the table of a single-byte charset. Other families get an empty table.
    pub(crate) fn table(&'static self) -> &'static Table {
        self.table.get_or_init(|| match self.family {
            Family::SingleByte(label) => build_table(label),
            _ => [0; 128],
        })
    }

    fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
            || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(name))
    }
}

impl PartialEq for Charset {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Charset {}

impl hash::Hash for Charset {
    fn hash<H: hash::Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Debug for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Charset {{ {} }}", self.name)
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Looks up a charset by name. See [`Charset::for_name`].
pub fn resolve(name: &str) -> Result<&'static Charset, LookupError> {
    if !is_legal_name(name) {
        tracing::debug!(name, "illegal charset name");
        return Err(LookupError::IllegalName(name.to_owned()));
    }
    match ALL.iter().copied().find(|charset| charset.is_named(name)) {
        Some(charset) => Ok(charset),
        None => {
            tracing::debug!(name, "unsupported charset");
            Err(LookupError::Unsupported(name.to_owned()))
        }
    }
}

/// Returns `true` if a charset is registered under `name`. Illegal names are never supported.
pub fn is_supported(name: &str) -> bool {
    resolve(name).is_ok()
}

/// Returns every registered charset.
pub fn available_charsets() -> &'static [&'static Charset] {
    ALL
}

/// Accepts names made of ASCII letters, digits and `- + . : _` that start with a letter or digit.
fn is_legal_name(name: &str) -> bool {
    match name.as_bytes() {
        [first, rest @ ..] => {
            first.is_ascii_alphanumeric()
                && rest.iter().all(|&b| {
                    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'+' | b'.' | b':' | b'_')
                })
        }
        [] => false,
    }
}

macro_rules! charsets {
    ($($(#[$attr:meta])* $ident:ident => $name:literal, [$($alias:literal),* $(,)?], $family:expr;)*) => {
        mod statics {
            use super::*;

            $(pub(super) static $ident: Charset = Charset::new($name, &[$($alias),*], $family);)*
        }

        $(
            $(#[$attr])*
            pub static $ident: &Charset = &statics::$ident;
        )*

        static ALL: &[&Charset] = &[$(&statics::$ident),*];
    };
}

charsets! {
    /// The US-ASCII charset (7-bit).
    US_ASCII => "US-ASCII", [
        "ascii", "us", "iso646-us", "ANSI_X3.4-1968", "ANSI_X3.4-1986", "cp367", "ibm367",
        "csASCII", "iso-ir-6", "iso_646.irv:1991", "646", "default",
    ], Family::Ascii;
    /// The ISO-8859-1 (Latin-1) charset, mapping every byte to U+0000..U+00FF.
    ISO_8859_1 => "ISO-8859-1", [
        "iso8859_1", "8859_1", "ISO_8859-1", "ISO_8859-1:1987", "latin1", "l1", "cp819",
        "IBM819", "ibm-819", "819", "csISOLatin1", "iso-ir-100",
    ], Family::Latin1;
    /// The UTF-8 charset.
    UTF_8 => "UTF-8", ["UTF8", "unicode-1-1-utf-8"], Family::Utf8;
    /// UTF-16 in big-endian byte order, without a byte order mark.
    UTF_16BE => "UTF-16BE", ["UTF_16BE", "X-UTF-16BE", "ISO-10646-UCS-2", "UnicodeBigUnmarked"],
        Family::Utf16 { order: ByteOrder::BigEndian, bom: false };
    /// UTF-16 in little-endian byte order, without a byte order mark.
    UTF_16LE => "UTF-16LE", ["UTF_16LE", "X-UTF-16LE", "UnicodeLittleUnmarked"],
        Family::Utf16 { order: ByteOrder::LittleEndian, bom: false };
    /// UTF-16 with a byte order mark. The decoder detects the byte order from a leading mark,
    /// defaulting to big-endian; the encoder writes a big-endian mark first.
    UTF_16 => "UTF-16", ["UTF_16", "utf16", "unicode", "UnicodeBig"],
        Family::Utf16 { order: ByteOrder::BigEndian, bom: true };
    /// UTF-32 in big-endian byte order.
    UTF_32BE => "UTF-32BE", ["UTF_32BE", "X-UTF-32BE"], Family::Utf32(ByteOrder::BigEndian);
    /// UTF-32 in little-endian byte order.
    UTF_32LE => "UTF-32LE", ["UTF_32LE", "X-UTF-32LE"], Family::Utf32(ByteOrder::LittleEndian);
    IBM866 => "IBM866", ["cp866", "866", "csIBM866"], Family::SingleByte("ibm866");
    ISO_8859_2 => "ISO-8859-2", ["iso8859_2", "ISO_8859-2", "latin2", "l2", "csISOLatin2"],
        Family::SingleByte("iso-8859-2");
    ISO_8859_3 => "ISO-8859-3", ["iso8859_3", "ISO_8859-3", "latin3", "l3", "csISOLatin3"],
        Family::SingleByte("iso-8859-3");
    ISO_8859_4 => "ISO-8859-4", ["iso8859_4", "ISO_8859-4", "latin4", "l4", "csISOLatin4"],
        Family::SingleByte("iso-8859-4");
    ISO_8859_5 => "ISO-8859-5", ["iso8859_5", "ISO_8859-5", "cyrillic", "csISOLatinCyrillic"],
        Family::SingleByte("iso-8859-5");
    ISO_8859_6 => "ISO-8859-6", ["iso8859_6", "ISO_8859-6", "arabic", "csISOLatinArabic"],
        Family::SingleByte("iso-8859-6");
    /// Latin/Greek. Bytes 0xAE, 0xD2 and 0xFF are unmapped.
    ISO_8859_7 => "ISO-8859-7", ["iso8859_7", "ISO_8859-7", "greek", "greek8", "csISOLatinGreek"],
        Family::SingleByte("iso-8859-7");
    ISO_8859_8 => "ISO-8859-8", ["iso8859_8", "ISO_8859-8", "hebrew", "csISOLatinHebrew"],
        Family::SingleByte("iso-8859-8");
    ISO_8859_10 => "ISO-8859-10", ["iso8859_10", "ISO_8859-10", "latin6", "l6", "csISOLatin6"],
        Family::SingleByte("iso-8859-10");
    ISO_8859_13 => "ISO-8859-13", ["iso8859_13", "ISO_8859-13", "latin7", "l7"],
        Family::SingleByte("iso-8859-13");
    ISO_8859_14 => "ISO-8859-14", ["iso8859_14", "ISO_8859-14", "latin8", "l8"],
        Family::SingleByte("iso-8859-14");
    ISO_8859_15 => "ISO-8859-15", ["iso8859_15", "ISO_8859-15", "latin9", "l9", "csISOLatin9"],
        Family::SingleByte("iso-8859-15");
    ISO_8859_16 => "ISO-8859-16", ["iso8859_16", "ISO_8859-16", "latin10", "l10"],
        Family::SingleByte("iso-8859-16");
    KOI8_R => "KOI8-R", ["koi8_r", "koi8", "csKOI8R"], Family::SingleByte("koi8-r");
    KOI8_U => "KOI8-U", ["koi8_u"], Family::SingleByte("koi8-u");
    MACINTOSH => "macintosh", ["x-MacRoman", "MacRoman", "csMacintosh"],
        Family::SingleByte("macintosh");
    WINDOWS_874 => "windows-874", ["x-windows-874", "ms874", "cp874"],
        Family::SingleByte("windows-874");
    WINDOWS_1250 => "windows-1250", ["cp1250", "cp5346"], Family::SingleByte("windows-1250");
    WINDOWS_1251 => "windows-1251", ["cp1251", "cp5347", "ansi-1251"],
        Family::SingleByte("windows-1251");
    WINDOWS_1252 => "windows-1252", ["cp1252", "cp5348"], Family::SingleByte("windows-1252");
    WINDOWS_1253 => "windows-1253", ["cp1253", "cp5349"], Family::SingleByte("windows-1253");
    WINDOWS_1254 => "windows-1254", ["cp1254", "cp5350"], Family::SingleByte("windows-1254");
    WINDOWS_1255 => "windows-1255", ["cp1255"], Family::SingleByte("windows-1255");
    WINDOWS_1256 => "windows-1256", ["cp1256"], Family::SingleByte("windows-1256");
    WINDOWS_1257 => "windows-1257", ["cp1257", "cp5353"], Family::SingleByte("windows-1257");
    WINDOWS_1258 => "windows-1258", ["cp1258"], Family::SingleByte("windows-1258");
    X_MAC_CYRILLIC => "x-mac-cyrillic", ["x-MacCyrillic", "MacCyrillic", "x-mac-ukrainian"],
        Family::SingleByte("x-mac-cyrillic");
}

#[cfg(test)]
mod tests {
    use super::{
        available_charsets, is_supported, resolve, Charset, LookupError, ISO_8859_1, ISO_8859_7,
        US_ASCII, UTF_16, UTF_16LE, UTF_32BE, UTF_8, WINDOWS_1252,
    };

    #[test]
    fn lookup_ignores_ascii_case() {
        assert_eq!(resolve("utf-8"), Ok(UTF_8));
        assert_eq!(resolve("LATIN1"), Ok(ISO_8859_1));
        assert_eq!(resolve("Cp1252"), Ok(WINDOWS_1252));
        assert_eq!(Charset::for_name("iso_646.irv:1991"), Ok(US_ASCII));
        assert!(is_supported("unicodebig"));
    }

    #[test]
    fn names_are_validated_before_lookup() {
        for name in ["", "-utf8", "utf 8", "utf/8", "ütf-8"] {
            assert_eq!(resolve(name), Err(LookupError::IllegalName(name.to_owned())));
        }
        assert_eq!(
            resolve("x-no-such+charset"),
            Err(LookupError::Unsupported("x-no-such+charset".to_owned()))
        );
        assert!(!is_supported(""));
    }

    #[test]
    fn registry_is_consistent() {
        let all = available_charsets();
        for (i, a) in all.iter().enumerate() {
            assert_eq!(resolve(a.name()), Ok(*a));
            for alias in a.aliases() {
                assert_eq!(resolve(alias), Ok(*a), "alias {} of {}", alias, a);
            }
            for b in &all[i + 1..] {
                assert_ne!(a, b);
            }
            // every default replacement is a legal substitute for the charset's own encoder
            assert!(a.new_decoder().decode_all(a.default_replacement()).is_ok());
        }
    }

    #[test]
    fn lossy_helpers() {
        assert_eq!(UTF_8.decode(&[b'a', 0xFF, 0xE2, 0x82]), "a\u{FFFD}\u{FFFD}");
        assert_eq!(ISO_8859_7.decode(&[0xE1, 0xD2]), "α\u{FFFD}");
        assert_eq!(US_ASCII.encode("naïve"), b"na?ve");
        assert_eq!(UTF_16LE.encode("A"), &[0x41, 0x00]);
        assert_eq!(UTF_16.encode("A"), &[0xFE, 0xFF, 0x00, 0x41]);
        assert_eq!(UTF_32BE.encode("😀"), &[0x00, 0x01, 0xF6, 0x00]);
        assert_eq!(UTF_32BE.to_string(), "UTF-32BE");
    }
}
