use std::io;

use super::{BoundsError, CoderPhase};

/// A programming error: the caller drove a coder or a cursor in a way the contract forbids.
///
/// These errors are never produced by the data being coded, so callers should treat them as bugs
/// rather than retry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodingError {
    /// A cursor was asked for more units than it has remaining.
    #[error(transparent)]
    Bounds(#[from] BoundsError),

    /// A coding operation was called out of lifecycle order.
    #[error("{operation} is illegal while the coder is {phase}")]
    IllegalState {
        operation: &'static str,
        phase: CoderPhase,
    },

    /// `flush` was called while the last step returned a reported error that the caller did not
    /// resolve by coding past it.
    #[error("flush is illegal until the reported coding error is resolved")]
    UnresolvedError,

    /// A substitute sequence is not legal for the coder it was configured on.
    #[error("illegal replacement: {0}")]
    IllegalReplacement(&'static str),
}

/// Malformed input: an illegal byte sequence for a decoder, an unpaired surrogate for an encoder,
/// or invalid UTF-8 written to an [`EncodingWriter`].
///
/// The stream adapters return it inside an [`io::Error`] of kind `InvalidData`;
/// [`wrapped_in`](Self::wrapped_in) gets it back out.
///
/// [`EncodingWriter`]: crate::EncodingWriter
///
/// # Examples
///
/// ```rust
/// use std::io::Read as _;
///
/// use charset_coder::{DecodingReader, MalformedError, UTF_8};
///
/// let src: &[u8] = &[b'o', b'k', 0xff, b'!'];
/// let mut reader = DecodingReader::new(src, UTF_8.new_decoder());
///
/// let mut dst = String::new();
/// while let Err(io_error) = reader.read_to_string(&mut dst) {
///     match MalformedError::wrapped_in(&io_error) {
///         Some(e) => {
///             assert_eq!(e.length(), 1);
///             dst.push('\u{FFFD}');
///         }
///         None => panic!("found other error than MalformedError: {}", io_error),
///     }
/// }
///
/// assert_eq!(dst, "ok\u{FFFD}!");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("encountered a malformed input sequence of length {length}")]
pub struct MalformedError {
    length: usize,
}

impl MalformedError {
    pub(crate) fn new(length: usize) -> Self {
        Self { length }
    }

    /// Returns the number of input units in the malformed sequence.
    pub fn length(&self) -> usize {
        self.length
    }

    pub(crate) fn wrap(self) -> io::Error {
        io::Error::new(io::ErrorKind::InvalidData, self)
    }

    /// Returns the `MalformedError` inside `io_error`, if that is what it wraps.
    #[inline]
    pub fn wrapped_in(io_error: &io::Error) -> Option<&Self> {
        io_error.get_ref()?.downcast_ref::<Self>()
    }
}

/// Legal input without a mapping: a character the encoder's charset cannot represent, or a byte
/// the decoder's table leaves undefined.
///
/// [`EncodingWriter`] attaches the character, available through [`value`], so that a caller can
/// write a replacement of its own through the passthrough writer.
///
/// [`EncodingWriter`]: crate::EncodingWriter
/// [`value`]: UnmappableError::value
///
/// # Examples
///
/// ```rust
/// use std::io::{ErrorKind, Write as _};
///
/// use charset_coder::{EncodingWriter, UnmappableError, ISO_8859_1};
///
/// let mut writer = EncodingWriter::new(Vec::new(), ISO_8859_1.new_encoder());
///
/// let mut src = "café💥!";
/// while !src.is_empty() {
///     match writer.write_str(src) {
///         Ok(0) => break,
///         Ok(consumed) => src = &src[consumed..],
///         Err(io_error) if io_error.kind() == ErrorKind::Interrupted => {}
///         Err(io_error) => match UnmappableError::wrapped_in(&io_error).and_then(|e| e.value()) {
///             Some(c) => write!(writer.passthrough(), "&#{};", u32::from(c))?,
///             None => return Err(io_error),
///         },
///     }
/// }
/// writer.flush()?;
///
/// assert_eq!(writer.writer_ref(), b"caf\xe9&#128165;!");
/// # Ok::<(), std::io::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("encountered an unmappable input sequence of length {length}")]
pub struct UnmappableError {
    length: usize,
    value: Option<char>,
}

impl UnmappableError {
    pub(crate) fn new(length: usize) -> Self {
        Self {
            length,
            value: None,
        }
    }

    pub(crate) fn with_value(mut self, c: char) -> Self {
        self.value = Some(c);
        self
    }

    /// Returns the number of input units in the unmappable sequence.
    pub fn length(&self) -> usize {
        self.length
    }

    /// Returns the unmappable character, if the reporter knows it.
    #[inline]
    pub fn value(&self) -> Option<char> {
        self.value
    }

    /// Wraps `self` in a [`std::io::Error`].
    pub(crate) fn wrap(self) -> io::Error {
        io::Error::new(io::ErrorKind::InvalidData, self)
    }

    /// Returns the `UnmappableError` inside `io_error`, if that is what it wraps.
    #[inline]
    pub fn wrapped_in(io_error: &io::Error) -> Option<&Self> {
        io_error.get_ref()?.downcast_ref::<Self>()
    }
}

/// A data error surfaced by the one-shot helpers and the stream adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CharacterCodingError {
    #[error(transparent)]
    Malformed(#[from] MalformedError),
    #[error(transparent)]
    Unmappable(#[from] UnmappableError),
}

impl CharacterCodingError {
    /// Returns the number of input units in the bad sequence.
    pub fn length(&self) -> usize {
        match self {
            Self::Malformed(e) => e.length(),
            Self::Unmappable(e) => e.length(),
        }
    }
}

impl From<CharacterCodingError> for io::Error {
    fn from(value: CharacterCodingError) -> Self {
        match value {
            CharacterCodingError::Malformed(e) => e.wrap(),
            CharacterCodingError::Unmappable(e) => e.wrap(),
        }
    }
}

/// The error returned by charset lookups.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    /// The name is not a legal charset name.
    #[error("illegal charset name: {0:?}")]
    IllegalName(String),
    /// The name is legal but no charset is registered under it.
    #[error("unsupported charset: {0:?}")]
    Unsupported(String),
}

#[cfg(test)]
mod tests {
    use super::{io, CharacterCodingError, MalformedError, UnmappableError};

    #[test]
    fn unwrap_malformed_error() {
        assert!(MalformedError::wrapped_in(&io::Error::new(
            io::ErrorKind::InvalidData,
            MalformedError::new(1)
        ))
        .is_some());
        assert!(MalformedError::wrapped_in(&io::Error::new(
            io::ErrorKind::Other,
            MalformedError::new(2)
        ))
        .is_some_and(|e| e.length() == 2));

        assert!(MalformedError::wrapped_in(&io::ErrorKind::InvalidData.into()).is_none());
        assert!(MalformedError::wrapped_in(&io::Error::new(
            io::ErrorKind::InvalidData,
            "encountered a malformed input sequence of length 1"
        ))
        .is_none());
        assert!(MalformedError::wrapped_in(&UnmappableError::new(1).wrap()).is_none());
    }

    #[test]
    fn unwrap_unmappable_error() {
        let e = io::Error::from(CharacterCodingError::from(
            UnmappableError::new(2).with_value('\u{1F600}'),
        ));
        assert_eq!(e.kind(), io::ErrorKind::InvalidData);
        let inner = UnmappableError::wrapped_in(&e).unwrap();
        assert_eq!(inner.length(), 2);
        assert_eq!(inner.value(), Some('\u{1F600}'));

        assert!(UnmappableError::wrapped_in(&io::ErrorKind::Other.into()).is_none());
        assert!(UnmappableError::wrapped_in(&MalformedError::new(1).wrap()).is_none());
        assert_eq!(UnmappableError::new(1).value(), None);
    }
}
