use std::fmt;

use super::cursor::Cursor;
use super::CodingError;

/// The maximum number of units a [`Substitute`] can hold.
pub const MAX_SUBSTITUTE_LEN: usize = 8;

/// The outcome of one decoding or encoding step.
///
/// `Underflow` and `Overflow` are flow-control signals asking the caller for more input or more
/// output space. `Malformed` and `Unmappable` are data errors returned when the corresponding
/// [`ErrorAction`] is [`Report`](ErrorAction::Report); their length is the number of input units
/// (bytes when decoding, UTF-16 code units when encoding) that make up the bad sequence, and is
/// never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoderResult {
    /// All input was processed and the caller signaled the end of input.
    Success,
    /// The input was exhausted, or ends with an incomplete sequence, and more input is expected.
    Underflow,
    /// The output has no room for the next character.
    Overflow,
    /// The input contains an illegal sequence of the given length.
    Malformed(usize),
    /// The input contains a legal sequence of the given length that cannot be mapped.
    Unmappable(usize),
}

impl CoderResult {
    /// Returns `true` for `Underflow`.
    pub fn is_underflow(&self) -> bool {
        matches!(self, Self::Underflow)
    }

    /// Returns `true` for `Overflow`.
    pub fn is_overflow(&self) -> bool {
        matches!(self, Self::Overflow)
    }

    /// Returns `true` for `Malformed`.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed(..))
    }

    /// Returns `true` for `Unmappable`.
    pub fn is_unmappable(&self) -> bool {
        matches!(self, Self::Unmappable(..))
    }

    /// Returns `true` for `Malformed` and `Unmappable`.
    pub fn is_error(&self) -> bool {
        self.is_malformed() || self.is_unmappable()
    }

    /// Returns the length of the bad input sequence for the error variants.
    pub fn length(&self) -> Option<usize> {
        match self {
            Self::Malformed(n) | Self::Unmappable(n) => Some(*n),
            _ => None,
        }
    }

    /// Converts the error variants into a [`CharacterCodingError`](crate::CharacterCodingError)
    /// and passes the other variants through.
    pub fn check(self) -> Result<Self, crate::CharacterCodingError> {
        match self {
            Self::Malformed(n) => Err(crate::MalformedError::new(n).into()),
            Self::Unmappable(n) => Err(crate::UnmappableError::new(n).into()),
            _ => Ok(self),
        }
    }
}

impl fmt::Display for CoderResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("SUCCESS"),
            Self::Underflow => f.write_str("UNDERFLOW"),
            Self::Overflow => f.write_str("OVERFLOW"),
            Self::Malformed(n) => write!(f, "MALFORMED[{}]", n),
            Self::Unmappable(n) => write!(f, "UNMAPPABLE[{}]", n),
        }
    }
}

/// A non-empty replacement sequence of at most [`MAX_SUBSTITUTE_LEN`] units stored inline.
///
/// Decoders substitute UTF-16 code units (`Substitute<u16>`); encoders substitute bytes
/// (`Substitute<u8>`).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Substitute<T> {
    len: u8,
    units: [T; MAX_SUBSTITUTE_LEN],
}

impl<T: Copy + Default> Substitute<T> {
    /// Creates a substitute from `units`, which must be non-empty and at most
    /// [`MAX_SUBSTITUTE_LEN`] long.
    pub fn new(units: &[T]) -> Result<Self, CodingError> {
        if units.is_empty() {
            return Err(CodingError::IllegalReplacement("replacement is empty"));
        }
        if units.len() > MAX_SUBSTITUTE_LEN {
            return Err(CodingError::IllegalReplacement("replacement is too long"));
        }
        Ok(Self::from_prefix(units))
    }

    /// Creates a substitute from at most the first [`MAX_SUBSTITUTE_LEN`] units of `units`.
    pub(crate) fn from_prefix(units: &[T]) -> Self {
        let len = units.len().min(MAX_SUBSTITUTE_LEN);
        let mut buf = [T::default(); MAX_SUBSTITUTE_LEN];
        buf[..len].copy_from_slice(&units[..len]);
        Self {
            len: len as u8,
            units: buf,
        }
    }

    /// Returns the units written in place of a bad sequence.
    pub fn as_slice(&self) -> &[T] {
        &self.units[..self.len()]
    }

    /// Returns the number of units, between 1 and [`MAX_SUBSTITUTE_LEN`].
    pub fn len(&self) -> usize {
        self.len.into()
    }

    /// Returns `true` if the substitute holds no units, which a constructed one never does.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<T: fmt::Debug> fmt::Debug for Substitute<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Substitute")
            .field(&&self.units[..usize::from(self.len)])
            .finish()
    }
}

/// The action a coder takes when it encounters malformed input or an unmappable character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ErrorAction<T> {
    /// Stop and return the error as a [`CoderResult`], leaving the input at the bad sequence.
    #[default]
    Report,
    /// Skip the bad sequence silently.
    Ignore,
    /// Skip the bad sequence and write the substitute instead.
    Replace(Substitute<T>),
}

impl<T: Copy + Default> ErrorAction<T> {
    /// Creates a `Replace` action from a unit slice.
    pub fn replace(units: &[T]) -> Result<Self, CodingError> {
        Substitute::new(units).map(Self::Replace)
    }

    /// Returns the substitute of a `Replace` action.
    pub fn substitute(&self) -> Option<&[T]> {
        match self {
            Self::Replace(s) => Some(s.as_slice()),
            _ => None,
        }
    }

    /// Resolves a bad input sequence of `length` units found at the input position.
    ///
    /// Returns `Some(result)` when the step must stop: `result` itself under `Report`, or
    /// `Overflow` when the substitute does not fit. Returns `None` when the sequence has been
    /// skipped and the step may continue.
    pub(crate) fn apply<U, I, O>(
        &self,
        result: CoderResult,
        input: &mut Cursor<U, I>,
        output: &mut Cursor<T, O>,
    ) -> Option<CoderResult>
    where
        U: Copy,
        I: AsRef<[U]>,
        O: AsRef<[T]> + AsMut<[T]>,
    {
        let length = result.length()?;
        match self {
            Self::Report => {
                tracing::debug!(%result, "reporting coding error");
                Some(result)
            }
            Self::Ignore => {
                tracing::trace!(%result, "ignoring bad input");
                input.advance(length);
                None
            }
            Self::Replace(substitute) => {
                if output.remaining() < substitute.len() {
                    return Some(CoderResult::Overflow);
                }
                tracing::trace!(%result, "replacing bad input");
                output.push_slice(substitute.as_slice());
                input.advance(length);
                None
            }
        }
    }
}

impl ErrorAction<u16> {
    /// Creates a decoder `Replace` action substituting the UTF-16 form of `s`.
    ///
    /// ```rust
    /// use charset_coder::ErrorAction;
    ///
    /// let action = ErrorAction::replace_str("\u{FFFD}")?;
    /// assert_eq!(action.substitute(), Some(&[0xFFFD][..]));
    /// # Ok::<(), charset_coder::CodingError>(())
    /// ```
    pub fn replace_str(s: &str) -> Result<Self, CodingError> {
        let mut units = [0u16; MAX_SUBSTITUTE_LEN];
        let mut len = 0;
        for c in s.chars() {
            if len + c.len_utf16() > units.len() {
                return Err(CodingError::IllegalReplacement("replacement is too long"));
            }
            len += c.encode_utf16(&mut units[len..]).len();
        }
        Self::replace(&units[..len])
    }
}

/// The pair of error actions an engine applies: one for malformed input, one for unmappable
/// characters. Both default to [`ErrorAction::Report`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CodingActions<T> {
    pub malformed: ErrorAction<T>,
    pub unmappable: ErrorAction<T>,
}

/// Error actions of a [`Decoder`](crate::Decoder), substituting UTF-16 code units.
pub type DecoderActions = CodingActions<u16>;

/// Error actions of an [`Encoder`](crate::Encoder), substituting bytes.
pub type EncoderActions = CodingActions<u8>;

impl<T: Copy + Default> CodingActions<T> {
    /// Returns actions that apply `action` to both malformed and unmappable input.
    pub fn both(action: ErrorAction<T>) -> Self {
        Self {
            malformed: action,
            unmappable: action,
        }
    }
}

/// The lifecycle phase of a coding engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoderPhase {
    /// Created or reset; no input processed yet.
    Fresh,
    /// Processing input; more is expected.
    Coding,
    /// The caller signaled the end of input; `flush` is pending.
    Flushing,
    /// `flush` completed.
    Done,
}

impl CoderPhase {
    /// Returns the phase after a coding step, or an error if the step is illegal now.
    pub(crate) fn step(
        self,
        operation: &'static str,
        end_of_input: bool,
    ) -> Result<Self, CodingError> {
        match (self, end_of_input) {
            (Self::Fresh | Self::Coding, false) => Ok(Self::Coding),
            (Self::Fresh | Self::Coding | Self::Flushing, true) => Ok(Self::Flushing),
            (phase, _) => Err(CodingError::IllegalState { operation, phase }),
        }
    }
}

impl fmt::Display for CoderPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Fresh => "fresh",
            Self::Coding => "coding",
            Self::Flushing => "flushing",
            Self::Done => "done",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{CoderPhase, CoderResult, ErrorAction, Substitute, MAX_SUBSTITUTE_LEN};
    use crate::{ByteCursor, CharCursorMut, CodingError};

    #[test]
    fn substitute_bounds() {
        assert!(matches!(
            Substitute::<u8>::new(&[]),
            Err(CodingError::IllegalReplacement(..))
        ));
        assert!(Substitute::new(&[0u8; MAX_SUBSTITUTE_LEN + 1][..]).is_err());
        let s = Substitute::new(&b"??"[..]).unwrap();
        assert_eq!(s.as_slice(), b"??");
        assert_eq!(
            format!("{:?}", ErrorAction::Replace(s)),
            "Replace(Substitute([63, 63]))"
        );
        assert!(ErrorAction::replace_str("\u{1F600}\u{1F600}\u{1F600}\u{1F600}").is_ok());
        assert!(ErrorAction::replace_str("\u{1F600}\u{1F600}\u{1F600}\u{1F600}!").is_err());
    }

    #[test]
    fn result_accessors() {
        assert_eq!(CoderResult::Malformed(3).length(), Some(3));
        assert_eq!(CoderResult::Overflow.length(), None);
        assert!(CoderResult::Unmappable(2).is_error());
        assert!(!CoderResult::Underflow.is_error());
        assert!(CoderResult::Malformed(1).check().is_err());
        assert_eq!(CoderResult::Success.check().unwrap(), CoderResult::Success);
        assert_eq!(CoderResult::Malformed(2).to_string(), "MALFORMED[2]");
    }

    #[test]
    fn apply_actions() {
        let mut storage = [0u16; 1];
        let mut input = ByteCursor::new(&[0xff, 0xfe][..]);
        let mut output = CharCursorMut::new(&mut storage[..]);
        let bad = CoderResult::Malformed(1);

        assert_eq!(
            ErrorAction::Report.apply(bad, &mut input, &mut output),
            Some(bad)
        );
        assert_eq!(input.position(), 0);

        assert_eq!(
            ErrorAction::Ignore.apply(bad, &mut input, &mut output),
            None
        );
        assert_eq!(input.position(), 1);

        let replace = ErrorAction::replace_str("?").unwrap();
        assert_eq!(replace.apply(bad, &mut input, &mut output), None);
        assert_eq!(input.position(), 2);
        assert_eq!(output.written(), &[u16::from(b'?')]);

        let mut input = ByteCursor::new(&[0xff][..]);
        assert_eq!(
            replace.apply(bad, &mut input, &mut output),
            Some(CoderResult::Overflow)
        );
        assert_eq!(input.position(), 0);
    }

    #[test]
    fn phase_transitions() {
        use CoderPhase::*;
        assert_eq!(Fresh.step("decode", false), Ok(Coding));
        assert_eq!(Coding.step("decode", true), Ok(Flushing));
        assert_eq!(Flushing.step("decode", true), Ok(Flushing));
        assert!(Flushing.step("decode", false).is_err());
        assert!(Done.step("decode", true).is_err());
    }
}
