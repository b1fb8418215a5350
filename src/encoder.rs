use super::charsets::{Encoded, EncoderKernel, VariantEncoder, MAX_BYTES_PER_CHAR};
use super::{
    ByteCursorMut, CharCursor, CharacterCodingError, Charset, CoderPhase, CoderResult,
    CodingError, Cursor, EncoderActions, ErrorAction,
};

/// A stateful engine that encodes UTF-16 code units into bytes of one charset.
///
/// The encoder is driven the same way as a [`Decoder`](crate::Decoder), with the cursors
/// swapped. Unpaired surrogates are malformed input; characters the charset cannot represent are
/// unmappable. A high surrogate at the end of the input is left unconsumed until the caller
/// supplies the rest of the input or signals its end.
///
/// # Examples
///
/// ```rust
/// use charset_coder::{ByteCursorMut, CharCursor, CoderResult, EncoderActions, ErrorAction, ISO_8859_1};
///
/// let mut encoder = ISO_8859_1.new_encoder_with(EncoderActions {
///     unmappable: ErrorAction::replace(b"?")?,
///     ..Default::default()
/// })?;
///
/// let src: Vec<u16> = "x\u{1F600}".encode_utf16().collect();
/// let mut storage = [0u8; 4];
/// let mut output = ByteCursorMut::new(&mut storage[..]);
/// let result = encoder.encode(&mut CharCursor::new(&src[..]), &mut output, true)?;
/// assert_eq!(result, CoderResult::Success);
/// assert_eq!(output.written(), b"x?");
/// # Ok::<(), charset_coder::CodingError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Encoder {
    charset: &'static Charset,
    kernel: VariantEncoder,
    actions: EncoderActions,
    phase: CoderPhase,
    unresolved: bool,
}

impl Encoder {
    pub(crate) fn new(charset: &'static Charset) -> Self {
        Self {
            charset,
            kernel: VariantEncoder::new(charset),
            actions: EncoderActions::default(),
            phase: CoderPhase::Fresh,
            unresolved: false,
        }
    }

    /// Returns the charset this encoder encodes into.
    pub fn charset(&self) -> &'static Charset {
        self.charset
    }

    /// Returns the error actions applied by the next step.
    pub fn actions(&self) -> &EncoderActions {
        &self.actions
    }

    /// Returns the lifecycle phase the encoder is in.
    pub fn phase(&self) -> CoderPhase {
        self.phase
    }

    /// Replaces both error actions, effective from the next step.
    ///
    /// Fails with [`CodingError::IllegalReplacement`] if a substitute is not a complete, mappable
    /// byte sequence in this encoder's charset, leaving the current actions unchanged.
    pub fn set_actions(&mut self, actions: EncoderActions) -> Result<(), CodingError> {
        self.check_substitute(&actions.malformed)?;
        self.check_substitute(&actions.unmappable)?;
        self.actions = actions;
        Ok(())
    }

    /// Installs actions whose substitutes are known to be legal.
    pub(crate) fn set_actions_unchecked(&mut self, actions: EncoderActions) {
        self.actions = actions;
    }

    /// Replaces the action for unpaired surrogates, validating its substitute as
    /// [`set_actions`](Self::set_actions) does.
    pub fn set_malformed_action(&mut self, action: ErrorAction<u8>) -> Result<(), CodingError> {
        self.check_substitute(&action)?;
        self.actions.malformed = action;
        Ok(())
    }

    /// Replaces the action for unmappable characters, validating its substitute as
    /// [`set_actions`](Self::set_actions) does.
    pub fn set_unmappable_action(&mut self, action: ErrorAction<u8>) -> Result<(), CodingError> {
        self.check_substitute(&action)?;
        self.actions.unmappable = action;
        Ok(())
    }

    /// Returns the expected number of bytes produced per UTF-16 code unit.
    pub fn average_bytes_per_char(&self) -> f32 {
        self.kernel.average_bytes_per_char()
    }

    /// Returns the largest number of bytes produced per UTF-16 code unit, not counting
    /// substitutes.
    pub fn max_bytes_per_char(&self) -> f32 {
        self.kernel.max_bytes_per_char()
    }

    /// Returns `true` if the charset can represent `c`.
    ///
    /// This is a pure query: it neither consumes a pending byte order mark nor changes the phase.
    pub fn can_encode(&self, c: char) -> bool {
        let mut scratch = [0; MAX_BYTES_PER_CHAR];
        matches!(self.kernel.encode_char(c, &mut scratch), Encoded::Bytes(..))
    }

    /// Returns `true` if the charset can represent every character of `s`.
    pub fn can_encode_str(&self, s: &str) -> bool {
        s.chars().all(|c| self.can_encode(c))
    }

    /// Encodes as many code units as possible from `input` into `output`.
    ///
    /// See [`Decoder::decode`](crate::Decoder::decode) for the meaning of the results, which
    /// apply with code units in place of bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CodingError::IllegalState`] when called after `flush`, or with `end_of_input`
    /// false after a step with `end_of_input` true.
    pub fn encode<I, O>(
        &mut self,
        input: &mut Cursor<u16, I>,
        output: &mut Cursor<u8, O>,
        end_of_input: bool,
    ) -> Result<CoderResult, CodingError>
    where
        I: AsRef<[u16]>,
        O: AsRef<[u8]> + AsMut<[u8]>,
    {
        self.phase = match self.phase.step("encode", end_of_input) {
            Ok(phase) => phase,
            Err(e) => {
                tracing::debug!(charset = %self.charset, error = %e, "rejected encoder call");
                return Err(e);
            }
        };
        let result = self.encode_loop(input, output, end_of_input);
        self.unresolved = result.is_error();
        Ok(result)
    }

    /// Writes any output the charset keeps pending until the end of input, which no supported
    /// charset has, and moves the encoder to [`CoderPhase::Done`].
    ///
    /// # Errors
    ///
    /// Returns [`CodingError::UnresolvedError`] if the last step reported an error, and
    /// [`CodingError::IllegalState`] unless the last step was called with `end_of_input` true.
    pub fn flush<O>(&mut self, _output: &mut Cursor<u8, O>) -> Result<CoderResult, CodingError>
    where
        O: AsRef<[u8]> + AsMut<[u8]>,
    {
        if self.unresolved {
            tracing::debug!(charset = %self.charset, "flush with an unresolved error");
            return Err(CodingError::UnresolvedError);
        }
        if self.phase != CoderPhase::Flushing {
            tracing::debug!(charset = %self.charset, phase = %self.phase, "rejected flush");
            return Err(CodingError::IllegalState {
                operation: "flush",
                phase: self.phase,
            });
        }
        self.phase = CoderPhase::Done;
        Ok(CoderResult::Success)
    }

    /// Discards the coding state, including a pending byte order mark, and returns to
    /// [`CoderPhase::Fresh`], keeping the error actions.
    pub fn reset(&mut self) {
        self.kernel.reset();
        self.phase = CoderPhase::Fresh;
        self.unresolved = false;
    }

    /// Resets the encoder and encodes `src` as a complete stream.
    ///
    /// # Errors
    ///
    /// Returns the first error reported under [`ErrorAction::Report`].
    pub fn encode_all(&mut self, src: &[u16]) -> Result<Vec<u8>, CharacterCodingError> {
        self.reset();
        self.phase = CoderPhase::Flushing;

        let estimate = (src.len() as f32 * self.average_bytes_per_char()) as usize;
        let mut dst = vec![0u8; estimate + MAX_BYTES_PER_CHAR];
        let mut filled = 0;
        let mut input = CharCursor::new(src);
        loop {
            let mut output = ByteCursorMut::new(&mut dst[filled..]);
            let result = self.encode_loop(&mut input, &mut output, true);
            filled += output.position();
            match result.check() {
                Ok(CoderResult::Overflow) => dst.resize(dst.len() * 2, 0),
                Ok(_) => break,
                Err(e) => {
                    self.unresolved = true;
                    return Err(e);
                }
            }
        }

        self.phase = CoderPhase::Done;
        dst.truncate(filled);
        Ok(dst)
    }

    /// Resets the encoder and encodes `s` as a complete stream.
    ///
    /// ```rust
    /// use charset_coder::{CharacterCodingError, WINDOWS_1252};
    ///
    /// let mut encoder = WINDOWS_1252.new_encoder();
    /// assert_eq!(encoder.encode_str("5 €")?, b"5 \x80");
    /// assert!(encoder.encode_str("5 ₽").is_err());
    /// # Ok::<(), CharacterCodingError>(())
    /// ```
    pub fn encode_str(&mut self, s: &str) -> Result<Vec<u8>, CharacterCodingError> {
        let units: Vec<u16> = s.encode_utf16().collect();
        self.encode_all(&units)
    }

    fn encode_loop<I, O>(
        &mut self,
        input: &mut Cursor<u16, I>,
        output: &mut Cursor<u8, O>,
        end_of_input: bool,
    ) -> CoderResult
    where
        I: AsRef<[u16]>,
        O: AsRef<[u8]> + AsMut<[u8]>,
    {
        let mut scratch = [0; MAX_BYTES_PER_CHAR];
        let mut prefix = [0; MAX_BYTES_PER_CHAR];
        loop {
            let src = input.remaining_slice();
            if src.is_empty() {
                return if end_of_input {
                    CoderResult::Success
                } else {
                    CoderResult::Underflow
                };
            }

            let error = match read_scalar(src) {
                Scalar::Truncated if !end_of_input => return CoderResult::Underflow,
                Scalar::Truncated | Scalar::Unpaired => CoderResult::Malformed(1),
                Scalar::Char(c) => match self.kernel.encode_char(c, &mut scratch) {
                    Encoded::Bytes(n) => {
                        let p = self.kernel.pending_prefix(&mut prefix);
                        if output.remaining() < p + n {
                            return CoderResult::Overflow;
                        }
                        output.push_slice(&prefix[..p]);
                        output.push_slice(&scratch[..n]);
                        self.kernel.commit();
                        input.advance(c.len_utf16());
                        continue;
                    }
                    Encoded::Unmappable => CoderResult::Unmappable(c.len_utf16()),
                },
            };

            let action = if error.is_malformed() {
                &self.actions.malformed
            } else {
                &self.actions.unmappable
            };
            if let Some(substitute) = action.substitute() {
                let p = self.kernel.pending_prefix(&mut prefix);
                if p > 0 {
                    if output.remaining() < p + substitute.len() {
                        return CoderResult::Overflow;
                    }
                    output.push_slice(&prefix[..p]);
                    self.kernel.commit();
                }
            }
            if let Some(result) = action.apply(error, input, output) {
                return result;
            }
        }
    }

    /// Accepts a substitute only if a fresh decoder of the same charset decodes it cleanly.
    fn check_substitute(&self, action: &ErrorAction<u8>) -> Result<(), CodingError> {
        match action.substitute() {
            Some(bytes) if self.charset.new_decoder().decode_all(bytes).is_err() => {
                tracing::debug!(charset = %self.charset, ?bytes, "rejected replacement");
                Err(CodingError::IllegalReplacement(
                    "replacement is not a legal sequence in the charset",
                ))
            }
            _ => Ok(()),
        }
    }
}

enum Scalar {
    Char(char),
    /// A high surrogate that ends the input.
    Truncated,
    Unpaired,
}

/// Reads the scalar value at the front of `src`, which is never empty.
fn read_scalar(src: &[u16]) -> Scalar {
    match char::decode_utf16(src.iter().copied()).next() {
        Some(Ok(c)) => Scalar::Char(c),
        Some(Err(e)) if src.len() == 1 && (0xD800..=0xDBFF).contains(&e.unpaired_surrogate()) => {
            Scalar::Truncated
        }
        _ => Scalar::Unpaired,
    }
}
