use super::charsets::{Decoded, DecoderKernel, VariantDecoder};
use super::{
    ByteCursor, CharCursorMut, CharacterCodingError, Charset, CoderPhase, CoderResult,
    CodingError, Cursor, DecoderActions, ErrorAction,
};

/// A stateful engine that decodes bytes of one charset into UTF-16 code units.
///
/// The caller drives the decoder by repeatedly supplying an input and an output [`Cursor`] to
/// [`decode`](Self::decode), reacting to the returned [`CoderResult`]: supply more input on
/// `Underflow`, drain or enlarge the output on `Overflow`, and deal with `Malformed` or
/// `Unmappable` when the corresponding [`ErrorAction`] is `Report`. After the last step, called
/// with `end_of_input` set, [`flush`](Self::flush) completes the stream.
///
/// The decoder never keeps a reference to the caller's buffers between calls. A trailing
/// incomplete sequence is left unconsumed in the input cursor so the caller can supply it again,
/// followed by more bytes, in the next step.
///
/// # Examples
///
/// ```rust
/// use charset_coder::{ByteCursor, CharCursorMut, CoderResult, UTF_8};
///
/// let mut decoder = UTF_8.new_decoder();
/// let mut storage = [0u16; 8];
/// let mut output = CharCursorMut::new(&mut storage[..]);
///
/// // "é" split across two steps
/// let mut input = ByteCursor::new(&[b'a', 0xC3][..]);
/// assert_eq!(decoder.decode(&mut input, &mut output, false)?, CoderResult::Underflow);
/// assert_eq!(input.remaining_slice(), &[0xC3]);
///
/// let mut input = ByteCursor::new(&[0xC3, 0xA9][..]);
/// assert_eq!(decoder.decode(&mut input, &mut output, true)?, CoderResult::Success);
/// assert_eq!(decoder.flush(&mut output)?, CoderResult::Success);
/// assert_eq!(output.written(), &[0x61, 0xE9]);
/// # Ok::<(), charset_coder::CodingError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Decoder {
    charset: &'static Charset,
    kernel: VariantDecoder,
    actions: DecoderActions,
    phase: CoderPhase,
    /// Set while the last step returned a reported error.
    unresolved: bool,
}

impl Decoder {
    pub(crate) fn new(charset: &'static Charset) -> Self {
        Self {
            charset,
            kernel: VariantDecoder::new(charset),
            actions: DecoderActions::default(),
            phase: CoderPhase::Fresh,
            unresolved: false,
        }
    }

    /// Returns the charset this decoder decodes.
    pub fn charset(&self) -> &'static Charset {
        self.charset
    }

    /// Returns the error actions applied by the next step.
    pub fn actions(&self) -> &DecoderActions {
        &self.actions
    }

    /// Returns the lifecycle phase the decoder is in.
    pub fn phase(&self) -> CoderPhase {
        self.phase
    }

    /// Replaces both error actions, effective from the next step.
    ///
    /// Fails with [`CodingError::IllegalReplacement`] if a substitute is not well-formed UTF-16,
    /// leaving the current actions unchanged.
    pub fn set_actions(&mut self, actions: DecoderActions) -> Result<(), CodingError> {
        check_substitute(&actions.malformed)?;
        check_substitute(&actions.unmappable)?;
        self.actions = actions;
        Ok(())
    }

    /// Installs actions whose substitutes are known to be legal.
    pub(crate) fn set_actions_unchecked(&mut self, actions: DecoderActions) {
        self.actions = actions;
    }

    /// Replaces the action for malformed input, validating its substitute as
    /// [`set_actions`](Self::set_actions) does.
    pub fn set_malformed_action(&mut self, action: ErrorAction<u16>) -> Result<(), CodingError> {
        check_substitute(&action)?;
        self.actions.malformed = action;
        Ok(())
    }

    /// Replaces the action for unmappable input, validating its substitute as
    /// [`set_actions`](Self::set_actions) does.
    pub fn set_unmappable_action(&mut self, action: ErrorAction<u16>) -> Result<(), CodingError> {
        check_substitute(&action)?;
        self.actions.unmappable = action;
        Ok(())
    }

    /// Returns the expected number of UTF-16 code units produced per input byte.
    pub fn average_chars_per_byte(&self) -> f32 {
        self.kernel.average_chars_per_byte()
    }

    /// Returns the largest number of UTF-16 code units produced per input byte, not counting
    /// substitutes.
    pub fn max_chars_per_byte(&self) -> f32 {
        self.kernel.max_chars_per_byte()
    }

    /// Decodes as many bytes as possible from `input` into `output`.
    ///
    /// Returns `Underflow` when the input is exhausted, or ends in an incomplete sequence, and
    /// `end_of_input` is false; `Success` when the input is exhausted and `end_of_input` is true;
    /// `Overflow` when `output` has no room for the next character or substitute. A trailing
    /// incomplete sequence at the end of input is malformed.
    ///
    /// Under [`ErrorAction::Report`], `Malformed` and `Unmappable` leave `input` positioned at the
    /// start of the bad sequence, whose length the result carries. The caller may
    /// [`skip`](Cursor::skip) it and call again.
    ///
    /// # Errors
    ///
    /// Returns [`CodingError::IllegalState`] when called after `flush`, or with `end_of_input`
    /// false after a step with `end_of_input` true.
    pub fn decode<I, O>(
        &mut self,
        input: &mut Cursor<u8, I>,
        output: &mut Cursor<u16, O>,
        end_of_input: bool,
    ) -> Result<CoderResult, CodingError>
    where
        I: AsRef<[u8]>,
        O: AsRef<[u16]> + AsMut<[u16]>,
    {
        self.phase = match self.phase.step("decode", end_of_input) {
            Ok(phase) => phase,
            Err(e) => {
                tracing::debug!(charset = %self.charset, error = %e, "rejected decoder call");
                return Err(e);
            }
        };
        let result = self.decode_loop(input, output, end_of_input);
        self.unresolved = result.is_error();
        Ok(result)
    }

    /// Writes any output the charset keeps pending until the end of input.
    ///
    /// No supported charset holds such output, so this only completes the lifecycle, moving the
    /// decoder to [`CoderPhase::Done`].
    ///
    /// # Errors
    ///
    /// Returns [`CodingError::UnresolvedError`] if the last step reported an error, and
    /// [`CodingError::IllegalState`] unless the last step was called with `end_of_input` true.
    pub fn flush<O>(&mut self, _output: &mut Cursor<u16, O>) -> Result<CoderResult, CodingError>
    where
        O: AsRef<[u16]> + AsMut<[u16]>,
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

    /// Discards the coding state and returns to [`CoderPhase::Fresh`], keeping the error actions.
    pub fn reset(&mut self) {
        self.kernel.reset();
        self.phase = CoderPhase::Fresh;
        self.unresolved = false;
    }

    /// Resets the decoder and decodes `src` as a complete stream.
    ///
    /// # Errors
    ///
    /// Returns the first error reported under [`ErrorAction::Report`]. The decoder is left in
    /// [`CoderPhase::Flushing`] in that case; [`reset`](Self::reset) it before reuse.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use charset_coder::{CharacterCodingError, KOI8_R};
    ///
    /// let mut decoder = KOI8_R.new_decoder();
    /// let units = decoder.decode_all(&[0xF0, 0xD2, 0xC9, 0xD7, 0xC5, 0xD4])?;
    /// assert_eq!(String::from_utf16_lossy(&units), "Привет");
    /// # Ok::<(), CharacterCodingError>(())
    /// ```
    pub fn decode_all(&mut self, src: &[u8]) -> Result<Vec<u16>, CharacterCodingError> {
        self.reset();
        self.phase = CoderPhase::Flushing;

        let estimate = (src.len() as f32 * self.average_chars_per_byte()) as usize;
        let mut dst = vec![0u16; estimate + 2];
        let mut filled = 0;
        let mut input = ByteCursor::new(src);
        loop {
            let mut output = CharCursorMut::new(&mut dst[filled..]);
            let result = self.decode_loop(&mut input, &mut output, true);
            filled += output.position();
            match result.check() {
                Ok(CoderResult::Overflow) => dst.resize(dst.len() * 2 + 2, 0),
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

    fn decode_loop<I, O>(
        &mut self,
        input: &mut Cursor<u8, I>,
        output: &mut Cursor<u16, O>,
        end_of_input: bool,
    ) -> CoderResult
    where
        I: AsRef<[u8]>,
        O: AsRef<[u16]> + AsMut<[u16]>,
    {
        loop {
            let src = input.remaining_slice();
            if src.is_empty() {
                return if end_of_input {
                    CoderResult::Success
                } else {
                    CoderResult::Underflow
                };
            }

            let error = match self.kernel.decode_char(src) {
                Decoded::Char(c, n) => {
                    let mut buf = [0u16; 2];
                    let units = c.encode_utf16(&mut buf);
                    if output.remaining() < units.len() {
                        return CoderResult::Overflow;
                    }
                    output.push_slice(units);
                    self.kernel.commit(&src[..n]);
                    input.advance(n);
                    continue;
                }
                Decoded::Skip(n) => {
                    self.kernel.commit(&src[..n]);
                    input.advance(n);
                    continue;
                }
                Decoded::Incomplete if end_of_input => CoderResult::Malformed(src.len()),
                Decoded::Incomplete => return CoderResult::Underflow,
                Decoded::Malformed(n) => CoderResult::Malformed(n),
                Decoded::Unmappable(n) => CoderResult::Unmappable(n),
            };
            self.kernel.reject();

            let action = if error.is_malformed() {
                &self.actions.malformed
            } else {
                &self.actions.unmappable
            };
            if let Some(result) = action.apply(error, input, output) {
                return result;
            }
        }
    }
}

fn check_substitute(action: &ErrorAction<u16>) -> Result<(), CodingError> {
    match action.substitute() {
        Some(units) if char::decode_utf16(units.iter().copied()).any(|c| c.is_err()) => Err(
            CodingError::IllegalReplacement("replacement is not well-formed UTF-16"),
        ),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::super::{
        ByteCursor, CharCursorMut, CoderPhase, CoderResult, CodingError, DecoderActions,
        ErrorAction, ISO_8859_7, UTF_16, UTF_8,
    };

    #[test]
    fn reported_error_blocks_flush() {
        let mut decoder = UTF_8.new_decoder();
        let mut storage = [0u16; 4];
        let mut output = CharCursorMut::new(&mut storage[..]);
        let mut input = ByteCursor::new(&[b'a', 0xFF, b'b'][..]);

        let result = decoder.decode(&mut input, &mut output, true).unwrap();
        assert_eq!(result, CoderResult::Malformed(1));
        assert_eq!(input.position(), 1);
        assert_eq!(decoder.flush(&mut output), Err(CodingError::UnresolvedError));

        input.skip(1).unwrap();
        let result = decoder.decode(&mut input, &mut output, true).unwrap();
        assert_eq!(result, CoderResult::Success);
        assert_eq!(decoder.flush(&mut output), Ok(CoderResult::Success));
        assert_eq!(decoder.phase(), CoderPhase::Done);
        assert_eq!(output.written(), &[0x61, 0x62]);
    }

    #[test]
    fn table_holes_are_unmappable() {
        let mut decoder = ISO_8859_7.new_decoder();
        assert!(matches!(
            decoder.decode_all(&[0xE1, 0xD2]),
            Err(e) if e.length() == 1
        ));

        decoder
            .set_unmappable_action(ErrorAction::replace_str("?").unwrap())
            .unwrap();
        assert_eq!(
            decoder.decode_all(&[0xE1, 0xD2]).unwrap(),
            &[0x03B1, u16::from(b'?')]
        );
    }

    #[test]
    fn ill_formed_substitutes_are_rejected() {
        let mut decoder = UTF_8.new_decoder();
        let lone = ErrorAction::replace(&[0xD800u16][..]).unwrap();
        assert!(matches!(
            decoder.set_malformed_action(lone),
            Err(CodingError::IllegalReplacement(..))
        ));
        assert!(decoder
            .set_actions(DecoderActions {
                malformed: ErrorAction::Ignore,
                unmappable: lone,
            })
            .is_err());
        assert_eq!(decoder.actions(), &DecoderActions::default());

        let pair = ErrorAction::replace(&[0xD83Du16, 0xDE00][..]).unwrap();
        assert!(decoder.set_malformed_action(pair).is_ok());
    }

    #[test]
    fn byte_order_mark_only_at_stream_start() {
        let src = [0xDC, 0x00, 0xFF, 0xFE, 0x00, 0x41];
        let mut decoder = UTF_16
            .new_decoder_with(DecoderActions::both(ErrorAction::Ignore))
            .unwrap();
        assert_eq!(decoder.decode_all(&src).unwrap(), &[0xFFFE, 0x41]);

        // reported, then skipped by the caller
        let mut decoder = UTF_16.new_decoder();
        let mut storage = [0u16; 4];
        let mut output = CharCursorMut::new(&mut storage[..]);
        let mut input = ByteCursor::new(&src[..]);
        let result = decoder.decode(&mut input, &mut output, true).unwrap();
        assert_eq!(result, CoderResult::Malformed(2));
        input.skip(2).unwrap();
        let result = decoder.decode(&mut input, &mut output, true).unwrap();
        assert_eq!(result, CoderResult::Success);
        assert_eq!(output.written(), &[0xFFFE, 0x41]);
    }

    #[test]
    fn reset_restores_byte_order_detection() {
        let mut decoder = UTF_16.new_decoder();
        assert_eq!(
            decoder.decode_all(&[0xFF, 0xFE, 0x41, 0x00]).unwrap(),
            &[0x41]
        );
        assert_eq!(
            decoder.decode_all(&[0xFE, 0xFF, 0x00, 0x42]).unwrap(),
            &[0x42]
        );
        assert_eq!(decoder.decode_all(&[0x00, 0x43]).unwrap(), &[0x43]);
    }
}
