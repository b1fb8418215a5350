use std::{io, str};

use super::util::{utf16_to_utf8, MiniBuffer};
use super::{
    ByteCursor, CharCursorMut, CharacterCodingError, CoderResult, Decoder, MalformedError,
    UnmappableError, MAX_SUBSTITUTE_LEN,
};

/// The number of UTF-16 code units decoded per step, bounded by the caller's buffer as well.
const UNIT_CHUNK: usize = 2048;

/// The fewest code units a step may write, so that a surrogate pair or a substitute always fits.
const MIN_UNITS: usize = MAX_SUBSTITUTE_LEN;

/// An [`io::Read`] adapter that decodes the bytes of a buffered reader with a [`Decoder`] and
/// yields the text as UTF-8.
///
/// Malformed input is reported as [`MalformedError`] and bytes the charset leaves undefined as
/// [`UnmappableError`], unless the decoder's error actions resolve them. Reading may continue after
/// either error from the byte following the bad sequence; [`lossy`](Self::lossy) does so while
/// substituting U+FFFD. Text decoded before an error is returned first, and the error by the next
/// call.
///
/// A read into a buffer too small for a whole character returns part of its UTF-8 form and the
/// rest in the following reads, so only the output taken as a whole, up to EOF or an error, is
/// guaranteed to be valid UTF-8.
///
/// `Ok(0)` only means that the underlying reader has no more bytes for now. The decoder stays open,
/// and an incomplete sequence at the end of the stream is reported by [`finish`](Self::finish),
/// which ends the input.
///
/// # Examples
///
/// ```rust
/// use std::io::Read as _;
///
/// use charset_coder::{DecodingReader, UTF_16};
///
/// let src: &[u8] = &[255, 254, 61, 216, 2, 222, 61, 216, 123, 220];
/// let mut reader = DecodingReader::new(src, UTF_16.new_decoder());
///
/// let mut dst = String::new();
/// reader.read_to_string(&mut dst)?;
/// assert_eq!(dst, "😂👻");
/// # Ok::<(), std::io::Error>(())
/// ```
#[derive(Debug)]
pub struct DecodingReader<R> {
    reader: R,
    decoder: Decoder,
    /// Bytes of an incomplete sequence taken from the underlying reader, plus any bytes peeked
    /// after them while decoding.
    carry: MiniBuffer<8>,
    /// Decoded text held back for callers whose buffer is too small for a character.
    fallback_buf: MiniBuffer<{ MIN_UNITS * 3 }>,
    /// An error found after text the last call already returned.
    deferred_error: Option<CharacterCodingError>,
}

impl<R: io::BufRead> DecodingReader<R> {
    /// Creates a new decoding reader from a buffered reader and a decoder, resetting the decoder.
    pub fn new(reader: R, mut decoder: Decoder) -> Self {
        decoder.reset();
        Self {
            reader,
            decoder,
            carry: Default::default(),
            fallback_buf: Default::default(),
            deferred_error: None,
        }
    }

    /// Returns the underlying reader, positioned after the bytes decoded or carried so far.
    pub fn reader_ref(&self) -> &R {
        &self.reader
    }

    /// Returns a reference to the decoder.
    pub fn decoder_ref(&self) -> &Decoder {
        &self.decoder
    }

    /// Returns a reader that substitutes U+FFFD for each malformed or unmappable sequence instead
    /// of reporting it.
    ///
    /// ```rust
    /// use std::io::Read as _;
    ///
    /// use charset_coder::{DecodingReader, US_ASCII};
    ///
    /// let mut reader = DecodingReader::new(&b"caf\xe9"[..], US_ASCII.new_decoder());
    /// let mut dst = String::new();
    /// reader.lossy().read_to_string(&mut dst)?;
    /// assert_eq!(dst, "caf\u{FFFD}");
    /// # Ok::<(), std::io::Error>(())
    /// ```
    pub fn lossy(&mut self) -> LossyReader<'_, R> {
        LossyReader(self)
    }

    /// Ends the input and takes the reader apart.
    ///
    /// Returns the underlying reader, the decoded text not read yet, and the first error pending
    /// or found in the carried bytes at the end of the input.
    pub fn finish(mut self) -> (R, Vec<u8>, io::Result<()>) {
        let mut remainder = Vec::from(self.fallback_buf.as_ref());
        let trailing = self.finish_decoder(&mut remainder);
        let result = match self.deferred_error.take() {
            Some(e) => Err(e.into()),
            None => trailing,
        };
        (self.reader, remainder, result)
    }

    /// Decodes the carried bytes as the end of input and flushes the decoder, appending the
    /// output to `remainder` and skipping every reported error but the first.
    fn finish_decoder(&mut self, remainder: &mut Vec<u8>) -> io::Result<()> {
        let mut units = vec![0u16; (self.carry.len() + 1) * MAX_SUBSTITUTE_LEN];
        let mut input = ByteCursor::new(self.carry.as_ref());
        let mut output = CharCursorMut::new(&mut units[..]);
        let mut first_error = None;
        loop {
            let result = self
                .decoder
                .decode(&mut input, &mut output, true)
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
            match result.check() {
                Ok(CoderResult::Success) => break,
                Ok(_) => {
                    debug_assert!(false, "unreachable");
                    return Err(io::Error::new(
                        io::ErrorKind::Other,
                        "failed to finish decoder unexpectedly",
                    ));
                }
                Err(e) => {
                    input.skip(e.length()).map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
                    first_error.get_or_insert(e);
                }
            }
        }
        self.decoder
            .flush(&mut output)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

        let written = output.written();
        let start = remainder.len();
        remainder.resize(start + written.len() * 3, 0);
        let n = utf16_to_utf8(written, &mut remainder[start..]);
        remainder.truncate(start + n);
        first_error.map_or(Ok(()), |e| Err(e.into()))
    }

    fn read_inner(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        debug_assert!(!buf.is_empty());
        debug_assert!(self.fallback_buf.is_empty());
        debug_assert!(self.deferred_error.is_none());

        let mut units = [0u16; UNIT_CHUNK];
        // use fallback buffer if `buf` may be too small to hold the decoded characters
        let direct = buf.len() >= MIN_UNITS * 3;
        let limit = if direct {
            (buf.len() / 3).min(UNIT_CHUNK)
        } else {
            MIN_UNITS
        };

        let produced = loop {
            match self.decode_step(&mut units[..limit])? {
                None => return Ok(0),
                // skipped a byte order mark, an ignored sequence or an incomplete tail
                Some(0) if self.deferred_error.is_none() => continue,
                Some(n) => break n,
            }
        };

        let written = if direct {
            utf16_to_utf8(&units[..produced], buf)
        } else {
            let n = utf16_to_utf8(&units[..produced], self.fallback_buf.unfilled());
            self.fallback_buf.advance(n);
            self.fallback_buf.read_to_slice(buf)
        };

        debug_assert!(self.is_valid_utf8_so_far(&buf[..written]));
        Ok(written)
    }

    /// Decodes the next bytes available from the underlying reader into `dst`, returning the
    /// number of code units written, or `None` at EOF. A reported error is skipped in the input
    /// and stored in `self.deferred_error`.
    fn decode_step(&mut self, dst: &mut [u16]) -> io::Result<Option<usize>> {
        let mut output = CharCursorMut::new(dst);
        let coding_error = |e| io::Error::new(io::ErrorKind::Other, e);

        if self.carry.is_empty() {
            let src = self.reader.fill_buf()?;
            if src.is_empty() {
                return Ok(None);
            }
            let mut input = ByteCursor::new(src);
            let result = self
                .decoder
                .decode(&mut input, &mut output, false)
                .map_err(coding_error)?;
            if let Some(n) = result.length() {
                input.advance(n);
            } else if result.is_underflow() {
                // carry the incomplete tail so the reader can be consumed past it
                let tail = self.carry.fill_from_slice(input.remaining_slice());
                tracing::trace!(bytes = tail, "carrying an incomplete sequence");
                input.advance(tail);
            }
            let consumed = input.position();
            self.reader.consume(consumed);
            self.defer(result);
            return Ok(Some(output.position()));
        }

        // decode the carried bytes followed by as many fresh bytes as fit
        let old_len = self.carry.len();
        let took = self.carry.fill_from_slice(self.reader.fill_buf()?);
        let mut input = ByteCursor::new(self.carry.as_ref());
        let result = self
            .decoder
            .decode(&mut input, &mut output, false)
            .map_err(coding_error)?;
        if let Some(n) = result.length() {
            input.advance(n);
        }
        let consumed = input.position();

        if result.is_underflow() && took == 0 && consumed == 0 {
            // EOF in the middle of a character; `finish` reports it
            self.carry.truncate(old_len);
            return Ok(None);
        }
        if consumed >= old_len {
            self.reader.consume(consumed - old_len);
            self.carry.clear();
        } else if result.is_underflow() {
            self.reader.consume(took);
            self.carry.remove_front(consumed);
        } else {
            self.carry.truncate(old_len);
            self.carry.remove_front(consumed);
        }
        self.defer(result);
        Ok(Some(output.position()))
    }

    fn defer(&mut self, result: CoderResult) {
        if let Err(e) = result.check() {
            self.deferred_error = Some(e);
        }
    }

    /// Checks that `written`, followed by the text held back in the fallback buffer, is valid
    /// UTF-8.
    fn is_valid_utf8_so_far(&self, written: &[u8]) -> bool {
        let held = self.fallback_buf.as_ref();
        if held.is_empty() {
            str::from_utf8(written).is_ok()
        } else {
            str::from_utf8(&[written, held].concat()).is_ok()
        }
    }
}

impl<R: io::BufRead> io::Read for DecodingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        // held-back text goes first, then a deferred error
        if !self.fallback_buf.is_empty() {
            return Ok(self.fallback_buf.read_to_slice(buf));
        }
        if let Some(e) = self.deferred_error.take() {
            return Err(e.into());
        }
        match self.read_inner(buf)? {
            0 => self.deferred_error.take().map_or(Ok(0), |e| Err(e.into())),
            n => Ok(n),
        }
    }
}

/// A reader, returned by [`DecodingReader::lossy`], that turns each reported error into U+FFFD.
#[derive(Debug)]
pub struct LossyReader<'a, R>(&'a mut DecodingReader<R>);

impl<R: io::BufRead> io::Read for LossyReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let e = match self.0.read(buf) {
            Err(e) => e,
            ret => return ret,
        };
        if MalformedError::wrapped_in(&e).is_none() && UnmappableError::wrapped_in(&e).is_none() {
            return Err(e);
        }
        // errors are reported only once the fallback buffer is drained
        self.0.fallback_buf.fill_from_slice("\u{FFFD}".as_bytes());
        Ok(self.0.fallback_buf.read_to_slice(buf))
    }
}
