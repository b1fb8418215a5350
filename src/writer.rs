use std::{fmt, io, mem, str};

use super::buffer::BufferedWriter;
use super::charsets::MAX_BYTES_PER_CHAR;
use super::util::MiniBuffer;
use super::{
    ByteCursorMut, CharCursor, CharacterCodingError, CoderResult, CodingError, Encoder,
    MalformedError, UnmappableError, MAX_SUBSTITUTE_LEN,
};

/// The minimum internal buffer size.
const MIN_BUF_SIZE: usize = 32;

/// The room one encoder step needs to make progress: a pending byte order mark followed by a
/// character or a substitute.
const STEP_RESERVE: usize = MAX_BYTES_PER_CHAR + MAX_SUBSTITUTE_LEN;

/// The number of UTF-16 code units handed to the encoder per step.
const UNIT_CHUNK: usize = 256;

/// An [`io::Write`] adapter that encodes the UTF-8 text written into it with an [`Encoder`] and
/// hands the encoded bytes, buffered, to an underlying writer.
///
/// Invalid UTF-8 input is reported as [`MalformedError`]. Characters the encoder reports as
/// unmappable are reported as [`UnmappableError`] carrying the character, unless the encoder's
/// error actions resolve them. Neither error is fatal: writing resumes right after the offending
/// input, and [`passthrough`] lets the caller put its own bytes in place of an unmappable
/// character.
///
/// A call that accepts some input before reaching an error returns `Ok` for all of it, and the
/// error is reported by the next call on this writer, [`flush`] and [`passthrough`] writers
/// included. An error at the very end of the input is therefore only seen by [`flush`] or
/// [`finish`], which should end every stream.
///
/// [`passthrough`]: Self::passthrough
/// [`flush`]: io::Write::flush
/// [`finish`]: Self::finish
///
/// # Examples
///
/// ```rust
/// use std::io::Write as _;
///
/// use charset_coder::{EncodingWriter, KOI8_R};
///
/// let mut writer = EncodingWriter::new(Vec::new(), KOI8_R.new_encoder());
///
/// write!(writer, "Мир")?;
/// writer.write_all("ок".as_bytes())?;
/// writer.flush()?;
/// assert_eq!(writer.writer_ref(), &[0xED, 0xC9, 0xD2, 0xCF, 0xCB]);
/// # Ok::<(), std::io::Error>(())
/// ```
#[derive(Debug)]
pub struct EncodingWriter<W: io::Write> {
    writer: BufferedWriter<W>,
    encoder: Encoder,
    pending: Pending,
}

/// State carried from one call to the next.
#[derive(Debug, Default)]
enum Pending {
    #[default]
    Nothing,
    /// An error found after input the last call already accepted.
    Error(CharacterCodingError),
    /// The leading bytes of a UTF-8 sequence split across `write` calls.
    Fragment(MiniBuffer<4>),
}

impl<W: io::Write> EncodingWriter<W> {
    /// Creates a new encoding writer with an 8 KiB buffer, resetting the encoder.
    pub fn new(writer: W, encoder: Encoder) -> Self {
        Self::with_capacity(8 * 1024, writer, encoder)
    }

    /// Creates a new encoding writer with an internal buffer of at least the specified capacity.
    pub fn with_capacity(capacity: usize, writer: W, mut encoder: Encoder) -> Self {
        encoder.reset();
        Self {
            writer: BufferedWriter::with_capacity(capacity.max(MIN_BUF_SIZE), writer),
            encoder,
            pending: Pending::Nothing,
        }
    }

    /// Returns a reference to the underlying writer, which holds only what has been flushed.
    pub fn writer_ref(&self) -> &W {
        self.writer.get_ref()
    }

    /// Returns a reference to the encoder.
    pub fn encoder_ref(&self) -> &Encoder {
        &self.encoder
    }

    /// Ends the input and takes the writer apart.
    ///
    /// Returns the underlying writer, the encoded bytes still buffered (this method does not
    /// flush), and the error pending at the end of the input, if any. A UTF-8 fragment left by the
    /// last `write` call is reported as [`MalformedError`].
    pub fn finish(mut self) -> (W, Vec<u8>, io::Result<()>) {
        let mut tail = [0u8; MIN_BUF_SIZE];
        let mut output = ByteCursorMut::new(&mut tail[..]);
        let ended = self.end_encoder(&mut output);
        let written = output.position();

        let result = self.take_pending(true).and(ended);
        let (writer, mut buffer) = self.writer.into_parts();
        buffer.extend_from_slice(&tail[..written]);
        (writer, buffer, result)
    }

    fn end_encoder(&mut self, output: &mut ByteCursorMut<'_>) -> io::Result<()> {
        let mut input = CharCursor::new(&[][..]);
        let result = self
            .encoder
            .encode(&mut input, output, true)
            .map_err(coding_error)?;
        if result != CoderResult::Success {
            return Err(broken_contract());
        }
        self.encoder.flush(output).map_err(coding_error)?;
        Ok(())
    }

    /// Writes a string slice, returning how many of its bytes were consumed.
    ///
    /// This is [`write`](io::Write::write) without the UTF-8 validation, and the building block
    /// of a loop that handles [`UnmappableError`] itself (see its documentation). `write!` uses it
    /// under the hood as well.
    pub fn write_str(&mut self, buf: &str) -> io::Result<usize> {
        // a `&str` cannot complete a pending fragment
        self.take_pending(!buf.is_empty())?;
        if buf.is_empty() {
            return Ok(0);
        }
        self.writer.try_reserve(STEP_RESERVE, None)?;
        self.encode_str(buf)
    }

    /// Returns a writer that puts bytes into this writer's buffer as they are, bypassing the
    /// encoder.
    ///
    /// The bytes must already be valid in the destination charset. Pending errors are reported by
    /// the returned writer as by this one.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::io::Write as _;
    ///
    /// use charset_coder::{EncodingWriter, ISO_8859_2};
    ///
    /// let mut writer = EncodingWriter::new(Vec::new(), ISO_8859_2.new_encoder());
    /// // ASCII is a subset of ISO-8859-2
    /// write!(writer.passthrough(), r"\U{:08X}", u32::from('😂'))?;
    /// writer.flush()?;
    /// assert_eq!(writer.writer_ref(), br"\U0001F602");
    /// # Ok::<(), std::io::Error>(())
    /// ```
    pub fn passthrough(&mut self) -> PassthroughWriter<'_, W> {
        PassthroughWriter(self)
    }

    /// Reports the pending error, if any. A pending UTF-8 fragment counts as malformed input only
    /// if `fragment_is_error` is set and stays pending otherwise.
    fn take_pending(&mut self, fragment_is_error: bool) -> io::Result<()> {
        match mem::take(&mut self.pending) {
            Pending::Nothing => Ok(()),
            Pending::Error(e) => Err(e.into()),
            Pending::Fragment(bs) if fragment_is_error => {
                Err(MalformedError::new(bs.len()).wrap())
            }
            fragment => {
                self.pending = fragment;
                Ok(())
            }
        }
    }

    /// Encodes a prefix of `buf` into the internal buffer and returns its length in bytes, which
    /// includes an unmappable character left pending.
    fn encode_str(&mut self, buf: &str) -> io::Result<usize> {
        debug_assert!(!buf.is_empty());
        debug_assert!(matches!(self.pending, Pending::Nothing));

        // whole characters only, so the chunk never ends in half a surrogate pair
        let mut units = [0u16; UNIT_CHUNK];
        let mut len = 0;
        for c in buf.chars() {
            if len + c.len_utf16() > units.len() {
                break;
            }
            len += c.encode_utf16(&mut units[len..]).len();
        }

        let mut input = CharCursor::new(&units[..len]);
        let mut output = ByteCursorMut::new(self.writer.unfilled());
        let result = self
            .encoder
            .encode(&mut input, &mut output, false)
            .map_err(coding_error)?;
        let written = output.position();
        self.writer.advance(written);

        let accepted = utf8_len_of_units(buf, input.position());
        match result {
            CoderResult::Unmappable(n) => match buf[accepted..].chars().next() {
                Some(c) => {
                    let e = UnmappableError::new(n).with_value(c);
                    self.pending = Pending::Error(e.into());
                    Ok(accepted + c.len_utf8())
                }
                None => Err(broken_contract()),
            },
            // valid UTF-16 input is never malformed
            CoderResult::Malformed(_) => Err(broken_contract()),
            _ => {
                debug_assert!(accepted > 0);
                Ok(accepted)
            }
        }
    }

    /// Consumes the invalid or incomplete sequence `buf` starts with, leaving it pending.
    fn hold_invalid_utf8(&mut self, buf: &[u8], error_len: Option<usize>) -> usize {
        if let Some(n) = error_len {
            self.pending = Pending::Error(MalformedError::new(n).into());
            return n;
        }
        let mut fragment = MiniBuffer::default();
        let n = fragment.fill_from_slice(buf);
        debug_assert!(n < 4 && n == buf.len());
        self.pending = Pending::Fragment(fragment);
        n
    }

    /// Appends the leading bytes of `buf` to a pending UTF-8 fragment and encodes the result,
    /// returning the number of bytes of `buf` consumed.
    fn complete_fragment(&mut self, mut fragment: MiniBuffer<4>, buf: &[u8]) -> io::Result<usize> {
        let old_len = fragment.len();
        fragment.fill_from_slice(buf);
        let consumed = match valid_utf8_prefix(fragment.as_ref()) {
            Ok(s) => self.encode_str(s)?,
            // `buf` does not continue the fragment
            Err(Some(n)) if n <= old_len => return Err(MalformedError::new(n).wrap()),
            Err(Some(n)) => {
                self.pending = Pending::Error(MalformedError::new(n).into());
                n
            }
            Err(None) => {
                let n = fragment.len();
                self.pending = Pending::Fragment(fragment);
                n
            }
        };
        debug_assert!(consumed > old_len);
        Ok(consumed.saturating_sub(old_len))
    }
}

impl<W: io::Write> io::Write for EncodingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // the next bytes may complete a pending fragment
        self.take_pending(false)?;
        if buf.is_empty() {
            return Ok(0);
        }
        self.writer.try_reserve(STEP_RESERVE, None)?;

        match mem::take(&mut self.pending) {
            Pending::Fragment(fragment) => self.complete_fragment(fragment, buf),
            // invalid bytes after a valid prefix are left for the next call
            _ => match valid_utf8_prefix(buf) {
                Ok(s) => self.encode_str(s),
                Err(error_len) => Ok(self.hold_invalid_utf8(buf, error_len)),
            },
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        self.take_pending(true)?;
        self.writer.flush()
    }

    fn write_fmt(&mut self, args: fmt::Arguments<'_>) -> io::Result<()> {
        self.take_pending(false)?;
        let mut adapter = FmtAdapter {
            writer: self,
            result: Ok(()),
        };
        match fmt::write(&mut adapter, args) {
            Ok(()) => Ok(()),
            Err(_) => match adapter.result {
                Err(e) => Err(e),
                Ok(()) => Err(io::Error::new(io::ErrorKind::Other, "formatter error")),
            },
        }
    }
}

/// Feeds formatted text to [`EncodingWriter::write_str`], keeping the I/O error that stopped it.
struct FmtAdapter<'a, W: io::Write> {
    writer: &'a mut EncodingWriter<W>,
    result: io::Result<()>,
}

impl<W: io::Write> fmt::Write for FmtAdapter<'_, W> {
    fn write_str(&mut self, mut s: &str) -> fmt::Result {
        while !s.is_empty() {
            let error = match self.writer.write_str(s) {
                Ok(n) if n > 0 && s.is_char_boundary(n) => {
                    s = &s[n..];
                    continue;
                }
                Ok(0) => io::Error::new(io::ErrorKind::WriteZero, "failed to write whole buffer"),
                Ok(_) => broken_contract(),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => e,
            };
            self.result = Err(error);
            return Err(fmt::Error);
        }
        Ok(())
    }
}

/// A writer, returned by [`EncodingWriter::passthrough`], that writes into the encoding writer's
/// buffer without encoding.
#[derive(Debug)]
pub struct PassthroughWriter<'a, W: io::Write>(&'a mut EncodingWriter<W>);

impl<W: io::Write> io::Write for PassthroughWriter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.take_pending(!buf.is_empty())?;
        self.0.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}

/// Returns the longest valid UTF-8 prefix of `v` if it is not empty, or else the `error_len` of
/// the sequence `v` starts with (`None` if it is incomplete).
fn valid_utf8_prefix(v: &[u8]) -> Result<&str, Option<usize>> {
    match str::from_utf8(v) {
        Ok(s) => Ok(s),
        Err(e) if e.valid_up_to() == 0 => Err(e.error_len()),
        // SAFETY: `from_utf8` validated the bytes up to `valid_up_to`
        Err(e) => Ok(unsafe { str::from_utf8_unchecked(&v[..e.valid_up_to()]) }),
    }
}

/// Returns the UTF-8 length of the prefix of `s` that is `units` UTF-16 code units long.
fn utf8_len_of_units(s: &str, units: usize) -> usize {
    let mut counted = 0;
    for (i, c) in s.char_indices() {
        if counted >= units {
            return i;
        }
        counted += c.len_utf16();
    }
    s.len()
}

fn coding_error(e: CodingError) -> io::Error {
    io::Error::new(io::ErrorKind::Other, e)
}

fn broken_contract() -> io::Error {
    debug_assert!(false, "encoder broke contract");
    io::Error::new(io::ErrorKind::Other, "encoder broke contract")
}
