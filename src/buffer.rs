use std::{io, mem, ptr};

/// A [`BufWriter`](io::BufWriter)-like type that exposes its unfilled capacity as a slice so the
/// encoder can write into it directly.
#[derive(Debug)]
pub(crate) struct BufferedWriter<W: io::Write> {
    buffer: Box<[u8]>,
    filled: usize,
    panicked: bool,
    inner: W,
}

impl<W: io::Write> BufferedWriter<W> {
    pub fn with_capacity(capacity: usize, inner: W) -> Self {
        Self {
            buffer: vec![0; capacity].into_boxed_slice(),
            filled: 0,
            panicked: false,
            inner,
        }
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Returns the unfilled buffer capacity as a slice.
    ///
    /// The caller must [`advance`](Self::advance) the cursor after writing data into the returned
    /// buffer.
    pub fn unfilled(&mut self) -> &mut [u8] {
        &mut self.buffer[self.filled..]
    }

    /// Marks the first `n` bytes of the unfilled buffer as filled.
    pub fn advance(&mut self, n: usize) {
        debug_assert!(self.filled + n <= self.buffer.len());
        self.filled = self.buffer.len().min(self.filled + n);
    }

    /// Tries to make room for at least `minimum` more bytes, flushing the buffered data if the
    /// unfilled capacity is smaller than `size_hint` (or `minimum`).
    pub fn try_reserve(&mut self, minimum: usize, size_hint: Option<usize>) -> io::Result<()> {
        if self.unfilled().len() < size_hint.map_or(minimum, |n| n.max(minimum)) {
            self.flush_buffer()?;
            if self.unfilled().len() < minimum {
                return Err(io::Error::new(
                    io::ErrorKind::Other,
                    "failed to reserve minimum buffer capacity",
                ));
            }
        }
        Ok(())
    }

    /// Disassembles the writer into the underlying writer and the data not yet written to it,
    /// without flushing.
    pub fn into_parts(self) -> (W, Vec<u8>) {
        let mut m = mem::ManuallyDrop::new(self);
        let buffer = m.buffer[..m.filled].to_vec();
        drop(mem::take(&mut m.buffer));
        // SAFETY: `m` is never dropped, so `inner` is moved out exactly once
        let inner = unsafe { ptr::read(&m.inner) };
        (inner, buffer)
    }

    /// Writes the buffered data into the underlying writer.
    fn flush_buffer(&mut self) -> io::Result<()> {
        // A guard struct to make sure to remove consumed bytes from the buffer when dropped.
        struct PanicGuard<'a> {
            consumed: usize,
            filled: &'a mut usize,
            buffer: &'a mut [u8],
        }

        impl Drop for PanicGuard<'_> {
            fn drop(&mut self) {
                if self.consumed < *self.filled {
                    self.buffer.copy_within(self.consumed..*self.filled, 0);
                    *self.filled -= self.consumed;
                } else {
                    *self.filled = 0;
                }
            }
        }

        let mut g = PanicGuard {
            consumed: 0,
            filled: &mut self.filled,
            buffer: &mut self.buffer,
        };

        while g.consumed < *g.filled {
            self.panicked = true;
            let ret = self.inner.write(&g.buffer[g.consumed..*g.filled]);
            self.panicked = false;

            match ret {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "failed to write buffered data to writer",
                    ));
                }
                Ok(n) => g.consumed += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }

        Ok(())
    }
}

impl<W: io::Write> Drop for BufferedWriter<W> {
    fn drop(&mut self) {
        // don't double-flush the buffer when the inner writer panicked in a call to write
        if !self.panicked {
            let _ = self.flush_buffer();
        }
    }
}

impl<W: io::Write> io::Write for BufferedWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.try_reserve(1, Some(buf.len()))?;
        let capacity = self.unfilled().len();
        if buf.len() > capacity && self.filled == 0 {
            // bypass the internal buffer if the input buffer is large
            self.panicked = true;
            let ret = self.inner.write(buf);
            self.panicked = false;
            ret
        } else {
            let n = buf.len().min(capacity);
            self.unfilled()[..n].copy_from_slice(&buf[..n]);
            self.advance(n);
            Ok(n)
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flush_buffer()?;
        self.inner.flush()
    }
}
