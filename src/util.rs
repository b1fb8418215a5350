/// A `Vec`-like struct that handles a tiny stack-allocated byte array.
#[derive(Debug, Clone)]
pub(crate) struct MiniBuffer<const N: usize> {
    len: u8,
    buf: [u8; N],
}

impl<const N: usize> Default for MiniBuffer<N> {
    fn default() -> Self {
        Self {
            len: 0,
            buf: [0; N],
        }
    }
}

impl<const N: usize> AsRef<[u8]> for MiniBuffer<N> {
    fn as_ref(&self) -> &[u8] {
        &self.buf[..self.len()]
    }
}

impl<const N: usize> MiniBuffer<N> {
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn len(&self) -> usize {
        self.len.into()
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Shortens the buffer to `len` bytes, doing nothing if it is already shorter.
    pub fn truncate(&mut self, len: usize) {
        if len < self.len() {
            self.len = len as u8;
        }
    }

    pub fn advance(&mut self, n: usize) {
        debug_assert!(self.len() + n <= N);
        self.len = N.min(self.len() + n) as u8;
    }

    pub fn remove_front(&mut self, count: usize) {
        let len = self.len();
        debug_assert!(count <= len);
        if count < len {
            self.buf.copy_within(count..len, 0);
            self.len -= count as u8;
        } else {
            self.len = 0;
        };
    }

    pub fn unfilled(&mut self) -> &mut [u8] {
        &mut self.buf[self.len.into()..]
    }

    /// Reads bytes from the internal buffer to fill the specified buffer, returning the number of
    /// bytes read.
    pub fn read_to_slice(&mut self, buf: &mut [u8]) -> usize {
        let n = self.len().min(buf.len());
        buf[..n].copy_from_slice(&self.buf[..n]);
        self.remove_front(n);
        n
    }

    /// Writes as many bytes as possible copied from a slice into the spare capacity, returning the
    /// number of bytes consumed.
    pub fn fill_from_slice(&mut self, buf: &[u8]) -> usize {
        let n = self.unfilled().len().min(buf.len());
        self.unfilled()[..n].copy_from_slice(&buf[..n]);
        self.advance(n);
        n
    }
}

/// Writes the UTF-8 form of `units` into the front of `dst`, returning the number of bytes
/// written. `dst` must hold at least three bytes per unit.
///
/// Unpaired surrogates, which the decoders never produce, become U+FFFD.
pub(crate) fn utf16_to_utf8(units: &[u16], dst: &mut [u8]) -> usize {
    debug_assert!(dst.len() >= units.len() * 3);
    let mut written = 0;
    for c in char::decode_utf16(units.iter().copied()) {
        let c = c.unwrap_or(char::REPLACEMENT_CHARACTER);
        written += c.encode_utf8(&mut dst[written..]).len();
    }
    written
}
