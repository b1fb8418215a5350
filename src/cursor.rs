use std::marker::PhantomData;

/// The error returned by [`Cursor`] accessors when a caller requests more units than remain, or
/// tries to move the position or limit outside the storage.
///
/// This is a programming error, never a data error: cursors do not truncate requests silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("requested {requested} units but only {remaining} are available")]
pub struct BoundsError {
    requested: usize,
    remaining: usize,
}

impl BoundsError {
    fn new(requested: usize, remaining: usize) -> Self {
        Self {
            requested,
            remaining,
        }
    }

    /// Returns the number of units requested.
    pub fn requested(&self) -> usize {
        self.requested
    }

    /// Returns the number of units that were available.
    pub fn remaining(&self) -> usize {
        self.remaining
    }
}

/// A view over a caller-owned region of bytes or UTF-16 code units with a position and a limit.
///
/// The cursor does not copy its storage; it only borrows (or owns, if `S` is an owning type)
/// whatever `S` refers to. At all times `0 <= position <= limit <= capacity` holds. Units before
/// the position have been consumed (for an input cursor) or produced (for an output cursor);
/// units between the position and the limit remain available.
///
/// # Examples
///
/// ```rust
/// use charset_coder::{ByteCursor, ByteCursorMut};
///
/// let mut input = ByteCursor::new(&b"abc"[..]);
/// assert_eq!(input.get()?, b'a');
/// assert_eq!(input.remaining(), 2);
///
/// let mut storage = [0u8; 2];
/// let mut output = ByteCursorMut::new(&mut storage[..]);
/// output.put_sequence(input.remaining_slice())?;
/// assert!(output.put(b'd').is_err());
/// assert_eq!(output.written(), b"bc");
/// # Ok::<(), charset_coder::BoundsError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Cursor<T, S> {
    storage: S,
    position: usize,
    limit: usize,
    _unit: PhantomData<fn() -> T>,
}

/// A read cursor over bytes.
pub type ByteCursor<'a> = Cursor<u8, &'a [u8]>;

/// A write cursor over bytes.
pub type ByteCursorMut<'a> = Cursor<u8, &'a mut [u8]>;

/// A read cursor over UTF-16 code units.
pub type CharCursor<'a> = Cursor<u16, &'a [u16]>;

/// A write cursor over UTF-16 code units.
pub type CharCursorMut<'a> = Cursor<u16, &'a mut [u16]>;

impl<T: Copy, S: AsRef<[T]>> Cursor<T, S> {
    /// Creates a cursor positioned at the start of `storage` with the limit at its end.
    pub fn new(storage: S) -> Self {
        let limit = storage.as_ref().len();
        Self {
            storage,
            position: 0,
            limit,
            _unit: PhantomData,
        }
    }

    /// Returns the total number of units in the underlying storage.
    pub fn capacity(&self) -> usize {
        self.storage.as_ref().len()
    }

    /// Returns the index of the next unit to read or write.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Returns the index of the first unit that must not be read or written.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Returns `limit - position`.
    pub fn remaining(&self) -> usize {
        self.limit - self.position
    }

    /// Returns `true` if any units lie between the position and the limit.
    pub fn has_remaining(&self) -> bool {
        self.position < self.limit
    }

    /// Moves the position, which must not exceed the limit.
    pub fn set_position(&mut self, position: usize) -> Result<(), BoundsError> {
        if position > self.limit {
            return Err(BoundsError::new(position, self.limit));
        }
        self.position = position;
        Ok(())
    }

    /// Moves the limit, which must lie between the position and the capacity.
    pub fn set_limit(&mut self, limit: usize) -> Result<(), BoundsError> {
        if limit < self.position || limit > self.capacity() {
            return Err(BoundsError::new(limit, self.capacity()));
        }
        self.limit = limit;
        Ok(())
    }

    /// Returns the units between the position and the limit without consuming them.
    pub fn remaining_slice(&self) -> &[T] {
        &self.storage.as_ref()[self.position..self.limit]
    }

    /// Returns the units before the position.
    pub fn consumed(&self) -> &[T] {
        &self.storage.as_ref()[..self.position]
    }

    /// Reads one unit and advances the position.
    pub fn get(&mut self) -> Result<T, BoundsError> {
        let unit = *self
            .remaining_slice()
            .first()
            .ok_or(BoundsError::new(1, 0))?;
        self.position += 1;
        Ok(unit)
    }

    /// Fills `dst` entirely from the remaining units and advances the position by `dst.len()`.
    pub fn get_sequence(&mut self, dst: &mut [T]) -> Result<(), BoundsError> {
        let src = self.remaining_slice();
        if dst.len() > src.len() {
            return Err(BoundsError::new(dst.len(), src.len()));
        }
        dst.copy_from_slice(&src[..dst.len()]);
        self.position += dst.len();
        Ok(())
    }

    /// Advances the position past `n` units without reading them.
    pub fn skip(&mut self, n: usize) -> Result<(), BoundsError> {
        if n > self.remaining() {
            return Err(BoundsError::new(n, self.remaining()));
        }
        self.position += n;
        Ok(())
    }

    /// Returns the underlying storage.
    pub fn into_inner(self) -> S {
        self.storage
    }

    /// Advances the position by `n` units the caller has already checked to be remaining.
    pub(crate) fn advance(&mut self, n: usize) {
        debug_assert!(n <= self.remaining());
        self.position = self.limit.min(self.position + n);
    }
}

impl<T: Copy, S: AsRef<[T]> + AsMut<[T]>> Cursor<T, S> {
    /// Writes one unit and advances the position.
    pub fn put(&mut self, unit: T) -> Result<(), BoundsError> {
        if !self.has_remaining() {
            return Err(BoundsError::new(1, 0));
        }
        self.storage.as_mut()[self.position] = unit;
        self.position += 1;
        Ok(())
    }

    /// Writes all of `src` and advances the position by `src.len()`.
    pub fn put_sequence(&mut self, src: &[T]) -> Result<(), BoundsError> {
        if src.len() > self.remaining() {
            return Err(BoundsError::new(src.len(), self.remaining()));
        }
        self.push_slice(src);
        Ok(())
    }

    /// Returns the units written so far, i.e. those before the position.
    pub fn written(&self) -> &[T] {
        self.consumed()
    }

    /// Writes `src`, which the caller has already checked to fit.
    pub(crate) fn push_slice(&mut self, src: &[T]) {
        debug_assert!(src.len() <= self.remaining());
        let end = self.limit.min(self.position + src.len());
        let n = end - self.position;
        self.storage.as_mut()[self.position..end].copy_from_slice(&src[..n]);
        self.position = end;
    }
}
