//! Fail-closed reader over response bytes
//!
//! Every read either returns the requested bytes and advances, or returns
//! `None` and leaves the position untouched. Nothing here can panic.

/// Cursor over a byte slice
#[derive(Debug, Clone, Copy)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> ByteCursor<'a> {
    /// Create a cursor at the start of `data`
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Current offset from the start
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Bytes left to read
    pub const fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Whether every byte has been consumed
    pub const fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Unread bytes, without consuming them
    pub fn rest(&self) -> &'a [u8] {
        self.data.get(self.position..).unwrap_or_default()
    }

    /// Look at the next byte without consuming it
    pub fn peek(&self) -> Option<u8> {
        self.data.get(self.position).copied()
    }

    /// Read one byte
    pub fn read_u8(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.position += 1;
        Some(byte)
    }

    /// Read `len` bytes
    pub fn take(&mut self, len: usize) -> Option<&'a [u8]> {
        let end = self.position.checked_add(len)?;
        let slice = self.data.get(self.position..end)?;
        self.position = end;
        Some(slice)
    }

    /// Read a fixed size array
    pub fn take_array<const N: usize>(&mut self) -> Option<[u8; N]> {
        self.take(N)?.try_into().ok()
    }

    /// Skip `len` bytes
    pub fn skip(&mut self, len: usize) -> Option<()> {
        self.take(len).map(|_| ())
    }

    /// Consume `tag` if the next bytes match it
    pub fn expect_tag(&mut self, tag: &[u8]) -> Option<()> {
        let end = self.position.checked_add(tag.len())?;
        if self.data.get(self.position..end)? != tag {
            return None;
        }
        self.position = end;
        Some(())
    }

    /// Read a one byte length followed by that many bytes
    pub fn take_length_prefixed(&mut self) -> Option<&'a [u8]> {
        let start = self.position;
        let len = self.read_u8()?;
        self.take(usize::from(len)).or_else(|| {
            self.position = start;
            None
        })
    }

    /// Read a `tag | length | value` field and return the value
    ///
    /// The position is restored when the tag differs or the value is
    /// truncated.
    pub fn read_tlv(&mut self, tag: &[u8]) -> Option<&'a [u8]> {
        let start = self.position;
        let value = self
            .expect_tag(tag)
            .and_then(|()| self.take_length_prefixed());
        if value.is_none() {
            self.position = start;
        }
        value
    }

    /// Read a `tag | length` header and return a cursor limited to the value
    pub fn enter_tlv(&mut self, tag: &[u8]) -> Option<ByteCursor<'a>> {
        self.read_tlv(tag).map(ByteCursor::new)
    }
}
