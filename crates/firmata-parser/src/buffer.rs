use tracing::warn;

use crate::error::{ParserError, Result};
use crate::registry::OverflowHandler;

/// A caller-owned, fixed-capacity data buffer borrowed by the parser.
///
/// Every write is checked against capacity before it is committed. The
/// parser never copies or reallocates the underlying slice.
#[derive(Debug, Default)]
pub struct DataBuffer<'a> {
    slot: Option<&'a mut [u8]>,
}

impl<'a> DataBuffer<'a> {
    /// A buffer slot with nothing bound. Capacity is zero.
    pub fn unassigned() -> Self {
        Self { slot: None }
    }

    /// Bind an existing slice.
    pub fn new(buffer: &'a mut [u8]) -> Self {
        Self { slot: Some(buffer) }
    }

    /// Total number of bytes the bound slice can hold.
    pub fn capacity(&self) -> usize {
        self.slot.as_deref().map_or(0, <[u8]>::len)
    }

    /// Returns true if a slice is bound.
    pub fn is_assigned(&self) -> bool {
        self.slot.is_some()
    }

    /// Bind a slice. Only permitted while nothing is bound.
    pub fn assign(&mut self, buffer: &'a mut [u8]) -> Result<()> {
        if self.slot.is_some() {
            return Err(ParserError::InvalidBufferAssignment {
                reason: "a buffer is already assigned",
            });
        }
        self.replace(buffer)
    }

    /// Bind a slice regardless of what is currently bound.
    fn replace(&mut self, buffer: &'a mut [u8]) -> Result<()> {
        if buffer.is_empty() {
            return Err(ParserError::InvalidBufferAssignment {
                reason: "buffer has zero capacity",
            });
        }
        self.slot = Some(buffer);
        Ok(())
    }

    /// Read-only view of the whole bound slice.
    pub fn as_slice(&self) -> &[u8] {
        self.slot.as_deref().unwrap_or_default()
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [u8] {
        self.slot.as_deref_mut().unwrap_or_default()
    }

    /// Write `byte` at `position`.
    ///
    /// On overflow the handler (if any) gets one chance to bind a larger
    /// buffer; capacity is re-checked afterwards. Returns `true` if the
    /// byte could not be written.
    pub fn write(
        &mut self,
        byte: u8,
        position: usize,
        overflow: Option<&mut (dyn OverflowHandler<'a> + 'a)>,
    ) -> bool {
        let mut overflowed = position >= self.capacity();

        if overflowed {
            if let Some(handler) = overflow {
                let mut grant = BufferGrant {
                    buffer: self,
                    position,
                };
                handler.on_overflow(&mut grant);
                overflowed = position >= self.capacity();
            }
        }

        if overflowed {
            warn!(
                position,
                capacity = self.capacity(),
                "data buffer overflow, byte dropped"
            );
            return true;
        }

        self.as_mut_slice()[position] = byte;
        false
    }

    /// Zero every byte up to capacity.
    pub fn zero(&mut self) {
        self.as_mut_slice().fill(0);
    }
}

/// Temporary permission to rebind the parser's buffer.
///
/// Only handed to an overflow handler while it runs.
#[derive(Debug)]
pub struct BufferGrant<'g, 'a> {
    buffer: &'g mut DataBuffer<'a>,
    position: usize,
}

impl<'a> BufferGrant<'_, 'a> {
    /// The write position that did not fit.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Capacity of the currently bound buffer.
    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// Contents of the currently bound buffer.
    pub fn contents(&self) -> &[u8] {
        self.buffer.as_slice()
    }

    /// Replace the bound buffer. The previous buffer's contents are not
    /// carried over.
    pub fn assign(&mut self, buffer: &'a mut [u8]) -> Result<()> {
        self.buffer.replace(buffer)
    }

    /// Copy the current contents into `buffer`, then bind it.
    pub fn grow_into(&mut self, buffer: &'a mut [u8]) -> Result<()> {
        let current = self.buffer.as_slice();
        let len = current.len().min(buffer.len());
        buffer[..len].copy_from_slice(&current[..len]);
        self.assign(buffer)
    }
}
