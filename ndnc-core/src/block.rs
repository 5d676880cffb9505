//! Zero-copy view over one TLV element.
//!
//! A [`Block`] never copies the bytes it was decoded from: it keeps a
//! reference-counted handle on the backing buffer plus the offsets of
//! its value range. Child elements are produced lazily by
//! [`Block::elements`] and share the same backing buffer.

use std::sync::Arc;

use crate::tlv::{self, TlvError};

/// An in-memory handle over one TLV element.
#[derive(Debug, Clone)]
pub struct Block {
    buffer: Arc<[u8]>,
    tlv_type: u32,
    // offsets into `buffer`
    start: usize,
    value_start: usize,
    value_end: usize,
}

impl Block {
    /// Parse one TLV element starting at offset 0 of `buffer`.
    ///
    /// Trailing bytes after the element are tolerated; they are simply
    /// outside the block's range.
    pub fn from_buffer(buffer: impl Into<Arc<[u8]>>) -> Result<Self, TlvError> {
        let buffer = buffer.into();
        let limit = buffer.len();
        let (block, _) = Self::decode_at(buffer, 0, limit)?;
        Ok(block)
    }

    /// Build an element from a type and its raw value bytes
    /// (encode path, owns a fresh buffer).
    pub fn from_value(tlv_type: u32, value: &[u8]) -> Self {
        let mut wire =
            Vec::with_capacity(tlv::var_number_size(u64::from(tlv_type)) + 9 + value.len());
        tlv::write_var_number(u64::from(tlv_type), &mut wire);
        tlv::write_var_number(value.len() as u64, &mut wire);
        let value_start = wire.len();
        wire.extend_from_slice(value);
        let value_end = wire.len();
        Self {
            buffer: wire.into(),
            tlv_type,
            start: 0,
            value_start,
            value_end,
        }
    }

    /// Build a parent element whose value is the concatenation of the
    /// given children, encoded bottom-up.
    pub fn from_elements(tlv_type: u32, elements: &[Block]) -> Self {
        let value_len: usize = elements.iter().map(|e| e.size()).sum();
        let mut value = Vec::with_capacity(value_len);
        for element in elements {
            value.extend_from_slice(element.wire());
        }
        Self::from_value(tlv_type, &value)
    }

    /// Parse the element starting at `offset`, reading no further than
    /// `limit`; returns the block and the offset one past its end.
    fn decode_at(buffer: Arc<[u8]>, offset: usize, limit: usize) -> Result<(Self, usize), TlvError> {
        let (raw_type, type_len) = tlv::read_var_number(&buffer[offset..limit])?;
        let tlv_type =
            u32::try_from(raw_type).map_err(|_| TlvError::TypeOutOfRange(raw_type))?;
        let length_offset = offset + type_len;
        let (length, length_len) = tlv::read_var_number(&buffer[length_offset..limit])?;
        let length = usize::try_from(length).map_err(|_| TlvError::LengthOverflow(length))?;

        let value_start = length_offset + length_len;
        let remaining = limit - value_start.min(limit);
        if remaining < length {
            return Err(TlvError::TruncatedValue {
                declared: length,
                remaining,
            });
        }
        let value_end = value_start + length;
        Ok((
            Self {
                buffer,
                tlv_type,
                start: offset,
                value_start,
                value_end,
            },
            value_end,
        ))
    }

    pub fn tlv_type(&self) -> u32 {
        self.tlv_type
    }

    /// The value bytes of this element.
    pub fn value(&self) -> &[u8] {
        &self.buffer[self.value_start..self.value_end]
    }

    /// The full wire bytes of this element (type, length, value).
    pub fn wire(&self) -> &[u8] {
        &self.buffer[self.start..self.value_end]
    }

    /// Total encoded size of this element.
    pub fn size(&self) -> usize {
        self.value_end - self.start
    }

    /// Lazy, restartable iteration over the immediate children. Each
    /// call starts a fresh cursor at the beginning of the value range.
    pub fn elements(&self) -> Elements {
        Elements {
            buffer: Arc::clone(&self.buffer),
            cursor: self.value_start,
            end: self.value_end,
        }
    }

    /// Eagerly decode all immediate children.
    pub fn elements_vec(&self) -> Result<Vec<Block>, TlvError> {
        self.elements().collect()
    }

    /// Explicit deep-copy materialization of the wire bytes.
    pub fn to_vec(&self) -> Vec<u8> {
        self.wire().to_vec()
    }
}

// Two blocks are equal when type and value bytes agree, regardless of
// which buffer backs them or how their headers were spelled.
impl PartialEq for Block {
    fn eq(&self, other: &Self) -> bool {
        self.tlv_type == other.tlv_type && self.value() == other.value()
    }
}

impl Eq for Block {}

/// Cursor over the immediate children of a block.
pub struct Elements {
    buffer: Arc<[u8]>,
    cursor: usize,
    end: usize,
}

impl Iterator for Elements {
    type Item = Result<Block, TlvError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.end {
            return None;
        }
        match Block::decode_at(Arc::clone(&self.buffer), self.cursor, self.end) {
            Ok((block, next)) => {
                self.cursor = next;
                Some(Ok(block))
            }
            Err(e) => {
                self.cursor = self.end;
                Some(Err(e))
            }
        }
    }
}
