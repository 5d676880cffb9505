//! Cutting a byte stream into whole TLV elements.
//!
//! TLV elements are self-delimiting, so stream framing needs no extra
//! length prefix: accumulate bytes until the declared element size is
//! available, then hand the element out.

use ndnc_core::tlv::read_var_number;

/// Upper bound on one NDN packet on the wire.
pub const MAX_ELEMENT_SIZE: usize = 8800;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FramingError {
    #[error("received element of {0} bytes exceeds the {MAX_ELEMENT_SIZE}-byte limit")]
    ElementTooLarge(u64),
}

/// Reassembles TLV elements from arbitrarily chunked stream reads.
#[derive(Debug, Default)]
pub struct ElementFramer {
    buf: Vec<u8>,
}

impl ElementFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes read from the stream.
    pub fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Bytes buffered but not yet returned as elements.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Take the next complete element off the front of the buffer, or
    /// `None` when more bytes are needed.
    pub fn next_element(&mut self) -> Result<Option<Vec<u8>>, FramingError> {
        // an incomplete header only means the rest is still in flight
        let Ok((_, type_len)) = read_var_number(&self.buf) else {
            return Ok(None);
        };
        let Ok((length, length_len)) = read_var_number(&self.buf[type_len..]) else {
            return Ok(None);
        };
        // size up in u64 before narrowing so a huge declared length
        // cannot wrap around the limit check on 32-bit targets
        let total = type_len as u64 + length_len as u64 + length;
        if total > MAX_ELEMENT_SIZE as u64 {
            return Err(FramingError::ElementTooLarge(total));
        }
        let total = total as usize;
        if self.buf.len() < total {
            return Ok(None);
        }
        Ok(Some(self.buf.drain(..total).collect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_element() {
        let mut framer = ElementFramer::new();
        framer.push(&[0x08, 0x02, 0xaa, 0xbb]);
        assert_eq!(
            framer.next_element().unwrap(),
            Some(vec![0x08, 0x02, 0xaa, 0xbb])
        );
        assert_eq!(framer.next_element().unwrap(), None);
        assert_eq!(framer.pending(), 0);
    }

    #[test]
    fn test_element_split_across_pushes() {
        let mut framer = ElementFramer::new();
        framer.push(&[0x08]);
        assert_eq!(framer.next_element().unwrap(), None);
        framer.push(&[0x03, 0x01]);
        assert_eq!(framer.next_element().unwrap(), None);
        framer.push(&[0x02, 0x03]);
        assert_eq!(
            framer.next_element().unwrap(),
            Some(vec![0x08, 0x03, 0x01, 0x02, 0x03])
        );
    }

    #[test]
    fn test_two_elements_in_one_push() {
        let mut framer = ElementFramer::new();
        framer.push(&[0x08, 0x01, 0x61, 0x08, 0x01, 0x62]);
        assert_eq!(framer.next_element().unwrap(), Some(vec![0x08, 0x01, 0x61]));
        assert_eq!(framer.next_element().unwrap(), Some(vec![0x08, 0x01, 0x62]));
        assert_eq!(framer.next_element().unwrap(), None);
    }

    #[test]
    fn test_wide_length_header() {
        let mut element = vec![0x06, 253, 0x01, 0x2c];
        element.extend(std::iter::repeat(0u8).take(300));
        let mut framer = ElementFramer::new();
        framer.push(&element[..150]);
        assert_eq!(framer.next_element().unwrap(), None);
        framer.push(&element[150..]);
        assert_eq!(framer.next_element().unwrap(), Some(element));
    }

    #[test]
    fn test_oversize_element_rejected() {
        let mut framer = ElementFramer::new();
        framer.push(&[0x06, 254, 0x00, 0x01, 0x00, 0x00]);
        assert!(matches!(
            framer.next_element(),
            Err(FramingError::ElementTooLarge(_))
        ));
    }

    #[test]
    fn test_length_beyond_u32_rejected() {
        // 8-byte length field declaring 2^32 bytes
        let mut framer = ElementFramer::new();
        framer.push(&[0x06, 255, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00]);
        assert_eq!(
            framer.next_element(),
            Err(FramingError::ElementTooLarge(1 + 9 + (1u64 << 32)))
        );
    }
}
