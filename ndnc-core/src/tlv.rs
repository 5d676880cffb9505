//! NDN-TLV primitive codec.
//!
//! Both the Type and the Length of a TLV element are encoded as
//! self-delimiting variable-length numbers:
//! - one byte for values 0..=252
//! - marker 253 followed by a 2-byte big-endian extension
//! - marker 254 followed by a 4-byte big-endian extension
//! - marker 255 followed by an 8-byte big-endian extension
//!
//! The write path always emits the minimal (canonical) form. The read
//! path accepts non-minimal forms as well; re-encoding such input
//! therefore produces a shorter, canonical byte sequence.

/// Errors that can occur while reading or writing TLV primitives
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TlvError {
    #[error("buffer too short")]
    BufferTooShort,
    #[error("truncated variable-length number")]
    TruncatedVarNumber,
    #[error("value length {declared} exceeds remaining {remaining} bytes")]
    TruncatedValue { declared: usize, remaining: usize },
    #[error("TLV length {0} does not fit in memory")]
    LengthOverflow(u64),
    #[error("TLV type {0} out of range")]
    TypeOutOfRange(u64),
    #[error("unexpected TLV type {actual:#x}, expected {expected:#x}")]
    UnexpectedType { expected: u32, actual: u32 },
    #[error("invalid non-negative integer width: {0}")]
    InvalidIntegerWidth(usize),
}

/// Read one variable-length number from the front of `data`.
///
/// Returns the decoded value and the number of bytes consumed.
pub fn read_var_number(data: &[u8]) -> Result<(u64, usize), TlvError> {
    let first = *data.first().ok_or(TlvError::BufferTooShort)?;
    match first {
        0..=252 => Ok((u64::from(first), 1)),
        253 => {
            let ext: [u8; 2] = data
                .get(1..3)
                .ok_or(TlvError::TruncatedVarNumber)?
                .try_into()
                .unwrap();
            Ok((u64::from(u16::from_be_bytes(ext)), 3))
        }
        254 => {
            let ext: [u8; 4] = data
                .get(1..5)
                .ok_or(TlvError::TruncatedVarNumber)?
                .try_into()
                .unwrap();
            Ok((u64::from(u32::from_be_bytes(ext)), 5))
        }
        255 => {
            let ext: [u8; 8] = data
                .get(1..9)
                .ok_or(TlvError::TruncatedVarNumber)?
                .try_into()
                .unwrap();
            Ok((u64::from_be_bytes(ext), 9))
        }
    }
}

/// Append the canonical (minimal) encoding of `value` to `out`.
pub fn write_var_number(value: u64, out: &mut Vec<u8>) {
    if value < 253 {
        out.push(value as u8);
    } else if value <= u64::from(u16::MAX) {
        out.push(253);
        out.extend_from_slice(&(value as u16).to_be_bytes());
    } else if value <= u64::from(u32::MAX) {
        out.push(254);
        out.extend_from_slice(&(value as u32).to_be_bytes());
    } else {
        out.push(255);
        out.extend_from_slice(&value.to_be_bytes());
    }
}

/// Number of bytes `write_var_number` will emit for `value`.
pub fn var_number_size(value: u64) -> usize {
    if value < 253 {
        1
    } else if value <= u64::from(u16::MAX) {
        3
    } else if value <= u64::from(u32::MAX) {
        5
    } else {
        9
    }
}

/// Encode an NDN nonNegativeInteger: the minimal of 1, 2, 4, or 8
/// big-endian bytes that holds the value.
pub fn encode_nonneg_integer(value: u64) -> Vec<u8> {
    if value <= u64::from(u8::MAX) {
        vec![value as u8]
    } else if value <= u64::from(u16::MAX) {
        (value as u16).to_be_bytes().to_vec()
    } else if value <= u64::from(u32::MAX) {
        (value as u32).to_be_bytes().to_vec()
    } else {
        value.to_be_bytes().to_vec()
    }
}

/// Decode an NDN nonNegativeInteger; only widths 1, 2, 4, and 8 are
/// valid.
pub fn decode_nonneg_integer(data: &[u8]) -> Result<u64, TlvError> {
    match data.len() {
        1 => Ok(u64::from(data[0])),
        2 => Ok(u64::from(u16::from_be_bytes(data.try_into().unwrap()))),
        4 => Ok(u64::from(u32::from_be_bytes(data.try_into().unwrap()))),
        8 => Ok(u64::from_be_bytes(data.try_into().unwrap())),
        n => Err(TlvError::InvalidIntegerWidth(n)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_var_number_boundary_values() {
        // One case per width tier plus the tier edges
        let cases: &[(u64, usize)] = &[
            (0, 1),
            (252, 1),
            (253, 3),
            (65535, 3),
            (65536, 5),
            (u32::MAX as u64, 5),
            (u32::MAX as u64 + 1, 9),
        ];
        for &(value, encoded_len) in cases {
            let mut out = Vec::new();
            write_var_number(value, &mut out);
            assert_eq!(out.len(), encoded_len, "width for {}", value);
            assert_eq!(out.len(), var_number_size(value));
            let (decoded, consumed) = read_var_number(&out).unwrap();
            assert_eq!(decoded, value);
            assert_eq!(consumed, encoded_len);
        }
    }

    #[test]
    fn test_var_number_big_endian_extension() {
        let mut out = Vec::new();
        write_var_number(0x0102, &mut out);
        assert_eq!(out, vec![253, 0x01, 0x02]);
    }

    #[test]
    fn test_non_minimal_var_number_decodes() {
        // 10 spelled with the 2-byte extension is accepted on read
        let (value, consumed) = read_var_number(&[253, 0x00, 0x0a]).unwrap();
        assert_eq!(value, 10);
        assert_eq!(consumed, 3);
        // but the canonical re-encoding is shorter
        let mut out = Vec::new();
        write_var_number(value, &mut out);
        assert_eq!(out, vec![10]);
    }

    #[test]
    fn test_truncated_var_number() {
        assert_eq!(read_var_number(&[]), Err(TlvError::BufferTooShort));
        assert_eq!(
            read_var_number(&[253, 0x01]),
            Err(TlvError::TruncatedVarNumber)
        );
        assert_eq!(
            read_var_number(&[254, 0, 0, 1]),
            Err(TlvError::TruncatedVarNumber)
        );
        assert_eq!(
            read_var_number(&[255, 0, 0, 0, 0, 0, 0, 1]),
            Err(TlvError::TruncatedVarNumber)
        );
    }

    #[test]
    fn test_nonneg_integer_widths() {
        assert_eq!(encode_nonneg_integer(10), vec![10]);
        assert_eq!(encode_nonneg_integer(10000), vec![0x27, 0x10]);
        assert_eq!(encode_nonneg_integer(0x0102_0304), vec![1, 2, 3, 4]);
        assert_eq!(encode_nonneg_integer(1 << 40).len(), 8);

        for value in [0u64, 255, 256, 65535, 65536, u32::MAX as u64 + 1] {
            let encoded = encode_nonneg_integer(value);
            assert_eq!(decode_nonneg_integer(&encoded).unwrap(), value);
        }
    }

    #[test]
    fn test_nonneg_integer_rejects_odd_width() {
        assert_eq!(
            decode_nonneg_integer(&[1, 2, 3]),
            Err(TlvError::InvalidIntegerWidth(3))
        );
        assert_eq!(
            decode_nonneg_integer(&[]),
            Err(TlvError::InvalidIntegerWidth(0))
        );
    }
}
