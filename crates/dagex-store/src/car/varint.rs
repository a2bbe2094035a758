use crate::error::{StoreError, StoreResult};

/// Encode a u64 as an unsigned LEB128 varint.
pub(crate) fn encode_varint(buf: &mut Vec<u8>, mut value: u64) {
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value > 0 {
            byte |= 0x80;
        }
        buf.push(byte);
        if value == 0 {
            break;
        }
    }
}

/// Decode an unsigned varint at `offset`. Returns (value, bytes_consumed).
pub(crate) fn decode_varint(data: &[u8], offset: usize) -> StoreResult<(u64, usize)> {
    let mut value: u64 = 0;
    let mut shift = 0;
    for (i, &byte) in data.get(offset..).unwrap_or_default().iter().enumerate() {
        if shift >= 64 {
            return Err(StoreError::CorruptSection {
                offset,
                reason: "varint overflow".into(),
            });
        }
        value |= ((byte & 0x7F) as u64) << shift;
        shift += 7;
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }
    Err(StoreError::Truncated {
        offset,
        reason: "truncated varint".into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn varint_small() {
        let mut buf = Vec::new();
        encode_varint(&mut buf, 42);
        assert_eq!(buf, vec![42]);
        assert_eq!(decode_varint(&buf, 0).unwrap(), (42, 1));
    }

    #[test]
    fn varint_multi_byte() {
        let mut buf = Vec::new();
        encode_varint(&mut buf, 300);
        assert_eq!(buf, vec![0xAC, 0x02]);
        assert_eq!(decode_varint(&buf, 0).unwrap(), (300, 2));
    }

    #[test]
    fn varint_at_offset() {
        let mut buf = vec![0xFF];
        encode_varint(&mut buf, 1_000_000);
        let (val, consumed) = decode_varint(&buf, 1).unwrap();
        assert_eq!(val, 1_000_000);
        assert_eq!(consumed, buf.len() - 1);
    }

    #[test]
    fn varint_max_u64() {
        let mut buf = Vec::new();
        encode_varint(&mut buf, u64::MAX);
        assert_eq!(decode_varint(&buf, 0).unwrap().0, u64::MAX);
    }

    #[test]
    fn decode_truncated() {
        let err = decode_varint(&[0x80], 0).unwrap_err();
        assert!(matches!(err, StoreError::Truncated { .. }));
    }
}
