// Compact-size and length-prefixed byte encoding

use std::io::{self, Read};

/// Append a compact-size integer
pub fn push_varint(buf: &mut Vec<u8>, value: u64) {
    match value {
        0..=0xfc => buf.push(value as u8),
        0xfd..=0xffff => {
            buf.push(0xfd);
            buf.extend_from_slice(&(value as u16).to_le_bytes());
        }
        0x10000..=0xffffffff => {
            buf.push(0xfe);
            buf.extend_from_slice(&(value as u32).to_le_bytes());
        }
        _ => {
            buf.push(0xff);
            buf.extend_from_slice(&value.to_le_bytes());
        }
    }
}

/// Read a compact-size integer
pub fn read_varint<R: Read + ?Sized>(reader: &mut R) -> io::Result<u64> {
    let mut first_byte = [0u8; 1];
    reader.read_exact(&mut first_byte)?;

    match first_byte[0] {
        0..=0xfc => Ok(first_byte[0] as u64),
        0xfd => {
            let mut bytes = [0u8; 2];
            reader.read_exact(&mut bytes)?;
            Ok(u16::from_le_bytes(bytes) as u64)
        }
        0xfe => {
            let mut bytes = [0u8; 4];
            reader.read_exact(&mut bytes)?;
            Ok(u32::from_le_bytes(bytes) as u64)
        }
        0xff => {
            let mut bytes = [0u8; 8];
            reader.read_exact(&mut bytes)?;
            Ok(u64::from_le_bytes(bytes))
        }
    }
}

/// Number of bytes `push_varint` emits for `value`
pub fn varint_len(value: u64) -> usize {
    match value {
        0..=0xfc => 1,
        0xfd..=0xffff => 3,
        0x10000..=0xffffffff => 5,
        _ => 9,
    }
}

/// Append bytes with length prefix (compact-size length + data)
pub fn push_var_bytes(buf: &mut Vec<u8>, data: &[u8]) {
    push_varint(buf, data.len() as u64);
    buf.extend_from_slice(data);
}

/// Read bytes with length prefix
///
/// `limit` caps the declared length before anything is allocated, so a
/// corrupt prefix cannot request an arbitrarily large buffer.
pub fn read_var_bytes<R: Read + ?Sized>(reader: &mut R, limit: usize) -> io::Result<Vec<u8>> {
    let len = read_varint(reader)?;
    if len > limit as u64 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("declared length {} exceeds {} available bytes", len, limit),
        ));
    }
    let mut data = vec![0u8; len as usize];
    reader.read_exact(&mut data)?;
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_varint_small() {
        let mut buf = Vec::new();
        push_varint(&mut buf, 100);
        assert_eq!(buf, vec![100]);

        let mut cursor = Cursor::new(buf);
        assert_eq!(read_varint(&mut cursor).unwrap(), 100);
    }

    #[test]
    fn test_varint_boundaries() {
        for (value, len, marker) in [(0xfcu64, 1, 0xfc), (0xfd, 3, 0xfd), (0x10000, 5, 0xfe), (1u64 << 32, 9, 0xff)] {
            let mut buf = Vec::new();
            push_varint(&mut buf, value);
            assert_eq!(buf.len(), len);
            assert_eq!(buf.len(), varint_len(value));
            assert_eq!(buf[0], marker);

            let mut cursor = Cursor::new(buf);
            assert_eq!(read_varint(&mut cursor).unwrap(), value);
        }
    }

    #[test]
    fn test_varint_truncated() {
        let mut cursor = Cursor::new(vec![0xfd, 0x01]);
        assert!(read_varint(&mut cursor).is_err());
    }

    #[test]
    fn test_var_bytes() {
        let data = b"hello world";
        let mut buf = Vec::new();
        push_var_bytes(&mut buf, data);
        assert_eq!(buf[0], 11);

        let mut cursor = Cursor::new(buf);
        let decoded = read_var_bytes(&mut cursor, 11).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn test_var_bytes_limit() {
        let mut buf = Vec::new();
        push_var_bytes(&mut buf, &[7u8; 8]);

        let mut cursor = Cursor::new(buf);
        let err = read_var_bytes(&mut cursor, 4).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }
}
