// Witness stack and its wire encoding

use crate::core::serialize::{push_var_bytes, push_varint, read_var_bytes, read_varint, varint_len};
use crate::error::{Error, Result};
use std::io::Cursor;

/// Ordered byte strings supplied with a segwit input, bottom of stack first
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WitnessStack {
    items: Vec<Vec<u8>>,
}

impl WitnessStack {
    pub fn new(items: Vec<Vec<u8>>) -> Self {
        Self { items }
    }

    pub fn push(&mut self, item: impl Into<Vec<u8>>) {
        self.items.push(item.into());
    }

    pub fn items(&self) -> &[Vec<u8>] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Last item; for a script-hash spend this is the redeemed script
    pub fn last(&self) -> Option<&[u8]> {
        self.items.last().map(Vec::as_slice)
    }

    /// Size of the encoded form in bytes
    pub fn encoded_len(&self) -> usize {
        varint_len(self.items.len() as u64)
            + self
                .items
                .iter()
                .map(|item| varint_len(item.len() as u64) + item.len())
                .sum::<usize>()
    }

    /// Encode as `count || (len || item)*`
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        push_varint(&mut buf, self.items.len() as u64);
        for item in &self.items {
            push_var_bytes(&mut buf, item);
        }
        buf
    }

    /// Decode a complete witness field; every byte must be consumed
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(bytes);
        let stack = Self::read_from(&mut cursor, bytes.len())?;

        let consumed = cursor.position() as usize;
        if consumed != bytes.len() {
            return Err(Error::MalformedWitness(format!(
                "{} trailing bytes after {} items",
                bytes.len() - consumed,
                stack.len()
            )));
        }
        Ok(stack)
    }

    /// Read one witness from the middle of a transaction
    pub(crate) fn read_from(cursor: &mut Cursor<&[u8]>, end: usize) -> Result<Self> {
        let count = read_varint(cursor)
            .map_err(|e| Error::MalformedWitness(format!("item count: {}", e)))?;

        // Every item needs at least its one-byte length prefix
        let remaining = end.saturating_sub(cursor.position() as usize);
        if count > remaining as u64 {
            return Err(Error::MalformedWitness(format!(
                "declared {} items but only {} bytes remain",
                count, remaining
            )));
        }

        let mut items = Vec::with_capacity(count as usize);
        for index in 0..count {
            let remaining = end.saturating_sub(cursor.position() as usize);
            let item = read_var_bytes(cursor, remaining)
                .map_err(|e| Error::MalformedWitness(format!("item {}: {}", index, e)))?;
            items.push(item);
        }
        Ok(Self { items })
    }
}

impl From<Vec<Vec<u8>>> for WitnessStack {
    fn from(items: Vec<Vec<u8>>) -> Self {
        Self::new(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_encode_two_items() {
        let stack = WitnessStack::new(vec![vec![0x01], vec![0x01, 0x02]]);
        assert_eq!(stack.encode(), vec![0x02, 0x01, 0x01, 0x02, 0x01, 0x02]);
        assert_eq!(stack.encoded_len(), 6);
    }

    #[test]
    fn test_empty_stack() {
        let stack = WitnessStack::default();
        assert_eq!(stack.encode(), vec![0x00]);
        assert_eq!(WitnessStack::decode(&[0x00]).unwrap(), stack);
    }

    #[test]
    fn test_decode_inverts_encode() {
        let stacks = [
            WitnessStack::new(vec![vec![]]),
            WitnessStack::new(vec![vec![0x01], vec![0x02], vec![0x01], vec![0x7e, 0x7e, 0x03, 0x01, 0x02, 0x01, 0x87]]),
            WitnessStack::new(vec![vec![0xab; 253], vec![0xcd; 520]]),
        ];
        for stack in stacks {
            assert_eq!(WitnessStack::decode(&stack.encode()).unwrap(), stack);
        }
    }

    #[test]
    fn test_decode_length_past_end() {
        // count=1, len=5, only 2 bytes follow
        let err = WitnessStack::decode(&[0x01, 0x05, 0xaa, 0xbb]).unwrap_err();
        assert!(matches!(err, Error::MalformedWitness(_)));
    }

    #[test]
    fn test_decode_trailing_bytes() {
        let err = WitnessStack::decode(&[0x01, 0x01, 0xaa, 0xff]).unwrap_err();
        assert!(matches!(err, Error::MalformedWitness(msg) if msg.contains("trailing")));
    }

    #[test]
    fn test_decode_truncated_count() {
        assert!(matches!(WitnessStack::decode(&[]), Err(Error::MalformedWitness(_))));
        assert!(matches!(WitnessStack::decode(&[0xfd, 0x01]), Err(Error::MalformedWitness(_))));
    }

    #[test]
    fn test_decode_huge_count() {
        let err = WitnessStack::decode(&[0xfe, 0xff, 0xff, 0xff, 0x7f]).unwrap_err();
        assert!(matches!(err, Error::MalformedWitness(_)));
    }

    proptest! {
        #[test]
        fn prop_decode_inverts_encode(
            items in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..=520), 0..20)
        ) {
            let stack = WitnessStack::new(items);
            let encoded = stack.encode();
            prop_assert_eq!(encoded.len(), stack.encoded_len());
            prop_assert_eq!(WitnessStack::decode(&encoded).unwrap(), stack);
        }
    }
}
