// Segwit transaction data structures and wire format

use crate::core::serialize::{push_var_bytes, push_varint, read_var_bytes, read_varint};
use crate::core::{hash256, Hash256, OutPoint, WitnessStack};
use crate::error::{Error, Result};
use std::io::{Cursor, Read};

/// Sequence number that disables relative locktime and RBF signaling
pub const SEQUENCE_FINAL: u32 = 0xffffffff;

/// Transaction input - references a previous transaction output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxInput {
    /// Output being spent
    pub previous_output: OutPoint,
    /// Legacy signature script; empty for a pure witness spend
    pub script_sig: Vec<u8>,
    /// Sequence number
    pub sequence: u32,
    /// Segwit witness for this input
    pub witness: WitnessStack,
}

impl TxInput {
    /// Create an input with an empty scriptSig and witness
    pub fn new(previous_output: OutPoint) -> Self {
        Self {
            previous_output,
            script_sig: Vec::new(),
            sequence: SEQUENCE_FINAL,
            witness: WitnessStack::default(),
        }
    }

    /// Serialize the non-witness part of the input
    fn write_to(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.previous_output.to_bytes());
        push_var_bytes(buf, &self.script_sig);
        buf.extend_from_slice(&self.sequence.to_le_bytes());
    }

    fn read_from(reader: &mut Cursor<&[u8]>, end: usize) -> Result<Self> {
        let txid = Hash256::new(read_array(reader)?);
        let vout = u32::from_le_bytes(read_array(reader)?);
        let limit = remaining(reader, end);
        let script_sig = read_var_bytes(reader, limit).map_err(|e| malformed("scriptSig", e))?;
        let sequence = u32::from_le_bytes(read_array(reader)?);

        Ok(Self {
            previous_output: OutPoint::new(txid, vout),
            script_sig,
            sequence,
            witness: WitnessStack::default(),
        })
    }
}

/// Transaction output - specifies amount and recipient
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOutput {
    /// Amount in satoshis (1 BTC = 100,000,000 satoshis)
    pub value: u64,
    /// Locking script (scriptPubKey)
    pub script_pubkey: Vec<u8>,
}

impl TxOutput {
    pub fn new(value: u64, script_pubkey: Vec<u8>) -> Self {
        Self {
            value,
            script_pubkey,
        }
    }

    fn write_to(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.value.to_le_bytes());
        push_var_bytes(buf, &self.script_pubkey);
    }

    fn read_from(reader: &mut Cursor<&[u8]>, end: usize) -> Result<Self> {
        let value = u64::from_le_bytes(read_array(reader)?);
        let limit = remaining(reader, end);
        let script_pubkey =
            read_var_bytes(reader, limit).map_err(|e| malformed("scriptPubKey", e))?;
        Ok(Self {
            value,
            script_pubkey,
        })
    }
}

/// Transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub version: u32,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
    /// Lock time (block height or timestamp when tx becomes valid)
    pub lock_time: u32,
}

impl Transaction {
    /// Create a version 2 transaction with no locktime
    pub fn new(inputs: Vec<TxInput>, outputs: Vec<TxOutput>) -> Self {
        Self {
            version: 2,
            inputs,
            outputs,
            lock_time: 0,
        }
    }

    /// True if any input carries witness data
    pub fn has_witness(&self) -> bool {
        self.inputs.iter().any(|input| !input.witness.is_empty())
    }

    /// Legacy serialization, the preimage of the txid
    pub fn serialize_without_witness(&self) -> Vec<u8> {
        self.encode(false)
    }

    /// Full wire serialization; uses the segwit layout when witness data is present
    pub fn serialize(&self) -> Vec<u8> {
        self.encode(self.has_witness())
    }

    fn encode(&self, with_witness: bool) -> Vec<u8> {
        let mut buf = Vec::new();

        buf.extend_from_slice(&self.version.to_le_bytes());

        if with_witness {
            // Marker and flag
            buf.extend_from_slice(&[0x00, 0x01]);
        }

        push_varint(&mut buf, self.inputs.len() as u64);
        for input in &self.inputs {
            input.write_to(&mut buf);
        }

        push_varint(&mut buf, self.outputs.len() as u64);
        for output in &self.outputs {
            output.write_to(&mut buf);
        }

        if with_witness {
            for input in &self.inputs {
                buf.extend_from_slice(&input.witness.encode());
            }
        }

        buf.extend_from_slice(&self.lock_time.to_le_bytes());
        buf
    }

    /// Transaction ID (double SHA256 of the witness-stripped serialization)
    pub fn txid(&self) -> Hash256 {
        hash256(&self.serialize_without_witness())
    }

    /// Witness transaction ID (double SHA256 of the full serialization)
    pub fn wtxid(&self) -> Hash256 {
        hash256(&self.serialize())
    }

    /// BIP141 weight: base size * 3 + total size
    pub fn weight(&self) -> usize {
        self.serialize_without_witness().len() * 3 + self.serialize().len()
    }

    /// Virtual size in vbytes, rounded up
    pub fn vsize(&self) -> usize {
        self.weight().div_ceil(4)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.serialize())
    }

    /// Total output value
    pub fn total_output_value(&self) -> u64 {
        self.outputs.iter().map(|out| out.value).sum()
    }

    /// Parse a transaction in either the legacy or the segwit layout
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        let end = data.len();
        let mut reader = Cursor::new(data);

        let version = u32::from_le_bytes(read_array(&mut reader)?);

        // A zero input count followed by flag 0x01 is the segwit marker
        let mut with_witness = false;
        let mut input_count = read_count(&mut reader, end)?;
        if input_count == 0 {
            let [flag] = read_array::<1>(&mut reader)?;
            if flag != 0x01 {
                return Err(Error::InvalidInput(format!("Unknown segwit flag 0x{:02x}", flag)));
            }
            with_witness = true;
            input_count = read_count(&mut reader, end)?;
        }

        let mut inputs = Vec::with_capacity(input_count);
        for _ in 0..input_count {
            inputs.push(TxInput::read_from(&mut reader, end)?);
        }

        let output_count = read_count(&mut reader, end)?;
        let mut outputs = Vec::with_capacity(output_count);
        for _ in 0..output_count {
            outputs.push(TxOutput::read_from(&mut reader, end)?);
        }

        if with_witness {
            for input in &mut inputs {
                input.witness = WitnessStack::read_from(&mut reader, end)?;
            }
        }

        let lock_time = u32::from_le_bytes(read_array(&mut reader)?);

        if reader.position() as usize != end {
            return Err(Error::InvalidInput("Trailing bytes after transaction".to_string()));
        }

        Ok(Self {
            version,
            inputs,
            outputs,
            lock_time,
        })
    }

    pub fn from_hex(hex_str: &str) -> Result<Self> {
        let bytes = hex::decode(hex_str.trim())
            .map_err(|e| Error::InvalidInput(format!("Invalid hex string: {}", e)))?;
        Self::deserialize(&bytes)
    }
}

fn remaining(reader: &Cursor<&[u8]>, end: usize) -> usize {
    end.saturating_sub(reader.position() as usize)
}

fn read_array<const N: usize>(reader: &mut Cursor<&[u8]>) -> Result<[u8; N]> {
    let mut bytes = [0u8; N];
    reader
        .read_exact(&mut bytes)
        .map_err(|e| malformed("transaction", e))?;
    Ok(bytes)
}

fn read_count(reader: &mut Cursor<&[u8]>, end: usize) -> Result<usize> {
    let count = read_varint(reader).map_err(|e| malformed("count", e))?;
    if count > remaining(reader, end) as u64 {
        return Err(Error::InvalidInput(format!("Implausible item count {}", count)));
    }
    Ok(count as usize)
}

fn malformed(what: &str, e: std::io::Error) -> Error {
    Error::InvalidInput(format!("Truncated {}: {}", what, e))
}
