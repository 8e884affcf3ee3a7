// Script elements, compilation and disassembly

use crate::error::{Error, Result};
use std::fmt;

/// Consensus limit on a serialized script
pub const MAX_SCRIPT_SIZE: usize = 10_000;

/// Consensus limit on a single pushed element (and on any stack item)
pub const MAX_SCRIPT_ELEMENT_SIZE: usize = 520;

/// Largest push encoded with a bare length byte
const MAX_DIRECT_PUSH: usize = 0x4b;

/// Opcodes understood by this crate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpCode {
    /// Push an empty byte string (also the segwit v0 marker)
    Op0 = 0x00,
    /// Next byte is the push length
    OpPushData1 = 0x4c,
    /// Next two bytes (LE) are the push length
    OpPushData2 = 0x4d,
    /// Next four bytes (LE) are the push length
    OpPushData4 = 0x4e,
    /// Push the number 1
    Op1 = 0x51,
    /// Fail unless the top stack item is true
    OpVerify = 0x69,
    /// Duplicate the top stack item
    OpDup = 0x76,
    /// Concatenate the top two stack items
    OpCat = 0x7e,
    /// Push 1 if the top two items are byte-equal, else empty
    OpEqual = 0x87,
    /// OP_EQUAL followed by OP_VERIFY
    OpEqualVerify = 0x88,
}

impl OpCode {
    /// Convert byte to opcode
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(OpCode::Op0),
            0x4c => Some(OpCode::OpPushData1),
            0x4d => Some(OpCode::OpPushData2),
            0x4e => Some(OpCode::OpPushData4),
            0x51 => Some(OpCode::Op1),
            0x69 => Some(OpCode::OpVerify),
            0x76 => Some(OpCode::OpDup),
            0x7e => Some(OpCode::OpCat),
            0x87 => Some(OpCode::OpEqual),
            0x88 => Some(OpCode::OpEqualVerify),
            _ => None,
        }
    }

    pub fn to_byte(self) -> u8 {
        self as u8
    }

    /// Assembly mnemonic
    pub fn name(&self) -> &'static str {
        match self {
            OpCode::Op0 => "OP_0",
            OpCode::OpPushData1 => "OP_PUSHDATA1",
            OpCode::OpPushData2 => "OP_PUSHDATA2",
            OpCode::OpPushData4 => "OP_PUSHDATA4",
            OpCode::Op1 => "OP_1",
            OpCode::OpVerify => "OP_VERIFY",
            OpCode::OpDup => "OP_DUP",
            OpCode::OpCat => "OP_CAT",
            OpCode::OpEqual => "OP_EQUAL",
            OpCode::OpEqualVerify => "OP_EQUALVERIFY",
        }
    }
}

/// One item of a script: an opcode or literal push data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptElement {
    Op(OpCode),
    Push(Vec<u8>),
}

impl From<OpCode> for ScriptElement {
    fn from(op: OpCode) -> Self {
        ScriptElement::Op(op)
    }
}

impl From<&[u8]> for ScriptElement {
    fn from(data: &[u8]) -> Self {
        ScriptElement::Push(data.to_vec())
    }
}

/// Ordered sequence of script elements
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Script {
    elements: Vec<ScriptElement>,
}

impl Script {
    pub fn new(elements: Vec<ScriptElement>) -> Self {
        Self { elements }
    }

    /// Append an opcode
    pub fn push_opcode(mut self, op: OpCode) -> Self {
        self.elements.push(ScriptElement::Op(op));
        self
    }

    /// Append literal push data
    pub fn push_data(mut self, data: &[u8]) -> Self {
        self.elements.push(ScriptElement::Push(data.to_vec()));
        self
    }

    pub fn elements(&self) -> &[ScriptElement] {
        &self.elements
    }

    /// Serialize to script bytes
    pub fn compile(&self) -> Result<Vec<u8>> {
        compile(&self.elements)
    }

    /// Parse script bytes back into elements
    ///
    /// Byte 0x00 comes back as `OpCode::Op0`. An empty `Push` compiles to the
    /// same byte, so it also parses as `Op0`.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut elements = Vec::new();
        let mut pos = 0;

        while pos < bytes.len() {
            let byte = bytes[pos];
            pos += 1;

            let len = match byte {
                0x01..=0x4b => Some(byte as usize),
                0x4c => Some(read_push_len(bytes, &mut pos, 1)?),
                0x4d => Some(read_push_len(bytes, &mut pos, 2)?),
                0x4e => Some(read_push_len(bytes, &mut pos, 4)?),
                _ => None,
            };

            match len {
                Some(len) => {
                    if pos + len > bytes.len() {
                        return Err(Error::MalformedScript(format!(
                            "push of {} bytes at offset {} runs past end of script",
                            len,
                            pos - 1
                        )));
                    }
                    elements.push(ScriptElement::Push(bytes[pos..pos + len].to_vec()));
                    pos += len;
                }
                None => {
                    let op = OpCode::from_byte(byte).ok_or_else(|| {
                        Error::MalformedScript(format!("unsupported opcode 0x{:02x}", byte))
                    })?;
                    elements.push(ScriptElement::Op(op));
                }
            }
        }

        Ok(Self { elements })
    }

    /// Human-readable disassembly, e.g. `OP_CAT OP_CAT 010201 OP_EQUAL`
    pub fn to_asm(&self) -> String {
        self.elements
            .iter()
            .map(|element| match element {
                ScriptElement::Op(op) => op.name().to_string(),
                ScriptElement::Push(data) if data.is_empty() => OpCode::Op0.name().to_string(),
                ScriptElement::Push(data) => hex::encode(data),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.to_asm())
    }
}

/// Compile script elements into their serialized form
///
/// Pushes use the shortest length encoding; data is never rewritten into
/// small-integer opcodes.
pub fn compile(elements: &[ScriptElement]) -> Result<Vec<u8>> {
    let mut script = Vec::new();

    for element in elements {
        match element {
            ScriptElement::Op(op) => script.push(op.to_byte()),
            ScriptElement::Push(data) => push_slice(&mut script, data)?,
        }
    }

    if script.len() > MAX_SCRIPT_SIZE {
        return Err(Error::ScriptTooLarge {
            size: script.len(),
            max: MAX_SCRIPT_SIZE,
        });
    }

    Ok(script)
}

fn push_slice(script: &mut Vec<u8>, data: &[u8]) -> Result<()> {
    let len = data.len();
    if len > MAX_SCRIPT_ELEMENT_SIZE {
        return Err(Error::PushTooLarge {
            size: len,
            max: MAX_SCRIPT_ELEMENT_SIZE,
        });
    }

    if len <= MAX_DIRECT_PUSH {
        script.push(len as u8);
    } else if len <= 0xff {
        script.push(OpCode::OpPushData1.to_byte());
        script.push(len as u8);
    } else {
        script.push(OpCode::OpPushData2.to_byte());
        script.extend_from_slice(&(len as u16).to_le_bytes());
    }
    script.extend_from_slice(data);
    Ok(())
}

fn read_push_len(bytes: &[u8], pos: &mut usize, width: usize) -> Result<usize> {
    if *pos + width > bytes.len() {
        return Err(Error::MalformedScript(format!(
            "truncated {}-byte push length at offset {}",
            width, *pos
        )));
    }
    let mut buf = [0u8; 4];
    buf[..width].copy_from_slice(&bytes[*pos..*pos + width]);
    *pos += width;
    Ok(u32::from_le_bytes(buf) as usize)
}

/// Segwit output script: `OP_n <program>`
pub fn witness_output_script(version: u8, program: &[u8]) -> Vec<u8> {
    let mut script = Vec::with_capacity(2 + program.len());
    script.push(if version == 0 { OpCode::Op0.to_byte() } else { 0x50 + version });
    script.push(program.len() as u8);
    script.extend_from_slice(program);
    script
}

/// P2WSH scriptPubKey: `OP_0 <32-byte script hash>`
pub fn p2wsh_script_pubkey(script_hash: &[u8; 32]) -> Vec<u8> {
    witness_output_script(0, script_hash)
}

/// P2WPKH scriptPubKey: `OP_0 <20-byte pubkey hash>`
pub fn p2wpkh_script_pubkey(pubkey_hash: &[u8; 20]) -> Vec<u8> {
    witness_output_script(0, pubkey_hash)
}
