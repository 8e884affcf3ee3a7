// Local evaluation of witness scripts
//
// Covers the opcode table in `core::script` and the segwit v0 script-hash
// rules needed to tell whether a witness would unlock a game output. It is
// not a consensus engine.

use crate::core::script::{MAX_SCRIPT_ELEMENT_SIZE, MAX_SCRIPT_SIZE};
use crate::core::{sha256_hash, OpCode, Script, ScriptElement, WitnessStack};
use crate::error::{Error, Result};

/// Outcome of running a script
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evaluation {
    /// Ran to completion; the final stack is returned
    Completed(Vec<Vec<u8>>),
    /// OP_VERIFY / OP_EQUALVERIFY saw a false value
    VerifyFailed,
}

/// Script truthiness: any non-zero byte, except a lone sign bit at the end
pub fn cast_to_bool(item: &[u8]) -> bool {
    for (i, byte) in item.iter().enumerate() {
        if *byte != 0 {
            return !(i == item.len() - 1 && *byte == 0x80);
        }
    }
    false
}

fn pop(stack: &mut Vec<Vec<u8>>, op: OpCode) -> Result<Vec<u8>> {
    stack
        .pop()
        .ok_or_else(|| Error::Interpreter(format!("{} on empty stack", op.name())))
}

/// Run `script` on top of `stack` (last element is the top)
pub fn evaluate(script: &Script, mut stack: Vec<Vec<u8>>) -> Result<Evaluation> {
    for element in script.elements() {
        match element {
            ScriptElement::Push(data) => {
                if data.len() > MAX_SCRIPT_ELEMENT_SIZE {
                    return Err(Error::PushTooLarge {
                        size: data.len(),
                        max: MAX_SCRIPT_ELEMENT_SIZE,
                    });
                }
                stack.push(data.clone());
            }
            ScriptElement::Op(op) => match op {
                OpCode::Op0 => stack.push(Vec::new()),
                OpCode::Op1 => stack.push(vec![1]),
                OpCode::OpPushData1 | OpCode::OpPushData2 | OpCode::OpPushData4 => {
                    return Err(Error::Interpreter(format!(
                        "{} without push data",
                        op.name()
                    )));
                }
                OpCode::OpDup => {
                    let top = stack
                        .last()
                        .cloned()
                        .ok_or_else(|| Error::Interpreter("OP_DUP on empty stack".to_string()))?;
                    stack.push(top);
                }
                OpCode::OpCat => {
                    let second = pop(&mut stack, *op)?;
                    let mut first = pop(&mut stack, *op)?;
                    if first.len() + second.len() > MAX_SCRIPT_ELEMENT_SIZE {
                        return Err(Error::Interpreter(format!(
                            "OP_CAT result of {} bytes exceeds {}",
                            first.len() + second.len(),
                            MAX_SCRIPT_ELEMENT_SIZE
                        )));
                    }
                    first.extend_from_slice(&second);
                    stack.push(first);
                }
                OpCode::OpEqual | OpCode::OpEqualVerify => {
                    let b = pop(&mut stack, *op)?;
                    let a = pop(&mut stack, *op)?;
                    if *op == OpCode::OpEqualVerify {
                        if a != b {
                            return Ok(Evaluation::VerifyFailed);
                        }
                    } else {
                        stack.push(if a == b { vec![1] } else { Vec::new() });
                    }
                }
                OpCode::OpVerify => {
                    let top = pop(&mut stack, *op)?;
                    if !cast_to_bool(&top) {
                        return Ok(Evaluation::VerifyFailed);
                    }
                }
            },
        }
    }

    Ok(Evaluation::Completed(stack))
}

/// Check a witness against a P2WSH output script
///
/// Returns `Ok(true)` only if the last witness item hashes to the program,
/// the script runs to completion and leaves exactly one true item (segwit
/// clean-stack rule). Malformed inputs are errors; a wrong guess is
/// `Ok(false)`.
pub fn verify_p2wsh(script_pubkey: &[u8], witness: &WitnessStack) -> Result<bool> {
    let program = match script_pubkey {
        [0x00, 0x20, program @ ..] if program.len() == 32 => program,
        _ => {
            return Err(Error::Interpreter(format!(
                "not a P2WSH output script: {}",
                hex::encode(script_pubkey)
            )));
        }
    };

    let (witness_script, items) = witness
        .items()
        .split_last()
        .ok_or_else(|| Error::Interpreter("empty witness".to_string()))?;

    if witness_script.len() > MAX_SCRIPT_SIZE {
        return Err(Error::ScriptTooLarge {
            size: witness_script.len(),
            max: MAX_SCRIPT_SIZE,
        });
    }
    if sha256_hash(witness_script) != program {
        log::warn!("Witness script does not match the output's program");
        return Ok(false);
    }
    if let Some(item) = items.iter().find(|item| item.len() > MAX_SCRIPT_ELEMENT_SIZE) {
        return Err(Error::PushTooLarge {
            size: item.len(),
            max: MAX_SCRIPT_ELEMENT_SIZE,
        });
    }

    let script = Script::parse(witness_script)?;
    match evaluate(&script, items.to_vec())? {
        Evaluation::Completed(stack) => Ok(stack.len() == 1 && cast_to_bool(&stack[0])),
        Evaluation::VerifyFailed => Ok(false),
    }
}
